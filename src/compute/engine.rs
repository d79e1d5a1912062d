//! A synchronous, single-threaded propagation engine.
//!
//! Outputs are computed on demand with a depth-first walk that memoizes per pass:
//! a node is evaluated at most once per pass, and a node reached again (a
//! cycle or a diamond) answers with its current cached output. Repeating
//! passes relaxes the graph towards a fixed point.
use super::config::EngineConfig;
use super::ledger::Ledger;
use crate::store::{NodeId, NodeKind, Reaction, RegulationKind, Registry};
use log::{debug, trace, warn};

/// Nodes reached during one traversal, in first-visit order.
#[derive(Debug, Clone, Default)]
pub struct VisitSet {
    seen: Vec<bool>,
    order: Vec<NodeId>,
}

impl VisitSet {
    pub fn with_capacity(size: usize) -> Self {
        Self { seen: vec![false; size], order: Vec::new() }
    }

    /// Marks `id` as visited. Returns `false` if it already was.
    #[inline]
    pub fn insert(&mut self, id: NodeId) -> bool {
        let idx = id.index();
        if idx >= self.seen.len() {
            self.seen.resize(idx + 1, false);
        }
        if self.seen[idx] {
            return false;
        }
        self.seen[idx] = true;
        self.order.push(id);
        true
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.seen.get(id.index()).copied().unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize { self.order.len() }

    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    pub fn clear(&mut self) {
        for id in self.order.drain(..) {
            self.seen[id.index()] = false;
        }
    }
}

/// Result of computing one node from scratch: its output and every node the
/// computation touched (the reachability closure).
#[derive(Debug, Clone)]
pub struct Trace {
    pub output: f64,
    pub visited: VisitSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// Number of passes executed.
    pub passes: usize,
    /// False if the iteration cap was reached while outputs were still moving.
    pub converged: bool,
}

/// A reaction whose dependencies are being walked; `next` indexes
/// [`Reaction::dependency`].
#[derive(Clone, Copy)]
struct Frame<'a> {
    node: NodeId,
    reaction: &'a Reaction,
    next: usize,
}

pub struct Engine<'a> {
    registry: &'a Registry,
    config: &'a EngineConfig,
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a Registry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Computes the output of `node` and stores it in the ledger.
    ///
    /// `visited` is the memo set of the current pass. A node already in it
    /// returns its cached output without being re-evaluated, which makes the
    /// traversal terminate on any finite graph. A fixed output always wins
    /// over the node's own rule.
    ///
    /// The depth-first walk keeps its own stack, so dependency chains of any
    /// length are fine.
    pub fn compute(&self, node: NodeId, visited: &mut VisitSet, ledger: &mut Ledger) -> f64 {
        if !visited.insert(node) {
            return ledger.output(node);
        }

        let mut stack: Vec<Frame<'a>> = Vec::new();
        stack.extend(self.enter(node, ledger));

        while let Some(frame) = stack.last_mut() {
            match frame.reaction.dependency(frame.next) {
                Some(dep) => {
                    frame.next += 1;
                    if visited.insert(dep) {
                        stack.extend(self.enter(dep, ledger));
                    }
                }
                None => {
                    let Frame { node, reaction, .. } = *frame;
                    stack.pop();
                    let output = self.combine(node, reaction, ledger);
                    self.store(node, output, ledger);
                }
            }
        }
        ledger.output(node)
    }

    /// Starts a freshly visited node. Fixed and non-reaction nodes are
    /// resolved at once; a reaction returns a frame to walk its dependencies.
    fn enter(&self, node: NodeId, ledger: &mut Ledger) -> Option<Frame<'a>> {
        let registry: &'a Registry = self.registry;
        if let Some(fixed) = ledger.fixed_output(node) {
            self.store(node, fixed, ledger);
            return None;
        }
        match registry.kind(node) {
            NodeKind::Reaction(reaction) => Some(Frame { node, reaction, next: 0 }),
            _ => {
                self.store(node, registry.weight(node).unwrap_or(0.0), ledger);
                None
            }
        }
    }

    fn store(&self, node: NodeId, output: f64, ledger: &mut Ledger) {
        ledger.set_output(node, output);
        trace!("{}\tfixed:{}\tid:{}\ttype:{}\tname:{}",
            output, ledger.is_fixed(node), self.registry.meta(node).db_id,
            self.registry.kind(node).label(), self.registry.name(node));
    }

    /// Computes `node` with a fresh visit set. The returned closure is what
    /// the pruning pass and trace monitors use; the output is a side result.
    pub fn trace(&self, node: NodeId, ledger: &mut Ledger) -> Trace {
        let mut visited = VisitSet::with_capacity(self.registry.count());
        let output = self.compute(node, &mut visited, ledger);
        Trace { output, visited }
    }

    /// Runs a single convergence pass over every node in index order.
    /// Returns the largest change of any node relative to the start of the pass.
    pub fn run_pass(&self, ledger: &mut Ledger, visited: &mut VisitSet) -> f64 {
        let before = ledger.outputs().to_vec();
        visited.clear();
        for id in self.registry.node_ids() {
            self.compute(id, visited, ledger);
        }
        before.iter().zip(ledger.outputs()).map(|(&a, &b)| delta(a, b)).fold(0.0, f64::max)
    }

    /// Repeats passes until no node changes by more than the convergence
    /// threshold, or until the iteration cap. Reaching the cap is logged and
    /// reported through [`Convergence::converged`]; the last values stay in
    /// the ledger.
    pub fn run_to_convergence(&self, ledger: &mut Ledger) -> Convergence {
        let threshold = self.config.convergence_threshold;
        let mut visited = VisitSet::with_capacity(self.registry.count());
        let mut passes = 0;
        let mut changed = true;

        while changed && passes < self.config.max_iterations {
            let max_delta = self.run_pass(ledger, &mut visited);
            passes += 1;
            changed = max_delta > threshold;
            debug!("[pass:{}] max change {:.3e}", passes, max_delta);
        }

        if changed {
            warn!("No convergence after {} passes (threshold {:e}); keeping last values.", passes, threshold);
        }
        Convergence { passes, converged: !changed }
    }

    /// Combines a reaction's inputs once all its dependencies are settled for
    /// this pass.
    fn combine(&self, node: NodeId, reaction: &Reaction, ledger: &Ledger) -> f64 {
        let mut input = 0.0;
        for edge in &reaction.inputs {
            if ledger.has_output(edge.node) {
                input += ledger.output(edge.node) * edge.stoichiometry;
            }
        }
        let input = input * self.registry.weight(node).unwrap_or(1.0);

        // Nothing usable in input: cannot calculate output.
        if !input.is_finite() {
            return f64::NAN;
        }

        self.config.transfer.apply(input * self.modulation(reaction, ledger))
    }

    /// Multiplicative gate from catalysts and regulators; exactly 1.0 when a
    /// reaction has neither.
    fn modulation(&self, reaction: &Reaction, ledger: &Ledger) -> f64 {
        let t = &self.config.transfer;
        let mut gate = 1.0;

        if !reaction.catalysts.is_empty() {
            let catalysis: f64 = reaction.catalysts.iter()
                .filter(|&&c| ledger.has_output(c))
                .map(|&c| ledger.output(c))
                .sum();
            gate *= 2.0 * t.sigmoid(catalysis);
        }

        let (mut pos, mut neg, mut req) = (None, None, None);
        for reg in &reaction.regulators {
            if !ledger.has_output(reg.node) {
                continue;
            }
            let slot = match reg.kind {
                RegulationKind::Positive => &mut pos,
                RegulationKind::Negative => &mut neg,
                RegulationKind::Requirement => &mut req,
            };
            *slot = Some(slot.unwrap_or(0.0) + ledger.output(reg.node));
        }
        if let Some(x) = pos { gate *= 1.0 + t.sigmoid(x); }
        if let Some(x) = neg { gate *= 1.0 - t.sigmoid(x); }
        if let Some(x) = req { gate *= t.sigmoid(x); }

        gate
    }
}

/// Change between two outputs. Gaining or losing an output is an infinite
/// change; staying undefined is none.
#[inline]
fn delta(before: f64, after: f64) -> f64 {
    match (before.is_nan(), after.is_nan()) {
        (true, true) => 0.0,
        (false, false) => (after - before).abs(),
        _ => f64::INFINITY,
    }
}
