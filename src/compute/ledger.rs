//! ledger.rs
//! Per-run node state, kept apart from the registry topology.

use crate::store::NodeId;

/// Mutable run state for every node: the current `output` and an optional
/// externally pinned `fixed_output`.
///
/// An output of `NaN` means "no output"; it is skipped by consumers and
/// reported as undefined by monitors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    outputs: Vec<f64>,
    fixed: Vec<Option<f64>>,
}

impl Ledger {
    pub fn new(size: usize) -> Self {
        Self { outputs: vec![0.0; size], fixed: vec![None; size] }
    }

    pub fn len(&self) -> usize { self.outputs.len() }

    pub fn is_empty(&self) -> bool { self.outputs.is_empty() }

    /// Sets every output to 0 and clears every fixed output.
    pub fn reset(&mut self) {
        self.outputs.iter_mut().for_each(|o| *o = 0.0);
        self.fixed.iter_mut().for_each(|f| *f = None);
    }

    /// Resets and resizes to `size` nodes (used after the registry is pruned).
    pub fn resize(&mut self, size: usize) {
        self.outputs.resize(size, 0.0);
        self.fixed.resize(size, None);
        self.reset();
    }

    #[inline(always)]
    pub fn output(&self, id: NodeId) -> f64 { self.outputs[id.index()] }

    #[inline(always)]
    pub fn set_output(&mut self, id: NodeId, value: f64) { self.outputs[id.index()] = value; }

    #[inline(always)]
    pub fn has_output(&self, id: NodeId) -> bool { !self.outputs[id.index()].is_nan() }

    #[inline(always)]
    pub fn fixed_output(&self, id: NodeId) -> Option<f64> { self.fixed[id.index()] }

    pub fn is_fixed(&self, id: NodeId) -> bool { self.fixed[id.index()].is_some() }

    pub fn fix(&mut self, id: NodeId, value: f64) { self.fixed[id.index()] = Some(value); }

    pub fn outputs(&self) -> &[f64] { &self.outputs }
}
