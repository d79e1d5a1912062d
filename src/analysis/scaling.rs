//! Per-experiment rescaling of reaction weights.

use crate::store::Registry;
use serde::{Deserialize, Serialize};

/// Input weight sums below this are considered already normalized.
pub const MAX_WEIGHT_SUM: f64 = 1.1;

/// Strategy used to set each reaction-family node's weight.
///
/// Every strategy is a pure function of the topology, so applying it once per
/// experiment is idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightScaling {
    /// Keep whatever the loader assigned.
    Preserve,
    /// Every reaction gets weight 1.0.
    Unit,
    /// Divide by the total input stoichiometry once it reaches `max_sum`, so a
    /// reaction averages its inputs instead of summing them.
    InverseFanIn { max_sum: f64 },
}

impl Default for WeightScaling {
    fn default() -> Self {
        WeightScaling::InverseFanIn { max_sum: MAX_WEIGHT_SUM }
    }
}

/// Applies `strategy` to every reaction-family node. Returns the number of
/// reactions whose weight ended up different from 1.0.
pub fn rescale(registry: &mut Registry, strategy: WeightScaling) -> usize {
    let updates: Vec<_> = match strategy {
        WeightScaling::Preserve => return 0,
        WeightScaling::Unit => registry.reactions().map(|(id, _)| (id, 1.0)).collect(),
        WeightScaling::InverseFanIn { max_sum } => registry
            .reactions()
            .map(|(id, r)| {
                let sum: f64 = r.inputs.iter().map(|i| i.stoichiometry.abs()).sum();
                let weight = if r.inputs.len() <= 1 || sum < max_sum { 1.0 } else { 1.0 / sum };
                (id, weight)
            })
            .collect(),
    };

    let mut scaled = 0;
    for (id, weight) in updates {
        if weight != 1.0 {
            scaled += 1;
        }
        registry.set_weight(id, Some(weight));
    }
    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::{Engine, EngineConfig, Ledger, Transfer};
    use crate::store::{NodeKind, ReactionFamily};

    fn fan_in(n: u64) -> (Registry, Vec<crate::store::NodeId>, crate::store::NodeId) {
        let mut reg = Registry::new();
        let inputs: Vec<_> = (0..n).map(|i| reg.add_node(i, NodeKind::Generic, format!("in{}", i)).unwrap()).collect();
        let r = reg.add_node(1000, NodeKind::reaction(ReactionFamily::Reaction), "R").unwrap();
        for &i in &inputs {
            reg.add_input(r, i).unwrap();
        }
        (reg, inputs, r)
    }

    #[test]
    fn test_inverse_fan_in_weights() {
        let (mut reg, _, r) = fan_in(4);
        let (mut single, _, s) = fan_in(1);

        assert_eq!(rescale(&mut reg, WeightScaling::default()), 1);
        assert_eq!(reg.weight(r), Some(0.25));

        rescale(&mut single, WeightScaling::default());
        assert_eq!(single.weight(s), Some(1.0));
    }

    #[test]
    fn test_rescale_is_idempotent() {
        let (mut reg, _, r) = fan_in(3);
        rescale(&mut reg, WeightScaling::default());
        let first = reg.weight(r);
        rescale(&mut reg, WeightScaling::default());
        assert_eq!(reg.weight(r), first);
    }

    #[test]
    fn test_preserve_keeps_loader_weights() {
        let (mut reg, _, r) = fan_in(3);
        reg.set_weight(r, Some(7.0));
        assert_eq!(rescale(&mut reg, WeightScaling::Preserve), 0);
        assert_eq!(reg.weight(r), Some(7.0));
        rescale(&mut reg, WeightScaling::Unit);
        assert_eq!(reg.weight(r), Some(1.0));
    }

    #[test]
    fn test_linear_reaction_output_stays_bounded() {
        // With inputs pinned anywhere in [-1, 1], a linear reaction never
        // leaves [-1, 1] once its weight is normalized by fan-in.
        for n in 1..8u64 {
            let (mut reg, inputs, r) = fan_in(n);
            rescale(&mut reg, WeightScaling::default());
            let cfg = EngineConfig::default().with_transfer(Transfer::linear());
            let engine = Engine::new(&reg, &cfg);

            for sign in [-1.0, 1.0] {
                let mut ledger = Ledger::new(reg.count());
                for (k, &i) in inputs.iter().enumerate() {
                    ledger.fix(i, sign * (1.0 - 0.1 * (k % 3) as f64));
                }
                engine.run_to_convergence(&mut ledger);
                let out = ledger.output(r);
                assert!(out.abs() <= 1.0, "fan-in {} gave {}", n, out);
            }
        }
    }
}
