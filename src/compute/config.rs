use super::transfer::Transfer;
use crate::analysis::scaling::WeightScaling;
use serde::{Deserialize, Serialize};

/// Largest per-node change that still counts as "converged".
pub const MAX_CONVERGENCE_DIFFERENCE: f64 = 1e-3;
pub const MAX_ITERATIONS: usize = 1000;

/// A "flat" configuration object for the propagation engine.
///
/// Passed explicitly into [`Engine::new`](super::Engine::new); nothing in the
/// engine reads global state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nonlinearity applied to each reaction's aggregated input.
    pub transfer: Transfer,
    /// A pass "changed" if some node moved by more than this (default: `1e-3`).
    pub convergence_threshold: f64,
    /// Stop after this many passes even without convergence (default: `1000`).
    ///
    /// Hitting the cap is not an error: the last computed values are kept.
    pub max_iterations: usize,
    /// How reaction weights are rescaled before each experiment.
    pub weight_scaling: WeightScaling,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            transfer: Transfer::default(),
            convergence_threshold: MAX_CONVERGENCE_DIFFERENCE,
            max_iterations: MAX_ITERATIONS,
            weight_scaling: WeightScaling::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_transfer(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn with_weight_scaling(mut self, weight_scaling: WeightScaling) -> Self {
        self.weight_scaling = weight_scaling;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}
