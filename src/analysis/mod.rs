//! Whole-graph passes that run outside the per-node engine.
pub mod prune;
pub mod scaling;
pub mod topology;

pub use prune::{simplify, PruneReport};
pub use scaling::{rescale, WeightScaling, MAX_WEIGHT_SUM};
pub use topology::{summarize, TopologySummary};
