// Crate root: a fixed-point propagation engine for pathway circuits.
// Topology lives in `store`, per-run values in `compute::Ledger`; everything
// else is built on those two.

pub mod analysis;
pub mod compute;
pub mod display;
pub mod experiment;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use analysis::{simplify, summarize, PruneReport, TopologySummary, WeightScaling};
pub use compute::{Convergence, Engine, EngineConfig, Ledger, Transfer, TransferFunction};
pub use display::{format_trace, Monitor};
pub use experiment::{Experiment, RunReport, RunSummary, Runner};
pub use store::{GraphError, NodeId, NodeKind, Registry};
