//! The propagation engine: per-run ledger, transfer functions and the
//! memoized fixed-point iteration.
mod config;
mod engine;
mod ledger;
mod transfer;

pub use config::{EngineConfig, MAX_CONVERGENCE_DIFFERENCE, MAX_ITERATIONS};
pub use engine::{Convergence, Engine, Trace, VisitSet};
pub use ledger::Ledger;
pub use transfer::{Transfer, TransferFunction};
