//! Human-readable output: monitor matrices and causal trace trees.
pub mod monitor;
pub mod trace;

pub use monitor::Monitor;
pub use trace::format_trace;
