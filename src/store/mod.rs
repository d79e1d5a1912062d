//! The graph store: node model, arena registry and gene index.
mod error;
mod genes;
mod registry;
mod types;

pub use error::GraphError;
pub use genes::GeneIndex;
pub use registry::Registry;
pub use types::{Input, NodeId, NodeKind, NodeMetadata, Reaction, ReactionFamily, RegulationKind, Regulator};
