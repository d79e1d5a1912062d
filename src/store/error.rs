//! Construction-time errors for the graph store.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate node id {0}")]
    DuplicateId(u64),
    #[error("Unknown node id {0}")]
    UnknownNode(u64),
    #[error("Compartment already assigned for node {db_id} ('{name}')")]
    CompartmentAlreadyAssigned { db_id: u64, name: String },
    #[error("Node {0} is not a compartment")]
    NotACompartment(u64),
    #[error("Node {db_id} is a {actual}, expected {expected}")]
    KindMismatch { db_id: u64, expected: &'static str, actual: &'static str },
    #[error("Unknown regulation type '{0}'")]
    UnknownRegulation(String),
    #[error("Invalid checkpoint: {0}")]
    InvalidCheckpoint(String),
}
