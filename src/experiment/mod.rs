//! Experiments and the driver that runs them through the engine.
mod parallel;
mod runner;

pub use runner::{RunReport, RunSummary, Runner};

use crate::compute::Ledger;
use crate::store::Registry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One labeled set of anchor values, keyed by external gene id.
///
/// `None` marks a value that is present in the source but undefined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub label: String,
    #[serde(default)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Experiment {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into(), values: BTreeMap::new() }
    }

    /// Sets the value for `gene_id`. NaN is stored as undefined.
    pub fn insert(&mut self, gene_id: impl Into<String>, value: f64) {
        let value = if value.is_nan() { None } else { Some(value) };
        self.values.insert(gene_id.into(), value);
    }

    /// The defined value for `gene_id`, if any.
    pub fn value(&self, gene_id: &str) -> Option<f64> {
        self.values.get(gene_id).copied().flatten()
    }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// True if at least one value is defined, i.e. the experiment can pin
    /// some node.
    pub fn has_usable_values(&self) -> bool {
        self.values.values().any(Option::is_some)
    }

    /// Case-insensitive substring match on the label.
    pub fn matches(&self, name_filter: Option<&str>) -> bool {
        match name_filter {
            None => true,
            Some(filter) => self.label.to_lowercase().contains(&filter.to_lowercase()),
        }
    }
}

/// Counters from injecting one experiment's values into a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnchorStats {
    /// Genes with a defined value and at least one node.
    pub matched_genes: usize,
    /// Genes with no node in the registry.
    pub unmatched_genes: usize,
    /// Genes present in the registry whose value is undefined.
    pub undefined_values: usize,
    /// Nodes whose output got pinned.
    pub fixed_nodes: usize,
}

/// Pins the output of every node mapped to a gene with a defined value.
/// Missing genes and undefined values are counted, never rejected.
pub fn inject_anchors(registry: &Registry, ledger: &mut Ledger, experiment: &Experiment) -> AnchorStats {
    let mut stats = AnchorStats::default();
    for (gene, value) in &experiment.values {
        let nodes = registry.genes().nodes_for(gene);
        if nodes.is_empty() {
            stats.unmatched_genes += 1;
            continue;
        }
        let Some(value) = *value else {
            stats.undefined_values += 1;
            continue;
        };
        stats.matched_genes += 1;
        for &node in nodes {
            if !ledger.is_fixed(node) {
                stats.fixed_nodes += 1;
            }
            ledger.fix(node, value);
        }
    }
    stats
}
