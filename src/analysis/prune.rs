//! Removes every node whose output can never be influenced by an anchor.

use crate::compute::{Engine, EngineConfig, Ledger};
use crate::store::Registry;
use log::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    /// Distinct gene ids in the index.
    pub genes: usize,
    pub removed: usize,
    pub remaining: usize,
}

/// Keeps a node iff it is gene-anchored or its reachability closure contains
/// a gene-anchored node, then compacts the registry.
///
/// Closures are taken from [`Engine::trace`] on a scratch ledger, so they
/// follow exactly the edges the engine follows.
pub fn simplify(registry: &mut Registry, config: &EngineConfig) -> PruneReport {
    let genes = registry.genes().gene_count();
    info!("Simplifying: {} nodes, {} genes, {} anchored nodes",
        registry.count(), genes, registry.genes().anchored_count());

    let keep: Vec<bool> = {
        let engine = Engine::new(registry, config);
        let mut scratch = Ledger::new(registry.count());
        let index = registry.genes();
        registry
            .node_ids()
            .map(|id| {
                if index.is_anchored(id) {
                    return true;
                }
                let trace = engine.trace(id, &mut scratch);
                let keep = trace.visited.iter().any(|n| index.is_anchored(n));
                if !keep {
                    debug!("Pruning {} '{}'", registry.meta(id).db_id, registry.name(id));
                }
                keep
            })
            .collect()
    };

    let removed = registry.retain(&keep);
    let report = PruneReport { genes, removed, remaining: registry.count() };
    info!("Removed {} nodes, {} remaining", report.removed, report.remaining);
    report
}
