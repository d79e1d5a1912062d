//! Many-to-many association between external gene ids and nodes.

use super::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneIndex {
    by_gene: BTreeMap<String, Vec<NodeId>>,

    // Inverse map. Not serialized, rebuilt on load.
    #[serde(skip)]
    by_node: BTreeMap<NodeId, BTreeSet<String>>,
}

impl GeneIndex {
    pub fn new() -> Self { Self::default() }

    /// Associates `gene_id` with `node`. Returns `false` if the pair was already present.
    pub fn insert(&mut self, gene_id: &str, node: NodeId) -> bool {
        let genes = self.by_node.entry(node).or_default();
        if !genes.insert(gene_id.to_string()) {
            return false;
        }
        self.by_gene.entry(gene_id.to_string()).or_default().push(node);
        true
    }

    /// Nodes mapped to `gene_id`, in insertion order.
    pub fn nodes_for(&self, gene_id: &str) -> &[NodeId] {
        self.by_gene.get(gene_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn genes_for(&self, node: NodeId) -> impl Iterator<Item = &str> {
        self.by_node.get(&node).into_iter().flatten().map(String::as_str)
    }

    /// True if the node carries at least one gene id.
    pub fn is_anchored(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    pub fn gene_count(&self) -> usize { self.by_gene.len() }

    pub fn anchored_count(&self) -> usize { self.by_node.len() }

    pub fn anchored_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.by_node.keys().copied()
    }

    /// Every (gene, node) association, ordered by gene.
    pub fn associations(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.by_gene.iter().flat_map(|(gene, nodes)| nodes.iter().map(move |&n| (gene.as_str(), n)))
    }

    /// Rebuilds the node -> genes map after deserialization.
    pub fn rebuild_inverse(&mut self) {
        self.by_node.clear();
        for (gene, nodes) in &self.by_gene {
            for &node in nodes {
                self.by_node.entry(node).or_default().insert(gene.clone());
            }
        }
    }

    /// Rewrites node ids after an arena compaction. Associations whose node
    /// maps to `None` are dropped, and so are genes left without nodes.
    pub(crate) fn remap(&mut self, remap: impl Fn(NodeId) -> Option<NodeId>) {
        self.by_node = std::mem::take(&mut self.by_node)
            .into_iter()
            .filter_map(|(node, genes)| remap(node).map(|n| (n, genes)))
            .collect();

        for nodes in self.by_gene.values_mut() {
            *nodes = nodes.iter().filter_map(|&n| remap(n)).collect();
        }
        self.by_gene.retain(|_, nodes| !nodes.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_deduplicated() {
        let mut idx = GeneIndex::new();
        assert!(idx.insert("ENSG01", NodeId(1)));
        assert!(!idx.insert("ENSG01", NodeId(1)));
        assert!(idx.insert("ENSG01", NodeId(2)));
        assert!(idx.insert("ENSG02", NodeId(1)));

        assert_eq!(idx.nodes_for("ENSG01"), &[NodeId(1), NodeId(2)]);
        assert_eq!(idx.genes_for(NodeId(1)).collect::<Vec<_>>(), vec!["ENSG01", "ENSG02"]);
        assert_eq!(idx.gene_count(), 2);
        assert_eq!(idx.anchored_count(), 2);
        assert!(idx.nodes_for("ENSG99").is_empty());
    }

    #[test]
    fn test_remap_drops_orphaned_genes() {
        let mut idx = GeneIndex::new();
        idx.insert("ENSG01", NodeId(0));
        idx.insert("ENSG02", NodeId(3));

        idx.remap(|n| if n.0 == 0 { None } else { Some(NodeId(n.0 - 1)) });

        assert!(idx.nodes_for("ENSG01").is_empty());
        assert_eq!(idx.nodes_for("ENSG02"), &[NodeId(2)]);
        assert!(idx.is_anchored(NodeId(2)));
        assert!(!idx.is_anchored(NodeId(0)));
        assert_eq!(idx.gene_count(), 1);
    }

    #[test]
    fn test_inverse_survives_serde() {
        let mut idx = GeneIndex::new();
        idx.insert("ENSG01", NodeId(4));
        idx.insert("ENSG02", NodeId(4));

        let json = serde_json::to_string(&idx).unwrap();
        let mut loaded: GeneIndex = serde_json::from_str(&json).unwrap();
        assert!(!loaded.is_anchored(NodeId(4)));

        loaded.rebuild_inverse();
        assert_eq!(loaded, idx);
    }
}
