use super::error::GraphError;
use super::genes::GeneIndex;
use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Owns every node of the circuit in a dense columnar arena.
///
/// Topology and weights live here; per-run values live in a
/// [`Ledger`](crate::compute::Ledger) so the registry can be shared read-only
/// between experiments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    // Columnar Arrays
    pub kinds: Vec<NodeKind>,
    pub meta: Vec<NodeMetadata>,
    pub weights: Vec<Option<f64>>,
    pub compartments: Vec<Option<NodeId>>,
    // Survives pruning of the compartment itself, so a node can never be reassigned.
    #[serde(default)]
    compartment_assigned: Vec<bool>,

    genes: GeneIndex,

    // Ephemeral lookup by external id (Not serialized, rebuilt on load)
    #[serde(skip)]
    by_db_id: HashMap<u64, NodeId>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.kinds.len() }

    /// Validates a deserialized checkpoint and rebuilds the derived lookups.
    ///
    /// Rejects column length mismatches, duplicate external ids, and any
    /// edge, compartment or gene association pointing outside the arena.
    pub fn rebuild_index(&mut self) -> Result<(), GraphError> {
        let count = self.count();
        if self.compartment_assigned.is_empty() {
            self.compartment_assigned = self.compartments.iter().map(Option::is_some).collect();
        }
        let columns = [
            ("meta", self.meta.len()),
            ("weights", self.weights.len()),
            ("compartments", self.compartments.len()),
            ("compartment_assigned", self.compartment_assigned.len()),
        ];
        for (column, len) in columns {
            if len != count {
                return Err(GraphError::InvalidCheckpoint(format!("{} has {} entries, expected {}", column, len, count)));
            }
        }

        let out_of_range = |owner: usize, target: NodeId| -> Result<(), GraphError> {
            if target.index() < count {
                return Ok(());
            }
            Err(GraphError::InvalidCheckpoint(format!(
                "node {} references index {} (only {} nodes)", self.meta[owner].db_id, target.index(), count)))
        };
        for (i, kind) in self.kinds.iter().enumerate() {
            match kind {
                NodeKind::Reaction(r) => {
                    for target in r.dependencies().chain(r.outputs.iter().copied()) {
                        out_of_range(i, target)?;
                    }
                }
                NodeKind::Complex { components: nodes } | NodeKind::Pathway { events: nodes } => {
                    for &target in nodes {
                        out_of_range(i, target)?;
                    }
                }
                NodeKind::Generic | NodeKind::Compartment => {}
            }
            if let Some(c) = self.compartments[i] {
                out_of_range(i, c)?;
            }
        }
        if let Some((gene, node)) = self.genes.associations().find(|(_, n)| n.index() >= count) {
            return Err(GraphError::InvalidCheckpoint(format!("gene {} maps to index {}", gene, node.index())));
        }

        let mut by_db_id = HashMap::with_capacity(count);
        for (i, m) in self.meta.iter().enumerate() {
            if by_db_id.insert(m.db_id, NodeId::new(i)).is_some() {
                return Err(GraphError::DuplicateId(m.db_id));
            }
        }
        self.by_db_id = by_db_id;
        self.genes.rebuild_inverse();
        Ok(())
    }

    pub fn add_node(&mut self, db_id: u64, kind: NodeKind, name: impl Into<String>) -> Result<NodeId, GraphError> {
        if self.by_db_id.contains_key(&db_id) {
            return Err(GraphError::DuplicateId(db_id));
        }
        let id = NodeId::new(self.kinds.len());
        self.kinds.push(kind);
        self.meta.push(NodeMetadata { db_id, name: name.into() });
        self.weights.push(None);
        self.compartments.push(None);
        self.compartment_assigned.push(false);
        self.by_db_id.insert(db_id, id);
        Ok(id)
    }

    pub fn node_id(&self, db_id: u64) -> Option<NodeId> {
        self.by_db_id.get(&db_id).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.count()).map(NodeId::new)
    }

    #[inline(always)]
    pub fn kind(&self, id: NodeId) -> &NodeKind { &self.kinds[id.index()] }
    pub fn meta(&self, id: NodeId) -> &NodeMetadata { &self.meta[id.index()] }
    pub fn name(&self, id: NodeId) -> &str { &self.meta[id.index()].name }
    #[inline(always)]
    pub fn weight(&self, id: NodeId) -> Option<f64> { self.weights[id.index()] }
    pub fn compartment(&self, id: NodeId) -> Option<NodeId> { self.compartments[id.index()] }
    pub fn genes(&self) -> &GeneIndex { &self.genes }

    pub fn set_weight(&mut self, id: NodeId, weight: Option<f64>) {
        self.weights[id.index()] = weight;
    }

    pub fn reactions(&self) -> impl Iterator<Item = (NodeId, &Reaction)> {
        self.kinds.iter().enumerate().filter_map(|(i, k)| k.as_reaction().map(|r| (NodeId::new(i), r)))
    }

    // --- Edge builders ---

    fn reaction_mut(&mut self, id: NodeId) -> Result<&mut Reaction, GraphError> {
        let db_id = self.meta[id.index()].db_id;
        match &mut self.kinds[id.index()] {
            NodeKind::Reaction(r) => Ok(r),
            other => Err(GraphError::KindMismatch { db_id, expected: "reaction", actual: other.label() }),
        }
    }

    pub fn add_input(&mut self, reaction: NodeId, input: NodeId) -> Result<(), GraphError> {
        self.reaction_mut(reaction)?.add_input(input);
        Ok(())
    }

    /// Adds `output` as a product of `reaction`. A reaction-family output is
    /// chained: it also receives `reaction` as one of its inputs.
    pub fn add_output(&mut self, reaction: NodeId, output: NodeId) -> Result<(), GraphError> {
        self.reaction_mut(reaction)?.add_output(output);
        if let NodeKind::Reaction(downstream) = &mut self.kinds[output.index()] {
            downstream.add_input(reaction);
        }
        Ok(())
    }

    pub fn add_catalyst(&mut self, reaction: NodeId, catalyst: NodeId) -> Result<(), GraphError> {
        self.reaction_mut(reaction)?.add_catalyst(catalyst);
        Ok(())
    }

    pub fn add_regulator(&mut self, reaction: NodeId, regulator: NodeId, kind: RegulationKind) -> Result<(), GraphError> {
        self.reaction_mut(reaction)?.add_regulator(regulator, kind);
        Ok(())
    }

    pub fn add_component(&mut self, complex: NodeId, component: NodeId) -> Result<(), GraphError> {
        let db_id = self.meta[complex.index()].db_id;
        match &mut self.kinds[complex.index()] {
            NodeKind::Complex { components } => {
                components.push(component);
                Ok(())
            }
            other => Err(GraphError::KindMismatch { db_id, expected: "Complex", actual: other.label() }),
        }
    }

    pub fn add_event(&mut self, pathway: NodeId, event: NodeId) -> Result<(), GraphError> {
        let db_id = self.meta[pathway.index()].db_id;
        match &mut self.kinds[pathway.index()] {
            NodeKind::Pathway { events } => {
                if !events.contains(&event) {
                    events.push(event);
                }
                Ok(())
            }
            other => Err(GraphError::KindMismatch { db_id, expected: "Pathway", actual: other.label() }),
        }
    }

    /// Assigns the node's compartment. A compartment can only be set once,
    /// even after the compartment node itself has been pruned.
    pub fn set_compartment(&mut self, node: NodeId, compartment: NodeId) -> Result<(), GraphError> {
        if !matches!(self.kinds[compartment.index()], NodeKind::Compartment) {
            return Err(GraphError::NotACompartment(self.meta[compartment.index()].db_id));
        }
        if self.compartment_assigned[node.index()] {
            let meta = &self.meta[node.index()];
            return Err(GraphError::CompartmentAlreadyAssigned { db_id: meta.db_id, name: meta.name.clone() });
        }
        self.compartment_assigned[node.index()] = true;
        self.compartments[node.index()] = Some(compartment);
        Ok(())
    }

    /// Associates an external gene id with a node. Returns `false` if the
    /// association already existed.
    pub fn map_gene(&mut self, gene_id: &str, node: NodeId) -> bool {
        self.genes.insert(gene_id, node)
    }

    // --- Bulk removal ---

    /// Keeps only the nodes for which `keep[index]` is true and compacts the
    /// arena. Every edge, compartment and gene association pointing at a
    /// removed node is dropped. Returns the number of removed nodes.
    pub fn retain(&mut self, keep: &[bool]) -> usize {
        let count = self.count();
        let mut new_index = vec![None; count];
        let mut next = 0u32;
        for (i, slot) in new_index.iter_mut().enumerate() {
            if keep.get(i).copied().unwrap_or(false) {
                *slot = Some(NodeId(next));
                next += 1;
            }
        }
        let removed = count - next as usize;
        if removed == 0 {
            return 0;
        }

        let remap = |id: NodeId| new_index[id.index()];

        self.compartment_assigned = std::mem::take(&mut self.compartment_assigned)
            .into_iter()
            .enumerate()
            .filter_map(|(i, assigned)| new_index[i].map(|_| assigned))
            .collect();

        let mut kinds = Vec::with_capacity(next as usize);
        let mut meta = Vec::with_capacity(next as usize);
        let mut weights = Vec::with_capacity(next as usize);
        let mut compartments = Vec::with_capacity(next as usize);

        let old = (
            std::mem::take(&mut self.kinds),
            std::mem::take(&mut self.meta),
            std::mem::take(&mut self.weights),
            std::mem::take(&mut self.compartments),
        );
        for (i, (((mut kind, m), w), c)) in old.0.into_iter().zip(old.1).zip(old.2).zip(old.3).enumerate() {
            if new_index[i].is_none() {
                continue;
            }
            match &mut kind {
                NodeKind::Reaction(r) => r.remap(remap),
                NodeKind::Complex { components } => {
                    *components = components.iter().filter_map(|&n| remap(n)).collect();
                }
                NodeKind::Pathway { events } => {
                    *events = events.iter().filter_map(|&n| remap(n)).collect();
                }
                NodeKind::Generic | NodeKind::Compartment => {}
            }
            kinds.push(kind);
            meta.push(m);
            weights.push(w);
            compartments.push(c.and_then(remap));
        }

        self.kinds = kinds;
        self.meta = meta;
        self.weights = weights;
        self.compartments = compartments;
        self.genes.remap(remap);
        self.by_db_id = self.meta.iter().enumerate().map(|(i, m)| (m.db_id, NodeId::new(i))).collect();

        removed
    }

    /// Number of nodes per kind label.
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for kind in &self.kinds {
            *counts.entry(kind.label()).or_insert(0) += 1;
        }
        counts
    }
}
