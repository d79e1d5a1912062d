//! Node model: arena ids, node kinds and the reaction payload.

use super::error::GraphError;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Dense index of a node inside a [`Registry`](super::Registry).
///
/// Indices are only stable until the next bulk removal (`Registry::retain`);
/// the external `db_id` in [`NodeMetadata`] is the stable identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(&self) -> usize { self.0 as usize }
    pub fn new(idx: usize) -> Self { Self(idx as u32) }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// Identifier from the relational source (process unique).
    pub db_id: u64,
    pub name: String,
}

/// How a regulator acts on the reaction it is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegulationKind {
    Positive,
    Negative,
    Requirement,
}

impl FromStr for RegulationKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PositiveRegulation" => Ok(RegulationKind::Positive),
            "NegativeRegulation" => Ok(RegulationKind::Negative),
            "Requirement" => Ok(RegulationKind::Requirement),
            other => Err(GraphError::UnknownRegulation(other.to_string())),
        }
    }
}

impl fmt::Display for RegulationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegulationKind::Positive => "PositiveRegulation",
            RegulationKind::Negative => "NegativeRegulation",
            RegulationKind::Requirement => "Requirement",
        };
        f.write_str(s)
    }
}

/// The reaction-like event classes. They all compute the same way; the
/// family is kept for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionFamily {
    Reaction,
    BlackBoxEvent,
    Polymerisation,
    Depolymerisation,
    CatalystActivity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub node: NodeId,
    /// Multiplicity of the input. Repeated inputs accumulate here.
    pub stoichiometry: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regulator {
    pub node: NodeId,
    pub kind: RegulationKind,
}

/// Edges owned by a reaction-family node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub family: ReactionFamily,
    pub inputs: SmallVec<[Input; 4]>,
    pub outputs: SmallVec<[NodeId; 4]>,
    pub catalysts: SmallVec<[NodeId; 2]>,
    pub regulators: SmallVec<[Regulator; 2]>,
}

impl Reaction {
    pub fn new(family: ReactionFamily) -> Self {
        Self {
            family,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            catalysts: SmallVec::new(),
            regulators: SmallVec::new(),
        }
    }

    pub(crate) fn add_input(&mut self, node: NodeId) {
        match self.inputs.iter_mut().find(|i| i.node == node) {
            Some(existing) => existing.stoichiometry += 1.0,
            None => self.inputs.push(Input { node, stoichiometry: 1.0 }),
        }
    }

    pub(crate) fn add_output(&mut self, node: NodeId) {
        if !self.outputs.contains(&node) {
            self.outputs.push(node);
        }
    }

    pub(crate) fn add_catalyst(&mut self, node: NodeId) {
        if !self.catalysts.contains(&node) {
            self.catalysts.push(node);
        }
    }

    pub(crate) fn add_regulator(&mut self, node: NodeId, kind: RegulationKind) {
        match self.regulators.iter_mut().find(|r| r.node == node) {
            Some(existing) => existing.kind = kind,
            None => self.regulators.push(Regulator { node, kind }),
        }
    }

    /// Every node whose output feeds this reaction's computation, in
    /// evaluation order: inputs, catalysts, regulators.
    pub fn dependencies(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.inputs.iter().map(|i| i.node)
            .chain(self.catalysts.iter().copied())
            .chain(self.regulators.iter().map(|r| r.node))
    }

    /// The `i`-th entry of [`Reaction::dependencies`], without building the iterator.
    pub fn dependency(&self, i: usize) -> Option<NodeId> {
        let (n_in, n_cat) = (self.inputs.len(), self.catalysts.len());
        if i < n_in {
            Some(self.inputs[i].node)
        } else if i < n_in + n_cat {
            Some(self.catalysts[i - n_in])
        } else {
            self.regulators.get(i - n_in - n_cat).map(|r| r.node)
        }
    }

    /// Applies `remap` to every edge, dropping edges it maps to `None`.
    pub(crate) fn remap(&mut self, remap: impl Fn(NodeId) -> Option<NodeId>) {
        self.inputs.retain(|i| match remap(i.node) {
            Some(n) => { i.node = n; true }
            None => false,
        });
        self.outputs = self.outputs.iter().filter_map(|&n| remap(n)).collect();
        self.catalysts = self.catalysts.iter().filter_map(|&n| remap(n)).collect();
        self.regulators.retain(|r| match remap(r.node) {
            Some(n) => { r.node = n; true }
            None => false,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Plain physical entity; its output is its weight.
    Generic,
    /// Pure grouping target for `Registry::set_compartment`.
    Compartment,
    /// Composition of other nodes. Components are not causal inputs.
    Complex { components: SmallVec<[NodeId; 4]> },
    Reaction(Reaction),
    /// Event container (pathway -> sub-events). Not computed from its events.
    Pathway { events: SmallVec<[NodeId; 4]> },
}

impl NodeKind {
    /// Resolves a class name from the relational dump. Unknown class names
    /// fall back to [`NodeKind::Generic`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Complex" => NodeKind::Complex { components: SmallVec::new() },
            "EntityCompartment" | "Compartment" | "GO_CellularComponent" => NodeKind::Compartment,
            "Reaction" => NodeKind::Reaction(Reaction::new(ReactionFamily::Reaction)),
            "BlackBoxEvent" => NodeKind::Reaction(Reaction::new(ReactionFamily::BlackBoxEvent)),
            "Polymerisation" => NodeKind::Reaction(Reaction::new(ReactionFamily::Polymerisation)),
            "Depolymerisation" => NodeKind::Reaction(Reaction::new(ReactionFamily::Depolymerisation)),
            "CatalystActivity" => NodeKind::Reaction(Reaction::new(ReactionFamily::CatalystActivity)),
            "Pathway" => NodeKind::Pathway { events: SmallVec::new() },
            _ => NodeKind::Generic,
        }
    }

    pub fn reaction(family: ReactionFamily) -> Self {
        NodeKind::Reaction(Reaction::new(family))
    }

    pub fn is_reaction(&self) -> bool {
        matches!(self, NodeKind::Reaction(_))
    }

    pub fn as_reaction(&self) -> Option<&Reaction> {
        match self {
            NodeKind::Reaction(r) => Some(r),
            _ => None,
        }
    }

    /// Short label used by census output and traces.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Generic => "Entity",
            NodeKind::Compartment => "Compartment",
            NodeKind::Complex { .. } => "Complex",
            NodeKind::Pathway { .. } => "Pathway",
            NodeKind::Reaction(r) => match r.family {
                ReactionFamily::Reaction => "Reaction",
                ReactionFamily::BlackBoxEvent => "BlackBoxEvent",
                ReactionFamily::Polymerisation => "Polymerisation",
                ReactionFamily::Depolymerisation => "Depolymerisation",
                ReactionFamily::CatalystActivity => "CatalystActivity",
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Complex", "Complex")]
    #[case("EntityCompartment", "Compartment")]
    #[case("GO_CellularComponent", "Compartment")]
    #[case("BlackBoxEvent", "BlackBoxEvent")]
    #[case("CatalystActivity", "CatalystActivity")]
    #[case("Pathway", "Pathway")]
    #[case("SimpleEntity", "Entity")]
    #[case("EntityWithAccessionedSequence", "Entity")]
    fn test_kind_from_tag(#[case] tag: &str, #[case] expected: &str) {
        assert_eq!(NodeKind::from_tag(tag).label(), expected);
    }

    #[test]
    fn test_regulation_kind_parsing() {
        assert_eq!("PositiveRegulation".parse::<RegulationKind>().unwrap(), RegulationKind::Positive);
        assert_eq!("Requirement".parse::<RegulationKind>().unwrap(), RegulationKind::Requirement);
        let err = "Inhibition".parse::<RegulationKind>().unwrap_err();
        assert_eq!(err, GraphError::UnknownRegulation("Inhibition".into()));
    }

    #[test]
    fn test_repeated_input_accumulates_stoichiometry() {
        let mut r = Reaction::new(ReactionFamily::Reaction);
        r.add_input(NodeId(3));
        r.add_input(NodeId(3));
        r.add_input(NodeId(4));
        assert_eq!(r.inputs.len(), 2);
        assert_eq!(r.inputs[0].stoichiometry, 2.0);
    }

    #[test]
    fn test_remap_drops_removed_edges() {
        let mut r = Reaction::new(ReactionFamily::Reaction);
        r.add_input(NodeId(0));
        r.add_input(NodeId(5));
        r.add_catalyst(NodeId(5));
        r.add_regulator(NodeId(2), RegulationKind::Negative);
        r.add_output(NodeId(7));

        // Node 5 removed, everything else shifts down by one.
        r.remap(|n| if n.0 == 5 { None } else { Some(NodeId(n.0.saturating_sub(1))) });

        assert_eq!(r.inputs.len(), 1);
        assert!(r.catalysts.is_empty());
        assert_eq!(r.regulators[0].node, NodeId(1));
        assert_eq!(r.outputs.as_slice(), &[NodeId(6)]);
    }
}
