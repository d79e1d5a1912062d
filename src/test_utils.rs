//! Shared fixtures for unit tests.
use crate::experiment::Experiment;
use crate::store::{NodeKind, ReactionFamily, Registry, RegulationKind};

pub const CYTOSOL: u64 = 1;
pub const TP53: u64 = 10;
pub const MDM2: u64 = 11;
pub const ATP: u64 = 12;
pub const ORPHAN: u64 = 13;
pub const BINDING: u64 = 20;
pub const UBIQUITINATION: u64 = 21;
pub const UNRELATED: u64 = 22;
pub const COMPLEX: u64 = 30;
pub const PATHWAY: u64 = 40;
pub const FEEDBACK: u64 = 50;

pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init();
}

/// A small circuit with one feedback loop:
///
/// ```text
/// TP53, MDM2, ATP -> binding -> ubiquitination -> feedback -> binding
///                    ubiquitination: catalyst MDM2, inhibited by TP53
/// ORPHAN -> unrelated
/// ```
///
/// Only TP53 and MDM2 carry gene ids. The compartment, complex and pathway
/// nodes hang off the circuit without causal edges.
pub fn small_circuit() -> Registry {
    let mut reg = Registry::new();
    let cytosol = reg.add_node(CYTOSOL, NodeKind::from_tag("EntityCompartment"), "cytosol").unwrap();
    let tp53 = reg.add_node(TP53, NodeKind::Generic, "TP53 [cytosol]").unwrap();
    let mdm2 = reg.add_node(MDM2, NodeKind::Generic, "MDM2 [cytosol]").unwrap();
    let atp = reg.add_node(ATP, NodeKind::Generic, "ATP [cytosol]").unwrap();
    let orphan = reg.add_node(ORPHAN, NodeKind::Generic, "orphan metabolite").unwrap();
    let binding = reg.add_node(BINDING, NodeKind::reaction(ReactionFamily::Reaction), "TP53 binds MDM2").unwrap();
    let ubiq = reg
        .add_node(UBIQUITINATION, NodeKind::reaction(ReactionFamily::Reaction), "MDM2 ubiquitinates TP53")
        .unwrap();
    let unrelated = reg
        .add_node(UNRELATED, NodeKind::reaction(ReactionFamily::BlackBoxEvent), "unrelated event")
        .unwrap();
    let complex = reg.add_node(COMPLEX, NodeKind::from_tag("Complex"), "TP53:MDM2 [cytosol]").unwrap();
    let pathway = reg.add_node(PATHWAY, NodeKind::from_tag("Pathway"), "p53 signalling").unwrap();
    let feedback = reg.add_node(FEEDBACK, NodeKind::reaction(ReactionFamily::Reaction), "feedback").unwrap();

    for n in [tp53, mdm2, atp] {
        reg.add_input(binding, n).unwrap();
        reg.set_compartment(n, cytosol).unwrap();
    }
    reg.add_output(binding, complex).unwrap();
    reg.add_output(binding, ubiq).unwrap();
    reg.add_catalyst(ubiq, mdm2).unwrap();
    reg.add_regulator(ubiq, tp53, RegulationKind::Negative).unwrap();
    reg.add_output(ubiq, feedback).unwrap();
    reg.add_output(feedback, binding).unwrap();
    reg.add_input(unrelated, orphan).unwrap();
    reg.add_component(complex, tp53).unwrap();
    reg.add_component(complex, mdm2).unwrap();
    reg.add_event(pathway, binding).unwrap();
    reg.add_event(pathway, ubiq).unwrap();

    reg.map_gene("ENSG00000141510", tp53);
    reg.map_gene("ENSG00000135679", mdm2);
    reg
}

pub fn experiments() -> Vec<Experiment> {
    let mut lung = Experiment::new("Lung adenocarcinoma");
    lung.insert("ENSG00000141510", 0.8);
    lung.insert("ENSG00000135679", -0.3);

    let mut liver = Experiment::new("Liver");
    liver.insert("ENSG00000141510", 0.1);
    liver.insert("ENSG00000135679", f64::NAN);
    liver.insert("ENSG_NOT_IN_GRAPH", 0.5);

    let empty = Experiment::new("Empty panel");

    let mut lung_normal = Experiment::new("Lung normal");
    lung_normal.insert("ENSG00000141510", -0.2);
    lung_normal.insert("ENSG00000135679", 0.4);

    vec![lung, liver, empty, lung_normal]
}
