use crate::compute::Ledger;
use crate::store::{NodeId, NodeKind, Registry};
use std::collections::HashMap;
use std::fmt::Write;

/// Renders the causal tree feeding `target` with the values currently held in
/// `ledger`. A node already printed is shown as a reference to the depth it
/// first appeared at, so feedback loops terminate.
pub fn format_trace(registry: &Registry, ledger: &Ledger, target: NodeId) -> String {
    let mut tracer = Tracer {
        registry,
        ledger,
        visited_at_level: HashMap::new(),
        output: String::new(),
    };

    if target.index() < registry.count() {
        let meta = registry.meta(target);
        let _ = writeln!(tracer.output, "TRACE for node '{}' (id {}):", meta.name, meta.db_id);
        let _ = writeln!(tracer.output, "--------------------------------------------------");
        tracer.trace_node(target, 1, "", "");
    } else {
        let _ = writeln!(tracer.output, "Error: Invalid Node ID {:?}", target);
    }
    tracer.output
}

struct Tracer<'a> {
    registry: &'a Registry,
    ledger: &'a Ledger,
    visited_at_level: HashMap<NodeId, usize>,
    output: String,
}

impl<'a> Tracer<'a> {
    fn trace_node(&mut self, node_id: NodeId, level: usize, prefix: &str, role: &str) {
        let name = self.registry.name(node_id);
        if let Some(&first_seen) = self.visited_at_level.get(&node_id) {
            let _ = writeln!(self.output, "{}{}{} -> (Ref to L{})", prefix, role, name, first_seen);
            return;
        }
        self.visited_at_level.insert(node_id, level);

        let kind = self.registry.kind(node_id);
        let _ = writeln!(self.output, "{}[L{}] {}{} {} ({})",
            prefix, level, role, name, self.format_value(node_id), kind.label());

        let stem = build_child_stem(prefix);
        let children: Vec<(String, NodeId)> = match kind {
            NodeKind::Reaction(r) => {
                if !r.outputs.is_empty() {
                    let names: Vec<&str> = r.outputs.iter().map(|&o| self.registry.name(o)).collect();
                    let _ = writeln!(self.output, "{}|   outputs: {}", stem, names.join(", "));
                }
                let inputs = r.inputs.iter().map(|i| {
                    let role = if i.stoichiometry == 1.0 { "in: ".to_string() } else { format!("in x{}: ", i.stoichiometry) };
                    (role, i.node)
                });
                let catalysts = r.catalysts.iter().map(|&c| ("cat: ".to_string(), c));
                let regulators = r.regulators.iter().map(|reg| (format!("{}: ", reg.kind), reg.node));
                inputs.chain(catalysts).chain(regulators).collect()
            }
            NodeKind::Complex { components } => components.iter().map(|&c| ("part: ".to_string(), c)).collect(),
            _ => Vec::new(),
        };

        for (i, (role, child)) in children.iter().enumerate() {
            let connector = if i == children.len() - 1 { "`-- " } else { "|-- " };
            self.trace_node(*child, level + 1, &format!("{}{}", stem, connector), role);
        }
    }

    fn format_value(&self, id: NodeId) -> String {
        let value = self.ledger.output(id);
        match (value.is_nan(), self.ledger.is_fixed(id)) {
            (true, _) => "[?]".to_string(),
            (false, true) => format!("[{:.3} fixed]", value),
            (false, false) => format!("[{:.3}]", value),
        }
    }
}

fn build_child_stem(current_prefix: &str) -> String {
    current_prefix.replace("`-- ", "    ").replace("|-- ", "|   ")
}
