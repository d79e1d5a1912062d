//! Per-experiment snapshots of a fixed set of node outputs.

use crate::compute::{Engine, EngineConfig, Ledger};
use crate::store::{NodeId, NodeMetadata, Registry};
use std::fmt::Write as _;
use std::io;

/// Records the outputs of a tracked node set after each experiment.
///
/// Rows are fixed when the monitor is built and ordered by `(name, db_id)`;
/// every snapshot is aligned with that order. Undefined outputs are kept as
/// NaN and rendered as `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Monitor {
    tracked: Vec<NodeId>,
    rows: Vec<NodeMetadata>,
    labels: Vec<String>,
    snapshots: Vec<Vec<f64>>,
}

impl Monitor {
    /// Tracks the given nodes. Duplicates are collapsed.
    pub fn from_nodes(registry: &Registry, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut tracked: Vec<NodeId> = nodes.into_iter().collect();
        tracked.sort_by(|&a, &b| {
            let (ma, mb) = (registry.meta(a), registry.meta(b));
            ma.name.cmp(&mb.name).then(ma.db_id.cmp(&mb.db_id))
        });
        tracked.dedup();
        let rows = tracked.iter().map(|&id| registry.meta(id).clone()).collect();
        Self { tracked, rows, labels: Vec::new(), snapshots: Vec::new() }
    }

    /// Every reaction-family node whose output is not pinned in `ledger`.
    pub fn reactions_without_fixed_output(registry: &Registry, ledger: &Ledger) -> Self {
        let nodes = registry.reactions().map(|(id, _)| id).filter(|&id| !ledger.is_fixed(id));
        Self::from_nodes(registry, nodes)
    }

    /// Every node reachable from `target` when computing it from a reset ledger.
    pub fn reachability_closure(registry: &Registry, config: &EngineConfig, target: NodeId) -> Self {
        let engine = Engine::new(registry, config);
        let mut scratch = Ledger::new(registry.count());
        let trace = engine.trace(target, &mut scratch);
        Self::from_nodes(registry, trace.visited.iter())
    }

    /// Appends one snapshot of the tracked outputs under `label`.
    pub fn add_result(&mut self, label: impl Into<String>, ledger: &Ledger) {
        self.labels.push(label.into());
        self.snapshots.push(self.tracked.iter().map(|&id| ledger.output(id)).collect());
    }

    /// Output of tracked row `row` in experiment number `experiment`.
    pub fn value(&self, row: usize, experiment: usize) -> Option<f64> {
        self.snapshots.get(experiment)?.get(row).copied()
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize { self.tracked.len() }

    pub fn is_empty(&self) -> bool { self.tracked.is_empty() }

    pub fn tracked(&self) -> &[NodeId] { &self.tracked }

    pub fn rows(&self) -> &[NodeMetadata] { &self.rows }

    pub fn labels(&self) -> &[String] { &self.labels }

    /// Tab-separated matrix: a header `id, name, labels...` then one row per
    /// tracked node.
    pub fn render(&self) -> String {
        let mut out = String::from("id\tname");
        for label in &self.labels {
            let _ = write!(out, "\t{}", label);
        }
        out.push('\n');

        for (row, meta) in self.rows.iter().enumerate() {
            let _ = write!(out, "{}\t{}", meta.db_id, meta.name);
            for snapshot in &self.snapshots {
                let _ = write!(out, "\t{}", snapshot[row]);
            }
            out.push('\n');
        }
        out
    }

    pub fn write_to(&self, mut writer: impl io::Write) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NodeKind, ReactionFamily};
    use crate::test_utils::*;
    use std::io::{Read, Seek};

    #[test]
    fn test_main_monitor_excludes_fixed_reactions() {
        let reg = small_circuit();
        let mut ledger = Ledger::new(reg.count());
        ledger.fix(reg.node_id(FEEDBACK).unwrap(), 0.1);

        let monitor = Monitor::reactions_without_fixed_output(&reg, &ledger);
        let ids: Vec<u64> = monitor.rows().iter().map(|m| m.db_id).collect();
        // Sorted by name: "MDM2 ubiquitinates TP53" < "TP53 binds MDM2" < "unrelated event".
        assert_eq!(ids, vec![UBIQUITINATION, BINDING, UNRELATED]);
    }

    #[test]
    fn test_rows_with_equal_names_sort_by_db_id() {
        let mut reg = Registry::new();
        let b = reg.add_node(9, NodeKind::reaction(ReactionFamily::Reaction), "same").unwrap();
        let a = reg.add_node(3, NodeKind::reaction(ReactionFamily::Reaction), "same").unwrap();
        let monitor = Monitor::from_nodes(&reg, [b, a, b]);
        assert_eq!(monitor.tracked(), &[a, b]);
    }

    #[test]
    fn test_closure_monitor_follows_trace() {
        let reg = small_circuit();
        let monitor = Monitor::reachability_closure(&reg, &EngineConfig::default(), reg.node_id(UBIQUITINATION).unwrap());
        let mut ids: Vec<u64> = monitor.rows().iter().map(|m| m.db_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![TP53, MDM2, ATP, BINDING, UBIQUITINATION, FEEDBACK]);
    }

    #[test]
    fn test_render_format() {
        let mut reg = Registry::new();
        let r1 = reg.add_node(7, NodeKind::reaction(ReactionFamily::Reaction), "alpha").unwrap();
        let r2 = reg.add_node(5, NodeKind::reaction(ReactionFamily::Reaction), "beta").unwrap();
        let mut monitor = Monitor::from_nodes(&reg, [r2, r1]);

        let mut ledger = Ledger::new(reg.count());
        ledger.set_output(r1, 0.25);
        ledger.set_output(r2, f64::NAN);
        monitor.add_result("exp1", &ledger);
        ledger.set_output(r2, -1.5);
        monitor.add_result("exp2", &ledger);

        assert_eq!(monitor.render(), "id\tname\texp1\texp2\n7\talpha\t0.25\t0.25\n5\tbeta\tNaN\t-1.5\n");
        assert_eq!(monitor.value(1, 1), Some(-1.5));
        assert_eq!(monitor.value(0, 2), None);
        assert_eq!(monitor.labels(), &["exp1".to_string(), "exp2".to_string()]);
    }

    #[test]
    fn test_write_to_file() {
        let reg = small_circuit();
        let ledger = Ledger::new(reg.count());
        let mut monitor = Monitor::reactions_without_fixed_output(&reg, &ledger);
        monitor.add_result("baseline", &ledger);

        let mut file = tempfile::tempfile().unwrap();
        monitor.write_to(&mut file).unwrap();

        file.rewind().unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        assert_eq!(text, monitor.render());
        assert_eq!(text.lines().count(), monitor.len() + 1);
    }
}
