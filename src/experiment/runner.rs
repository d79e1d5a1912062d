use super::{inject_anchors, AnchorStats, Experiment};
use crate::analysis::{prune, scaling};
use crate::compute::{Convergence, Engine, EngineConfig, Ledger};
use crate::display::Monitor;
use crate::store::{GraphError, Registry};
use log::{debug, info, warn};

/// Outcome of one experiment run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub label: String,
    pub anchors: AnchorStats,
    /// Reactions whose weight was rescaled away from 1.0.
    pub scaled_reactions: usize,
    pub convergence: Convergence,
}

/// Outcome of a batch of experiments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// One report per experiment actually run, in input order.
    pub reports: Vec<RunReport>,
    /// Experiments without any defined value.
    pub skipped: usize,
    /// Experiments rejected by the name filter.
    pub filtered: usize,
}

impl RunSummary {
    pub fn runs(&self) -> usize { self.reports.len() }

    pub fn not_converged(&self) -> usize {
        self.reports.iter().filter(|r| !r.convergence.converged).count()
    }
}

/// Owns a circuit and drives experiments through it.
///
/// Each run follows the same steps: reset the ledger, pin anchors, rescale
/// weights, converge, then snapshot into the monitors.
pub struct Runner {
    pub(super) registry: Registry,
    pub(super) config: EngineConfig,
    ledger: Ledger,
    pub(super) monitor: Option<Monitor>,
    trace_target: Option<u64>,
    pub(super) trace_monitor: Option<Monitor>,
}

impl Runner {
    pub fn new(registry: Registry, config: EngineConfig) -> Self {
        let ledger = Ledger::new(registry.count());
        Self { registry, config, ledger, monitor: None, trace_target: None, trace_monitor: None }
    }

    pub fn registry(&self) -> &Registry { &self.registry }

    pub fn config(&self) -> &EngineConfig { &self.config }

    /// Run state left by the last sequential run.
    pub fn ledger(&self) -> &Ledger { &self.ledger }

    /// Monitor over every reaction without a fixed output. Created by the
    /// first run, after its anchors are injected.
    pub fn monitor(&self) -> Option<&Monitor> { self.monitor.as_ref() }

    pub fn trace_monitor(&self) -> Option<&Monitor> { self.trace_monitor.as_ref() }

    /// Tracks every node that explains the output of node `db_id`.
    pub fn track_target(&mut self, db_id: u64) -> Result<(), GraphError> {
        let target = self.registry.node_id(db_id).ok_or(GraphError::UnknownNode(db_id))?;
        let monitor = Monitor::reachability_closure(&self.registry, &self.config, target);
        info!("Tracing {} nodes feeding '{}'", monitor.len(), self.registry.name(target));
        self.trace_target = Some(db_id);
        self.trace_monitor = Some(monitor);
        Ok(())
    }

    /// Prunes the circuit down to anchor-influenced nodes. Monitors are rebuilt
    /// against the compacted registry.
    pub fn simplify(&mut self) -> prune::PruneReport {
        let report = prune::simplify(&mut self.registry, &self.config);
        self.ledger.resize(self.registry.count());
        self.monitor = None;
        self.trace_monitor = None;

        if let Some(db_id) = self.trace_target {
            if self.track_target(db_id).is_err() {
                warn!("Trace target {} was pruned; trace monitor dropped", db_id);
                self.trace_target = None;
            }
        }
        report
    }

    /// Runs one experiment. Returns `None` (and changes nothing) if the
    /// experiment has no defined value.
    pub fn run(&mut self, experiment: &Experiment) -> Option<RunReport> {
        if !experiment.has_usable_values() {
            debug!("Skipping '{}': no usable values", experiment.label);
            return None;
        }

        self.ledger.reset();
        let anchors = inject_anchors(&self.registry, &mut self.ledger, experiment);
        if self.monitor.is_none() {
            self.monitor = Some(Monitor::reactions_without_fixed_output(&self.registry, &self.ledger));
        }
        let scaled_reactions = scaling::rescale(&mut self.registry, self.config.weight_scaling);
        let convergence = Engine::new(&self.registry, &self.config).run_to_convergence(&mut self.ledger);

        debug!("'{}': {} genes matched, {} unmatched, {} nodes fixed, {} passes",
            experiment.label, anchors.matched_genes, anchors.unmatched_genes, anchors.fixed_nodes, convergence.passes);

        self.record(&experiment.label, None);
        Some(RunReport { label: experiment.label.clone(), anchors, scaled_reactions, convergence })
    }

    /// Runs every experiment whose label matches `name_filter`, in order.
    pub fn run_all(&mut self, experiments: &[Experiment], name_filter: Option<&str>) -> RunSummary {
        let mut summary = RunSummary::default();
        for experiment in experiments {
            if !experiment.matches(name_filter) {
                summary.filtered += 1;
                continue;
            }
            match self.run(experiment) {
                Some(report) => summary.reports.push(report),
                None => summary.skipped += 1,
            }
        }
        log_summary(&summary);
        summary
    }

    /// Appends a snapshot of `ledger` (or the runner's own) to the monitors.
    pub(super) fn record(&mut self, label: &str, ledger: Option<&Ledger>) {
        let ledger = ledger.unwrap_or(&self.ledger);
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.add_result(label, ledger);
        }
        if let Some(monitor) = self.trace_monitor.as_mut() {
            monitor.add_result(label, ledger);
        }
    }
}

pub(super) fn log_summary(summary: &RunSummary) {
    info!("Ran {} experiments ({} skipped, {} filtered out, {} not converged)",
        summary.runs(), summary.skipped, summary.filtered, summary.not_converged());
}
