//! Experiment-level parallelism.
//!
//! Experiments are independent once weights are rescaled, so each one gets
//! its own [`Ledger`] while all of them read the same [`Registry`]. The engine
//! itself stays single-threaded.
use super::runner::{log_summary, RunReport, RunSummary, Runner};
use super::{inject_anchors, Experiment};
use crate::analysis::scaling;
use crate::compute::{Engine, Ledger};
use crate::display::Monitor;
use log::debug;
use rayon::prelude::*;

impl Runner {
    /// Same results as [`Runner::run_all`], computed on the rayon pool.
    ///
    /// Weights are rescaled once up front. Snapshots are appended to the
    /// monitors in input order after all runs finish. The runner's own ledger
    /// is left untouched.
    pub fn run_parallel(&mut self, experiments: &[Experiment], name_filter: Option<&str>) -> RunSummary {
        let mut summary = RunSummary::default();
        let selected: Vec<&Experiment> = experiments
            .iter()
            .filter(|e| {
                let keep = e.matches(name_filter);
                if !keep {
                    summary.filtered += 1;
                }
                keep
            })
            .collect();

        let scaled_reactions = scaling::rescale(&mut self.registry, self.config.weight_scaling);

        let registry = &self.registry;
        let config = &self.config;
        let results: Vec<Option<(RunReport, Ledger)>> = selected
            .par_iter()
            .map(|experiment| {
                if !experiment.has_usable_values() {
                    return None;
                }
                let mut ledger = Ledger::new(registry.count());
                let anchors = inject_anchors(registry, &mut ledger, experiment);
                let convergence = Engine::new(registry, config).run_to_convergence(&mut ledger);
                debug!("'{}': {} nodes fixed, {} passes", experiment.label, anchors.fixed_nodes, convergence.passes);
                let report = RunReport { label: experiment.label.clone(), anchors, scaled_reactions, convergence };
                Some((report, ledger))
            })
            .collect();

        for result in results {
            let Some((report, ledger)) = result else {
                summary.skipped += 1;
                continue;
            };
            if self.monitor.is_none() {
                self.monitor = Some(Monitor::reactions_without_fixed_output(&self.registry, &ledger));
            }
            self.record(&report.label, Some(&ledger));
            summary.reports.push(report);
        }

        log_summary(&summary);
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::EngineConfig;
    use crate::test_utils::*;

    fn many_experiments() -> Vec<Experiment> {
        let mut exps = experiments();
        for k in 0..16 {
            let mut exp = Experiment::new(format!("Lung sample {}", k));
            exp.insert("ENSG00000141510", -1.0 + 0.125 * k as f64);
            exp.insert("ENSG00000135679", 0.9 - 0.1 * k as f64);
            exps.push(exp);
        }
        exps
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let exps = many_experiments();

        let mut sequential = Runner::new(small_circuit(), EngineConfig::default());
        sequential.track_target(FEEDBACK).unwrap();
        let seq_summary = sequential.run_all(&exps, None);

        let mut parallel = Runner::new(small_circuit(), EngineConfig::default());
        parallel.track_target(FEEDBACK).unwrap();
        let par_summary = parallel.run_parallel(&exps, None);

        assert_eq!(seq_summary, par_summary);
        assert_eq!(sequential.monitor().unwrap().render(), parallel.monitor().unwrap().render());
        assert_eq!(sequential.trace_monitor().unwrap().render(), parallel.trace_monitor().unwrap().render());
    }

    #[test]
    fn test_parallel_skips_experiments_without_usable_values() {
        let mut undefined = Experiment::new("Lung, values missing");
        undefined.insert("ENSG00000141510", f64::NAN);
        undefined.insert("ENSG00000135679", f64::NAN);
        let exps = vec![undefined, experiments()[0].clone()];

        let mut sequential = Runner::new(small_circuit(), EngineConfig::default());
        let mut parallel = Runner::new(small_circuit(), EngineConfig::default());
        let seq_summary = sequential.run_all(&exps, None);
        let par_summary = parallel.run_parallel(&exps, None);

        assert_eq!(par_summary.skipped, 1);
        assert_eq!(par_summary, seq_summary);
        assert_eq!(parallel.monitor().unwrap().labels(), &["Lung adenocarcinoma"]);
    }

    #[test]
    fn test_parallel_filter_and_skip() {
        let mut runner = Runner::new(small_circuit(), EngineConfig::default());
        runner.simplify();
        let summary = runner.run_parallel(&many_experiments(), Some("sample"));

        assert_eq!(summary.runs(), 16);
        assert_eq!(summary.filtered, 4);
        assert_eq!(summary.skipped, 0);
        assert_eq!(runner.monitor().unwrap().labels()[0], "Lung sample 0");
    }
}
