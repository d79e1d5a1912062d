use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use pathway_circuit_core::analysis::summarize;
use pathway_circuit_core::{EngineConfig, Experiment, GraphError, Registry, Runner};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "pathway-circuit")]
#[command(about = "Propagate expression values through a pathway circuit until it settles")]
struct Args {
    /// Registry checkpoint (JSON)
    #[arg(long, value_name = "FILE")]
    graph: PathBuf,

    /// List of experiments (JSON)
    #[arg(long, value_name = "FILE")]
    experiments: PathBuf,

    /// Engine configuration (JSON); missing fields use defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Remove nodes that no gene can influence before running
    #[arg(long)]
    simplify: bool,

    /// Also report every node feeding this node id
    #[arg(long, value_name = "DB_ID")]
    trace_target: Option<u64>,

    /// Only run experiments whose label contains this text (case-insensitive)
    #[arg(long)]
    filter: Option<String>,

    /// Run experiments on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Write the result matrix here instead of stdout
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Logging verbosity (use -v for info, or -v=LEVEL for specific level)
    #[arg(long, short = 'v', value_name = "LEVEL", num_args = 0..=1, default_missing_value = "info", require_equals = true)]
    verbose: Option<Option<LogLevel>>,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Cannot open '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("Cannot parse '{path}': {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Cannot write results: {0}")]
    Output(#[from] io::Error),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CliError::Json { path: path.to_path_buf(), source })
}

fn run(args: Args) -> Result<(), CliError> {
    let mut registry: Registry = read_json(&args.graph)?;
    registry.rebuild_index()?;
    let experiments: Vec<Experiment> = read_json(&args.experiments)?;
    let config: EngineConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => EngineConfig::default(),
    };

    let topology = summarize(&registry);
    info!("Loaded {} nodes, {} causal edges, {} feedback components (largest {})",
        topology.nodes, topology.causal_edges, topology.feedback_components, topology.largest_component);
    for (kind, count) in &topology.kind_counts {
        info!("\t{}\t{}", kind, count);
    }

    let mut runner = Runner::new(registry, config);
    if let Some(db_id) = args.trace_target {
        runner.track_target(db_id)?;
    }
    if args.simplify {
        runner.simplify();
    }

    let filter = args.filter.as_deref();
    let summary = if args.parallel {
        runner.run_parallel(&experiments, filter)
    } else {
        runner.run_all(&experiments, filter)
    };
    if summary.not_converged() > 0 {
        eprintln!("Warning: {} experiments did not converge.", summary.not_converged());
    }

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::Io { path: path.clone(), source })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    if let Some(monitor) = runner.monitor() {
        monitor.write_to(&mut out)?;
    }
    if let Some(trace) = runner.trace_monitor() {
        writeln!(out)?;
        trace.write_to(&mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose.clone() {
        None => LevelFilter::Warn,
        Some(None) => LevelFilter::Info,
        Some(Some(level)) => level.into(),
    };
    Builder::from_default_env().filter_level(log_level).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
