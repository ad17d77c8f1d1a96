use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use peg_config::{DocumentSource, FsDocumentSource, GraphDef, RunConfig};
use peg_orchestrator::Session;
use peg_scoring::SimulatedScorer;
use peg_selector::{BanditSelector, FsWeightStore, WeightStore};
use peg_workflow::WorkflowGraph;

/// Peg - a self-correcting workflow orchestrator
#[derive(Parser)]
#[command(name = "peg")]
#[command(version, about, long_about = None)]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow graph to completion
  Run {
    /// Path to the workflow graph document
    #[arg(long)]
    graph: PathBuf,

    /// Path to the run configuration document
    #[arg(long)]
    config: PathBuf,

    /// Path to the bandit weights file (default: ~/.peg/bandit_weights.json)
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Seed for macro selection and simulated scoring
    #[arg(long)]
    seed: Option<u64>,

    /// Override the retry base delay in milliseconds
    #[arg(long)]
    base_delay_ms: Option<u64>,
  },

  /// Parse and validate a graph and run configuration without running them
  Validate {
    /// Path to the workflow graph document
    #[arg(long)]
    graph: PathBuf,

    /// Path to the run configuration document
    #[arg(long)]
    config: PathBuf,
  },

  /// Print the persisted arm statistics
  Weights {
    /// Path to the bandit weights file (default: ~/.peg/bandit_weights.json)
    #[arg(long)]
    weights: Option<PathBuf>,
  },
}

fn main() -> Result<ExitCode> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let cli = Cli::parse();

  match cli.command {
    Commands::Run {
      graph,
      config,
      weights,
      seed,
      base_delay_ms,
    } => run(&graph, &config, weights, seed, base_delay_ms),
    Commands::Validate { graph, config } => {
      let (graph, config) = load(&graph, &config)?;
      eprintln!(
        "Valid: {} nodes, {} edges, {} macros",
        graph.nodes().len(),
        graph.edges().len(),
        config.macros.len()
      );
      Ok(ExitCode::SUCCESS)
    }
    Commands::Weights { weights } => {
      let store = FsWeightStore::new(weights_path(weights)?);
      let arms = store
        .load()
        .with_context(|| format!("failed to read weights: {}", store.path().display()))?;
      println!("{}", serde_json::to_string_pretty(&arms)?);
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn run(
  graph_file: &Path,
  config_file: &Path,
  weights: Option<PathBuf>,
  seed: Option<u64>,
  base_delay_ms: Option<u64>,
) -> Result<ExitCode> {
  let (graph, mut config) = load(graph_file, config_file)?;
  if let Some(base_delay_ms) = base_delay_ms {
    config.retry.base_delay_ms = base_delay_ms;
  }

  let weights = weights_path(weights)?;
  if let Some(parent) = weights.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create weights directory: {}", parent.display()))?;
  }

  let selector = BanditSelector::new(FsWeightStore::new(&weights))
    .with_context(|| format!("failed to load weights: {}", weights.display()))?;
  let (selector, scorer) = match seed {
    Some(seed) => (selector.with_seed(seed), SimulatedScorer::with_seed(seed)),
    None => (selector, SimulatedScorer::new()),
  };

  let mut session = Session::builder(selector).scorer(scorer).build();
  let outcome = session.run(&graph, &config);

  println!("{}", serde_json::to_string_pretty(&outcome)?);

  if outcome.halt.is_completed() {
    Ok(ExitCode::SUCCESS)
  } else {
    eprintln!("Run {} halted: {:?}", outcome.run_id, outcome.halt);
    Ok(ExitCode::FAILURE)
  }
}

/// Load and validate both documents.
fn load(graph_file: &Path, config_file: &Path) -> Result<(WorkflowGraph, RunConfig)> {
  let def: GraphDef = open(graph_file)
    .and_then(|(source, name)| Ok(source.load_graph(&name)?))
    .with_context(|| format!("failed to load graph: {}", graph_file.display()))?;
  let graph = WorkflowGraph::from_def(def)
    .with_context(|| format!("invalid graph: {}", graph_file.display()))?;

  let config = open(config_file)
    .and_then(|(source, name)| Ok(source.load_run_config(&name)?))
    .with_context(|| format!("failed to load run config: {}", config_file.display()))?;

  Ok((graph, config))
}

/// Split a document path into a source rooted at its directory and a name.
fn open(path: &Path) -> Result<(FsDocumentSource, String)> {
  let name = path
    .file_name()
    .and_then(|n| n.to_str())
    .with_context(|| format!("not a document path: {}", path.display()))?
    .to_string();
  let root = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .unwrap_or(Path::new("."));
  Ok((FsDocumentSource::new(root), name))
}

fn weights_path(weights: Option<PathBuf>) -> Result<PathBuf> {
  match weights {
    Some(path) => Ok(path),
    None => Ok(
      dirs::home_dir()
        .context("could not determine home directory")?
        .join(".peg")
        .join("bandit_weights.json"),
    ),
  }
}
