//! ProSNet CLI - train node embeddings for a heterogeneous network.
//!
//! # Usage
//!
//! ```bash
//! # Train with defaults (dimension 100, one epoch of 1M samples per segment)
//! prosnet -node data/node.dat -link data/link.dat -output vec.txt
//!
//! # Eight threads, binary dump, curriculum 3 over 500 epochs
//! prosnet -node data/node.dat -link data/link.dat -output vec.bin -binary 1 \
//!     -size 128 -threads 8 -iters 500 -train_mode 3
//!
//! # Only train some edge types, in a given order
//! prosnet -node data/node.dat -link data/link.dat -edge_types a,c,b
//! ```
//!
//! Flags take one dash (`-size 128`); `--size 128` works too. Logging
//! goes to stderr and follows `RUST_LOG` (default `info`).

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind as ClapErrorKind;
use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use prosnet_core::{EmbeddingStore, HinGraph};
use prosnet_train::{
    CheckpointConfig, CheckpointEvent, Scheduler, Segment, TrainConfig, TrainContext, TrainerSet,
    TrainingObserver,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Offset between the source-space and context-space initialization seeds.
const CONTEXT_SEED_OFFSET: u64 = 0x5EED;

#[derive(Parser, Debug)]
#[command(name = "prosnet")]
#[command(about = "Heterogeneous network embedding trainer", long_about = None)]
#[command(version, allow_negative_numbers = true)]
struct Cli {
    /// Node dictionary file (`<id> [<type>]` per line)
    #[arg(long)]
    node: PathBuf,

    /// Link file (`<src> <dst> <weight> <type>` per line)
    #[arg(long)]
    link: PathBuf,

    /// Final embedding file (default: checkpoint name in the checkpoint directory)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write binary dumps (0 or 1)
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u8).range(0..=1))]
    binary: u8,

    /// Embedding dimension
    #[arg(long, default_value = "100")]
    size: usize,

    /// Negative samples per edge
    #[arg(long, default_value = "5")]
    negative: usize,

    /// Training samples per segment, in millions
    #[arg(long, default_value = "1")]
    samples: f64,

    /// Number of epochs
    #[arg(long, default_value = "10")]
    iters: usize,

    /// Worker threads
    #[arg(long, default_value = "1")]
    threads: usize,

    /// Starting learning rate
    #[arg(long, default_value = "0.0025")]
    alpha: f32,

    /// Walk depth (checkpoint name tag)
    #[arg(long, default_value = "2")]
    depth: usize,

    /// Restart probability (checkpoint name tag)
    #[arg(long, default_value = "0.3")]
    restart: f64,

    /// Budget units charged per 20 batches, also a checkpoint name tag (0 = number of types)
    #[arg(long = "edge_type_num", default_value = "0")]
    edge_type_num: usize,

    /// PPI random walk with restart flag (checkpoint name tag)
    #[arg(long = "rwr_ppi", default_value = "0")]
    rwr_ppi: i64,

    /// Sequence random walk with restart flag (checkpoint name tag)
    #[arg(long = "rwr_seq", default_value = "0")]
    rwr_seq: i64,

    /// Curriculum, 0-6
    #[arg(long = "train_mode", default_value = "0", value_parser = clap::value_parser!(u8).range(0..=6))]
    train_mode: u8,

    /// Random seed
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Directory for periodic checkpoints (default: directory of -output, else `result`)
    #[arg(long = "checkpoint_dir")]
    checkpoint_dir: Option<PathBuf>,

    /// Comma-separated edge types to train, in order (default: all, in link-file order)
    #[arg(long = "edge_types", value_delimiter = ',')]
    edge_types: Option<Vec<String>>,

    /// Accepted for compatibility; ignored
    #[arg(long, hide = true)]
    model: Option<i64>,

    /// Accepted for compatibility; ignored
    #[arg(long = "meta_path", hide = true)]
    meta_path: Option<String>,
}

/// Rewrite `-flag` to `--flag` so clap accepts the single-dash spelling.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == 0 {
                return arg;
            }
            match arg.to_str() {
                Some(s)
                    if s.len() > 2
                        && s.starts_with('-')
                        && s.as_bytes()[1].is_ascii_alphabetic() =>
                {
                    OsString::from(format!("-{s}"))
                }
                _ => arg,
            }
        })
        .collect()
}

fn main() -> ExitCode {
    let args: Vec<OsString> = std::env::args_os().collect();
    if args.len() <= 1 {
        // No arguments: usage, success.
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::SUCCESS;
    }

    let cli = match Cli::try_parse_from(normalize_args(args)) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match cmd_train(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_train(cli: &Cli) -> Result<()> {
    if cli.model.is_some() || cli.meta_path.is_some() {
        warn!("-model and -meta_path are accepted for compatibility and ignored");
    }
    if !(cli.samples.is_finite() && cli.samples > 0.0) {
        bail!("-samples must be a positive number of millions, got {}", cli.samples);
    }

    let config = TrainConfig::default()
        .with_dim(cli.size)
        .with_negative(cli.negative)
        .with_samples_millions(cli.samples)
        .with_iters(cli.iters)
        .with_threads(cli.threads)
        .with_alpha(cli.alpha)
        .with_train_mode(usize::from(cli.train_mode))
        .with_seed(cli.seed);
    // 0 leaves the budget step at the number of sampleable types.
    let config = match cli.edge_type_num {
        0 => config,
        n => config.with_edge_type_num(n),
    };
    config.validate().context("Invalid configuration")?;

    let (source, context, mut graph) = load_network(cli)?;

    let trainers = match &cli.edge_types {
        Some(tags) => {
            for tag in tags {
                if graph.partition_id(tag).is_none() {
                    warn!(edge_type = %tag, "edge type not present in link file");
                    graph.declare_edge_type(tag.as_str());
                }
            }
            TrainerSet::from_tags(&graph, tags, config.negative)?
        }
        None => TrainerSet::from_graph(&graph, config.negative),
    };

    let edge_type_num = if cli.edge_type_num == 0 {
        trainers.len()
    } else {
        if cli.edge_type_num != trainers.len() {
            warn!(
                declared = cli.edge_type_num,
                trained = trainers.len(),
                "-edge_type_num differs from the number of trained edge types"
            );
        }
        cli.edge_type_num
    };

    let checkpoint = CheckpointConfig::default()
        .with_dir(checkpoint_dir(cli))
        .with_node_file(&cli.node)
        .with_binary(cli.binary == 1)
        .with_depth(cli.depth)
        .with_restart(cli.restart)
        .with_rwr(cli.rwr_ppi, cli.rwr_seq)
        .with_edge_type_num(edge_type_num);
    let checkpoint = match &cli.output {
        Some(path) => checkpoint.with_output(path),
        None => checkpoint,
    };

    info!(
        dim = config.dim,
        negative = config.negative,
        samples = config.samples,
        iters = config.iters,
        threads = config.threads,
        alpha = config.starting_alpha,
        train_mode = config.train_mode,
        edge_types = trainers.len(),
        "configuration"
    );

    let ctx = TrainContext::new(&graph, &source, &context)?;
    let progress = ProgressObserver::new();
    let mut scheduler = Scheduler::new(config, checkpoint)?;
    let report = scheduler.run(ctx, &trainers, Some(&progress))?;
    progress.finish(report.elapsed);

    if !report.final_written {
        bail!(
            "Failed to write final embeddings to {}",
            report.final_output.display()
        );
    }
    if !report.failed_checkpoints.is_empty() {
        warn!(
            failed = report.failed_checkpoints.len(),
            "some periodic checkpoints were not written"
        );
    }

    println!(
        "Trained {} segments ({} samples) in {:.2?}",
        report.segments, report.edges, report.elapsed
    );
    println!("Embeddings written to {}", report.final_output.display());
    Ok(())
}

fn load_network(cli: &Cli) -> Result<(EmbeddingStore, EmbeddingStore, HinGraph)> {
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", cli.node.display()));

    let source = EmbeddingStore::from_node_file(&cli.node, cli.size, cli.seed)
        .with_context(|| format!("Failed to load node file {}", cli.node.display()))?;
    let context = EmbeddingStore::new(
        source.dictionary().clone(),
        cli.size,
        cli.seed.wrapping_add(CONTEXT_SEED_OFFSET),
    )?;

    pb.set_message(format!("Loading {}...", cli.link.display()));
    let graph = HinGraph::init(&cli.link, &source, &context)
        .with_context(|| format!("Failed to load link file {}", cli.link.display()))?;

    pb.finish_with_message(format!(
        "Loaded {} nodes, {} edges, {} edge types in {:.2?}",
        graph.num_nodes(),
        graph.num_edges(),
        graph.num_edge_types(),
        start.elapsed()
    ));
    Ok((source, context, graph))
}

fn checkpoint_dir(cli: &Cli) -> PathBuf {
    if let Some(dir) = &cli.checkpoint_dir {
        return dir.clone();
    }
    cli.output
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("result"), Path::to_path_buf)
}

/// Progress bar over training segments.
struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{elapsed_precise} [{bar:40}] {pos}/{len} segments {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    fn finish(&self, elapsed: std::time::Duration) {
        self.bar
            .finish_with_message(format!("done in {elapsed:.2?}"));
    }
}

impl TrainingObserver for ProgressObserver {
    fn on_start(&self, total_segments: usize) {
        self.bar.set_length(total_segments as u64);
    }

    fn on_segment_start(&self, segment: &Segment, alpha: f32) {
        self.bar.set_message(format!(
            "epoch {} mode {} alpha {:.6}",
            segment.epoch, segment.mode, alpha
        ));
    }

    fn on_segment_end(&self, _segment: &Segment, _edges: u64) {
        self.bar.inc(1);
    }

    fn on_checkpoint(&self, event: &CheckpointEvent<'_>) {
        if let Some(e) = event.error {
            self.bar
                .println(format!("checkpoint {} failed: {e}", event.path.display()));
        }
    }
}
