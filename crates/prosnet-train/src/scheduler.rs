//! Epoch/mode scheduler.
//!
//! Runs a [`Curriculum`] segment by segment. Before a segment that starts an
//! inner epoch the scheduler rewinds the progress counter to
//! `samples * progress_epoch`; it then hands one task to each thread of a
//! fixed-size pool and waits for all of them before moving on.
//! After each round it may dump the source space; after the last round it
//! always does.
//!
//! The pool is created on the first segment and reused, so a run with no
//! segments never starts a thread.

use crate::checkpoint::{checkpoint_path, final_path};
use crate::config::{CheckpointConfig, TrainConfig};
use crate::curriculum::{Curriculum, Segment};
use crate::error::{Error, Result};
use crate::state::TrainingState;
use crate::trainer::{TrainContext, TrainerSet};
use crate::worker::{run_worker, WorkerTask};
use prosnet_core::EmbeddingStore;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// A periodic or final dump attempt.
#[derive(Debug)]
pub struct CheckpointEvent<'a> {
    pub path: &'a Path,
    /// `None` for the final dump.
    pub round: Option<usize>,
    pub error: Option<&'a prosnet_core::Error>,
}

/// Hooks for progress reporting. All methods run on the scheduling thread.
pub trait TrainingObserver {
    fn on_start(&self, _total_segments: usize) {}
    fn on_segment_start(&self, _segment: &Segment, _alpha: f32) {}
    fn on_segment_end(&self, _segment: &Segment, _edges: u64) {}
    fn on_checkpoint(&self, _event: &CheckpointEvent<'_>) {}
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub rounds: usize,
    pub segments: usize,
    pub edges: u64,
    /// Periodic dumps written, in order.
    pub checkpoints: Vec<PathBuf>,
    /// Dumps that could not be written, with the reason.
    pub failed_checkpoints: Vec<(PathBuf, String)>,
    pub final_output: PathBuf,
    pub final_written: bool,
    pub final_alpha: f32,
    pub pool_started: bool,
    pub elapsed: Duration,
}

/// Drives one training run.
pub struct Scheduler {
    config: TrainConfig,
    checkpoint: CheckpointConfig,
    curriculum: Curriculum,
    pool: Option<ThreadPool>,
    segment_counter: u64,
}

impl Scheduler {
    pub fn new(config: TrainConfig, checkpoint: CheckpointConfig) -> Result<Self> {
        config.validate()?;
        let curriculum = Curriculum::for_train_mode(config.train_mode)?;
        Ok(Self {
            config,
            checkpoint,
            curriculum,
            pool: None,
            segment_counter: 0,
        })
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// True once worker threads exist.
    pub fn pool_started(&self) -> bool {
        self.pool.is_some()
    }

    /// Run the whole curriculum, then write the final dump.
    pub fn run(
        &mut self,
        ctx: TrainContext<'_>,
        trainers: &TrainerSet,
        observer: Option<&dyn TrainingObserver>,
    ) -> Result<TrainingReport> {
        if ctx.dim() != self.config.dim {
            return Err(Error::Config(format!(
                "store dimension {} does not match configured dimension {}",
                ctx.dim(),
                self.config.dim
            )));
        }
        let active = trainers.active(ctx.graph).count();
        if active == 0 {
            warn!("no edge type has sampleable edges; vectors will not change");
        }
        let edge_type_num = self.config.edge_type_num.unwrap_or(active);

        let start = Instant::now();
        let state = TrainingState::new(
            self.config.starting_alpha,
            self.config.samples,
            self.config.iters,
        );
        let rounds = self.curriculum.rounds(self.config.iters);
        let total_segments = rounds * self.curriculum.segments_per_round();
        let mut report = TrainingReport {
            rounds,
            ..TrainingReport::default()
        };

        info!(
            train_mode = self.config.train_mode,
            rounds,
            segments = total_segments,
            threads = self.config.threads,
            samples = self.config.samples,
            edge_type_num,
            alpha = self.config.starting_alpha,
            "starting training"
        );
        if let Some(obs) = observer {
            obs.on_start(total_segments);
        }

        for round in 0..rounds {
            for segment in self.curriculum.round_segments(round) {
                let edges =
                    self.run_segment(&ctx, trainers, &state, &segment, edge_type_num, observer)?;
                report.segments += 1;
                report.edges += edges;
            }

            if self.curriculum.cadence.is_due(round) {
                let path = checkpoint_path(
                    &self.checkpoint,
                    self.config.dim,
                    round,
                    self.config.starting_alpha,
                    self.config.train_mode,
                );
                if self.write_dump(ctx.source, &path, Some(round), &mut report, observer) {
                    report.checkpoints.push(path);
                }
            }
        }

        let path = final_path(
            &self.checkpoint,
            self.config.dim,
            rounds,
            self.config.starting_alpha,
            self.config.train_mode,
        );
        report.final_written = self.write_dump(ctx.source, &path, None, &mut report, observer);
        report.final_output = path;
        report.final_alpha = state.alpha();
        report.pool_started = self.pool_started();
        report.elapsed = start.elapsed();

        info!(
            segments = report.segments,
            edges = report.edges,
            checkpoints = report.checkpoints.len(),
            failed = report.failed_checkpoints.len(),
            final_alpha = report.final_alpha,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "training finished"
        );
        Ok(report)
    }

    fn pool(&mut self) -> Result<&ThreadPool> {
        if self.pool.is_none() {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .thread_name(|i| format!("prosnet-worker-{i}"))
                .build()?;
            info!(threads = self.config.threads, "started worker pool");
            self.pool = Some(pool);
        }
        self.pool
            .as_ref()
            .ok_or_else(|| Error::Config("worker pool unavailable".into()))
    }

    fn run_segment(
        &mut self,
        ctx: &TrainContext<'_>,
        trainers: &TrainerSet,
        state: &TrainingState,
        segment: &Segment,
        edge_type_num: usize,
        observer: Option<&dyn TrainingObserver>,
    ) -> Result<u64> {
        if let Some(progress_epoch) = segment.rewind {
            state.rewind(self.config.samples.saturating_mul(progress_epoch as u64));
        }
        if let Some(obs) = observer {
            obs.on_segment_start(segment, state.alpha());
        }

        let task = WorkerTask {
            ctx: *ctx,
            trainers,
            state,
            mode: segment.mode,
            samples: self.config.samples,
            edge_type_num: edge_type_num as u64,
            num_threads: self.config.threads,
            seed: self.config.seed,
            segment: self.segment_counter,
            epoch: segment.epoch,
        };
        self.segment_counter += 1;

        let results = self.pool()?.broadcast(|b| run_worker(&task, b.index()));
        let mut edges = 0;
        for result in results {
            edges += result?.trained;
        }

        if let Some(obs) = observer {
            obs.on_segment_end(segment, edges);
        }
        Ok(edges)
    }

    /// Dump the source space. Failures are logged and recorded, never raised.
    fn write_dump(
        &self,
        store: &EmbeddingStore,
        path: &Path,
        round: Option<usize>,
        report: &mut TrainingReport,
        observer: Option<&dyn TrainingObserver>,
    ) -> bool {
        let result = ensure_parent(path).and_then(|()| store.output(path, self.checkpoint.binary));
        match &result {
            Ok(()) => info!(path = %path.display(), ?round, "wrote embeddings"),
            Err(e) => {
                error!(path = %path.display(), ?round, error = %e, "failed to write embeddings");
                report
                    .failed_checkpoints
                    .push((path.to_path_buf(), e.to_string()));
            }
        }
        if let Some(obs) = observer {
            obs.on_checkpoint(&CheckpointEvent {
                path,
                round,
                error: result.as_ref().err(),
            });
        }
        result.is_ok()
    }
}

fn ensure_parent(path: &Path) -> prosnet_core::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Train every edge type of `ctx.graph` with one scheduler run.
pub fn train(
    ctx: TrainContext<'_>,
    config: TrainConfig,
    checkpoint: CheckpointConfig,
) -> Result<TrainingReport> {
    let trainers = TrainerSet::from_graph(ctx.graph, config.negative);
    Scheduler::new(config, checkpoint)?.run(ctx, &trainers, None)
}
