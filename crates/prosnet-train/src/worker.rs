//! Worker loop run by every pool thread for one segment.

use crate::error::Result;
use crate::mode::Mode;
use crate::state::TrainingState;
use crate::trainer::{EdgeTrainer, Scratch, TrainContext, TrainerSet};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use std::time::{Duration, Instant};
use tracing::debug;

/// Inner batches per outer iteration; each batch visits every trainer once.
pub const BATCHES_PER_ITERATION: usize = 20;

/// Edges between two publications of local progress.
pub const PROGRESS_INTERVAL: u64 = 1000;

const LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Everything a worker needs for one segment.
#[derive(Debug, Clone, Copy)]
pub struct WorkerTask<'a> {
    pub ctx: TrainContext<'a>,
    pub trainers: &'a TrainerSet,
    pub state: &'a TrainingState,
    pub mode: Mode,
    /// Edge budget of the segment, summed over threads.
    pub samples: u64,
    /// Budget units charged per outer iteration.
    pub edge_type_num: u64,
    pub num_threads: usize,
    pub seed: u64,
    /// Global segment index, used to vary thread seeds between segments.
    pub segment: u64,
    /// Inner epoch counter, for log lines only.
    pub epoch: usize,
}

/// What one worker did in one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    /// Budget units charged.
    pub edges: u64,
    /// `train_sample` calls made.
    pub trained: u64,
}

/// Seed for one thread in one segment.
pub fn thread_seed(seed: u64, segment: u64, thread: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = seed
        ^ segment.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (thread as u64).wrapping_mul(0xD1B5_4A32_D192_ED03);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Train until this thread's share of the segment budget is used up.
///
/// Each outer iteration runs [`BATCHES_PER_ITERATION`] batches over every
/// sampleable trainer and charges `edge_type_num` units to the budget. With
/// the default count one unit buys 20 samples.
pub fn run_worker(task: &WorkerTask<'_>, thread: usize) -> Result<WorkerStats> {
    let active: Vec<&EdgeTrainer> = task.trainers.active(task.ctx.graph).collect();
    if active.is_empty() {
        return Ok(WorkerStats::default());
    }

    let mut rng = XorShiftRng::seed_from_u64(thread_seed(task.seed, task.segment, thread));
    let mut scratch = Scratch::new(task.ctx.dim());
    let limit = task.samples / task.num_threads.max(1) as u64 + 2;

    let step = task.edge_type_num.max(1);
    let mut local: u64 = 0;
    let mut trained: u64 = 0;
    let mut last_published: u64 = 0;
    let mut alpha = task.state.alpha();
    let mut last_log = Instant::now();

    while local <= limit {
        if local - last_published > PROGRESS_INTERVAL {
            alpha = task.state.record_progress(local - last_published);
            last_published = local;

            if thread == 0 && last_log.elapsed() >= LOG_INTERVAL {
                debug!(
                    epoch = task.epoch,
                    mode = %task.mode,
                    alpha,
                    progress = format_args!("{:.3}%", task.state.progress_percent()),
                    "training"
                );
                last_log = Instant::now();
            }
        }

        for _ in 0..BATCHES_PER_ITERATION {
            for trainer in &active {
                trainer.train_sample(&task.ctx, task.mode, alpha, &mut scratch, &mut rng)?;
            }
        }
        trained += (BATCHES_PER_ITERATION * active.len()) as u64;
        local += step;
    }

    if local > last_published {
        task.state.record_progress(local - last_published);
    }

    Ok(WorkerStats {
        edges: local,
        trained,
    })
}
