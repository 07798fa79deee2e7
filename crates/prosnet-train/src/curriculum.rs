//! Curricula: which modes run in which order, and when to checkpoint.
//!
//! A curriculum is a sequence of rounds. Each round runs its blocks in order;
//! a block repeats one list of modes for a number of inner epochs, and each
//! mode of the list is one segment (one barrier across all workers).
//!
//! The progress counter that drives annealing is rewound to
//! `samples * progress_epoch` before the first mode of each inner epoch, where
//! `progress_epoch = round * stride + offset + k` for the `k`-th inner epoch of
//! a block. Later modes of the same inner epoch continue from where the
//! previous segment stopped. Blocks without an offset never rewind.
//!
//! | train_mode | round | blocks (offset) | stride | checkpoints |
//! |-----------|-------|-----------------|--------|-------------|
//! | 0 | 1 epoch | [3] (0) | 1 | standard |
//! | 1 | 1 epoch | [0, 1, 2] (0) | 1 | standard |
//! | 2 | 1 epoch | [0, 1] (0) | 1 | standard |
//! | 3 | 50 epochs | 25 × [1] (0), 25 × [2] (25) | 25 | every round |
//! | 4 | 50 epochs | 25 × [0] (0), 25 × [1] (25) | 25 | every round |
//! | 5 | 1 epoch | [0, 1, 2, 3] (0) | 1 | fine |
//! | 6 | 50 epochs | 50 × [0, 1] (0), 1 × [2] (none) | 50 | every 10 rounds |
//!
//! For train_mode 3 and 4 the second block of round `r` and the first block
//! of round `r + 1` cover the same progress epochs. Alpha never rises, so the
//! overlap only holds it where it already is.

use crate::error::{Error, Result};
use crate::mode::Mode;

/// Number of built-in curricula.
pub const NUM_CURRICULA: usize = 7;

/// When a finished round is followed by a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every 50 rounds below 500, then every 500.
    Standard,
    /// Every 10 rounds below 200, then every 500.
    Fine,
    /// Every `n` rounds.
    Every(usize),
}

impl Cadence {
    pub fn is_due(self, round: usize) -> bool {
        match self {
            Cadence::Standard => round % 500 == 0 || (round % 50 == 0 && round < 500),
            Cadence::Fine => round % 500 == 0 || (round % 10 == 0 && round < 200),
            Cadence::Every(n) => n > 0 && round % n == 0,
        }
    }
}

/// A list of modes repeated for a number of inner epochs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub modes: Vec<Mode>,
    pub epochs: usize,
    /// Progress epoch of the first inner epoch, relative to the round base.
    /// `None` keeps the counter running from the previous segment.
    pub rewind: Option<usize>,
}

impl Block {
    fn new(modes: &[usize], epochs: usize, rewind: Option<usize>) -> Self {
        Self {
            modes: modes.iter().filter_map(|&m| Mode::from_index(m)).collect(),
            epochs,
            rewind,
        }
    }
}

/// Declarative description of one `train_mode`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    pub train_mode: usize,
    /// Epochs of the `iters` budget consumed by one round.
    pub round_epochs: usize,
    /// Progress epochs between the rewind bases of two rounds.
    pub progress_stride: usize,
    pub blocks: Vec<Block>,
    pub cadence: Cadence,
}

impl Curriculum {
    /// Look up a built-in curriculum.
    pub fn for_train_mode(train_mode: usize) -> Result<Self> {
        let (round_epochs, progress_stride, blocks, cadence) = match train_mode {
            0 => (1, 1, vec![Block::new(&[3], 1, Some(0))], Cadence::Standard),
            1 => (1, 1, vec![Block::new(&[0, 1, 2], 1, Some(0))], Cadence::Standard),
            2 => (1, 1, vec![Block::new(&[0, 1], 1, Some(0))], Cadence::Standard),
            3 => (
                50,
                25,
                vec![Block::new(&[1], 25, Some(0)), Block::new(&[2], 25, Some(25))],
                Cadence::Every(1),
            ),
            4 => (
                50,
                25,
                vec![Block::new(&[0], 25, Some(0)), Block::new(&[1], 25, Some(25))],
                Cadence::Every(1),
            ),
            5 => (1, 1, vec![Block::new(&[0, 1, 2, 3], 1, Some(0))], Cadence::Fine),
            6 => (
                50,
                50,
                vec![Block::new(&[0, 1], 50, Some(0)), Block::new(&[2], 1, None)],
                Cadence::Every(10),
            ),
            other => {
                return Err(Error::Config(format!(
                    "train_mode must be in 0..={}, got {other}",
                    NUM_CURRICULA - 1
                )))
            }
        };
        Ok(Self {
            train_mode,
            round_epochs,
            progress_stride,
            blocks,
            cadence,
        })
    }

    /// Rounds that fit in `iters` epochs.
    pub fn rounds(&self, iters: usize) -> usize {
        iters / self.round_epochs
    }

    pub fn epochs_per_round(&self) -> usize {
        self.blocks.iter().map(|b| b.epochs).sum()
    }

    pub fn segments_per_round(&self) -> usize {
        self.blocks.iter().map(|b| b.epochs * b.modes.len()).sum()
    }

    /// Segments of one round, in execution order.
    pub fn round_segments(&self, round: usize) -> Vec<Segment> {
        let mut epoch = round * self.epochs_per_round();
        let mut segments = Vec::with_capacity(self.segments_per_round());
        let base = round * self.progress_stride;
        for block in &self.blocks {
            for k in 0..block.epochs {
                for (i, &mode) in block.modes.iter().enumerate() {
                    let rewind = match block.rewind {
                        Some(offset) if i == 0 => Some(base + offset + k),
                        _ => None,
                    };
                    segments.push(Segment {
                        round,
                        epoch,
                        mode,
                        rewind,
                    });
                }
                epoch += 1;
            }
        }
        segments
    }

    /// Every segment of a run, in execution order.
    pub fn plan(&self, iters: usize) -> impl Iterator<Item = Segment> + '_ {
        (0..self.rounds(iters)).flat_map(move |round| self.round_segments(round))
    }
}

/// One barrier-delimited unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub round: usize,
    /// Inner epoch counter across the whole run.
    pub epoch: usize,
    pub mode: Mode,
    /// Progress epoch to rewind the annealing counter to before this segment.
    pub rewind: Option<usize>,
}
