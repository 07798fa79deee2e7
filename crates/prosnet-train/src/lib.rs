#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

//! Skip-gram training over heterogeneous networks.
//!
//! Each edge type gets its own [`EdgeTrainer`]. Worker threads visit every
//! trainer in turn, so a relation with ten edges receives as many updates as
//! one with ten million. Updates go straight into the shared stores with no
//! locking (HogWild).
//!
//! # Pieces
//!
//! | Type | Role |
//! |------|------|
//! | [`EdgeTrainer`] | positive edge + `K` negatives, logistic SGD step |
//! | [`Mode`] | which space is the target, which side learns |
//! | [`TrainingState`] | shared learning rate and progress counter |
//! | [`run_worker`] | per-thread loop for one segment |
//! | [`Curriculum`] | mode sequence and checkpoint cadence per `train_mode` |
//! | [`Scheduler`] | pool, barriers, checkpoints, final dump |
//!
//! # Example
//!
//! ```rust,no_run
//! use prosnet_core::{EmbeddingStore, HinGraph};
//! use prosnet_train::{CheckpointConfig, Scheduler, TrainConfig, TrainContext, TrainerSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = EmbeddingStore::from_node_file("data/node.dat", 128, 1)?;
//! let context = EmbeddingStore::new(source.dictionary().clone(), 128, 2)?;
//! let graph = HinGraph::init("data/link.dat", &source, &context)?;
//!
//! let config = TrainConfig::default().with_dim(128).with_threads(8);
//! let trainers = TrainerSet::from_graph(&graph, config.negative);
//! let ctx = TrainContext::new(&graph, &source, &context)?;
//!
//! let mut scheduler = Scheduler::new(config, CheckpointConfig::default().with_output("vec.txt"))?;
//! let report = scheduler.run(ctx, &trainers, None)?;
//! println!("{} segments, final dump at {}", report.segments, report.final_output.display());
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod mode;
pub mod scheduler;
pub mod state;
pub mod trainer;
pub mod worker;

pub use checkpoint::{checkpoint_path, final_path};
pub use config::{CheckpointConfig, TrainConfig};
pub use curriculum::{Block, Cadence, Curriculum, Segment, NUM_CURRICULA};
pub use error::{Error, Result};
pub use mode::{Mode, Space};
pub use scheduler::{train, CheckpointEvent, Scheduler, TrainingObserver, TrainingReport};
pub use state::TrainingState;
pub use trainer::{sigmoid, EdgeTrainer, Scratch, TrainContext, TrainerSet};
pub use worker::{run_worker, thread_seed, WorkerStats, WorkerTask};
