//! Checkpoint file naming.

use crate::config::CheckpointConfig;
use std::path::PathBuf;

/// Step count encoded in a checkpoint name for a given round.
pub const STEPS_PER_ROUND: usize = 500;

/// Path of the periodic dump written after `round`.
///
/// `<dir>/<stem>_<size>_<depth>_<restart>_<steps>_ppi_rwr_<ppi>_seq_rwr_<seq>_enum_<n>_lr_<alpha>_train_mode_<tm>`
pub fn checkpoint_path(
    config: &CheckpointConfig,
    dim: usize,
    round: usize,
    starting_alpha: f32,
    train_mode: usize,
) -> PathBuf {
    let name = format!(
        "{}_{}_{}_{:.6}_{}_ppi_rwr_{}_seq_rwr_{}_enum_{}_lr_{:.6}_train_mode_{}",
        config.node_stem,
        dim,
        config.depth,
        config.restart,
        round * STEPS_PER_ROUND,
        config.rwr_ppi,
        config.rwr_seq,
        config.edge_type_num,
        starting_alpha,
        train_mode,
    );
    config.dir.join(name)
}

/// Path of the unconditional final dump.
pub fn final_path(
    config: &CheckpointConfig,
    dim: usize,
    rounds: usize,
    starting_alpha: f32,
    train_mode: usize,
) -> PathBuf {
    match &config.output {
        Some(path) => path.clone(),
        None => checkpoint_path(config, dim, rounds, starting_alpha, train_mode),
    }
}
