//! scl-arena
//!
//! One competition round, end to end: load the tape, validate it, enumerate
//! and sample windows, replay every selected window through the engine,
//! aggregate scores, and write the round's artifact tree.

mod round;
mod synth;
mod tape;

pub use round::{baseline_agents, run_round, RoundContext, RoundOutcome};
pub use synth::generate_tape;
pub use tape::{load_tape, Tape, TapeError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Tape(#[from] TapeError),

    #[error(transparent)]
    Windows(#[from] scl_windows::WindowError),

    #[error(transparent)]
    Artifact(#[from] anyhow::Error),
}
