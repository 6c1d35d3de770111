//! scl-orchestrator
//!
//! The tournament's moving parts above a single round:
//! - edit phase: concurrent per-agent edit sessions in containers, with
//!   workspace capture-back on success only
//! - competition phase: one round inside an arena container
//! - tournament loop: edit -> compete per round, artifact collection, and
//!   log injection into each agent workspace

mod compete;
mod config;
mod edit;
mod prompt;
mod tournament;

pub use compete::run_containerized_round;
pub use config::{
    AgentSpec, EditSettings, HarnessSettings, NetworkPolicy, RuntimeChoice, TournamentConfig,
};
pub use edit::{run_edit_phase, EditMeta, EditOutcome, EditStatus};
pub use prompt::{resolve_prompt, ResolvedPrompt};
pub use tournament::{run_single_round, run_tournament};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The containerized arena runner exited non-zero.
    #[error("arena run failed (exit {exit_code}): {stderr}")]
    ArenaRunFailed { exit_code: i32, stderr: String },

    /// The configured prompt reference is neither `default` nor a file.
    #[error("unrecognized prompt reference '{0}'")]
    PromptUnresolvable(String),
}
