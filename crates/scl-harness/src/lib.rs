//! scl-harness
//!
//! Client for the long-lived native policy runner subprocess.
//!
//! Wire contract (line-delimited JSON over the child's stdio):
//! - requests: `init`, `eval`, `shutdown`, each tagged with a monotonically
//!   increasing `request_id`
//! - responses: `ok`, `error`, `result`, correlated back by `request_id`
//! - integer amounts travel as decimal strings so the native runtime's 64-bit
//!   fixed-point domain survives the float-typed core
//!
//! Failure model: when the child dies, every outstanding request fails with
//! `HarnessError::Gone`. Responses with no pending entry and unparseable
//! lines are ignored.

mod client;
mod wire;

pub use client::{HarnessClient, HarnessPolicy, ProgramSpec};
pub use wire::{
    from_fixed_string, to_fixed_string, HarnessRequest, HarnessRequestBody, HarnessResponse,
    WireEvaluationInput, WireEvaluationOutput,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    /// The child exited (or its stdio closed) with requests outstanding.
    #[error("harness process gone")]
    Gone,

    /// The child answered, but the payload violates the wire contract.
    #[error("harness protocol violation: {0}")]
    Protocol(String),

    #[error("harness spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
}
