//! scl-policy
//!
//! The policy contract and the builtin baselines.
//!
//! Contract:
//! - A policy maps one evaluation input to one evaluation output.
//! - The call is contract-async: builtins answer immediately, harness-backed
//!   policies suspend on subprocess stdio. The engine awaits each call in
//!   agent-list order.
//! - A policy that errors is recovered by the engine as HOLD; it never aborts
//!   a window.

mod baselines;

pub use baselines::{builtin_policy, BuyAndHoldPolicy, FlatPolicy, MomentumPolicy};

use async_trait::async_trait;
use scl_schemas::{EvaluationInput, EvaluationOutput};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    /// The policy callable itself raised. Recovered by the engine as HOLD
    /// with `err_code = 5`.
    #[error("policy raised: {0}")]
    Exception(String),
}

#[async_trait]
pub trait Policy: Send {
    async fn evaluate(&mut self, input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError>;
}
