//! scl-schemas
//!
//! Shared data model for the SolClash tournament core.
//!
//! Contract:
//! - Pure types + serde; no I/O, no clocks, no business logic beyond
//!   trivially derivable accessors.
//! - Everything that crosses a file or process boundary is defined here so
//!   the in-process round executor and the containerized arena runner agree
//!   on one schema.

mod account;
mod action;
mod arena;
mod bar;
mod logs;
mod manifest;
mod metrics;

pub use account::Account;
pub use action::{ActionType, EvaluationInput, EvaluationOutput, MarginParams, StepStatus};
pub use arena::{ArenaConfig, SamplingMode, ScoringWeights, TapeSource, WindowSamplingConfig};
pub use bar::{Bar, Instrument};
pub use logs::{EquityLogRecord, LiquidationLogRecord, PolicyLogRecord, TradeLogRecord};
pub use manifest::{AgentManifest, AgentProvider};
pub use metrics::{
    AgentRoundMetrics, AgentScore, RoundEntry, RoundMeta, RoundResults, RoundSummary,
    TournamentRecord, WindowMetrics, WindowSummary,
};

/// Basis-point denominator shared by every bps-typed config field.
pub const BPS_DENOM: f64 = 10_000.0;

/// Evaluation input/output schema version spoken by the core and the native
/// policy runner. Outputs carrying any other version are rejected.
pub const EVAL_SCHEMA_VERSION: u32 = 1;

/// Error code recorded when a policy callable itself raised.
pub const ERR_POLICY_EXCEPTION: u32 = 5;

/// Error code recorded when a policy output is malformed or a trade is
/// rejected by margin / leverage gates.
pub const ERR_OUTPUT_REJECTED: u32 = 6;
