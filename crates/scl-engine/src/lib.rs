//! scl-engine
//!
//! The per-window simulation engine: one deterministic two-phase state
//! machine per bar, shared across all agents.
//!
//! Pipeline per bar `t`:
//! 1. DECIDE — funding, policy call, output normalization, mark-to-market at
//!    the bar close, maintenance check. Agents cannot observe one another.
//! 2. CLEAR — all intended deltas are summed into one net flow and filled at
//!    a single uniform price off the next bar's open. Margin gates run on the
//!    hypothetical post-trade account; rejected trades are downgraded to HOLD.
//!
//! The engine is pure and stateless across windows: bars in, logs + metrics
//! out, tape untouched.

mod metrics;
mod window;

pub use metrics::metrics_from_curve;
pub use window::{run_window, AgentLogs, AgentSlot, WindowOutcome};
