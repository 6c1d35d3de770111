use serde::{Deserialize, Serialize};

use crate::{ActionType, StepStatus};

/// One policy decision as it actually took effect (downgrades included).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyLogRecord {
    pub window_id: String,
    pub step_index: usize,
    pub agent_id: String,
    pub action: ActionType,
    pub order_qty: f64,
    pub status: StepStatus,
    pub err_code: u32,
}

/// One committed trade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeLogRecord {
    pub window_id: String,
    pub step_index: usize,
    pub agent_id: String,
    pub delta_qty: f64,
    pub exec_price: f64,
    pub fee: f64,
    pub slippage_bps: f64,
    pub impact_bps: f64,
    /// The step's net flow across all agents (drives the uniform price).
    pub net_qty: f64,
}

/// Mark-to-market point, one per (agent, step).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EquityLogRecord {
    pub window_id: String,
    pub step_index: usize,
    pub agent_id: String,
    pub equity: f64,
    pub cash: f64,
    pub position: f64,
    pub mark_price: f64,
}

/// A forced close.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LiquidationLogRecord {
    pub window_id: String,
    pub step_index: usize,
    pub agent_id: String,
    pub liquidated_qty: f64,
    pub exec_price: f64,
    pub fee: f64,
}
