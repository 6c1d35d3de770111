use serde::{Deserialize, Serialize};

use crate::{Account, Bar, Instrument};

/// The four actions a policy may request per step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionType {
    Hold,
    Buy,
    Sell,
    Close,
}

/// OK/ERR status recorded in the policy log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    Ok,
    Err,
}

/// Margin parameters snapshot handed to policies (from the arena config).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginParams {
    pub initial_margin_bps: i64,
    pub maintenance_margin_bps: i64,
    pub max_leverage_bps: i64,
    pub taker_fee_bps: i64,
}

/// Everything a policy sees for one step.
///
/// `bars` is the lookback slice ending at the current step; the policy never
/// sees the bar it will execute against (`step + 1` open).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationInput {
    pub version: u32,
    pub window_id: String,
    pub step_index: usize,
    pub bars: Vec<Bar>,
    pub account: Account,
    pub instrument: Instrument,
    pub margin: MarginParams,
}

/// A policy's answer for one step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutput {
    pub version: u32,
    pub action_type: ActionType,
    pub order_qty: f64,
    pub err_code: u32,
}

impl EvaluationOutput {
    pub fn hold() -> Self {
        Self {
            version: crate::EVAL_SCHEMA_VERSION,
            action_type: ActionType::Hold,
            order_qty: 0.0,
            err_code: 0,
        }
    }

    pub fn buy(qty: f64) -> Self {
        Self {
            version: crate::EVAL_SCHEMA_VERSION,
            action_type: ActionType::Buy,
            order_qty: qty,
            err_code: 0,
        }
    }

    pub fn sell(qty: f64) -> Self {
        Self {
            version: crate::EVAL_SCHEMA_VERSION,
            action_type: ActionType::Sell,
            order_qty: qty,
            err_code: 0,
        }
    }

    pub fn close() -> Self {
        Self {
            version: crate::EVAL_SCHEMA_VERSION,
            action_type: ActionType::Close,
            order_qty: 0.0,
            err_code: 0,
        }
    }
}
