use serde::{Deserialize, Serialize};

use scl_schemas::{ActionType, EvaluationInput, EvaluationOutput, Instrument, MarginParams};

use crate::HarnessError;

/// A native policy program to preload at `init`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpecWire {
    pub id: String,
    pub so_path: String,
}

/// One request line. `request_id` is allocated by the client and echoed by
/// every response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarnessRequest {
    pub request_id: u64,
    #[serde(flatten)]
    pub body: HarnessRequestBody,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarnessRequestBody {
    Init {
        programs: Vec<ProgramSpecWire>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compute_unit_limit: Option<u64>,
    },
    Eval {
        agent_id: String,
        input: WireEvaluationInput,
    },
    Shutdown {},
}

/// One response line.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarnessResponse {
    Ok {
        request_id: u64,
    },
    Error {
        request_id: u64,
        message: String,
    },
    Result {
        request_id: u64,
        agent_id: String,
        status: String,
        output: WireEvaluationOutput,
    },
}

impl HarnessResponse {
    pub fn request_id(&self) -> u64 {
        match self {
            HarnessResponse::Ok { request_id }
            | HarnessResponse::Error { request_id, .. }
            | HarnessResponse::Result { request_id, .. } => *request_id,
        }
    }
}

/// Evaluation input as the native runner sees it: every amount a decimal
/// string of the fixed-point integer, truncated toward zero.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvaluationInput {
    pub version: u32,
    pub window_id: String,
    pub step_index: usize,
    pub bars: Vec<WireBar>,
    pub account: WireAccount,
    pub instrument: Instrument,
    pub margin: MarginParams,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBar {
    pub symbol: String,
    pub bar_start_ts_ms: i64,
    pub bar_end_ts_ms: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAccount {
    pub cash: String,
    pub position: String,
    pub avg_entry_price: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvaluationOutput {
    pub version: u32,
    pub action_type: ActionType,
    /// Decimal string in volume-scale fixed point.
    pub order_qty: String,
    pub err_code: u32,
}

/// Truncate toward zero into `scale` fixed-point decimals and render.
pub fn to_fixed_string(value: f64, scale: u32) -> String {
    let scaled = (value * 10f64.powi(scale as i32)).trunc();
    format!("{}", scaled as i128)
}

/// Parse a decimal-string fixed-point amount back into a float.
pub fn from_fixed_string(s: &str, scale: u32) -> Result<f64, HarnessError> {
    let raw: i128 = s
        .parse()
        .map_err(|_| HarnessError::Protocol(format!("bad decimal string '{s}'")))?;
    Ok(raw as f64 / 10f64.powi(scale as i32))
}

impl WireEvaluationInput {
    pub fn from_input(input: &EvaluationInput) -> Self {
        let ps = input.instrument.price_scale;
        let vs = input.instrument.volume_scale;
        Self {
            version: input.version,
            window_id: input.window_id.clone(),
            step_index: input.step_index,
            bars: input
                .bars
                .iter()
                .map(|b| WireBar {
                    symbol: b.symbol.clone(),
                    bar_start_ts_ms: b.bar_start_ts_ms,
                    bar_end_ts_ms: b.bar_end_ts_ms,
                    open: to_fixed_string(b.open, ps),
                    high: to_fixed_string(b.high, ps),
                    low: to_fixed_string(b.low, ps),
                    close: to_fixed_string(b.close, ps),
                    volume: to_fixed_string(b.volume, vs),
                })
                .collect(),
            account: WireAccount {
                cash: to_fixed_string(input.account.cash, ps),
                position: to_fixed_string(input.account.position, vs),
                avg_entry_price: to_fixed_string(input.account.avg_entry_price, ps),
            },
            instrument: input.instrument.clone(),
            margin: input.margin,
        }
    }
}

impl WireEvaluationOutput {
    pub fn into_output(self, volume_scale: u32) -> Result<EvaluationOutput, HarnessError> {
        Ok(EvaluationOutput {
            version: self.version,
            action_type: self.action_type,
            order_qty: from_fixed_string(&self.order_qty, volume_scale)?,
            err_code: self.err_code,
        })
    }
}
