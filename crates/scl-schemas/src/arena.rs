use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Instrument;

/// Where the tape comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TapeSource {
    Historical {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dataset_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bar_interval_seconds: Option<i64>,
    },
    Synthetic {
        generator_id: String,
        seed: u64,
        #[serde(default)]
        params: serde_json::Value,
    },
}

/// How the round's window subset is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    Sequential,
    Stratified,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSamplingConfig {
    pub mode: SamplingMode,
    #[serde(default)]
    pub stress_count: usize,
    #[serde(default = "default_buckets")]
    pub volatility_buckets: usize,
    #[serde(default = "default_buckets")]
    pub trend_buckets: usize,
    #[serde(default = "default_buckets")]
    pub volume_buckets: usize,
    /// Defaults to the arena id at round time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
}

fn default_buckets() -> usize {
    3
}

impl Default for WindowSamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Sequential,
            stress_count: 0,
            volatility_buckets: 3,
            trend_buckets: 3,
            volume_buckets: 3,
            seed: None,
        }
    }
}

/// Linear scoring coefficients applied to `(pnl_total, drawdown_max, exposure_avg)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub pnl: f64,
    pub drawdown: f64,
    pub exposure: f64,
}

/// The immutable rule set of a round.
///
/// Invariants (checked by scl-config validation):
/// - `maintenance_margin_bps <= initial_margin_bps`
/// - `lookback_len < window_duration_bars`
/// - `initial_balances` contains the quote asset
/// - `max_leverage_bps >= 10_000`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub arena_id: String,
    pub bar_interval_seconds: i64,
    pub window_duration_bars: usize,
    pub max_window_overlap_pct: f64,
    pub windows_per_round: usize,
    #[serde(default)]
    pub window_sampling: WindowSamplingConfig,
    pub lookback_len: usize,

    // Execution pricing (bps / scale factors).
    pub slippage_bps: i64,
    pub impact_coeff_bps: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_cap_bps: Option<i64>,
    pub liquidity_multiplier: f64,
    pub min_liquidity: f64,

    // Fees, margin, funding (bps).
    pub taker_fee_bps: i64,
    pub initial_margin_bps: i64,
    pub maintenance_margin_bps: i64,
    pub max_leverage_bps: i64,
    pub liquidation_fee_bps: i64,
    pub funding_rate_bps: i64,

    /// Asset id -> starting balance. Accounts initialize from the quote entry.
    pub initial_balances: BTreeMap<String, f64>,

    /// Inline weights win; the reference is consulted only when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_weights: Option<ScoringWeights>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_weights_reference: Option<String>,

    #[serde(default)]
    pub builtin_baselines: Vec<String>,

    pub instrument: Instrument,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tape_source: Option<TapeSource>,
}

impl ArenaConfig {
    /// Interval between consecutive bar starts, in milliseconds.
    pub fn bar_interval_ms(&self) -> i64 {
        self.bar_interval_seconds * 1_000
    }

    /// Starting cash for every account: the initial balance of the quote asset.
    pub fn initial_quote_balance(&self) -> f64 {
        self.initial_balances
            .get(&self.instrument.quote_asset)
            .copied()
            .unwrap_or(0.0)
    }

    /// Sampling seed: configured value, else the arena id.
    pub fn sampling_seed(&self) -> &str {
        self.window_sampling
            .seed
            .as_deref()
            .unwrap_or(&self.arena_id)
    }
}
