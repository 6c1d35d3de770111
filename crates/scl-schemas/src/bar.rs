use serde::{Deserialize, Serialize};

/// One element of the price tape. Immutable once loaded.
///
/// Invariants (enforced by the validator, not the type):
/// - `low <= open, close <= high`
/// - all prices > 0, `volume >= 0`
/// - consecutive bars are contiguous: `next.bar_start_ts_ms = prev.bar_start_ts_ms + interval`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub symbol: String,
    pub bar_start_ts_ms: i64,
    pub bar_end_ts_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Instrument metadata carried read-only through every evaluation input.
///
/// The integer scales document the fixed-point representation used by the
/// native policy runner; the core itself operates in floating point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub price_scale: u32,
    pub volume_scale: u32,
}
