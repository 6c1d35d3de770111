use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scl_schemas::{Bar, Instrument};
use serde_json::Value;

use crate::TapeError;

/// Deterministic geometric-walk tape generator for
/// `tape_source = {type: "synthetic"}`.
///
/// Supported `generator_id`: `"gbm-v1"`. Params (all optional):
/// `bars` (default 512), `start_price` (100.0), `drift_bps` (0),
/// `volatility_bps` (50), `base_volume` (100.0).
///
/// The only randomness is the seeded ChaCha stream; the same
/// `(generator_id, seed, params)` always reproduces the same tape.
pub fn generate_tape(
    generator_id: &str,
    seed: u64,
    params: &Value,
    instrument: &Instrument,
    interval_ms: i64,
) -> Result<Vec<Bar>, TapeError> {
    if generator_id != "gbm-v1" {
        return Err(TapeError::Schema {
            path: "<synthetic>".into(),
            message: format!("unknown generator_id '{generator_id}'"),
        });
    }

    let bars = param_f64(params, "bars", 512.0) as usize;
    let start_price = param_f64(params, "start_price", 100.0);
    let drift_bps = param_f64(params, "drift_bps", 0.0);
    let volatility_bps = param_f64(params, "volatility_bps", 50.0);
    let base_volume = param_f64(params, "base_volume", 100.0);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut close = start_price;
    let mut out = Vec::with_capacity(bars);

    for i in 0..bars {
        let open = close;
        let shock: f64 = rng.gen_range(-1.0..1.0);
        let ret = (drift_bps + volatility_bps * shock) / 10_000.0;
        close = (open * (1.0 + ret)).max(f64::MIN_POSITIVE);

        let span = open.max(close) * volatility_bps / 20_000.0;
        let high = open.max(close) + span * rng.gen_range(0.0..1.0);
        let low = (open.min(close) - span * rng.gen_range(0.0..1.0)).max(close * 0.01);
        let volume = base_volume * (0.5 + rng.gen_range(0.0..1.0));

        let start_ts = i as i64 * interval_ms;
        out.push(Bar {
            symbol: instrument.symbol.clone(),
            bar_start_ts_ms: start_ts,
            bar_end_ts_ms: start_ts + interval_ms,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(out)
}

fn param_f64(params: &Value, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}
