use std::collections::BTreeMap;

use scl_schemas::{ArenaConfig, Bar, Instrument, SamplingMode, WindowSamplingConfig};

/// Arena config with frictionless defaults; scenarios override the knobs
/// they exercise.
pub fn test_config() -> ArenaConfig {
    let mut initial_balances = BTreeMap::new();
    initial_balances.insert("USDC".to_string(), 10_000.0);

    ArenaConfig {
        arena_id: "T1".into(),
        bar_interval_seconds: 60,
        window_duration_bars: 10,
        max_window_overlap_pct: 0.0,
        windows_per_round: 1,
        window_sampling: WindowSamplingConfig {
            mode: SamplingMode::Sequential,
            stress_count: 0,
            volatility_buckets: 3,
            trend_buckets: 3,
            volume_buckets: 3,
            seed: None,
        },
        lookback_len: 5,
        slippage_bps: 0,
        impact_coeff_bps: 0,
        impact_cap_bps: None,
        liquidity_multiplier: 1.0,
        min_liquidity: 1.0,
        taker_fee_bps: 0,
        initial_margin_bps: 0,
        maintenance_margin_bps: 0,
        max_leverage_bps: 1_000_000,
        liquidation_fee_bps: 0,
        funding_rate_bps: 0,
        initial_balances,
        scoring_weights: None,
        scoring_weights_reference: None,
        builtin_baselines: vec![],
        instrument: Instrument {
            symbol: "SOL-PERP".into(),
            base_asset: "SOL".into(),
            quote_asset: "USDC".into(),
            price_scale: 6,
            volume_scale: 9,
        },
        tape_source: None,
    }
}

/// Flat tape: every bar at `price` with range +/- 1 and volume 100.
pub fn flat_tape(len: usize, price: f64) -> Vec<Bar> {
    (0..len)
        .map(|i| Bar {
            symbol: "SOL-PERP".into(),
            bar_start_ts_ms: i as i64 * 60_000,
            bar_end_ts_ms: (i as i64 + 1) * 60_000,
            open: price,
            high: price + 1.0,
            low: price - 1.0,
            close: price,
            volume: 100.0,
        })
        .collect()
}

/// Rising tape: bar `i` priced `start + i`.
pub fn rising_tape(len: usize, start: f64) -> Vec<Bar> {
    (0..len)
        .map(|i| {
            let p = start + i as f64;
            Bar {
                symbol: "SOL-PERP".into(),
                bar_start_ts_ms: i as i64 * 60_000,
                bar_end_ts_ms: (i as i64 + 1) * 60_000,
                open: p,
                high: p + 1.0,
                low: p - 1.0,
                close: p,
                volume: 100.0,
            }
        })
        .collect()
}
