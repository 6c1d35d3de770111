use std::collections::BTreeMap;

use scl_schemas::{ArenaConfig, Bar, Instrument, SamplingMode, ScoringWeights, WindowSamplingConfig};

pub fn test_config() -> ArenaConfig {
    let mut initial_balances = BTreeMap::new();
    initial_balances.insert("USDC".to_string(), 10_000.0);

    ArenaConfig {
        arena_id: "T1".into(),
        bar_interval_seconds: 60,
        window_duration_bars: 10,
        max_window_overlap_pct: 0.0,
        windows_per_round: 2,
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
        scoring_weights: Some(ScoringWeights {
            pnl: 1.0,
            drawdown: 0.0,
            exposure: 0.0,
        }),
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

pub fn weights(cfg: &ArenaConfig) -> ScoringWeights {
    cfg.scoring_weights.expect("test config carries inline weights")
}

/// Gently rising tape long enough for `n` sequential 10-bar windows.
pub fn rising_tape(len: usize) -> Vec<Bar> {
    (0..len)
        .map(|i| {
            let p = 100.0 + i as f64 * 0.5;
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
