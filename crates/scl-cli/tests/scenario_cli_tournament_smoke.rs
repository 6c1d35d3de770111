use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn tournament_subcommand_runs_baselines_end_to_end() {
    let dir = tempfile::tempdir().unwrap();

    let arena = serde_json::json!({
        "arena_id": "T1",
        "bar_interval_seconds": 60,
        "window_duration_bars": 10,
        "max_window_overlap_pct": 0.0,
        "windows_per_round": 2,
        "window_sampling": {"mode": "sequential"},
        "lookback_len": 5,
        "slippage_bps": 0,
        "impact_coeff_bps": 0,
        "liquidity_multiplier": 1.0,
        "min_liquidity": 1.0,
        "taker_fee_bps": 0,
        "initial_margin_bps": 0,
        "maintenance_margin_bps": 0,
        "max_leverage_bps": 1000000,
        "liquidation_fee_bps": 0,
        "funding_rate_bps": 0,
        "initial_balances": {"USDC": 10000.0},
        "scoring_weights": {"pnl": 1.0, "drawdown": 0.0, "exposure": 0.0},
        "builtin_baselines": ["FLAT", "BUY_AND_HOLD"],
        "instrument": {
            "symbol": "SOL-PERP",
            "base_asset": "SOL",
            "quote_asset": "USDC",
            "price_scale": 6,
            "volume_scale": 9
        },
        "tape_source": {"type": "synthetic", "generator_id": "gbm-v1", "seed": 7,
                        "params": {"bars": 40, "volatility_bps": 30}}
    });
    std::fs::write(
        dir.path().join("arena-config.json"),
        arena.to_string(),
    )
    .unwrap();

    let tournament = serde_json::json!({
        "arena_config": "arena-config.json",
        "rounds": 1,
        "runtime": "in_process",
        "output_dir": "out",
        "agents": [],
        "container_runtime": "host"
    });
    std::fs::write(
        dir.path().join("tournament.json"),
        tournament.to_string(),
    )
    .unwrap();

    Command::cargo_bin("solclash")
        .unwrap()
        .args(["tournament", "--config"])
        .arg(dir.path().join("tournament.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("round 1 winner="));

    assert!(dir.path().join("out/tournament.json").exists());
    assert!(dir.path().join("out/rounds/1/round_meta.json").exists());
}
