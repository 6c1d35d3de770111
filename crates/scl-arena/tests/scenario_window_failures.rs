mod common;

use std::collections::BTreeMap;

use scl_arena::{run_round, ArenaError, RoundContext};
use scl_engine::AgentSlot;
use scl_policy::FlatPolicy;
use scl_windows::WindowError;

fn flat_agent() -> Vec<AgentSlot> {
    vec![AgentSlot {
        agent_id: "FLAT".into(),
        policy: Box::new(FlatPolicy),
    }]
}

#[tokio::test]
async fn too_short_tape_fails_with_no_windows() {
    let config = common::test_config();
    let bars = common::rising_tape(5);
    let dir = tempfile::tempdir().unwrap();

    let err = run_round(
        RoundContext {
            config: &config,
            weights: common::weights(&config),
            bars: &bars,
            round_num: 1,
            out_dir: dir.path(),
        },
        flat_agent(),
        BTreeMap::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ArenaError::Windows(WindowError::NoWindows { .. })
    ));
}

#[tokio::test]
async fn corrupted_tape_fails_when_valid_windows_run_out() {
    let config = common::test_config();
    let mut bars = common::rising_tape(20);
    // Poison both 10-bar windows.
    bars[3].volume = -1.0;
    bars[15].volume = -1.0;
    let dir = tempfile::tempdir().unwrap();

    let err = run_round(
        RoundContext {
            config: &config,
            weights: common::weights(&config),
            bars: &bars,
            round_num: 1,
            out_dir: dir.path(),
        },
        flat_agent(),
        BTreeMap::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        ArenaError::Windows(WindowError::InsufficientValidWindows {
            valid: 0,
            requested: 2
        })
    ));
}

#[tokio::test]
async fn invalidated_window_scores_zero_and_reports_the_first_error() {
    let config = common::test_config();
    let mut bars = common::rising_tape(30);
    // Poison only the first window; two valid ones remain.
    bars[3].volume = -1.0;
    let dir = tempfile::tempdir().unwrap();

    let outcome = run_round(
        RoundContext {
            config: &config,
            weights: common::weights(&config),
            bars: &bars,
            round_num: 1,
            out_dir: dir.path(),
        },
        flat_agent(),
        BTreeMap::new(),
    )
    .await
    .unwrap();

    // Sequential selection still picks w0; it is reported, not skipped.
    let w0 = &outcome.summary.windows[0];
    assert_eq!(w0.window_id, "w0");
    let reason = w0.invalid_window_reason.as_deref().unwrap();
    assert!(reason.contains("bar 3"), "unexpected reason: {reason}");

    let flat = &outcome.results.results[0];
    assert_eq!(flat.windows[0].pnl, 0.0);
    assert_eq!(flat.windows[0].equity_start, 10_000.0);
}

#[tokio::test]
async fn invalid_agents_score_zero_in_the_meta() {
    let config = common::test_config();
    let bars = common::rising_tape(20);
    let dir = tempfile::tempdir().unwrap();

    let mut invalid = BTreeMap::new();
    invalid.insert("BROKEN".to_string(), "workspace missing".to_string());

    let outcome = run_round(
        RoundContext {
            config: &config,
            weights: common::weights(&config),
            bars: &bars,
            round_num: 1,
            out_dir: dir.path(),
        },
        flat_agent(),
        invalid,
    )
    .await
    .unwrap();

    let broken = outcome
        .meta
        .scores
        .iter()
        .find(|s| s.agent_id == "BROKEN")
        .unwrap();
    assert_eq!(broken.score, 0.0);
    assert_eq!(
        outcome.meta.invalid_agents.get("BROKEN").map(String::as_str),
        Some("workspace missing")
    );
}
