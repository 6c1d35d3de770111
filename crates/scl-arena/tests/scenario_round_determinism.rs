mod common;

use std::collections::BTreeMap;

use scl_arena::{run_round, RoundContext};
use scl_engine::AgentSlot;
use scl_policy::{BuyAndHoldPolicy, MomentumPolicy};
use scl_schemas::RoundMeta;

async fn run_once(out_dir: &std::path::Path) -> RoundMeta {
    let config = common::test_config();
    let bars = common::rising_tape(20);

    let agents = vec![
        AgentSlot {
            agent_id: "MOMENTUM".into(),
            policy: Box::new(MomentumPolicy),
        },
        AgentSlot {
            agent_id: "BUY_AND_HOLD".into(),
            policy: Box::new(BuyAndHoldPolicy),
        },
    ];
    run_round(
        RoundContext {
            config: &config,
            weights: common::weights(&config),
            bars: &bars,
            round_num: 1,
            out_dir,
        },
        agents,
        BTreeMap::new(),
    )
    .await
    .unwrap()
    .meta
}

#[tokio::test]
async fn identical_inputs_yield_identical_scores_and_winner() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let a = run_once(dir_a.path()).await;
    let b = run_once(dir_b.path()).await;

    assert_eq!(a.scores, b.scores);
    assert_eq!(a.winner, b.winner);

    // The artifact bytes match too, wall-clock stamps aside.
    let logs_a =
        std::fs::read(dir_a.path().join("BUY_AND_HOLD").join("equity_log.jsonl")).unwrap();
    let logs_b =
        std::fs::read(dir_b.path().join("BUY_AND_HOLD").join("equity_log.jsonl")).unwrap();
    assert_eq!(logs_a, logs_b);
}
