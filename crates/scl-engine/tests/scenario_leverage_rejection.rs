mod common;

use async_trait::async_trait;
use scl_engine::{run_window, AgentSlot};
use scl_policy::{Policy, PolicyError};
use scl_schemas::{ActionType, EvaluationInput, EvaluationOutput, StepStatus};

/// Tries to short 50 units on the first step, then holds.
struct OversizedSell;

#[async_trait]
impl Policy for OversizedSell {
    async fn evaluate(&mut self, input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        if input.step_index == 0 {
            Ok(EvaluationOutput::sell(50.0))
        } else {
            Ok(EvaluationOutput::hold())
        }
    }
}

#[tokio::test]
async fn oversized_trade_is_rejected_by_the_leverage_gate() {
    let mut config = common::test_config();
    config.max_leverage_bps = 5_000;
    let bars = common::flat_tape(10, 100.0);

    let mut agents = vec![AgentSlot {
        agent_id: "OVERSIZED".into(),
        policy: Box::new(OversizedSell),
    }];
    let outcomes = run_window(&config, &bars, "w0", &mut agents).await;
    let out = &outcomes[0];

    assert!(out.logs.trades.is_empty());
    assert_eq!(out.final_account.position, 0.0);
    assert_eq!(out.final_account.cash, 10_000.0);

    let first = &out.logs.policy[0];
    assert_eq!(first.status, StepStatus::Err);
    assert_eq!(first.err_code, 6);
    assert_eq!(first.action, ActionType::Hold);
}
