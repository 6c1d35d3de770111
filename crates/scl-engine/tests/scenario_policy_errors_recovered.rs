mod common;

use async_trait::async_trait;
use scl_engine::{run_window, AgentSlot};
use scl_policy::{Policy, PolicyError};
use scl_schemas::{ActionType, EvaluationInput, EvaluationOutput, StepStatus};

/// Raises on every call.
struct Exploding;

#[async_trait]
impl Policy for Exploding {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Err(PolicyError::Exception("boom".into()))
    }
}

/// Speaks the wrong schema version.
struct WrongVersion;

#[async_trait]
impl Policy for WrongVersion {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Ok(EvaluationOutput {
            version: 2,
            action_type: ActionType::Buy,
            order_qty: 1.0,
            err_code: 0,
        })
    }
}

/// BUY with a zero quantity.
struct ZeroQtyBuy;

#[async_trait]
impl Policy for ZeroQtyBuy {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Ok(EvaluationOutput {
            version: scl_schemas::EVAL_SCHEMA_VERSION,
            action_type: ActionType::Buy,
            order_qty: 0.0,
            err_code: 0,
        })
    }
}

#[tokio::test]
async fn raised_policy_becomes_hold_with_err_code_5() {
    let config = common::test_config();
    let bars = common::flat_tape(5, 100.0);

    let mut agents = vec![AgentSlot {
        agent_id: "EXPLODING".into(),
        policy: Box::new(Exploding),
    }];
    let out = &run_window(&config, &bars, "w0", &mut agents).await[0];

    assert!(out.logs.trades.is_empty());
    for rec in &out.logs.policy {
        assert_eq!(rec.action, ActionType::Hold);
        assert_eq!(rec.status, StepStatus::Err);
        assert_eq!(rec.err_code, 5);
    }
    // Recovered locally: the window still produced a full equity curve.
    assert_eq!(out.logs.equity.len(), 5);
}

#[tokio::test]
async fn malformed_output_becomes_hold_with_err_code_6() {
    let config = common::test_config();
    let bars = common::flat_tape(5, 100.0);

    for policy in [
        Box::new(WrongVersion) as Box<dyn Policy>,
        Box::new(ZeroQtyBuy) as Box<dyn Policy>,
    ] {
        let mut agents = vec![AgentSlot {
            agent_id: "BAD".into(),
            policy,
        }];
        let out = &run_window(&config, &bars, "w0", &mut agents).await[0];
        assert!(out.logs.trades.is_empty());
        assert_eq!(out.logs.policy[0].action, ActionType::Hold);
        assert_eq!(out.logs.policy[0].err_code, 6);
    }
}
