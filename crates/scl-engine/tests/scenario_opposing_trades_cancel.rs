mod common;

use async_trait::async_trait;
use scl_engine::{run_window, AgentSlot};
use scl_policy::{Policy, PolicyError};
use scl_schemas::{EvaluationInput, EvaluationOutput};

struct AlwaysBuy;

#[async_trait]
impl Policy for AlwaysBuy {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Ok(EvaluationOutput::buy(1.0))
    }
}

struct AlwaysSell;

#[async_trait]
impl Policy for AlwaysSell {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Ok(EvaluationOutput::sell(1.0))
    }
}

#[tokio::test]
async fn opposing_flow_executes_at_open_with_no_impact() {
    let mut config = common::test_config();
    config.impact_coeff_bps = 500;
    let bars = common::flat_tape(10, 100.0);

    let mut agents = vec![
        AgentSlot {
            agent_id: "BUY".into(),
            policy: Box::new(AlwaysBuy),
        },
        AgentSlot {
            agent_id: "SELL".into(),
            policy: Box::new(AlwaysSell),
        },
    ];
    let outcomes = run_window(&config, &bars, "w0", &mut agents).await;

    for out in &outcomes {
        // 9 clearing steps on a 10-bar window.
        assert_eq!(out.logs.trades.len(), 9);
        for trade in &out.logs.trades {
            assert_eq!(trade.exec_price, 100.0);
            assert_eq!(trade.impact_bps, 0.0);
            assert_eq!(trade.net_qty, 0.0);
        }
    }
}
