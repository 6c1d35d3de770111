use async_trait::async_trait;

use scl_schemas::{EvaluationInput, EvaluationOutput};

use crate::{Policy, PolicyError};

/// Baseline order size, in base units.
const BASELINE_QTY: f64 = 1.0;

/// Materialize a builtin baseline by its configured name.
pub fn builtin_policy(name: &str) -> Option<Box<dyn Policy>> {
    match name {
        "FLAT" => Some(Box::new(FlatPolicy)),
        "BUY_AND_HOLD" => Some(Box::new(BuyAndHoldPolicy)),
        "MOMENTUM" => Some(Box::new(MomentumPolicy)),
        _ => None,
    }
}

/// Never trades. The zero reference for scoring.
pub struct FlatPolicy;

#[async_trait]
impl Policy for FlatPolicy {
    async fn evaluate(&mut self, _input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        Ok(EvaluationOutput::hold())
    }
}

/// Buys one unit when flat, then holds. Stateless: the account snapshot says
/// whether the entry already happened, so re-use across windows is safe.
pub struct BuyAndHoldPolicy;

#[async_trait]
impl Policy for BuyAndHoldPolicy {
    async fn evaluate(&mut self, input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        if input.account.is_flat() {
            Ok(EvaluationOutput::buy(BASELINE_QTY))
        } else {
            Ok(EvaluationOutput::hold())
        }
    }
}

/// Follows the lookback's close-to-close drift: long on a positive return,
/// flat on a negative one.
pub struct MomentumPolicy;

#[async_trait]
impl Policy for MomentumPolicy {
    async fn evaluate(&mut self, input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        let bars = &input.bars;
        if bars.len() < 2 {
            return Ok(EvaluationOutput::hold());
        }
        let first = bars[0].close;
        let last = bars[bars.len() - 1].close;
        let ret = (last - first) / first;

        let pos = input.account.position;
        if ret > 0.0 && pos <= 0.0 {
            Ok(EvaluationOutput::buy(BASELINE_QTY))
        } else if ret < 0.0 && pos > 0.0 {
            Ok(EvaluationOutput::close())
        } else {
            Ok(EvaluationOutput::hold())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scl_schemas::{Account, ActionType, Bar, Instrument, MarginParams};

    fn input_with_closes(closes: &[f64], position: f64) -> EvaluationInput {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                symbol: "SOL-PERP".into(),
                bar_start_ts_ms: i as i64 * 60_000,
                bar_end_ts_ms: (i as i64 + 1) * 60_000,
                open: c,
                high: c,
                low: c,
                close: c,
                volume: 1.0,
            })
            .collect();
        EvaluationInput {
            version: scl_schemas::EVAL_SCHEMA_VERSION,
            window_id: "w0".into(),
            step_index: closes.len() - 1,
            bars,
            account: Account {
                cash: 10_000.0,
                position,
                avg_entry_price: if position == 0.0 { 0.0 } else { 100.0 },
            },
            instrument: Instrument {
                symbol: "SOL-PERP".into(),
                base_asset: "SOL".into(),
                quote_asset: "USDC".into(),
                price_scale: 6,
                volume_scale: 9,
            },
            margin: MarginParams {
                initial_margin_bps: 1_000,
                maintenance_margin_bps: 500,
                max_leverage_bps: 100_000,
                taker_fee_bps: 0,
            },
        }
    }

    #[tokio::test]
    async fn flat_always_holds() {
        let out = FlatPolicy
            .evaluate(&input_with_closes(&[100.0, 101.0], 0.0))
            .await
            .unwrap();
        assert_eq!(out.action_type, ActionType::Hold);
    }

    #[tokio::test]
    async fn buy_and_hold_enters_once() {
        let mut p = BuyAndHoldPolicy;
        let out = p.evaluate(&input_with_closes(&[100.0], 0.0)).await.unwrap();
        assert_eq!(out.action_type, ActionType::Buy);
        assert_eq!(out.order_qty, 1.0);

        let out = p.evaluate(&input_with_closes(&[100.0], 1.0)).await.unwrap();
        assert_eq!(out.action_type, ActionType::Hold);
    }

    #[tokio::test]
    async fn momentum_longs_rising_tape_and_exits_falling() {
        let mut p = MomentumPolicy;
        let out = p
            .evaluate(&input_with_closes(&[100.0, 102.0], 0.0))
            .await
            .unwrap();
        assert_eq!(out.action_type, ActionType::Buy);

        let out = p
            .evaluate(&input_with_closes(&[102.0, 100.0], 1.0))
            .await
            .unwrap();
        assert_eq!(out.action_type, ActionType::Close);

        let out = p
            .evaluate(&input_with_closes(&[100.0], 0.0))
            .await
            .unwrap();
        assert_eq!(out.action_type, ActionType::Hold);
    }

    #[test]
    fn unknown_baseline_name_is_none() {
        assert!(builtin_policy("NOPE").is_none());
        assert!(builtin_policy("FLAT").is_some());
        assert!(builtin_policy("BUY_AND_HOLD").is_some());
        assert!(builtin_policy("MOMENTUM").is_some());
    }
}
