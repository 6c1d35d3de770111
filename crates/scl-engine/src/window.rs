use scl_market::{
    apply_funding, apply_trade, equity, liquidate_at_price, maintenance_breached, taker_fee,
    uniform_exec_price, initial_margin_ok, leverage_ok, PricingParams,
};
use scl_policy::Policy;
use scl_schemas::{
    Account, ActionType, ArenaConfig, Bar, EquityLogRecord, EvaluationInput, EvaluationOutput,
    LiquidationLogRecord, MarginParams, PolicyLogRecord, StepStatus, TradeLogRecord,
    WindowMetrics, ERR_OUTPUT_REJECTED, ERR_POLICY_EXCEPTION, EVAL_SCHEMA_VERSION,
};
use tracing::{debug, info};

use crate::metrics_from_curve;

/// One competitor: a stable id plus its policy callable.
pub struct AgentSlot {
    pub agent_id: String,
    pub policy: Box<dyn Policy>,
}

/// Per-(agent, window) log buffers. Drained into the JSONL sinks at window
/// end by the round executor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentLogs {
    pub policy: Vec<PolicyLogRecord>,
    pub trades: Vec<TradeLogRecord>,
    pub equity: Vec<EquityLogRecord>,
    pub liquidations: Vec<LiquidationLogRecord>,
}

/// What one agent took away from one window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowOutcome {
    pub agent_id: String,
    pub metrics: WindowMetrics,
    pub logs: AgentLogs,
    pub final_account: Account,
}

/// Everything the engine tracks per agent while a window runs.
struct AgentState {
    account: Account,
    equity_curve: Vec<f64>,
    exposure_curve: Vec<f64>,
    logs: AgentLogs,
    fees_total: f64,
    liquidation_count: u32,
}

/// The intended outcome of Phase 1, consumed by Phase 2.
struct StepAction {
    action: ActionType,
    order_qty: f64,
    delta: f64,
    status: StepStatus,
    err_code: u32,
    is_liquidation: bool,
}

impl StepAction {
    fn hold_err(err_code: u32) -> Self {
        Self {
            action: ActionType::Hold,
            order_qty: 0.0,
            delta: 0.0,
            status: StepStatus::Err,
            err_code,
            is_liquidation: false,
        }
    }
}

/// Replay one window for all agents.
///
/// Agents are polled in list order, but no agent's Phase 1 output can observe
/// another's, so the outcome is order-independent. Returns one outcome per
/// agent, in agent-list order.
pub async fn run_window(
    config: &ArenaConfig,
    bars: &[Bar],
    window_id: &str,
    agents: &mut [AgentSlot],
) -> Vec<WindowOutcome> {
    let initial_cash = config.initial_quote_balance();
    let pricing = PricingParams {
        slippage_bps: config.slippage_bps,
        impact_coeff_bps: config.impact_coeff_bps,
        impact_cap_bps: config.impact_cap_bps,
        liquidity_multiplier: config.liquidity_multiplier,
        min_liquidity: config.min_liquidity,
    };
    let margin = MarginParams {
        initial_margin_bps: config.initial_margin_bps,
        maintenance_margin_bps: config.maintenance_margin_bps,
        max_leverage_bps: config.max_leverage_bps,
        taker_fee_bps: config.taker_fee_bps,
    };

    let mut states: Vec<AgentState> = agents
        .iter()
        .map(|_| AgentState {
            account: Account::new(initial_cash),
            equity_curve: Vec::with_capacity(bars.len()),
            exposure_curve: Vec::with_capacity(bars.len()),
            logs: AgentLogs::default(),
            fees_total: 0.0,
            liquidation_count: 0,
        })
        .collect();

    for t in 0..bars.len() {
        let close = bars[t].close;

        // --- Phase 1: decide -------------------------------------------------
        let mut step_actions: Vec<StepAction> = Vec::with_capacity(agents.len());
        for (slot, state) in agents.iter_mut().zip(states.iter_mut()) {
            apply_funding(&mut state.account, close, config.funding_rate_bps);

            let lookback_start = (t + 1).saturating_sub(config.lookback_len);
            let input = EvaluationInput {
                version: EVAL_SCHEMA_VERSION,
                window_id: window_id.to_string(),
                step_index: t,
                bars: bars[lookback_start..t + 1].to_vec(),
                account: state.account,
                instrument: config.instrument.clone(),
                margin,
            };

            let mut step = match slot.policy.evaluate(&input).await {
                Ok(output) => normalize_output(&output, state.account.position),
                Err(e) => {
                    debug!(agent = %slot.agent_id, step = t, error = %e, "policy raised");
                    StepAction::hold_err(ERR_POLICY_EXCEPTION)
                }
            };

            let eq = equity(&state.account, close);
            state.equity_curve.push(eq);
            state
                .exposure_curve
                .push(state.account.position.abs() * close);
            state.logs.equity.push(EquityLogRecord {
                window_id: window_id.to_string(),
                step_index: t,
                agent_id: slot.agent_id.clone(),
                equity: eq,
                cash: state.account.cash,
                position: state.account.position,
                mark_price: close,
            });

            // Maintenance breach overrides whatever the policy wanted.
            if maintenance_breached(&state.account, close, config.maintenance_margin_bps) {
                step = StepAction {
                    action: ActionType::Close,
                    order_qty: state.account.position.abs(),
                    delta: -state.account.position,
                    status: StepStatus::Ok,
                    err_code: 0,
                    is_liquidation: true,
                };
            }

            step_actions.push(step);
        }

        // --- Phase 2: clear at the next open ---------------------------------
        if t + 1 < bars.len() {
            let net: f64 = step_actions.iter().map(|s| s.delta).sum();
            let px = uniform_exec_price(bars[t + 1].open, net, bars[t + 1].volume, &pricing);

            for ((slot, state), step) in agents
                .iter()
                .zip(states.iter_mut())
                .zip(step_actions.iter_mut())
            {
                if step.is_liquidation {
                    let (after, fill) = liquidate_at_price(
                        &state.account,
                        px.exec_price,
                        config.liquidation_fee_bps,
                    );
                    state.account = after;
                    state.liquidation_count += 1;
                    state.fees_total += fill.fee;
                    state.logs.liquidations.push(LiquidationLogRecord {
                        window_id: window_id.to_string(),
                        step_index: t,
                        agent_id: slot.agent_id.clone(),
                        liquidated_qty: fill.liquidated_qty,
                        exec_price: fill.exec_price,
                        fee: fill.fee,
                    });
                    continue;
                }
                if step.delta == 0.0 {
                    continue;
                }

                let fee = taker_fee(step.delta, px.exec_price, config.taker_fee_bps);
                let outcome = apply_trade(&state.account, step.delta, px.exec_price, fee);

                let exposure_increases =
                    outcome.account.position.abs() > state.account.position.abs();
                if exposure_increases {
                    let margin_ok = initial_margin_ok(
                        &outcome.account,
                        px.exec_price,
                        config.initial_margin_bps,
                    ) && leverage_ok(
                        &outcome.account,
                        px.exec_price,
                        config.max_leverage_bps,
                    );
                    if !margin_ok {
                        debug!(agent = %slot.agent_id, step = t, delta = step.delta,
                               "trade rejected by margin gates");
                        *step = StepAction::hold_err(ERR_OUTPUT_REJECTED);
                        continue;
                    }
                }

                state.account = outcome.account;
                state.fees_total += fee;
                state.logs.trades.push(TradeLogRecord {
                    window_id: window_id.to_string(),
                    step_index: t,
                    agent_id: slot.agent_id.clone(),
                    delta_qty: step.delta,
                    exec_price: px.exec_price,
                    fee,
                    slippage_bps: px.slippage_bps,
                    impact_bps: px.impact_bps,
                    net_qty: net,
                });
            }
        }

        // One policy record per agent per step, reflecting what actually took
        // effect after any downgrade.
        for (slot, (state, step)) in agents
            .iter()
            .zip(states.iter_mut().zip(step_actions.iter()))
        {
            state.logs.policy.push(PolicyLogRecord {
                window_id: window_id.to_string(),
                step_index: t,
                agent_id: slot.agent_id.clone(),
                action: step.action,
                order_qty: step.order_qty,
                status: step.status,
                err_code: step.err_code,
            });
        }
    }

    let outcomes: Vec<WindowOutcome> = agents
        .iter()
        .zip(states.into_iter())
        .map(|(slot, state)| WindowOutcome {
            agent_id: slot.agent_id.clone(),
            metrics: metrics_from_curve(
                window_id,
                &state.equity_curve,
                &state.exposure_curve,
                state.fees_total,
                state.liquidation_count,
            ),
            logs: state.logs,
            final_account: state.account,
        })
        .collect();

    info!(
        window = window_id,
        steps = bars.len(),
        agents = agents.len(),
        "window replay complete"
    );
    outcomes
}

/// Enforce the output contract; anything off-contract becomes HOLD/ERR 6.
fn normalize_output(output: &EvaluationOutput, position: f64) -> StepAction {
    if output.version != EVAL_SCHEMA_VERSION
        || !output.order_qty.is_finite()
        || output.order_qty < 0.0
    {
        return StepAction::hold_err(ERR_OUTPUT_REJECTED);
    }

    let delta = match output.action_type {
        ActionType::Hold => 0.0,
        ActionType::Buy => {
            if output.order_qty <= 0.0 {
                return StepAction::hold_err(ERR_OUTPUT_REJECTED);
            }
            output.order_qty
        }
        ActionType::Sell => {
            if output.order_qty <= 0.0 {
                return StepAction::hold_err(ERR_OUTPUT_REJECTED);
            }
            -output.order_qty
        }
        ActionType::Close => -position,
    };

    StepAction {
        action: output.action_type,
        order_qty: output.order_qty,
        delta,
        status: StepStatus::Ok,
        err_code: 0,
        is_liquidation: false,
    }
}
