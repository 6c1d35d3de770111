//! scl-market
//!
//! Numeric primitives for the simulation engine:
//! - uniform execution pricing with transient impact
//! - taker fees
//! - trade application (weighted-average entry accounting)
//! - equity, margin checks, forced liquidation, funding
//!
//! All functions are pure. Basis-point inputs are integers; arithmetic is
//! done in double precision. Nothing here rounds; rounding happens only at
//! JSON boundaries.

use scl_schemas::{Account, BPS_DENOM};

/// Pricing knobs lifted from the arena config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingParams {
    pub slippage_bps: i64,
    pub impact_coeff_bps: i64,
    pub impact_cap_bps: Option<i64>,
    pub liquidity_multiplier: f64,
    pub min_liquidity: f64,
}

/// The single price every participant pays this step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExecPrice {
    pub exec_price: f64,
    pub slippage_bps: f64,
    pub impact_bps: f64,
}

/// Uniform execution price at the next bar's open.
///
/// Impact is transient: it prices this step's fills and is never written back
/// to the tape. Zero net flow executes exactly at the open.
pub fn uniform_exec_price(open: f64, net_flow: f64, bar_volume: f64, p: &PricingParams) -> ExecPrice {
    if net_flow == 0.0 {
        return ExecPrice {
            exec_price: open,
            slippage_bps: 0.0,
            impact_bps: 0.0,
        };
    }

    let liquidity = (bar_volume * p.liquidity_multiplier).max(p.min_liquidity);
    let flow_ratio = net_flow.abs() / liquidity;
    let raw_impact = p.impact_coeff_bps as f64 * flow_ratio;
    let impact_bps = match p.impact_cap_bps {
        Some(cap) => raw_impact.min(cap as f64),
        None => raw_impact,
    };
    let slippage_bps = p.slippage_bps as f64;

    let adj = net_flow.signum() * (slippage_bps + impact_bps) / BPS_DENOM;
    ExecPrice {
        exec_price: open * (1.0 + adj),
        slippage_bps,
        impact_bps,
    }
}

/// `|delta| * price * fee_bps / 10_000`.
pub fn taker_fee(delta_qty: f64, exec_price: f64, taker_fee_bps: i64) -> f64 {
    delta_qty.abs() * exec_price * taker_fee_bps as f64 / BPS_DENOM
}

/// Result of applying a signed trade to an account.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TradeOutcome {
    pub account: Account,
    pub realized_pnl: f64,
}

/// Apply a signed quantity delta at `exec_price`, paying `fee`.
///
/// Same-direction trades re-weight the average entry; opposing trades realize
/// PnL on the closed quantity. Cash moves by `realized - fee` only — opening
/// notional is margined, not spent.
pub fn apply_trade(account: &Account, delta_qty: f64, exec_price: f64, fee: f64) -> TradeOutcome {
    if delta_qty == 0.0 {
        return TradeOutcome {
            account: *account,
            realized_pnl: 0.0,
        };
    }

    let pos = account.position;
    let same_direction = pos == 0.0 || pos.signum() == delta_qty.signum();

    let (new_position, new_avg, realized) = if same_direction {
        let new_position = pos + delta_qty;
        let new_avg = (pos.abs() * account.avg_entry_price + delta_qty.abs() * exec_price)
            / (pos.abs() + delta_qty.abs());
        (new_position, new_avg, 0.0)
    } else {
        let closed = pos.abs().min(delta_qty.abs());
        let realized = closed * (exec_price - account.avg_entry_price) * pos.signum();
        let new_position = pos + delta_qty;
        let new_avg = if delta_qty.abs() < pos.abs() {
            // Partial close keeps the entry.
            account.avg_entry_price
        } else if delta_qty.abs() == pos.abs() {
            0.0
        } else {
            // Flip: the remainder opened at this fill.
            exec_price
        };
        (new_position, new_avg, realized)
    };

    TradeOutcome {
        account: Account {
            cash: account.cash + realized - fee,
            position: new_position,
            avg_entry_price: new_avg,
        },
        realized_pnl: realized,
    }
}

/// `equity = cash + position * mark`.
pub fn equity(account: &Account, mark: f64) -> f64 {
    account.cash + account.position * mark
}

/// Maintenance check: liquidate when a held position's equity falls below
/// `notional * maintenance_bps / 10_000`.
pub fn maintenance_breached(account: &Account, mark: f64, maintenance_margin_bps: i64) -> bool {
    if account.position == 0.0 {
        return false;
    }
    let notional = account.position.abs() * mark;
    equity(account, mark) < notional * maintenance_margin_bps as f64 / BPS_DENOM
}

/// Pre-trade gate for exposure-increasing trades.
pub fn initial_margin_ok(account: &Account, mark: f64, initial_margin_bps: i64) -> bool {
    let notional = account.position.abs() * mark;
    if notional == 0.0 {
        return true;
    }
    equity(account, mark) >= notional * initial_margin_bps as f64 / BPS_DENOM
}

/// Pre-trade gate: notional may not exceed `equity * max_lev_bps / 10_000`.
pub fn leverage_ok(account: &Account, mark: f64, max_leverage_bps: i64) -> bool {
    let notional = account.position.abs() * mark;
    if notional == 0.0 {
        return true;
    }
    let eq = equity(account, mark);
    eq > 0.0 && notional <= eq * max_leverage_bps as f64 / BPS_DENOM
}

/// A forced full close.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiquidationFill {
    pub liquidated_qty: f64,
    pub exec_price: f64,
    pub fee: f64,
}

/// Force-close the entire position at `price`, charging the liquidation fee
/// on the closed notional.
pub fn liquidate_at_price(
    account: &Account,
    price: f64,
    liquidation_fee_bps: i64,
) -> (Account, LiquidationFill) {
    let qty = account.position;
    let notional = qty.abs() * price;
    let realized = qty.abs() * (price - account.avg_entry_price) * qty.signum();
    let fee = notional * liquidation_fee_bps as f64 / BPS_DENOM;

    let after = Account {
        cash: account.cash + realized - fee,
        position: 0.0,
        avg_entry_price: 0.0,
    };
    let fill = LiquidationFill {
        liquidated_qty: qty,
        exec_price: price,
        fee,
    };
    (after, fill)
}

/// Funding transfer at the mark. Longs pay on a positive rate.
pub fn apply_funding(account: &mut Account, mark: f64, funding_rate_bps: i64) {
    if funding_rate_bps == 0 || account.position == 0.0 {
        return;
    }
    account.cash -= account.position * mark * funding_rate_bps as f64 / BPS_DENOM;
}
