use scl_schemas::WindowMetrics;

/// Derive window metrics from the equity and exposure curves.
///
/// - `pnl` is last-minus-first equity.
/// - `max_drawdown` is the largest drop from a running peak; >= 0 by
///   construction.
/// - `mean_exposure` averages the absolute notional samples.
pub fn metrics_from_curve(
    window_id: &str,
    equity_curve: &[f64],
    exposure_curve: &[f64],
    fees_total: f64,
    liquidation_count: u32,
) -> WindowMetrics {
    let equity_start = equity_curve.first().copied().unwrap_or(0.0);
    let equity_end = equity_curve.last().copied().unwrap_or(0.0);

    let mut peak = f64::MIN;
    let mut trough = f64::MAX;
    let mut max_drawdown = 0.0f64;
    let mut running_peak = f64::MIN;
    for &e in equity_curve {
        peak = peak.max(e);
        trough = trough.min(e);
        running_peak = running_peak.max(e);
        max_drawdown = max_drawdown.max(running_peak - e);
    }
    if equity_curve.is_empty() {
        peak = 0.0;
        trough = 0.0;
    }

    let mean_exposure = if exposure_curve.is_empty() {
        0.0
    } else {
        exposure_curve.iter().sum::<f64>() / exposure_curve.len() as f64
    };

    WindowMetrics {
        window_id: window_id.to_string(),
        pnl: equity_end - equity_start,
        max_drawdown,
        mean_exposure,
        fees_total,
        liquidation_count,
        equity_start,
        equity_end,
        equity_peak: peak,
        equity_trough: trough,
    }
}
