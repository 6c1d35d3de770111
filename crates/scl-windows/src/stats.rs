use scl_schemas::Bar;

/// Per-window statistics driving stress selection and bucket assignment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowStats {
    /// Stdev of simple close-to-close returns.
    pub volatility: f64,
    /// `(last_close - first_close) / first_close`.
    pub trend: f64,
    /// Mean bar volume.
    pub mean_volume: f64,
}

/// Compute the three sampling axes for one window's bar slice.
pub fn window_stats(bars: &[Bar]) -> WindowStats {
    if bars.is_empty() {
        return WindowStats {
            volatility: 0.0,
            trend: 0.0,
            mean_volume: 0.0,
        };
    }

    let returns: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    let volatility = stdev(&returns);

    let first = bars[0].close;
    let last = bars[bars.len() - 1].close;
    let trend = (last - first) / first;

    let mean_volume = bars.iter().map(|b| b.volume).sum::<f64>() / bars.len() as f64;

    WindowStats {
        volatility,
        trend,
        mean_volume,
    }
}

fn stdev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    var.sqrt()
}
