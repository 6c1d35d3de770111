use scl_schemas::Bar;

/// One integrity violation, addressed by bar index and field.
///
/// Errors are emitted in (bar_index, check) order so the first error inside a
/// window is stable across runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarValidationError {
    pub bar_index: usize,
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for BarValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bar {} {}: {}", self.bar_index, self.field, self.message)
    }
}

/// Validate the whole tape. Returns every violation, ordered by bar index.
///
/// Checks per bar: positive OHLC, non-negative volume, `low <= open,close <= high`,
/// and contiguity against the previous bar (`start = prev.start + interval_ms`).
pub fn validate_bars(bars: &[Bar], interval_ms: i64) -> Vec<BarValidationError> {
    let mut errors = Vec::new();

    for (i, bar) in bars.iter().enumerate() {
        for (field, value) in [
            ("open", bar.open),
            ("high", bar.high),
            ("low", bar.low),
            ("close", bar.close),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                errors.push(BarValidationError {
                    bar_index: i,
                    field,
                    message: format!("price must be positive and finite, got {value}"),
                });
            }
        }

        if !(bar.volume >= 0.0) || !bar.volume.is_finite() {
            errors.push(BarValidationError {
                bar_index: i,
                field: "volume",
                message: format!("volume must be non-negative, got {}", bar.volume),
            });
        }

        if bar.low > bar.open || bar.low > bar.close || bar.open > bar.high || bar.close > bar.high
        {
            errors.push(BarValidationError {
                bar_index: i,
                field: "ohlc",
                message: format!(
                    "expected low <= open,close <= high, got o={} h={} l={} c={}",
                    bar.open, bar.high, bar.low, bar.close
                ),
            });
        }

        if i >= 1 {
            let expected = bars[i - 1].bar_start_ts_ms + interval_ms;
            if bar.bar_start_ts_ms != expected {
                errors.push(BarValidationError {
                    bar_index: i,
                    field: "bar_start_ts_ms",
                    message: format!(
                        "gap in tape: expected start {expected}, got {}",
                        bar.bar_start_ts_ms
                    ),
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(start: i64, o: f64, h: f64, l: f64, c: f64, v: f64) -> Bar {
        Bar {
            symbol: "SOL-PERP".into(),
            bar_start_ts_ms: start,
            bar_end_ts_ms: start + 60_000,
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        }
    }

    #[test]
    fn clean_tape_validates() {
        let bars = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5, 10.0),
            bar(60_000, 100.5, 102.0, 100.0, 101.0, 12.0),
        ];
        assert!(validate_bars(&bars, 60_000).is_empty());
    }

    #[test]
    fn gap_is_reported_on_the_later_bar() {
        let bars = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5, 10.0),
            bar(120_000, 100.5, 102.0, 100.0, 101.0, 12.0),
        ];
        let errs = validate_bars(&bars, 60_000);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].bar_index, 1);
        assert_eq!(errs[0].field, "bar_start_ts_ms");
    }

    #[test]
    fn non_positive_price_and_bad_range_both_reported() {
        let bars = vec![bar(0, 0.0, 101.0, 99.0, 100.5, 10.0)];
        let errs = validate_bars(&bars, 60_000);
        // open <= 0 and open < low
        assert_eq!(errs.len(), 2);
        assert_eq!(errs[0].field, "open");
        assert_eq!(errs[1].field, "ohlc");
    }

    #[test]
    fn negative_volume_rejected() {
        let bars = vec![bar(0, 100.0, 101.0, 99.0, 100.5, -1.0)];
        let errs = validate_bars(&bars, 60_000);
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field, "volume");
    }

    #[test]
    fn errors_are_ordered_by_bar_index() {
        let bars = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5, -1.0),
            bar(90_000, 100.0, 99.0, 99.0, 100.0, 1.0),
        ];
        let errs = validate_bars(&bars, 60_000);
        assert!(errs.windows(2).all(|w| w[0].bar_index <= w[1].bar_index));
    }
}
