use std::fs;
use std::path::{Path, PathBuf};

use scl_schemas::{Bar, Instrument};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TapeError {
    #[error("tape missing: {path}")]
    Missing { path: PathBuf },

    #[error("tape schema invalid: {path}: {message}")]
    Schema { path: PathBuf, message: String },
}

/// A loaded bar file: the bars plus the optional instrument header.
#[derive(Clone, Debug, PartialEq)]
pub struct Tape {
    pub instrument: Option<Instrument>,
    pub bars: Vec<Bar>,
}

/// Load a `*.json` or `*.jsonl` bar file.
///
/// JSON form: a bare array of bars, or `{"instrument": ..., "bars": [...]}`.
/// JSONL form: one bar per line, optionally preceded by an
/// `{"instrument": {...}}` header line.
pub fn load_tape(path: impl AsRef<Path>) -> Result<Tape, TapeError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|_| TapeError::Missing {
        path: path.to_path_buf(),
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
        parse_jsonl(path, &s)
    } else {
        parse_json(path, &s)
    }
}

fn schema_err(path: &Path, message: impl Into<String>) -> TapeError {
    TapeError::Schema {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn parse_json(path: &Path, s: &str) -> Result<Tape, TapeError> {
    let value: Value =
        serde_json::from_str(s).map_err(|e| schema_err(path, e.to_string()))?;

    match value {
        Value::Array(_) => {
            let bars: Vec<Bar> = serde_json::from_value(value)
                .map_err(|e| schema_err(path, e.to_string()))?;
            Ok(Tape {
                instrument: None,
                bars,
            })
        }
        Value::Object(mut map) => {
            let instrument = match map.remove("instrument") {
                Some(v) => Some(
                    serde_json::from_value(v)
                        .map_err(|e| schema_err(path, format!("instrument: {e}")))?,
                ),
                None => None,
            };
            let bars_value = map
                .remove("bars")
                .ok_or_else(|| schema_err(path, "object form requires a 'bars' array"))?;
            let bars: Vec<Bar> = serde_json::from_value(bars_value)
                .map_err(|e| schema_err(path, e.to_string()))?;
            Ok(Tape { instrument, bars })
        }
        _ => Err(schema_err(path, "expected an array of bars or an object")),
    }
}

fn parse_jsonl(path: &Path, s: &str) -> Result<Tape, TapeError> {
    let mut instrument = None;
    let mut bars = Vec::new();

    for (i, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .map_err(|e| schema_err(path, format!("line {}: {e}", i + 1)))?;

        // Header line: an object carrying only the instrument.
        if i == 0 {
            if let Value::Object(map) = &value {
                if map.contains_key("instrument") {
                    instrument = Some(
                        serde_json::from_value(map["instrument"].clone())
                            .map_err(|e| schema_err(path, format!("instrument: {e}")))?,
                    );
                    continue;
                }
            }
        }

        let bar: Bar = serde_json::from_value(value)
            .map_err(|e| schema_err(path, format!("line {}: {e}", i + 1)))?;
        bars.push(bar);
    }

    Ok(Tape { instrument, bars })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_json(start: i64, price: f64) -> String {
        format!(
            r#"{{"symbol":"SOL-PERP","bar_start_ts_ms":{start},"bar_end_ts_ms":{},"open":{price},"high":{price},"low":{price},"close":{price},"volume":10.0}}"#,
            start + 60_000
        )
    }

    #[test]
    fn bare_array_form_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.json");
        std::fs::write(&path, format!("[{},{}]", bar_json(0, 100.0), bar_json(60_000, 101.0)))
            .unwrap();

        let tape = load_tape(&path).unwrap();
        assert_eq!(tape.bars.len(), 2);
        assert!(tape.instrument.is_none());
    }

    #[test]
    fn object_form_carries_instrument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.json");
        std::fs::write(
            &path,
            format!(
                r#"{{"instrument":{{"symbol":"SOL-PERP","base_asset":"SOL","quote_asset":"USDC","price_scale":6,"volume_scale":9}},"bars":[{}]}}"#,
                bar_json(0, 100.0)
            ),
        )
        .unwrap();

        let tape = load_tape(&path).unwrap();
        assert_eq!(tape.bars.len(), 1);
        assert_eq!(tape.instrument.unwrap().quote_asset, "USDC");
    }

    #[test]
    fn jsonl_form_with_header_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.jsonl");
        let content = format!(
            "{}\n{}\n{}\n",
            r#"{"instrument":{"symbol":"SOL-PERP","base_asset":"SOL","quote_asset":"USDC","price_scale":6,"volume_scale":9}}"#,
            bar_json(0, 100.0),
            bar_json(60_000, 101.0),
        );
        std::fs::write(&path, content).unwrap();

        let tape = load_tape(&path).unwrap();
        assert_eq!(tape.bars.len(), 2);
        assert!(tape.instrument.is_some());
    }

    #[test]
    fn jsonl_form_without_header_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.jsonl");
        std::fs::write(&path, format!("{}\n", bar_json(0, 100.0))).unwrap();

        let tape = load_tape(&path).unwrap();
        assert_eq!(tape.bars.len(), 1);
        assert!(tape.instrument.is_none());
    }

    #[test]
    fn missing_file_is_tape_missing() {
        assert!(matches!(
            load_tape("/nonexistent/bars.json"),
            Err(TapeError::Missing { .. })
        ));
    }

    #[test]
    fn malformed_bar_is_schema_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.json");
        std::fs::write(&path, r#"[{"symbol": "SOL-PERP"}]"#).unwrap();
        assert!(matches!(
            load_tape(&path),
            Err(TapeError::Schema { .. })
        ));
    }
}
