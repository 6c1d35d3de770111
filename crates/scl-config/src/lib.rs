//! scl-config
//!
//! Arena configuration loading and validation:
//! - parse the JSON file into `ArenaConfig`
//! - enforce cross-field invariants up front (fatal on violation)
//! - resolve scoring weights (inline object wins; the reference file is
//!   consulted only when the inline object is absent)
//! - compute a canonical-JSON SHA-256 hash so replays can assert they ran
//!   the same configuration

use std::fs;
use std::path::{Path, PathBuf};

use scl_schemas::{ArenaConfig, ScoringWeights};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config schema invalid: {0}")]
    Schema(String),

    #[error("config invalid: {0}")]
    Invalid(String),

    #[error("scoring weights invalid: {0}")]
    ScoringWeights(String),
}

/// A parsed config plus its canonical form and hash.
#[derive(Clone, Debug)]
pub struct LoadedArenaConfig {
    pub config: ArenaConfig,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Load, validate, and hash an arena config file.
pub fn load_arena_config(path: impl AsRef<Path>) -> Result<LoadedArenaConfig, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ArenaConfig =
        serde_json::from_str(&s).map_err(|e| ConfigError::Schema(e.to_string()))?;
    validate(&config)?;

    let value = serde_json::to_value(&config).map_err(|e| ConfigError::Schema(e.to_string()))?;
    let canonical_json = canonical_json(&value);
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));

    Ok(LoadedArenaConfig {
        config,
        canonical_json,
        config_hash,
    })
}

/// Cross-field invariants. Every violation is fatal.
pub fn validate(cfg: &ArenaConfig) -> Result<(), ConfigError> {
    if cfg.bar_interval_seconds <= 0 {
        return Err(ConfigError::Invalid(format!(
            "bar_interval_seconds must be positive, got {}",
            cfg.bar_interval_seconds
        )));
    }
    if cfg.window_duration_bars == 0 {
        return Err(ConfigError::Invalid(
            "window_duration_bars must be positive".into(),
        ));
    }
    if cfg.maintenance_margin_bps > cfg.initial_margin_bps {
        return Err(ConfigError::Invalid(format!(
            "maintenance_margin_bps {} exceeds initial_margin_bps {}",
            cfg.maintenance_margin_bps, cfg.initial_margin_bps
        )));
    }
    if cfg.lookback_len >= cfg.window_duration_bars {
        return Err(ConfigError::Invalid(format!(
            "lookback_len {} must be shorter than window_duration_bars {}",
            cfg.lookback_len, cfg.window_duration_bars
        )));
    }
    if !cfg
        .initial_balances
        .contains_key(&cfg.instrument.quote_asset)
    {
        return Err(ConfigError::Invalid(format!(
            "initial_balances missing quote asset {}",
            cfg.instrument.quote_asset
        )));
    }
    if cfg.max_leverage_bps < 10_000 {
        return Err(ConfigError::Invalid(format!(
            "max_leverage_bps must be at least 10000 (1x), got {}",
            cfg.max_leverage_bps
        )));
    }
    Ok(())
}

/// Resolve the round's scoring weights.
///
/// The inline object wins. A configured reference is read relative to
/// `base_dir` (the config file's directory) and must parse as
/// `{pnl, drawdown, exposure}`. Neither present falls back to pnl-only.
pub fn resolve_scoring_weights(
    cfg: &ArenaConfig,
    base_dir: &Path,
) -> Result<ScoringWeights, ConfigError> {
    if let Some(w) = cfg.scoring_weights {
        return Ok(w);
    }
    if let Some(reference) = &cfg.scoring_weights_reference {
        let path = base_dir.join(reference);
        let s = fs::read_to_string(&path).map_err(|e| {
            ConfigError::ScoringWeights(format!("{}: {e}", path.display()))
        })?;
        return serde_json::from_str(&s)
            .map_err(|e| ConfigError::ScoringWeights(format!("{}: {e}", path.display())));
    }
    Ok(ScoringWeights {
        pnl: 1.0,
        drawdown: 0.0,
        exposure: 0.0,
    })
}

/// Canonical JSON: object keys sorted recursively, compact encoding.
fn canonical_json(v: &Value) -> String {
    fn sorted(v: &Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut out = serde_json::Map::new();
                for k in keys {
                    out.insert(k.clone(), sorted(&map[k]));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sorted(v)).expect("canonical json serialization cannot fail")
}
