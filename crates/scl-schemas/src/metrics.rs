use serde::{Deserialize, Serialize};

use crate::ScoringWeights;

/// Per-agent outcome of one window, derived from the equity curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub window_id: String,
    /// `equity_end - equity_start`.
    pub pnl: f64,
    /// Largest peak-to-subsequent-trough equity drop; always >= 0.
    pub max_drawdown: f64,
    /// Average absolute notional over the curve.
    pub mean_exposure: f64,
    pub fees_total: f64,
    pub liquidation_count: u32,
    pub equity_start: f64,
    pub equity_end: f64,
    pub equity_peak: f64,
    pub equity_trough: f64,
}

impl WindowMetrics {
    /// Synthesized metrics for a window that never ran (invalidated tape).
    pub fn zeroed(window_id: &str, equity_start: f64) -> Self {
        Self {
            window_id: window_id.to_string(),
            pnl: 0.0,
            max_drawdown: 0.0,
            mean_exposure: 0.0,
            fees_total: 0.0,
            liquidation_count: 0,
            equity_start,
            equity_end: equity_start,
            equity_peak: equity_start,
            equity_trough: equity_start,
        }
    }
}

/// Per-agent aggregate over the round's windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentRoundMetrics {
    pub agent_id: String,
    pub pnl_total: f64,
    pub drawdown_max: f64,
    pub exposure_avg: f64,
    pub score: f64,
    pub weights: ScoringWeights,
    pub windows: Vec<WindowMetrics>,
}

/// One (agent, score) entry. Kept as an ordered list, not a map: insertion
/// order is the winner tie-break and must survive serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    pub agent_id: String,
    pub score: f64,
}

/// `round_meta.json` — the only artifact the tournament loop needs back from
/// a round to keep going.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundMeta {
    pub round_start_ts_ms: i64,
    pub round_end_ts_ms: i64,
    /// None iff the score list is empty.
    pub winner: Option<String>,
    pub scores: Vec<AgentScore>,
    /// Agent id -> reason. Invalid agents score 0 and the round continues.
    #[serde(default)]
    pub invalid_agents: std::collections::BTreeMap<String, String>,
}

impl RoundMeta {
    /// Winner = unique argmax by score; ties go to the earliest entry.
    pub fn derive_winner(scores: &[AgentScore]) -> Option<String> {
        let mut best: Option<&AgentScore> = None;
        for s in scores {
            match best {
                Some(b) if s.score <= b.score => {}
                _ => best = Some(s),
            }
        }
        best.map(|s| s.agent_id.clone())
    }
}

/// Per-window line in `summary.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub window_id: String,
    pub start_bar: usize,
    pub end_bar: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invalid_window_reason: Option<String>,
}

/// `summary.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub arena_id: String,
    pub round_num: u32,
    pub windows: Vec<WindowSummary>,
    pub agents: Vec<String>,
}

/// `round_results.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResults {
    pub arena_id: String,
    pub round_num: u32,
    pub results: Vec<AgentRoundMetrics>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundEntry {
    pub round_num: u32,
    pub meta: RoundMeta,
}

/// `tournament.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    /// The resolved configuration as handed to the run.
    pub config: serde_json::Value,
    /// SHA-256 of the canonical arena config JSON.
    pub config_hash: String,
    pub agents: Vec<String>,
    pub rounds: Vec<RoundEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winner_is_unique_argmax() {
        let scores = vec![
            AgentScore {
                agent_id: "a".into(),
                score: 1.0,
            },
            AgentScore {
                agent_id: "b".into(),
                score: 3.0,
            },
            AgentScore {
                agent_id: "c".into(),
                score: 2.0,
            },
        ];
        assert_eq!(RoundMeta::derive_winner(&scores), Some("b".to_string()));
    }

    #[test]
    fn winner_tie_breaks_to_first_insertion() {
        let scores = vec![
            AgentScore {
                agent_id: "first".into(),
                score: 2.0,
            },
            AgentScore {
                agent_id: "second".into(),
                score: 2.0,
            },
        ];
        assert_eq!(RoundMeta::derive_winner(&scores), Some("first".to_string()));
    }

    #[test]
    fn winner_of_empty_scores_is_none() {
        assert_eq!(RoundMeta::derive_winner(&[]), None);
    }
}
