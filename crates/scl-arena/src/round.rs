use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use scl_artifacts::{write_json_pretty, LogKind, LogSinks};
use scl_engine::{run_window, AgentSlot};
use scl_policy::builtin_policy;
use scl_schemas::{
    AgentRoundMetrics, AgentScore, ArenaConfig, Bar, RoundMeta, RoundResults, RoundSummary,
    ScoringWeights, WindowMetrics, WindowSummary,
};
use scl_windows::{enumerate_windows, select_windows, validate_bars, WindowError};
use tracing::{info, warn};

use crate::ArenaError;

/// Everything a round needs besides its agents.
pub struct RoundContext<'a> {
    pub config: &'a ArenaConfig,
    pub weights: ScoringWeights,
    pub bars: &'a [Bar],
    pub round_num: u32,
    /// The round's artifact directory (`.../rounds/<n>`).
    pub out_dir: &'a Path,
}

/// What the round executor hands back to the tournament loop.
#[derive(Clone, Debug)]
pub struct RoundOutcome {
    pub meta: RoundMeta,
    pub results: RoundResults,
    pub summary: RoundSummary,
}

/// Materialize agent slots for every configured builtin baseline. Unknown
/// names land in the invalid-agents map and the round continues without them.
pub fn baseline_agents(
    config: &ArenaConfig,
    invalid_agents: &mut BTreeMap<String, String>,
) -> Vec<AgentSlot> {
    let mut out = Vec::new();
    for name in &config.builtin_baselines {
        match builtin_policy(name) {
            Some(policy) => out.push(AgentSlot {
                agent_id: name.clone(),
                policy,
            }),
            None => {
                warn!(baseline = %name, "unknown builtin baseline");
                invalid_agents.insert(name.clone(), format!("unknown builtin baseline '{name}'"));
            }
        }
    }
    out
}

/// Run one round: validate, enumerate, sample, replay, aggregate, persist.
///
/// `invalid_agents` carries agents that failed before the round (missing
/// workspace, artifact init failure); they score 0 and are recorded in the
/// round meta.
pub async fn run_round(
    ctx: RoundContext<'_>,
    mut agents: Vec<AgentSlot>,
    invalid_agents: BTreeMap<String, String>,
) -> Result<RoundOutcome, ArenaError> {
    let round_start_ts_ms = Utc::now().timestamp_millis();
    let config = ctx.config;

    // 1. Tape integrity, ordered by bar index.
    let errors = validate_bars(ctx.bars, config.bar_interval_ms());

    // 2. Enumerate; the validity filter gates only the count check, selection
    // still runs over the full candidate list so an invalidated window keeps
    // its identity (and is reported, not silently skipped).
    let all_windows = enumerate_windows(
        ctx.bars.len(),
        config.window_duration_bars,
        config.max_window_overlap_pct,
    );
    if all_windows.is_empty() {
        return Err(WindowError::NoWindows {
            bar_count: ctx.bars.len(),
            duration: config.window_duration_bars,
        }
        .into());
    }
    let valid_count = all_windows
        .iter()
        .filter(|w| w.first_error(&errors).is_none())
        .count();
    if valid_count < config.windows_per_round {
        return Err(WindowError::InsufficientValidWindows {
            valid: valid_count,
            requested: config.windows_per_round,
        }
        .into());
    }

    // 3. Deterministic selection, seeded by the arena id when unconfigured.
    let selected = select_windows(
        &all_windows,
        ctx.bars,
        &config.window_sampling,
        config.windows_per_round,
        config.sampling_seed(),
    );
    info!(
        round = ctx.round_num,
        candidates = all_windows.len(),
        selected = selected.len(),
        "windows selected"
    );

    // 4. Replay each window, streaming logs into the per-agent sinks.
    let mut sinks = LogSinks::new(ctx.out_dir);
    let mut window_summaries: Vec<WindowSummary> = Vec::with_capacity(selected.len());
    let mut per_agent: BTreeMap<String, Vec<WindowMetrics>> = BTreeMap::new();
    let agent_order: Vec<String> = agents.iter().map(|a| a.agent_id.clone()).collect();
    let initial_cash = config.initial_quote_balance();

    for window in &selected {
        if let Some(err) = window.first_error(&errors) {
            warn!(window = %window.id, error = %err, "window invalidated by tape errors");
            for agent_id in &agent_order {
                per_agent
                    .entry(agent_id.clone())
                    .or_default()
                    .push(WindowMetrics::zeroed(&window.id, initial_cash));
            }
            window_summaries.push(WindowSummary {
                window_id: window.id.clone(),
                start_bar: window.start_bar,
                end_bar: window.end_bar,
                invalid_window_reason: Some(err.to_string()),
            });
            continue;
        }

        let slice = &ctx.bars[window.start_bar..window.end_bar];
        let outcomes = run_window(config, slice, &window.id, &mut agents).await;
        for outcome in outcomes {
            for rec in &outcome.logs.policy {
                sinks.append(&outcome.agent_id, LogKind::Policy, rec)?;
            }
            for rec in &outcome.logs.trades {
                sinks.append(&outcome.agent_id, LogKind::Trade, rec)?;
            }
            for rec in &outcome.logs.equity {
                sinks.append(&outcome.agent_id, LogKind::Equity, rec)?;
            }
            for rec in &outcome.logs.liquidations {
                sinks.append(&outcome.agent_id, LogKind::Liquidation, rec)?;
            }
            per_agent
                .entry(outcome.agent_id.clone())
                .or_default()
                .push(outcome.metrics);
        }
        window_summaries.push(WindowSummary {
            window_id: window.id.clone(),
            start_bar: window.start_bar,
            end_bar: window.end_bar,
            invalid_window_reason: None,
        });
    }
    sinks.close_all()?;

    // 5. Aggregate in agent-list order; that order is the score map's
    // insertion order and therefore the winner tie-break.
    let weights = ctx.weights;
    let mut results: Vec<AgentRoundMetrics> = Vec::with_capacity(agent_order.len());
    let mut scores: Vec<AgentScore> = Vec::new();
    for agent_id in &agent_order {
        let windows = per_agent.remove(agent_id).unwrap_or_default();
        let pnl_total: f64 = windows.iter().map(|m| m.pnl).sum();
        let drawdown_max = windows
            .iter()
            .map(|m| m.max_drawdown)
            .fold(0.0f64, f64::max);
        let exposure_avg = if windows.is_empty() {
            0.0
        } else {
            windows.iter().map(|m| m.mean_exposure).sum::<f64>() / windows.len() as f64
        };
        let score =
            weights.pnl * pnl_total + weights.drawdown * drawdown_max + weights.exposure * exposure_avg;

        scores.push(AgentScore {
            agent_id: agent_id.clone(),
            score,
        });
        results.push(AgentRoundMetrics {
            agent_id: agent_id.clone(),
            pnl_total,
            drawdown_max,
            exposure_avg,
            score,
            weights,
            windows,
        });
    }

    // 6. Invalid agents score 0 unless already present.
    for agent_id in invalid_agents.keys() {
        if !scores.iter().any(|s| &s.agent_id == agent_id) {
            scores.push(AgentScore {
                agent_id: agent_id.clone(),
                score: 0.0,
            });
        }
    }

    let winner = RoundMeta::derive_winner(&scores);
    let meta = RoundMeta {
        round_start_ts_ms,
        round_end_ts_ms: Utc::now().timestamp_millis(),
        winner,
        scores,
        invalid_agents,
    };
    let summary = RoundSummary {
        arena_id: config.arena_id.clone(),
        round_num: ctx.round_num,
        windows: window_summaries,
        agents: agent_order,
    };
    let results = RoundResults {
        arena_id: config.arena_id.clone(),
        round_num: ctx.round_num,
        results,
    };

    write_json_pretty(ctx.out_dir.join("summary.json"), &summary)?;
    write_json_pretty(ctx.out_dir.join("round_results.json"), &results)?;
    write_json_pretty(ctx.out_dir.join("round_meta.json"), &meta)?;

    info!(
        round = ctx.round_num,
        winner = meta.winner.as_deref().unwrap_or("-"),
        "round complete"
    );
    Ok(RoundOutcome {
        meta,
        results,
        summary,
    })
}
