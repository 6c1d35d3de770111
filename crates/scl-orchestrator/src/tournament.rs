use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use scl_arena::{baseline_agents, generate_tape, load_tape, run_round, RoundContext};
use scl_config::{load_arena_config, resolve_scoring_weights, LoadedArenaConfig};
use scl_engine::AgentSlot;
use scl_harness::{HarnessClient, HarnessPolicy, ProgramSpec};
use scl_sandbox::copy_recursive;
use scl_schemas::{
    AgentManifest, ArenaConfig, Bar, RoundEntry, RoundMeta, ScoringWeights, TapeSource,
    TournamentRecord,
};

use crate::compete::run_containerized_round;
use crate::config::{AgentSpec, HarnessSettings, RuntimeChoice, TournamentConfig};
use crate::edit::run_edit_phase;

/// Native policy artifact location inside an agent workspace.
const POLICY_ARTIFACT: &str = "build/policy.so";

/// Grace period for the harness to exit after `shutdown`.
const HARNESS_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Run a whole tournament from its config file. Returns the record that was
/// also written to `<output_dir>/tournament.json`.
pub async fn run_tournament(config_path: &Path) -> Result<TournamentRecord> {
    let cfg = TournamentConfig::load(config_path)?;
    let loaded = load_arena_config(&cfg.arena_config)?;
    let weights = resolve_scoring_weights(
        &loaded.config,
        cfg.arena_config.parent().unwrap_or_else(|| Path::new(".")),
    )?;
    let bars = load_bars(&loaded.config, cfg.bars.as_deref())?;

    std::fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("create output dir {}", cfg.output_dir.display()))?;

    let mut rounds: Vec<RoundEntry> = Vec::with_capacity(cfg.rounds as usize);
    for round_num in 1..=cfg.rounds {
        let round_dir = cfg.output_dir.join("rounds").join(round_num.to_string());
        std::fs::create_dir_all(&round_dir)
            .with_context(|| format!("create round dir {}", round_dir.display()))?;

        // Edit phase. Round 1 participation is configuration, not policy.
        if let Some(edit) = &cfg.edit {
            if edit.enabled && (round_num > 1 || edit.edit_round_one) {
                let runtime = cfg.container_runtime()?;
                let logs_root = cfg.output_dir.join("edits").join(round_num.to_string());
                let outcomes =
                    run_edit_phase(round_num, &cfg.agents, edit, &logs_root, &runtime).await?;
                for (agent, outcome) in &outcomes {
                    info!(round = round_num, agent = %agent, status = ?outcome.status, "edit outcome");
                }
            }
        }

        // Competition phase.
        let meta = match cfg.runtime {
            RuntimeChoice::InProcess => {
                run_in_process_round(
                    &loaded, weights, &bars, &cfg.agents, &cfg.harness, round_num, &round_dir,
                )
                .await?
            }
            RuntimeChoice::Container => {
                let image = cfg
                    .arena_image
                    .as_deref()
                    .context("container runtime requires arena_image")?;
                let runtime = cfg.container_runtime()?;
                run_containerized_round(
                    round_num,
                    &loaded.config,
                    &bars,
                    &cfg.agents,
                    image,
                    &runtime,
                    &round_dir,
                )
                .await?
            }
        };

        // Log injection: the next edit session reads these.
        inject_logs(&round_dir, &cfg.agents, round_num)?;

        rounds.push(RoundEntry {
            round_num,
            meta,
        });
    }

    let record = TournamentRecord {
        config: serde_json::to_value(&cfg).context("serialize resolved config")?,
        config_hash: loaded.config_hash.clone(),
        agents: agent_order(&loaded.config, &cfg.agents),
        rounds,
    };
    scl_artifacts::write_json_pretty(cfg.output_dir.join("tournament.json"), &record)?;
    info!(rounds = cfg.rounds, "tournament complete");
    Ok(record)
}

/// Run one round in this process. This is also the inner arena runner used
/// by the containerized competition phase (the CLI `round` subcommand).
pub async fn run_single_round(
    arena_config: &Path,
    bars_path: Option<&Path>,
    manifest_paths: &[PathBuf],
    harness: &HarnessSettings,
    round_num: u32,
    out_dir: &Path,
) -> Result<RoundMeta> {
    let loaded = load_arena_config(arena_config)?;
    let weights = resolve_scoring_weights(
        &loaded.config,
        arena_config.parent().unwrap_or_else(|| Path::new(".")),
    )?;
    let bars = load_bars(&loaded.config, bars_path)?;

    let mut agents: Vec<AgentSpec> = Vec::with_capacity(manifest_paths.len());
    for path in manifest_paths {
        let manifest: AgentManifest = scl_artifacts::read_json(path)?;
        agents.push(AgentSpec {
            id: manifest.id,
            provider: manifest.provider,
            workspace: manifest.workspace.map(PathBuf::from),
            model: manifest.model,
        });
    }

    run_in_process_round(&loaded, weights, &bars, &agents, harness, round_num, out_dir).await
}

async fn run_in_process_round(
    loaded: &LoadedArenaConfig,
    weights: ScoringWeights,
    bars: &[Bar],
    specs: &[AgentSpec],
    harness: &HarnessSettings,
    round_num: u32,
    out_dir: &Path,
) -> Result<RoundMeta> {
    let (agents, invalid, client) = build_agents(&loaded.config, specs, harness).await?;

    let outcome = run_round(
        RoundContext {
            config: &loaded.config,
            weights,
            bars,
            round_num,
            out_dir,
        },
        agents,
        invalid,
    )
    .await?;

    if let Some(client) = client {
        if let Err(e) = client.shutdown(HARNESS_SHUTDOWN_GRACE).await {
            warn!(error = %e, "harness shutdown failed");
        }
    }
    Ok(outcome.meta)
}

/// Baselines come from the arena config; manifest agents evaluate through
/// the native policy runner. Agents that cannot be initialized land in the
/// invalid map with a reason and score 0; a harness that dies during init
/// fails the round.
async fn build_agents(
    config: &ArenaConfig,
    specs: &[AgentSpec],
    harness: &HarnessSettings,
) -> Result<(
    Vec<AgentSlot>,
    BTreeMap<String, String>,
    Option<Arc<HarnessClient>>,
)> {
    let mut invalid: BTreeMap<String, String> = BTreeMap::new();
    let mut agents = baseline_agents(config, &mut invalid);

    let mut programs: Vec<ProgramSpec> = Vec::new();
    for spec in specs {
        if spec.provider.is_builtin() {
            continue;
        }
        let Some(workspace) = &spec.workspace else {
            invalid.insert(spec.id.clone(), "workspace not configured".into());
            continue;
        };
        if !workspace.is_dir() {
            invalid.insert(
                spec.id.clone(),
                format!("workspace invalid: {}", workspace.display()),
            );
            continue;
        }
        let artifact = workspace.join(POLICY_ARTIFACT);
        if !artifact.is_file() {
            invalid.insert(
                spec.id.clone(),
                format!("policy artifact missing: {}", artifact.display()),
            );
            continue;
        }
        programs.push(ProgramSpec {
            id: spec.id.clone(),
            so_path: artifact,
        });
    }

    if programs.is_empty() {
        return Ok((agents, invalid, None));
    }
    let Some(cmd) = &harness.cmd else {
        for p in &programs {
            invalid.insert(p.id.clone(), "native policy runner not configured".into());
        }
        return Ok((agents, invalid, None));
    };

    let client = Arc::new(HarnessClient::spawn(cmd, &harness.args)?);
    client
        .init(&programs, harness.compute_unit_limit)
        .await
        .context("harness init")?;
    for p in &programs {
        agents.push(AgentSlot {
            agent_id: p.id.clone(),
            policy: Box::new(HarnessPolicy::new(Arc::clone(&client), &p.id)),
        });
    }
    Ok((agents, invalid, Some(client)))
}

/// Copy the round's artifact tree into every agent workspace as
/// `logs/rounds/<n>`, so the next edit session can read it.
fn inject_logs(round_dir: &Path, agents: &[AgentSpec], round_num: u32) -> Result<()> {
    let src = PathBuf::from(format!("{}/.", round_dir.display()));
    for agent in agents {
        let Some(workspace) = &agent.workspace else {
            continue;
        };
        if agent.provider.is_builtin() || !workspace.is_dir() {
            continue;
        }
        let dst = workspace.join("logs/rounds").join(round_num.to_string());
        copy_recursive(&src, &dst)
            .with_context(|| format!("inject logs into {}", dst.display()))?;
        info!(agent = %agent.id, dst = %dst.display(), "round logs injected");
    }
    Ok(())
}

fn agent_order(config: &ArenaConfig, specs: &[AgentSpec]) -> Vec<String> {
    let mut out: Vec<String> = config.builtin_baselines.clone();
    out.extend(
        specs
            .iter()
            .filter(|s| !s.provider.is_builtin())
            .map(|s| s.id.clone()),
    );
    out
}

fn load_bars(config: &ArenaConfig, bars_path: Option<&Path>) -> Result<Vec<Bar>> {
    if let Some(path) = bars_path {
        let tape = load_tape(path)?;
        return Ok(tape.bars);
    }
    match &config.tape_source {
        Some(TapeSource::Synthetic {
            generator_id,
            seed,
            params,
        }) => Ok(generate_tape(
            generator_id,
            *seed,
            params,
            &config.instrument,
            config.bar_interval_ms(),
        )?),
        Some(TapeSource::Historical { path, .. }) => {
            let path = path
                .as_ref()
                .context("historical tape source carries no path and no bars file was given")?;
            Ok(load_tape(Path::new(path))?.bars)
        }
        None => anyhow::bail!("no bars file given and config has no tape_source"),
    }
}
