use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use scl_sandbox::{ContainerRuntime, ContainerSpec};
use scl_schemas::{AgentManifest, ArenaConfig, Bar, RoundMeta};

use crate::config::AgentSpec;
use crate::OrchestratorError;

const AGENTS_ROOT: &str = "/opt/solclash/agents";

/// Run one round inside an arena container: ship config, bars and agent
/// workspaces in, exec the inner runner, ship the round's log tree back.
///
/// The container and the staging directory are removed on every path.
pub async fn run_containerized_round(
    round: u32,
    config: &ArenaConfig,
    bars: &[Bar],
    agents: &[AgentSpec],
    arena_image: &str,
    runtime: &ContainerRuntime,
    host_round_dir: &Path,
) -> Result<RoundMeta> {
    let staging = tempfile::tempdir().context("create round staging dir")?;
    let handle = runtime
        .create(&ContainerSpec {
            image: arena_image.to_string(),
            workdir: "/".into(),
            env: vec![("SOLCLASH_ROUND".into(), round.to_string())],
            mounts: vec![],
        })
        .await
        .context("create arena container")?;

    let result = drive_round(
        round,
        config,
        bars,
        agents,
        runtime,
        &handle,
        staging.path(),
        host_round_dir,
    )
    .await;

    if let Err(e) = runtime.remove(&handle).await {
        warn!(error = %e, "arena container cleanup failed");
    }
    result
}

#[allow(clippy::too_many_arguments)]
async fn drive_round(
    round: u32,
    config: &ArenaConfig,
    bars: &[Bar],
    agents: &[AgentSpec],
    runtime: &ContainerRuntime,
    handle: &scl_sandbox::ContainerHandle,
    staging: &Path,
    host_round_dir: &Path,
) -> Result<RoundMeta> {
    let logs_dir = format!("/logs/rounds/{round}");

    // Materialize the round's inputs on the host first.
    let config_path = staging.join("arena-config.json");
    scl_artifacts::write_json_pretty(&config_path, config)?;
    let bars_path = staging.join("bars.json");
    scl_artifacts::write_json_pretty(&bars_path, &bars.to_vec())?;

    let mkdir = runtime
        .exec(
            handle,
            &[
                "mkdir".into(),
                "-p".into(),
                "/inputs".into(),
                logs_dir.clone(),
                AGENTS_ROOT.into(),
            ],
            None,
            &[],
        )
        .await
        .context("prepare container directories")?;
    if !mkdir.success() {
        anyhow::bail!("mkdir in arena container failed: {}", mkdir.stderr);
    }

    runtime
        .copy_to(handle, &config_path, "/inputs/arena-config.json")
        .await
        .context("copy arena config into container")?;
    runtime
        .copy_to(handle, &bars_path, "/inputs/bars.json")
        .await
        .context("copy bars into container")?;

    // Agent workspaces + manifests.
    let mut manifest_paths: Vec<String> = Vec::new();
    for agent in agents {
        if agent.provider.is_builtin() {
            continue;
        }
        let workspace = agent
            .workspace
            .as_ref()
            .with_context(|| format!("agent '{}' has no workspace", agent.id))?;
        let container_workspace = format!("{AGENTS_ROOT}/{}", agent.id);
        let workspace_dot = PathBuf::from(format!("{}/.", workspace.display()));
        runtime
            .copy_to(handle, &workspace_dot, &container_workspace)
            .await
            .with_context(|| format!("copy workspace for agent '{}'", agent.id))?;

        let manifest = AgentManifest {
            id: agent.id.clone(),
            arena_id: config.arena_id.clone(),
            provider: agent.provider,
            workspace: Some(container_workspace),
            model: agent.model.clone(),
        };
        let staged = staging.join(format!("agent-{}.json", agent.id));
        scl_artifacts::write_json_pretty(&staged, &manifest)?;
        let container_manifest = format!("/inputs/agent-{}.json", agent.id);
        runtime
            .copy_to(handle, &staged, &container_manifest)
            .await
            .with_context(|| format!("copy manifest for agent '{}'", agent.id))?;
        manifest_paths.push(container_manifest);
    }

    // The inner runner is this same binary's `round` subcommand.
    let mut argv: Vec<String> = vec![
        "solclash".into(),
        "round".into(),
        "--config".into(),
        "/inputs/arena-config.json".into(),
        "--bars".into(),
        "/inputs/bars.json".into(),
        "--out".into(),
        logs_dir.clone(),
        "--round".into(),
        round.to_string(),
    ];
    for m in &manifest_paths {
        argv.push("--manifest".into());
        argv.push(m.clone());
    }

    let run = runtime
        .exec(handle, &argv, None, &[])
        .await
        .context("exec arena runner")?;
    if !run.success() {
        return Err(OrchestratorError::ArenaRunFailed {
            exit_code: run.exit_code,
            stderr: run.stderr,
        }
        .into());
    }

    // Ship the round's artifact tree back and read the meta out of it.
    runtime
        .copy_from(handle, &format!("{logs_dir}/."), host_round_dir)
        .await
        .context("copy round logs back to host")?;
    let meta: RoundMeta = scl_artifacts::read_json(host_round_dir.join("round_meta.json"))?;

    info!(
        round,
        winner = meta.winner.as_deref().unwrap_or("-"),
        "containerized round complete"
    );
    Ok(meta)
}
