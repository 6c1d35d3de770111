use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use scl_sandbox::{ContainerHandle, ContainerRuntime, ContainerSpec};

use crate::config::{AgentSpec, EditSettings, NetworkPolicy};
use crate::prompt::{resolve_prompt, ResolvedPrompt};

const WORKSPACE_DIR: &str = "/workspace";
const LOGS_DIR: &str = "/logs";

/// Exit code the runner uses to signal a timed-out session.
const EXIT_TIMEOUT: i32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStatus {
    Success,
    Timeout,
    Failure,
}

/// `edit_meta.json`, written by the runner inside the container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditMeta {
    pub agent_id: String,
    pub status: EditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub prompt_ref: String,
    pub prompt_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_path: Option<String>,
}

/// What the edit phase reports per agent.
#[derive(Clone, Debug)]
pub struct EditOutcome {
    pub status: EditStatus,
    pub session_id: Option<String>,
    pub checkpoint_id: Option<String>,
    pub error: Option<String>,
    pub log_dir: PathBuf,
}

/// The JSON brief handed to the runner via `--input`.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct EditBrief {
    round: u32,
    agent_id: String,
    workspace_path: String,
    system_prompt: String,
    max_turns: u32,
    tool_allowlist: Vec<String>,
    sandbox_enabled: bool,
    network_policy: NetworkPolicy,
    settings_sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    prompt_ref: String,
    prompt_sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt_path: Option<String>,
}

/// Run edit sessions for every non-builtin agent through a bounded worker
/// pool. A session timing out or failing affects only that agent; its
/// workspace is left untouched.
pub async fn run_edit_phase(
    round: u32,
    agents: &[AgentSpec],
    settings: &EditSettings,
    logs_root: &Path,
    runtime: &ContainerRuntime,
) -> Result<BTreeMap<String, EditOutcome>> {
    let semaphore = Arc::new(Semaphore::new(settings.concurrency));
    let mut tasks: JoinSet<(String, EditOutcome)> = JoinSet::new();

    for agent in agents {
        if agent.provider.is_builtin() {
            continue;
        }
        let Some(workspace) = agent.workspace.clone() else {
            continue;
        };

        let agent_id = agent.id.clone();
        let model = agent.model.clone().or_else(|| settings.model.clone());
        let settings = settings.clone();
        let runtime = runtime.clone();
        let log_dir = logs_root.join(&agent_id);
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore open");
            let outcome =
                run_edit_session(round, &agent_id, &workspace, model, &settings, &log_dir, &runtime)
                    .await
                    .unwrap_or_else(|e| EditOutcome {
                        status: EditStatus::Failure,
                        session_id: None,
                        checkpoint_id: None,
                        error: Some(e.to_string()),
                        log_dir: log_dir.clone(),
                    });
            (agent_id, outcome)
        });
    }

    let mut outcomes = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (agent_id, outcome) = joined.context("edit session task panicked")?;
        info!(agent = %agent_id, status = ?outcome.status, "edit session finished");
        outcomes.insert(agent_id, outcome);
    }
    Ok(outcomes)
}

async fn run_edit_session(
    round: u32,
    agent_id: &str,
    workspace: &Path,
    model: Option<String>,
    settings: &EditSettings,
    log_dir: &Path,
    runtime: &ContainerRuntime,
) -> Result<EditOutcome> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("create edit log dir {}", log_dir.display()))?;

    // File-form references were made absolute at config load; the base here
    // only matters for references that were already relative to cwd.
    let prompt = resolve_prompt(&settings.prompt, round, agent_id, Path::new("."))?;

    let handle = runtime
        .create(&ContainerSpec {
            image: settings.image.clone(),
            workdir: WORKSPACE_DIR.into(),
            env: vec![("SOLCLASH_ROUND".into(), round.to_string())],
            mounts: vec![],
        })
        .await
        .context("create edit container")?;

    let session = drive_session(
        round, agent_id, workspace, model, settings, &prompt, log_dir, runtime, &handle,
    );
    let outcome = match settings.timeout_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), session).await {
            Ok(result) => result,
            Err(_) => {
                warn!(agent = %agent_id, "edit session timed out");
                Ok(EditOutcome {
                    status: EditStatus::Timeout,
                    session_id: None,
                    checkpoint_id: None,
                    error: Some(format!("session exceeded {ms} ms")),
                    log_dir: log_dir.to_path_buf(),
                })
            }
        },
        None => session.await,
    };

    if let Err(e) = runtime.remove(&handle).await {
        warn!(agent = %agent_id, error = %e, "edit container cleanup failed");
    }
    outcome
}

#[allow(clippy::too_many_arguments)]
async fn drive_session(
    round: u32,
    agent_id: &str,
    workspace: &Path,
    model: Option<String>,
    settings: &EditSettings,
    prompt: &ResolvedPrompt,
    log_dir: &Path,
    runtime: &ContainerRuntime,
    handle: &ContainerHandle,
) -> Result<EditOutcome> {
    // Workspace in.
    let workspace_dot = PathBuf::from(format!("{}/.", workspace.display()));
    runtime
        .copy_to(handle, &workspace_dot, WORKSPACE_DIR)
        .await
        .context("copy workspace into container")?;

    // Brief in.
    let brief = EditBrief {
        round,
        agent_id: agent_id.to_string(),
        workspace_path: WORKSPACE_DIR.into(),
        system_prompt: prompt.content.clone(),
        max_turns: settings.max_turns,
        tool_allowlist: settings.tool_allowlist.clone(),
        sandbox_enabled: settings.sandbox_enabled,
        network_policy: settings.network_policy.clone(),
        settings_sources: settings.settings_sources.clone(),
        timeout_ms: settings.timeout_ms,
        model,
        prompt_ref: prompt.reference.clone(),
        prompt_sha256: prompt.sha256.clone(),
        prompt_path: prompt.path.clone(),
    };
    let brief_container_path = format!("/tmp/edit-input-{agent_id}.json");
    let staged = tempfile::NamedTempFile::new().context("stage edit brief")?;
    serde_json::to_writer_pretty(&staged, &brief).context("serialize edit brief")?;
    runtime
        .copy_to(handle, staged.path(), &brief_container_path)
        .await
        .context("copy edit brief into container")?;

    // Run the editor.
    let result = runtime
        .exec(
            handle,
            &[
                settings.runner_script.clone(),
                "--input".into(),
                brief_container_path,
                "--log-dir".into(),
                LOGS_DIR.into(),
            ],
            Some(WORKSPACE_DIR),
            &[],
        )
        .await
        .context("exec edit runner")?;

    // Logs out (best-effort; a crashed runner may have written nothing).
    if let Err(e) = runtime
        .copy_from(handle, &format!("{LOGS_DIR}/."), log_dir)
        .await
    {
        warn!(agent = %agent_id, error = %e, "no edit logs captured");
    }

    // Status: the runner's own edit_meta.json wins; the exit code is the
    // fallback. An arbitrary zero exit without edit_meta.json is still
    // success-by-exit-code, but carries no session metadata.
    let meta: Option<EditMeta> = scl_artifacts::read_json(log_dir.join("edit_meta.json")).ok();
    let (status, session_id, checkpoint_id, error) = match meta {
        Some(meta) => (meta.status, meta.session_id, meta.checkpoint_id, meta.error),
        None => {
            let status = match result.exit_code {
                0 => EditStatus::Success,
                EXIT_TIMEOUT => EditStatus::Timeout,
                _ => EditStatus::Failure,
            };
            let error = if status == EditStatus::Failure {
                Some(result.stderr.clone())
            } else {
                None
            };
            (status, None, None, error)
        }
    };

    // Workspace capture-back, only on success. This is the single path by
    // which edits persist; failed and timed-out sessions leave the host
    // workspace byte-identical.
    if status == EditStatus::Success {
        sync_workspace_back(runtime, handle, workspace)
            .await
            .context("capture workspace back")?;
    }

    Ok(EditOutcome {
        status,
        session_id,
        checkpoint_id,
        error,
        log_dir: log_dir.to_path_buf(),
    })
}

/// Copy `/workspace/.` into a staging directory, then swap it in place of
/// the host workspace. The original is renamed aside first so a failed copy
/// can never leave a half-written workspace behind.
async fn sync_workspace_back(
    runtime: &ContainerRuntime,
    handle: &ContainerHandle,
    workspace: &Path,
) -> Result<()> {
    let staging = tempfile::tempdir_in(
        workspace
            .parent()
            .ok_or_else(|| anyhow::anyhow!("workspace has no parent"))?,
    )
    .context("create staging dir")?;
    let staged = staging.path().join("workspace");

    runtime
        .copy_from(handle, &format!("{WORKSPACE_DIR}/."), &staged)
        .await
        .context("copy workspace out of container")?;

    let displaced = staging.path().join("previous");
    std::fs::rename(workspace, &displaced).context("displace old workspace")?;
    match std::fs::rename(&staged, workspace) {
        Ok(()) => Ok(()),
        Err(e) => {
            // Roll the original back before reporting.
            let _ = std::fs::rename(&displaced, workspace);
            Err(e).context("activate new workspace")
        }
    }
}
