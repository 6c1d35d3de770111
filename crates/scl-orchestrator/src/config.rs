use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use scl_schemas::AgentProvider;

/// One competitor as declared in the tournament config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    pub provider: AgentProvider,
    /// Required for non-builtin agents; resolved against the config file's
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPolicy {
    pub enabled: bool,
    #[serde(default)]
    pub allowlist: Vec<String>,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            allowlist: Vec::new(),
        }
    }
}

/// Edit-phase knobs. `enabled` plus `edit_round_one` decide which rounds get
/// an edit session; neither default is baked into the code paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSettings {
    pub enabled: bool,
    pub edit_round_one: bool,
    /// `"default"`, or a prompt file path (`*.md` / `*.txt` or containing `/`).
    pub prompt: String,
    pub max_turns: u32,
    #[serde(default)]
    pub tool_allowlist: Vec<String>,
    pub sandbox_enabled: bool,
    #[serde(default)]
    pub network_policy: NetworkPolicy,
    #[serde(default)]
    pub settings_sources: Vec<String>,
    /// Worker pool width; >= 1.
    pub concurrency: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    pub image: String,
    /// Runner path inside the container.
    pub runner_script: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// How rounds are executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeChoice {
    /// Round executor in this process.
    InProcess,
    /// One arena container per round.
    Container,
}

/// Native policy runner wiring for in-process rounds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessSettings {
    /// Runner command; absent means non-builtin agents cannot evaluate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_unit_limit: Option<u64>,
}

/// The resolved tournament configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    /// Arena config path, resolved against this file's directory.
    pub arena_config: PathBuf,
    /// Bar file path; may be omitted when the arena config declares a
    /// synthetic tape source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars: Option<PathBuf>,
    pub rounds: u32,
    pub runtime: RuntimeChoice,
    pub output_dir: PathBuf,
    pub agents: Vec<AgentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<EditSettings>,
    /// Image for the containerized competition phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arena_image: Option<String>,
    /// Which container backend both phases use.
    #[serde(default = "default_container_runtime")]
    pub container_runtime: String,
    #[serde(default)]
    pub harness: HarnessSettings,
}

fn default_container_runtime() -> String {
    "docker".to_string()
}

impl TournamentConfig {
    /// Load and resolve all relative paths against the config's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read tournament config {}", path.display()))?;
        let mut cfg: TournamentConfig = serde_json::from_str(&s)
            .with_context(|| format!("parse tournament config {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        cfg.arena_config = base.join(&cfg.arena_config);
        cfg.bars = cfg.bars.take().map(|p| base.join(p));
        cfg.output_dir = base.join(&cfg.output_dir);
        for agent in &mut cfg.agents {
            agent.workspace = agent.workspace.take().map(|w| base.join(w));
        }
        if let Some(edit) = &mut cfg.edit {
            // File-form prompt references resolve against this config file.
            if edit.prompt.contains('/')
                || edit.prompt.ends_with(".md")
                || edit.prompt.ends_with(".txt")
            {
                edit.prompt = base.join(&edit.prompt).display().to_string();
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds == 0 {
            anyhow::bail!("tournament needs at least one round");
        }
        if let Some(edit) = &self.edit {
            if edit.concurrency == 0 {
                anyhow::bail!("edit.concurrency must be >= 1");
            }
        }
        for agent in &self.agents {
            if !agent.provider.is_builtin() && agent.workspace.is_none() {
                anyhow::bail!("agent '{}' needs a workspace", agent.id);
            }
        }
        Ok(())
    }

    pub fn container_runtime(&self) -> Result<scl_sandbox::ContainerRuntime> {
        match self.container_runtime.as_str() {
            "docker" => Ok(scl_sandbox::ContainerRuntime::Docker),
            "host" => Ok(scl_sandbox::ContainerRuntime::Host),
            other => anyhow::bail!("unknown container runtime '{other}'"),
        }
    }
}
