use serde::{Deserialize, Serialize};

/// Who edits an agent's workspace between rounds. Builtins are never edited
/// and never have a workspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentProvider {
    Builtin,
    Anthropic,
    Openai,
    Google,
    Kimi,
    Glm,
}

impl AgentProvider {
    pub fn is_builtin(&self) -> bool {
        matches!(self, AgentProvider::Builtin)
    }
}

/// Per-agent manifest shipped into the arena container as
/// `/inputs/agent-<id>.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentManifest {
    pub id: String,
    pub arena_id: String,
    pub provider: AgentProvider,
    /// Workspace path as seen by whoever consumes the manifest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
