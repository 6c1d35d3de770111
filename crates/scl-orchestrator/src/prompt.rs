use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

use crate::OrchestratorError;

/// A resolved edit prompt, hashed so the brief and `edit_meta.json` can both
/// attest exactly what the editor was told.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub reference: String,
    pub path: Option<String>,
    pub content: String,
    pub sha256: String,
}

/// Resolve a prompt reference.
///
/// `"default"` selects the builtin generator (keyed on round and agent);
/// anything containing `/` or ending in `.md`/`.txt` is read from disk,
/// relative to `base_dir`; everything else is an error.
pub fn resolve_prompt(
    reference: &str,
    round: u32,
    agent_id: &str,
    base_dir: &Path,
) -> Result<ResolvedPrompt> {
    if reference == "default" {
        let content = default_prompt(round, agent_id);
        return Ok(finish(reference, None, content));
    }

    if reference.contains('/') || reference.ends_with(".md") || reference.ends_with(".txt") {
        let path = base_dir.join(reference);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read prompt file {}", path.display()))?;
        return Ok(finish(reference, Some(path.display().to_string()), content));
    }

    Err(OrchestratorError::PromptUnresolvable(reference.to_string()).into())
}

fn finish(reference: &str, path: Option<String>, content: String) -> ResolvedPrompt {
    let sha256 = hex::encode(Sha256::digest(content.as_bytes()));
    ResolvedPrompt {
        reference: reference.to_string(),
        path,
        content,
        sha256,
    }
}

/// The builtin prompt. Round 1 has no prior logs to point at; later rounds
/// direct the editor to the previous round's results first.
fn default_prompt(round: u32, agent_id: &str) -> String {
    if round <= 1 {
        format!(
            "You are improving the trading policy for agent `{agent_id}`.\n\
             The policy source lives in this workspace. Make it a competitive\n\
             perpetual-futures policy: decide HOLD/BUY/SELL/CLOSE per bar from\n\
             the lookback window, and respect margin limits. Keep the build\n\
             green.\n"
        )
    } else {
        let prev = round - 1;
        format!(
            "You are improving the trading policy for agent `{agent_id}`.\n\
             Start by reading logs/rounds/{prev}/ in this workspace: it holds\n\
             last round's summary, scores, and your per-step policy, trade,\n\
             equity and liquidation logs. Diagnose what lost points, then\n\
             improve the policy source accordingly. Keep the build green.\n"
        )
    }
}
