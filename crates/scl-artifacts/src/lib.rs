//! scl-artifacts
//!
//! Append-only JSONL log sinks plus the whole-file JSON artifact writers.
//!
//! Layout under a round directory:
//! ```text
//! <round_dir>/summary.json
//! <round_dir>/round_results.json
//! <round_dir>/round_meta.json
//! <round_dir>/<agent_id>/policy_log.jsonl
//! <round_dir>/<agent_id>/trade_log.jsonl
//! <round_dir>/<agent_id>/equity_log.jsonl
//! <round_dir>/<agent_id>/liquidation_log.jsonl
//! ```

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

/// The four per-agent log streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogKind {
    Policy,
    Trade,
    Equity,
    Liquidation,
}

impl LogKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            LogKind::Policy => "policy_log.jsonl",
            LogKind::Trade => "trade_log.jsonl",
            LogKind::Equity => "equity_log.jsonl",
            LogKind::Liquidation => "liquidation_log.jsonl",
        }
    }
}

/// Per-(agent, kind) buffered JSONL sinks, opened lazily on first append and
/// closed exactly once. A closed writer is never re-opened; appending after
/// `close_all` is a caller bug and errors out.
pub struct LogSinks {
    root: PathBuf,
    writers: BTreeMap<(String, LogKind), BufWriter<File>>,
    closed: bool,
}

impl LogSinks {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            writers: BTreeMap::new(),
            closed: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Append one record as a compact JSON line.
    pub fn append<T: Serialize>(&mut self, agent_id: &str, kind: LogKind, record: &T) -> Result<()> {
        if self.closed {
            bail!("log sinks already closed (agent {agent_id}, {:?})", kind);
        }

        let key = (agent_id.to_string(), kind);
        if !self.writers.contains_key(&key) {
            let dir = self.root.join(agent_id);
            fs::create_dir_all(&dir)
                .with_context(|| format!("create log dir {}", dir.display()))?;
            let path = dir.join(kind.file_name());
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log sink {}", path.display()))?;
            self.writers.insert(key.clone(), BufWriter::new(file));
        }

        let w = self.writers.get_mut(&key).expect("writer just inserted");
        serde_json::to_writer(&mut *w, record).context("serialize log record")?;
        w.write_all(b"\n").context("write log record newline")?;
        Ok(())
    }

    /// Flush and close every sink. Idempotent.
    pub fn close_all(&mut self) -> Result<()> {
        for ((agent, kind), w) in self.writers.iter_mut() {
            w.flush()
                .with_context(|| format!("flush log sink {agent}/{:?}", kind))?;
        }
        self.writers.clear();
        self.closed = true;
        Ok(())
    }
}

impl Drop for LogSinks {
    fn drop(&mut self) {
        // Best-effort flush; explicit close_all is the supported path.
        let _ = self.close_all();
    }
}

/// Pretty-print a JSON artifact, creating parent directories.
pub fn write_json_pretty<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create artifact dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("serialize artifact")?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write artifact {}", path.display()))?;
    Ok(())
}

/// Read a whole-file JSON artifact.
pub fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .with_context(|| format!("read artifact {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse artifact {}", path.display()))
}

/// Read a JSONL file back as values (test + inspection helper).
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)
        .with_context(|| format!("read jsonl {}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in s.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let v: Value = serde_json::from_str(line)
            .with_context(|| format!("parse jsonl {} line {}", path.display(), i + 1))?;
        out.push(v);
    }
    Ok(out)
}
