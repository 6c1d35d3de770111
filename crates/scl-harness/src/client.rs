use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scl_policy::{Policy, PolicyError};
use scl_schemas::{EvaluationInput, EvaluationOutput};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::wire::{
    HarnessRequest, HarnessRequestBody, HarnessResponse, ProgramSpecWire, WireEvaluationInput,
};
use crate::HarnessError;

/// A native policy program: agent id plus the shared object to load.
#[derive(Clone, Debug)]
pub struct ProgramSpec {
    pub id: String,
    pub so_path: PathBuf,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<HarnessResponse>>>>;

/// Request/response multiplexer over one child process.
///
/// One reader task owns the child's stdout; callers enqueue a oneshot into
/// the pending map, write their line, and await the correlated response.
pub struct HarnessClient {
    stdin: Mutex<Option<ChildStdin>>,
    child: Mutex<Child>,
    pending: PendingMap,
    next_id: AtomicU64,
    gone: Arc<AtomicBool>,
}

impl HarnessClient {
    /// Spawn the runner and start the response reader.
    pub fn spawn(cmd: &str, args: &[String]) -> Result<Self, HarnessError> {
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or(HarnessError::Gone)?;
        let stdout = child.stdout.take().ok_or(HarnessError::Gone)?;

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let gone = Arc::new(AtomicBool::new(false));

        let reader_pending = Arc::clone(&pending);
        let reader_gone = Arc::clone(&gone);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let resp: HarnessResponse = match serde_json::from_str(&line) {
                            Ok(resp) => resp,
                            Err(e) => {
                                // Malformed lines are dropped, not fatal.
                                debug!(error = %e, "ignoring unparseable harness line");
                                continue;
                            }
                        };
                        let tx = reader_pending.lock().await.remove(&resp.request_id());
                        match tx {
                            Some(tx) => {
                                let _ = tx.send(resp);
                            }
                            None => {
                                debug!(
                                    request_id = resp.request_id(),
                                    "ignoring response with no pending request"
                                );
                            }
                        }
                    }
                    // EOF or read failure: the child is gone. Dropping the
                    // senders fails every outstanding await with Gone.
                    Ok(None) | Err(_) => {
                        reader_gone.store(true, Ordering::SeqCst);
                        reader_pending.lock().await.clear();
                        break;
                    }
                }
            }
        });

        Ok(Self {
            stdin: Mutex::new(Some(stdin)),
            child: Mutex::new(child),
            pending,
            next_id: AtomicU64::new(1),
            gone,
        })
    }

    async fn request(&self, body: HarnessRequestBody) -> Result<HarnessResponse, HarnessError> {
        if self.gone.load(Ordering::SeqCst) {
            return Err(HarnessError::Gone);
        }

        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(request_id, tx);

        let line = serde_json::to_string(&HarnessRequest { request_id, body })
            .map_err(|e| HarnessError::Protocol(e.to_string()))?;

        {
            let mut stdin = self.stdin.lock().await;
            let Some(stdin) = stdin.as_mut() else {
                self.pending.lock().await.remove(&request_id);
                return Err(HarnessError::Gone);
            };
            let write = async {
                stdin.write_all(line.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await
            };
            if write.await.is_err() {
                self.pending.lock().await.remove(&request_id);
                return Err(HarnessError::Gone);
            }
        }

        rx.await.map_err(|_| HarnessError::Gone)
    }

    /// Preload every agent's native program.
    pub async fn init(
        &self,
        programs: &[ProgramSpec],
        compute_unit_limit: Option<u64>,
    ) -> Result<(), HarnessError> {
        let body = HarnessRequestBody::Init {
            programs: programs
                .iter()
                .map(|p| ProgramSpecWire {
                    id: p.id.clone(),
                    so_path: p.so_path.display().to_string(),
                })
                .collect(),
            compute_unit_limit,
        };
        match self.request(body).await? {
            HarnessResponse::Ok { .. } => Ok(()),
            HarnessResponse::Error { message, .. } => Err(HarnessError::Protocol(message)),
            HarnessResponse::Result { .. } => Err(HarnessError::Protocol(
                "unexpected result response to init".into(),
            )),
        }
    }

    /// Evaluate one step for one agent.
    pub async fn eval(
        &self,
        agent_id: &str,
        input: &EvaluationInput,
    ) -> Result<EvaluationOutput, HarnessError> {
        let volume_scale = input.instrument.volume_scale;
        let body = HarnessRequestBody::Eval {
            agent_id: agent_id.to_string(),
            input: WireEvaluationInput::from_input(input),
        };
        match self.request(body).await? {
            HarnessResponse::Result { output, .. } => output.into_output(volume_scale),
            HarnessResponse::Error { message, .. } => Err(HarnessError::Protocol(message)),
            HarnessResponse::Ok { .. } => Err(HarnessError::Protocol(
                "unexpected ok response to eval".into(),
            )),
        }
    }

    /// Issue `shutdown`, close stdin, and kill the child if it lingers.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), HarnessError> {
        // Best-effort request; a dead child is already shut down.
        let _ = tokio::time::timeout(grace, self.request(HarnessRequestBody::Shutdown {})).await;

        // Ending the stdin stream asks the runner to exit its read loop.
        self.stdin.lock().await.take();

        let mut child = self.child.lock().await;
        match tokio::time::timeout(grace, child.wait()).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!("harness did not exit in time, killing");
                child.kill().await.map_err(HarnessError::Spawn)?;
                Ok(())
            }
        }
    }
}

/// Adapter exposing one harness agent as an engine policy.
///
/// Per-eval failures degrade to `PolicyError::Exception`, which the engine
/// records as HOLD with `err_code = 5`; losing the harness at init or
/// shutdown surfaces `HarnessError` to the round runner instead.
pub struct HarnessPolicy {
    client: Arc<HarnessClient>,
    agent_id: String,
}

impl HarnessPolicy {
    pub fn new(client: Arc<HarnessClient>, agent_id: impl Into<String>) -> Self {
        Self {
            client,
            agent_id: agent_id.into(),
        }
    }
}

#[async_trait]
impl Policy for HarnessPolicy {
    async fn evaluate(&mut self, input: &EvaluationInput) -> Result<EvaluationOutput, PolicyError> {
        self.client
            .eval(&self.agent_id, input)
            .await
            .map_err(|e| PolicyError::Exception(e.to_string()))
    }
}
