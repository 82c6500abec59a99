//! Engine process lifecycle management.
//!
//! The supervisor owns the single supervised engine subprocess: it writes the
//! resolved tools file, spawns the engine in one of two transport modes,
//! performs the MCP handshake, and guarantees teardown on every exit path.
//! State machine: Uninitialized -> Starting -> Ready -> Stopping -> Stopped,
//! with Failed reachable from Starting (spawn/handshake failure) and Ready
//! (unexpected engine exit). A crash is fatal to the server; the engine is
//! never restarted mid-session.

use crate::engine::channel::{
    peer_call_tool, peer_list_tools, EngineChannel, EngineClientHandler, RemoteChannel,
};
use crate::error::{ServerError, ServerResult};
use crate::models::ToolsConfig;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use rmcp::service::{serve_client, Peer, RoleClient};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::transport::streamable_http_client::{
    StreamableHttpClientTransport, StreamableHttpClientTransportConfig,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

/// Readiness poll bound for http mode: 20 attempts, 250ms apart (~5s).
pub const READY_ATTEMPTS: u32 = 20;
pub const READY_INTERVAL: Duration = Duration::from_millis(250);

/// Sub-path the engine serves MCP on in http mode.
const ENGINE_MCP_PATH: &str = "/mcp";

/// How the supervised engine is launched and reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMode {
    /// Attached via standard streams. Default; no network exposure.
    Stdio,
    /// Detached, listening on host:port. Requires explicit readiness polling.
    Http { host: String, port: u16 },
}

/// Launch settings for the engine subprocess.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Engine binary path or name resolved via PATH
    pub binary: String,
    pub mode: EngineMode,
    /// Variables injected into the child environment (from the env mapper)
    pub extra_env: HashMap<String, String>,
}

/// Live engine resources: the channel plus everything owed at teardown.
struct EngineHandle {
    channel: EngineChannel,
    /// Detached child in http mode; stdio children are owned by the channel
    child: Option<Child>,
    config_path: PathBuf,
}

enum SupervisorState {
    Uninitialized,
    Starting,
    Ready(Box<EngineHandle>),
    Stopped,
    Failed,
}

impl SupervisorState {
    fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Starting => "starting",
            Self::Ready(_) => "ready",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Owner of the supervised engine process and its channel.
///
/// One instance per server. Start happens once before serving begins; stop is
/// idempotent and runs on every exit path.
pub struct EngineSupervisor {
    settings: EngineSettings,
    config: ToolsConfig,
    state: Mutex<SupervisorState>,
}

impl EngineSupervisor {
    pub fn new(settings: EngineSettings, config: ToolsConfig) -> Self {
        Self {
            settings,
            config,
            state: Mutex::new(SupervisorState::Uninitialized),
        }
    }

    /// Current state name, for logging and tests.
    pub async fn state_name(&self) -> &'static str {
        self.state.lock().await.name()
    }

    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.lock().await, SupervisorState::Ready(_))
    }

    /// Launch the engine and perform the handshake.
    ///
    /// Fatal on failure: the caller must not enter serving state.
    pub async fn start(&self) -> ServerResult<()> {
        let mut state = self.state.lock().await;
        if !matches!(*state, SupervisorState::Uninitialized) {
            return Err(ServerError::process(format!(
                "engine supervisor cannot start from state '{}'",
                state.name()
            )));
        }
        *state = SupervisorState::Starting;

        let config_path = self.write_config_file().await;

        let result = match &self.settings.mode {
            EngineMode::Stdio => self
                .spawn_stdio(&config_path)
                .await
                .map(|channel| (channel, None)),
            EngineMode::Http { host, port } => self.spawn_http(&config_path, host, *port).await,
        };

        match result {
            Ok((channel, child)) => {
                info!(mode = channel.mode(), "engine ready");
                *state = SupervisorState::Ready(Box::new(EngineHandle {
                    channel,
                    child,
                    config_path,
                }));
                Ok(())
            }
            Err(e) => {
                *state = SupervisorState::Failed;
                if let Err(rm_err) = tokio::fs::remove_file(&config_path).await {
                    warn!(
                        path = %config_path.display(),
                        error = %rm_err,
                        "failed to delete engine tools file after startup failure"
                    );
                }
                Err(e)
            }
        }
    }

    /// Tear down the engine. Idempotent: a second call is a no-op.
    pub async fn stop(&self) {
        let old = {
            let mut state = self.state.lock().await;
            std::mem::replace(&mut *state, SupervisorState::Stopped)
        };
        if let SupervisorState::Ready(handle) = old {
            info!("stopping engine");
            Self::teardown(*handle).await;
        }
    }

    /// Release all resources held by a live handle.
    async fn teardown(handle: EngineHandle) {
        let EngineHandle {
            channel,
            child,
            config_path,
        } = handle;

        channel.close().await;
        if let Some(mut child) = child {
            if let Err(e) = child.kill().await {
                debug!(error = %e, "engine child already gone");
            }
        }
        // Best-effort: a leftover temp file is logged, never fatal
        if let Err(e) = tokio::fs::remove_file(&config_path).await {
            warn!(
                path = %config_path.display(),
                error = %e,
                "failed to delete engine tools file"
            );
        }
    }

    /// Write the resolved config to a uniquely-named ephemeral file.
    ///
    /// A write failure is logged, not fatal in itself: the engine is still
    /// launched against the path and its own startup failure surfaces as the
    /// `ProcessError`.
    async fn write_config_file(&self) -> PathBuf {
        let path = std::env::temp_dir().join(format!("toolbox-tools-{}.yaml", Uuid::new_v4()));
        match serde_yaml::to_string(&self.config) {
            Ok(yaml) => {
                if let Err(e) = tokio::fs::write(&path, yaml).await {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to write engine tools file"
                    );
                } else {
                    debug!(path = %path.display(), "wrote engine tools file");
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to serialize tools config");
            }
        }
        path
    }

    /// Launch the engine attached via stdio and perform the handshake.
    ///
    /// Readiness is implicit in a successful stream connection; the
    /// handshake itself is the only gate.
    async fn spawn_stdio(&self, config_path: &Path) -> ServerResult<EngineChannel> {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.arg("--tools-file").arg(config_path).arg("--stdio");
        for (key, value) in &self.settings.extra_env {
            cmd.env(key, value);
        }

        let (transport, stderr) = TokioChildProcess::builder(cmd)
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| {
                ServerError::process(format!(
                    "failed to launch engine '{}': {e}",
                    self.settings.binary
                ))
            })?;
        if let Some(stderr) = stderr {
            forward_stderr(stderr);
        }

        let service = serve_client(EngineClientHandler, transport)
            .await
            .map_err(|e| ServerError::process(format!("engine handshake failed: {e}")))?;
        Ok(EngineChannel::Stdio { service })
    }

    /// Launch the engine detached on host:port, poll for readiness, then
    /// perform the handshake over the http channel.
    async fn spawn_http(
        &self,
        config_path: &Path,
        host: &str,
        port: u16,
    ) -> ServerResult<(EngineChannel, Option<Child>)> {
        let mut cmd = Command::new(&self.settings.binary);
        cmd.arg("--tools-file")
            .arg(config_path)
            .arg("--address")
            .arg(host)
            .arg("--port")
            .arg(port.to_string());
        for (key, value) in &self.settings.extra_env {
            cmd.env(key, value);
        }
        cmd.stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            ServerError::process(format!(
                "failed to launch engine '{}': {e}",
                self.settings.binary
            ))
        })?;
        if let Some(stderr) = child.stderr.take() {
            forward_stderr(stderr);
        }

        let addr = format!("{host}:{port}");
        let mut reachable = false;
        for attempt in 1..=READY_ATTEMPTS {
            if let Ok(Some(status)) = child.try_wait() {
                return Err(ServerError::process(format!(
                    "engine exited with {status} before becoming reachable on {addr}"
                )));
            }
            if TcpStream::connect(&addr).await.is_ok() {
                debug!(attempt, %addr, "engine is accepting connections");
                reachable = true;
                break;
            }
            sleep(READY_INTERVAL).await;
        }
        if !reachable {
            let _ = child.kill().await;
            return Err(ServerError::process(format!(
                "engine did not become reachable on {addr} within {READY_ATTEMPTS} attempts ({}ms apart)",
                READY_INTERVAL.as_millis()
            )));
        }

        let endpoint = Url::parse(&format!("http://{addr}{ENGINE_MCP_PATH}"))
            .map_err(|e| ServerError::internal(format!("invalid engine endpoint: {e}")))?;
        let transport = StreamableHttpClientTransport::with_client(
            reqwest::Client::default(),
            StreamableHttpClientTransportConfig::with_uri(endpoint.to_string()),
        );
        match serve_client(EngineClientHandler, transport).await {
            Ok(service) => Ok((EngineChannel::Http { service }, Some(child))),
            Err(e) => {
                let _ = child.kill().await;
                Err(ServerError::process(format!(
                    "engine handshake failed: {e}"
                )))
            }
        }
    }

    /// Get a request handle if the engine is live, failing fast otherwise.
    ///
    /// Detects an engine that exited while Ready (http mode: the detached
    /// child is checked directly; stdio mode surfaces as an immediate
    /// transport error on the call itself) and transitions to Failed so
    /// every subsequent call fails fast instead of hanging.
    async fn ready_peer(&self, context: &str) -> ServerResult<Peer<RoleClient>> {
        let mut state = self.state.lock().await;
        match &mut *state {
            SupervisorState::Ready(handle) => {
                let exited = handle
                    .child
                    .as_mut()
                    .is_some_and(|c| matches!(c.try_wait(), Ok(Some(_)) | Err(_)));
                if exited {
                    let old = std::mem::replace(&mut *state, SupervisorState::Failed);
                    drop(state);
                    if let SupervisorState::Ready(handle) = old {
                        warn!("engine process exited unexpectedly");
                        Self::teardown(*handle).await;
                    }
                    return Err(ServerError::tool_invocation(
                        context,
                        "engine process exited unexpectedly",
                    ));
                }
                Ok(handle.channel.peer())
            }
            other => Err(ServerError::tool_invocation(
                context,
                format!("engine is not running (state: {})", other.name()),
            )),
        }
    }
}

impl RemoteChannel for EngineSupervisor {
    async fn list_remote_tools(&self) -> ServerResult<Vec<Tool>> {
        let peer = self.ready_peer("tools/list").await?;
        peer_list_tools(&peer).await
    }

    async fn invoke_remote(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> ServerResult<CallToolResult> {
        let peer = self.ready_peer(name).await?;
        peer_call_tool(&peer, name, arguments).await
    }
}

/// Drain engine stderr into tracing, line by line.
fn forward_stderr(stderr: ChildStderr) {
    tokio::spawn(async move {
        let reader = BufReader::new(stderr);
        let mut lines = reader.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(target: "engine", "{line}");
        }
    });
}
