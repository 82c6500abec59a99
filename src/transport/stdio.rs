//! Stdio transport for the MCP front-end.
//!
//! This transport uses standard input/output for communication,
//! which is the standard mode for CLI-based MCP integrations.

use crate::engine::EngineSupervisor;
use crate::error::{ServerError, ServerResult};
use crate::mcp::ProxyService;
use crate::router::ToolRouter;
use crate::transport::Transport;
use rmcp::{transport::stdio, ServiceExt};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes
/// responses to stdout, following the MCP protocol specification.
pub struct StdioTransport {
    router: Arc<ToolRouter<EngineSupervisor>>,
    supervisor: Arc<EngineSupervisor>,
}

impl StdioTransport {
    /// Create a new stdio transport.
    ///
    /// # Arguments
    ///
    /// * `router` - Shared tool router backing the service
    /// * `supervisor` - Engine supervisor, torn down on shutdown
    pub fn new(
        router: Arc<ToolRouter<EngineSupervisor>>,
        supervisor: Arc<EngineSupervisor>,
    ) -> Self {
        Self { router, supervisor }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> ServerResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = ProxyService::new(self.router.clone());

        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            ServerError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        self.supervisor.stop().await;
                        return Err(ServerError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // Spawn a task to listen for second signal and force exit
            tokio::spawn(async {
                wait_for_signal().await;
                tracing::warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
        }

        // Tear down the supervised engine on shutdown
        info!("Stopping supervised engine");
        self.supervisor.stop().await;

        if shutdown_requested {
            // Force exit since stdio may still be blocking on stdin
            // tokio::select! cannot interrupt blocking stdin reads
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineMode, EngineSettings};
    use crate::models::{Dialect, ToolsConfig};
    use std::collections::HashMap;

    #[test]
    fn test_stdio_transport_creation() {
        let supervisor = Arc::new(EngineSupervisor::new(
            EngineSettings {
                binary: "toolbox".to_string(),
                mode: EngineMode::Stdio,
                extra_env: HashMap::new(),
            },
            ToolsConfig::default(),
        ));
        let router = Arc::new(ToolRouter::new(supervisor.clone(), Dialect::Generic));
        let transport = StdioTransport::new(router, supervisor);
        assert_eq!(transport.name(), "stdio");
    }
}
