//! Communication channels to the supervised engine.
//!
//! Two mutually exclusive channel variants exist behind one interface:
//! `Stdio` (the engine attached via its standard streams) and `Http` (the
//! engine listening on a host:port). Both are selected exactly once at
//! startup; nothing outside the engine module branches on the mode.

use crate::error::{ServerError, ServerResult};
use rmcp::handler::client::ClientHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ClientCapabilities, Implementation,
    InitializeRequestParams, JsonObject, Tool,
};
use rmcp::service::{Peer, RoleClient, RunningService};
use std::future::Future;

/// Seam between the tool router and the live engine.
///
/// The supervisor implements this against the real subprocess; tests swap in
/// a mock. Both operations delegate to the engine verbatim.
pub trait RemoteChannel: Send + Sync {
    /// Fetch the engine's advertised tool list.
    fn list_remote_tools(&self) -> impl Future<Output = ServerResult<Vec<Tool>>> + Send;

    /// Invoke an engine tool by name, arguments passed through untouched.
    fn invoke_remote(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> impl Future<Output = ServerResult<CallToolResult>> + Send;
}

/// MCP client handler for the engine session.
///
/// All notification handling uses the rmcp defaults; only the client
/// identity is ours to provide.
#[derive(Clone, Default)]
pub struct EngineClientHandler;

impl ClientHandler for EngineClientHandler {
    fn get_info(&self) -> InitializeRequestParams {
        InitializeRequestParams {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "toolbox-mcp-server".to_string(),
                title: None,
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
        }
    }
}

/// A running client session with the engine.
pub type EngineService = RunningService<RoleClient, EngineClientHandler>;

/// The active channel to the engine, tagged by transport mode.
pub enum EngineChannel {
    Stdio { service: EngineService },
    Http { service: EngineService },
}

impl EngineChannel {
    /// Transport mode name for logging.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Stdio { .. } => "stdio",
            Self::Http { .. } => "http",
        }
    }

    /// Cheap cloneable handle for issuing requests without holding the
    /// supervisor lock across awaits.
    pub fn peer(&self) -> Peer<RoleClient> {
        match self {
            Self::Stdio { service } | Self::Http { service } => service.peer().clone(),
        }
    }

    /// Close the session, tearing down the underlying transport.
    ///
    /// For the stdio variant this also kills the attached child process.
    pub async fn close(self) {
        let service = match self {
            Self::Stdio { service } | Self::Http { service } => service,
        };
        if let Err(e) = service.cancel().await {
            tracing::debug!(error = %e, "engine session did not shut down cleanly");
        }
    }
}

/// List tools through a peer handle.
pub(crate) async fn peer_list_tools(peer: &Peer<RoleClient>) -> ServerResult<Vec<Tool>> {
    peer.list_all_tools()
        .await
        .map_err(|e| ServerError::internal(format!("engine tool listing failed: {e}")))
}

/// Invoke a tool through a peer handle.
pub(crate) async fn peer_call_tool(
    peer: &Peer<RoleClient>,
    name: &str,
    arguments: JsonObject,
) -> ServerResult<CallToolResult> {
    let params = CallToolRequestParams {
        meta: None,
        name: name.to_string().into(),
        arguments: Some(arguments),
        task: None,
    };
    peer.call_tool(params)
        .await
        .map_err(|e| ServerError::tool_invocation(name, e.to_string()))
}
