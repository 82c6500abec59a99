//! MCP service implementation using rmcp.
//!
//! The service is a thin protocol adapter over the tool router. Unlike a
//! fixed tool surface, the tool list here is dynamic (engine tools merged
//! with the built-in catalog), so `ServerHandler` is implemented by hand
//! instead of through the `#[tool_router]` macros.

use crate::engine::RemoteChannel;
use crate::router::ToolRouter;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::{ErrorData as McpError, ServerHandler};
use std::sync::Arc;

pub struct ProxyService<C> {
    /// Shared router for all tool operations
    router: Arc<ToolRouter<C>>,
}

impl<C> Clone for ProxyService<C> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
        }
    }
}

impl<C> ProxyService<C> {
    pub fn new(router: Arc<ToolRouter<C>>) -> Self {
        Self { router }
    }
}

impl<C: RemoteChannel + 'static> ServerHandler for ProxyService<C> {
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.router.list_tools().await.map_err(McpError::from)?;
        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        // Total: failures surface as error envelopes, never protocol errors
        Ok(self.router.invoke(&request.name, arguments).await)
    }

    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "toolbox-mcp-server".to_owned(),
                title: Some("Toolbox MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Database tools backed by a supervised toolbox engine.\n\
                \n\
                ## Workflow\n\
                1. Call `list_tables` (or `list_databases`/`list_schemas`) to explore\n\
                2. Inspect structures with `describe_table`, `list_columns`, `list_indexes`\n\
                3. Peek at data with `preview_table`, `count_rows`, `sample_distinct_values`\n\
                4. Tools declared in the server's configuration are also available by name\n\
                \n\
                ## Notes\n\
                - Row limits are clamped to 1-100\n\
                - Built-in tools take identifiers (table/schema/column names), not SQL\n\
                - A built-in tool shadows a configured tool of the same name"
                    .to_string(),
            ),
        }
    }
}
