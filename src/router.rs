//! Tool-call routing.
//!
//! The router merges the engine's advertised tool list with the built-in
//! catalog and dispatches each incoming call to either a local handler or a
//! remote passthrough. `invoke` is total: every failure on either path is
//! converted to a result envelope with `isError: true`; nothing propagates
//! to the protocol front-end as an exception.

use crate::engine::RemoteChannel;
use crate::error::{ServerError, ServerResult};
use crate::models::Dialect;
use crate::tools::templates::EXECUTE_SQL_TOOL;
use crate::tools::{catalog, templates};
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use std::sync::Arc;
use tracing::{debug, warn};

/// Convert a server error into an error envelope.
pub fn error_envelope(err: &ServerError) -> CallToolResult {
    CallToolResult::error(vec![Content::text(err.to_string())])
}

/// Routes tool calls between the built-in catalog and the engine.
pub struct ToolRouter<C> {
    channel: Arc<C>,
    dialect: Dialect,
}

impl<C: RemoteChannel> ToolRouter<C> {
    pub fn new(channel: Arc<C>, dialect: Dialect) -> Self {
        Self { channel, dialect }
    }

    /// Active dialect driving built-in template selection.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Remote tool list concatenated with the built-in catalog.
    ///
    /// No de-duplication: a remote tool sharing a built-in's name still
    /// appears, but calls to that name reach the built-in. The collision is
    /// logged so operators can namespace their declared tools.
    pub async fn list_tools(&self) -> ServerResult<Vec<Tool>> {
        let mut tools = self.channel.list_remote_tools().await?;
        for builtin in catalog::CATALOG {
            if tools.iter().any(|t| t.name == builtin.name) {
                warn!(
                    tool = builtin.name,
                    "engine tool is shadowed by a built-in of the same name"
                );
            }
        }
        tools.extend(catalog::CATALOG.iter().map(|b| b.to_tool()));
        Ok(tools)
    }

    /// Invoke a tool by name. Never fails: errors become envelopes.
    pub async fn invoke(&self, name: &str, arguments: JsonObject) -> CallToolResult {
        match self.dispatch(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                debug!(tool = name, error = %e, "tool invocation failed");
                error_envelope(&e)
            }
        }
    }

    async fn dispatch(&self, name: &str, arguments: JsonObject) -> ServerResult<CallToolResult> {
        if let Some(builtin) = catalog::find(name) {
            builtin.validate_args(&arguments)?;
            let statement = templates::render_statement(name, self.dialect, &arguments)?;
            debug!(tool = name, statement = %statement, "rendered built-in statement");

            let mut sql_args = JsonObject::new();
            sql_args.insert("sql".into(), serde_json::Value::String(statement));
            self.channel.invoke_remote(EXECUTE_SQL_TOOL, sql_args).await
        } else {
            self.channel.invoke_remote(name, arguments).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records invocations and answers like a small engine would.
    struct MockChannel {
        remote_tools: Vec<&'static str>,
        calls: Mutex<Vec<(String, JsonObject)>>,
    }

    impl MockChannel {
        fn new(remote_tools: Vec<&'static str>) -> Self {
            Self {
                remote_tools,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, JsonObject)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RemoteChannel for MockChannel {
        async fn list_remote_tools(&self) -> ServerResult<Vec<Tool>> {
            Ok(self
                .remote_tools
                .iter()
                .map(|name| Tool::new(*name, "remote tool", Arc::new(JsonObject::new())))
                .collect())
        }

        async fn invoke_remote(
            &self,
            name: &str,
            arguments: JsonObject,
        ) -> ServerResult<CallToolResult> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments));
            if self.remote_tools.contains(&name) {
                Ok(CallToolResult::success(vec![Content::text("ok")]))
            } else {
                Err(ServerError::tool_invocation(name, "unknown tool"))
            }
        }
    }

    fn router(remote_tools: Vec<&'static str>) -> (ToolRouter<MockChannel>, Arc<MockChannel>) {
        let channel = Arc::new(MockChannel::new(remote_tools));
        (
            ToolRouter::new(channel.clone(), Dialect::Sqlite),
            channel,
        )
    }

    fn is_error(result: &CallToolResult) -> bool {
        result.is_error.unwrap_or(false)
    }

    #[tokio::test]
    async fn test_list_tools_merges_without_dedup() {
        // "count_rows" collides with a built-in and must still appear twice
        let (router, _) = router(vec!["execute_sql", "count_rows"]);
        let tools = router.list_tools().await.unwrap();
        let count = tools.iter().filter(|t| t.name == "count_rows").count();
        assert_eq!(count, 2);
        assert_eq!(tools.len(), 2 + catalog::CATALOG.len());
    }

    #[tokio::test]
    async fn test_builtin_renders_and_forwards_to_execute_sql() {
        let (router, channel) = router(vec!["execute_sql"]);
        let mut args = JsonObject::new();
        args.insert("table".into(), serde_json::json!("users"));

        let result = router.invoke("describe_table", args).await;
        assert!(!is_error(&result));

        let calls = channel.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "execute_sql");
        assert_eq!(
            calls[0].1["sql"],
            serde_json::json!("PRAGMA table_info(users)")
        );
    }

    #[tokio::test]
    async fn test_remote_tool_passes_through_verbatim() {
        let (router, channel) = router(vec!["execute_sql", "my_declared_tool"]);
        let mut args = JsonObject::new();
        args.insert("id".into(), serde_json::json!(42));

        let result = router.invoke("my_declared_tool", args.clone()).await;
        assert!(!is_error(&result));

        let calls = channel.calls();
        assert_eq!(calls[0].0, "my_declared_tool");
        assert_eq!(calls[0].1, args);
    }

    #[tokio::test]
    async fn test_builtin_shadows_remote_tool_at_dispatch() {
        let (router, channel) = router(vec!["execute_sql", "count_rows"]);
        let mut args = JsonObject::new();
        args.insert("table".into(), serde_json::json!("users"));

        router.invoke("count_rows", args).await;
        // The built-in won: the engine saw execute_sql, not count_rows
        assert_eq!(channel.calls()[0].0, "execute_sql");
    }

    #[tokio::test]
    async fn test_unknown_tool_returns_error_envelope() {
        let (router, _) = router(vec!["execute_sql"]);
        let result = router.invoke("no_such_tool", JsonObject::new()).await;
        assert!(is_error(&result));
    }

    #[tokio::test]
    async fn test_missing_required_parameter_returns_error_envelope() {
        let (router, channel) = router(vec!["execute_sql"]);
        let result = router.invoke("describe_table", JsonObject::new()).await;
        assert!(is_error(&result));
        // Validation failed locally; nothing reached the engine
        assert!(channel.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_parameter_type_returns_error_envelope() {
        let (router, _) = router(vec!["execute_sql"]);
        let mut args = JsonObject::new();
        args.insert("table".into(), serde_json::json!(7));
        let result = router.invoke("describe_table", args).await;
        assert!(is_error(&result));
    }
}
