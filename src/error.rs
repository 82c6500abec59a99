//! Error types for the Toolbox MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error
//! handling. Errors fall into three groups: configuration problems (fatal at
//! startup), engine process problems (fatal at startup, fail-fast afterwards),
//! and tool invocation failures (always reported through the result envelope,
//! never propagated to the protocol layer).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Engine process error: {message}")]
    Process { message: String },

    #[error("Tool invocation failed: {tool} - {message}")]
    ToolInvocation { tool: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ServerError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an engine process error.
    pub fn process(message: impl Into<String>) -> Self {
        Self::Process {
            message: message.into(),
        }
    }

    /// Create a tool invocation error.
    pub fn tool_invocation(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// True for errors that must abort startup (the server never enters
    /// serving state).
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Process { .. })
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Convert ServerError to MCP ErrorData for the protocol front-end.
///
/// Only `list_tools` surfaces these directly; tool invocation failures are
/// converted to error envelopes before they reach the protocol layer.
impl From<ServerError> for rmcp::ErrorData {
    fn from(err: ServerError) -> Self {
        match &err {
            ServerError::Config { .. } => rmcp::ErrorData::invalid_params(err.to_string(), None),
            ServerError::Process { .. } => rmcp::ErrorData::internal_error(err.to_string(), None),
            ServerError::ToolInvocation { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), None)
            }
            ServerError::Internal { .. } => rmcp::ErrorData::internal_error(err.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServerError::config("tools file is not valid YAML");
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_tool_invocation_display_names_tool() {
        let err = ServerError::tool_invocation("preview_table", "missing parameter");
        let msg = err.to_string();
        assert!(msg.contains("preview_table"));
        assert!(msg.contains("missing parameter"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ServerError::config("bad file").is_fatal());
        assert!(ServerError::process("spawn failed").is_fatal());
        assert!(!ServerError::tool_invocation("t", "m").is_fatal());
        assert!(!ServerError::internal("m").is_fatal());
    }

    #[test]
    fn test_config_maps_to_invalid_params() {
        let err = ServerError::config("bad reference");
        let mcp_err: rmcp::ErrorData = err.into();
        // invalid_params uses -32602
        assert_eq!(mcp_err.code.0, -32602);
    }

    #[test]
    fn test_process_maps_to_internal_error() {
        let err = ServerError::process("engine exited");
        let mcp_err: rmcp::ErrorData = err.into();
        // internal_error uses -32603
        assert_eq!(mcp_err.code.0, -32603);
    }

    #[test]
    fn test_internal_maps_to_internal_error() {
        let err = ServerError::internal("unexpected");
        let mcp_err: rmcp::ErrorData = err.into();
        assert_eq!(mcp_err.code.0, -32603);
    }
}
