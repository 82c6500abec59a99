//! Configuration handling for the Toolbox MCP Server.
//!
//! This module provides configuration management via CLI arguments and
//! environment variables. CLI flags take precedence over their environment
//! equivalents (clap `env` semantics).

use crate::engine::EngineMode;
use crate::error::{ServerError, ServerResult};
use crate::models::Dialect;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

// Supervised engine defaults
pub const DEFAULT_ENGINE_BIN: &str = "toolbox";
pub const DEFAULT_ENGINE_HOST: &str = "127.0.0.1";
pub const DEFAULT_ENGINE_PORT: u16 = 5000;

/// Transport mode for the MCP front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// Streamable HTTP (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Transport mode for the supervised engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EngineTransportMode {
    /// Engine attached via standard streams. No network exposure.
    #[default]
    Stdio,
    /// Engine listening on host:port; readiness is polled explicitly.
    Http,
}

impl std::fmt::Display for EngineTransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

/// Where the engine configuration comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Declarative tools file, resolved with variable substitution
    File(PathBuf),
    /// Synthesized single-source config for a known dialect
    Prebuilt(Dialect),
}

/// Configuration for the Toolbox MCP Server.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "toolbox-mcp-server",
    about = "MCP proxy for the database toolbox engine - supervises the engine and re-exposes its tools",
    version,
    author
)]
pub struct Config {
    /// Declarative tools file for the engine.
    /// String values support ${VAR} and ${VAR:default} substitution.
    #[arg(long, value_name = "PATH", env = "MCP_TOOLBOX_TOOLS_FILE")]
    pub tools_file: Option<PathBuf>,

    /// Synthesize a single-source config for this dialect from
    /// DATABASE_HOST/PORT/NAME/USER/PASSWORD environment variables.
    #[arg(long, value_name = "DIALECT", env = "MCP_TOOLBOX_PREBUILT")]
    pub prebuilt: Option<String>,

    /// Engine binary path or name resolved via PATH
    #[arg(
        long,
        value_name = "PATH",
        default_value = DEFAULT_ENGINE_BIN,
        env = "MCP_TOOLBOX_BIN"
    )]
    pub engine_bin: String,

    /// Transport mode used to supervise the engine (stdio or http)
    #[arg(
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TOOLBOX_TRANSPORT"
    )]
    pub engine_transport: EngineTransportMode,

    /// Host the engine listens on (only used with http engine transport)
    #[arg(
        long,
        default_value = DEFAULT_ENGINE_HOST,
        env = "MCP_TOOLBOX_HOST"
    )]
    pub engine_host: String,

    /// Port the engine listens on (only used with http engine transport)
    #[arg(
        long,
        default_value_t = DEFAULT_ENGINE_PORT,
        env = "MCP_TOOLBOX_PORT"
    )]
    pub engine_port: u16,

    /// Front-end transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            tools_file: None,
            prebuilt: None,
            engine_bin: DEFAULT_ENGINE_BIN.to_string(),
            engine_transport: EngineTransportMode::Stdio,
            engine_host: DEFAULT_ENGINE_HOST.to_string(),
            engine_port: DEFAULT_ENGINE_PORT,
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Determine the engine configuration source.
    ///
    /// Exactly one of `--tools-file` and `--prebuilt` must be given; the
    /// prebuilt dialect must normalize to a known dialect.
    pub fn config_source(&self) -> ServerResult<ConfigSource> {
        match (&self.tools_file, &self.prebuilt) {
            (Some(_), Some(_)) => Err(ServerError::config(
                "--tools-file and --prebuilt are mutually exclusive",
            )),
            (Some(path), None) => Ok(ConfigSource::File(path.clone())),
            (None, Some(kind)) => {
                let dialect = Dialect::from_kind(kind);
                if dialect == Dialect::Generic {
                    return Err(ServerError::config(format!(
                        "unknown prebuilt dialect '{kind}' (expected postgres, mysql, sqlite, or mssql)"
                    )));
                }
                Ok(ConfigSource::Prebuilt(dialect))
            }
            (None, None) => Err(ServerError::config(
                "one of --tools-file or --prebuilt is required",
            )),
        }
    }

    /// Engine launch mode derived from the engine transport flags.
    pub fn engine_mode(&self) -> EngineMode {
        match self.engine_transport {
            EngineTransportMode::Stdio => EngineMode::Stdio,
            EngineTransportMode::Http => EngineMode::Http {
                host: self.engine_host.clone(),
                port: self.engine_port,
            },
        }
    }

    /// Get the front-end HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}
