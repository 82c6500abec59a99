//! Toolbox MCP Server - Main entry point.
//!
//! This server supervises the database toolbox engine as a subprocess and
//! exposes its tools over MCP alongside a built-in catalog of cross-database
//! introspection tools.

use clap::Parser;
use std::sync::Arc;
use toolbox_mcp_server::config::{Config, ConfigSource, TransportMode};
use toolbox_mcp_server::engine::{self, EngineSettings, EngineSupervisor};
use toolbox_mcp_server::models::Dialect;
use toolbox_mcp_server::router::ToolRouter;
use toolbox_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    // The process environment is snapshotted once and threaded explicitly
    // through synthesis and mapping
    let env: engine::EnvMap = std::env::vars().collect();

    let source = match config.config_source() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!();
            eprintln!("Usage: toolbox-mcp-server --tools-file <path>");
            eprintln!("       toolbox-mcp-server --prebuilt <dialect>");
            eprintln!();
            eprintln!("Examples:");
            eprintln!("  toolbox-mcp-server --prebuilt sqlite     (reads DATABASE_NAME)");
            eprintln!("  toolbox-mcp-server --prebuilt postgres   (reads DATABASE_HOST/PORT/NAME/USER/PASSWORD)");
            eprintln!("  toolbox-mcp-server --tools-file tools.yaml");
            eprintln!("  toolbox-mcp-server --tools-file tools.yaml --engine-transport http");
            std::process::exit(1);
        }
    };

    // Resolve the engine configuration
    let tools_config = match &source {
        ConfigSource::File(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read tools file {}: {e}", path.display()))?;
            engine::resolve_file(&content, &env)?
        }
        ConfigSource::Prebuilt(dialect) => engine::synthesize(*dialect, &env)?,
    };

    // Active dialect for the built-in templates: the single declared
    // source's kind, generic when several sources are declared
    let dialect = if tools_config.sources.len() == 1 {
        tools_config
            .sources
            .values()
            .next()
            .map(|s| s.dialect())
            .unwrap_or(Dialect::Generic)
    } else {
        Dialect::Generic
    };

    info!(
        transport = %config.transport,
        engine_transport = %config.engine_transport,
        dialect = %dialect,
        "Starting Toolbox MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Launch the engine; startup failure is fatal
    let supervisor = Arc::new(EngineSupervisor::new(
        EngineSettings {
            binary: config.engine_bin.clone(),
            mode: config.engine_mode(),
            extra_env: engine::engine_env(dialect, &env),
        },
        tools_config,
    ));
    if let Err(e) = supervisor.start().await {
        error!(error = %e, "Engine failed to start");
        return Err(e.into());
    }

    let router = Arc::new(ToolRouter::new(supervisor.clone(), dialect));

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(router, supervisor.clone());
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                router,
                supervisor.clone(),
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        supervisor.stop().await;
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
