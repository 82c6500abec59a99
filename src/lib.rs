//! Toolbox MCP Server Library
//!
//! This library provides an MCP (Model Context Protocol) proxy for the
//! database toolbox engine: it supervises the engine as a subprocess and
//! re-exposes its tools to AI assistants alongside a built-in catalog of
//! cross-database introspection tools.

pub mod config;
pub mod engine;
pub mod error;
pub mod mcp;
pub mod models;
pub mod router;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::ServerError;
pub use mcp::ProxyService;
pub use router::ToolRouter;
