//! Data models for the Toolbox MCP Server.
//!
//! This module re-exports all model types used throughout the application.

pub mod source;
pub mod tool;

// Re-export commonly used types
pub use source::{Dialect, SourceDescriptor};
pub use tool::{ParamType, Parameter, ToolDescriptor, ToolsConfig};
