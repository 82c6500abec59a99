//! Built-in convenience tools.
//!
//! This module contains the compiled-in tool catalog and its per-dialect SQL
//! templates:
//! - `catalog`: tool names, descriptions, and parameter schemas
//! - `templates`: statement rendering keyed by the active dialect
//!
//! Dispatch to these tools happens in the router; execution always forwards
//! the rendered statement to the engine's `execute_sql` tool.

pub mod catalog;
pub mod templates;

pub use catalog::{BuiltinTool, CATALOG};
pub use templates::{clamp_limit, render_statement, EXECUTE_SQL_TOOL};
