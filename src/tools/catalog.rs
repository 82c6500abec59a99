//! Built-in convenience tool catalog.
//!
//! A fixed, compiled-in table of cross-database introspection tools. Each
//! entry declares its parameter schema here; the per-dialect SQL lives in
//! `templates`. Every entry executes by rendering a statement and forwarding
//! it to the engine's raw `execute_sql` tool - the catalog itself never
//! touches a database.

use crate::error::{ServerError, ServerResult};
use crate::models::ParamType;
use rmcp::model::{JsonObject, Tool};
use std::sync::Arc;

/// Parameter declaration for a built-in tool.
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub description: &'static str,
}

/// A built-in tool entry.
pub struct BuiltinTool {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

const TABLE: ParamSpec = ParamSpec {
    name: "table",
    param_type: ParamType::String,
    required: true,
    description: "Table name",
};

const SCHEMA: ParamSpec = ParamSpec {
    name: "schema",
    param_type: ParamType::String,
    required: false,
    description: "Schema name. Defaults to the dialect's default schema.",
};

const LIMIT: ParamSpec = ParamSpec {
    name: "limit",
    param_type: ParamType::Number,
    required: false,
    description: "Maximum number of rows to return (clamped to 1-100)",
};

/// The static catalog, in presentation order.
pub const CATALOG: &[BuiltinTool] = &[
    BuiltinTool {
        name: "list_databases",
        description: "List all databases visible to the active connection.",
        params: &[],
    },
    BuiltinTool {
        name: "list_schemas",
        description: "List all schemas in the active database.",
        params: &[],
    },
    BuiltinTool {
        name: "list_tables",
        description: "List tables in the active database, optionally filtered by schema.",
        params: &[SCHEMA],
    },
    BuiltinTool {
        name: "describe_table",
        description: "Show column definitions for a table.",
        params: &[TABLE, SCHEMA],
    },
    BuiltinTool {
        name: "preview_table",
        description: "Return the first rows of a table (default 5, max 100).",
        params: &[TABLE, SCHEMA, LIMIT],
    },
    BuiltinTool {
        name: "count_rows",
        description: "Count the rows in a table.",
        params: &[TABLE, SCHEMA],
    },
    BuiltinTool {
        name: "table_stats",
        description: "Estimated row count and storage statistics for a table.",
        params: &[TABLE, SCHEMA],
    },
    BuiltinTool {
        name: "search_tables",
        description: "Find tables whose name contains a pattern (default 20 results, max 100).",
        params: &[
            ParamSpec {
                name: "pattern",
                param_type: ParamType::String,
                required: true,
                description: "Substring to search for in table names",
            },
            LIMIT,
        ],
    },
    BuiltinTool {
        name: "list_columns",
        description: "List column names and types for a table.",
        params: &[TABLE, SCHEMA],
    },
    BuiltinTool {
        name: "sample_distinct_values",
        description: "Sample distinct values of a column (default 20, max 100).",
        params: &[
            TABLE,
            ParamSpec {
                name: "column",
                param_type: ParamType::String,
                required: true,
                description: "Column to sample",
            },
            SCHEMA,
            LIMIT,
        ],
    },
    BuiltinTool {
        name: "list_views",
        description: "List views in the active database, optionally filtered by schema.",
        params: &[SCHEMA],
    },
    BuiltinTool {
        name: "list_indexes",
        description: "List indexes on a table.",
        params: &[TABLE, SCHEMA],
    },
    BuiltinTool {
        name: "list_constraints",
        description: "List constraints on a table.",
        params: &[TABLE, SCHEMA],
    },
];

/// Look up a catalog entry by name.
pub fn find(name: &str) -> Option<&'static BuiltinTool> {
    CATALOG.iter().find(|t| t.name == name)
}

impl BuiltinTool {
    /// Build the JSON Schema for this tool's input.
    pub fn input_schema(&self) -> JsonObject {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                serde_json::json!({
                    "type": param.param_type.json_type(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.to_string()));
            }
        }

        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), serde_json::Value::String("object".into()));
        schema.insert("properties".into(), serde_json::Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), serde_json::Value::Array(required));
        }
        schema
    }

    /// Convert to an MCP tool descriptor for `tools/list`.
    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, Arc::new(self.input_schema()))
    }

    /// Check required parameters are present and all provided parameters
    /// have the declared type.
    pub fn validate_args(&self, args: &JsonObject) -> ServerResult<()> {
        for param in self.params {
            match args.get(param.name) {
                Some(value) => {
                    if !param.param_type.matches(value) {
                        return Err(ServerError::tool_invocation(
                            self.name,
                            format!(
                                "parameter '{}' must be of type {}",
                                param.name,
                                param.param_type.json_type()
                            ),
                        ));
                    }
                }
                None if param.required => {
                    return Err(ServerError::tool_invocation(
                        self.name,
                        format!("missing required parameter '{}'", param.name),
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_has_thirteen_tools_with_unique_names() {
        assert_eq!(CATALOG.len(), 13);
        let mut names: Vec<_> = CATALOG.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 13);
    }

    #[test]
    fn test_find_known_and_unknown() {
        assert!(find("describe_table").is_some());
        assert!(find("no_such_tool").is_none());
    }

    #[test]
    fn test_input_schema_lists_required_params() {
        let tool = find("preview_table").unwrap();
        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["table"].is_object());
        assert!(schema["properties"]["limit"].is_object());
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "table");
    }

    #[test]
    fn test_input_schema_omits_empty_required() {
        let tool = find("list_databases").unwrap();
        let schema = tool.input_schema();
        assert!(!schema.contains_key("required"));
    }

    #[test]
    fn test_validate_args_missing_required() {
        let tool = find("describe_table").unwrap();
        let err = tool.validate_args(&JsonObject::new()).unwrap_err();
        assert!(err.to_string().contains("missing required parameter 'table'"));
    }

    #[test]
    fn test_validate_args_wrong_type() {
        let tool = find("preview_table").unwrap();
        let mut args = JsonObject::new();
        args.insert("table".into(), serde_json::json!("users"));
        args.insert("limit".into(), serde_json::json!("ten"));
        let err = tool.validate_args(&args).unwrap_err();
        assert!(err.to_string().contains("'limit' must be of type number"));
    }

    #[test]
    fn test_validate_args_accepts_valid() {
        let tool = find("sample_distinct_values").unwrap();
        let mut args = JsonObject::new();
        args.insert("table".into(), serde_json::json!("users"));
        args.insert("column".into(), serde_json::json!("email"));
        args.insert("limit".into(), serde_json::json!(10));
        assert!(tool.validate_args(&args).is_ok());
    }
}
