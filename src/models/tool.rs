//! Tool-related data models.
//!
//! These types mirror the declarative tools document consumed by the
//! supervised engine: named sources, parameterized tools bound to one source,
//! and toolsets grouping tool names for export.

use crate::error::{ServerError, ServerResult};
use crate::models::source::SourceDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter value types accepted by declared and built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
}

impl ParamType {
    /// JSON Schema type name for this parameter type.
    pub fn json_type(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }

    /// Check a JSON value against this type.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }
}

/// A declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: Option<String>,
    /// Default: true - parameters must be opted out of explicitly
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_true() -> bool {
    true
}

/// A declared tool: a named operation bound to exactly one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Engine-specific tool kind, e.g. "postgres-sql"
    pub kind: String,
    /// Name of the source this tool executes against
    pub source: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Statement template; `{{name}}` references bind declared parameters
    #[serde(default)]
    pub statement: Option<String>,
}

impl ToolDescriptor {
    /// Parameter names referenced as `{{name}}` in the statement template.
    pub fn referenced_parameters(&self) -> Vec<String> {
        let Some(statement) = &self.statement else {
            return Vec::new();
        };
        let mut refs = Vec::new();
        let mut rest = statement.as_str();
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else { break };
            let name = after[..end].trim();
            if !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !refs.iter().any(|r| r == name)
            {
                refs.push(name.to_string());
            }
            rest = &after[end + 2..];
        }
        refs
    }
}

/// The resolved tools document handed to the supervised engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub sources: BTreeMap<String, SourceDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, ToolDescriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub toolsets: BTreeMap<String, Vec<String>>,
}

impl ToolsConfig {
    /// Validate structural references.
    ///
    /// Every tool must name an existing source, every `{{name}}` reference in
    /// a statement must appear in the tool's parameter list, and every
    /// toolset entry must name a declared tool.
    pub fn validate(&self) -> ServerResult<()> {
        for (name, tool) in &self.tools {
            if !self.sources.contains_key(&tool.source) {
                return Err(ServerError::config(format!(
                    "tool '{}' references unknown source '{}'",
                    name, tool.source
                )));
            }
            for referenced in tool.referenced_parameters() {
                if !tool.parameters.iter().any(|p| p.name == referenced) {
                    return Err(ServerError::config(format!(
                        "tool '{}' statement references undeclared parameter '{}'",
                        name, referenced
                    )));
                }
            }
        }
        for (set_name, members) in &self.toolsets {
            for member in members {
                if !self.tools.contains_key(member) {
                    return Err(ServerError::config(format!(
                        "toolset '{}' references unknown tool '{}'",
                        set_name, member
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_tool(tool: ToolDescriptor) -> ToolsConfig {
        let mut config = ToolsConfig::default();
        config
            .sources
            .insert("main-db".into(), SourceDescriptor::new("postgres"));
        config.tools.insert("my-tool".into(), tool);
        config
    }

    #[test]
    fn test_referenced_parameters_extracted() {
        let tool = ToolDescriptor {
            kind: "postgres-sql".into(),
            source: "main-db".into(),
            description: None,
            parameters: vec![],
            statement: Some("SELECT * FROM t WHERE id = {{id}} AND name = {{ name }}".into()),
        };
        assert_eq!(tool.referenced_parameters(), vec!["id", "name"]);
    }

    #[test]
    fn test_referenced_parameters_dedup_and_ignore_non_idents() {
        let tool = ToolDescriptor {
            kind: "postgres-sql".into(),
            source: "main-db".into(),
            description: None,
            parameters: vec![],
            statement: Some("{{id}} {{id}} {{not valid}}".into()),
        };
        assert_eq!(tool.referenced_parameters(), vec!["id"]);
    }

    #[test]
    fn test_validate_accepts_consistent_config() {
        let tool = ToolDescriptor {
            kind: "postgres-sql".into(),
            source: "main-db".into(),
            description: Some("lookup".into()),
            parameters: vec![Parameter {
                name: "id".into(),
                param_type: ParamType::Number,
                description: None,
                required: true,
            }],
            statement: Some("SELECT * FROM t WHERE id = {{id}}".into()),
        };
        let mut config = config_with_tool(tool);
        config
            .toolsets
            .insert("default".into(), vec!["my-tool".into()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_source() {
        let tool = ToolDescriptor {
            kind: "postgres-sql".into(),
            source: "missing-db".into(),
            description: None,
            parameters: vec![],
            statement: None,
        };
        let config = config_with_tool(tool);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown source"));
    }

    #[test]
    fn test_validate_rejects_undeclared_statement_parameter() {
        let tool = ToolDescriptor {
            kind: "postgres-sql".into(),
            source: "main-db".into(),
            description: None,
            parameters: vec![],
            statement: Some("SELECT {{column}} FROM t".into()),
        };
        let config = config_with_tool(tool);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("undeclared parameter"));
    }

    #[test]
    fn test_validate_rejects_unknown_toolset_member() {
        let mut config = ToolsConfig::default();
        config
            .sources
            .insert("main-db".into(), SourceDescriptor::new("postgres"));
        config
            .toolsets
            .insert("default".into(), vec!["ghost".into()]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown tool"));
    }

    #[test]
    fn test_param_type_matches() {
        assert!(ParamType::String.matches(&serde_json::json!("x")));
        assert!(ParamType::Number.matches(&serde_json::json!(3)));
        assert!(ParamType::Boolean.matches(&serde_json::json!(true)));
        assert!(ParamType::Array.matches(&serde_json::json!([1, 2])));
        assert!(!ParamType::Number.matches(&serde_json::json!("3")));
    }
}
