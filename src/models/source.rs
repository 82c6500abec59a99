//! Source-related data models.
//!
//! A source is a named connection target consumed by the supervised engine.
//! The server never opens these connections itself; it only synthesizes and
//! validates the descriptors and derives the SQL dialect for the built-in
//! convenience tools.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized SQL dialect tag derived from a source `kind`.
///
/// Drives template selection and identifier quoting in the convenience tool
/// catalog. Closed set: new dialects are added here, not by string matching
/// on arbitrary kind names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// PostgreSQL and wire-compatible engines (AlloyDB, CloudSQL-PG, ...)
    PostgresFamily,
    /// MySQL and MariaDB
    MySql,
    Sqlite,
    Mssql,
    /// Fallback for kinds with no specific template set
    Generic,
}

impl Dialect {
    /// Normalize a source `kind` tag into a dialect.
    ///
    /// Unknown kinds fall back to `Generic` rather than failing: the engine
    /// still knows how to talk to them, only the convenience templates
    /// degrade to standard information_schema SQL.
    pub fn from_kind(kind: &str) -> Self {
        let lower = kind.to_lowercase();
        if lower.contains("postgres") || lower.starts_with("pg") || lower.contains("alloydb") {
            Self::PostgresFamily
        } else if lower.contains("mysql") || lower.contains("mariadb") {
            Self::MySql
        } else if lower.contains("sqlite") {
            Self::Sqlite
        } else if lower.contains("mssql") || lower.contains("sqlserver") {
            Self::Mssql
        } else {
            Self::Generic
        }
    }

    /// Canonical kind tag used when synthesizing a source for this dialect.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Self::PostgresFamily => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::Mssql => "mssql",
            Self::Generic => "generic",
        }
    }

    /// Quote an identifier (table, column, schema name) for this dialect.
    ///
    /// Double quotes for the default/postgres family, backticks for MySQL,
    /// brackets for MSSQL. Embedded quoting characters are doubled. These
    /// tools accept identifiers, not data values; value parameterization is
    /// the engine's concern.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Mssql => format!("[{}]", ident.replace(']', "]]")),
            Self::PostgresFamily | Self::Sqlite | Self::Generic => {
                format!("\"{}\"", ident.replace('"', "\"\""))
            }
        }
    }

    /// Escape a string for embedding as a single-quoted SQL literal.
    pub fn quote_literal(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind_tag())
    }
}

/// A named connection target handed to the supervised engine.
///
/// Optional fields are omitted from serialization when unset so that the
/// engine's own default/validation logic governs them; the synthesizer never
/// invents connection defaults that could mask misconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Engine-specific dialect tag, e.g. "postgres", "sqlite"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Database name, or file path for file-based engines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Sensitive - never logged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Engine-specific fields passed through untouched
    #[serde(flatten, default)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl SourceDescriptor {
    /// Create an empty descriptor for the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            host: None,
            port: None,
            database: None,
            user: None,
            password: None,
            extra: BTreeMap::new(),
        }
    }

    /// The dialect driving convenience-tool template selection.
    pub fn dialect(&self) -> Dialect {
        Dialect::from_kind(&self.kind)
    }
}
