//! Per-dialect SQL templates for the built-in tools.
//!
//! Template selection is keyed by the closed `Dialect` enum with a generic
//! fallback; new dialects are added as enum cases, never by string matching.
//! Caller-supplied identifiers are embedded directly with dialect-specific
//! quoting; these tools accept identifiers, not data values. Pattern text
//! embedded as a literal escapes single quotes by doubling.

use crate::error::{ServerError, ServerResult};
use crate::models::Dialect;
use rmcp::model::JsonObject;

/// The engine's generic raw-statement tool every catalog entry forwards to.
pub const EXECUTE_SQL_TOOL: &str = "execute_sql";

/// Bounds for row-limit parameters.
pub const MIN_LIMIT: i64 = 1;
pub const MAX_LIMIT: i64 = 100;

/// Default limits per tool.
pub const DEFAULT_PREVIEW_LIMIT: i64 = 5;
pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const DEFAULT_SAMPLE_LIMIT: i64 = 20;

/// Clamp a requested row limit into `[MIN_LIMIT, MAX_LIMIT]`.
pub fn clamp_limit(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Render the final statement for a built-in tool.
///
/// Arguments must already be validated against the catalog entry; a missing
/// required argument here is an internal error, not a user-facing one.
pub fn render_statement(
    tool_name: &str,
    dialect: Dialect,
    args: &JsonObject,
) -> ServerResult<String> {
    match tool_name {
        "list_databases" => Ok(list_databases(dialect)),
        "list_schemas" => Ok(list_schemas(dialect)),
        "list_tables" => Ok(list_tables(dialect, schema(args))),
        "describe_table" => Ok(describe_table(dialect, &table(args, tool_name)?, schema(args))),
        "preview_table" => Ok(preview_table(
            dialect,
            &table(args, tool_name)?,
            schema(args),
            clamp_limit(limit(args), DEFAULT_PREVIEW_LIMIT),
        )),
        "count_rows" => Ok(count_rows(dialect, &table(args, tool_name)?, schema(args))),
        "table_stats" => Ok(table_stats(dialect, &table(args, tool_name)?, schema(args))),
        "search_tables" => Ok(search_tables(
            dialect,
            &string_arg(args, "pattern", tool_name)?,
            clamp_limit(limit(args), DEFAULT_SEARCH_LIMIT),
        )),
        "list_columns" => Ok(list_columns(dialect, &table(args, tool_name)?, schema(args))),
        "sample_distinct_values" => Ok(sample_distinct_values(
            dialect,
            &table(args, tool_name)?,
            &string_arg(args, "column", tool_name)?,
            schema(args),
            clamp_limit(limit(args), DEFAULT_SAMPLE_LIMIT),
        )),
        "list_views" => Ok(list_views(dialect, schema(args))),
        "list_indexes" => Ok(list_indexes(dialect, &table(args, tool_name)?, schema(args))),
        "list_constraints" => Ok(list_constraints(
            dialect,
            &table(args, tool_name)?,
            schema(args),
        )),
        other => Err(ServerError::internal(format!(
            "no template for tool '{other}'"
        ))),
    }
}

// =============================================================================
// Argument helpers
// =============================================================================

fn string_arg(args: &JsonObject, name: &str, tool: &str) -> ServerResult<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| ServerError::internal(format!("tool '{tool}' missing argument '{name}'")))
}

fn table(args: &JsonObject, tool: &str) -> ServerResult<String> {
    string_arg(args, "table", tool)
}

fn schema(args: &JsonObject) -> Option<String> {
    args.get("schema")
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn limit(args: &JsonObject) -> Option<i64> {
    let value = args.get("limit")?;
    value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
}

/// Schema-qualified, dialect-quoted table reference.
fn qualified(dialect: Dialect, schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(s) => format!(
            "{}.{}",
            dialect.quote_ident(s),
            dialect.quote_ident(table)
        ),
        None => dialect.quote_ident(table),
    }
}

/// Schema filter clause against information_schema-style catalogs.
///
/// Postgres defaults to 'public', MySQL to the current database, MSSQL and
/// generic engines apply no filter when the schema is unspecified.
fn schema_filter(dialect: Dialect, schema: Option<&str>, column: &str) -> String {
    match (schema, dialect) {
        (Some(s), _) => format!(" AND {column} = {}", dialect.quote_literal(s)),
        (None, Dialect::PostgresFamily) => format!(" AND {column} = 'public'"),
        (None, Dialect::MySql) => format!(" AND {column} = DATABASE()"),
        (None, _) => String::new(),
    }
}

// =============================================================================
// Statement templates
// =============================================================================

fn list_databases(dialect: Dialect) -> String {
    match dialect {
        Dialect::PostgresFamily => {
            "SELECT datname AS database_name FROM pg_database \
             WHERE datistemplate = false ORDER BY datname"
                .to_string()
        }
        Dialect::MySql => "SHOW DATABASES".to_string(),
        Dialect::Sqlite => "PRAGMA database_list".to_string(),
        Dialect::Mssql => {
            "SELECT name AS database_name FROM sys.databases ORDER BY name".to_string()
        }
        Dialect::Generic => {
            "SELECT DISTINCT table_catalog AS database_name \
             FROM information_schema.tables ORDER BY table_catalog"
                .to_string()
        }
    }
}

fn list_schemas(dialect: Dialect) -> String {
    match dialect {
        Dialect::MySql => "SHOW DATABASES".to_string(),
        Dialect::Sqlite => "PRAGMA database_list".to_string(),
        Dialect::Mssql => "SELECT name AS schema_name FROM sys.schemas ORDER BY name".to_string(),
        Dialect::PostgresFamily | Dialect::Generic => {
            "SELECT schema_name FROM information_schema.schemata ORDER BY schema_name".to_string()
        }
    }
}

fn list_tables(dialect: Dialect, schema: Option<String>) -> String {
    match dialect {
        Dialect::Sqlite => "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            .to_string(),
        _ => format!(
            "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE'{} ORDER BY table_schema, table_name",
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
    }
}

fn describe_table(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    match dialect {
        // PRAGMA arguments are taken verbatim; quoting would change the name
        Dialect::Sqlite => format!("PRAGMA table_info({table})"),
        _ => format!(
            "SELECT column_name, data_type, is_nullable, column_default \
             FROM information_schema.columns \
             WHERE table_name = {}{} ORDER BY ordinal_position",
            dialect.quote_literal(table),
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
    }
}

fn preview_table(dialect: Dialect, table: &str, schema: Option<String>, limit: i64) -> String {
    let target = qualified(dialect, schema.as_deref(), table);
    match dialect {
        Dialect::Mssql => format!("SELECT TOP {limit} * FROM {target}"),
        _ => format!("SELECT * FROM {target} LIMIT {limit}"),
    }
}

fn count_rows(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    format!(
        "SELECT COUNT(*) AS row_count FROM {}",
        qualified(dialect, schema.as_deref(), table)
    )
}

fn table_stats(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    match dialect {
        Dialect::PostgresFamily => format!(
            "SELECT c.reltuples::bigint AS estimated_rows, \
             pg_total_relation_size(c.oid) AS total_bytes, \
             pg_indexes_size(c.oid) AS index_bytes \
             FROM pg_class c JOIN pg_namespace n ON n.oid = c.relnamespace \
             WHERE c.relname = {} AND n.nspname = {}",
            dialect.quote_literal(table),
            dialect.quote_literal(schema.as_deref().unwrap_or("public"))
        ),
        Dialect::MySql => format!(
            "SELECT table_rows AS estimated_rows, data_length AS data_bytes, \
             index_length AS index_bytes FROM information_schema.tables \
             WHERE table_name = {}{}",
            dialect.quote_literal(table),
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
        Dialect::Mssql => format!(
            "SELECT SUM(p.rows) AS estimated_rows FROM sys.partitions p \
             JOIN sys.tables t ON p.object_id = t.object_id \
             WHERE t.name = {} AND p.index_id IN (0, 1)",
            dialect.quote_literal(table)
        ),
        // No portable size catalog; fall back to an exact count
        Dialect::Sqlite | Dialect::Generic => count_rows(dialect, table, schema),
    }
}

fn search_tables(dialect: Dialect, pattern: &str, limit: i64) -> String {
    let like = dialect.quote_literal(&format!("%{pattern}%"));
    match dialect {
        Dialect::Sqlite => format!(
            "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name LIKE {like} ORDER BY name LIMIT {limit}"
        ),
        Dialect::Mssql => format!(
            "SELECT TOP {limit} table_schema, table_name \
             FROM information_schema.tables WHERE table_name LIKE {like} \
             ORDER BY table_name"
        ),
        _ => format!(
            "SELECT table_schema, table_name FROM information_schema.tables \
             WHERE table_name LIKE {like} ORDER BY table_name LIMIT {limit}"
        ),
    }
}

fn list_columns(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    match dialect {
        Dialect::Sqlite => format!("PRAGMA table_info({table})"),
        _ => format!(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = {}{} ORDER BY ordinal_position",
            dialect.quote_literal(table),
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
    }
}

fn sample_distinct_values(
    dialect: Dialect,
    table: &str,
    column: &str,
    schema: Option<String>,
    limit: i64,
) -> String {
    let target = qualified(dialect, schema.as_deref(), table);
    let col = dialect.quote_ident(column);
    match dialect {
        Dialect::Mssql => format!("SELECT DISTINCT TOP {limit} {col} FROM {target}"),
        _ => format!("SELECT DISTINCT {col} FROM {target} LIMIT {limit}"),
    }
}

fn list_views(dialect: Dialect, schema: Option<String>) -> String {
    match dialect {
        Dialect::Sqlite => {
            "SELECT name AS view_name FROM sqlite_master WHERE type = 'view' ORDER BY name"
                .to_string()
        }
        _ => format!(
            "SELECT table_schema, table_name FROM information_schema.views \
             WHERE 1 = 1{} ORDER BY table_schema, table_name",
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
    }
}

fn list_indexes(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    match dialect {
        Dialect::PostgresFamily => format!(
            "SELECT indexname, indexdef FROM pg_indexes \
             WHERE tablename = {}{} ORDER BY indexname",
            dialect.quote_literal(table),
            schema_filter(dialect, schema.as_deref(), "schemaname")
        ),
        Dialect::MySql => format!(
            "SHOW INDEX FROM {}",
            qualified(dialect, schema.as_deref(), table)
        ),
        Dialect::Sqlite => format!("PRAGMA index_list({table})"),
        Dialect::Mssql => format!(
            "SELECT i.name AS index_name, i.type_desc, i.is_unique \
             FROM sys.indexes i JOIN sys.tables t ON i.object_id = t.object_id \
             WHERE t.name = {} AND i.name IS NOT NULL ORDER BY i.name",
            dialect.quote_literal(table)
        ),
        Dialect::Generic => format!(
            "SELECT index_name FROM information_schema.statistics \
             WHERE table_name = {} ORDER BY index_name",
            dialect.quote_literal(table)
        ),
    }
}

fn list_constraints(dialect: Dialect, table: &str, schema: Option<String>) -> String {
    match dialect {
        Dialect::Sqlite => format!("PRAGMA foreign_key_list({table})"),
        _ => format!(
            "SELECT constraint_name, constraint_type \
             FROM information_schema.table_constraints \
             WHERE table_name = {}{} ORDER BY constraint_name",
            dialect.quote_literal(table),
            schema_filter(dialect, schema.as_deref(), "table_schema")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, serde_json::Value)]) -> JsonObject {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_clamp_limit_bounds() {
        assert_eq!(clamp_limit(Some(-5), DEFAULT_PREVIEW_LIMIT), 1);
        assert_eq!(clamp_limit(Some(0), DEFAULT_PREVIEW_LIMIT), 1);
        assert_eq!(clamp_limit(Some(9999), DEFAULT_PREVIEW_LIMIT), 100);
        assert_eq!(clamp_limit(Some(50), DEFAULT_PREVIEW_LIMIT), 50);
        assert_eq!(clamp_limit(None, DEFAULT_PREVIEW_LIMIT), 5);
        assert_eq!(clamp_limit(None, DEFAULT_SEARCH_LIMIT), 20);
    }

    #[test]
    fn test_describe_table_sqlite_renders_pragma() {
        let sql = render_statement(
            "describe_table",
            Dialect::Sqlite,
            &args(&[("table", serde_json::json!("users"))]),
        )
        .unwrap();
        assert_eq!(sql, "PRAGMA table_info(users)");
    }

    #[test]
    fn test_describe_table_postgres_uses_information_schema() {
        let sql = render_statement(
            "describe_table",
            Dialect::PostgresFamily,
            &args(&[("table", serde_json::json!("users"))]),
        )
        .unwrap();
        assert!(sql.contains("information_schema.columns"));
        assert!(sql.contains("table_name = 'users'"));
        assert!(sql.contains("table_schema = 'public'"));
    }

    #[test]
    fn test_preview_table_quoting_per_dialect() {
        let a = args(&[("table", serde_json::json!("users"))]);
        assert_eq!(
            render_statement("preview_table", Dialect::PostgresFamily, &a).unwrap(),
            "SELECT * FROM \"users\" LIMIT 5"
        );
        assert_eq!(
            render_statement("preview_table", Dialect::MySql, &a).unwrap(),
            "SELECT * FROM `users` LIMIT 5"
        );
        assert_eq!(
            render_statement("preview_table", Dialect::Mssql, &a).unwrap(),
            "SELECT TOP 5 * FROM [users]"
        );
    }

    #[test]
    fn test_preview_table_clamps_limit() {
        let sql = render_statement(
            "preview_table",
            Dialect::PostgresFamily,
            &args(&[
                ("table", serde_json::json!("users")),
                ("limit", serde_json::json!(9999)),
            ]),
        )
        .unwrap();
        assert!(sql.ends_with("LIMIT 100"));

        let sql = render_statement(
            "preview_table",
            Dialect::PostgresFamily,
            &args(&[
                ("table", serde_json::json!("users")),
                ("limit", serde_json::json!(-5)),
            ]),
        )
        .unwrap();
        assert!(sql.ends_with("LIMIT 1"));
    }

    #[test]
    fn test_preview_table_schema_qualified() {
        let sql = render_statement(
            "preview_table",
            Dialect::PostgresFamily,
            &args(&[
                ("table", serde_json::json!("users")),
                ("schema", serde_json::json!("app")),
            ]),
        )
        .unwrap();
        assert!(sql.contains("FROM \"app\".\"users\""));
    }

    #[test]
    fn test_search_tables_escapes_pattern_literal() {
        let sql = render_statement(
            "search_tables",
            Dialect::PostgresFamily,
            &args(&[("pattern", serde_json::json!("o'clock"))]),
        )
        .unwrap();
        assert!(sql.contains("LIKE '%o''clock%'"));
        assert!(sql.ends_with("LIMIT 20"));
    }

    #[test]
    fn test_count_rows_generic() {
        let sql = render_statement(
            "count_rows",
            Dialect::Generic,
            &args(&[("table", serde_json::json!("events"))]),
        )
        .unwrap();
        assert_eq!(sql, "SELECT COUNT(*) AS row_count FROM \"events\"");
    }

    #[test]
    fn test_table_stats_falls_back_to_count_for_sqlite() {
        let sql = render_statement(
            "table_stats",
            Dialect::Sqlite,
            &args(&[("table", serde_json::json!("events"))]),
        )
        .unwrap();
        assert!(sql.starts_with("SELECT COUNT(*)"));
    }

    #[test]
    fn test_sample_distinct_values_mssql_uses_top() {
        let sql = render_statement(
            "sample_distinct_values",
            Dialect::Mssql,
            &args(&[
                ("table", serde_json::json!("users")),
                ("column", serde_json::json!("country")),
            ]),
        )
        .unwrap();
        assert_eq!(sql, "SELECT DISTINCT TOP 20 [country] FROM [users]");
    }

    #[test]
    fn test_list_tables_mysql_defaults_to_current_database() {
        let sql = render_statement("list_tables", Dialect::MySql, &JsonObject::new()).unwrap();
        assert!(sql.contains("table_schema = DATABASE()"));
    }

    #[test]
    fn test_list_indexes_per_dialect() {
        let a = args(&[("table", serde_json::json!("users"))]);
        assert!(render_statement("list_indexes", Dialect::PostgresFamily, &a)
            .unwrap()
            .contains("pg_indexes"));
        assert!(render_statement("list_indexes", Dialect::MySql, &a)
            .unwrap()
            .starts_with("SHOW INDEX FROM `users`"));
        assert_eq!(
            render_statement("list_indexes", Dialect::Sqlite, &a).unwrap(),
            "PRAGMA index_list(users)"
        );
    }

    #[test]
    fn test_unknown_tool_is_internal_error() {
        let err = render_statement("no_such_tool", Dialect::Generic, &JsonObject::new())
            .unwrap_err();
        assert!(matches!(err, ServerError::Internal { .. }));
    }
}
