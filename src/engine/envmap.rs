//! Environment variable mapping for the supervised engine.
//!
//! The engine reads dialect-specific variables (`POSTGRES_HOST`,
//! `MYSQL_PORT`, ...); callers commonly set the unified `DATABASE_*` family
//! instead. This module computes the exact variable set to inject into the
//! child process environment so that dialect-specific names are populated
//! from unified ones without ever overwriting anything already set.

use crate::engine::synth::EnvMap;
use crate::models::Dialect;
use std::collections::HashMap;

/// Unified variable suffixes and their meaning, in mapping order.
const UNIFIED: &[(&str, &str)] = &[
    ("DATABASE_HOST", "HOST"),
    ("DATABASE_PORT", "PORT"),
    ("DATABASE_NAME", "DATABASE"),
    ("DATABASE_USER", "USER"),
    ("DATABASE_PASSWORD", "PASSWORD"),
];

/// Dialect-specific variable prefix, if the dialect has one.
fn dialect_prefix(dialect: Dialect) -> Option<&'static str> {
    match dialect {
        Dialect::PostgresFamily => Some("POSTGRES"),
        Dialect::MySql => Some("MYSQL"),
        Dialect::Sqlite => Some("SQLITE"),
        Dialect::Mssql => Some("MSSQL"),
        Dialect::Generic => None,
    }
}

/// Unified suffixes that apply to a dialect.
///
/// File-based engines have no host/port/user/password; only the database
/// path maps through.
fn applicable(dialect: Dialect, meaning: &str) -> bool {
    match dialect {
        Dialect::Sqlite => meaning == "DATABASE",
        _ => true,
    }
}

/// Compute the variables to inject into the engine's environment.
///
/// Precedence, highest first: an already-set dialect-specific variable is
/// never overwritten; a unified variable is copied down when the dialect
/// name is unset; otherwise the variable stays absent and the engine applies
/// its own default. Idempotent: re-running against `env` plus the returned
/// map yields an empty map. Variables of other dialects are never touched.
pub fn engine_env(dialect: Dialect, env: &EnvMap) -> HashMap<String, String> {
    let Some(prefix) = dialect_prefix(dialect) else {
        return HashMap::new();
    };

    let mut injected = HashMap::new();
    for (unified, meaning) in UNIFIED {
        if !applicable(dialect, meaning) {
            continue;
        }
        let specific = format!("{prefix}_{meaning}");
        if env.contains_key(&specific) {
            continue;
        }
        if let Some(value) = env.get(*unified) {
            injected.insert(specific, value.clone());
        }
    }
    injected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_unified_copied_to_dialect_names() {
        let env = env(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_PORT", "5432"),
            ("DATABASE_PASSWORD", "hunter2"),
        ]);
        let injected = engine_env(Dialect::PostgresFamily, &env);
        assert_eq!(injected["POSTGRES_HOST"], "db.internal");
        assert_eq!(injected["POSTGRES_PORT"], "5432");
        assert_eq!(injected["POSTGRES_PASSWORD"], "hunter2");
        assert!(!injected.contains_key("POSTGRES_USER"));
        assert!(!injected.contains_key("POSTGRES_DATABASE"));
    }

    #[test]
    fn test_dialect_specific_never_overwritten() {
        let env = env(&[
            ("DATABASE_HOST", "unified-host"),
            ("MYSQL_HOST", "specific-host"),
            ("DATABASE_USER", "app"),
        ]);
        let injected = engine_env(Dialect::MySql, &env);
        assert!(!injected.contains_key("MYSQL_HOST"));
        assert_eq!(injected["MYSQL_USER"], "app");
    }

    #[test]
    fn test_database_name_maps_to_database_suffix() {
        let env = env(&[("DATABASE_NAME", "analytics")]);
        let injected = engine_env(Dialect::Mssql, &env);
        assert_eq!(injected["MSSQL_DATABASE"], "analytics");
    }

    #[test]
    fn test_sqlite_maps_only_database_path() {
        let env = env(&[
            ("DATABASE_NAME", "./my.db"),
            ("DATABASE_HOST", "ignored"),
            ("DATABASE_USER", "ignored"),
        ]);
        let injected = engine_env(Dialect::Sqlite, &env);
        assert_eq!(injected.len(), 1);
        assert_eq!(injected["SQLITE_DATABASE"], "./my.db");
    }

    #[test]
    fn test_generic_dialect_injects_nothing() {
        let env = env(&[("DATABASE_HOST", "db.internal")]);
        assert!(engine_env(Dialect::Generic, &env).is_empty());
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let mut env = env(&[
            ("DATABASE_HOST", "db.internal"),
            ("DATABASE_NAME", "app"),
        ]);
        let first = engine_env(Dialect::PostgresFamily, &env);
        assert!(!first.is_empty());

        env.extend(first);
        let second = engine_env(Dialect::PostgresFamily, &env);
        assert!(second.is_empty());
    }

    #[test]
    fn test_unrelated_dialect_variables_untouched() {
        let env = env(&[
            ("DATABASE_HOST", "db.internal"),
            ("MYSQL_HOST", "mysql-host"),
        ]);
        let injected = engine_env(Dialect::PostgresFamily, &env);
        // Mapping for postgres must not emit or depend on mysql variables
        assert!(injected.keys().all(|k| k.starts_with("POSTGRES_")));
    }
}
