//! Configuration synthesis for the supervised engine.
//!
//! Two entry points produce the resolved tools document: `resolve_file` parses
//! a declarative YAML file and applies environment variable substitution to
//! every string leaf, and `synthesize` builds a single-source document for a
//! known dialect from unified environment variables.
//!
//! The process environment is threaded in as an explicit map rather than read
//! ambiently, so both paths are testable by direct argument injection.

use crate::error::{ServerError, ServerResult};
use crate::models::{Dialect, SourceDescriptor, ToolsConfig};
use std::collections::HashMap;

/// Snapshot of the process environment.
pub type EnvMap = HashMap<String, String>;

/// Substitute `${NAME}` and `${NAME:default}` patterns in a single string.
///
/// Total by construction: an unset variable resolves to its default, or the
/// empty string when no default is given. Malformed patterns (no closing
/// brace, empty name) pass through verbatim. The output never contains a
/// substitutable pattern built from the input, so substitution is idempotent
/// on resolved strings.
pub fn substitute_str(input: &str, env: &EnvMap) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // No closing brace; keep the tail verbatim
            out.push_str(&rest[start..]);
            return out;
        };
        let pattern = &after[..end];
        let (name, default) = match pattern.split_once(':') {
            Some((name, default)) => (name, default),
            None => (pattern, ""),
        };
        if name.is_empty() {
            out.push_str(&rest[start..start + 2 + end + 1]);
        } else {
            match env.get(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(default),
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Apply `substitute_str` recursively to every string leaf of a YAML value.
///
/// Mappings, sequences, and scalars are all visited; depth is unbounded.
/// Mapping keys are left untouched - only values are substituted.
fn substitute_value(value: &mut serde_yaml::Value, env: &EnvMap) {
    match value {
        serde_yaml::Value::String(s) => {
            *s = substitute_str(s, env);
        }
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                substitute_value(item, env);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, env);
            }
        }
        _ => {}
    }
}

/// Resolve a declarative tools file into a validated `ToolsConfig`.
///
/// Parse errors and dangling structural references are `ConfigError`s;
/// variable substitution itself cannot fail.
pub fn resolve_file(content: &str, env: &EnvMap) -> ServerResult<ToolsConfig> {
    let mut doc: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| ServerError::config(format!("tools file is not valid YAML: {e}")))?;

    substitute_value(&mut doc, env);

    let config: ToolsConfig = serde_yaml::from_value(doc)
        .map_err(|e| ServerError::config(format!("tools file has unexpected structure: {e}")))?;

    config.validate()?;
    Ok(config)
}

/// Synthesize a single-source config for a known dialect.
///
/// Fields are populated only for environment variables that are actually set;
/// unset host/port/user/password/database are omitted entirely so the
/// engine's own defaults govern them.
pub fn synthesize(dialect: Dialect, env: &EnvMap) -> ServerResult<ToolsConfig> {
    let mut source = SourceDescriptor::new(dialect.kind_tag());

    source.host = env.get("DATABASE_HOST").cloned();
    source.port = match env.get("DATABASE_PORT") {
        Some(raw) => Some(raw.parse::<u16>().map_err(|_| {
            ServerError::config(format!("DATABASE_PORT is not a valid port: '{raw}'"))
        })?),
        None => None,
    };
    source.database = env.get("DATABASE_NAME").cloned();
    source.user = env.get("DATABASE_USER").cloned();
    source.password = env.get("DATABASE_PASSWORD").cloned();

    let mut config = ToolsConfig::default();
    config
        .sources
        .insert(format!("{}-db", dialect.kind_tag()), source);
    Ok(config)
}
