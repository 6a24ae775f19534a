//! Environment variable handling for Roomlink.
//!
//! Configuration values can be overridden with `ROOMLINK__<SECTION>__<KEY>`
//! variables. Values that should never live in a config file (database
//! credentials, for example) can be written as the marker `"secret_from_env"`
//! and are resolved from `ROOMLINK_SECRET_<SECTION>_<KEY>` or the plain
//! override variable at load time.

use std::env;

/// The default prefix for configuration environment variables
pub const DEFAULT_PREFIX: &str = "ROOMLINK";

/// The prefix for secret environment variables
pub const SECRET_PREFIX: &str = "ROOMLINK_SECRET";

/// The separator for configuration environment variables
pub const CONFIG_SEPARATOR: &str = "__";

/// The separator for secret environment variables
pub const SECRET_SEPARATOR: &str = "_";

/// Marker value replaced by an environment variable when the config is loaded
pub const SECRET_MARKER: &str = "secret_from_env";

/// Get the prefix for configuration environment variables
pub fn get_config_prefix() -> String {
    env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string())
}

/// Convert a configuration path to an environment variable name
///
/// `"server.port"` becomes `"ROOMLINK__SERVER__PORT"`.
pub fn config_path_to_env_var(path: &str) -> String {
    let prefix = get_config_prefix();
    let path = path.replace('.', CONFIG_SEPARATOR);
    format!("{}{}{}", prefix, CONFIG_SEPARATOR, path).to_uppercase()
}

/// Convert a secret path to an environment variable name
///
/// `"database.url"` becomes `"ROOMLINK_SECRET_DATABASE_URL"`.
pub fn secret_path_to_env_var(path: &str) -> String {
    let path = path.replace('.', SECRET_SEPARATOR);
    format!("{}{}{}", SECRET_PREFIX, SECRET_SEPARATOR, path).to_uppercase()
}

/// Paths containing "secret", "key", "password", "token" or "url" are treated
/// as secrets.
pub fn is_secret_path(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    path_lower.contains("secret")
        || path_lower.contains("key")
        || path_lower.contains("password")
        || path_lower.contains("token")
        || path_lower.ends_with("url")
}

/// Look up the environment value for a configuration path.
///
/// Secret paths try the secret naming pattern first and fall back to the
/// plain override variable.
pub fn get_env_var(path: &str) -> Option<String> {
    if is_secret_path(path) {
        if let Ok(value) = env::var(secret_path_to_env_var(path)) {
            return Some(value);
        }
    }
    env::var(config_path_to_env_var(path)).ok()
}

/// Replace every `"secret_from_env"` string in a JSON tree with its
/// environment value.
///
/// Returns the dotted paths that could not be resolved.
pub fn inject_env_vars(value: &mut serde_json::Value) -> Vec<String> {
    use serde_json::Value;

    fn walk(path: &mut Vec<String>, obj: &mut Value, missing: &mut Vec<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.clone());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let path_str = path.join(".");
                match get_env_var(&path_str) {
                    Some(env_val) => *s = env_val,
                    None => missing.push(path_str),
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    walk(&mut Vec::new(), value, &mut missing);
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_path_to_env_var() {
        assert_eq!(config_path_to_env_var("server.host"), "ROOMLINK__SERVER__HOST");
        assert_eq!(
            config_path_to_env_var("registry.code_ttl_minutes"),
            "ROOMLINK__REGISTRY__CODE_TTL_MINUTES"
        );
    }

    #[test]
    fn test_secret_path_to_env_var() {
        assert_eq!(
            secret_path_to_env_var("database.url"),
            "ROOMLINK_SECRET_DATABASE_URL"
        );
    }

    #[test]
    fn test_is_secret_path() {
        assert!(is_secret_path("database.url"));
        assert!(is_secret_path("admin.password"));
        assert!(!is_secret_path("server.host"));
        assert!(!is_secret_path("registry.max_code_attempts"));
    }

    #[test]
    fn test_inject_env_vars_resolves_marker() {
        env::set_var(
            "ROOMLINK_SECRET_TESTSECTION_API_TOKEN",
            "sqlite:from-env.db",
        );
        let mut value = json!({
            "testsection": { "api_token": "secret_from_env", "plain": "kept" },
            "other": { "password": "secret_from_env" }
        });

        let missing = inject_env_vars(&mut value);

        assert_eq!(value["testsection"]["api_token"], "sqlite:from-env.db");
        assert_eq!(value["testsection"]["plain"], "kept");
        assert_eq!(missing, vec!["other.password".to_string()]);
        env::remove_var("ROOMLINK_SECRET_TESTSECTION_API_TOKEN");
    }
}
