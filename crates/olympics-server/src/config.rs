//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use olympics_shared::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_HTTP_PORT, DEFAULT_POOL_SIZE, DEFAULT_SELF_ENDPOINT,
    DEFAULT_SELF_SCOPE,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// SQLite database file. A leading `sqlite://` is accepted and stripped.
    /// Env: `DATABASE_URL`
    /// Default: `./olympics.db`
    pub database_path: PathBuf,

    /// Number of pooled database connections (minimum 1).
    /// Env: `DB_POOL_SIZE`
    /// Default: `8`
    pub pool_size: usize,

    // -- Identity verification --

    /// Scope string shared with the Self app; passed through to the verifier.
    /// Env: `SELF_SCOPE`
    pub self_scope: String,

    /// Public URL the Self app posts proofs to; passed through to the verifier.
    /// Env: `SELF_ENDPOINT`
    pub self_endpoint: String,

    /// URL of the proof verification service.
    /// Env: `SELF_VERIFIER_URL`
    /// Default: unset (every proof is rejected).
    pub verifier_url: Option<String>,

    /// Accept mock passports (staging only).
    /// Env: `SELF_MOCK_PASSPORT` (true/false)
    /// Default: `false`
    pub mock_passport: bool,

    /// Timeout for a single verifier call.
    /// Env: `VERIFIER_TIMEOUT_SECS`
    /// Default: `10`
    pub verifier_timeout: Duration,

    /// Whether `POST /register` accepts a bare country claim without proof.
    /// Env: `ALLOW_UNVERIFIED` (true/false)
    /// Default: `true`
    pub allow_unverified: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            pool_size: DEFAULT_POOL_SIZE,
            self_scope: DEFAULT_SELF_SCOPE.to_string(),
            self_endpoint: DEFAULT_SELF_ENDPOINT.to_string(),
            verifier_url: None,
            mock_passport: false,
            verifier_timeout: Duration::from_secs(10),
            allow_unverified: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(url) = var("DATABASE_URL") {
            config.database_path = parse_database_url(&url);
        }

        if let Some(val) = var("DB_POOL_SIZE") {
            match val.parse::<usize>() {
                Ok(n) if n > 0 => config.pool_size = n,
                _ => tracing::warn!(value = %val, "Invalid DB_POOL_SIZE, using default"),
            }
        }

        // -- Identity verification --

        if let Some(scope) = var("SELF_SCOPE") {
            config.self_scope = scope;
        }

        if let Some(endpoint) = var("SELF_ENDPOINT") {
            config.self_endpoint = endpoint;
        }

        if let Some(url) = var("SELF_VERIFIER_URL") {
            if !url.is_empty() {
                config.verifier_url = Some(url);
            }
        }

        if let Some(val) = var("SELF_MOCK_PASSPORT") {
            config.mock_passport = val == "true" || val == "1";
        }

        if let Some(val) = var("VERIFIER_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.verifier_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(value = %val, "Invalid VERIFIER_TIMEOUT_SECS, using default"),
            }
        }

        if let Some(val) = var("ALLOW_UNVERIFIED") {
            config.allow_unverified = val != "false" && val != "0";
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

fn parse_database_url(url: &str) -> PathBuf {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.self_scope, "self-olympics-2024");
        assert!(config.verifier_url.is_none());
        assert!(config.allow_unverified);
    }

    #[test]
    fn test_env_overrides() {
        let config = config_from(&[
            ("HTTP_ADDR", "127.0.0.1:3001"),
            ("DATABASE_URL", "sqlite:///var/lib/olympics/votes.db"),
            ("DB_POOL_SIZE", "3"),
            ("SELF_VERIFIER_URL", "http://verifier:4000/verify"),
            ("SELF_MOCK_PASSPORT", "true"),
            ("ALLOW_UNVERIFIED", "false"),
        ]);

        assert_eq!(config.http_addr, ([127, 0, 0, 1], 3001).into());
        assert_eq!(config.database_path, PathBuf::from("/var/lib/olympics/votes.db"));
        assert_eq!(config.pool_size, 3);
        assert_eq!(config.verifier_url.as_deref(), Some("http://verifier:4000/verify"));
        assert!(config.mock_passport);
        assert!(!config.allow_unverified);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = config_from(&[
            ("HTTP_ADDR", "not an address"),
            ("DB_POOL_SIZE", "0"),
            ("SELF_VERIFIER_URL", ""),
            ("VERIFIER_TIMEOUT_SECS", "0"),
        ]);

        assert_eq!(config.http_addr, ServerConfig::default().http_addr);
        assert_eq!(config.pool_size, 8);
        assert!(config.verifier_url.is_none());
        assert_eq!(config.verifier_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_unparseable_timeout_keeps_default() {
        let config = config_from(&[("VERIFIER_TIMEOUT_SECS", "ten")]);
        assert_eq!(config.verifier_timeout, ServerConfig::default().verifier_timeout);
    }

    #[test]
    fn test_plain_database_path() {
        assert_eq!(parse_database_url("./data/o.db"), PathBuf::from("./data/o.db"));
        assert_eq!(parse_database_url("sqlite:o.db"), PathBuf::from("o.db"));
    }
}
