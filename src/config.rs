//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/catalog.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [query]
//! default_limit = 10
//! max_limit = 100
//!
//! [import]
//! max_upload_bytes = 10485760
//!
//! [auth.tokens]
//! "secret-token" = "user-a"
//! ```
//!
//! `[query]`, `[import]`, and `[auth]` are optional.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use catalog_core::query::{DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    #[serde(default = "default_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}
fn default_max_limit() -> i64 {
    MAX_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

/// Bearer tokens accepted by the server, mapped to the user id they
/// authenticate as.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_LIMIT).contains(&config.query.max_limit) {
        anyhow::bail!("query.max_limit must be in [1, {}]", MAX_LIMIT);
    }
    if !(1..=config.query.max_limit).contains(&config.query.default_limit) {
        anyhow::bail!(
            "query.default_limit must be in [1, {}]",
            config.query.max_limit
        );
    }

    if config.import.max_upload_bytes == 0 {
        anyhow::bail!("import.max_upload_bytes must be > 0");
    }

    for (token, user) in &config.auth.tokens {
        if token.trim().is_empty() {
            anyhow::bail!("auth.tokens must not contain an empty token");
        }
        if user.trim().is_empty() {
            anyhow::bail!("auth.tokens maps a token to an empty user id");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!(
            r#"
[db]
path = "/tmp/catalog.sqlite"

[server]
bind = "127.0.0.1:7340"
{}
"#,
            extra
        );
        let config: Config = toml::from_str(&content)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.query.default_limit, 10);
        assert_eq!(config.query.max_limit, 100);
        assert_eq!(config.import.max_upload_bytes, 10 * 1024 * 1024);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn test_auth_tokens() {
        let config = parse("[auth.tokens]\n\"tok-a\" = \"user-a\"\n").unwrap();
        assert_eq!(config.auth.tokens.get("tok-a").map(String::as_str), Some("user-a"));
    }

    #[test]
    fn test_rejects_limits_out_of_range() {
        assert!(parse("[query]\nmax_limit = 500\n").is_err());
        assert!(parse("[query]\ndefault_limit = 0\n").is_err());
        assert!(parse("[query]\nmax_limit = 20\ndefault_limit = 50\n").is_err());
    }

    #[test]
    fn test_rejects_empty_user() {
        assert!(parse("[auth.tokens]\n\"tok\" = \" \"\n").is_err());
    }
}
