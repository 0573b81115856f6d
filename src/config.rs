//! Configuration: deserialization, environment overrides and validation.
//!
//! The configuration is built once at process start and then shared
//! read-only. Precedence, lowest first: built-in defaults, the optional
//! `sportsdb.toml` file, then the `THESPORTSDB_API_KEY` / `USER_AGENT`
//! environment variables.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use reqwest::header::HeaderValue;
use serde::Deserialize;

use crate::error::SportsDbError;

/// Environment variable overriding the API key path segment.
pub const API_KEY_ENV: &str = "THESPORTSDB_API_KEY";

/// Environment variable overriding the User-Agent header.
pub const USER_AGENT_ENV: &str = "USER_AGENT";

pub const DEFAULT_BASE_URL: &str = "https://www.thesportsdb.com/api/v1/json";

/// TheSportsDB's public test key.
pub const DEFAULT_API_KEY: &str = "123";

pub const DEFAULT_USER_AGENT: &str = "SportsDB-MCP-Server/1.0";

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Immutable configuration for the TheSportsDB client, parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SportsDbConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout; individual calls may override it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key() -> String {
    DEFAULT_API_KEY.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for SportsDbConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SportsDbConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| SportsDbError::Config(e.to_string()))
    }

    /// Read and parse a `sportsdb.toml` file.
    pub async fn load(path: &Path) -> crate::Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            SportsDbError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `THESPORTSDB_API_KEY` and `USER_AGENT` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Empty values are ignored so that `USER_AGENT=` does not blank the header.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!(var = API_KEY_ENV, "API key overridden from environment");
            self.api_key = key;
        }
        if let Some(agent) = lookup(USER_AGENT_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!(var = USER_AGENT_ENV, user_agent = %agent, "User-Agent overridden from environment");
            self.user_agent = agent;
        }
    }

    /// Default per-request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the config, failing fast before any client is built.
    pub fn validate(&self) -> crate::Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            SportsDbError::Config(format!("base_url '{}' is not a valid URL: {}", self.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SportsDbError::Config(format!(
                "base_url '{}' must use http or https",
                self.base_url
            )));
        }

        // The key is a single path segment
        if self.api_key.is_empty() || self.api_key.contains('/') {
            return Err(SportsDbError::Config(
                "api_key must be a non-empty string without '/'".to_string(),
            ));
        }

        if HeaderValue::from_str(&self.user_agent).is_err() {
            return Err(SportsDbError::Config(format!(
                "user_agent '{}' is not a valid header value",
                self.user_agent
            )));
        }

        if self.timeout_secs == 0 {
            return Err(SportsDbError::Config(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SportsDbConfig::default();
        assert_eq!(config.base_url, "https://www.thesportsdb.com/api/v1/json");
        assert_eq!(config.api_key, "123");
        assert_eq!(config.user_agent, "SportsDB-MCP-Server/1.0");
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = SportsDbConfig::from_toml_str("").unwrap();
        assert_eq!(config, SportsDbConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = SportsDbConfig::from_toml_str(
            r#"
            api_key = "987654"
            timeout_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.api_key, "987654");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = SportsDbConfig::from_toml_str(r#"apikey = "typo""#);
        assert!(matches!(result, Err(SportsDbError::Config(_))));
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = SportsDbConfig::from_toml_str(r#"api_key = "from-file""#).unwrap();
        config.apply_overrides_from(lookup_from(&[
            ("THESPORTSDB_API_KEY", "from-env"),
            ("USER_AGENT", "my-agent/2.0"),
        ]));
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.user_agent, "my-agent/2.0");
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = SportsDbConfig::default();
        config.apply_overrides_from(lookup_from(&[
            ("THESPORTSDB_API_KEY", ""),
            ("USER_AGENT", ""),
        ]));
        assert_eq!(config, SportsDbConfig::default());
    }

    #[test]
    fn test_invalid_base_url() {
        let config = SportsDbConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(
            matches!(config.validate(), Err(SportsDbError::Config(msg)) if msg.contains("base_url"))
        );
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let config = SportsDbConfig {
            base_url: "ftp://example.com/api".to_string(),
            ..Default::default()
        };
        assert!(
            matches!(config.validate(), Err(SportsDbError::Config(msg)) if msg.contains("http"))
        );
    }

    #[test]
    fn test_api_key_with_slash_rejected() {
        let config = SportsDbConfig {
            api_key: "12/3".to_string(),
            ..Default::default()
        };
        assert!(
            matches!(config.validate(), Err(SportsDbError::Config(msg)) if msg.contains("api_key"))
        );
    }

    #[test]
    fn test_user_agent_with_newline_rejected() {
        let config = SportsDbConfig {
            user_agent: "bad\nagent".to_string(),
            ..Default::default()
        };
        assert!(
            matches!(config.validate(), Err(SportsDbError::Config(msg)) if msg.contains("user_agent"))
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SportsDbConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SportsDbError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"user_agent = "file-agent/1.0""#).unwrap();
        let config = SportsDbConfig::load(file.path()).await.unwrap();
        assert_eq!(config.user_agent, "file-agent/1.0");
        assert_eq!(config.api_key, DEFAULT_API_KEY);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = SportsDbConfig::load(Path::new("/nonexistent/sportsdb.toml")).await;
        assert!(
            matches!(result, Err(SportsDbError::Config(msg)) if msg.contains("failed to read"))
        );
    }
}
