//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_API_URL` - Backend base URL (default: `http://127.0.0.1:8080`)
//! - `STOREFRONT_TOKEN_DIR` - Directory holding the persisted bearer token
//!   (default: the platform data directory, e.g. `~/.local/share/soil2spoon`)
//! - `STOREFRONT_USER_AGENT` - HTTP user agent override
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No data directory available; set STOREFRONT_TOKEN_DIR")]
    NoDataDir,
}

/// Storefront client configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, without a trailing slash
    pub api_url: String,
    /// Explicit token directory (falls back to the platform data dir)
    pub token_dir: Option<PathBuf>,
    /// User agent sent with every request
    pub user_agent: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api_url", &self.api_url)
            .field("token_dir", &self.token_dir)
            .field("user_agent", &self.user_agent)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl StorefrontConfig {
    /// Build a configuration that talks to `api_url` with every other
    /// setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url("STOREFRONT_API_URL", api_url)?,
            token_dir: None,
            user_agent: default_user_agent(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = normalize_api_url(
            "STOREFRONT_API_URL",
            &get_env_or_default("STOREFRONT_API_URL", DEFAULT_API_URL),
        )?;
        let token_dir = get_optional_env("STOREFRONT_TOKEN_DIR").map(PathBuf::from);
        let user_agent =
            get_optional_env("STOREFRONT_USER_AGENT").unwrap_or_else(default_user_agent);

        Ok(Self {
            api_url,
            token_dir,
            user_agent,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Directory where the bearer token file lives.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoDataDir` when no override is set and the
    /// platform has no home directory.
    pub fn resolve_token_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.token_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("in", "soil2spoon", "soil2spoon")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn default_user_agent() -> String {
    format!("soil2spoon-storefront/{}", env!("CARGO_PKG_VERSION"))
}

/// Validate a base URL and strip any trailing slash so paths can be appended.
fn normalize_api_url(var_name: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_trailing_slash() {
        let config = StorefrontConfig::new("http://localhost:8081/").unwrap();
        assert_eq!(config.api_url, "http://localhost:8081");
    }

    #[test]
    fn test_new_keeps_path_prefix() {
        let config = StorefrontConfig::new("https://shop.example/backend/").unwrap();
        assert_eq!(config.api_url, "https://shop.example/backend");
    }

    #[test]
    fn test_new_rejects_invalid_urls() {
        assert!(matches!(
            StorefrontConfig::new("not a url"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            StorefrontConfig::new("ftp://files.example"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_explicit_token_dir_wins() {
        let mut config = StorefrontConfig::new(DEFAULT_API_URL).unwrap();
        config.token_dir = Some(PathBuf::from("/tmp/s2s"));
        assert_eq!(
            config.resolve_token_dir().unwrap(),
            PathBuf::from("/tmp/s2s")
        );
    }

    #[test]
    fn test_default_user_agent_names_crate() {
        assert!(default_user_agent().starts_with("soil2spoon-storefront/"));
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let mut config = StorefrontConfig::new(DEFAULT_API_URL).unwrap();
        config.sentry_dsn = Some("https://key@o1.ingest.sentry.io/2".to_string());
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("key@"));
    }
}
