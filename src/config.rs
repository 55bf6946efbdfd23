//! Centralized configuration management for regcomments

use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Result, Context};

/// Smallest page size the comments endpoint accepts
pub const MIN_PAGE_SIZE: u32 = 5;
/// Largest page size the comments endpoint accepts
pub const MAX_PAGE_SIZE: u32 = 250;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that receives the CSV export and the attachments directory
    pub output_dir: PathBuf,
    /// Regulations.gov API settings
    pub api: ApiConfig,
    /// Rate limiting configuration
    pub rate_limits: RateLimits,
    /// HTTP client configuration
    pub http: HttpConfig,
}

/// Remote API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host of the API, without a trailing slash
    pub base_url: String,
    /// Number of comments requested per listing page
    pub page_size: u32,
    /// API key taken from the environment (optional, CLI flags take precedence)
    pub api_key: Option<String>,
}

/// Rate limiting configuration for the quota-tracked API
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Fixed wait once the quota is exhausted (seconds)
    pub cooldown_seconds: u64,
    /// Requests kept in reserve; fetching stops while `remaining - headroom <= 0`
    pub headroom: i64,
    /// Assumed quota before the first response header has been seen
    pub initial_quota: i64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.regulations.gov".to_string(),
            page_size: 25,
            api_key: None,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            cooldown_seconds: 3600,
            headroom: 2,
            initial_quota: 1000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 60,
            user_agent: "regcomments/0.1.0".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            api: ApiConfig::default(),
            rate_limits: RateLimits::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let output_dir = std::env::var("REGCOMMENTS_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let api = ApiConfig {
            base_url: std::env::var("REGCOMMENTS_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api.base_url),
            page_size: parse_env_var("REGCOMMENTS_PAGE_SIZE")?.unwrap_or(defaults.api.page_size),
            api_key: std::env::var("REGULATIONS_API_KEY").ok(),
        };

        let rate_limits = RateLimits {
            cooldown_seconds: parse_env_var("REGCOMMENTS_COOLDOWN_SECONDS")?
                .unwrap_or(defaults.rate_limits.cooldown_seconds),
            headroom: parse_env_var("REGCOMMENTS_QUOTA_HEADROOM")?
                .unwrap_or(defaults.rate_limits.headroom),
            initial_quota: parse_env_var("REGCOMMENTS_INITIAL_QUOTA")?
                .unwrap_or(defaults.rate_limits.initial_quota),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("REGCOMMENTS_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("REGCOMMENTS_USER_AGENT")
                .unwrap_or(defaults.http.user_agent),
        };

        Ok(Config {
            output_dir,
            api,
            rate_limits,
            http,
        })
    }

    /// Get the quota cooldown as Duration
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.rate_limits.cooldown_seconds)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.api.page_size) {
            return Err(anyhow::anyhow!(
                "Page size {} is outside the accepted range {}..={}",
                self.api.page_size,
                MIN_PAGE_SIZE,
                MAX_PAGE_SIZE
            ));
        }

        if self.rate_limits.initial_quota <= 0 {
            return Err(anyhow::anyhow!("Initial quota must be positive"));
        }

        // A quota check without a header resets to initial_quota, which must clear the headroom
        if self.rate_limits.initial_quota <= self.rate_limits.headroom {
            return Err(anyhow::anyhow!(
                "Initial quota {} must exceed the quota headroom {}",
                self.rate_limits.initial_quota,
                self.rate_limits.headroom
            ));
        }

        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Cannot create output directory: {}", self.output_dir.display()))?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.regulations.gov");
        assert_eq!(config.api.page_size, 25);
        assert_eq!(config.rate_limits.cooldown_seconds, 3600);
        assert_eq!(config.rate_limits.headroom, 2);
        assert_eq!(config.cooldown(), Duration::from_secs(3600));
        assert_eq!(config.http.timeout_seconds, 60);
    }

    #[test]
    fn test_config_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.output_dir = dir.path().join("out");
        config.validate().unwrap();
        assert!(config.output_dir.exists());

        config.api.page_size = 500;
        assert!(config.validate().is_err());

        config.api.page_size = 250;
        config.rate_limits.initial_quota = 0;
        assert!(config.validate().is_err());

        config.rate_limits.initial_quota = 2;
        assert!(config.validate().is_err());

        config.rate_limits.initial_quota = 3;
        config.validate().unwrap();
    }
}
