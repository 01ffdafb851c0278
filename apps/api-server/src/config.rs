//! Application configuration loaded from environment variables.

use std::env;

use postpilot_core::domain::DEFAULT_MONTHLY_CREDITS;
use postpilot_core::services::DEFAULT_VERSION_CAP;
use postpilot_infra::{DatabaseConfig, GenerationConfig, JwtConfig, LinkedInConfig};

#[cfg(feature = "rate-limit")]
use postpilot_infra::RateLimitConfig;

/// Credit and versioning rules.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Credits granted at the start of every calendar month.
    pub monthly_credits: i32,
    /// Maximum number of versions a post may hold.
    pub version_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            monthly_credits: DEFAULT_MONTHLY_CREDITS,
            version_cap: DEFAULT_VERSION_CAP,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub generation: GenerationConfig,
    pub linkedin: LinkedInConfig,
    pub identity: JwtConfig,
    pub engine: EngineConfig,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            monthly_credits: env::var("MONTHLY_CREDITS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &i32| *n >= 0)
                .unwrap_or(defaults.monthly_credits),
            version_cap: env::var("MAX_POST_VERSIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &u32| *n >= 1)
                .unwrap_or(defaults.version_cap),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            generation: GenerationConfig::from_env(),
            linkedin: LinkedInConfig::from_env(),
            identity: JwtConfig::from_env(),
            engine,
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
