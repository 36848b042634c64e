//! Configuration loader with layered sources.

use crate::{AppConfig, CacheConfig};
use config::{Config, ConfigError, Environment, File};
use l2cache_core::{L2Error, L2Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Environment variable prefix for overrides (`L2CACHE_CACHE__TTL_SECONDS=30`).
pub const ENV_PREFIX: &str = "L2CACHE";

/// Configuration loader with runtime refresh support.
///
/// Cloning is cheap and every clone observes the same configuration, so a
/// `reload` or `update` through one handle is visible to all of them.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: Option<String>,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `{dir}/default.toml`
    /// 2. `{dir}/{environment}.toml`
    /// 3. `{dir}/local.toml`
    /// 4. Environment variables with the `L2CACHE_` prefix
    pub fn new(config_dir: impl Into<String>) -> L2Result<Self> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir: Some(config_dir),
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> L2Result<Self> {
        Self::new("./config")
    }

    /// Creates a loader over an already-built configuration.
    ///
    /// `reload` is a no-op for such a loader; use `update` instead.
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            config_dir: None,
        }
    }

    /// Returns a snapshot of the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Returns the cache policy section as currently configured.
    pub async fn cache(&self) -> CacheConfig {
        self.config.read().await.cache.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> L2Result<()> {
        let Some(dir) = &self.config_dir else {
            debug!("Configuration has no source directory, skipping reload");
            return Ok(());
        };

        let new_config = Self::load_config(dir)?;
        *self.config.write().await = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Replaces the configuration in place.
    pub async fn update(&self, config: AppConfig) -> L2Result<()> {
        Self::validate_config(&config)?;
        *self.config.write().await = config;
        info!("Configuration updated");
        Ok(())
    }

    /// Gets a specific configuration value by dotted key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }

    fn load_config(config_dir: &str) -> L2Result<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var(format!("{ENV_PREFIX}_ENVIRONMENT"))
            .unwrap_or_else(|_| "development".to_string());

        info!("Loading cache configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error_to_l2_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    fn validate_config(config: &AppConfig) -> L2Result<()> {
        if config.cache.direct_ttl_factor == 0 {
            return Err(L2Error::Configuration(
                "cache.direct_ttl_factor must be at least 1".to_string(),
            ));
        }

        if config.cache.namespace_suffix.is_empty() {
            return Err(L2Error::Configuration(
                "cache.namespace_suffix must not be empty".to_string(),
            ));
        }

        if config.redis.enabled {
            validate_redis_url(&config.redis.url)?;
        }

        Ok(())
    }
}

fn validate_redis_url(raw: &str) -> L2Result<()> {
    if raw.is_empty() {
        return Err(L2Error::Configuration(
            "Redis URL is required when redis is enabled".to_string(),
        ));
    }

    let url = Url::parse(raw)
        .map_err(|e| L2Error::Configuration(format!("Invalid redis URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "redis" | "rediss" => Ok(()),
        other => Err(L2Error::Configuration(format!(
            "Invalid redis URL '{}': unsupported scheme '{}' (expected redis:// or rediss://)",
            raw, other
        ))),
    }
}

fn config_error_to_l2_error(err: ConfigError) -> L2Error {
    L2Error::Configuration(err.to_string())
}
