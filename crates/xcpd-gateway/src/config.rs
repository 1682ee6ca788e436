use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use xcpd_cache::InMemoryCorrelationCache;
use xcpd_core::SubjectIdentifierDomain;

use crate::target::GatewayTarget;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config build error: {0}")]
    Build(String),

    #[error("config deserialize error: {0}")]
    Deserialize(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub gateway: GatewaySettings,
    /// Remote communities queried by discovery
    #[serde(default)]
    pub responding_gateways: Vec<GatewayTarget>,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Gateway validations
        if self.gateway.home_community_id.trim().is_empty() {
            return Err(ConfigError::invalid("gateway.home_community_id is required"));
        }
        self.community_assigning_authority()
            .validate()
            .map_err(|e| ConfigError::invalid(format!("gateway.community_assigning_authority: {e}")))?;
        if self.gateway.minimum_degree_match_percentage > 100 {
            return Err(ConfigError::invalid(
                "gateway.minimum_degree_match_percentage must be <= 100",
            ));
        }
        if self.gateway.max_concurrent_requests == 0 {
            return Err(ConfigError::invalid("gateway.max_concurrent_requests must be > 0"));
        }
        if self.gateway.request_timeout_ms == Some(0) {
            return Err(ConfigError::invalid("gateway.request_timeout_ms must be > 0"));
        }
        // Responding gateway validations
        for (i, target) in self.responding_gateways.iter().enumerate() {
            if target.home_community_id.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "responding_gateways[{i}].home_community_id must not be empty"
                )));
            }
            let duplicate = self.responding_gateways[..i]
                .iter()
                .any(|earlier| earlier.is_community(&target.home_community_id));
            if duplicate {
                return Err(ConfigError::invalid(format!(
                    "responding gateway {} is configured more than once",
                    target.home_community_id
                )));
            }
        }
        if self.responding_gateways.is_empty() {
            tracing::warn!("no responding gateways configured; discovery will query nobody");
        }
        // Cache validation
        if self.cache.ttl_secs == Some(0) {
            return Err(ConfigError::invalid("cache.ttl_secs must be > 0"));
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(ConfigError::invalid(format!(
                "logging.level must be one of {valid_levels:?}"
            )));
        }
        Ok(())
    }

    pub fn community_assigning_authority(&self) -> SubjectIdentifierDomain {
        let domain = SubjectIdentifierDomain::new(&self.gateway.community_assigning_authority);
        match &self.gateway.community_assigning_authority_namespace {
            Some(ns) => domain.with_namespace(ns),
            None => domain,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.gateway.request_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Home community id of this (initiating) gateway
    #[serde(default)]
    pub home_community_id: String,
    /// Universal id of the assigning authority that issues local patient ids
    #[serde(default)]
    pub community_assigning_authority: String,
    #[serde(default)]
    pub community_assigning_authority_namespace: Option<String>,
    /// Applied to queries that do not specify one
    #[serde(default = "default_minimum_degree_match_percentage")]
    pub minimum_degree_match_percentage: u8,
    /// When false, targets are queried one after another on the caller's task
    #[serde(default = "default_multi_thread")]
    pub multi_thread: bool,
    /// Size of the shared worker pool
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Per-target deadline; unset relies on the transport's own timeout
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            home_community_id: String::new(),
            community_assigning_authority: String::new(),
            community_assigning_authority_namespace: None,
            minimum_degree_match_percentage: default_minimum_degree_match_percentage(),
            multi_thread: default_multi_thread(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_ms: None,
        }
    }
}

pub const DEFAULT_MINIMUM_DEGREE_MATCH_PERCENTAGE: u8 = 90;

fn default_minimum_degree_match_percentage() -> u8 {
    DEFAULT_MINIMUM_DEGREE_MATCH_PERCENTAGE
}
fn default_multi_thread() -> bool {
    true
}
fn default_max_concurrent_requests() -> usize {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheSettings {
    /// Rows older than this are ignored; unset keeps rows until purged
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl CacheSettings {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    /// Builds the in-memory correlation cache described by these settings.
    pub fn build_memory_cache(&self) -> InMemoryCorrelationCache {
        match self.ttl() {
            Some(ttl) => InMemoryCorrelationCache::with_ttl(ttl),
            None => InMemoryCorrelationCache::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

pub mod loader {
    use super::{AppConfig, ConfigError};
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub const DEFAULT_CONFIG_PATH: &str = "xcpd.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., XCPD__GATEWAY__MULTI_THREAD=false
        builder = builder.add_source(
            Environment::with_prefix("XCPD")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| ConfigError::Build(e.to_string()))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| ConfigError::Deserialize(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }
}
