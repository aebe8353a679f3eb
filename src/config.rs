use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};
use crate::{
    error::{Result, RoomRatesError},
    source::RoomRecord,
    utils::refill_interval,
};

/// Prefix for environment overrides, e.g. `ROOM_RATES__RATE_LIMIT__CAPACITY=10`
pub const ENV_PREFIX: &str = "ROOM_RATES";

/// Top-level service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_admin_addr")]
    pub admin_addr: SocketAddr,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub data_source: DataSourceConfig,
}

/// Token bucket budget: `capacity` requests per `period_secs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_period_secs")]
    pub period_secs: u64,
}

/// Which backend answers room data lookups
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DataSourceConfig {
    #[default]
    Random,
    Fixed { record: RoomRecord },
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_admin_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9090))
}

fn default_capacity() -> u32 {
    5
}

fn default_period_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            admin_addr: default_admin_addr(),
            rate_limit: RateLimitSettings::default(),
            data_source: DataSourceConfig::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            period_secs: default_period_secs(),
        }
    }
}

impl RateLimitSettings {
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    /// Time to earn back a single token
    pub fn refill_interval(&self) -> Duration {
        refill_interval(self.period(), self.capacity)
    }
}

impl ServiceConfig {
    /// Reject budgets the token bucket cannot represent
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.capacity == 0 {
            return Err(RoomRatesError::Config(
                "rate_limit.capacity must be at least 1".to_string(),
            ));
        }
        if self.rate_limit.period_secs == 0 {
            return Err(RoomRatesError::Config(
                "rate_limit.period_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from YAML string
pub fn load_config_from_yaml(yaml: &str) -> Result<ServiceConfig> {
    let config: ServiceConfig = serde_yaml::from_str(yaml).map_err(|e| {
        RoomRatesError::Config(format!("Failed to parse YAML: {}", e))
    })?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from an optional file, then apply `ROOM_RATES__*`
/// environment overrides on top.
pub fn load_config(path: Option<&str>) -> Result<ServiceConfig> {
    let mut builder = ::config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(::config::File::with_name(path));
    }

    let settings = builder
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| RoomRatesError::Config(format!("Failed to load configuration: {}", e)))?;

    let config: ServiceConfig = settings
        .try_deserialize()
        .map_err(|e| RoomRatesError::Config(format!("Invalid configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
}
