use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `SYNCWATCH__SERVICE__HTTP__PORT=8080`
pub const ENV_PREFIX: &str = "SYNCWATCH";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub cors: CorsConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origin allowed to call the API; `*` allows any
    pub allowed_origin: String,
}

/// Tuning for the relay coordinator
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Playback events retained per session
    pub history_limit: usize,

    /// Capacity of the coordinator's command queue
    pub command_queue_capacity: usize,

    /// Outbound messages buffered per connection before new ones are dropped
    pub send_queue_capacity: usize,

    /// WebSocket ping interval in seconds
    pub ping_interval_secs: u64,
}

impl RelayConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs.max(1))
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            history_limit: crate::session::DEFAULT_HISTORY_LIMIT,
            command_queue_capacity: 1024,
            send_queue_capacity: 256,
            ping_interval_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from built-in defaults, an optional file at `path`
    /// (extension optional), then `SYNCWATCH__*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let relay = RelayConfig::default();

        let settings = config::Config::builder()
            .set_default("service.name", "syncwatch")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3050_i64)?
            .set_default("cors.allowed_origin", "http://localhost:3000")?
            .set_default("relay.history_limit", relay.history_limit as i64)?
            .set_default(
                "relay.command_queue_capacity",
                relay.command_queue_capacity as i64,
            )?
            .set_default("relay.send_queue_capacity", relay.send_queue_capacity as i64)?
            .set_default("relay.ping_interval_secs", relay.ping_interval_secs as i64)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
