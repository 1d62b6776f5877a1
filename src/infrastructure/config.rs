use crate::application::channel_poller::PollerSettings;
use crate::application::connectivity::TrackerSettings;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChargerConfig {
    pub host: String,
    pub cell_limit: usize,
    pub max_channels: usize,
    pub status_interval_ms: u64,
    pub status_start_delay_ms: u64,
    pub channel_interval_ms: u64,
    pub channel_start_offset_ms: u64,
    pub listen_addr: String,
    pub event_capacity: usize,
}

impl ChargerConfig {
    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            status_interval: Duration::from_millis(self.status_interval_ms.max(1)),
            status_start_delay: Duration::from_millis(self.status_start_delay_ms),
            max_channels: self.max_channels,
            channels: PollerSettings {
                interval: Duration::from_millis(self.channel_interval_ms.max(1)),
                start_offset: Duration::from_millis(self.channel_start_offset_ms),
                cell_limit: self.cell_limit,
            },
        }
    }
}

fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("host", "localhost:5000")?
        .set_default("cell_limit", 8)?
        .set_default("max_channels", 16)?
        .set_default("status_interval_ms", 1000)?
        .set_default("status_start_delay_ms", 1000)?
        .set_default("channel_interval_ms", 1000)?
        .set_default("channel_start_offset_ms", 500)?
        .set_default("listen_addr", "0.0.0.0:8080")?
        .set_default("event_capacity", 64)
}

/// Defaults, then `config/charger.*` if present, then `CHARGER_*` variables
pub fn load_charger_config() -> anyhow::Result<ChargerConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/charger").required(false))
        .add_source(config::Environment::with_prefix("CHARGER").try_parsing(true))
        .build()?;

    Ok(settings.try_deserialize()?)
}
