// Client trait for the charger's REST API
use crate::domain::channel::ChannelReading;
use crate::domain::preset::Preset;
use crate::domain::status::DeviceStatus;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChargerError {
    #[error("request to charger failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("charger responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response from charger: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("charger sent an invalid status: {0}")]
    InvalidStatus(String),
}

#[async_trait]
pub trait ChargerApi: Send + Sync {
    /// `GET /status`
    async fn get_status(&self) -> Result<DeviceStatus, ChargerError>;

    /// `GET /channel/{index}`
    async fn get_channel(&self, index: usize) -> Result<ChannelReading, ChargerError>;

    /// `GET /preset`
    async fn list_presets(&self) -> Result<Vec<Preset>, ChargerError>;

    /// `GET /preset/{slot}`
    async fn get_preset(&self, slot: i64) -> Result<Preset, ChargerError>;

    /// `PUT /addpreset`, returning the preset with its assigned slot
    async fn add_preset(&self, preset: &Preset) -> Result<Preset, ChargerError>;

    /// `PUT /preset/{index}`. The device does not echo the preset back.
    async fn update_preset(&self, preset: &Preset) -> Result<(), ChargerError>;

    /// `DELETE /preset/{slot}`
    async fn delete_preset(&self, slot: i64) -> Result<(), ChargerError>;
}
