// Preset repository - Fetch and store charger presets
use crate::application::charger_api::{ChargerApi, ChargerError};
use crate::application::event_bus::EventBus;
use crate::domain::events::ChargerEvent;
use crate::domain::preset::Preset;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("charger rejected preset command: {0}")]
    CommandFailed(#[source] ChargerError),
}

#[derive(Clone)]
pub struct PresetRepository {
    api: Arc<dyn ChargerApi>,
    bus: EventBus,
}

impl PresetRepository {
    pub fn new(api: Arc<dyn ChargerApi>, bus: EventBus) -> Self {
        Self { api, bus }
    }

    /// All presets in memory-slot order. Failures go straight to the caller.
    pub async fn list_presets(&self) -> Result<Vec<Preset>, ChargerError> {
        self.api.list_presets().await
    }

    pub async fn get_preset(&self, slot: i64) -> Result<Preset, ChargerError> {
        self.api.get_preset(slot).await
    }

    /// Create or update, depending on whether the preset has a slot yet.
    ///
    /// A create returns the device's copy with its assigned slot; an update
    /// returns `preset` unchanged.
    pub async fn save_preset(&self, preset: Preset) -> Result<Preset, PresetError> {
        tracing::info!(index = preset.index, name = %preset.name, "saving preset");
        if preset.is_unsaved() {
            return self
                .api
                .add_preset(&preset)
                .await
                .map_err(|e| self.command_failed(e));
        }

        let updated = self.api.update_preset(&preset).await;
        match updated {
            Ok(()) => Ok(preset),
            Err(e) => Err(self.command_failed(e)),
        }
    }

    pub async fn delete_preset(&self, slot: i64) -> Result<(), PresetError> {
        tracing::info!(slot, "deleting preset");
        self.api
            .delete_preset(slot)
            .await
            .map_err(|e| self.command_failed(e))
    }

    fn command_failed(&self, error: ChargerError) -> PresetError {
        tracing::error!(error = %error, "preset command failed");
        self.bus.publish(ChargerEvent::CommandFailure {
            reason: error.to_string(),
        });
        PresetError::CommandFailed(error)
    }
}
