// Connectivity tracker - Status polling and charger presence edges
use crate::application::channel_poller::{ChannelPollerSet, PollerSettings};
use crate::application::charger_api::{ChargerApi, ChargerError};
use crate::application::charger_state::{ChargerState, Transition};
use crate::application::event_bus::EventBus;
use crate::domain::channel::Channel;
use crate::domain::charger::{
    lookup_metadata, ChargerMetadata, DEFAULT_CHARGER_NAME, DEFAULT_CHARGER_TAG, DEFAULT_MAX_AMPS,
    DEFAULT_MAX_CELLS,
};
use crate::domain::events::ChargerEvent;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct TrackerSettings {
    pub status_interval: Duration,
    pub status_start_delay: Duration,
    /// Largest `channel_count` accepted from the device
    pub max_channels: usize,
    pub channels: PollerSettings,
}

#[derive(Clone)]
pub struct ConnectivityTracker {
    api: Arc<dyn ChargerApi>,
    state: Arc<ChargerState>,
    bus: EventBus,
    pollers: Arc<Mutex<ChannelPollerSet>>,
    settings: TrackerSettings,
}

impl ConnectivityTracker {
    pub fn new(api: Arc<dyn ChargerApi>, bus: EventBus, settings: TrackerSettings) -> Self {
        let state = Arc::new(ChargerState::new());
        let pollers = ChannelPollerSet::new(api.clone(), state.clone(), bus.clone(), settings.channels);
        Self {
            api,
            state,
            bus,
            pollers: Arc::new(Mutex::new(pollers)),
            settings,
        }
    }

    pub fn state(&self) -> &ChargerState {
        &self.state
    }

    pub fn is_connected_to_server(&self) -> bool {
        self.state.is_connected_to_server()
    }

    pub fn is_connected_to_charger(&self) -> bool {
        self.state.is_connected_to_charger()
    }

    pub fn any_connectivity_problems(&self) -> bool {
        !self.is_connected_to_server() || !self.is_connected_to_charger()
    }

    pub fn number_of_channels(&self) -> usize {
        self.state.number_of_channels()
    }

    pub fn channel_snapshot(&self, index: usize) -> Option<Channel> {
        self.state.channel(index)
    }

    pub fn channel_snapshots(&self) -> Vec<Channel> {
        self.state.channels()
    }

    pub fn empty_channel(&self, index: usize) -> Channel {
        Channel::empty(index, self.settings.channels.cell_limit)
    }

    /// Metadata attribute for `device_id`, or for the connected charger when
    /// `device_id` is `None`
    pub fn lookup_metadata<T>(
        &self,
        device_id: Option<i64>,
        attribute: impl FnOnce(&ChargerMetadata) -> Option<T>,
        default: T,
    ) -> T {
        let device_id = device_id.or_else(|| self.state.device_id());
        lookup_metadata(device_id, attribute, default)
    }

    pub fn charger_name(&self) -> &'static str {
        self.lookup_metadata(None, |m| m.name, DEFAULT_CHARGER_NAME)
    }

    pub fn charger_tag(&self) -> &'static str {
        self.lookup_metadata(None, |m| m.tag, DEFAULT_CHARGER_TAG)
    }

    pub fn max_amps_per_channel(&self) -> f64 {
        self.lookup_metadata(None, |m| m.max_amps, DEFAULT_MAX_AMPS)
    }

    pub fn max_cells(&self) -> u32 {
        self.lookup_metadata(None, |m| m.cells, DEFAULT_MAX_CELLS)
    }

    /// One status poll: fetch, apply, and react to the connectivity edge
    pub async fn poll_status(&self) {
        let max_channels = self.settings.max_channels;
        let polled = self.api.get_status().await.and_then(|status| {
            status
                .check_channel_count(max_channels)
                .map_err(ChargerError::InvalidStatus)?;
            Ok(status)
        });

        match polled {
            Ok(status) => match self.state.apply_status(status) {
                Transition::Appeared { channel_count } => self.charger_did_appear(channel_count),
                Transition::Disappeared => {
                    tracing::warn!("charger no longer reported by the device");
                    self.bus.publish(ChargerEvent::Disconnected {
                        reason: "charger no longer present".to_string(),
                    });
                }
                Transition::Unchanged => {}
            },
            Err(e) => {
                tracing::warn!(error = %e, "unable to get charger status");
                self.bus.publish(ChargerEvent::StatusError {
                    reason: e.to_string(),
                });
                if self.state.reset() {
                    tracing::warn!(error = %e, "disconnected from the charger");
                    self.bus.publish(ChargerEvent::Disconnected {
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn charger_did_appear(&self, channel_count: usize) {
        tracing::info!(channel_count, "charger appeared");
        self.pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rebuild(channel_count);
        self.bus.publish(ChargerEvent::Connected { channel_count });
    }

    /// Poll status until cancelled, then stop the channel pollers.
    /// Failures never end the loop.
    pub async fn run(self, cancel: CancellationToken) {
        let start = Instant::now() + self.settings.status_start_delay;
        let mut ticker = tokio::time::interval_at(start, self.settings.status_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // a hung request must not hold up shutdown
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => break,
                        () = self.poll_status() => {}
                    }
                }
            }
        }

        self.pollers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop();
        tracing::info!("status polling stopped");
    }
}
