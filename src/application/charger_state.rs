// Shared connectivity and channel snapshot state
use crate::domain::channel::Channel;
use crate::domain::status::DeviceStatus;
use std::sync::{PoisonError, RwLock};

/// Connectivity change caused by applying one status payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Appeared { channel_count: usize },
    Disappeared,
    Unchanged,
}

#[derive(Default)]
struct ChannelSlots {
    generation: u64,
    slots: Vec<Option<Channel>>,
}

/// Holder for the latest device status and per-channel snapshots.
///
/// Owned by the connectivity tracker and handed to the channel pollers.
/// Everything outside this module only reads.
#[derive(Default)]
pub struct ChargerState {
    status: RwLock<DeviceStatus>,
    channels: RwLock<ChannelSlots>,
}

impl ChargerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn device_id(&self) -> Option<i64> {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .device_id()
    }

    pub fn is_connected_to_server(&self) -> bool {
        !self
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    pub fn is_connected_to_charger(&self) -> bool {
        let status = self.status.read().unwrap_or_else(PoisonError::into_inner);
        !status.is_empty() && status.reports_charger()
    }

    /// Replace the status and report how connectivity changed.
    ///
    /// Before and after are both computed under the same write lock, so the
    /// comparison is always against the payload this one replaced.
    pub(crate) fn apply_status(&self, next: DeviceStatus) -> Transition {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        let was_connected = status.reports_charger();
        *status = next;
        let is_connected = status.reports_charger();

        match (was_connected, is_connected) {
            (false, true) => Transition::Appeared {
                channel_count: usize::try_from(status.channel_count()).unwrap_or(0),
            },
            (true, false) => Transition::Disappeared,
            _ => Transition::Unchanged,
        }
    }

    /// Forget the status. Returns whether a charger was connected before.
    pub(crate) fn reset(&self) -> bool {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        let was_connected = status.reports_charger();
        *status = DeviceStatus::default();
        was_connected
    }

    /// Number of channel slots, or 0 while the server is unreachable
    pub fn number_of_channels(&self) -> usize {
        if !self.is_connected_to_server() {
            return 0;
        }
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .len()
    }

    pub fn channel(&self, index: usize) -> Option<Channel> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .get(index)
            .cloned()
            .flatten()
    }

    /// Latest snapshots in index order, skipping channels not polled yet
    pub fn channels(&self) -> Vec<Channel> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Start a new generation of `count` empty slots. Writes tagged with an
    /// older generation are ignored from here on.
    pub(crate) fn reset_channels(&self, count: usize) -> u64 {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        channels.generation += 1;
        channels.slots = vec![None; count];
        channels.generation
    }

    /// Overwrite the slot for `channel.index` if `generation` is current
    pub(crate) fn store_channel(&self, generation: u64, channel: Channel) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels.generation != generation {
            return false;
        }
        match channels.slots.get_mut(channel.index) {
            Some(slot) => {
                *slot = Some(channel);
                true
            }
            None => false,
        }
    }
}
