// Per-channel telemetry polling
use crate::application::charger_api::ChargerApi;
use crate::application::charger_state::ChargerState;
use crate::application::event_bus::EventBus;
use crate::domain::channel::Channel;
use crate::domain::events::ChargerEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub interval: Duration,
    pub start_offset: Duration,
    pub cell_limit: usize,
}

/// Result of one channel tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No charger connected, nothing requested
    Skipped,
    Updated,
    Failed,
    /// The poll finished after its generation was replaced
    Discarded,
}

/// One polling stream, bound to a channel index and a slot generation
#[derive(Clone)]
pub struct ChannelPoller {
    index: usize,
    generation: u64,
    cell_limit: usize,
    api: Arc<dyn ChargerApi>,
    state: Arc<ChargerState>,
    bus: EventBus,
}

impl ChannelPoller {
    pub async fn poll_once(&self) -> PollOutcome {
        if !self.state.is_connected_to_charger() {
            return PollOutcome::Skipped;
        }

        let reading = match self.api.get_channel(self.index).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(channel = self.index, error = %e, "channel poll failed");
                return PollOutcome::Failed;
            }
        };

        let channel = Channel::from_reading(self.index, reading, self.cell_limit);
        if !self.state.store_channel(self.generation, channel) {
            tracing::debug!(channel = self.index, "dropping snapshot from replaced poller");
            return PollOutcome::Discarded;
        }

        self.bus.publish(ChargerEvent::ChannelActivity { index: self.index });
        PollOutcome::Updated
    }

    /// Tick until cancelled. A slow request pushes back this channel's next
    /// tick only.
    async fn run(self, settings: PollerSettings, cancel: CancellationToken) {
        let start = Instant::now() + settings.start_offset;
        let mut ticker = tokio::time::interval_at(start, settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
            }
        }
        tracing::debug!(channel = self.index, "channel poller stopped");
    }
}

/// The live set of channel pollers, rebuilt whenever a charger appears
pub struct ChannelPollerSet {
    api: Arc<dyn ChargerApi>,
    state: Arc<ChargerState>,
    bus: EventBus,
    settings: PollerSettings,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl ChannelPollerSet {
    pub fn new(
        api: Arc<dyn ChargerApi>,
        state: Arc<ChargerState>,
        bus: EventBus,
        settings: PollerSettings,
    ) -> Self {
        Self {
            api,
            state,
            bus,
            settings,
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Stop every existing poller, then start `channel_count` new ones.
    ///
    /// Must be called from within a tokio runtime.
    pub fn rebuild(&mut self, channel_count: usize) {
        self.stop();
        let generation = self.state.reset_channels(channel_count);
        self.cancel = CancellationToken::new();

        for index in 0..channel_count {
            tracing::debug!(channel = index, generation, "starting channel poller");
            let poller = self.poller(index, generation);
            self.handles
                .push(tokio::spawn(poller.run(self.settings, self.cancel.clone())));
        }
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }

    fn poller(&self, index: usize, generation: u64) -> ChannelPoller {
        ChannelPoller {
            index,
            generation,
            cell_limit: self.settings.cell_limit,
            api: self.api.clone(),
            state: self.state.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl Drop for ChannelPollerSet {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::charger_api::fake::FakeCharger;
    use crate::application::event_bus::testing::drain;
    use serde_json::json;

    fn settings() -> PollerSettings {
        PollerSettings {
            interval: Duration::from_secs(1),
            start_offset: Duration::from_millis(500),
            cell_limit: 4,
        }
    }

    fn connect(state: &ChargerState, channel_count: i64) {
        state.apply_status(
            serde_json::from_value(json!({
                "charger_presence": "connected",
                "channel_count": channel_count,
            }))
            .unwrap(),
        );
    }

    fn channel_reply(volts: f64) -> Option<serde_json::Value> {
        Some(json!({"curr_inp_volts": volts, "cells": [{"v": 4.1}, {"v": 4.1}]}))
    }

    fn setup() -> (Arc<FakeCharger>, Arc<ChargerState>, EventBus, ChannelPollerSet) {
        let api = Arc::new(FakeCharger::new());
        let state = Arc::new(ChargerState::new());
        let bus = EventBus::new(64);
        let set = ChannelPollerSet::new(api.clone(), state.clone(), bus.clone(), settings());
        (api, state, bus, set)
    }

    #[tokio::test]
    async fn test_poll_updates_slot_and_publishes() {
        let (api, state, bus, set) = setup();
        let mut rx = bus.subscribe();
        connect(&state, 2);
        let generation = state.reset_channels(2);
        api.set_channel(1, channel_reply(12.0));

        let outcome = set.poller(1, generation).poll_once().await;

        assert_eq!(outcome, PollOutcome::Updated);
        let channel = state.channel(1).unwrap();
        assert_eq!(channel.input_volts, 12.0);
        assert_eq!(channel.cells.len(), 4);
        assert_eq!(drain(&mut rx), vec![ChargerEvent::ChannelActivity { index: 1 }]);
    }

    #[tokio::test]
    async fn test_poll_while_disconnected_is_skipped() {
        let (api, state, bus, set) = setup();
        let mut rx = bus.subscribe();
        let generation = state.reset_channels(2);
        api.set_channel(0, channel_reply(12.0));

        let outcome = set.poller(0, generation).poll_once().await;

        assert_eq!(outcome, PollOutcome::Skipped);
        assert!(api.channel_calls().is_empty());
        assert!(state.channel(0).is_none());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_failed_poll_keeps_previous_snapshot() {
        let (api, state, bus, set) = setup();
        connect(&state, 1);
        let generation = state.reset_channels(1);
        let poller = set.poller(0, generation);

        api.set_channel(0, channel_reply(11.5));
        assert_eq!(poller.poll_once().await, PollOutcome::Updated);

        let mut rx = bus.subscribe();
        api.set_channel(0, None);
        assert_eq!(poller.poll_once().await, PollOutcome::Failed);

        api.set_channel(0, Some(json!({"cells": "not a list"})));
        assert_eq!(poller.poll_once().await, PollOutcome::Failed);

        assert_eq!(state.channel(0).unwrap().input_volts, 11.5);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_replaced_poller_cannot_write() {
        let (api, state, _bus, mut set) = setup();
        connect(&state, 1);
        let stale = set.poller(0, state.reset_channels(1));
        set.rebuild(1);
        api.set_channel(0, channel_reply(12.0));

        assert_eq!(stale.poll_once().await, PollOutcome::Discarded);
        assert!(state.channel(0).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rebuild_spawns_one_stream_per_channel() {
        let (api, state, bus, mut set) = setup();
        let mut rx = bus.subscribe();
        connect(&state, 3);
        for index in 0..3 {
            api.set_channel(index, channel_reply(12.0));
        }

        set.rebuild(3);
        assert_eq!(set.len(), 3);
        assert_eq!(state.number_of_channels(), 3);

        tokio::time::sleep(Duration::from_millis(600)).await;

        let mut calls = api.channel_calls();
        calls.sort_unstable();
        assert_eq!(calls, vec![0, 1, 2]);
        assert_eq!(state.channels().len(), 3);
        assert_eq!(drain(&mut rx).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_channel_does_not_block_others() {
        let (api, state, _bus, mut set) = setup();
        connect(&state, 2);
        api.set_channel(1, channel_reply(12.0));

        set.rebuild(2);
        tokio::time::sleep(Duration::from_millis(2600)).await;

        let calls = api.channel_calls();
        assert_eq!(calls.iter().filter(|&&i| i == 0).count(), 3);
        assert_eq!(calls.iter().filter(|&&i| i == 1).count(), 3);
        assert!(state.channel(0).is_none());
        assert!(state.channel(1).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling() {
        let (api, state, _bus, mut set) = setup();
        connect(&state, 1);
        api.set_channel(0, channel_reply(12.0));

        set.rebuild(1);
        tokio::time::sleep(Duration::from_millis(600)).await;
        set.stop();
        assert!(set.is_empty());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(api.channel_calls().len(), 1);
    }
}
