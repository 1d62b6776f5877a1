// Process-wide event fan-out
use crate::domain::events::ChargerEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChargerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver to every current subscriber. Having none is not an error.
    pub fn publish(&self, event: ChargerEvent) {
        tracing::trace!(%event, "publishing");
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChargerEvent> {
        self.tx.subscribe()
    }
}
