// Domain layer - Charger data and events, no I/O
pub mod channel;
pub mod charger;
pub mod events;
pub mod preset;
pub mod status;
