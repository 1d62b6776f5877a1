// Application layer - Polling, state and use cases over the charger API
pub mod channel_poller;
pub mod charger_api;
pub mod charger_state;
pub mod connectivity;
pub mod event_bus;
pub mod preset_service;
