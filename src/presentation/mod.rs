// Presentation layer - Local HTTP surface
pub mod app_state;
pub mod handlers;
