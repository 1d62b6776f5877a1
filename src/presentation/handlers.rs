// HTTP request handlers
use crate::domain::channel::Channel;
use crate::domain::preset::Preset;
use crate::domain::status::DeviceStatus;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct ConnectivitySummary {
    pub connected_to_server: bool,
    pub connected_to_charger: bool,
    pub channel_count: usize,
    pub device_id: Option<i64>,
    pub charger_name: &'static str,
    pub charger_tag: &'static str,
    pub max_amps_per_channel: f64,
    pub max_cells: u32,
    pub problems: bool,
    pub device: DeviceStatus,
}

/// A preset plus the display hints clients need for listing it
#[derive(Debug, Serialize)]
pub struct PresetView {
    #[serde(flatten)]
    pub preset: Preset,
    pub tags: Vec<String>,
    pub editable: bool,
}

impl From<Preset> for PresetView {
    fn from(preset: Preset) -> Self {
        Self {
            tags: preset.tags(),
            editable: preset.is_editable(),
            preset,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/status", get(connectivity))
        .route("/channels", get(list_channels))
        .route("/channels/:index", get(get_channel))
        .route("/presets", get(list_presets).put(save_preset))
        .route("/presets/:slot", get(get_preset).delete(delete_preset))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn connectivity(State(state): State<Arc<AppState>>) -> Json<ConnectivitySummary> {
    let tracker = &state.tracker;
    Json(ConnectivitySummary {
        connected_to_server: tracker.is_connected_to_server(),
        connected_to_charger: tracker.is_connected_to_charger(),
        channel_count: tracker.number_of_channels(),
        device_id: tracker.state().device_id(),
        charger_name: tracker.charger_name(),
        charger_tag: tracker.charger_tag(),
        max_amps_per_channel: tracker.max_amps_per_channel(),
        max_cells: tracker.max_cells(),
        problems: tracker.any_connectivity_problems(),
        device: tracker.state().status(),
    })
}

pub async fn list_channels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tracker.channel_snapshots())
}

pub async fn get_channel(
    Path(index): Path<usize>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let tracker = &state.tracker;
    let channel: Option<Channel> = tracker.channel_snapshot(index).or_else(|| {
        // placeholder until the first poll lands
        (index < tracker.number_of_channels()).then(|| tracker.empty_channel(index))
    });
    match channel {
        Some(channel) => Json(channel).into_response(),
        None => (StatusCode::NOT_FOUND, format!("no channel {index}")).into_response(),
    }
}

pub async fn list_presets(State(state): State<Arc<AppState>>) -> Response {
    match state.presets.list_presets().await {
        Ok(presets) => {
            let views: Vec<PresetView> = presets.into_iter().map(PresetView::from).collect();
            Json(views).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "error fetching presets");
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

pub async fn save_preset(
    State(state): State<Arc<AppState>>,
    Json(preset): Json<Preset>,
) -> Response {
    match state.presets.save_preset(preset).await {
        Ok(saved) => Json(saved).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

pub async fn get_preset(Path(slot): Path<i64>, State(state): State<Arc<AppState>>) -> Response {
    match state.presets.get_preset(slot).await {
        Ok(preset) => Json(PresetView::from(preset)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}

pub async fn delete_preset(Path(slot): Path<i64>, State(state): State<Arc<AppState>>) -> Response {
    match state.presets.delete_preset(slot).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
    }
}
