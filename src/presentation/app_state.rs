// Application state for HTTP handlers
use crate::application::connectivity::ConnectivityTracker;
use crate::application::preset_service::PresetRepository;

#[derive(Clone)]
pub struct AppState {
    pub tracker: ConnectivityTracker,
    pub presets: PresetRepository,
}
