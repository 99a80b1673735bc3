//! Preset command catalog endpoint.

use axum::response::Json;

use corelink_host::{preset_catalog, CommandPreset};

/// Return the catalog of pre-written commands for the button UI.
pub async fn get_presets() -> Json<&'static [CommandPreset]> {
    Json(preset_catalog())
}
