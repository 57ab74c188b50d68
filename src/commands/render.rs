//! Render commands
//!
//! Build render requests from the user's settings and run them against the
//! tracker.

use crate::capture::input::types::Dataset;
use crate::commands::tracking::TrackerState;
use crate::processing::colour::PRESETS;
use crate::processing::compositor::RenderResult;
use crate::recorder::state::{
    set_render_type, Destination, RenderRequest, RenderSettings, RenderType,
};
use std::path::PathBuf;

/// Render a preview of the active profile with the current settings
pub async fn render_preview(
    state: &TrackerState,
    settings: &RenderSettings,
    dataset: Dataset,
    width: Option<u32>,
    height: Option<u32>,
    sampling: u32,
) -> Result<RenderResult, String> {
    let tracker = &state.tracker;
    let mut request = RenderRequest::new(tracker.active_profile(), dataset, &tracker.config().render);
    settings.apply(&mut request);
    request.width = width;
    request.height = height;
    request.sampling = sampling;

    tracker.render(request).await.map_err(|e| e.to_string())
}

/// Render a request to a PNG file
pub async fn export_image(
    state: &TrackerState,
    mut request: RenderRequest,
    output_file: PathBuf,
) -> Result<RenderResult, String> {
    tracing::info!(
        "Exporting {}/{} to {}",
        request.profile,
        request.dataset,
        output_file.display()
    );
    request.destination = Destination::FilePath(output_file);
    state.tracker.render(request).await.map_err(|e| e.to_string())
}

/// Switch render type; returns the new settings and the colour maps to offer
pub fn change_render_type(
    state: &TrackerState,
    settings: RenderSettings,
    render_type: RenderType,
) -> (RenderSettings, Vec<String>) {
    set_render_type(settings, render_type, &state.tracker.config().render)
}

/// Every preset colour map name
pub fn get_colour_presets() -> Vec<String> {
    PRESETS.iter().map(|s| s.to_string()).collect()
}
