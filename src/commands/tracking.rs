//! Tracking commands

use crate::capture::input::channel::CaptureWorker;
use crate::capture::input::types::TrackerEvent;
use crate::capture::platform::PlatformIO;
use crate::recorder::state::ChannelStats;
use crate::recorder::Tracker;
use std::path::Path;
use std::sync::Arc;

/// Application state for tracking
pub struct TrackerState {
    pub tracker: Tracker,
    pub worker: CaptureWorker,
}

impl TrackerState {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker,
            worker: CaptureWorker::new(),
        }
    }
}

/// Start polling the platform in the background
pub fn start_tracking(state: &TrackerState, platform: Arc<dyn PlatformIO>) -> Result<(), String> {
    state
        .worker
        .start(platform, state.tracker.clone())
        .map_err(|e| e.to_string())
}

/// Stop the background capture
pub fn stop_tracking(state: &TrackerState) -> Result<u64, String> {
    state.worker.stop();
    Ok(state.worker.ticks())
}

pub fn is_tracking(state: &TrackerState) -> bool {
    state.worker.is_running()
}

/// Read a recorded event list from a JSON file
pub fn load_events(input_file: &Path) -> Result<Vec<TrackerEvent>, String> {
    let content = std::fs::read_to_string(input_file)
        .map_err(|e| format!("Failed to read input file: {}", e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse events: {}", e))
}

/// Feed events through the tracker in order.
///
/// Events the tracker rejects are logged and skipped. Returns the number
/// applied.
pub fn replay_events(state: &TrackerState, events: Vec<TrackerEvent>) -> usize {
    let total = events.len();
    let mut applied = 0;
    for event in events {
        match state.tracker.handle(event) {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!("Skipping event: {}", e),
        }
    }
    tracing::info!("Replayed {}/{} events", applied, total);
    applied
}

/// Per-channel stats of a profile (the active one when `profile` is None)
pub fn get_channel_stats(state: &TrackerState, profile: Option<&str>) -> Vec<ChannelStats> {
    let profile = profile
        .map(str::to_string)
        .unwrap_or_else(|| state.tracker.active_profile());
    state.tracker.stats(&profile)
}

pub fn save_profile(state: &TrackerState, profile: &str, output_file: &Path) -> Result<(), String> {
    state
        .tracker
        .save_profile(profile, output_file)
        .map_err(|e| e.to_string())
}

pub fn load_profile(state: &TrackerState, input_file: &Path) -> Result<String, String> {
    state
        .tracker
        .load_profile(input_file)
        .map_err(|e| e.to_string())
}
