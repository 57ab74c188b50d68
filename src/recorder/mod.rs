//! Tracker engine
//!
//! [`Tracker`] ties the pieces together: it owns the monitor topology and the
//! accumulator, dispatches capture events, and serves renders from consistent
//! snapshots of the arrays.

pub mod error;
pub mod state;
pub mod storage;

use crate::capture::input::types::{Channel, Dataset, MouseButton, TrackerEvent};
use crate::capture::monitor::{MonitorLayout, MonitorTopology, Point, Resolution};
use crate::config::EngineConfig;
use crate::processing::accumulator::{
    redraw_interval, ProfileTracks, RecordOutcome, TrackAccumulator, TrackArray,
};
use crate::processing::compositor::{compose, PixelFormat, RenderOptions, RenderResult};
use error::{RenderError, TrackError, TrackResult};
use parking_lot::{Mutex, RwLock};
use state::{ChannelStats, Destination, RenderRequest};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use storage::ProfileSnapshot;

struct TrackerInner {
    config: EngineConfig,
    topology: MonitorTopology,
    accumulator: RwLock<TrackAccumulator>,
    active_profile: RwLock<String>,
    /// Latest render generation per (profile, dataset)
    generations: Mutex<HashMap<(String, Dataset), Arc<AtomicU64>>>,
}

/// Cheaply cloneable handle to the tracking engine
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    pub fn new(config: EngineConfig, layout: MonitorLayout) -> TrackResult<Self> {
        config.validate()?;
        let layout = MonitorLayout::with_weights(
            layout.logical().to_vec(),
            layout.physical().to_vec(),
            config.topology,
        )?;
        let active_profile = config.capture.default_profile.clone();
        let accumulator = TrackAccumulator::new(config.accumulator.clone())?;

        Ok(Self {
            inner: Arc::new(TrackerInner {
                topology: MonitorTopology::new(layout),
                accumulator: RwLock::new(accumulator),
                active_profile: RwLock::new(active_profile),
                generations: Mutex::new(HashMap::new()),
                config,
            }),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn topology(&self) -> &MonitorTopology {
        &self.inner.topology
    }

    pub fn active_profile(&self) -> String {
        self.inner.active_profile.read().clone()
    }

    pub fn profile_names(&self) -> Vec<String> {
        self.inner.accumulator.read().profile_names()
    }

    /// Apply one capture event
    pub fn handle(&self, event: TrackerEvent) -> TrackResult<()> {
        match event {
            TrackerEvent::Position(sample) => {
                self.record_position(sample.channel, sample.point());
            }
            TrackerEvent::Click(sample) => {
                self.record_click(sample.button, sample.point());
            }
            TrackerEvent::MonitorTopologyChanged { logical, physical } => {
                if self.inner.topology.update(logical, physical)? {
                    self.inner.accumulator.write().break_paths();
                }
            }
            TrackerEvent::ProfileChanged { profile } => {
                if profile.trim().is_empty() {
                    return Err(TrackError::Configuration(
                        "profile name must not be empty".to_string(),
                    ));
                }
                let previous = {
                    let mut active = self.inner.active_profile.write();
                    std::mem::replace(&mut *active, profile.clone())
                };
                if previous != profile {
                    tracing::info!("Active profile: {}", profile);
                    self.inner.accumulator.write().break_profile_paths(&previous);
                }
            }
            TrackerEvent::ResetProfile { profile } => {
                self.reset_profile(&profile);
            }
        }
        Ok(())
    }

    /// Record a movement sample into the active profile
    pub fn record_position(&self, channel: Channel, position: Point) -> RecordOutcome {
        let layout = self.inner.topology.snapshot();
        let profile = self.active_profile();
        self.inner
            .accumulator
            .write()
            .record(&profile, channel, position, &layout)
    }

    /// Record a button press into the active profile
    pub fn record_click(&self, button: MouseButton, position: Point) -> bool {
        let layout = self.inner.topology.snapshot();
        let profile = self.active_profile();
        self.inner
            .accumulator
            .write()
            .record_click(&profile, button, position, &layout)
    }

    pub fn reset_profile(&self, profile: &str) -> bool {
        let removed = self.inner.accumulator.write().reset_profile(profile);
        if removed {
            tracing::info!("Reset profile '{}'", profile);
        }
        removed
    }

    /// Copy of one dataset's arrays, taken under a single read lock
    pub fn snapshot(&self, profile: &str, dataset: Dataset) -> BTreeMap<Resolution, TrackArray> {
        self.inner.accumulator.read().snapshot(profile, dataset)
    }

    pub fn stats(&self, profile: &str) -> Vec<ChannelStats> {
        let accumulator = self.inner.accumulator.read();
        let max_interval = accumulator.config().max_redraw_interval;
        let Some(tracks) = accumulator.profile(profile) else {
            return Vec::new();
        };
        tracks
            .channels()
            .map(|(channel, state)| ChannelStats {
                channel,
                phase: state.phase,
                distance: state.distance,
                event_counter: state.event_counter,
                redraw_interval: redraw_interval(state.event_counter, max_interval),
            })
            .collect()
    }

    fn next_generation(&self, profile: &str, dataset: Dataset) -> (Arc<AtomicU64>, u64) {
        let counter = self
            .inner
            .generations
            .lock()
            .entry((profile.to_string(), dataset))
            .or_default()
            .clone();
        let generation = counter.fetch_add(1, Ordering::SeqCst) + 1;
        (counter, generation)
    }

    /// Render a dataset.
    ///
    /// Merging runs on the blocking pool against a snapshot, so recording is
    /// never held up. A newer request for the same profile and dataset
    /// supersedes this one, which then fails with [`RenderError::Superseded`].
    pub async fn render(&self, request: RenderRequest) -> TrackResult<RenderResult> {
        self.prepare_render(request)?.run().await
    }

    /// Snapshot the data and claim a generation for `request`
    fn prepare_render(&self, request: RenderRequest) -> TrackResult<PendingRender> {
        let options = request.options()?;
        let arrays = self.snapshot(&request.profile, request.dataset);
        let (counter, generation) = self.next_generation(&request.profile, request.dataset);
        Ok(PendingRender {
            request,
            options,
            arrays,
            counter,
            generation,
        })
    }

    /// Save one profile to `path`
    pub fn save_profile(&self, profile: &str, path: &Path) -> TrackResult<()> {
        let snapshot = {
            let accumulator = self.inner.accumulator.read();
            let empty = ProfileTracks::default();
            let tracks = accumulator.profile(profile).unwrap_or(&empty);
            ProfileSnapshot::from_tracks(profile, tracks)
        };
        snapshot.save(path)?;
        Ok(())
    }

    /// Load a saved profile, replacing any in-memory data under the same name.
    /// Returns the profile name.
    pub fn load_profile(&self, path: &Path) -> TrackResult<String> {
        let (name, tracks) = ProfileSnapshot::load(path)?.into_tracks();
        self.inner
            .accumulator
            .write()
            .insert_profile(name.clone(), tracks);
        Ok(name)
    }
}

/// A render that has its snapshot and generation but has not run yet
struct PendingRender {
    request: RenderRequest,
    options: RenderOptions,
    arrays: BTreeMap<Resolution, TrackArray>,
    counter: Arc<AtomicU64>,
    generation: u64,
}

impl PendingRender {
    async fn run(self) -> TrackResult<RenderResult> {
        let PendingRender {
            request,
            options,
            arrays,
            counter,
            generation,
        } = self;
        let RenderRequest {
            profile,
            dataset,
            width,
            height,
            destination,
            ..
        } = request;

        let result = tokio::task::spawn_blocking(move || -> Result<RenderResult, RenderError> {
            let cancelled = || counter.load(Ordering::SeqCst) != generation;
            let result = compose(&arrays, width, height, &options, &cancelled)?;
            if let Destination::FilePath(path) = &destination {
                if result.is_empty() {
                    tracing::warn!("Nothing to write to {}: no data", path.display());
                } else {
                    write_png(&result, options.format, path)?;
                }
            }
            Ok(result)
        })
        .await
        .map_err(|e| RenderError::Task(e.to_string()))?;

        match &result {
            Ok(image) => tracing::debug!(
                "Rendered {}/{} at {}x{}",
                profile,
                dataset,
                image.width,
                image.height
            ),
            Err(RenderError::Superseded) => {
                tracing::debug!("Render of {}/{} superseded", profile, dataset)
            }
            Err(_) => {}
        }
        Ok(result?)
    }
}

/// Encode a render as PNG
pub fn write_png(result: &RenderResult, format: PixelFormat, path: &Path) -> Result<(), RenderError> {
    let colour_type = match format {
        PixelFormat::Luma => image::ExtendedColorType::L8,
        PixelFormat::Rgb => image::ExtendedColorType::Rgb8,
        PixelFormat::Rgba => image::ExtendedColorType::Rgba8,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
    }
    image::save_buffer_with_format(
        path,
        &result.pixels,
        result.width,
        result.height,
        colour_type,
        image::ImageFormat::Png,
    )?;
    tracing::info!("Wrote {}x{} image to {}", result.width, result.height, path.display());
    Ok(())
}
