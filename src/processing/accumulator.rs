//! Track accumulation
//!
//! Each profile owns one counter array per (dataset, resolution). Movement
//! samples are joined to the previous sample with a straight line and every
//! crossed pixel is counted once; clicks count a single pixel. Counters are
//! exact integers that saturate at [`COUNTER_CEILING`].
//!
//! The per-channel event counter is separate from the pixel data. It only
//! drives the preview redraw cadence, so once it passes the configured
//! threshold it is scaled down. The arrays are never rescaled.

use crate::capture::input::types::{Channel, Dataset, MouseButton};
use crate::capture::monitor::{MonitorLayout, Point, Resolution};
use crate::config::AccumulatorConfig;
use crate::processing::line::Line;
use crate::recorder::error::{StorageError, TrackResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Largest value a counter can hold
pub const COUNTER_CEILING: u32 = u32::MAX;

/// Dense 2D grid of counters for one resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTrackArray", into = "RawTrackArray")]
pub struct TrackArray {
    width: u32,
    height: u32,
    counts: Vec<u32>,
}

/// Serialized form of a [`TrackArray`], checked on the way in
#[derive(Serialize, Deserialize)]
struct RawTrackArray {
    width: u32,
    height: u32,
    counts: Vec<u32>,
}

impl TryFrom<RawTrackArray> for TrackArray {
    type Error = StorageError;

    fn try_from(raw: RawTrackArray) -> Result<Self, Self::Error> {
        TrackArray::from_parts(raw.width, raw.height, raw.counts)
    }
}

impl From<TrackArray> for RawTrackArray {
    fn from(array: TrackArray) -> Self {
        Self {
            width: array.width,
            height: array.height,
            counts: array.counts,
        }
    }
}

impl TrackArray {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            counts: vec![0; resolution.area() as usize],
        }
    }

    /// Rebuild an array from row-major counters
    pub fn from_parts(width: u32, height: u32, counts: Vec<u32>) -> Result<Self, StorageError> {
        if counts.len() as u64 != u64::from(width) * u64::from(height) {
            return Err(StorageError::ShapeMismatch {
                width,
                height,
                len: counts.len(),
            });
        }
        Ok(Self {
            width,
            height,
            counts,
        })
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major counters
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    fn index(&self, point: Point) -> Option<usize> {
        if point.x < 0 || point.y < 0 {
            return None;
        }
        let (x, y) = (point.x as u32, point.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.index(Point::new(x as i32, y as i32))
            .map(|i| self.counts[i])
            .unwrap_or(0)
    }

    /// Overwrite one counter, clamped to the ceiling. Out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, value: u32) {
        if let Some(i) = self.index(Point::new(x as i32, y as i32)) {
            self.counts[i] = value.min(COUNTER_CEILING);
        }
    }

    /// Add one to the counter at `point`, saturating at the ceiling.
    ///
    /// Returns false when `point` lies outside the array.
    pub fn increment(&mut self, point: Point) -> bool {
        match self.index(point) {
            Some(i) => {
                if self.counts[i] < COUNTER_CEILING {
                    self.counts[i] += 1;
                }
                true
            }
            None => false,
        }
    }

    pub fn max_value(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| u64::from(*c)).sum()
    }
}

/// All arrays of one dataset, keyed by the resolution they were recorded at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionArrays {
    arrays: BTreeMap<Resolution, TrackArray>,
}

impl ResolutionArrays {
    /// Array for `resolution`, created empty on first use.
    ///
    /// This is the only place arrays come into existence.
    pub fn ensure(&mut self, resolution: Resolution) -> &mut TrackArray {
        self.arrays.entry(resolution).or_insert_with(|| {
            tracing::debug!("Creating {} track array", resolution);
            TrackArray::new(resolution)
        })
    }

    pub fn get(&self, resolution: Resolution) -> Option<&TrackArray> {
        self.arrays.get(&resolution)
    }

    pub fn insert(&mut self, array: TrackArray) {
        self.arrays.insert(array.resolution(), array);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackArray> {
        self.arrays.values()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Copy of every array, for handing to a render
    pub fn snapshot(&self) -> BTreeMap<Resolution, TrackArray> {
        self.arrays.clone()
    }
}

/// Whether a channel has seen a sample since it was created or reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelPhase {
    #[default]
    Idle,
    Recording,
}

/// Per-channel accumulation state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelState {
    pub phase: ChannelPhase,
    pub last_position: Option<Point>,
    /// Cumulative path length in pixels
    pub distance: f64,
    /// Logical event count; compressed, never reset
    pub event_counter: u64,
}

impl ChannelState {
    /// Restore a channel from persisted scalars
    pub fn restored(distance: f64, event_counter: u64) -> Self {
        Self {
            phase: ChannelPhase::Idle,
            last_position: None,
            distance,
            event_counter,
        }
    }
}

/// Scale `counter` down once it exceeds `threshold`.
///
/// Returns the new counter and the number of multiplications applied. After
/// any compression the counter is strictly below the threshold. A zero
/// threshold disables compression.
pub fn compress_counter(counter: u64, threshold: u64, ratio: f64) -> (u64, u32) {
    if threshold == 0 || counter <= threshold {
        return (counter, 0);
    }
    let mut counter = counter;
    let mut cycles = 0;
    while counter >= threshold {
        let next = (counter as f64 * ratio) as u64;
        cycles += 1;
        // A ratio that rounds back to the same value would never terminate
        counter = if next >= counter { counter - 1 } else { next };
    }
    (counter, cycles)
}

/// Number of events between preview redraws for a given event count.
///
/// Grows by powers of ten with the count so long sessions redraw less often.
pub fn redraw_interval(count: u64, max_interval: u64) -> u64 {
    let magnitude = count.max(10).ilog10();
    10u64.saturating_pow(magnitude).min(max_interval).max(1)
}

/// What a single `record` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Pixels counted
    pub pixels: usize,
    /// The event counter was compressed
    pub compressed: bool,
    /// A preview redraw is due at this event count
    pub redraw_due: bool,
}

/// Everything recorded for one profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileTracks {
    channels: BTreeMap<Channel, ChannelState>,
    datasets: BTreeMap<Dataset, ResolutionArrays>,
}

impl ProfileTracks {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelState> {
        self.channels.get(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = (Channel, &ChannelState)> {
        self.channels.iter().map(|(c, s)| (*c, s))
    }

    pub fn dataset(&self, dataset: Dataset) -> Option<&ResolutionArrays> {
        self.datasets.get(&dataset)
    }

    pub fn datasets(&self) -> impl Iterator<Item = (Dataset, &ResolutionArrays)> {
        self.datasets.iter().map(|(d, a)| (*d, a))
    }

    pub fn set_channel(&mut self, channel: Channel, state: ChannelState) {
        self.channels.insert(channel, state);
    }

    pub fn insert_array(&mut self, dataset: Dataset, array: TrackArray) {
        self.datasets.entry(dataset).or_default().insert(array);
    }

    fn break_paths(&mut self) {
        for state in self.channels.values_mut() {
            state.last_position = None;
        }
    }
}

/// Owner of every profile's arrays and channel state
#[derive(Debug, Clone)]
pub struct TrackAccumulator {
    config: AccumulatorConfig,
    profiles: HashMap<String, ProfileTracks>,
}

impl TrackAccumulator {
    pub fn new(config: AccumulatorConfig) -> TrackResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            profiles: HashMap::new(),
        })
    }

    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileTracks> {
        self.profiles.get(name)
    }

    pub fn profile_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Replace a profile wholesale (used when loading from disk)
    pub fn insert_profile(&mut self, name: impl Into<String>, tracks: ProfileTracks) {
        self.profiles.insert(name.into(), tracks);
    }

    /// Drop a profile's data; its channels start over from idle
    pub fn reset_profile(&mut self, name: &str) -> bool {
        self.profiles.remove(name).is_some()
    }

    /// Forget every channel's last position in every profile.
    ///
    /// Called on topology changes so no line is drawn across the old and new layout.
    pub fn break_paths(&mut self) {
        for tracks in self.profiles.values_mut() {
            tracks.break_paths();
        }
    }

    /// Forget the last positions of one profile.
    ///
    /// Called when a profile stops being active, so coming back to it later
    /// does not join the old and new positions with a line.
    pub fn break_profile_paths(&mut self, profile: &str) {
        if let Some(tracks) = self.profiles.get_mut(profile) {
            tracks.break_paths();
        }
    }

    /// Consistent copy of one dataset's arrays
    pub fn snapshot(&self, profile: &str, dataset: Dataset) -> BTreeMap<Resolution, TrackArray> {
        self.profiles
            .get(profile)
            .and_then(|p| p.datasets.get(&dataset))
            .map(ResolutionArrays::snapshot)
            .unwrap_or_default()
    }

    /// Record one movement sample
    pub fn record(
        &mut self,
        profile: &str,
        channel: Channel,
        position: Point,
        layout: &MonitorLayout,
    ) -> RecordOutcome {
        let config = &self.config;
        let tracks = self.profiles.entry(profile.to_string()).or_default();
        let ProfileTracks { channels, datasets } = tracks;
        let state = channels.entry(channel).or_default();
        state.phase = ChannelPhase::Recording;

        let last = match state.last_position {
            Some(last) if last != position => last,
            _ => {
                state.last_position = Some(position);
                return RecordOutcome::default();
            }
        };

        let arrays = datasets.entry(Dataset::Movement(channel)).or_default();
        let mut pixels = 0;
        for pixel in Line::new(last, position) {
            let (resolution, local) = locate(channel, pixel, layout, config.radial_side);
            if arrays.ensure(resolution).increment(local) {
                pixels += 1;
            }
        }

        state.distance += last.distance(&position);
        state.event_counter += 1;
        state.last_position = Some(position);

        let (counter, cycles) = compress_counter(
            state.event_counter,
            config.compression_threshold,
            config.compression_ratio,
        );
        if cycles > 0 {
            tracing::debug!(
                "Compressed {} event counter for {} ({} -> {})",
                channel,
                profile,
                state.event_counter,
                counter
            );
            state.event_counter = counter;
        }

        let interval = redraw_interval(state.event_counter, config.max_redraw_interval);
        RecordOutcome {
            pixels,
            compressed: cycles > 0,
            redraw_due: state.event_counter % interval == 0,
        }
    }

    /// Record one button press at a logical position
    pub fn record_click(
        &mut self,
        profile: &str,
        button: MouseButton,
        position: Point,
        layout: &MonitorLayout,
    ) -> bool {
        let hit = layout.map_logical_to_physical(position);
        self.profiles
            .entry(profile.to_string())
            .or_default()
            .datasets
            .entry(Dataset::Clicks(button))
            .or_default()
            .ensure(hit.resolution)
            .increment(hit.local)
    }
}

/// Target array resolution and local coordinate for one pixel
fn locate(
    channel: Channel,
    pixel: Point,
    layout: &MonitorLayout,
    radial_side: u32,
) -> (Resolution, Point) {
    if channel.is_radial() {
        let max = radial_side.saturating_sub(1) as i32;
        return (
            Resolution::new(radial_side, radial_side),
            Point::new(pixel.x.clamp(0, max), pixel.y.clamp(0, max)),
        );
    }
    let hit = layout.map_logical_to_physical(pixel);
    (hit.resolution, hit.local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::monitor::MonitorRect;
    use crate::recorder::error::TrackError;

    fn small_layout() -> MonitorLayout {
        MonitorLayout::unscaled(vec![MonitorRect::new(0, 0, 10, 10)]).unwrap()
    }

    #[test]
    fn test_first_sample_only_sets_position() {
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        let outcome = tracks.record("Main", Channel::Cursor, Point::new(2, 2), &small_layout());
        assert_eq!(outcome.pixels, 0);

        let state = tracks.profile("Main").unwrap().channel(Channel::Cursor).unwrap();
        assert_eq!(state.phase, ChannelPhase::Recording);
        assert_eq!(state.last_position, Some(Point::new(2, 2)));
        assert_eq!(state.event_counter, 0);
        assert!(tracks.snapshot("Main", Dataset::Movement(Channel::Cursor)).is_empty());
    }

    #[test]
    fn test_stationary_sample_is_not_counted() {
        let layout = small_layout();
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        tracks.record("Main", Channel::Cursor, Point::new(0, 0), &layout);
        tracks.record("Main", Channel::Cursor, Point::new(1, 0), &layout);
        tracks.record("Main", Channel::Cursor, Point::new(1, 0), &layout);

        let arrays = tracks.snapshot("Main", Dataset::Movement(Channel::Cursor));
        let array = &arrays[&Resolution::new(10, 10)];
        assert_eq!(array.get(1, 0), 1);
        assert_eq!(array.total(), 1);
        let state = tracks.profile("Main").unwrap().channel(Channel::Cursor).unwrap();
        assert_eq!(state.event_counter, 1);
    }

    #[test]
    fn test_counter_saturates_at_ceiling() {
        let mut array = TrackArray::new(Resolution::new(2, 2));
        array.set(1, 1, COUNTER_CEILING - 1);
        assert!(array.increment(Point::new(1, 1)));
        assert!(array.increment(Point::new(1, 1)));
        assert_eq!(array.get(1, 1), COUNTER_CEILING);
        assert!(!array.increment(Point::new(2, 0)));
        assert!(!array.increment(Point::new(-1, 0)));
    }

    #[test]
    fn test_from_parts_checks_shape() {
        assert!(TrackArray::from_parts(2, 2, vec![0; 4]).is_ok());
        assert!(matches!(
            TrackArray::from_parts(2, 2, vec![0; 3]),
            Err(StorageError::ShapeMismatch { len: 3, .. })
        ));
    }

    #[test]
    fn test_compression_keeps_counter_below_threshold() {
        assert_eq!(compress_counter(100, 100, 0.5), (100, 0));
        let (counter, cycles) = compress_counter(425_001, 425_000, 1.0 / 1.1);
        assert_eq!(cycles, 1);
        assert_eq!(counter, 386_364);

        for ratio in [0.999_999, 0.9, 0.5, 0.01] {
            for counter in [101, 150, 1_000, 1_000_000] {
                let (compressed, cycles) = compress_counter(counter, 100, ratio);
                assert!(cycles > 0);
                assert!(compressed < 100, "{} at {} -> {}", counter, ratio, compressed);
            }
        }
    }

    #[test]
    fn test_compression_leaves_arrays_untouched() {
        let layout = small_layout();
        let config = AccumulatorConfig {
            compression_threshold: 3,
            compression_ratio: 0.5,
            ..AccumulatorConfig::default()
        };
        let mut compressed = TrackAccumulator::new(config).unwrap();
        let mut plain = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();

        let path = [(0, 0), (5, 0), (5, 5), (0, 5), (0, 0), (9, 9), (3, 7), (8, 1)];
        let mut compressions = 0;
        for (x, y) in path {
            let outcome = compressed.record("Main", Channel::Cursor, Point::new(x, y), &layout);
            plain.record("Main", Channel::Cursor, Point::new(x, y), &layout);
            if outcome.compressed {
                compressions += 1;
            }
            let state = compressed.profile("Main").unwrap().channel(Channel::Cursor).unwrap();
            if outcome.compressed {
                assert!(state.event_counter < 3);
            }
        }

        assert!(compressions > 0);
        let dataset = Dataset::Movement(Channel::Cursor);
        assert_eq!(
            compressed.snapshot("Main", dataset),
            plain.snapshot("Main", dataset)
        );
        let distance = |t: &TrackAccumulator| {
            t.profile("Main").unwrap().channel(Channel::Cursor).unwrap().distance
        };
        assert_eq!(distance(&compressed), distance(&plain));
    }

    #[test]
    fn test_redraw_interval_backs_off() {
        assert_eq!(redraw_interval(0, 1000), 10);
        assert_eq!(redraw_interval(9, 1000), 10);
        assert_eq!(redraw_interval(99, 1000), 10);
        assert_eq!(redraw_interval(100, 1000), 100);
        assert_eq!(redraw_interval(54_321, 1000), 1000);
        assert_eq!(redraw_interval(u64::MAX, 5000), 5000);
    }

    #[test]
    fn test_radial_channel_uses_square_array() {
        let config = AccumulatorConfig {
            radial_side: 16,
            ..AccumulatorConfig::default()
        };
        let mut tracks = TrackAccumulator::new(config).unwrap();
        let layout = small_layout();
        tracks.record("Main", Channel::LeftStick, Point::new(8, 8), &layout);
        tracks.record("Main", Channel::LeftStick, Point::new(20, 8), &layout);

        let arrays = tracks.snapshot("Main", Dataset::Movement(Channel::LeftStick));
        let array = &arrays[&Resolution::new(16, 16)];
        assert_eq!(array.get(15, 8), 6);
        assert_eq!(array.get(9, 8), 1);
    }

    #[test]
    fn test_points_on_second_monitor_use_its_resolution() {
        let layout = MonitorLayout::unscaled(vec![
            MonitorRect::new(0, 0, 4, 4),
            MonitorRect::new(4, 0, 10, 3),
        ])
        .unwrap();
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        tracks.record("Main", Channel::Cursor, Point::new(2, 1), &layout);
        tracks.record("Main", Channel::Cursor, Point::new(6, 1), &layout);

        let arrays = tracks.snapshot("Main", Dataset::Movement(Channel::Cursor));
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[&Resolution::new(4, 4)].total(), 1);
        let right = &arrays[&Resolution::new(6, 3)];
        assert_eq!(right.get(0, 1) + right.get(1, 1) + right.get(2, 1), 3);
    }

    #[test]
    fn test_click_counts_single_pixel() {
        let layout = small_layout();
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        assert!(tracks.record_click("Main", MouseButton::Left, Point::new(4, 4), &layout));
        assert!(tracks.record_click("Main", MouseButton::Left, Point::new(4, 4), &layout));

        let arrays = tracks.snapshot("Main", Dataset::Clicks(MouseButton::Left));
        assert_eq!(arrays[&Resolution::new(10, 10)].get(4, 4), 2);
        assert!(tracks.snapshot("Main", Dataset::Clicks(MouseButton::Right)).is_empty());
    }

    #[test]
    fn test_reset_and_break_paths() {
        let layout = small_layout();
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        tracks.record("Main", Channel::Cursor, Point::new(0, 0), &layout);
        tracks.break_paths();
        tracks.record("Main", Channel::Cursor, Point::new(5, 5), &layout);
        assert!(tracks.snapshot("Main", Dataset::Movement(Channel::Cursor)).is_empty());

        assert!(tracks.reset_profile("Main"));
        assert!(tracks.profile("Main").is_none());
        assert!(!tracks.reset_profile("Main"));
    }

    #[test]
    fn test_break_profile_paths_only_touches_that_profile() {
        let layout = small_layout();
        let mut tracks = TrackAccumulator::new(AccumulatorConfig::default()).unwrap();
        tracks.record("editor", Channel::Cursor, Point::new(0, 0), &layout);
        tracks.record("game", Channel::Cursor, Point::new(0, 0), &layout);
        tracks.break_profile_paths("editor");
        tracks.break_profile_paths("absent");

        let last = |t: &TrackAccumulator, profile: &str| {
            t.profile(profile).unwrap().channel(Channel::Cursor).unwrap().last_position
        };
        assert_eq!(last(&tracks, "editor"), None);
        assert_eq!(last(&tracks, "game"), Some(Point::new(0, 0)));
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let config = AccumulatorConfig {
            compression_threshold: 0,
            ..AccumulatorConfig::default()
        };
        assert!(matches!(
            TrackAccumulator::new(config),
            Err(TrackError::Configuration(_))
        ));
        assert_eq!(compress_counter(0, 0, 0.5), (0, 0));
        assert_eq!(compress_counter(7, 0, 0.5), (7, 0));
    }
}
