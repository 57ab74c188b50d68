use crate::capture::input::types::{
    Channel, ClickSample, MouseButton, PositionSample, TrackerEvent,
};
use crate::capture::platform::PlatformIO;
use crate::recorder::error::{TrackError, TrackResult};
use crate::recorder::Tracker;
use parking_lot::Mutex as ParkingMutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One iteration's worth of capture logic, separate from the thread so it can
/// be driven tick by tick.
pub struct CaptureLoop {
    platform: Arc<dyn PlatformIO>,
    tracker: Tracker,
    tick: u64,
    refresh_ticks: u64,
    held: BTreeSet<MouseButton>,
}

impl CaptureLoop {
    pub fn new(platform: Arc<dyn PlatformIO>, tracker: Tracker) -> Self {
        let refresh_ticks = u64::from(tracker.config().capture.topology_refresh_ticks.max(1));
        Self {
            platform,
            tracker,
            tick: 0,
            refresh_ticks,
            held: BTreeSet::new(),
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Poll the platform once and forward everything it reports
    pub fn step(&mut self) {
        if self.tick % self.refresh_ticks == 0 {
            match self.platform.monitors() {
                Ok((logical, physical)) => {
                    self.dispatch(TrackerEvent::MonitorTopologyChanged { logical, physical })
                }
                Err(e) => tracing::warn!("Failed to query monitors: {}", e),
            }
        }

        let frame = self.platform.poll();
        let timestamp_tick = self.tick;

        if let Some(profile) = frame.profile {
            if profile != self.tracker.active_profile() {
                self.dispatch(TrackerEvent::ProfileChanged { profile });
            }
        }

        let pressed: BTreeSet<MouseButton> = frame.buttons.into_iter().collect();
        if let Some(cursor) = frame.cursor {
            // Presses count on the down edge only
            for button in pressed.difference(&self.held) {
                self.dispatch(TrackerEvent::Click(ClickSample {
                    button: *button,
                    x: cursor.x,
                    y: cursor.y,
                    timestamp_tick,
                }));
            }
            self.dispatch(TrackerEvent::Position(PositionSample {
                channel: Channel::Cursor,
                x: cursor.x,
                y: cursor.y,
                timestamp_tick,
            }));
        }
        self.held = pressed;

        for (channel, point) in frame.sticks {
            self.dispatch(TrackerEvent::Position(PositionSample {
                channel,
                x: point.x,
                y: point.y,
                timestamp_tick,
            }));
        }

        self.tick += 1;
    }

    fn dispatch(&self, event: TrackerEvent) {
        if let Err(e) = self.tracker.handle(event) {
            tracing::warn!("Dropped capture event: {}", e);
        }
    }
}

/// Background thread polling a [`PlatformIO`] into a [`Tracker`]
pub struct CaptureWorker {
    is_running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    thread_handle: Arc<ParkingMutex<Option<std::thread::JoinHandle<()>>>>,
}

impl Default for CaptureWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureWorker {
    pub fn new() -> Self {
        Self {
            is_running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            thread_handle: Arc::new(ParkingMutex::new(None)),
        }
    }

    pub fn start(&self, platform: Arc<dyn PlatformIO>, tracker: Tracker) -> TrackResult<()> {
        if self.is_running.swap(true, Ordering::SeqCst) {
            return Err(TrackError::AlreadyRunning);
        }

        let poll_interval = Duration::from_millis(tracker.config().capture.poll_interval_ms);
        let is_running = self.is_running.clone();
        let ticks = self.ticks.clone();
        ticks.store(0, Ordering::SeqCst);
        let mut capture = CaptureLoop::new(platform, tracker);

        let handle = std::thread::Builder::new()
            .name("trackmap-capture".to_string())
            .spawn(move || {
                tracing::info!("Capture started (poll_interval={:?})", poll_interval);

                while is_running.load(Ordering::Relaxed) {
                    let loop_start = Instant::now();
                    capture.step();
                    ticks.store(capture.tick(), Ordering::Relaxed);

                    let elapsed = loop_start.elapsed();
                    if elapsed < poll_interval {
                        std::thread::sleep(poll_interval - elapsed);
                    }
                }

                tracing::info!("Capture stopped after {} ticks", capture.tick());
            });

        match handle {
            Ok(handle) => {
                *self.thread_handle.lock() = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.is_running.store(false, Ordering::SeqCst);
                Err(TrackError::Io(e))
            }
        }
    }

    pub fn stop(&self) {
        if !self.is_running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.thread_handle.lock().take() {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// Ticks completed by the current (or last) run
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
