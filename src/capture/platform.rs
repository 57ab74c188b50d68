//! Platform capability seam
//!
//! The tracker never talks to the OS directly. Everything it needs from the
//! platform (pointer position, held buttons, stick deflection, the foreground
//! application and the monitor layout) comes through [`PlatformIO`], which is
//! injected into the capture worker.

use crate::capture::input::types::{Channel, MouseButton};
use crate::capture::monitor::{MonitorRect, Point};
use crate::recorder::error::TopologyError;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// State of every input observed in one poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformFrame {
    /// Pointer position in logical coordinates
    pub cursor: Option<Point>,
    /// Buttons currently held down
    pub buttons: Vec<MouseButton>,
    /// Thumbstick positions, already projected into the radial square
    pub sticks: Vec<(Channel, Point)>,
    /// Profile of the foreground application, if known
    pub profile: Option<String>,
}

/// OS primitives the capture worker polls
pub trait PlatformIO: Send + Sync {
    fn poll(&self) -> PlatformFrame;

    /// Current (logical, physical) monitor lists, index-aligned
    fn monitors(&self) -> Result<(Vec<MonitorRect>, Vec<MonitorRect>), TopologyError>;
}

/// Platform that plays back a fixed list of frames.
///
/// Once the script runs out the last frame repeats, which looks like an idle
/// user to the worker.
#[derive(Debug, Default)]
pub struct ScriptedPlatform {
    frames: Mutex<VecDeque<PlatformFrame>>,
    last: Mutex<PlatformFrame>,
    monitors: Mutex<(Vec<MonitorRect>, Vec<MonitorRect>)>,
}

impl ScriptedPlatform {
    pub fn new(monitors: Vec<MonitorRect>) -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            last: Mutex::new(PlatformFrame::default()),
            monitors: Mutex::new((monitors.clone(), monitors)),
        }
    }

    pub fn push(&self, frame: PlatformFrame) {
        self.frames.lock().push_back(frame);
    }

    /// Queue a frame with only the pointer set
    pub fn push_cursor(&self, x: i32, y: i32) {
        self.push(PlatformFrame {
            cursor: Some(Point::new(x, y)),
            ..Default::default()
        });
    }

    pub fn set_monitors(&self, logical: Vec<MonitorRect>, physical: Vec<MonitorRect>) {
        *self.monitors.lock() = (logical, physical);
    }

    pub fn remaining(&self) -> usize {
        self.frames.lock().len()
    }
}

impl PlatformIO for ScriptedPlatform {
    fn poll(&self) -> PlatformFrame {
        let mut last = self.last.lock();
        if let Some(frame) = self.frames.lock().pop_front() {
            *last = frame;
        }
        last.clone()
    }

    fn monitors(&self) -> Result<(Vec<MonitorRect>, Vec<MonitorRect>), TopologyError> {
        let (logical, physical) = self.monitors.lock().clone();
        if logical.is_empty() {
            return Err(TopologyError::Empty);
        }
        Ok((logical, physical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_platform_repeats_last_frame() {
        let platform = ScriptedPlatform::new(vec![MonitorRect::new(0, 0, 10, 10)]);
        assert_eq!(platform.poll(), PlatformFrame::default());

        platform.push_cursor(1, 2);
        platform.push_cursor(3, 4);
        assert_eq!(platform.remaining(), 2);
        assert_eq!(platform.poll().cursor, Some(Point::new(1, 2)));
        assert_eq!(platform.poll().cursor, Some(Point::new(3, 4)));
        assert_eq!(platform.poll().cursor, Some(Point::new(3, 4)));
    }

    #[test]
    fn test_empty_monitor_list_is_an_error() {
        let platform = ScriptedPlatform::new(vec![]);
        assert_eq!(platform.monitors(), Err(TopologyError::Empty));
    }
}
