//! Capture-side types
//!
//! Monitor topology, the platform seam, and the input events and worker that
//! feed the tracker.

pub mod input;
pub mod monitor;
pub mod platform;

pub use input::CaptureWorker;
pub use monitor::{MonitorLayout, MonitorRect, MonitorTopology, Point, Resolution};
pub use platform::{PlatformFrame, PlatformIO, ScriptedPlatform};
