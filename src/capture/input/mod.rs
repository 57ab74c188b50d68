//! Input tracking (pointer, buttons, thumbsticks)
//!
//! Event payloads the tracker consumes, and the worker thread that polls a
//! [`PlatformIO`](crate::capture::platform::PlatformIO) to produce them.

pub mod channel;
pub mod types;

pub use channel::{CaptureLoop, CaptureWorker};
pub use types::{Channel, ClickSample, Dataset, MouseButton, PositionSample, TrackerEvent};
