//! Numerical core
//!
//! Rasterization of motion into pixels, accumulation into counter arrays, and
//! compositing those arrays into colour-mapped images.

pub mod accumulator;
pub mod bezier;
pub mod colour;
pub mod compositor;
pub mod line;

pub use accumulator::{TrackAccumulator, TrackArray};
pub use colour::{ColourMap, Rgba};
pub use compositor::{compose, MergeMode, PixelFormat, RenderOptions, RenderResult, Resample};
