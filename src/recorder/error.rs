//! Error taxonomy
//!
//! Configuration problems (empty topologies, bad colour stops, invalid
//! thickness) fail fast with one of these errors. Missing data, counter
//! saturation and DPI rounding are absorbed by the core and never show up here.

use thiserror::Error;

/// Errors raised while building or swapping a monitor topology
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Monitor topology is empty")]
    Empty,

    #[error("Logical and physical topologies differ in length ({logical} vs {physical})")]
    LengthMismatch { logical: usize, physical: usize },

    #[error("Monitor {index} has inverted bounds ({x1}, {y1}, {x2}, {y2})")]
    InvertedRect {
        index: usize,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
}

/// Errors raised by the curve rasterizer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("Outline thickness must be at least 1, got {0}")]
    InvalidThickness(u32),

    #[error("Canvas must have a non-zero size, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },

    #[error("Sample count must be at least 1")]
    NoSamples,
}

/// Errors raised while building a colour map
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColourError {
    #[error("Colour map has no stops")]
    NoStops,

    #[error("Colour stop {index} has offset {offset} outside [0, 1]")]
    OffsetOutOfRange { index: usize, offset: f64 },

    #[error("Colour stop {index} has offset {offset} below the previous stop")]
    NotMonotonic { index: usize, offset: f64 },

    #[error("Unknown colour name: {0}")]
    UnknownColour(String),

    #[error("Invalid colour map name: {0}")]
    InvalidName(String),
}

/// Errors raised while saving or loading a profile
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Track array is {width}x{height} but holds {len} counters")]
    ShapeMismatch { width: u32, height: u32, len: usize },
}

/// Errors raised by a render request
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render request: {0}")]
    InvalidRequest(String),

    #[error("Render superseded by a newer request")]
    Superseded,

    #[error("Colour error: {0}")]
    Colour(#[from] ColourError),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Render task failed: {0}")]
    Task(String),
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum TrackError {
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("Colour error: {0}")]
    Colour(#[from] ColourError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Capture already running")]
    AlreadyRunning,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tracker operations
pub type TrackResult<T> = Result<T, TrackError>;
