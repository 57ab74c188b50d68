//! Engine configuration
//!
//! Tuned constants live here rather than in the algorithms so they can be
//! exercised by tests and overridden from a JSON file.

use crate::processing::compositor::{MergeMode, PixelFormat, Resample};
use crate::recorder::error::{TrackError, TrackResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub capture: CaptureConfig,
    pub accumulator: AccumulatorConfig,
    pub topology: TopologyConfig,
    pub render: RenderDefaults,
}

/// Capture worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Poll interval for the cursor position (16ms is roughly 60 updates/second)
    pub poll_interval_ms: u64,
    /// Number of polls between monitor enumerations
    pub topology_refresh_ticks: u32,
    /// Profile used when the platform reports no foreground application
    pub default_profile: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16,
            topology_refresh_ticks: 60,
            default_profile: "Main".to_string(),
        }
    }
}

/// Accumulation and counter compression settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccumulatorConfig {
    /// Event count above which the counter is compressed
    pub compression_threshold: u64,
    /// Multiplier applied to the event counter on compression, in (0, 1)
    pub compression_ratio: f64,
    /// Side length of the square arrays used by thumbstick channels
    pub radial_side: u32,
    /// Upper bound on the redraw cadence
    pub max_redraw_interval: u64,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            compression_threshold: 425_000,
            compression_ratio: 1.0 / 1.1,
            radial_side: 2048,
            max_redraw_interval: 1000,
        }
    }
}

impl AccumulatorConfig {
    pub fn validate(&self) -> TrackResult<()> {
        let ratio = self.compression_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(TrackError::Configuration(format!(
                "compressionRatio must be in (0, 1), got {}",
                ratio
            )));
        }
        if self.compression_threshold == 0 {
            return Err(TrackError::Configuration(
                "compressionThreshold must be > 0".to_string(),
            ));
        }
        if self.radial_side == 0 {
            return Err(TrackError::Configuration(
                "radialSide must be > 0".to_string(),
            ));
        }
        if self.max_redraw_interval == 0 {
            return Err(TrackError::Configuration(
                "maxRedrawInterval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Off-bounds monitor resolution weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopologyConfig {
    pub horizontal_weight: u32,
    pub vertical_weight: u32,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            horizontal_weight: 2,
            vertical_weight: 1,
        }
    }
}

/// Defaults applied to render requests that leave a field unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderDefaults {
    pub track_colour_map: String,
    pub heatmap_colour_map: String,
    pub track_mode: MergeMode,
    pub heatmap_mode: MergeMode,
    pub heatmap_blur_sigma: f64,
    pub clip_percentile: f64,
    pub contrast_exponent: f64,
    pub resample: Resample,
    pub format: PixelFormat,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            track_colour_map: "Ice".to_string(),
            heatmap_colour_map: "Heatmap".to_string(),
            track_mode: MergeMode::Max,
            heatmap_mode: MergeMode::Sum,
            heatmap_blur_sigma: 8.0,
            clip_percentile: 1.0,
            contrast_exponent: 1.0,
            resample: Resample::Nearest,
            format: PixelFormat::Rgba,
        }
    }
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> TrackResult<()> {
        if self.capture.poll_interval_ms == 0 {
            return Err(TrackError::Configuration(
                "pollIntervalMs must be > 0".to_string(),
            ));
        }
        if self.capture.default_profile.trim().is_empty() {
            return Err(TrackError::Configuration(
                "defaultProfile must not be empty".to_string(),
            ));
        }
        self.accumulator.validate()?;
        if !(0.0..=1.0).contains(&self.render.clip_percentile) || self.render.clip_percentile == 0.0
        {
            return Err(TrackError::Configuration(format!(
                "clipPercentile must be in (0, 1], got {}",
                self.render.clip_percentile
            )));
        }
        if !(self.render.contrast_exponent > 0.0) {
            return Err(TrackError::Configuration(format!(
                "contrastExponent must be > 0, got {}",
                self.render.contrast_exponent
            )));
        }
        if !(self.render.heatmap_blur_sigma >= 0.0) {
            return Err(TrackError::Configuration(format!(
                "heatmapBlurSigma must be >= 0, got {}",
                self.render.heatmap_blur_sigma
            )));
        }
        Ok(())
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> TrackResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| TrackError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> TrackResult<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Save config to a JSON file
    pub fn save(&self, path: &Path) -> TrackResult<()> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| TrackError::Configuration(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.accumulator.compression_threshold, 425_000);
        assert_eq!(config.topology.horizontal_weight, 2);
    }

    #[test]
    fn test_rejects_ratio_outside_unit_interval() {
        let mut config = EngineConfig::default();
        config.accumulator.compression_ratio = 1.0;
        assert!(config.validate().is_err());
        config.accumulator.compression_ratio = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"accumulator": {"compressionThreshold": 1000}}"#).unwrap();
        assert_eq!(config.accumulator.compression_threshold, 1000);
        assert_eq!(config.accumulator.radial_side, 2048);
        assert_eq!(config.capture.poll_interval_ms, 16);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = EngineConfig::default();
        config.topology.horizontal_weight = 3;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        let config = EngineConfig::load_or_default(Some(&path)).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
