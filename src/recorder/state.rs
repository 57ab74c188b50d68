use crate::capture::input::types::{Channel, Dataset};
use crate::config::RenderDefaults;
use crate::processing::accumulator::ChannelPhase;
use crate::processing::colour::{ColourMap, ColourStop};
use crate::processing::compositor::{MergeMode, PixelFormat, RenderOptions, Resample};
use crate::recorder::error::{ColourError, RenderError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Colour map by name (`"Ice"`, `"BlackToRed"`) or as explicit stops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColourSpec {
    Named(String),
    Stops(Vec<ColourStop>),
}

impl ColourSpec {
    pub fn build(&self) -> Result<ColourMap, ColourError> {
        match self {
            ColourSpec::Named(name) => ColourMap::parse(name),
            ColourSpec::Stops(stops) => ColourMap::new(stops.clone()),
        }
    }
}

/// Where a finished render goes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    /// Returned to the caller only
    #[default]
    Preview,
    /// Also written to disk as a PNG
    FilePath(PathBuf),
}

/// Render request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub profile: String,
    pub dataset: Dataset,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub colour: ColourSpec,
    pub sampling: u32,
    pub mode: MergeMode,
    pub resample: Resample,
    pub clip_percentile: f64,
    pub blur_sigma: f64,
    pub contrast_exponent: f64,
    pub ceiling: Option<f64>,
    pub format: PixelFormat,
    pub destination: Destination,
}

impl RenderRequest {
    /// Request using the configured defaults for the dataset's render type
    pub fn new(profile: impl Into<String>, dataset: Dataset, defaults: &RenderDefaults) -> Self {
        let settings = RenderSettings::for_type(RenderType::for_dataset(dataset), defaults);
        Self {
            profile: profile.into(),
            dataset,
            width: None,
            height: None,
            colour: ColourSpec::Named(settings.colour_map),
            sampling: 1,
            mode: settings.mode,
            resample: defaults.resample,
            clip_percentile: defaults.clip_percentile,
            blur_sigma: settings.blur_sigma,
            contrast_exponent: defaults.contrast_exponent,
            ceiling: None,
            format: defaults.format,
            destination: Destination::Preview,
        }
    }

    /// Validated compositor options for this request
    pub fn options(&self) -> Result<RenderOptions, RenderError> {
        let options = RenderOptions {
            mode: self.mode,
            resample: self.resample,
            contrast_exponent: self.contrast_exponent,
            blur_sigma: self.blur_sigma,
            clip_percentile: self.clip_percentile,
            ceiling: self.ceiling,
            sampling: self.sampling,
            format: self.format,
            colour_map: self.colour.build()?,
        };
        options.validate()?;
        if matches!(self.width, Some(0)) || matches!(self.height, Some(0)) {
            return Err(RenderError::InvalidRequest(
                "width and height must be > 0".to_string(),
            ));
        }
        Ok(options)
    }
}

/// What kind of image a render produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RenderType {
    /// Movement density, merged with max
    #[default]
    Track,
    /// Summed and blurred intensity
    Heatmap,
}

impl RenderType {
    pub fn for_dataset(dataset: Dataset) -> Self {
        match dataset {
            Dataset::Movement(_) => RenderType::Track,
            Dataset::Clicks(_) => RenderType::Heatmap,
        }
    }

    /// Colour maps offered for this render type
    pub fn colour_options(&self) -> Vec<String> {
        let names: &[&str] = match self {
            RenderType::Track => &["Ice", "Citrus", "Sunburst", "Demon", "Lime"],
            RenderType::Heatmap => &["Heatmap", "Jet", "Sunburst"],
        };
        names.iter().map(|s| s.to_string()).collect()
    }
}

/// User-facing render settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSettings {
    pub render_type: RenderType,
    pub colour_map: String,
    pub mode: MergeMode,
    pub blur_sigma: f64,
}

impl RenderSettings {
    pub fn for_type(render_type: RenderType, defaults: &RenderDefaults) -> Self {
        match render_type {
            RenderType::Track => Self {
                render_type,
                colour_map: defaults.track_colour_map.clone(),
                mode: defaults.track_mode,
                blur_sigma: 0.0,
            },
            RenderType::Heatmap => Self {
                render_type,
                colour_map: defaults.heatmap_colour_map.clone(),
                mode: defaults.heatmap_mode,
                blur_sigma: defaults.heatmap_blur_sigma,
            },
        }
    }

    /// Apply these settings to a request
    pub fn apply(&self, request: &mut RenderRequest) {
        request.colour = ColourSpec::Named(self.colour_map.clone());
        request.mode = self.mode;
        request.blur_sigma = self.blur_sigma;
    }
}

/// Switch render type, returning the new settings and the colour maps that
/// are now selectable.
///
/// A colour map that is still offered under the new type is kept; otherwise
/// the type's default takes over. Mode and blur always follow the new type.
pub fn set_render_type(
    settings: RenderSettings,
    new_type: RenderType,
    defaults: &RenderDefaults,
) -> (RenderSettings, Vec<String>) {
    let options = new_type.colour_options();
    if settings.render_type == new_type {
        return (settings, options);
    }

    let mut next = RenderSettings::for_type(new_type, defaults);
    if options.iter().any(|o| o.eq_ignore_ascii_case(&settings.colour_map)) {
        next.colour_map = settings.colour_map;
    }
    (next, options)
}

/// Live per-channel statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel: Channel,
    pub phase: ChannelPhase,
    /// Cumulative path length in pixels
    pub distance: f64,
    pub event_counter: u64,
    /// Events between preview redraws at the current count
    pub redraw_interval: u64,
}
