//! Compositing track arrays into an image
//!
//! Arrays recorded at different resolutions are mapped onto one canvas at the
//! target resolution and combined, then run through the post-merge pipeline:
//! contrast, blur, range normalisation and colour mapping. The order of those
//! stages matters and is fixed here.

use crate::capture::monitor::Resolution;
use crate::processing::accumulator::TrackArray;
use crate::processing::colour::ColourMap;
use crate::recorder::error::RenderError;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Pixel, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How values from different source arrays combine on one pixel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMode {
    /// Add every source's value (heatmaps)
    Sum,
    /// Keep the highest source value (track density), so a resolution with
    /// few samples can't dilute a busy one
    #[default]
    Max,
}

/// How a source array is mapped onto a canvas of a different size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resample {
    #[default]
    Nearest,
    /// Average every source pixel covered by a target pixel
    Area,
}

/// Output pixel layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PixelFormat {
    Luma,
    Rgb,
    #[default]
    Rgba,
}

impl PixelFormat {
    pub fn channels(&self) -> u8 {
        match self {
            PixelFormat::Luma => 1,
            PixelFormat::Rgb => 3,
            PixelFormat::Rgba => 4,
        }
    }
}

macro_rules! impl_name_parsing {
    ($ty:ty { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant { return write!(f, $name); })+
                Ok(())
            }
        }
    };
}

impl_name_parsing!(MergeMode { "sum" => MergeMode::Sum, "max" => MergeMode::Max });
impl_name_parsing!(Resample { "nearest" => Resample::Nearest, "area" => Resample::Area });
impl_name_parsing!(PixelFormat {
    "luma" => PixelFormat::Luma,
    "rgb" => PixelFormat::Rgb,
    "rgba" => PixelFormat::Rgba,
});

/// Floating point canvas the pipeline works on
#[derive(Debug, Clone, PartialEq)]
pub struct RawCanvas {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl RawCanvas {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            width: resolution.width,
            height: resolution.height,
            values: vec![0.0; resolution.area() as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> f64 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y as usize * self.width as usize + x as usize]
    }

    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

/// Source index range covered by target index `t`
fn source_span(t: u32, target: u32, source: u32, resample: Resample) -> (u32, u32) {
    let start = (u64::from(t) * u64::from(source) / u64::from(target)) as u32;
    match resample {
        Resample::Nearest => (start, start + 1),
        Resample::Area => {
            let end = (u64::from(t + 1) * u64::from(source)).div_ceil(u64::from(target)) as u32;
            (start, end.max(start + 1).min(source))
        }
    }
}

/// Map one array onto `canvas` and combine it in with `mode`
pub fn merge_into(canvas: &mut RawCanvas, array: &TrackArray, mode: MergeMode, resample: Resample) {
    let (sw, sh) = (array.width(), array.height());
    if sw == 0 || sh == 0 || canvas.width == 0 || canvas.height == 0 {
        return;
    }
    let counts = array.counts();
    let columns: Vec<(u32, u32)> = (0..canvas.width)
        .map(|tx| source_span(tx, canvas.width, sw, resample))
        .collect();

    for ty in 0..canvas.height {
        let (y0, y1) = source_span(ty, canvas.height, sh, resample);
        let row = ty as usize * canvas.width as usize;
        for (tx, &(x0, x1)) in columns.iter().enumerate() {
            let mut sum = 0.0;
            for sy in y0..y1 {
                let base = sy as usize * sw as usize;
                for sx in x0..x1 {
                    sum += f64::from(counts[base + sx as usize]);
                }
            }
            let value = sum / f64::from((x1 - x0) * (y1 - y0));

            let target = &mut canvas.values[row + tx];
            *target = match mode {
                MergeMode::Sum => *target + value,
                MergeMode::Max => target.max(value),
            };
        }
    }
}

/// Combine every array onto a fresh canvas at `target`
pub fn merge(
    arrays: &BTreeMap<Resolution, TrackArray>,
    target: Resolution,
    mode: MergeMode,
    resample: Resample,
) -> RawCanvas {
    let mut canvas = RawCanvas::new(target);
    for array in arrays.values() {
        merge_into(&mut canvas, array, mode, resample);
    }
    canvas
}

/// Raise every value to `exponent`
pub fn apply_contrast(canvas: &mut RawCanvas, exponent: f64) {
    if exponent == 1.0 {
        return;
    }
    for value in &mut canvas.values {
        *value = value.powf(exponent);
    }
}

/// Normalised kernel of radius `3 * sigma`, capped at `max_radius`
fn gaussian_kernel(sigma: f64, max_radius: i64) -> Vec<f64> {
    let radius = ((sigma * 3.0).ceil() as i64).clamp(0, max_radius);
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f64> = (-radius..=radius)
        .map(|i| (-(i * i) as f64 / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Separable Gaussian blur with clamp-to-edge borders.
///
/// Taps further out than the longer canvas side would only re-read the edge
/// sample, so the kernel stops there.
pub fn gaussian_blur(canvas: &RawCanvas, sigma: f64) -> RawCanvas {
    if !(sigma > 0.0) || canvas.values.is_empty() {
        return canvas.clone();
    }
    let kernel = gaussian_kernel(sigma, i64::from(canvas.width.max(canvas.height)));
    let radius = (kernel.len() / 2) as i64;
    let (w, h) = (canvas.width as i64, canvas.height as i64);

    let pass = |src: &[f64], horizontal: bool| -> Vec<f64> {
        let mut out = vec![0.0; src.len()];
        for y in 0..h {
            for x in 0..w {
                let mut acc = 0.0;
                for (k, weight) in kernel.iter().enumerate() {
                    let offset = k as i64 - radius;
                    let (sx, sy) = if horizontal {
                        ((x + offset).clamp(0, w - 1), y)
                    } else {
                        (x, (y + offset).clamp(0, h - 1))
                    };
                    acc += weight * src[(sy * w + sx) as usize];
                }
                out[(y * w + x) as usize] = acc;
            }
        }
        out
    };

    let horizontal = pass(&canvas.values, true);
    RawCanvas {
        width: canvas.width,
        height: canvas.height,
        values: pass(&horizontal, false),
    }
}

/// Value at `percentile` (0..=1) among the non-zero values
fn percentile_of_nonzero(values: &[f64], percentile: f64) -> Option<f64> {
    let mut nonzero: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    if nonzero.is_empty() {
        return None;
    }
    nonzero.sort_by(f64::total_cmp);
    let index = ((nonzero.len() - 1) as f64 * percentile).round() as usize;
    Some(nonzero[index.min(nonzero.len() - 1)])
}

/// Rescale values linearly into [0, 1].
///
/// The floor is the data minimum. The ceiling is `ceiling` when given,
/// otherwise the `clip_percentile` of the non-zero values (1.0 is the maximum).
/// Values past the ceiling saturate at 1.
pub fn normalise(canvas: &mut RawCanvas, ceiling: Option<f64>, clip_percentile: f64) {
    let floor = canvas.values.iter().copied().fold(f64::INFINITY, f64::min);
    let ceiling = match ceiling {
        Some(ceiling) => ceiling,
        None if clip_percentile < 1.0 => {
            percentile_of_nonzero(&canvas.values, clip_percentile).unwrap_or(0.0)
        }
        None => canvas.values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    let range = ceiling - floor;
    for value in &mut canvas.values {
        *value = if range > 0.0 {
            ((*value - floor) / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}

/// Convert normalised values to pixels
pub fn colourise(canvas: &RawCanvas, map: &ColourMap, format: PixelFormat) -> Vec<u8> {
    let channels = format.channels() as usize;
    let mut pixels = Vec::with_capacity(canvas.values.len() * channels);
    for value in &canvas.values {
        match format {
            PixelFormat::Luma => pixels.push((value.clamp(0.0, 1.0) * 255.0).round() as u8),
            PixelFormat::Rgb => pixels.extend_from_slice(&map.map(*value).to_array()[..3]),
            PixelFormat::Rgba => pixels.extend_from_slice(&map.map(*value).to_array()),
        }
    }
    pixels
}

/// Nearest-neighbour resize of packed `P` pixels
fn upscale<P>(pixels: Vec<u8>, from: Resolution, to: Resolution) -> Result<Vec<u8>, RenderError>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    if from == to {
        return Ok(pixels);
    }
    let buffer = ImageBuffer::<P, Vec<u8>>::from_raw(from.width, from.height, pixels)
        .ok_or_else(|| RenderError::InvalidRequest(format!("pixel buffer is not {}", from)))?;
    Ok(imageops::resize(&buffer, to.width, to.height, FilterType::Nearest).into_raw())
}

/// Everything that shapes a render besides its data and size
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub mode: MergeMode,
    pub resample: Resample,
    pub contrast_exponent: f64,
    pub blur_sigma: f64,
    pub clip_percentile: f64,
    /// Fixed normalisation ceiling instead of the data maximum
    pub ceiling: Option<f64>,
    /// Merge at `target / sampling` and scale the result back up
    pub sampling: u32,
    pub format: PixelFormat,
    pub colour_map: ColourMap,
}

impl RenderOptions {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.sampling == 0 {
            return Err(RenderError::InvalidRequest("sampling must be >= 1".to_string()));
        }
        if !(self.contrast_exponent > 0.0) || !self.contrast_exponent.is_finite() {
            return Err(RenderError::InvalidRequest(format!(
                "contrast exponent must be > 0, got {}",
                self.contrast_exponent
            )));
        }
        if !(self.blur_sigma >= 0.0) || !self.blur_sigma.is_finite() {
            return Err(RenderError::InvalidRequest(format!(
                "blur sigma must be >= 0, got {}",
                self.blur_sigma
            )));
        }
        if !(self.clip_percentile > 0.0 && self.clip_percentile <= 1.0) {
            return Err(RenderError::InvalidRequest(format!(
                "clip percentile must be in (0, 1], got {}",
                self.clip_percentile
            )));
        }
        Ok(())
    }
}

/// Finished image. A zero-sized result means there was nothing to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
}

impl RenderResult {
    /// Sentinel for requests with no data and no explicit size
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            pixels: Vec::new(),
        }
    }

    /// Fully transparent image
    pub fn blank(resolution: Resolution, format: PixelFormat) -> Self {
        let channels = format.channels();
        Self {
            width: resolution.width,
            height: resolution.height,
            channels,
            pixels: vec![0; resolution.area() as usize * channels as usize],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

/// Output size for a render.
///
/// Falls back to the largest source resolution; a single given side keeps
/// that resolution's aspect ratio.
pub fn target_resolution(
    arrays: &BTreeMap<Resolution, TrackArray>,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<Resolution> {
    if let (Some(width), Some(height)) = (width, height) {
        return Some(Resolution::new(width, height));
    }
    let largest = arrays.keys().copied().max_by_key(|r| (r.area(), r.width))?;
    let scaled = |value: u32, numerator: u32, denominator: u32| -> u32 {
        ((f64::from(value) * f64::from(numerator) / f64::from(denominator.max(1))).round() as u32)
            .max(1)
    };
    Some(match (width, height) {
        (Some(width), None) => Resolution::new(width, scaled(width, largest.height, largest.width)),
        (None, Some(height)) => {
            Resolution::new(scaled(height, largest.width, largest.height), height)
        }
        _ => largest,
    })
}

/// Run the whole pipeline. `cancelled` is polled between stages so a
/// superseded render can stop early.
pub fn compose(
    arrays: &BTreeMap<Resolution, TrackArray>,
    width: Option<u32>,
    height: Option<u32>,
    options: &RenderOptions,
    cancelled: &dyn Fn() -> bool,
) -> Result<RenderResult, RenderError> {
    options.validate()?;
    let Some(target) = target_resolution(arrays, width, height) else {
        return Ok(RenderResult::empty());
    };
    if target.area() == 0 {
        return Ok(RenderResult::empty());
    }
    if arrays.is_empty() {
        return Ok(RenderResult::blank(target, options.format));
    }

    let working = Resolution::new(
        target.width.div_ceil(options.sampling),
        target.height.div_ceil(options.sampling),
    );

    let mut canvas = RawCanvas::new(working);
    for array in arrays.values() {
        if cancelled() {
            return Err(RenderError::Superseded);
        }
        merge_into(&mut canvas, array, options.mode, options.resample);
    }

    apply_contrast(&mut canvas, options.contrast_exponent);
    if cancelled() {
        return Err(RenderError::Superseded);
    }

    let blur_sigma = options.blur_sigma / f64::from(options.sampling);
    let mut canvas = gaussian_blur(&canvas, blur_sigma);
    if cancelled() {
        return Err(RenderError::Superseded);
    }

    normalise(&mut canvas, options.ceiling, options.clip_percentile);
    let pixels = colourise(&canvas, &options.colour_map, options.format);
    let pixels = match options.format {
        PixelFormat::Luma => upscale::<Luma<u8>>(pixels, working, target)?,
        PixelFormat::Rgb => upscale::<Rgb<u8>>(pixels, working, target)?,
        PixelFormat::Rgba => upscale::<image::Rgba<u8>>(pixels, working, target)?,
    };

    Ok(RenderResult {
        width: target.width,
        height: target.height,
        channels: options.format.channels(),
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::monitor::Point;
    use crate::processing::colour::Rgba;

    fn array(width: u32, height: u32, cells: &[(u32, u32, u32)]) -> TrackArray {
        let mut array = TrackArray::new(Resolution::new(width, height));
        for &(x, y, v) in cells {
            array.set(x, y, v);
        }
        array
    }

    fn options() -> RenderOptions {
        RenderOptions {
            mode: MergeMode::Max,
            resample: Resample::Nearest,
            contrast_exponent: 1.0,
            blur_sigma: 0.0,
            clip_percentile: 1.0,
            ceiling: None,
            sampling: 1,
            format: PixelFormat::Luma,
            colour_map: ColourMap::parse("BlackToWhite").unwrap(),
        }
    }

    #[test]
    fn test_sum_and_max_on_same_resolution() {
        let a = array(8, 8, &[(2, 3, 5)]);
        let b = array(8, 8, &[(2, 3, 3), (4, 4, 2)]);
        let target = Resolution::new(8, 8);

        let mut sum = RawCanvas::new(target);
        merge_into(&mut sum, &a, MergeMode::Sum, Resample::Nearest);
        merge_into(&mut sum, &b, MergeMode::Sum, Resample::Nearest);
        assert_eq!(sum.get(2, 3), 8.0);
        assert_eq!(sum.get(4, 4), 2.0);

        let mut max = RawCanvas::new(target);
        merge_into(&mut max, &a, MergeMode::Max, Resample::Nearest);
        merge_into(&mut max, &b, MergeMode::Max, Resample::Nearest);
        assert_eq!(max.get(2, 3), 5.0);
        assert_eq!(max.get(4, 4), 2.0);
    }

    #[test]
    fn test_nearest_upsample_repeats_pixels() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(2, 2), array(2, 2, &[(1, 0, 7)]));
        let canvas = merge(&arrays, Resolution::new(4, 4), MergeMode::Max, Resample::Nearest);
        for (x, y) in [(2, 0), (3, 0), (2, 1), (3, 1)] {
            assert_eq!(canvas.get(x, y), 7.0);
        }
        assert_eq!(canvas.get(1, 0), 0.0);
        assert_eq!(canvas.max_value(), 7.0);
    }

    #[test]
    fn test_area_downsample_averages() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(4, 4), array(4, 4, &[(1, 1, 4)]));
        let target = Resolution::new(2, 2);

        let nearest = merge(&arrays, target, MergeMode::Sum, Resample::Nearest);
        assert_eq!(nearest.get(0, 0), 0.0);

        let area = merge(&arrays, target, MergeMode::Sum, Resample::Area);
        assert_eq!(area.get(0, 0), 1.0);
        assert_eq!(area.get(1, 1), 0.0);
    }

    #[test]
    fn test_contrast_exponent() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(2, 1), array(2, 1, &[(0, 0, 3)]));
        let mut canvas = merge(&arrays, Resolution::new(2, 1), MergeMode::Max, Resample::Nearest);
        apply_contrast(&mut canvas, 2.0);
        assert_eq!(canvas.values(), &[9.0, 0.0]);
    }

    #[test]
    fn test_blur_spreads_and_preserves_mass() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(21, 21), array(21, 21, &[(10, 10, 100)]));
        let canvas = merge(&arrays, Resolution::new(21, 21), MergeMode::Sum, Resample::Nearest);
        let blurred = gaussian_blur(&canvas, 2.0);

        assert!(blurred.get(10, 10) < 100.0);
        assert!(blurred.get(11, 10) > 0.0);
        assert!(blurred.get(10, 10) > blurred.get(12, 10));
        let total: f64 = blurred.values().iter().sum();
        assert!((total - 100.0).abs() < 1e-6);

        assert_eq!(gaussian_blur(&canvas, 0.0), canvas);
    }

    #[test]
    fn test_huge_blur_is_bounded_by_canvas() {
        assert_eq!(gaussian_kernel(1e300, 4).len(), 9);
        assert_eq!(gaussian_kernel(1.0, 100).len(), 7);

        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(6, 4), array(6, 4, &[(1, 1, 9)]));
        let mut opts = options();
        opts.blur_sigma = 1e300;
        assert!(opts.validate().is_ok());

        let result = compose(&arrays, None, None, &opts, &|| false).unwrap();
        assert_eq!((result.width, result.height), (6, 4));
        assert_eq!(result.pixels.len(), 6 * 4);
    }

    #[test]
    fn test_upscale_repeats_whole_pixels() {
        let pixels = vec![10, 20, 30, 40, 50, 60];
        let out = upscale::<Rgb<u8>>(pixels, Resolution::new(2, 1), Resolution::new(4, 2)).unwrap();
        let row = [10, 20, 30, 10, 20, 30, 40, 50, 60, 40, 50, 60];
        assert_eq!(&out[..12], &row);
        assert_eq!(&out[12..], &row);

        assert!(upscale::<Rgb<u8>>(vec![1, 2], Resolution::new(2, 1), Resolution::new(4, 2)).is_err());
    }

    #[test]
    fn test_normalise_uses_data_range() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(3, 1), array(3, 1, &[(1, 0, 2), (2, 0, 4)]));
        let mut canvas = merge(&arrays, Resolution::new(3, 1), MergeMode::Max, Resample::Nearest);
        normalise(&mut canvas, None, 1.0);
        assert_eq!(canvas.values(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_normalise_percentile_clips_outliers() {
        let cells = [(0, 0, 1), (1, 0, 1), (2, 0, 1), (3, 0, 100)];
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(5, 1), array(5, 1, &cells));
        let mut canvas = merge(&arrays, Resolution::new(5, 1), MergeMode::Max, Resample::Nearest);
        normalise(&mut canvas, None, 0.5);
        assert_eq!(canvas.values(), &[1.0, 1.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_normalise_with_ceiling_override() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(2, 1), array(2, 1, &[(1, 0, 5)]));
        let mut canvas = merge(&arrays, Resolution::new(2, 1), MergeMode::Max, Resample::Nearest);
        normalise(&mut canvas, Some(10.0), 1.0);
        assert_eq!(canvas.values(), &[0.0, 0.5]);
    }

    #[test]
    fn test_flat_canvas_normalises_to_zero() {
        let mut canvas = RawCanvas::new(Resolution::new(3, 3));
        normalise(&mut canvas, None, 1.0);
        assert!(canvas.values().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_sources_render_blank() {
        let arrays = BTreeMap::new();
        let result = compose(&arrays, Some(4), Some(3), &options(), &|| false).unwrap();
        assert_eq!((result.width, result.height, result.channels), (4, 3, 1));
        assert!(result.pixels.iter().all(|p| *p == 0));

        let sentinel = compose(&arrays, None, None, &options(), &|| false).unwrap();
        assert!(sentinel.is_empty());
    }

    #[test]
    fn test_target_resolution_defaults() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(1920, 1080), TrackArray::new(Resolution::new(1920, 1080)));
        arrays.insert(Resolution::new(2560, 1440), TrackArray::new(Resolution::new(2560, 1440)));

        assert_eq!(target_resolution(&arrays, None, None), Some(Resolution::new(2560, 1440)));
        assert_eq!(target_resolution(&arrays, Some(1280), None), Some(Resolution::new(1280, 720)));
        assert_eq!(target_resolution(&arrays, None, Some(360)), Some(Resolution::new(640, 360)));
        assert_eq!(
            target_resolution(&BTreeMap::new(), Some(5), None),
            None
        );
    }

    #[test]
    fn test_compose_rgba_with_sampling() {
        let mut track = TrackArray::new(Resolution::new(8, 8));
        track.increment(Point::new(0, 0));
        let mut arrays = BTreeMap::new();
        arrays.insert(track.resolution(), track);

        let mut opts = options();
        opts.format = PixelFormat::Rgba;
        opts.sampling = 2;
        let result = compose(&arrays, None, None, &opts, &|| false).unwrap();

        assert_eq!((result.width, result.height, result.channels), (8, 8, 4));
        assert_eq!(result.pixels.len(), 8 * 8 * 4);
        let white = Rgba::opaque(255, 255, 255).to_array();
        let black = Rgba::opaque(0, 0, 0).to_array();
        assert_eq!(&result.pixels[0..4], &white);
        assert_eq!(&result.pixels[4..8], &white);
        assert_eq!(&result.pixels[8..12], &black);
    }

    #[test]
    fn test_cancelled_render_is_superseded() {
        let mut arrays = BTreeMap::new();
        arrays.insert(Resolution::new(4, 4), TrackArray::new(Resolution::new(4, 4)));
        let result = compose(&arrays, None, None, &options(), &|| true);
        assert!(matches!(result, Err(RenderError::Superseded)));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut opts = options();
        opts.sampling = 0;
        assert!(opts.validate().is_err());

        let mut opts = options();
        opts.clip_percentile = 0.0;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_names_parse() {
        assert_eq!("SUM".parse::<MergeMode>(), Ok(MergeMode::Sum));
        assert_eq!(Resample::Area.to_string(), "area");
        assert!("median".parse::<MergeMode>().is_err());
    }
}
