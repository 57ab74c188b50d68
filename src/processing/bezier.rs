//! Curved connector rasterization
//!
//! Used for decorative overlays such as rounded polygons. Each edge is a cubic
//! Bezier sampled at a fixed step count; outlines can be thickened with a
//! square structuring element and closed shapes filled by flooding the
//! background in from the canvas border.

use crate::capture::monitor::Point;
use crate::recorder::error::RasterError;
use std::collections::VecDeque;

/// Default number of samples per curve
pub const DEFAULT_STEPS: u32 = 1000;

/// Cubic control-point weight that approximates a quarter circle
const CIRCLE_KAPPA: f64 = 0.552_284_749_8;

/// Sub-pixel position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Vec2, t: f64) -> Vec2 {
        Vec2::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    fn distance(self, other: Vec2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// One cubic edge: two anchors, each with its own control point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicSegment {
    pub start: Vec2,
    pub start_control: Vec2,
    pub end_control: Vec2,
    pub end: Vec2,
}

impl CubicSegment {
    pub fn new(start: Vec2, start_control: Vec2, end_control: Vec2, end: Vec2) -> Self {
        Self {
            start,
            start_control,
            end_control,
            end,
        }
    }

    /// A straight segment expressed as a cubic
    pub fn straight(start: Vec2, end: Vec2) -> Self {
        Self::new(start, start.lerp(end, 1.0 / 3.0), start.lerp(end, 2.0 / 3.0), end)
    }

    /// Point on the curve at `t` in [0, 1]
    pub fn at(&self, t: f64) -> Vec2 {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Vec2::new(
            a * self.start.x + b * self.start_control.x + c * self.end_control.x + d * self.end.x,
            a * self.start.y + b * self.start_control.y + c * self.end_control.y + d * self.end.y,
        )
    }
}

/// Boolean raster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.bits[index] = true;
        }
    }

    /// Number of set pixels
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Coordinates of every set pixel, row by row
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let width = self.width as usize;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .map(move |(i, _)| Point::new((i % width) as i32, (i / width) as i32))
    }

    /// Set every pixel within the `thickness x thickness` square around each set pixel
    pub fn dilate(&self, thickness: u32) -> Mask {
        if thickness <= 1 {
            return self.clone();
        }
        let low = -(((thickness - 1) / 2) as i64);
        let high = low + i64::from(thickness) - 1;
        let mut out = Mask::new(self.width, self.height);
        for point in self.points() {
            for dy in low..=high {
                for dx in low..=high {
                    let x = i64::from(point.x) + dx;
                    let y = i64::from(point.y) + dy;
                    if x >= 0 && y >= 0 {
                        out.set(x as u32, y as u32);
                    }
                }
            }
        }
        out
    }

    /// Interior of the closed shapes drawn on this mask, outline included.
    ///
    /// Every unset pixel reachable from the border (4-connected) is background;
    /// whatever is left is the fill.
    pub fn fill_enclosed(&self) -> Mask {
        let (width, height) = (self.width, self.height);
        if self.bits.is_empty() {
            return self.clone();
        }
        let mut outside = vec![false; self.bits.len()];
        let mut queue = VecDeque::new();

        let seed = |x: u32, y: u32, outside: &mut Vec<bool>, queue: &mut VecDeque<(u32, u32)>| {
            let index = self.index(x, y);
            if !self.bits[index] && !outside[index] {
                outside[index] = true;
                queue.push_back((x, y));
            }
        };

        for x in 0..width {
            seed(x, 0, &mut outside, &mut queue);
            seed(x, height.saturating_sub(1), &mut outside, &mut queue);
        }
        for y in 0..height {
            seed(0, y, &mut outside, &mut queue);
            seed(width.saturating_sub(1), y, &mut outside, &mut queue);
        }

        while let Some((x, y)) = queue.pop_front() {
            if x > 0 {
                seed(x - 1, y, &mut outside, &mut queue);
            }
            if x + 1 < width {
                seed(x + 1, y, &mut outside, &mut queue);
            }
            if y > 0 {
                seed(x, y - 1, &mut outside, &mut queue);
            }
            if y + 1 < height {
                seed(x, y + 1, &mut outside, &mut queue);
            }
        }

        Mask {
            width,
            height,
            bits: outside.into_iter().map(|o| !o).collect(),
        }
    }
}

/// Rasterizer parameters for a canvas size.
///
/// Holds no per-shape state, so one instance can draw any number of shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveRaster {
    width: u32,
    height: u32,
    steps: u32,
}

impl CurveRaster {
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::EmptyCanvas { width, height });
        }
        Ok(Self {
            width,
            height,
            steps: DEFAULT_STEPS,
        })
    }

    pub fn with_steps(mut self, steps: u32) -> Result<Self, RasterError> {
        if steps == 0 {
            return Err(RasterError::NoSamples);
        }
        self.steps = steps;
        Ok(self)
    }

    /// Nearest in-bounds pixel; points off the canvas are clamped, not dropped
    fn pixel(&self, point: Vec2) -> (u32, u32) {
        let clamp = |v: f64, size: u32| -> u32 {
            if v.is_nan() {
                return 0;
            }
            v.round().clamp(0.0, f64::from(size - 1)) as u32
        };
        (clamp(point.x, self.width), clamp(point.y, self.height))
    }

    /// Draw the outline of `segments`
    pub fn outline(&self, segments: &[CubicSegment], thickness: u32) -> Result<Mask, RasterError> {
        if thickness < 1 {
            return Err(RasterError::InvalidThickness(thickness));
        }
        let mut mask = Mask::new(self.width, self.height);
        for segment in segments {
            for i in 0..=self.steps {
                let t = f64::from(i) / f64::from(self.steps);
                let (x, y) = self.pixel(segment.at(t));
                mask.set(x, y);
            }
        }
        Ok(mask.dilate(thickness))
    }

    /// Draw the outline of a closed sequence of segments and fill its interior
    pub fn fill(&self, segments: &[CubicSegment], thickness: u32) -> Result<Mask, RasterError> {
        Ok(self.outline(segments, thickness)?.fill_enclosed())
    }
}

/// Closed outline of a polygon whose corners are rounded off with `radius`.
///
/// Each corner becomes a cubic approximating a circular arc, trimmed so that
/// neighbouring corners never overlap; the edges between corners are straight.
pub fn rounded_polygon(vertices: &[Vec2], radius: f64) -> Vec<CubicSegment> {
    let count = vertices.len();
    if count < 2 {
        return Vec::new();
    }

    let radius = radius.max(0.0);
    let mut corners = Vec::with_capacity(count);
    for i in 0..count {
        let previous = vertices[(i + count - 1) % count];
        let vertex = vertices[i];
        let next = vertices[(i + 1) % count];

        let reach = radius
            .min(vertex.distance(previous) / 2.0)
            .min(vertex.distance(next) / 2.0);
        let towards = |other: Vec2| {
            let length = vertex.distance(other);
            if length == 0.0 {
                vertex
            } else {
                vertex.lerp(other, reach / length)
            }
        };
        let entry = towards(previous);
        let exit = towards(next);
        corners.push(CubicSegment::new(
            entry,
            entry.lerp(vertex, CIRCLE_KAPPA),
            exit.lerp(vertex, CIRCLE_KAPPA),
            exit,
        ));
    }

    let mut segments = Vec::with_capacity(count * 2);
    for i in 0..count {
        let corner = corners[i];
        let following = corners[(i + 1) % count];
        segments.push(corner);
        segments.push(CubicSegment::straight(corner.end, following.start));
    }
    segments
}
