//! Monitor topology
//!
//! Positions arrive in the OS's logical coordinate space. Each monitor is
//! described twice, once as the OS sees it (logical) and once at its true pixel
//! resolution (physical), and the two lists are index-aligned. Resolving a
//! point picks the monitor it lands on and projects it into that monitor's
//! physical pixel grid, which is what the track arrays are keyed by.

use crate::config::TopologyConfig;
use crate::recorder::error::TopologyError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Physical pixel dimensions used to key historical arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Half-open monitor bounds `[x1, x2) x [y1, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl MonitorRect {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle of the given size with its top-left corner at `(x, y)`.
    /// Edges past `i32::MAX` saturate.
    pub fn from_origin(x: i32, y: i32, width: u32, height: u32) -> Self {
        let extend = |origin: i32, size: u32| {
            origin.saturating_add(i32::try_from(size).unwrap_or(i32::MAX))
        };
        Self::new(x, y, extend(x, width), extend(y, height))
    }

    pub fn width(&self) -> u32 {
        (i64::from(self.x2) - i64::from(self.x1)).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (i64::from(self.y2) - i64::from(self.y1)).max(0) as u32
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width(), self.height())
    }

    pub fn contains(&self, point: Point) -> bool {
        self.x1 <= point.x && point.x < self.x2 && self.y1 <= point.y && point.y < self.y2
    }

    /// Clamp a point onto the last valid pixel of this rectangle
    pub fn clamp(&self, point: Point) -> Point {
        let max_x = (self.x2 - 1).max(self.x1);
        let max_y = (self.y2 - 1).max(self.y1);
        Point::new(point.x.clamp(self.x1, max_x), point.y.clamp(self.y1, max_y))
    }

    /// Distance from the rectangle along each axis (zero when inside)
    fn offset(&self, point: Point) -> (i64, i64) {
        let (x, y) = (i64::from(point.x), i64::from(point.y));
        let dx = (i64::from(self.x1) - x)
            .max(x - (i64::from(self.x2) - 1))
            .max(0);
        let dy = (i64::from(self.y1) - y)
            .max(y - (i64::from(self.y2) - 1))
            .max(0);
        (dx, dy)
    }
}

/// A point resolved onto a monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorHit {
    pub index: usize,
    pub local: Point,
}

/// A point projected into a monitor's physical pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalHit {
    pub index: usize,
    /// Absolute physical coordinate
    pub absolute: Point,
    /// Coordinate relative to the physical monitor's top-left corner
    pub local: Point,
    pub resolution: Resolution,
}

/// An immutable, validated pair of logical/physical monitor lists
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorLayout {
    logical: Vec<MonitorRect>,
    physical: Vec<MonitorRect>,
    weights: TopologyConfig,
}

impl MonitorLayout {
    /// Build a layout, rejecting empty, mismatched or inverted topologies
    pub fn new(
        logical: Vec<MonitorRect>,
        physical: Vec<MonitorRect>,
    ) -> Result<Self, TopologyError> {
        Self::with_weights(logical, physical, TopologyConfig::default())
    }

    pub fn with_weights(
        logical: Vec<MonitorRect>,
        physical: Vec<MonitorRect>,
        weights: TopologyConfig,
    ) -> Result<Self, TopologyError> {
        if logical.is_empty() || physical.is_empty() {
            return Err(TopologyError::Empty);
        }
        if logical.len() != physical.len() {
            return Err(TopologyError::LengthMismatch {
                logical: logical.len(),
                physical: physical.len(),
            });
        }
        for (index, rect) in logical.iter().chain(physical.iter()).enumerate() {
            if rect.x2 < rect.x1 || rect.y2 < rect.y1 {
                return Err(TopologyError::InvertedRect {
                    index: index % logical.len(),
                    x1: rect.x1,
                    y1: rect.y1,
                    x2: rect.x2,
                    y2: rect.y2,
                });
            }
        }
        Ok(Self {
            logical,
            physical,
            weights,
        })
    }

    /// Layout where logical and physical coordinates coincide (no DPI scaling)
    pub fn unscaled(rects: Vec<MonitorRect>) -> Result<Self, TopologyError> {
        Self::new(rects.clone(), rects)
    }

    pub fn logical(&self) -> &[MonitorRect] {
        &self.logical
    }

    pub fn physical(&self) -> &[MonitorRect] {
        &self.physical
    }

    pub fn len(&self) -> usize {
        self.logical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logical.is_empty()
    }

    /// Monitor strictly containing `point`; the lowest index wins on overlap
    pub fn resolve_exact(&self, point: Point) -> Option<MonitorHit> {
        self.logical
            .iter()
            .position(|rect| rect.contains(point))
            .map(|index| {
                let rect = &self.logical[index];
                MonitorHit {
                    index,
                    local: Point::new(point.x - rect.x1, point.y - rect.y1),
                }
            })
    }

    /// Resolve `point` to a monitor, falling back to the nearest one.
    ///
    /// DPI rounding can leave a logical coordinate one unit outside its real
    /// monitor. The fallback scores each rectangle by its weighted axis
    /// distance, with horizontal distance weighted higher so that T-shaped
    /// junctions don't jump across to the wrong screen. Ties go to the lowest
    /// index. The returned local offset may lie outside the monitor.
    pub fn resolve(&self, point: Point) -> MonitorHit {
        if let Some(hit) = self.resolve_exact(point) {
            return hit;
        }

        let hw = i64::from(self.weights.horizontal_weight);
        let vw = i64::from(self.weights.vertical_weight);
        let mut best = 0;
        let mut best_score = i64::MAX;
        for (index, rect) in self.logical.iter().enumerate() {
            let (dx, dy) = rect.offset(point);
            let score = hw * dx + vw * dy;
            if score < best_score {
                best = index;
                best_score = score;
            }
        }

        let rect = &self.logical[best];
        MonitorHit {
            index: best,
            local: Point::new(point.x - rect.x1, point.y - rect.y1),
        }
    }

    /// Project a logical point into its monitor's physical pixel grid
    pub fn map_logical_to_physical(&self, point: Point) -> PhysicalHit {
        let index = self.resolve(point).index;
        let logical = &self.logical[index];
        let physical = &self.physical[index];

        let clamped = logical.clamp(point);
        let scale_x = f64::from(physical.width()) / f64::from(logical.width().max(1));
        let scale_y = f64::from(physical.height()) / f64::from(logical.height().max(1));

        let projected = Point::new(
            physical.x1 + (f64::from(clamped.x - logical.x1) * scale_x).round() as i32,
            physical.y1 + (f64::from(clamped.y - logical.y1) * scale_y).round() as i32,
        );
        let absolute = physical.clamp(projected);

        PhysicalHit {
            index,
            absolute,
            local: Point::new(absolute.x - physical.x1, absolute.y - physical.y1),
            resolution: physical.resolution(),
        }
    }
}

/// Shared, atomically swappable monitor layout.
///
/// Readers take an `Arc` snapshot and keep using it even if a topology change
/// lands mid-way; they never see half of an update.
#[derive(Debug, Clone)]
pub struct MonitorTopology {
    current: Arc<RwLock<Arc<MonitorLayout>>>,
}

impl MonitorTopology {
    pub fn new(layout: MonitorLayout) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(layout))),
        }
    }

    /// Current layout
    pub fn snapshot(&self) -> Arc<MonitorLayout> {
        self.current.read().clone()
    }

    /// Replace both lists in one step
    pub fn replace(&self, layout: MonitorLayout) {
        tracing::info!("Monitor topology changed ({} monitors)", layout.len());
        *self.current.write() = Arc::new(layout);
    }

    /// Validate and swap in a new logical/physical pair.
    ///
    /// The fallback weights of the current layout carry over. Returns whether
    /// the layout actually changed.
    pub fn update(
        &self,
        logical: Vec<MonitorRect>,
        physical: Vec<MonitorRect>,
    ) -> Result<bool, TopologyError> {
        let weights = self.snapshot().weights;
        let layout = MonitorLayout::with_weights(logical, physical, weights)?;
        if *self.snapshot() == layout {
            return Ok(false);
        }
        self.replace(layout);
        Ok(true)
    }
}
