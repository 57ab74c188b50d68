//! Straight-line traversal between two pointer samples
//!
//! Integer Bresenham walk. The start pixel is excluded (the caller already
//! counted it when it was the previous sample) and the end pixel is included,
//! so chaining consecutive samples visits every pixel exactly once.

use crate::capture::monitor::Point;

/// Iterator over the pixels from `start` (exclusive) to `end` (inclusive)
#[derive(Debug, Clone)]
pub struct Line {
    current: Point,
    end: Point,
    delta_x: i64,
    delta_y: i64,
    step_x: i32,
    step_y: i32,
    error: i64,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        // http://members.chello.at/~easyfilter/bresenham.html
        let delta_x = (i64::from(end.x) - i64::from(start.x)).abs();
        let delta_y = -(i64::from(end.y) - i64::from(start.y)).abs();
        Self {
            current: start,
            end,
            delta_x,
            delta_y,
            step_x: if start.x < end.x { 1 } else { -1 },
            step_y: if start.y < end.y { 1 } else { -1 },
            error: delta_x + delta_y,
        }
    }
}

impl Iterator for Line {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.current == self.end {
            return None;
        }

        let e2 = 2 * self.error;
        if e2 >= self.delta_y {
            self.error += self.delta_y;
            self.current.x += self.step_x;
        }
        if e2 <= self.delta_x {
            self.error += self.delta_x;
            self.current.y += self.step_y;
        }
        Some(self.current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (i64::from(self.end.x) - i64::from(self.current.x))
            .abs()
            .max((i64::from(self.end.y) - i64::from(self.current.y)).abs())
            as usize;
        (remaining, Some(remaining))
    }
}

/// Pixels crossed moving from `start` to `end`.
///
/// Empty when either side is missing or the two are equal: a stationary
/// sample must not be counted twice.
pub fn trace(start: Option<Point>, end: Option<Point>) -> Vec<Point> {
    match (start, end) {
        (Some(start), Some(end)) if start != end => Line::new(start, end).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_stationary_sample_is_empty() {
        assert!(trace(Some(p(4, 4)), Some(p(4, 4))).is_empty());
    }

    #[test]
    fn test_missing_endpoint_is_empty() {
        assert!(trace(None, Some(p(4, 4))).is_empty());
        assert!(trace(Some(p(4, 4)), None).is_empty());
    }

    #[test]
    fn test_horizontal_excludes_start() {
        assert_eq!(
            trace(Some(p(0, 0)), Some(p(3, 0))),
            vec![p(1, 0), p(2, 0), p(3, 0)]
        );
    }

    #[test]
    fn test_reverse_diagonal() {
        assert_eq!(
            trace(Some(p(2, 2)), Some(p(-1, -1))),
            vec![p(1, 1), p(0, 0), p(-1, -1)]
        );
    }

    #[test]
    fn test_steep_line_has_one_pixel_per_row() {
        let path = trace(Some(p(0, 0)), Some(p(2, 9)));
        assert_eq!(path.len(), 9);
        for (i, point) in path.iter().enumerate() {
            assert_eq!(point.y, i as i32 + 1);
        }
    }

    #[test]
    fn test_totality_and_connectivity() {
        for sx in -4..=4 {
            for sy in -4..=4 {
                for ex in -4..=4 {
                    for ey in -4..=4 {
                        let start = p(sx, sy);
                        let end = p(ex, ey);
                        let path = trace(Some(start), Some(end));

                        assert_eq!(path.is_empty(), start == end);
                        if start == end {
                            continue;
                        }
                        assert_eq!(path.last(), Some(&end));
                        assert!(!path.contains(&start));

                        let mut previous = start;
                        for point in &path {
                            let step = (point.x - previous.x)
                                .abs()
                                .max((point.y - previous.y).abs());
                            assert_eq!(step, 1, "{:?} -> {:?}", start, end);
                            previous = *point;
                        }

                        let mut unique = path.clone();
                        unique.sort_by_key(|p| (p.x, p.y));
                        unique.dedup();
                        assert_eq!(unique.len(), path.len());
                    }
                }
            }
        }
    }

    #[test]
    fn test_size_hint_matches_length() {
        let line = Line::new(p(-3, 7), p(12, -2));
        let (hint, _) = line.size_hint();
        assert_eq!(hint, line.count());
    }
}
