//! Screen geometry for window rectangles and gaze points.

/// A point in root-window (screen) coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GazePoint {
    pub x: i32,
    pub y: i32,
}

impl GazePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert device coordinates, saturating at the `i32` range.
    ///
    /// Trackers report NaN or huge values when they lose the eyes for a
    /// frame; `as` saturates (NaN becomes 0) instead of wrapping.
    pub fn from_device(x: f64, y: f64) -> Self {
        Self::new(x as i32, y as i32)
    }
}

/// Axis-aligned rectangle: origin plus extent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: GazePoint) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        x <= px
            && px < x + i64::from(self.width)
            && y <= py
            && py < y + i64::from(self.height)
    }

    /// Area in pixels. Negative extents count as empty.
    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }

    /// Intersection of two rectangles, or `None` if they don't overlap.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (i64::from(self.x) + i64::from(self.width))
            .min(i64::from(other.x) + i64::from(other.width));
        let bottom = (i64::from(self.y) + i64::from(self.height))
            .min(i64::from(other.y) + i64::from(other.height));

        let width = right - i64::from(left);
        let height = bottom - i64::from(top);
        if width <= 0 || height <= 0 {
            return None;
        }

        Some(Rect::new(left, top, width as i32, height as i32))
    }

    /// Percentage of `behind` covered by `self`.
    ///
    /// A zero-area `behind` yields 0 rather than a division fault.
    pub fn overlap_percent(&self, behind: &Rect) -> f64 {
        let denominator = behind.area();
        if denominator == 0 {
            return 0.0;
        }
        let covered = self.intersect(behind).map_or(0, |r| r.area());
        covered as f64 * 100.0 / denominator as f64
    }
}
