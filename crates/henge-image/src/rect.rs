//! Axis-aligned rectangles.

/// An axis-aligned rectangle with integer pixel coordinates.
///
/// The position may be negative (partially off-canvas rectangles come up when clipping overlay
/// sprites), the size may be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl Rect {
    pub fn from_top_left(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Computes the smallest rectangle containing every point yielded by `points`.
    ///
    /// Returns `None` when `points` is empty.
    pub fn bounding<I: IntoIterator<Item = (i32, i32)>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let (x, y) = points.next()?;
        let (mut x_min, mut y_min, mut x_max, mut y_max) = (x, y, x, y);
        for (x, y) in points {
            x_min = x_min.min(x);
            y_min = y_min.min(y);
            x_max = x_max.max(x);
            y_max = y_max.max(y);
        }
        Some(Self {
            x: x_min,
            y: y_min,
            width: (x_max - x_min + 1) as u32,
            height: (y_max - y_min + 1) as u32,
        })
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the intersection of `self` and `other`, or `None` if they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.width as i32).min(other.x + other.width as i32);
        let y1 = (self.y + self.height as i32).min(other.y + other.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect {
            x: x0,
            y: y0,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}
