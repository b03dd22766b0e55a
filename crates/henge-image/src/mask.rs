//! Single-channel masks used as per-pixel blend weights.

use itertools::Itertools;
use nalgebra::Point2;

/// A grayscale buffer the size of an image, with one byte per pixel.
///
/// Values are interpreted as alpha coefficients (`value / 255`) during blending.
#[derive(Debug, Clone)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// Creates a mask of the given size with every value set to 0.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the bounds of this mask.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        assert!(x < self.width && y < self.height);
        self.data[(y * self.width + x) as usize]
    }

    /// One byte per pixel, row-major.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Rasterizes a simple polygon into the mask, setting covered pixels to `value`.
    ///
    /// Coverage follows the even-odd rule evaluated at pixel centers, so the polygon may be
    /// given in either winding order. Fewer than 3 vertices rasterize nothing.
    pub fn fill_polygon(&mut self, polygon: &[Point2<f32>], value: u8) {
        if polygon.len() < 3 {
            return;
        }

        let mut crossings = Vec::with_capacity(polygon.len());
        for y in 0..self.height {
            let scan_y = y as f32 + 0.5;

            crossings.clear();
            for (p, q) in polygon.iter().circular_tuple_windows() {
                if (p.y <= scan_y) != (q.y <= scan_y) {
                    crossings.push(p.x + (scan_y - p.y) / (q.y - p.y) * (q.x - p.x));
                }
            }
            crossings.sort_unstable_by(|a, b| a.total_cmp(b));

            for (enter, exit) in crossings.iter().tuples() {
                let x0 = (enter - 0.5).ceil().max(0.0) as u32;
                let x1 = ((exit - 0.5).floor() as i64).min(self.width as i64 - 1);
                for x in x0 as i64..=x1 {
                    self.data[y as usize * self.width as usize + x as usize] = value;
                }
            }
        }
    }

    /// Blurs the mask in place with a separable box filter of the given radius.
    ///
    /// Samples outside the mask count as 0, so repeated passes feather edges towards the
    /// outside. A radius of 0 is a no-op.
    pub fn box_blur(&mut self, radius: u32) {
        if radius == 0 || self.data.is_empty() {
            return;
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let r = radius as usize;
        let window = 2 * r + 1;

        // Horizontal pass, via per-row prefix sums.
        let mut prefix = vec![0u32; w + 1];
        for row in self.data.chunks_exact_mut(w) {
            for (x, value) in row.iter().enumerate() {
                prefix[x + 1] = prefix[x] + *value as u32;
            }
            for x in 0..w {
                let lo = x.saturating_sub(r);
                let hi = (x + r + 1).min(w);
                row[x] = ((prefix[hi] - prefix[lo]) as usize / window) as u8;
            }
        }

        // Vertical pass.
        let mut prefix = vec![0u32; h + 1];
        for x in 0..w {
            for y in 0..h {
                prefix[y + 1] = prefix[y] + self.data[y * w + x] as u32;
            }
            for y in 0..h {
                let lo = y.saturating_sub(r);
                let hi = (y + r + 1).min(h);
                self.data[y * w + x] = ((prefix[hi] - prefix[lo]) as usize / window) as u8;
            }
        }
    }

    /// Multiplies every value by `factor`, saturating at 255.
    pub fn scale(&mut self, factor: f32) {
        for value in &mut self.data {
            *value = (*value as f32 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}
