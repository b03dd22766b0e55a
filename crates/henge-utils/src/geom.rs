//! 2-D geometry primitives: triangle predicates and affine transforms.
//!
//! Everything operates on `nalgebra` points in pixel space (x right, y down). The predicates
//! use the tolerance conventions of the morphing pipeline: a point exactly on a circumcircle
//! counts as *outside*, a point on a triangle edge counts as *inside*.

use nalgebra::Point2;

/// Slack for the barycentric containment test, in barycentric units.
pub const CONTAINMENT_EPSILON: f32 = 1e-3;

/// Determinants smaller than this are treated as degenerate.
pub const DEGENERACY_EPSILON: f32 = 1e-10;

/// Returns whether `p` lies strictly inside the circumcircle of the triangle `(a, b, c)`.
///
/// The triangle must be positively oriented (positive [`signed_double_area`]); a point exactly
/// on the circle is reported as outside.
pub fn in_circumcircle(p: Point2<f32>, a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> bool {
    // Evaluated in f64: the enclosing super-triangle used during triangulation puts vertices
    // far outside the image, where the intermediate products exceed f32 precision.
    let (ax, ay) = ((a.x - p.x) as f64, (a.y - p.y) as f64);
    let (bx, by) = ((b.x - p.x) as f64, (b.y - p.y) as f64);
    let (cx, cy) = ((c.x - p.x) as f64, (c.y - p.y) as f64);

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);
    det > 0.0
}

/// Barycentric containment test with a small tolerance, so pixels whose centers sit exactly on
/// a shared triangle edge are claimed by both triangles.
///
/// Degenerate triangles contain nothing.
pub fn point_in_triangle(p: Point2<f32>, tri: &[Point2<f32>; 3]) -> bool {
    let v0 = tri[2] - tri[0];
    let v1 = tri[1] - tri[0];
    let v2 = p - tri[0];

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < DEGENERACY_EPSILON {
        return false;
    }

    let u = (dot11 * dot02 - dot01 * dot12) / denom;
    let v = (dot00 * dot12 - dot01 * dot02) / denom;
    u >= -CONTAINMENT_EPSILON && v >= -CONTAINMENT_EPSILON && u + v <= 1.0 + CONTAINMENT_EPSILON
}

/// Twice the signed area of `(a, b, c)`; the sign distinguishes the two vertex orderings.
pub fn signed_double_area(a: Point2<f32>, b: Point2<f32>, c: Point2<f32>) -> f32 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Unsigned area of a triangle, in pixels².
pub fn triangle_area(tri: &[Point2<f32>; 3]) -> f32 {
    signed_double_area(tri[0], tri[1], tri[2]).abs() * 0.5
}

/// A 2-D affine transform `(x, y) ↦ (a·x + b·y + c, d·x + e·y + f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            c: x,
            f: y,
            ..Self::IDENTITY
        }
    }

    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: 0.0,
            d: sin,
            e: cos,
            f: 0.0,
        }
    }

    pub fn scale(x: f32, y: f32) -> Self {
        Self {
            a: x,
            e: y,
            ..Self::IDENTITY
        }
    }

    /// Solves for the unique affine transform mapping the vertices of `src` onto the vertices
    /// of `dst`, in order. Returns `None` if `src` is (close to) degenerate.
    pub fn from_triangles(src: &[Point2<f32>; 3], dst: &[Point2<f32>; 3]) -> Option<Self> {
        let [s0, s1, s2] = *src;
        let [d0, d1, d2] = *dst;

        let det = s0.x * (s1.y - s2.y) - s0.y * (s1.x - s2.x) + (s1.x * s2.y - s2.x * s1.y);
        if det.abs() < DEGENERACY_EPSILON {
            return None;
        }

        let m00 = s1.y - s2.y;
        let m01 = s2.y - s0.y;
        let m02 = s0.y - s1.y;
        let m10 = s2.x - s1.x;
        let m11 = s0.x - s2.x;
        let m12 = s1.x - s0.x;
        let m20 = s1.x * s2.y - s2.x * s1.y;
        let m21 = s2.x * s0.y - s0.x * s2.y;
        let m22 = s0.x * s1.y - s1.x * s0.y;

        Some(Self {
            a: (d0.x * m00 + d1.x * m01 + d2.x * m02) / det,
            b: (d0.x * m10 + d1.x * m11 + d2.x * m12) / det,
            c: (d0.x * m20 + d1.x * m21 + d2.x * m22) / det,
            d: (d0.y * m00 + d1.y * m01 + d2.y * m02) / det,
            e: (d0.y * m10 + d1.y * m11 + d2.y * m12) / det,
            f: (d0.y * m20 + d1.y * m21 + d2.y * m22) / det,
        })
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(
            self.a * p.x + self.b * p.y + self.c,
            self.d * p.x + self.e * p.y + self.f,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.e - self.b * self.d
    }

    /// Returns `outer ∘ self`, the transform that applies `self` first.
    pub fn then(&self, outer: &Affine) -> Affine {
        Affine {
            a: outer.a * self.a + outer.b * self.d,
            b: outer.a * self.b + outer.b * self.e,
            c: outer.a * self.c + outer.b * self.f + outer.c,
            d: outer.d * self.a + outer.e * self.d,
            e: outer.d * self.b + outer.e * self.e,
            f: outer.d * self.c + outer.e * self.f + outer.f,
        }
    }

    /// Returns the inverse transform, or `None` if the determinant is near zero.
    pub fn invert(&self) -> Option<Affine> {
        let det = self.determinant();
        if det.abs() < DEGENERACY_EPSILON {
            return None;
        }
        Some(Affine {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.c * self.e) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.c * self.d - self.a * self.f) / det,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    #[test]
    fn circumcircle_of_unit_right_triangle() {
        // Positively oriented: (0,0) -> (1,0) -> (0,1). Circumcircle is centered at
        // (0.5, 0.5) with radius √0.5.
        let (a, b, c) = (pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0));
        assert!(signed_double_area(a, b, c) > 0.0);
        assert!(in_circumcircle(pt(0.5, 0.5), a, b, c));
        assert!(in_circumcircle(pt(0.9, 0.9), a, b, c));
        assert!(!in_circumcircle(pt(2.0, 2.0), a, b, c));
    }

    #[test]
    fn circumcircle_boundary_counts_as_outside() {
        let (a, b, c) = (pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0));
        // (1, 1) lies exactly on the circumcircle.
        assert!(!in_circumcircle(pt(1.0, 1.0), a, b, c));
    }

    #[test]
    fn triangle_containment() {
        let tri = [pt(0.0, 0.0), pt(10.0, 0.0), pt(0.0, 10.0)];
        assert!(point_in_triangle(pt(2.0, 2.0), &tri));
        assert!(point_in_triangle(pt(0.0, 0.0), &tri));
        assert!(point_in_triangle(pt(5.0, 5.0), &tri)); // on the hypotenuse
        assert!(!point_in_triangle(pt(6.0, 6.0), &tri));
        assert!(!point_in_triangle(pt(-1.0, 4.0), &tri));
    }

    #[test]
    fn degenerate_triangle_contains_nothing() {
        let tri = [pt(0.0, 0.0), pt(5.0, 5.0), pt(10.0, 10.0)];
        assert!(!point_in_triangle(pt(5.0, 5.0), &tri));
    }

    #[test]
    fn affine_maps_triangle_vertices() {
        let src = [pt(0.0, 0.0), pt(4.0, 0.0), pt(0.0, 4.0)];
        let dst = [pt(1.0, 2.0), pt(5.0, 6.0), pt(-3.0, 4.0)];
        let m = Affine::from_triangles(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(&dst) {
            let p = m.apply(*s);
            assert_relative_eq!(p.x, d.x, epsilon = 1e-4);
            assert_relative_eq!(p.y, d.y, epsilon = 1e-4);
        }
    }

    #[test]
    fn affine_from_collinear_triangle_is_none() {
        let src = [pt(0.0, 0.0), pt(1.0, 1.0), pt(2.0, 2.0)];
        let dst = [pt(0.0, 0.0), pt(1.0, 0.0), pt(0.0, 1.0)];
        assert!(Affine::from_triangles(&src, &dst).is_none());
    }

    #[test]
    fn invert_round_trips() {
        let m = Affine::rotation(0.7)
            .then(&Affine::scale(2.0, 3.0))
            .then(&Affine::translation(-4.0, 9.0));
        let inv = m.invert().unwrap();
        let p = pt(12.0, -7.0);
        let q = inv.apply(m.apply(p));
        assert_relative_eq!(q.x, p.x, epsilon = 1e-3);
        assert_relative_eq!(q.y, p.y, epsilon = 1e-3);
    }

    #[test]
    fn composition_applies_inner_first() {
        let m = Affine::scale(2.0, 2.0).then(&Affine::translation(1.0, 0.0));
        let p = m.apply(pt(3.0, 5.0));
        assert_relative_eq!(p.x, 7.0);
        assert_relative_eq!(p.y, 10.0);
    }

    #[test]
    fn area_is_orientation_independent() {
        let ccw = [pt(0.0, 0.0), pt(0.0, 2.0), pt(2.0, 0.0)];
        let cw = [pt(0.0, 0.0), pt(2.0, 0.0), pt(0.0, 2.0)];
        assert_relative_eq!(triangle_area(&ccw), 2.0);
        assert_relative_eq!(triangle_area(&cw), 2.0);
    }
}
