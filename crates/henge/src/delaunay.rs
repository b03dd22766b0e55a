//! Delaunay triangulation (Bowyer–Watson).
//!
//! The morph mesh is triangulated over the *target's* landmark configuration and then indexed
//! against both landmark sets, so the output refers to the caller's point indices and must be
//! deterministic for identical input order.

use std::collections::HashSet;

use nalgebra::Point2;

use henge_utils::geom::{in_circumcircle, signed_double_area};

/// Margin factor for the synthetic enclosing triangle. Smaller margins risk circumcircle
/// errors near the image corners.
const SUPER_MARGIN: f32 = 10.0;

/// Triangulates `points`, returning triangles as index triples into `points`.
///
/// Points with non-finite coordinates or outside `[0, width) × [0, height)` are dropped, and
/// of coincident points only the first takes part (editor-produced landmarks are rounded to
/// integers, which collapses the dense index bands); returned indices still refer to the
/// original slice. Fewer than 3 usable points yield an empty triangulation, which is not an
/// error.
pub fn triangulate(points: &[Point2<f32>], width: u32, height: u32) -> Vec<[usize; 3]> {
    let w = width as f32;
    let h = height as f32;

    // Filter unusable points, remembering the original index of each kept one.
    let mut original = Vec::with_capacity(points.len());
    let mut pts = Vec::with_capacity(points.len() + 3);
    let mut seen = HashSet::with_capacity(points.len());
    for (index, p) in points.iter().enumerate() {
        if p.x.is_finite()
            && p.y.is_finite()
            && (0.0..w).contains(&p.x)
            && (0.0..h).contains(&p.y)
            && seen.insert((p.x.to_bits(), p.y.to_bits()))
        {
            original.push(index);
            pts.push(*p);
        }
    }
    let n = pts.len();
    if n < 3 {
        log::trace!("triangulate: only {n} usable points, returning empty mesh");
        return Vec::new();
    }

    // Seed with a super-triangle generously enclosing the image; its vertices get the
    // synthetic indices n, n+1, n+2.
    let margin = SUPER_MARGIN * width.max(height) as f32;
    pts.push(Point2::new(-margin, -margin));
    pts.push(Point2::new(w + 2.0 * margin, -margin));
    pts.push(Point2::new(w / 2.0, h + 2.0 * margin));
    let mut triangles = vec![oriented([n, n + 1, n + 2], &pts)];

    let mut bad = Vec::new();
    let mut boundary: Vec<(usize, usize)> = Vec::new();
    for i in 0..n {
        let p = pts[i];

        // Triangles whose circumcircle contains the new point are invalidated.
        bad.clear();
        for (t, tri) in triangles.iter().enumerate() {
            if in_circumcircle(p, pts[tri[0]], pts[tri[1]], pts[tri[2]]) {
                bad.push(t);
            }
        }

        // The boundary of the hole: edges not shared between two invalidated triangles.
        boundary.clear();
        for &t in &bad {
            for edge in edges(&triangles[t]) {
                let shared = bad
                    .iter()
                    .any(|&other| other != t && has_edge(&triangles[other], edge));
                if !shared {
                    boundary.push(edge);
                }
            }
        }

        // `bad` is ascending, so removing back-to-front keeps the indices valid.
        for &t in bad.iter().rev() {
            triangles.swap_remove(t);
        }
        for &(u, v) in &boundary {
            triangles.push(oriented([u, v, i], &pts));
        }
    }

    // Drop everything still attached to the super-triangle and translate back to the
    // caller's indices.
    triangles.retain(|tri| tri.iter().all(|&v| v < n));
    for tri in &mut triangles {
        *tri = [original[tri[0]], original[tri[1]], original[tri[2]]];
    }
    triangles
}

/// Normalizes vertex order so the circumcircle predicate sees a positively oriented triangle.
fn oriented(tri: [usize; 3], pts: &[Point2<f32>]) -> [usize; 3] {
    if signed_double_area(pts[tri[0]], pts[tri[1]], pts[tri[2]]) < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

fn edges(tri: &[usize; 3]) -> [(usize, usize); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

fn has_edge(tri: &[usize; 3], (a, b): (usize, usize)) -> bool {
    edges(tri)
        .iter()
        .any(|&(u, v)| (u == a && v == b) || (u == b && v == a))
}

#[cfg(test)]
mod tests {
    use henge_utils::geom::in_circumcircle;

    use super::*;

    fn pt(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    /// Gaussian-ish cluster from a seeded generator (Box–Muller over `fastrand` uniforms).
    fn gaussian_cluster(count: usize, seed: u64) -> Vec<Point2<f32>> {
        let rng = fastrand::Rng::with_seed(seed);
        (0..count)
            .map(|_| {
                let u1 = rng.f32().max(1e-6);
                let u2 = rng.f32();
                let r = (-2.0 * u1.ln()).sqrt() * 60.0;
                let phi = std::f32::consts::TAU * u2;
                pt(
                    (320.0 + r * phi.cos()).clamp(0.0, 639.0),
                    (240.0 + r * phi.sin()).clamp(0.0, 479.0),
                )
            })
            .collect()
    }

    #[test]
    fn square_yields_two_triangles() {
        let points = [pt(10.0, 10.0), pt(90.0, 10.0), pt(90.0, 90.0), pt(10.0, 90.0)];
        let triangles = triangulate(&points, 100, 100);
        assert_eq!(triangles.len(), 2);
        for tri in &triangles {
            assert!(tri.iter().all(|&v| v < 4));
            assert_ne!(tri[0], tri[1]);
            assert_ne!(tri[1], tri[2]);
            assert_ne!(tri[2], tri[0]);
        }
    }

    #[test]
    fn interior_point_is_connected() {
        let points = [
            pt(10.0, 10.0),
            pt(90.0, 10.0),
            pt(90.0, 90.0),
            pt(10.0, 90.0),
            pt(50.0, 50.0),
        ];
        let triangles = triangulate(&points, 100, 100);
        assert_eq!(triangles.len(), 4);
        assert!(triangles.iter().all(|tri| tri.contains(&4)));
    }

    #[test]
    fn too_few_points_is_empty_not_an_error() {
        assert!(triangulate(&[], 100, 100).is_empty());
        assert!(triangulate(&[pt(1.0, 1.0), pt(2.0, 2.0)], 100, 100).is_empty());
    }

    #[test]
    fn filtered_points_keep_original_indices() {
        let points = [
            pt(-5.0, 10.0), // out of bounds
            pt(10.0, 10.0),
            pt(f32::NAN, 3.0), // not finite
            pt(90.0, 10.0),
            pt(50.0, 90.0),
        ];
        let triangles = triangulate(&points, 100, 100);
        assert_eq!(triangles.len(), 1);
        let mut tri = triangles[0].to_vec();
        tri.sort_unstable();
        assert_eq!(tri, [1, 3, 4]);
    }

    #[test]
    fn coincident_points_collapse_to_the_first() {
        let points = [
            pt(10.0, 10.0),
            pt(90.0, 10.0),
            pt(50.0, 90.0),
            pt(90.0, 10.0), // duplicate of index 1
        ];
        let triangles = triangulate(&points, 100, 100);
        assert_eq!(triangles.len(), 1);
        assert!(!triangles[0].contains(&3));
    }

    #[test]
    fn output_is_deterministic_for_identical_input() {
        let points = gaussian_cluster(200, 0x5EED);
        let first = triangulate(&points, 640, 480);
        let second = triangulate(&points, 640, 480);
        assert_eq!(first, second);
        assert!(first.len() > 300, "{} triangles", first.len());
    }

    #[test]
    fn delaunay_property_holds_on_cluster() {
        let points = gaussian_cluster(200, 42);
        let triangles = triangulate(&points, 640, 480);

        // No input point may lie strictly inside any triangle's circumcircle. Shrink towards
        // the circumcenter-free formulation by re-testing with the predicate itself.
        for tri in &triangles {
            let (a, b, c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
            for (i, p) in points.iter().enumerate() {
                if tri.contains(&i) {
                    continue;
                }
                assert!(
                    !in_circumcircle(*p, a, b, c),
                    "point {i} inside circumcircle of {tri:?}"
                );
            }
        }
    }

    #[test]
    fn no_super_triangle_vertices_leak() {
        let points = gaussian_cluster(50, 7);
        let triangles = triangulate(&points, 640, 480);
        assert!(!triangles.is_empty());
        assert!(triangles.iter().flatten().all(|&v| v < points.len()));
    }
}
