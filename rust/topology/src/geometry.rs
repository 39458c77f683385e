// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar geometry primitives.
//!
//! Pure functions on `nalgebra` points. Coordinates are y-up, so a positive
//! cross product or signed area means counter-clockwise.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};

/// 2D cross product (z component of the 3D cross product).
#[inline]
pub fn cross(u: Vector2<f64>, v: Vector2<f64>) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Returns `true` if both coordinates differ by at most `eps`.
#[inline]
pub fn points_equal(a: Point2<f64>, b: Point2<f64>, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

/// Side of `p` relative to the directed line `a → b`.
///
/// `1` on the left, `-1` on the right, `0` exactly on the line.
pub fn side_of_line(a: Point2<f64>, b: Point2<f64>, p: Point2<f64>) -> i32 {
    let c = cross(b - a, p - a);
    if c > 0.0 {
        1
    } else if c < 0.0 {
        -1
    } else {
        0
    }
}

/// Parameter of the projection of `p` onto the line through `a` and `b`.
///
/// `0` at `a`, `1` at `b`. Returns `0` for a degenerate segment.
pub fn project_param(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq == 0.0 {
        return 0.0;
    }
    (p - a).dot(&d) / len_sq
}

/// Distance from `p` to the segment `a`-`b`.
pub fn point_segment_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let t = project_param(p, a, b).clamp(0.0, 1.0);
    let closest = a + (b - a) * t;
    (p - closest).norm()
}

/// Distance from `p` to the infinite line through `a` and `b`.
pub fn line_distance(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len == 0.0 {
        return (p - a).norm();
    }
    cross(d, p - a).abs() / len
}

/// Counter-clockwise rotation at `b` from ray `b → a` to ray `b → c`.
///
/// The result lies in `[0, 2π)`.
pub fn angle_of(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    let u = a - b;
    let v = c - b;
    let mut r = v.y.atan2(v.x) - u.y.atan2(u.x);
    if r < 0.0 {
        r += TAU;
    }
    if r >= TAU {
        r -= TAU;
    }
    r
}

/// Result of intersecting two segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    None,
    /// Proper crossing at `point`; `t0`, `t1` are parameters along A and B.
    Point { point: Point2<f64>, t0: f64, t1: f64 },
    /// Collinear overlap from `start` to `end`, parameters along B.
    Overlap {
        start: Point2<f64>,
        end: Point2<f64>,
        t0: f64,
        t1: f64,
    },
}

/// Intersects segments `a0`-`a1` and `b0`-`b1`.
///
/// Non-parallel segments only report a crossing when both parameters are
/// strictly inside `(0, 1)`. Parallel segments within `eps` of each other
/// are analysed by [`collinear_overlap`].
pub fn segment_intersect(
    a0: Point2<f64>,
    a1: Point2<f64>,
    b0: Point2<f64>,
    b1: Point2<f64>,
    eps: f64,
) -> SegmentIntersection {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = cross(r, s);
    let q = b0 - a0;

    if denom.abs() <= f64::EPSILON * r.norm() * s.norm() {
        if line_distance(a0, b0, b1) > eps {
            return SegmentIntersection::None;
        }
        return collinear_overlap(a0, a1, b0, b1, eps);
    }

    let t = cross(q, s) / denom;
    let u = cross(q, r) / denom;
    if t > 0.0 && t < 1.0 && u > 0.0 && u < 1.0 {
        SegmentIntersection::Point {
            point: a0 + r * t,
            t0: t,
            t1: u,
        }
    } else {
        SegmentIntersection::None
    }
}

/// Overlap of two collinear segments, measured along B.
///
/// An overlap no longer than `eps` is reported as a single touching point.
pub fn collinear_overlap(
    a0: Point2<f64>,
    a1: Point2<f64>,
    b0: Point2<f64>,
    b1: Point2<f64>,
    eps: f64,
) -> SegmentIntersection {
    let b_len = (b1 - b0).norm();
    if b_len == 0.0 {
        return SegmentIntersection::None;
    }

    let ta0 = project_param(a0, b0, b1);
    let ta1 = project_param(a1, b0, b1);
    let lo = ta0.min(ta1).max(0.0);
    let hi = ta0.max(ta1).min(1.0);
    let slack = eps / b_len;

    if hi < lo - slack {
        return SegmentIntersection::None;
    }

    let start = b0 + (b1 - b0) * lo;
    if (hi - lo) * b_len <= eps {
        return SegmentIntersection::Point {
            point: start,
            t0: project_param(start, a0, a1),
            t1: lo,
        };
    }

    SegmentIntersection::Overlap {
        start,
        end: b0 + (b1 - b0) * hi,
        t0: lo,
        t1: hi,
    }
}

/// Ray-casting containment test.
///
/// A point that coincides with a polygon vertex is outside. Horizontal edges
/// never toggle the result.
pub fn point_in_polygon(polygon: &[Point2<f64>], p: Point2<f64>) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if pi == p {
            return false;
        }
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Shoelace area; positive for counter-clockwise polygons.
pub fn signed_area(polygon: &[Point2<f64>]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let p = polygon[i];
        let q = polygon[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum * 0.5
}

pub fn is_counter_clockwise(polygon: &[Point2<f64>]) -> bool {
    signed_area(polygon) > 0.0
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point2<f64>,
    pub max: Point2<f64>,
}

impl Bounds {
    /// Returns `true` if `p` lies inside or on the box.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// Bounding box of a point set, `None` when empty.
pub fn bounding_box(points: &[Point2<f64>]) -> Option<Bounds> {
    let first = *points.first()?;
    let mut bounds = Bounds {
        min: first,
        max: first,
    };
    for p in &points[1..] {
        bounds.min.x = bounds.min.x.min(p.x);
        bounds.min.y = bounds.min.y.min(p.y);
        bounds.max.x = bounds.max.x.max(p.x);
        bounds.max.y = bounds.max.y.max(p.y);
    }
    Some(bounds)
}
