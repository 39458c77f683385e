// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Relation between an existing line and a candidate segment.
//!
//! The insertion engine asks [`classify`] how a candidate relates to each
//! existing line and reacts to the first relation that is not
//! [`Relation::None`]. Every point carried by a relation is either an
//! endpoint of one of the two segments or their crossing point, so the
//! engine never invents coordinates. Remainders keep the candidate's
//! direction.

use nalgebra::Point2;

use crate::geometry::{
    line_distance, point_segment_distance, points_equal, project_param, segment_intersect,
    SegmentIntersection,
};

/// A directed segment between two positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Point2<f64> {
        nalgebra::center(&self.start, &self.end)
    }

    fn endpoint(&self, i: usize) -> Point2<f64> {
        if i == 0 {
            self.start
        } else {
            self.end
        }
    }
}

/// How a candidate segment `L` relates to an existing line `M`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    /// Disjoint, or only an endpoint in common.
    None,
    /// Same undirected segment.
    Identical,
    /// Interiors cross at `point`.
    Cross { point: Point2<f64> },
    /// An endpoint of `L` lies inside `M`.
    Touch { point: Point2<f64> },
    /// An endpoint of `M` lies inside `L`.
    TouchReverse { point: Point2<f64> },
    /// Partial collinear overlap. `split` is the endpoint of `L` inside `M`,
    /// `remainder` the part of `L` beyond `M`.
    CollinearOverlap { split: Point2<f64>, remainder: Segment },
    /// `L` lies inside `M` and shares one endpoint with it.
    InnerOverlap { split: Point2<f64> },
    /// `L` lies strictly inside `M`.
    InnerContainment { splits: [Point2<f64>; 2] },
    /// `M` lies inside `L` and shares one endpoint with it.
    OuterOverlap { remainder: Segment },
    /// `M` lies strictly inside `L`.
    OuterContainment { remainders: [Segment; 2] },
}

impl Relation {
    pub fn is_none(&self) -> bool {
        matches!(self, Relation::None)
    }
}

/// Classifies candidate `l` against existing line `m`.
pub fn classify(m: Segment, l: Segment, eps: f64) -> Relation {
    if (points_equal(l.start, m.start, eps) && points_equal(l.end, m.end, eps))
        || (points_equal(l.start, m.end, eps) && points_equal(l.end, m.start, eps))
    {
        return Relation::Identical;
    }

    let collinear = line_distance(l.start, m.start, m.end) <= eps
        && line_distance(l.end, m.start, m.end) <= eps
        && line_distance(m.start, l.start, l.end) <= eps
        && line_distance(m.end, l.start, l.end) <= eps;
    if collinear {
        return classify_collinear(m, l, eps);
    }

    for i in 0..2 {
        for j in 0..2 {
            if points_equal(l.endpoint(i), m.endpoint(j), eps) {
                return Relation::None;
            }
        }
    }

    for i in 0..2 {
        let p = l.endpoint(i);
        if point_segment_distance(p, m.start, m.end) <= eps {
            return Relation::Touch { point: p };
        }
    }

    for j in 0..2 {
        let p = m.endpoint(j);
        if point_segment_distance(p, l.start, l.end) <= eps {
            return Relation::TouchReverse { point: p };
        }
    }

    match segment_intersect(l.start, l.end, m.start, m.end, eps) {
        SegmentIntersection::Point { point, .. } => Relation::Cross { point },
        _ => Relation::None,
    }
}

fn classify_collinear(m: Segment, l: Segment, eps: f64) -> Relation {
    let m_len = m.length();
    let l_len = l.length();
    if m_len <= eps || l_len <= eps {
        return Relation::None;
    }

    // Parameters of L's endpoints along M.
    let dm = eps / m_len;
    let tl = [
        project_param(l.start, m.start, m.end),
        project_param(l.end, m.start, m.end),
    ];
    let lo = tl[0].min(tl[1]);
    let hi = tl[0].max(tl[1]);
    if hi <= dm || lo >= 1.0 - dm {
        return Relation::None;
    }

    // Parameters of M's endpoints along L.
    let dl = eps / l_len;
    let tm = [
        project_param(m.start, l.start, l.end),
        project_param(m.end, l.start, l.end),
    ];

    let (l_inside, l_count) = interior_endpoints(tl, dm);
    let (m_inside, m_count) = interior_endpoints(tm, dl);

    match (l_count, m_count) {
        (2, _) => Relation::InnerContainment {
            splits: [l.start, l.end],
        },
        (_, 2) => {
            let (near, far) = if tm[0] <= tm[1] {
                (m.start, m.end)
            } else {
                (m.end, m.start)
            };
            Relation::OuterContainment {
                remainders: [Segment::new(l.start, near), Segment::new(far, l.end)],
            }
        }
        (1, 0) => Relation::InnerOverlap {
            split: l.endpoint(l_inside[0]),
        },
        (0, 1) => {
            let inner = m_inside[0];
            let shared_param = tm[1 - inner];
            let p = m.endpoint(inner);
            let remainder = if shared_param <= 0.5 {
                Segment::new(p, l.end)
            } else {
                Segment::new(l.start, p)
            };
            Relation::OuterOverlap { remainder }
        }
        (1, 1) => {
            let i = l_inside[0];
            let beyond = m.endpoint(m_inside[0]);
            let remainder = if i == 0 {
                Segment::new(beyond, l.end)
            } else {
                Segment::new(l.start, beyond)
            };
            Relation::CollinearOverlap {
                split: l.endpoint(i),
                remainder,
            }
        }
        _ => Relation::Identical,
    }
}

/// Endpoint indices whose parameter lies strictly inside `(slack, 1 - slack)`,
/// packed at the front, and how many there are.
fn interior_endpoints(params: [f64; 2], slack: f64) -> ([usize; 2], usize) {
    let mut found = [0; 2];
    let mut count = 0;
    for (i, &t) in params.iter().enumerate() {
        if t > slack && t < 1.0 - slack {
            found[count] = i;
            count += 1;
        }
    }
    (found, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn identical_in_either_direction() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(classify(m, seg(0.0, 0.0, 10.0, 0.0), EPS), Relation::Identical);
        assert_eq!(classify(m, seg(10.0, 0.0, 0.0, 0.0), EPS), Relation::Identical);
    }

    #[test]
    fn disjoint_and_shared_endpoint_are_none() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert!(classify(m, seg(0.0, 5.0, 10.0, 5.0), EPS).is_none());
        assert!(classify(m, seg(10.0, 0.0, 10.0, 10.0), EPS).is_none());
        assert!(classify(m, seg(20.0, 0.0, 30.0, 0.0), EPS).is_none());
        assert!(classify(m, seg(10.0, 0.0, 20.0, 0.0), EPS).is_none());
    }

    #[test]
    fn interiors_cross() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            classify(m, seg(5.0, -5.0, 5.0, 5.0), EPS),
            Relation::Cross { point: p(5.0, 0.0) }
        );
    }

    #[test]
    fn candidate_endpoint_on_existing_interior() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            classify(m, seg(5.0, 0.0, 5.0, 5.0), EPS),
            Relation::Touch { point: p(5.0, 0.0) }
        );
    }

    #[test]
    fn existing_endpoint_on_candidate_interior() {
        let m = seg(5.0, 0.0, 5.0, 5.0);
        assert_eq!(
            classify(m, seg(0.0, 0.0, 10.0, 0.0), EPS),
            Relation::TouchReverse { point: p(5.0, 0.0) }
        );
    }

    #[test]
    fn partial_overlap_past_the_end() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            classify(m, seg(5.0, 0.0, 15.0, 0.0), EPS),
            Relation::CollinearOverlap {
                split: p(5.0, 0.0),
                remainder: seg(10.0, 0.0, 15.0, 0.0),
            }
        );
        assert_eq!(
            classify(m, seg(-5.0, 0.0, 5.0, 0.0), EPS),
            Relation::CollinearOverlap {
                split: p(5.0, 0.0),
                remainder: seg(-5.0, 0.0, 0.0, 0.0),
            }
        );
    }

    #[test]
    fn candidate_inside_existing() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            classify(m, seg(0.0, 0.0, 4.0, 0.0), EPS),
            Relation::InnerOverlap { split: p(4.0, 0.0) }
        );
        assert_eq!(
            classify(m, seg(7.0, 0.0, 3.0, 0.0), EPS),
            Relation::InnerContainment {
                splits: [p(7.0, 0.0), p(3.0, 0.0)],
            }
        );
    }

    #[test]
    fn existing_inside_candidate() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        assert_eq!(
            classify(m, seg(0.0, 0.0, 14.0, 0.0), EPS),
            Relation::OuterOverlap {
                remainder: seg(10.0, 0.0, 14.0, 0.0),
            }
        );
        assert_eq!(
            classify(m, seg(14.0, 0.0, 0.0, 0.0), EPS),
            Relation::OuterOverlap {
                remainder: seg(14.0, 0.0, 10.0, 0.0),
            }
        );
        assert_eq!(
            classify(m, seg(15.0, 0.0, -5.0, 0.0), EPS),
            Relation::OuterContainment {
                remainders: [seg(15.0, 0.0, 10.0, 0.0), seg(0.0, 0.0, -5.0, 0.0)],
            }
        );
    }

    #[test]
    fn interior_endpoints_are_packed_in_order() {
        assert_eq!(interior_endpoints([0.5, 2.0], 0.01), ([0, 0], 1));
        assert_eq!(interior_endpoints([1.5, 0.25], 0.01), ([1, 0], 1));
        assert_eq!(interior_endpoints([0.25, 0.75], 0.01), ([0, 1], 2));
        assert_eq!(interior_endpoints([0.005, 1.0], 0.01).1, 0);
    }

    #[test]
    fn near_miss_within_tolerance_is_touch() {
        let m = seg(0.0, 0.0, 10.0, 0.0);
        let rel = classify(m, seg(5.0, 1e-7, 5.0, 5.0), EPS);
        assert_eq!(rel, Relation::Touch { point: p(5.0, 1e-7) });
    }
}
