// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for insertion.
//!
//! Random polylines and loops on a small integer grid are drawn one after
//! another. After every insertion the map must stay planar: no two lines
//! cross or overlap, and every sector reference resolves both ways.

use nalgebra::Point2;
use proptest::prelude::*;
use sectormap_topology::geometry::{point_segment_distance, segment_intersect, SegmentIntersection};
use sectormap_topology::{MapConfig, SectorMap, Side};

// =============================================================================
// STRATEGIES
// =============================================================================

fn grid_point() -> impl Strategy<Value = Point2<f64>> {
    (0..=8i32, 0..=8i32).prop_map(|(x, y)| Point2::new(f64::from(x), f64::from(y)))
}

fn shape() -> impl Strategy<Value = (Vec<Point2<f64>>, bool)> {
    (prop::collection::vec(grid_point(), 2..6), any::<bool>())
}

// =============================================================================
// CHECKS
// =============================================================================

fn check_planar(map: &SectorMap) -> Result<(), TestCaseError> {
    let lines: Vec<_> = map.lines().collect();
    for (i, &(ki, li)) in lines.iter().enumerate() {
        let si = map.line_segment(ki).unwrap();
        for &(kj, lj) in &lines[i + 1..] {
            let sj = map.line_segment(kj).unwrap();
            prop_assert!(
                !((li.a == lj.a && li.b == lj.b) || (li.a == lj.b && li.b == lj.a)),
                "two lines join the same vertices"
            );

            let shares_vertex = [li.a, li.b].iter().any(|v| *v == lj.a || *v == lj.b);
            if shares_vertex {
                // Lines meeting at a vertex must leave it in different directions.
                let (pivot, p, q) = if li.a == lj.a || li.a == lj.b {
                    let far_j = if li.a == lj.a { sj.end } else { sj.start };
                    (si.start, si.end, far_j)
                } else {
                    let far_j = if li.b == lj.a { sj.end } else { sj.start };
                    (si.end, si.start, far_j)
                };
                let (u, v) = (p - pivot, q - pivot);
                let cross = u.x * v.y - u.y * v.x;
                prop_assert!(
                    cross.abs() > 1e-9 || u.dot(&v) < 0.0,
                    "collinear lines overlap at a shared vertex"
                );
                continue;
            }

            let hit = segment_intersect(si.start, si.end, sj.start, sj.end, 1e-9);
            prop_assert!(
                matches!(hit, SegmentIntersection::None),
                "lines cross or overlap: {:?}",
                hit
            );
        }
    }

    for (vk, vertex) in map.vertices() {
        for &(lk, line) in &lines {
            if line.a == vk || line.b == vk {
                continue;
            }
            let s = map.line_segment(lk).unwrap();
            prop_assert!(
                point_segment_distance(vertex.position, s.start, s.end) > 1e-6,
                "vertex lies on a line without splitting it"
            );
        }
    }
    Ok(())
}

fn check_sides(map: &SectorMap) -> Result<(), TestCaseError> {
    for (sk, sector) in map.sectors() {
        for walk in sector.loops() {
            for (lk, forward) in walk.iter() {
                let line = map.line(lk);
                prop_assert!(line.is_some());
                prop_assert_eq!(line.unwrap().sector(Side::from_forward(forward)), Some(sk));
            }
        }
    }
    for (lk, line) in map.lines() {
        for side in [Side::Front, Side::Back] {
            if let Some(sk) = line.sector(side) {
                let sector = map.sector(sk);
                prop_assert!(sector.is_some());
                prop_assert!(sector.unwrap().uses_line(lk));
            }
        }
    }
    Ok(())
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: insertions never leave crossing, overlapping or touching lines.
    #[test]
    fn prop_insertion_keeps_map_planar(shapes in prop::collection::vec(shape(), 1..5)) {
        let mut map = SectorMap::with_config(MapConfig::default().with_epsilon(1e-7));
        for (points, is_loop) in &shapes {
            // Degenerate shapes are rejected and leave the map untouched.
            let _ = map.insert_loop(points, *is_loop);
            check_planar(&map)?;
            check_sides(&map)?;
        }
    }

    /// Property: inserting the same shape twice changes nothing the second time.
    #[test]
    fn prop_reinsertion_is_idempotent((points, is_loop) in shape()) {
        let mut map = SectorMap::with_config(MapConfig::default().with_epsilon(1e-7));
        if map.insert_loop(&points, is_loop).is_ok() {
            let before = map.to_snapshot();
            let summary = map.insert_loop(&points, is_loop).unwrap();
            prop_assert!(summary.lines_created.is_empty());
            prop_assert_eq!(map.to_snapshot(), before);
        }
    }
}
