// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Query methods: lookup by id, picking by position, and derived geometry.
//!
//! Position queries are linear scans in creation order, which makes ties
//! resolve towards the oldest entity.

use nalgebra::Point2;

use crate::arena::*;
use crate::classify::Segment;
use crate::geometry::{point_in_polygon, point_segment_distance, points_equal, signed_area};
use crate::keys::*;

/// Outer boundary and hole polygons of a sector.
///
/// The outer ring is counter-clockwise and holes are clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorPolygon {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl SectorPolygon {
    /// Returns `true` if `p` is inside the outer ring and outside every hole.
    pub fn contains(&self, p: Point2<f64>) -> bool {
        point_in_polygon(&self.outer, p) && !self.holes.iter().any(|h| point_in_polygon(h, p))
    }

    /// Outer area minus hole areas.
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }
}

impl SectorMap {
    // --- Lookup by id ---

    pub fn find_vertex(&self, id: u32) -> Option<VertexKey> {
        self.vertex_ids.get(&id).copied()
    }

    pub fn find_line(&self, id: u32) -> Option<LineKey> {
        self.line_ids.get(&id).copied()
    }

    pub fn find_sector(&self, id: u32) -> Option<SectorKey> {
        self.sector_ids.get(&id).copied()
    }

    // --- Picking ---

    /// The first vertex within epsilon of `position`.
    pub fn vertex_at(&self, position: Point2<f64>) -> Option<VertexKey> {
        let eps = self.config.epsilon;
        self.vertices()
            .find(|(_, v)| points_equal(v.position, position, eps))
            .map(|(k, _)| k)
    }

    /// The nearest vertex no farther than `max_radius` from `position`.
    pub fn closest_vertex(&self, position: Point2<f64>, max_radius: f64) -> Option<VertexKey> {
        let mut best: Option<(VertexKey, f64)> = None;
        for (key, vertex) in self.vertices() {
            let d = (vertex.position - position).norm();
            if d <= max_radius && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((key, d));
            }
        }
        best.map(|(k, _)| k)
    }

    /// The nearest line no farther than `max_radius` from `position`,
    /// measured to the segment rather than its supporting line.
    pub fn closest_line(&self, position: Point2<f64>, max_radius: f64) -> Option<LineKey> {
        let mut best: Option<(LineKey, f64)> = None;
        for (key, _) in self.lines() {
            let Some(segment) = self.line_segment(key) else {
                continue;
            };
            let d = point_segment_distance(position, segment.start, segment.end);
            if d <= max_radius && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((key, d));
            }
        }
        best.map(|(k, _)| k)
    }

    /// The innermost sector containing `position`.
    ///
    /// A point inside a hole belongs to whatever fills the hole, so when
    /// several sectors contain the point the smallest one wins.
    pub fn sector_at(&self, position: Point2<f64>) -> Option<SectorKey> {
        let mut best: Option<(SectorKey, f64)> = None;
        for (key, sector) in self.sectors() {
            if !sector.bounds.contains(position) {
                continue;
            }
            let Some(polygon) = self.sector_polygon(key) else {
                continue;
            };
            if !polygon.contains(position) {
                continue;
            }
            let area = polygon.area();
            if best.map_or(true, |(_, ba)| area < ba) {
                best = Some((key, area));
            }
        }
        best.map(|(k, _)| k)
    }

    /// The line joining two vertices in either direction.
    pub fn line_between(&self, v0: VertexKey, v1: VertexKey) -> Option<LineKey> {
        let vertex = self.vertices.get(v0)?;
        vertex.lines.iter().copied().find(|&l| {
            self.lines
                .get(l)
                .map_or(false, |line| line.other(v0) == Some(v1))
        })
    }

    // --- Derived geometry ---

    pub fn line_segment(&self, key: LineKey) -> Option<Segment> {
        let line = self.lines.get(key)?;
        let a = self.vertices.get(line.a)?;
        let b = self.vertices.get(line.b)?;
        Some(Segment::new(a.position, b.position))
    }

    /// Vertices of a loop in walk order, one per line.
    pub fn loop_vertices(&self, walk: &BoundaryLoop) -> Option<Vec<VertexKey>> {
        walk.iter()
            .map(|(key, forward)| {
                let line = self.lines.get(key)?;
                Some(line.walk_start(Side::from_forward(forward)))
            })
            .collect()
    }

    pub fn loop_polygon(&self, walk: &BoundaryLoop) -> Option<Vec<Point2<f64>>> {
        self.loop_vertices(walk)?
            .into_iter()
            .map(|v| self.vertices.get(v).map(|vertex| vertex.position))
            .collect()
    }

    pub fn sector_polygon(&self, key: SectorKey) -> Option<SectorPolygon> {
        let sector = self.sectors.get(key)?;
        let outer = self.loop_polygon(&sector.outer)?;
        let holes = sector
            .holes
            .iter()
            .map(|h| self.loop_polygon(h))
            .collect::<Option<Vec<_>>>()?;
        Some(SectorPolygon { outer, holes })
    }

    pub fn sector_area(&self, key: SectorKey) -> Option<f64> {
        self.sector_polygon(key).map(|p| p.area())
    }

    /// Sectors with `line` in any of their loops.
    pub fn sectors_using_line(&self, line: LineKey) -> Vec<SectorKey> {
        self.sectors()
            .filter(|(_, s)| s.uses_line(line))
            .map(|(k, _)| k)
            .collect()
    }
}
