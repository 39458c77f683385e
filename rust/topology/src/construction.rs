// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction methods for map entities.
//!
//! Every create operation is idempotent: asking for an entity that already
//! exists returns the existing key together with `false`. Referential
//! integrity is checked before anything is registered.

use nalgebra::Point2;
use tracing::{debug, trace};

use crate::arena::*;
use crate::dictionary::{LineData, SectorData};
use crate::error::{Error, Limit, Result};
use crate::geometry::bounding_box;
use crate::keys::*;

impl SectorMap {
    /// Returns the vertex at `position`, creating it when none is within
    /// epsilon. The flag is `true` when a vertex was created.
    pub fn create_vertex(&mut self, position: Point2<f64>) -> (VertexKey, bool) {
        if let Some(existing) = self.vertex_at(position) {
            return (existing, false);
        }
        let id = self.alloc_vertex_id();
        let key = self.insert_vertex_raw(id, position);
        trace!(id, x = position.x, y = position.y, "created vertex");
        (key, true)
    }

    /// Returns the line joining `v0` and `v1` in either direction, creating
    /// it from `v0` to `v1` when none exists.
    ///
    /// Fails with [`Error::DegenerateLine`] when both keys are the same vertex
    /// and with [`Error::CapacityExceeded`] when either vertex already carries
    /// `max_vertex_lines` lines.
    pub fn create_line(
        &mut self,
        v0: VertexKey,
        v1: VertexKey,
        data: LineData,
    ) -> Result<(LineKey, bool)> {
        for v in [v0, v1] {
            if !self.vertices.contains_key(v) {
                return Err(Error::VertexNotFound(v));
            }
        }
        if v0 == v1 {
            return Err(Error::DegenerateLine);
        }
        if let Some(existing) = self.line_between(v0, v1) {
            return Ok((existing, false));
        }

        let max = self.config.max_vertex_lines;
        if [v0, v1].iter().any(|&v| self.vertices[v].lines.len() >= max) {
            return Err(Error::CapacityExceeded {
                limit: Limit::VertexLines,
                max,
            });
        }

        let id = self.alloc_line_id();
        let key = self.insert_line_raw(id, v0, v1, data);
        trace!(id, "created line");
        Ok((key, true))
    }

    /// Registers a sector bounded by `outer` with optional `holes`.
    ///
    /// Loops must keep the sector on their left. An existing sector with the
    /// same set of outer lines is returned instead of a duplicate.
    pub fn create_sector(
        &mut self,
        outer: BoundaryLoop,
        holes: Vec<BoundaryLoop>,
        data: SectorData,
    ) -> Result<(SectorKey, bool)> {
        self.validate_loop(&outer)?;
        for hole in &holes {
            self.validate_loop(hole)?;
        }

        let total: usize = outer.len() + holes.iter().map(BoundaryLoop::len).sum::<usize>();
        let max = self.config.max_sector_lines;
        if total > max {
            return Err(Error::CapacityExceeded {
                limit: Limit::SectorLines,
                max,
            });
        }

        if let Some(existing) = self.find_equivalent_sector(&outer) {
            return Ok((existing, false));
        }

        let polygon = self.loop_polygon(&outer).ok_or(Error::DegenerateSector)?;
        let bounds = bounding_box(&polygon).ok_or(Error::DegenerateSector)?;
        let id = self.alloc_sector_id();
        let hole_count = holes.len();
        let key = self.insert_sector_raw(Sector {
            id,
            outer,
            holes,
            data,
            bounds,
        });
        debug!(id, lines = total, holes = hole_count, "created sector");
        Ok((key, true))
    }

    /// Returns the sector whose outer loop uses exactly the lines of `outer`.
    pub fn find_equivalent_sector(&self, outer: &BoundaryLoop) -> Option<SectorKey> {
        self.sectors()
            .find(|(_, s)| {
                s.outer.len() == outer.len() && outer.lines.iter().all(|&l| s.outer.contains(l))
            })
            .map(|(k, _)| k)
    }

    /// Replaces the user data of a line.
    pub fn set_line_data(&mut self, key: LineKey, data: LineData) -> Result<()> {
        let line = self.lines.get_mut(key).ok_or(Error::LineNotFound(key))?;
        line.data = data;
        self.dirty = true;
        Ok(())
    }

    /// Replaces the user data of a sector.
    pub fn set_sector_data(&mut self, key: SectorKey, data: SectorData) -> Result<()> {
        let sector = self.sectors.get_mut(key).ok_or(Error::SectorNotFound(key))?;
        sector.data = data;
        self.dirty = true;
        Ok(())
    }

    /// Checks that a loop has at least three existing lines that chain end
    /// to start and close on themselves.
    pub(crate) fn validate_loop(&self, walk: &BoundaryLoop) -> Result<()> {
        if walk.len() < 3 || walk.orientations.len() != walk.lines.len() {
            return Err(Error::DegenerateSector);
        }
        let mut previous_end = None;
        let mut first_start = None;
        for (key, forward) in walk.iter() {
            let line = self.lines.get(key).ok_or(Error::LineNotFound(key))?;
            let side = Side::from_forward(forward);
            let start = line.walk_start(side);
            if let Some(end) = previous_end {
                if end != start {
                    return Err(Error::DegenerateSector);
                }
            }
            first_start.get_or_insert(start);
            previous_end = Some(line.walk_end(side));
        }
        if previous_end != first_start {
            return Err(Error::DegenerateSector);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn square(map: &mut SectorMap) -> BoundaryLoop {
        let corners = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let keys: Vec<VertexKey> = corners
            .iter()
            .map(|&(x, y)| map.create_vertex(Point2::new(x, y)).0)
            .collect();
        let mut walk = BoundaryLoop::new();
        for i in 0..4 {
            let (line, _) = map
                .create_line(keys[i], keys[(i + 1) % 4], LineData::default())
                .unwrap();
            walk.push(line, true);
        }
        walk
    }

    #[test]
    fn create_vertex_dedups_within_epsilon() {
        let mut map = SectorMap::new();
        let (a, created) = map.create_vertex(Point2::new(1.0, 1.0));
        assert!(created);
        let (b, created) = map.create_vertex(Point2::new(1.0 + 1e-6, 1.0));
        assert!(!created);
        assert_eq!(a, b);
        assert_eq!(map.vertex_count(), 1);
    }

    #[test]
    fn create_line_dedups_either_direction() {
        let mut map = SectorMap::new();
        let (a, _) = map.create_vertex(Point2::new(0.0, 0.0));
        let (b, _) = map.create_vertex(Point2::new(1.0, 0.0));
        let (l, created) = map.create_line(a, b, LineData::default()).unwrap();
        assert!(created);
        let (again, created) = map.create_line(b, a, LineData::default()).unwrap();
        assert!(!created);
        assert_eq!(l, again);
        assert_eq!(map.vertex(a).unwrap().lines().len(), 1);
    }

    #[test]
    fn create_line_rejects_same_vertex() {
        let mut map = SectorMap::new();
        let (a, _) = map.create_vertex(Point2::new(0.0, 0.0));
        assert!(matches!(
            map.create_line(a, a, LineData::default()),
            Err(Error::DegenerateLine)
        ));
    }

    #[test]
    fn create_line_enforces_vertex_capacity() {
        let config = MapConfig {
            max_vertex_lines: 2,
            ..MapConfig::default()
        };
        let mut map = SectorMap::with_config(config);
        let (hub, _) = map.create_vertex(Point2::new(0.0, 0.0));
        for i in 0..2 {
            let (v, _) = map.create_vertex(Point2::new(1.0, i as f64));
            map.create_line(hub, v, LineData::default()).unwrap();
        }
        let (v, _) = map.create_vertex(Point2::new(-1.0, 0.0));
        let err = map.create_line(hub, v, LineData::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                limit: Limit::VertexLines,
                max: 2
            }
        ));
    }

    #[test]
    fn create_sector_links_sides_and_dedups() {
        let mut map = SectorMap::new();
        let walk = square(&mut map);
        let (s, created) = map
            .create_sector(walk.clone(), Vec::new(), SectorData::default())
            .unwrap();
        assert!(created);
        for &l in &walk.lines {
            assert_eq!(map.line(l).unwrap().front, Some(s));
            assert_eq!(map.line(l).unwrap().back, None);
        }
        let bounds = map.sector(s).unwrap().bounds;
        assert_eq!(bounds.max, Point2::new(10.0, 10.0));

        let mut rotated = walk.clone();
        rotated.lines.rotate_left(1);
        rotated.orientations.rotate_left(1);
        let (again, created) = map
            .create_sector(rotated, Vec::new(), SectorData::default())
            .unwrap();
        assert!(!created);
        assert_eq!(again, s);
        assert_eq!(map.sector_count(), 1);
    }

    #[test]
    fn create_sector_rejects_open_chain() {
        let mut map = SectorMap::new();
        let mut walk = square(&mut map);
        walk.lines.pop();
        walk.orientations.pop();
        assert!(matches!(
            map.create_sector(walk, Vec::new(), SectorData::default()),
            Err(Error::DegenerateSector)
        ));
    }

    #[test]
    fn set_data_marks_dirty() {
        let mut map = SectorMap::new();
        let walk = square(&mut map);
        let (s, _) = map
            .create_sector(walk, Vec::new(), SectorData::default())
            .unwrap();
        map.mark_clean();

        let data = SectorData {
            floor_height: 16.0,
            ..SectorData::default()
        };
        map.set_sector_data(s, data.clone()).unwrap();
        assert!(map.is_dirty());
        assert_eq!(map.sector(s).unwrap().data, data);
    }
}
