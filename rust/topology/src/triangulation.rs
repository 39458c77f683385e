// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fill triangulation of sectors for renderers.

use crate::arena::SectorMap;
use crate::keys::*;

impl SectorMap {
    /// Triangulates a sector, holes included, with ear clipping.
    ///
    /// Triangles are returned as vertex keys. Returns `None` if the sector
    /// does not exist or the polygon cannot be triangulated.
    pub fn triangulate_sector(&self, key: SectorKey) -> Option<Vec<[VertexKey; 3]>> {
        let sector = self.sectors.get(key)?;

        let mut all_verts: Vec<VertexKey> = self.loop_vertices(&sector.outer)?;
        let mut hole_indices: Vec<usize> = Vec::with_capacity(sector.holes.len());
        for hole in &sector.holes {
            hole_indices.push(all_verts.len());
            all_verts.extend(self.loop_vertices(hole)?);
        }

        let mut coords: Vec<f64> = Vec::with_capacity(all_verts.len() * 2);
        for &vk in &all_verts {
            let p = self.vertices.get(vk)?.position;
            coords.push(p.x);
            coords.push(p.y);
        }

        let indices = earcutr::earcut(&coords, &hole_indices, 2).ok()?;
        Some(
            indices
                .chunks_exact(3)
                .map(|t| [all_verts[t[0]], all_verts[t[1]], all_verts[t[2]]])
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::arena::SectorMap;
    use nalgebra::Point2;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ]
    }

    #[test]
    fn square_gives_two_triangles() {
        let mut map = SectorMap::new();
        let summary = map.insert_loop(&rect(0.0, 0.0, 10.0, 10.0), true).unwrap();
        let triangles = map.triangulate_sector(summary.sectors_created[0]).unwrap();
        assert_eq!(triangles.len(), 2);
    }

    #[test]
    fn sector_with_hole_covers_the_ring() {
        let mut map = SectorMap::new();
        map.insert_loop(&rect(0.0, 0.0, 100.0, 100.0), true).unwrap();
        map.insert_loop(&rect(40.0, 40.0, 60.0, 60.0), true).unwrap();

        let outer = map.sector_at(Point2::new(10.0, 10.0)).unwrap();
        let triangles = map.triangulate_sector(outer).unwrap();
        // Two rings of four vertices each: n + 2h - 2 triangles.
        assert_eq!(triangles.len(), 8);

        let area: f64 = triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|v| map.vertex(v).unwrap().position);
                ((b - a).perp(&(c - a)) * 0.5).abs()
            })
            .sum();
        assert!((area - 9600.0).abs() < 1e-6);
    }
}
