// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for sector maps.
//!
//! Snapshots reference entities by their stable ids, so a map saved and
//! loaded again keeps every id, every creation order and every piece of user
//! data. Attachment lists and line sides are not stored; they are rebuilt
//! from the lines and sectors on load.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::arena::*;
use crate::config::MapConfig;
use crate::dictionary::{LineData, SectorData};
use crate::error::{Error, Result};
use crate::geometry::bounding_box;
use crate::keys::*;

/// Serializable representation of a whole map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
    #[serde(default)]
    pub config: MapConfig,
    pub vertices: Vec<VertexSnapshot>,
    pub lines: Vec<LineSnapshot>,
    pub sectors: Vec<SectorSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub id: u32,
    pub a: u32,
    pub b: u32,
    #[serde(default)]
    pub data: LineData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSnapshot {
    pub lines: Vec<u32>,
    pub orientations: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorSnapshot {
    pub id: u32,
    pub outer: LoopSnapshot,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<LoopSnapshot>,
    #[serde(default)]
    pub data: SectorData,
}

fn invalid(message: String) -> Error {
    Error::Serialization(message)
}

impl SectorMap {
    /// Serializes the map to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Loads a map from JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: MapSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot)
    }

    /// Creates a serializable snapshot, entities in creation order.
    pub fn to_snapshot(&self) -> MapSnapshot {
        let vertex_id = |k: VertexKey| self.vertices.get(k).map_or(u32::MAX, |v| v.id);
        let line_id = |k: LineKey| self.lines.get(k).map_or(u32::MAX, |l| l.id);
        let loop_snapshot = |walk: &BoundaryLoop| LoopSnapshot {
            lines: walk.lines.iter().map(|&l| line_id(l)).collect(),
            orientations: walk.orientations.clone(),
        };

        MapSnapshot {
            config: self.config,
            vertices: self
                .vertices()
                .map(|(_, v)| VertexSnapshot {
                    id: v.id,
                    x: v.position.x,
                    y: v.position.y,
                })
                .collect(),
            lines: self
                .lines()
                .map(|(_, l)| LineSnapshot {
                    id: l.id,
                    a: vertex_id(l.a),
                    b: vertex_id(l.b),
                    data: l.data.clone(),
                })
                .collect(),
            sectors: self
                .sectors()
                .map(|(_, s)| SectorSnapshot {
                    id: s.id,
                    outer: loop_snapshot(&s.outer),
                    holes: s.holes.iter().map(&loop_snapshot).collect(),
                    data: s.data.clone(),
                })
                .collect(),
        }
    }

    /// Rebuilds a map from a snapshot, validating every reference.
    pub fn from_snapshot(snapshot: &MapSnapshot) -> Result<Self> {
        let mut map = SectorMap::with_config(snapshot.config);

        for v in &snapshot.vertices {
            if map.vertex_ids.contains_key(&v.id) {
                return Err(invalid(format!("duplicate vertex id {}", v.id)));
            }
            map.insert_vertex_raw(v.id, Point2::new(v.x, v.y));
        }

        for l in &snapshot.lines {
            if map.line_ids.contains_key(&l.id) {
                return Err(invalid(format!("duplicate line id {}", l.id)));
            }
            let a = map
                .find_vertex(l.a)
                .ok_or_else(|| invalid(format!("line {} references unknown vertex {}", l.id, l.a)))?;
            let b = map
                .find_vertex(l.b)
                .ok_or_else(|| invalid(format!("line {} references unknown vertex {}", l.id, l.b)))?;
            if a == b {
                return Err(invalid(format!("line {} has equal endpoints", l.id)));
            }
            if map.line_between(a, b).is_some() {
                return Err(invalid(format!("line {} duplicates another line", l.id)));
            }
            map.insert_line_raw(l.id, a, b, l.data.clone());
        }

        for s in &snapshot.sectors {
            if map.sector_ids.contains_key(&s.id) {
                return Err(invalid(format!("duplicate sector id {}", s.id)));
            }
            let outer = map.restore_loop(s.id, &s.outer)?;
            let holes = s
                .holes
                .iter()
                .map(|h| map.restore_loop(s.id, h))
                .collect::<Result<Vec<_>>>()?;

            for walk in std::iter::once(&outer).chain(holes.iter()) {
                for (line, forward) in walk.iter() {
                    let side = Side::from_forward(forward);
                    if map.lines.get(line).and_then(|l| l.sector(side)).is_some() {
                        return Err(invalid(format!(
                            "sector {} claims a line side that is already taken",
                            s.id
                        )));
                    }
                }
            }

            let polygon = map
                .loop_polygon(&outer)
                .ok_or_else(|| invalid(format!("sector {} has a broken outer loop", s.id)))?;
            let bounds = bounding_box(&polygon)
                .ok_or_else(|| invalid(format!("sector {} has an empty outer loop", s.id)))?;
            map.insert_sector_raw(Sector {
                id: s.id,
                outer,
                holes,
                data: s.data.clone(),
                bounds,
            });
        }

        map.dirty = false;
        Ok(map)
    }

    fn restore_loop(&self, sector: u32, snapshot: &LoopSnapshot) -> Result<BoundaryLoop> {
        if snapshot.lines.len() != snapshot.orientations.len() {
            return Err(invalid(format!(
                "sector {sector} loop has {} lines but {} orientations",
                snapshot.lines.len(),
                snapshot.orientations.len()
            )));
        }
        let mut walk = BoundaryLoop::new();
        for (&id, &forward) in snapshot.lines.iter().zip(&snapshot.orientations) {
            let line = self
                .find_line(id)
                .ok_or_else(|| invalid(format!("sector {sector} references unknown line {id}")))?;
            walk.push(line, forward);
        }
        self.validate_loop(&walk)
            .map_err(|_| invalid(format!("sector {sector} has an open or short loop")))?;
        Ok(walk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictValue;

    fn sample() -> SectorMap {
        let mut map = SectorMap::new();
        let square = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        let points: Vec<Point2<f64>> = square.iter().map(|&(x, y)| Point2::new(x, y)).collect();
        let mut sector_data = SectorData::default();
        sector_data
            .properties
            .insert("light".to_string(), DictValue::Int(160));
        map.insert_loop_with(&points, true, &LineData::default(), &sector_data)
            .unwrap();
        map.insert_loop(&[Point2::new(5.0, -5.0), Point2::new(5.0, 15.0)], false)
            .unwrap();
        map
    }

    #[test]
    fn json_round_trip_preserves_everything() {
        let map = sample();
        let json = map.to_json().unwrap();
        let restored = SectorMap::from_json(&json).unwrap();

        assert_eq!(restored.to_snapshot(), map.to_snapshot());
        assert!(!restored.is_dirty());
        for (key, line) in restored.lines() {
            let original = map.find_line(line.id).and_then(|k| map.line(k)).unwrap();
            assert_eq!(line.front.is_some(), original.front.is_some());
            assert_eq!(line.back.is_some(), original.back.is_some());
            assert!(restored.vertex(line.a).unwrap().lines().contains(&key));
        }
    }

    #[test]
    fn ids_continue_after_load() {
        let map = sample();
        let mut restored = SectorMap::from_json(&map.to_json().unwrap()).unwrap();
        let max_id = restored.vertices().map(|(_, v)| v.id).max().unwrap();
        let (v, _) = restored.create_vertex(Point2::new(-50.0, -50.0));
        assert_eq!(restored.vertex(v).unwrap().id, max_id + 1);
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let mut snapshot = sample().to_snapshot();
        snapshot.lines[0].a = 9999;
        assert!(matches!(
            SectorMap::from_snapshot(&snapshot),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut snapshot = sample().to_snapshot();
        let first = snapshot.vertices[0].clone();
        snapshot.vertices.push(first);
        assert!(SectorMap::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn broken_loop_is_rejected() {
        let mut snapshot = sample().to_snapshot();
        snapshot.sectors[0].outer.lines.pop();
        snapshot.sectors[0].outer.orientations.pop();
        assert!(SectorMap::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn invalid_json() {
        assert!(SectorMap::from_json("not json").is_err());
    }
}
