// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # SectorMap Topology
//!
//! Planar straight-line graph (PSLG) engine for sector-based 2D map editors.
//!
//! A [`SectorMap`] holds vertices, lines between them, and sectors: polygonal
//! faces bounded by one outer loop of lines and any number of holes. Every
//! line knows the sector on each of its sides.
//!
//! Shapes are added with [`SectorMap::insert_loop`], which keeps the graph
//! planar. New segments are split where they cross, touch or overlap
//! existing lines, and every sector they cut is traced again with its data
//! carried over.
//!
//! ```
//! use nalgebra::Point2;
//! use sectormap_topology::SectorMap;
//!
//! let mut map = SectorMap::new();
//! let square = [
//!     Point2::new(0.0, 0.0),
//!     Point2::new(10.0, 0.0),
//!     Point2::new(10.0, 10.0),
//!     Point2::new(0.0, 10.0),
//! ];
//! map.insert_loop(&square, true).unwrap();
//! map.insert_loop(&[Point2::new(5.0, -5.0), Point2::new(5.0, 15.0)], false)
//!     .unwrap();
//!
//! assert_eq!(map.sector_count(), 2);
//! ```

pub mod arena;
pub mod classify;
pub mod config;
pub mod construction;
pub mod dictionary;
pub mod error;
pub mod faces;
pub mod geometry;
pub mod insertion;
pub mod keys;
pub mod query;
pub mod removal;
pub mod serialization;
pub mod triangulation;

pub use arena::{BoundaryLoop, Line, Sector, SectorMap, Vertex};
pub use classify::{classify, Relation, Segment};
pub use config::MapConfig;
pub use dictionary::{DictValue, Dictionary, LineData, SectorData};
pub use error::{Error, Limit, Result};
pub use faces::AngleOrder;
pub use geometry::{Bounds, SegmentIntersection};
pub use insertion::InsertSummary;
pub use keys::{LineKey, SectorKey, Side, VertexKey};
pub use query::SectorPolygon;
pub use serialization::MapSnapshot;
