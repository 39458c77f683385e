// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the sector map.
//!
//! The [`SectorMap`] is the single owner of every vertex, line and sector.
//! Entities live in slot maps with stable generational keys. Cross references
//! are always keys, never pointers:
//!
//! - a vertex lists the lines attached to it (upward adjacency),
//! - a line names its two endpoints and the sectors on its two sides,
//! - a sector names the lines of its outer loop and of each hole.
//!
//! Besides the keys, every entity carries a small integer `id` that is stable
//! across serialization. Iteration always follows creation order.

use nalgebra::Point2;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::config::MapConfig;
use crate::dictionary::{LineData, SectorData};
use crate::geometry::Bounds;
use crate::keys::*;

/// A point of the map.
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: u32,
    pub position: Point2<f64>,
    pub(crate) lines: SmallVec<[LineKey; 4]>,
}

impl Vertex {
    /// Lines attached to this vertex, in attachment order.
    pub fn lines(&self) -> &[LineKey] {
        &self.lines
    }
}

/// A straight segment between two distinct vertices.
///
/// `front` is the sector on the left of `a → b`, `back` the one on its right.
#[derive(Debug, Clone)]
pub struct Line {
    pub id: u32,
    pub a: VertexKey,
    pub b: VertexKey,
    pub data: LineData,
    pub front: Option<SectorKey>,
    pub back: Option<SectorKey>,
}

impl Line {
    /// Sector on the given side.
    pub fn sector(&self, side: Side) -> Option<SectorKey> {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }

    pub(crate) fn set_sector(&mut self, side: Side, sector: Option<SectorKey>) {
        match side {
            Side::Front => self.front = sector,
            Side::Back => self.back = sector,
        }
    }

    /// The endpoint opposite to `v`, or `None` when `v` is not an endpoint.
    pub fn other(&self, v: VertexKey) -> Option<VertexKey> {
        if v == self.a {
            Some(self.b)
        } else if v == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    pub fn has_endpoint(&self, v: VertexKey) -> bool {
        self.a == v || self.b == v
    }

    /// First vertex of a walk that keeps `side` on its left.
    pub fn walk_start(&self, side: Side) -> VertexKey {
        match side {
            Side::Front => self.a,
            Side::Back => self.b,
        }
    }

    /// Last vertex of a walk that keeps `side` on its left.
    pub fn walk_end(&self, side: Side) -> VertexKey {
        match side {
            Side::Front => self.b,
            Side::Back => self.a,
        }
    }
}

/// An ordered, oriented cycle of lines.
///
/// `orientations[i]` is `true` when `lines[i]` is walked `a → b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundaryLoop {
    pub lines: Vec<LineKey>,
    pub orientations: Vec<bool>,
}

impl BoundaryLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: LineKey, forward: bool) {
        self.lines.push(line);
        self.orientations.push(forward);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterates `(line, forward)` pairs in walk order.
    pub fn iter(&self) -> impl Iterator<Item = (LineKey, bool)> + '_ {
        self.lines.iter().copied().zip(self.orientations.iter().copied())
    }

    pub fn contains(&self, line: LineKey) -> bool {
        self.lines.contains(&line)
    }

    /// The same cycle walked the other way round.
    pub fn reversed(&self) -> BoundaryLoop {
        BoundaryLoop {
            lines: self.lines.iter().rev().copied().collect(),
            orientations: self.orientations.iter().rev().map(|f| !f).collect(),
        }
    }
}

/// A polygonal face: one outer loop and zero or more holes.
///
/// Every loop keeps the sector on its left, so the outer loop runs
/// counter-clockwise and holes run clockwise.
#[derive(Debug, Clone)]
pub struct Sector {
    pub id: u32,
    pub outer: BoundaryLoop,
    pub holes: Vec<BoundaryLoop>,
    pub data: SectorData,
    pub bounds: Bounds,
}

impl Sector {
    /// Iterates the outer loop followed by every hole.
    pub fn loops(&self) -> impl Iterator<Item = &BoundaryLoop> + '_ {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Total number of lines over all loops.
    pub fn line_count(&self) -> usize {
        self.loops().map(BoundaryLoop::len).sum()
    }

    /// Returns `true` if any loop of this sector uses `line`.
    pub fn uses_line(&self, line: LineKey) -> bool {
        self.loops().any(|l| l.contains(line))
    }
}

/// The central map that owns all entities and their cross references.
///
/// # Example
///
/// ```
/// use nalgebra::Point2;
/// use sectormap_topology::SectorMap;
///
/// let mut map = SectorMap::new();
/// let (v0, _) = map.create_vertex(Point2::new(0.0, 0.0));
/// let (v1, _) = map.create_vertex(Point2::new(64.0, 0.0));
/// map.create_line(v0, v1, Default::default()).unwrap();
///
/// assert_eq!(map.vertex_count(), 2);
/// assert_eq!(map.line_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SectorMap {
    pub(crate) config: MapConfig,

    // Entity storage
    pub(crate) vertices: SlotMap<VertexKey, Vertex>,
    pub(crate) lines: SlotMap<LineKey, Line>,
    pub(crate) sectors: SlotMap<SectorKey, Sector>,

    // Creation order
    pub(crate) vertex_order: Vec<VertexKey>,
    pub(crate) line_order: Vec<LineKey>,
    pub(crate) sector_order: Vec<SectorKey>,

    // Stable ids
    pub(crate) vertex_ids: FxHashMap<u32, VertexKey>,
    pub(crate) line_ids: FxHashMap<u32, LineKey>,
    pub(crate) sector_ids: FxHashMap<u32, SectorKey>,
    pub(crate) next_vertex_id: u32,
    pub(crate) next_line_id: u32,
    pub(crate) next_sector_id: u32,

    pub(crate) dirty: bool,
}

impl SectorMap {
    /// Creates an empty map with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Creates an empty map with the given configuration.
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            config,
            vertices: SlotMap::with_key(),
            lines: SlotMap::with_key(),
            sectors: SlotMap::with_key(),
            vertex_order: Vec::new(),
            line_order: Vec::new(),
            sector_order: Vec::new(),
            vertex_ids: FxHashMap::default(),
            line_ids: FxHashMap::default(),
            sector_ids: FxHashMap::default(),
            next_vertex_id: 0,
            next_line_id: 0,
            next_sector_id: 0,
            dirty: false,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    // --- Lookup ---

    pub fn vertex(&self, key: VertexKey) -> Option<&Vertex> {
        self.vertices.get(key)
    }

    pub fn line(&self, key: LineKey) -> Option<&Line> {
        self.lines.get(key)
    }

    pub fn sector(&self, key: SectorKey) -> Option<&Sector> {
        self.sectors.get(key)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    // --- Creation-order iteration ---

    pub fn vertices(&self) -> impl Iterator<Item = (VertexKey, &Vertex)> + '_ {
        self.vertex_order
            .iter()
            .filter_map(move |&k| self.vertices.get(k).map(|v| (k, v)))
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineKey, &Line)> + '_ {
        self.line_order
            .iter()
            .filter_map(move |&k| self.lines.get(k).map(|l| (k, l)))
    }

    pub fn sectors(&self) -> impl Iterator<Item = (SectorKey, &Sector)> + '_ {
        self.sector_order
            .iter()
            .filter_map(move |&k| self.sectors.get(k).map(|s| (k, s)))
    }

    // --- Change tracking ---

    /// Returns `true` if the map changed since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    // --- Raw registration ---

    pub(crate) fn insert_vertex_raw(&mut self, id: u32, position: Point2<f64>) -> VertexKey {
        let key = self.vertices.insert(Vertex {
            id,
            position,
            lines: SmallVec::new(),
        });
        self.vertex_order.push(key);
        self.vertex_ids.insert(id, key);
        self.next_vertex_id = self.next_vertex_id.max(id.saturating_add(1));
        self.dirty = true;
        key
    }

    /// Registers a line and attaches it to both endpoints. Sides start empty.
    pub(crate) fn insert_line_raw(
        &mut self,
        id: u32,
        a: VertexKey,
        b: VertexKey,
        data: LineData,
    ) -> LineKey {
        let key = self.lines.insert(Line {
            id,
            a,
            b,
            data,
            front: None,
            back: None,
        });
        for v in [a, b] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.lines.push(key);
            }
        }
        self.line_order.push(key);
        self.line_ids.insert(id, key);
        self.next_line_id = self.next_line_id.max(id.saturating_add(1));
        self.dirty = true;
        key
    }

    /// Registers a sector and links every boundary line's side to it.
    pub(crate) fn insert_sector_raw(&mut self, sector: Sector) -> SectorKey {
        let id = sector.id;
        let key = self.sectors.insert(sector);
        self.link_sector_sides(key);
        self.sector_order.push(key);
        self.sector_ids.insert(id, key);
        self.next_sector_id = self.next_sector_id.max(id.saturating_add(1));
        self.dirty = true;
        key
    }

    fn link_sector_sides(&mut self, key: SectorKey) {
        let Some(sector) = self.sectors.get(key) else {
            return;
        };
        let sides: Vec<(LineKey, bool)> = sector.loops().flat_map(BoundaryLoop::iter).collect();
        for (line, forward) in sides {
            if let Some(l) = self.lines.get_mut(line) {
                l.set_sector(Side::from_forward(forward), Some(key));
            }
        }
    }

    pub(crate) fn alloc_vertex_id(&mut self) -> u32 {
        let id = self.next_vertex_id;
        self.next_vertex_id += 1;
        id
    }

    pub(crate) fn alloc_line_id(&mut self) -> u32 {
        let id = self.next_line_id;
        self.next_line_id += 1;
        id
    }

    pub(crate) fn alloc_sector_id(&mut self) -> u32 {
        let id = self.next_sector_id;
        self.next_sector_id += 1;
        id
    }
}

impl Default for SectorMap {
    fn default() -> Self {
        Self::new()
    }
}
