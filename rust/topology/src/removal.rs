// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Removal methods.
//!
//! Removal cascades upward: a vertex takes its lines with it, and a line
//! takes every sector bounded by it. No operation leaves a key behind that
//! no longer resolves.

use tracing::{debug, trace};

use crate::arena::*;
use crate::error::{Error, Result};
use crate::keys::*;

impl SectorMap {
    /// Removes a sector and clears it from both sides of its boundary lines.
    pub fn remove_sector(&mut self, key: SectorKey) -> Result<()> {
        let sector = self.sectors.remove(key).ok_or(Error::SectorNotFound(key))?;
        for walk in sector.loops() {
            for line in &walk.lines {
                if let Some(l) = self.lines.get_mut(*line) {
                    if l.front == Some(key) {
                        l.front = None;
                    }
                    if l.back == Some(key) {
                        l.back = None;
                    }
                }
            }
        }
        self.sector_order.retain(|&k| k != key);
        self.sector_ids.remove(&sector.id);
        self.dirty = true;
        debug!(id = sector.id, "removed sector");
        Ok(())
    }

    /// Removes a line, every sector bounded by it, and any endpoint left
    /// without lines.
    pub fn remove_line(&mut self, key: LineKey) -> Result<()> {
        let line = self.detach_line(key)?;
        for v in [line.a, line.b] {
            self.prune_vertex(v);
        }
        Ok(())
    }

    /// Removes a vertex together with every line attached to it.
    pub fn remove_vertex(&mut self, key: VertexKey) -> Result<()> {
        let attached: Vec<LineKey> = self
            .vertices
            .get(key)
            .ok_or(Error::VertexNotFound(key))?
            .lines
            .to_vec();
        for line in attached {
            if self.lines.contains_key(line) {
                self.remove_line(line)?;
            }
        }
        if self.vertices.contains_key(key) {
            self.delete_vertex(key);
        }
        Ok(())
    }

    /// Removes every listed vertex that still exists. Returns how many were removed.
    pub fn remove_vertices(&mut self, keys: &[VertexKey]) -> usize {
        keys.iter()
            .filter(|&&k| self.remove_vertex(k).is_ok())
            .count()
    }

    /// Removes every listed line that still exists. Returns how many were removed.
    pub fn remove_lines(&mut self, keys: &[LineKey]) -> usize {
        keys.iter().filter(|&&k| self.remove_line(k).is_ok()).count()
    }

    /// Removes every listed sector that still exists. Returns how many were removed.
    pub fn remove_sectors(&mut self, keys: &[SectorKey]) -> usize {
        keys.iter()
            .filter(|&&k| self.remove_sector(k).is_ok())
            .count()
    }

    /// Removes a line and its sectors but keeps both endpoints, even when
    /// they end up without lines.
    pub(crate) fn detach_line(&mut self, key: LineKey) -> Result<Line> {
        if !self.lines.contains_key(key) {
            return Err(Error::LineNotFound(key));
        }
        for sector in self.sectors_using_line(key) {
            self.remove_sector(sector)?;
        }
        let line = self.lines.remove(key).ok_or(Error::LineNotFound(key))?;
        for v in [line.a, line.b] {
            if let Some(vertex) = self.vertices.get_mut(v) {
                vertex.lines.retain(|l| *l != key);
            }
        }
        self.line_order.retain(|&k| k != key);
        self.line_ids.remove(&line.id);
        self.dirty = true;
        trace!(id = line.id, "removed line");
        Ok(line)
    }

    /// Removes `key` when no line is attached to it.
    pub(crate) fn prune_vertex(&mut self, key: VertexKey) -> bool {
        let orphan = self
            .vertices
            .get(key)
            .map_or(false, |v| v.lines.is_empty());
        if orphan {
            self.delete_vertex(key);
        }
        orphan
    }

    /// Removes every vertex without lines. Returns how many were removed.
    pub fn prune_orphan_vertices(&mut self) -> usize {
        let orphans: Vec<VertexKey> = self
            .vertices()
            .filter(|(_, v)| v.lines.is_empty())
            .map(|(k, _)| k)
            .collect();
        for &v in &orphans {
            self.delete_vertex(v);
        }
        orphans.len()
    }

    fn delete_vertex(&mut self, key: VertexKey) {
        if let Some(vertex) = self.vertices.remove(key) {
            self.vertex_order.retain(|&k| k != key);
            self.vertex_ids.remove(&vertex.id);
            self.dirty = true;
            trace!(id = vertex.id, "removed vertex");
        }
    }
}
