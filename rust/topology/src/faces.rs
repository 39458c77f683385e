// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face finding: closed loops around planar faces.
//!
//! A trace starts on one side of a line and keeps turning as tightly as
//! possible towards the face at every vertex. The search is an explicit
//! depth-first walk over a stack of path frames that share one candidate
//! buffer, so there is no recursion and every buffer is reused between
//! attempts. A frame whose candidates run out is popped together with the
//! line that led to it, and that directed line is not tried again during
//! the same trace.
//!
//! [`SectorMap::make_sector`] uses two traces: an [`AngleOrder::Outer`] trace
//! for the outer boundary, then [`AngleOrder::Inner`] traces from lines
//! inside it to collect island silhouettes as holes.

use nalgebra::Point2;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::arena::*;
use crate::dictionary::SectorData;
use crate::error::{Error, Limit, Result};
use crate::geometry::{angle_of, point_in_polygon, signed_area};
use crate::keys::*;

/// Which way a trace turns at each vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleOrder {
    /// Tightest left turn first. The traced face is on the left of the walk.
    Outer,
    /// Tightest right turn first. The traced face is on the right of the walk.
    Inner,
}

#[derive(Debug, Clone, Copy)]
struct PathFrame {
    vertex: VertexKey,
    /// First candidate of this frame in the shared buffer.
    start: usize,
    cursor: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    line: LineKey,
    forward: bool,
    far: VertexKey,
    angle: f64,
}

/// Growable buffers shared by the traces of one face-finding call.
#[derive(Debug, Default)]
pub(crate) struct TraceScratch {
    frames: Vec<PathFrame>,
    candidates: Vec<Candidate>,
    path: Vec<(LineKey, bool)>,
    visited: FxHashSet<VertexKey>,
    exhausted: FxHashSet<(LineKey, bool)>,
}

impl TraceScratch {
    fn rewind(&mut self) {
        self.frames.clear();
        self.candidates.clear();
        self.path.clear();
        self.visited.clear();
        self.exhausted.clear();
    }
}

impl SectorMap {
    /// Traces the loop around the face on `side` of `start`.
    ///
    /// Returns `None` when the walk cannot close. The returned loop begins
    /// with `start` and, for [`AngleOrder::Outer`], keeps the face on its left.
    pub fn find_loop(
        &self,
        start: LineKey,
        side: Side,
        order: AngleOrder,
    ) -> Result<Option<BoundaryLoop>> {
        let mut scratch = TraceScratch::default();
        self.trace_loop(&mut scratch, start, side, order)
    }

    /// Creates the sector on `side` of `start`, including its holes.
    ///
    /// Returns `None` when that side does not enclose a bounded face, and the
    /// existing sector with `false` when the face is already registered.
    pub fn make_sector(
        &mut self,
        start: LineKey,
        side: Side,
        data: SectorData,
    ) -> Result<Option<(SectorKey, bool)>> {
        let mut scratch = TraceScratch::default();
        let Some(outer) = self.trace_loop(&mut scratch, start, side, AngleOrder::Outer)? else {
            trace!(side = %side, "no closed loop");
            return Ok(None);
        };
        let polygon = self
            .loop_polygon(&outer)
            .ok_or(Error::LineNotFound(start))?;
        if signed_area(&polygon) <= 0.0 {
            trace!(side = %side, lines = outer.len(), "loop encloses an unbounded face");
            return Ok(None);
        }
        if let Some(existing) = self.find_equivalent_sector(&outer) {
            return Ok(Some((existing, false)));
        }

        let holes = self.find_holes(&mut scratch, &outer, &polygon)?;
        self.create_sector(outer, holes, data).map(Some)
    }

    /// Collects island silhouettes strictly inside `polygon`, oriented so
    /// that the enclosing sector lies on their left.
    fn find_holes(
        &self,
        scratch: &mut TraceScratch,
        outer: &BoundaryLoop,
        polygon: &[Point2<f64>],
    ) -> Result<Vec<BoundaryLoop>> {
        let outer_vertices: FxHashSet<VertexKey> = self
            .loop_vertices(outer)
            .unwrap_or_default()
            .into_iter()
            .collect();

        let candidates: Vec<LineKey> = self
            .lines()
            .filter(|(key, line)| {
                !outer.contains(*key)
                    && [line.a, line.b].iter().all(|v| {
                        self.vertices
                            .get(*v)
                            .map_or(false, |vertex| point_in_polygon(polygon, vertex.position))
                    })
            })
            .map(|(key, _)| key)
            .collect();

        let mut used: FxHashSet<LineKey> = FxHashSet::default();
        let mut skip: FxHashSet<LineKey> = FxHashSet::default();
        // Each silhouette keeps one ring point off the outer boundary for
        // the nesting test.
        let mut silhouettes: Vec<(BoundaryLoop, Vec<Point2<f64>>, Point2<f64>)> = Vec::new();

        for candidate in candidates {
            if used.contains(&candidate) || skip.contains(&candidate) {
                continue;
            }
            let mut found = false;
            for side in [Side::Front, Side::Back] {
                let Some(walk) = self.trace_loop(scratch, candidate, side, AngleOrder::Inner)? else {
                    continue;
                };
                let Some(ring) = self.loop_polygon(&walk) else {
                    continue;
                };
                if signed_area(&ring) <= 0.0 {
                    continue;
                }
                // An island may touch the boundary at one vertex but never
                // share a line with it or leave the polygon.
                if walk.lines.iter().any(|l| outer.contains(*l)) {
                    continue;
                }
                let ring_vertices = self.loop_vertices(&walk).unwrap_or_default();
                let touching = ring_vertices
                    .iter()
                    .filter(|v| outer_vertices.contains(*v))
                    .count();
                let enclosed = ring_vertices.iter().zip(&ring).all(|(v, p)| {
                    outer_vertices.contains(v) || point_in_polygon(polygon, *p)
                });
                if touching > 1 || !enclosed {
                    continue;
                }
                if walk.lines.iter().any(|l| used.contains(l)) {
                    skip.extend(walk.lines.iter().copied());
                    found = true;
                    break;
                }
                let Some(anchor) = ring_vertices
                    .iter()
                    .zip(&ring)
                    .find(|(v, _)| !outer_vertices.contains(*v))
                    .map(|(_, p)| *p)
                else {
                    continue;
                };
                used.extend(walk.lines.iter().copied());
                silhouettes.push((walk, ring, anchor));
                found = true;
                break;
            }
            if !found {
                skip.insert(candidate);
            }
        }

        // Islands inside another island's silhouette belong to a sector
        // nested in that island.
        let mut holes = Vec::with_capacity(silhouettes.len());
        for (i, (walk, _, anchor)) in silhouettes.iter().enumerate() {
            let nested = silhouettes
                .iter()
                .enumerate()
                .any(|(j, (_, other, _))| i != j && point_in_polygon(other, *anchor));
            if !nested {
                holes.push(walk.reversed());
            }
        }
        if !holes.is_empty() {
            debug!(holes = holes.len(), "found sector holes");
        }
        Ok(holes)
    }

    fn trace_loop(
        &self,
        scratch: &mut TraceScratch,
        start: LineKey,
        side: Side,
        order: AngleOrder,
    ) -> Result<Option<BoundaryLoop>> {
        scratch.rewind();
        let line = self.lines.get(start).ok_or(Error::LineNotFound(start))?;
        let from = line.walk_start(side);
        let to = line.walk_end(side);

        scratch.path.push((start, side == Side::Front));
        self.push_frame(scratch, to, from, start, order)?;

        let max_steps = self.config.max_search_steps;
        let max_lines = self.config.max_sector_lines;
        let mut steps = 0usize;

        loop {
            let Some(frame) = scratch.frames.last_mut() else {
                return Ok(None);
            };

            if frame.cursor >= scratch.candidates.len() {
                let (begin, vertex) = (frame.start, frame.vertex);
                scratch.frames.pop();
                scratch.candidates.truncate(begin);
                scratch.visited.remove(&vertex);
                if let Some(dead) = scratch.path.pop() {
                    scratch.exhausted.insert(dead);
                }
                if scratch.path.is_empty() {
                    return Ok(None);
                }
                continue;
            }

            let candidate = scratch.candidates[frame.cursor];
            frame.cursor += 1;
            let vertex = frame.vertex;

            steps += 1;
            if steps > max_steps {
                return Err(Error::CapacityExceeded {
                    limit: Limit::SearchSteps,
                    max: max_steps,
                });
            }

            if candidate.line == start {
                if scratch.path.len() >= 3 {
                    let mut walk = BoundaryLoop::new();
                    for &(l, forward) in &scratch.path {
                        walk.push(l, forward);
                    }
                    return Ok(Some(walk));
                }
                continue;
            }
            if scratch.visited.contains(&candidate.far) {
                continue;
            }
            if scratch.path.len() >= max_lines {
                return Err(Error::CapacityExceeded {
                    limit: Limit::SectorLines,
                    max: max_lines,
                });
            }

            scratch.path.push((candidate.line, candidate.forward));
            self.push_frame(scratch, candidate.far, vertex, candidate.line, order)?;
        }
    }

    /// Pushes a frame at `vertex`, reached from `came_from` along `via`, with
    /// the remaining lines ranked by turn angle.
    fn push_frame(
        &self,
        scratch: &mut TraceScratch,
        vertex: VertexKey,
        came_from: VertexKey,
        via: LineKey,
        order: AngleOrder,
    ) -> Result<()> {
        let here = self.vertices.get(vertex).ok_or(Error::VertexNotFound(vertex))?;
        let origin = self
            .vertices
            .get(came_from)
            .ok_or(Error::VertexNotFound(came_from))?
            .position;

        let begin = scratch.candidates.len();
        for &key in &here.lines {
            if key == via {
                continue;
            }
            let Some(line) = self.lines.get(key) else {
                continue;
            };
            let forward = line.a == vertex;
            if scratch.exhausted.contains(&(key, forward)) {
                continue;
            }
            let far = if forward { line.b } else { line.a };
            let Some(far_vertex) = self.vertices.get(far) else {
                continue;
            };
            scratch.candidates.push(Candidate {
                line: key,
                forward,
                far,
                angle: angle_of(far_vertex.position, here.position, origin),
            });
        }

        let ranked = &mut scratch.candidates[begin..];
        match order {
            AngleOrder::Outer => ranked.sort_by(|x, y| x.angle.total_cmp(&y.angle)),
            AngleOrder::Inner => ranked.sort_by(|x, y| y.angle.total_cmp(&x.angle)),
        }

        scratch.frames.push(PathFrame {
            vertex,
            start: begin,
            cursor: begin,
        });
        scratch.visited.insert(vertex);
        Ok(())
    }
}
