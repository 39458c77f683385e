// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line insertion: drawing polylines and loops into the map.
//!
//! A drawn shape is broken into segments that go through a FIFO work queue.
//! Each segment is classified against the existing lines and either split
//! into smaller pieces, merged with what is already there, or committed as a
//! new line. Existing lines that get split take their sectors down with them;
//! the faces are traced again once the queue drains, carrying the old sector
//! data over.
//!
//! The whole operation is transactional. On any error the map is restored to
//! its state before the call.

use std::collections::VecDeque;

use nalgebra::{Point2, Vector2};
use tracing::{debug, trace};

use crate::arena::*;
use crate::classify::{classify, Relation, Segment};
use crate::dictionary::{LineData, SectorData};
use crate::error::{Error, Limit, Result};
use crate::geometry::{point_in_polygon, points_equal, project_param, signed_area};
use crate::keys::*;

/// What an insertion changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertSummary {
    /// New lines that survive the insertion, in creation order.
    pub lines_created: Vec<LineKey>,
    /// Number of line splits performed.
    pub lines_split: usize,
    /// New sectors, including re-derived ones.
    pub sectors_created: Vec<SectorKey>,
}

#[derive(Debug, Clone, Copy)]
struct PendingSegment {
    start: Point2<f64>,
    end: Point2<f64>,
    /// Descends from a segment of a drawn loop.
    in_loop: bool,
}

impl PendingSegment {
    fn piece(&self, start: Point2<f64>, end: Point2<f64>) -> Self {
        Self {
            start,
            end,
            in_loop: self.in_loop,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingSector {
    line: LineKey,
    side: Side,
    data: SectorData,
}

/// Line sides that bounded an invalidated sector.
#[derive(Debug, Default)]
struct SectorRebuild {
    entries: Vec<PendingSector>,
}

impl SectorRebuild {
    fn mark(&mut self, line: LineKey, side: Side, data: &SectorData) {
        if self
            .entries
            .iter()
            .any(|e| e.line == line && e.side == side)
        {
            return;
        }
        self.entries.push(PendingSector {
            line,
            side,
            data: data.clone(),
        });
    }

    /// Moves the marks of `from` onto the pieces that replaced it.
    fn transfer(&mut self, from: LineKey, pieces: &[(LineKey, bool)]) {
        let mut moved = Vec::new();
        self.entries.retain(|e| {
            if e.line == from {
                moved.push((e.side, e.data.clone()));
                false
            } else {
                true
            }
        });
        for (side, data) in moved {
            for &(piece, forward) in pieces {
                let side = if forward { side } else { side.opposite() };
                self.mark(piece, side, &data);
            }
        }
    }
}

#[derive(Debug, Default)]
struct InsertState {
    queue: VecDeque<PendingSegment>,
    rebuild: SectorRebuild,
    created: Vec<LineKey>,
    /// Normalized points of the drawn loop, empty for polylines.
    outline: Vec<Point2<f64>>,
    /// Line sides facing the interior of the drawn loop.
    loop_sides: Vec<(LineKey, Side)>,
    lines_split: usize,
    sectors_created: Vec<SectorKey>,
}

impl InsertState {
    fn enqueue(&mut self, segment: PendingSegment, max: usize) -> Result<()> {
        if self.queue.len() >= max {
            return Err(Error::CapacityExceeded {
                limit: Limit::PendingSegments,
                max,
            });
        }
        self.queue.push_back(segment);
        Ok(())
    }

    /// Replaces every reference to a split line with its pieces.
    fn replace(&mut self, from: LineKey, pieces: &[(LineKey, bool)]) {
        if self.created.contains(&from) {
            let mut created = Vec::with_capacity(self.created.len() + pieces.len());
            for &line in &self.created {
                if line == from {
                    created.extend(pieces.iter().map(|&(piece, _)| piece));
                } else {
                    created.push(line);
                }
            }
            self.created = created;
        }
        let mut sides = Vec::with_capacity(self.loop_sides.len() + pieces.len());
        for &(line, side) in &self.loop_sides {
            if line == from {
                for &(piece, forward) in pieces {
                    sides.push((piece, if forward { side } else { side.opposite() }));
                }
            } else {
                sides.push((line, side));
            }
        }
        self.loop_sides = sides;
    }
}

impl SectorMap {
    /// Draws a polyline, or a closed loop when `is_loop` is set, with
    /// default line and sector data.
    pub fn insert_loop(&mut self, points: &[Point2<f64>], is_loop: bool) -> Result<InsertSummary> {
        self.insert_loop_with(points, is_loop, &LineData::default(), &SectorData::default())
    }

    /// Draws a polyline or loop.
    ///
    /// New lines get a copy of `line_data`. The face enclosed by a new loop
    /// gets `sector_data` unless it already belongs to a sector. Sectors
    /// that are cut by the new lines are re-derived with their own data.
    pub fn insert_loop_with(
        &mut self,
        points: &[Point2<f64>],
        is_loop: bool,
        line_data: &LineData,
        sector_data: &SectorData,
    ) -> Result<InsertSummary> {
        let backup = self.clone();
        match self.run_insertion(points, is_loop, line_data, sector_data) {
            Ok(summary) => {
                debug!(
                    lines = summary.lines_created.len(),
                    splits = summary.lines_split,
                    sectors = summary.sectors_created.len(),
                    "inserted {}",
                    if is_loop { "loop" } else { "polyline" }
                );
                Ok(summary)
            }
            Err(err) => {
                debug!(error = %err, "insertion rolled back");
                *self = backup;
                Err(err)
            }
        }
    }

    fn run_insertion(
        &mut self,
        points: &[Point2<f64>],
        is_loop: bool,
        line_data: &LineData,
        sector_data: &SectorData,
    ) -> Result<InsertSummary> {
        let eps = self.config.epsilon;
        let max_pending = self.config.max_pending_segments;
        let max_steps = self.config.max_insert_steps;
        let points = normalize_points(points, is_loop, eps)?;

        let mut state = InsertState::default();
        if is_loop {
            state.outline = points.clone();
        }
        let n = points.len();
        let count = if is_loop { n } else { n - 1 };
        for i in 0..count {
            state.enqueue(
                PendingSegment {
                    start: points[i],
                    end: points[(i + 1) % n],
                    in_loop: is_loop,
                },
                max_pending,
            )?;
        }

        let mut steps = 0usize;
        while let Some(segment) = state.queue.pop_front() {
            steps += 1;
            if steps > max_steps {
                return Err(Error::CapacityExceeded {
                    limit: Limit::InsertSteps,
                    max: max_steps,
                });
            }
            if points_equal(segment.start, segment.end, eps) {
                continue;
            }
            self.place_segment(&mut state, segment, line_data, max_pending)?;
        }

        // A new chord, filament or nested loop inside a sector changes its face.
        for line in state.created.clone() {
            let Some(segment) = self.line_segment(line) else {
                continue;
            };
            if let Some(sector) = self.sector_at(segment.midpoint()) {
                self.invalidate_sector(&mut state, sector)?;
            }
        }

        for entry in std::mem::take(&mut state.rebuild.entries) {
            let free = self
                .lines
                .get(entry.line)
                .map_or(false, |l| l.sector(entry.side).is_none());
            if !free {
                continue;
            }
            if let Some((sector, true)) = self.make_sector(entry.line, entry.side, entry.data)? {
                state.sectors_created.push(sector);
            }
        }

        if is_loop {
            for (line, side) in state.loop_sides.clone() {
                let free = self
                    .lines
                    .get(line)
                    .map_or(false, |l| l.sector(side).is_none());
                if !free {
                    continue;
                }
                if let Some((sector, true)) = self.make_sector(line, side, sector_data.clone())? {
                    state.sectors_created.push(sector);
                }
            }
        }

        let pruned = self.prune_orphan_vertices();
        if pruned > 0 {
            trace!(pruned, "pruned orphan vertices");
        }

        Ok(InsertSummary {
            lines_created: state
                .created
                .into_iter()
                .filter(|&l| self.lines.contains_key(l))
                .collect(),
            lines_split: state.lines_split,
            sectors_created: state
                .sectors_created
                .into_iter()
                .filter(|&s| self.sectors.contains_key(s))
                .collect(),
        })
    }

    /// Resolves one queued segment against the first existing line it
    /// relates to.
    fn place_segment(
        &mut self,
        state: &mut InsertState,
        segment: PendingSegment,
        line_data: &LineData,
        max_pending: usize,
    ) -> Result<()> {
        let eps = self.config.epsilon;
        let candidate = Segment::new(segment.start, segment.end);
        let hit = self.line_order.iter().find_map(|&key| {
            let existing = self.line_segment(key)?;
            match classify(existing, candidate, eps) {
                Relation::None => None,
                relation => Some((key, relation)),
            }
        });

        let Some((key, relation)) = hit else {
            return self.commit_segment(state, segment, line_data);
        };
        trace!(?relation, "segment meets existing line");

        match relation {
            Relation::None => self.commit_segment(state, segment, line_data)?,
            Relation::Identical => self.claim_overlap(state, segment, segment.start, segment.end),
            Relation::Cross { point } => {
                self.split_line(state, key, &[point])?;
                state.enqueue(segment.piece(segment.start, point), max_pending)?;
                state.enqueue(segment.piece(point, segment.end), max_pending)?;
            }
            Relation::Touch { point } => {
                self.split_line(state, key, &[point])?;
                state.enqueue(segment, max_pending)?;
            }
            Relation::TouchReverse { point } => {
                state.enqueue(segment.piece(segment.start, point), max_pending)?;
                state.enqueue(segment.piece(point, segment.end), max_pending)?;
            }
            Relation::CollinearOverlap { split, remainder } => {
                self.split_line(state, key, &[split])?;
                let (p, q) = consumed_span(segment, remainder, eps);
                self.claim_overlap(state, segment, p, q);
                state.enqueue(segment.piece(remainder.start, remainder.end), max_pending)?;
            }
            Relation::InnerOverlap { split } => {
                self.split_line(state, key, &[split])?;
                self.claim_overlap(state, segment, segment.start, segment.end);
            }
            Relation::InnerContainment { splits } => {
                self.split_line(state, key, &splits)?;
                self.claim_overlap(state, segment, segment.start, segment.end);
            }
            Relation::OuterOverlap { remainder } => {
                let (p, q) = consumed_span(segment, remainder, eps);
                self.claim_overlap(state, segment, p, q);
                state.enqueue(segment.piece(remainder.start, remainder.end), max_pending)?;
            }
            Relation::OuterContainment { remainders } => {
                self.claim_overlap(state, segment, remainders[0].end, remainders[1].start);
                for r in remainders {
                    state.enqueue(segment.piece(r.start, r.end), max_pending)?;
                }
            }
        }
        Ok(())
    }

    fn commit_segment(
        &mut self,
        state: &mut InsertState,
        segment: PendingSegment,
        line_data: &LineData,
    ) -> Result<()> {
        let (v0, _) = self.create_vertex(segment.start);
        let (v1, _) = self.create_vertex(segment.end);
        if v0 == v1 {
            return Ok(());
        }
        let (line, created) = self.create_line(v0, v1, line_data.clone())?;
        if created {
            state.created.push(line);
        }
        if segment.in_loop {
            self.record_loop_side(state, line, v0, segment.start, segment.end);
        }
        Ok(())
    }

    /// Records the side of an existing line that a loop segment runs along
    /// from `p` to `q`.
    fn claim_overlap(
        &self,
        state: &mut InsertState,
        segment: PendingSegment,
        p: Point2<f64>,
        q: Point2<f64>,
    ) {
        if !segment.in_loop {
            return;
        }
        let (Some(u), Some(v)) = (self.vertex_at(p), self.vertex_at(q)) else {
            return;
        };
        let Some(line) = self.line_between(u, v) else {
            return;
        };
        self.record_loop_side(state, line, u, p, q);
    }

    /// Records the side of `line`, walked from vertex `from` at `p` to `q`,
    /// that faces the inside of the drawn loop.
    fn record_loop_side(
        &self,
        state: &mut InsertState,
        line: LineKey,
        from: VertexKey,
        p: Point2<f64>,
        q: Point2<f64>,
    ) {
        let forward = self.lines.get(line).map_or(true, |l| l.a == from);
        let left = Side::from_forward(forward);
        let side = if faces_left(&state.outline, p, q, self.config.epsilon) {
            left
        } else {
            left.opposite()
        };
        if !state.loop_sides.contains(&(line, side)) {
            state.loop_sides.push((line, side));
        }
    }

    /// Replaces `key` with a chain of pieces through `points`.
    ///
    /// Sectors using the line are invalidated first and every piece gets a
    /// copy of the line's data.
    fn split_line(
        &mut self,
        state: &mut InsertState,
        key: LineKey,
        points: &[Point2<f64>],
    ) -> Result<Vec<LineKey>> {
        let line = self.lines.get(key).ok_or(Error::LineNotFound(key))?.clone();
        let segment = self.line_segment(key).ok_or(Error::LineNotFound(key))?;

        let mut cuts: Vec<(f64, Point2<f64>)> = points
            .iter()
            .map(|&p| (project_param(p, segment.start, segment.end), p))
            .collect();
        cuts.sort_by(|x, y| x.0.total_cmp(&y.0));

        for sector in self.sectors_using_line(key) {
            self.invalidate_sector(state, sector)?;
        }
        self.detach_line(key)?;

        let mut chain = vec![line.a];
        for (_, p) in cuts {
            let (v, _) = self.create_vertex(p);
            if chain.last() != Some(&v) && v != line.b {
                chain.push(v);
            }
        }
        chain.push(line.b);

        let mut pieces = Vec::with_capacity(chain.len() - 1);
        for pair in chain.windows(2) {
            let (piece, _) = self.create_line(pair[0], pair[1], line.data.clone())?;
            let forward = self.lines.get(piece).map_or(true, |l| l.a == pair[0]);
            pieces.push((piece, forward));
        }

        state.rebuild.transfer(key, &pieces);
        state.replace(key, &pieces);
        state.lines_split += 1;
        trace!(id = line.id, pieces = pieces.len(), "split line");
        Ok(pieces.into_iter().map(|(piece, _)| piece).collect())
    }

    /// Removes a sector and marks every side it occupied for rebuilding.
    fn invalidate_sector(&mut self, state: &mut InsertState, key: SectorKey) -> Result<()> {
        let sector = self.sectors.get(key).ok_or(Error::SectorNotFound(key))?;
        let data = sector.data.clone();
        let sides: Vec<(LineKey, Side)> = sector
            .loops()
            .flat_map(BoundaryLoop::iter)
            .map(|(line, forward)| (line, Side::from_forward(forward)))
            .collect();
        self.remove_sector(key)?;
        for (line, side) in sides {
            state.rebuild.mark(line, side, &data);
        }
        Ok(())
    }
}

/// The part of `segment` that runs along an existing line, given the part
/// that lies beyond it.
fn consumed_span(segment: PendingSegment, remainder: Segment, eps: f64) -> (Point2<f64>, Point2<f64>) {
    if points_equal(remainder.start, segment.start, eps) {
        (remainder.end, segment.end)
    } else {
        (segment.start, remainder.start)
    }
}

/// Returns `true` unless only the right of the walk `p → q` lies inside
/// `outline`. Samples are taken just off the midpoint on both sides.
fn faces_left(outline: &[Point2<f64>], p: Point2<f64>, q: Point2<f64>, eps: f64) -> bool {
    let d = q - p;
    let len = d.norm();
    if outline.len() < 3 || len == 0.0 {
        return true;
    }
    let offset = (2.0 * eps).min(0.25 * len);
    let normal = Vector2::new(-d.y, d.x) * (offset / len);
    let mid = nalgebra::center(&p, &q);
    point_in_polygon(outline, mid + normal) || !point_in_polygon(outline, mid - normal)
}

/// Drops repeated points and orients loops counter-clockwise.
fn normalize_points(points: &[Point2<f64>], is_loop: bool, eps: f64) -> Result<Vec<Point2<f64>>> {
    let mut out: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().map_or(true, |&q| !points_equal(p, q, eps)) {
            out.push(p);
        }
    }
    if is_loop {
        while out.len() > 1 && points_equal(out[0], out[out.len() - 1], eps) {
            out.pop();
        }
    }

    let required = if is_loop { 3 } else { 2 };
    if out.len() < required {
        return Err(Error::DegenerateInput {
            required,
            found: out.len(),
        });
    }

    if is_loop {
        let area = signed_area(&out);
        if area.abs() <= eps * eps {
            return Err(Error::ZeroAreaLoop);
        }
        if area < 0.0 {
            out.reverse();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use approx::assert_relative_eq;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2<f64>> {
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }

    fn square() -> Vec<Point2<f64>> {
        pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    #[test]
    fn normalize_drops_duplicates_and_closing_point() {
        let raw = pts(&[(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let out = normalize_points(&raw, true, 1e-6).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn normalize_reverses_clockwise_loop() {
        let raw = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let out = normalize_points(&raw, true, 1e-6).unwrap();
        assert!(signed_area(&out) > 0.0);
    }

    #[test]
    fn normalize_rejects_degenerate_input() {
        assert!(matches!(
            normalize_points(&pts(&[(0.0, 0.0), (0.0, 0.0)]), false, 1e-6),
            Err(Error::DegenerateInput {
                required: 2,
                found: 1
            })
        ));
        assert!(matches!(
            normalize_points(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), true, 1e-6),
            Err(Error::ZeroAreaLoop)
        ));
    }

    #[test]
    fn interior_side_follows_the_outline() {
        let outline = square();
        let (a, b) = (Point2::new(0.0, 0.0), Point2::new(10.0, 0.0));
        assert!(faces_left(&outline, a, b, 1e-4));
        assert!(!faces_left(&outline, b, a, 1e-4));
        assert!(faces_left(&[], b, a, 1e-4));
    }

    #[test]
    fn square_loop_creates_one_sector() {
        let mut map = SectorMap::new();
        let summary = map.insert_loop(&square(), true).unwrap();

        assert_eq!(map.vertex_count(), 4);
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.sector_count(), 1);
        assert_eq!(summary.lines_created.len(), 4);
        assert_eq!(summary.sectors_created.len(), 1);
        for (_, line) in map.lines() {
            assert!(line.front.is_some());
            assert!(line.back.is_none());
        }
    }

    #[test]
    fn clockwise_input_still_has_front_sector() {
        let mut map = SectorMap::new();
        let mut points = square();
        points.reverse();
        map.insert_loop(&points, true).unwrap();
        assert_eq!(map.sector_count(), 1);
        let (key, _) = map.sectors().next().unwrap();
        assert_relative_eq!(map.sector_area(key).unwrap(), 100.0);
    }

    #[test]
    fn polyline_tail_is_not_a_sector() {
        let mut map = SectorMap::new();
        map.insert_loop(&pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]), false)
            .unwrap();
        assert_eq!(map.line_count(), 2);
        assert_eq!(map.sector_count(), 0);
    }

    #[test]
    fn crossing_segment_splits_sector() {
        let mut map = SectorMap::new();
        let data = SectorData {
            floor_height: 24.0,
            ..SectorData::default()
        };
        map.insert_loop_with(&square(), true, &LineData::default(), &data)
            .unwrap();

        let summary = map
            .insert_loop(&pts(&[(5.0, -5.0), (5.0, 15.0)]), false)
            .unwrap();

        assert_eq!(summary.lines_split, 2);
        assert_eq!(map.sector_count(), 2);
        assert_eq!(map.line_count(), 9);
        assert_eq!(map.vertex_count(), 8);
        for (key, sector) in map.sectors() {
            assert_relative_eq!(map.sector_area(key).unwrap(), 50.0);
            assert_eq!(sector.data, data);
        }
    }

    #[test]
    fn overlapping_loop_is_idempotent() {
        let mut map = SectorMap::new();
        map.insert_loop(&square(), true).unwrap();
        let summary = map.insert_loop(&square(), true).unwrap();

        assert!(summary.lines_created.is_empty());
        assert!(summary.sectors_created.is_empty());
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.sector_count(), 1);
    }

    #[test]
    fn collinear_extension_splits_existing_line() {
        let mut map = SectorMap::new();
        map.insert_loop(&pts(&[(0.0, 0.0), (10.0, 0.0)]), false).unwrap();
        let summary = map
            .insert_loop(&pts(&[(5.0, 0.0), (15.0, 0.0)]), false)
            .unwrap();

        assert_eq!(summary.lines_split, 1);
        assert_eq!(map.line_count(), 3);
        assert_eq!(map.vertex_count(), 4);
    }

    #[test]
    fn failed_insertion_rolls_back() {
        let config = MapConfig {
            max_vertex_lines: 2,
            ..MapConfig::default()
        };
        let mut map = SectorMap::with_config(config);
        map.insert_loop(&square(), true).unwrap();
        map.mark_clean();

        let err = map
            .insert_loop(&pts(&[(0.0, 0.0), (10.0, 10.0)]), false)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                limit: Limit::VertexLines,
                ..
            }
        ));
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.sector_count(), 1);
        assert!(!map.is_dirty());
    }

    #[test]
    fn pending_queue_ceiling_is_reported() {
        let config = MapConfig {
            max_pending_segments: 2,
            ..MapConfig::default()
        };
        let mut map = SectorMap::with_config(config);
        let err = map.insert_loop(&square(), true).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                limit: Limit::PendingSegments,
                max: 2
            }
        ));
        assert_eq!(map.vertex_count(), 0);
    }
}
