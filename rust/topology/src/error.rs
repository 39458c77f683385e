// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for map editing operations.

use crate::keys::{LineKey, SectorKey, VertexKey};

/// Result type alias for map operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A fixed ceiling enforced by the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Limit {
    /// Lines attached to a single vertex.
    VertexLines,
    /// Lines in one boundary loop, or in one sector overall.
    SectorLines,
    /// Candidate pops during a single face trace.
    SearchSteps,
    /// Segments waiting in the insertion work queue.
    PendingSegments,
    /// Queue pops during a single insertion.
    InsertSteps,
}

impl Limit {
    /// Returns the limit name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Limit::VertexLines => "vertex lines",
            Limit::SectorLines => "sector lines",
            Limit::SearchSteps => "search steps",
            Limit::PendingSegments => "pending segments",
            Limit::InsertSteps => "insert steps",
        }
    }
}

impl std::fmt::Display for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while editing a map.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Vertex key not found in the map.
    #[error("vertex not found: {0:?}")]
    VertexNotFound(VertexKey),

    /// Line key not found in the map.
    #[error("line not found: {0:?}")]
    LineNotFound(LineKey),

    /// Sector key not found in the map.
    #[error("sector not found: {0:?}")]
    SectorNotFound(SectorKey),

    /// A fixed capacity was exceeded; the enclosing operation was aborted.
    #[error("capacity exceeded: more than {max} {limit}")]
    CapacityExceeded { limit: Limit, max: usize },

    /// Too few distinct points to form the requested polyline or loop.
    #[error("degenerate input: need {required} distinct points, found {found}")]
    DegenerateInput { required: usize, found: usize },

    /// All points of a loop are collinear.
    #[error("degenerate input: loop encloses no area")]
    ZeroAreaLoop,

    /// A line must connect two distinct vertices.
    #[error("line endpoints are the same vertex")]
    DegenerateLine,

    /// A sector loop must be closed and have at least 3 lines.
    #[error("sector loop is open or has fewer than 3 lines")]
    DegenerateSector,

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
