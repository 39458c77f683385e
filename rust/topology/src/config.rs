// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Map tolerances and capacity ceilings.

use serde::{Deserialize, Serialize};

/// Tolerances and fixed capacity ceilings for a [`SectorMap`](crate::SectorMap).
///
/// Every ceiling is enforced as a reported [`Error::CapacityExceeded`]
/// failure of the enclosing operation.
///
/// [`Error::CapacityExceeded`]: crate::Error::CapacityExceeded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Coordinate tolerance for vertex equality, touches and collinearity.
    pub epsilon: f64,
    /// Maximum number of lines attached to one vertex.
    pub max_vertex_lines: usize,
    /// Maximum number of lines in one boundary loop or one sector.
    pub max_sector_lines: usize,
    /// Maximum candidate pops during one face trace.
    pub max_search_steps: usize,
    /// Maximum length of the insertion work queue.
    pub max_pending_segments: usize,
    /// Maximum queue pops during one insertion.
    pub max_insert_steps: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            max_vertex_lines: 256,
            max_sector_lines: 4096,
            max_search_steps: 65_536,
            max_pending_segments: 4096,
            max_insert_steps: 65_536,
        }
    }
}

impl MapConfig {
    /// Load configuration from `SECTORMAP_*` environment variables.
    ///
    /// Missing or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            epsilon: env_or("SECTORMAP_EPSILON", defaults.epsilon),
            max_vertex_lines: env_or("SECTORMAP_MAX_VERTEX_LINES", defaults.max_vertex_lines),
            max_sector_lines: env_or("SECTORMAP_MAX_SECTOR_LINES", defaults.max_sector_lines),
            max_search_steps: env_or("SECTORMAP_MAX_SEARCH_STEPS", defaults.max_search_steps),
            max_pending_segments: env_or(
                "SECTORMAP_MAX_PENDING_SEGMENTS",
                defaults.max_pending_segments,
            ),
            max_insert_steps: env_or("SECTORMAP_MAX_INSERT_STEPS", defaults.max_insert_steps),
        }
    }

    /// Returns a copy with a different coordinate tolerance.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
