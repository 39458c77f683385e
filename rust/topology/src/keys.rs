// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for arena-based storage.
//!
//! Keys are created by `slotmap::SlotMap` and remain valid even after other
//! entities are removed (generational indices). A removed entity's key never
//! resolves again, so stale keys held by a UI are detected instead of
//! aliasing a newer entity.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a vertex (point in the map plane).
    pub struct VertexKey;

    /// Key for a line (straight segment between two vertices).
    pub struct LineKey;

    /// Key for a sector (polygonal face bounded by lines).
    pub struct SectorKey;
}

/// One side of a line.
///
/// `Front` is the left of the directed segment `a → b`, `Back` its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Returns the other side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }

    /// The side that lies on the left of a walk along a line.
    ///
    /// A line walked `a → b` (`forward`) has its front on the left.
    pub fn from_forward(forward: bool) -> Side {
        if forward {
            Side::Front
        } else {
            Side::Back
        }
    }

    /// Returns the side name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::Back => "back",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        assert_eq!(Side::Front.opposite(), Side::Back);
        assert_eq!(Side::Back.opposite(), Side::Front);
        assert_eq!(Side::Front.opposite().opposite(), Side::Front);
    }

    #[test]
    fn forward_walk_keeps_front_on_left() {
        assert_eq!(Side::from_forward(true), Side::Front);
        assert_eq!(Side::from_forward(false), Side::Back);
    }

    #[test]
    fn side_names() {
        assert_eq!(Side::Front.to_string(), "front");
        assert_eq!(Side::Back.as_str(), "back");
    }
}
