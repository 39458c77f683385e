// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User data carried by lines and sectors.
//!
//! The engine never interprets these values. It clones them whenever a line
//! is split or a sector is re-derived, so every new entity owns its copy.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A typed value stored in a dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DictValue {
    Int(i64),
    Double(f64),
    String(String),
    List(Vec<DictValue>),
}

/// A typed key-value map for editor-specific properties.
pub type Dictionary = FxHashMap<String, DictValue>;

/// Wall data attached to a line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineData {
    /// Editor-defined line type tag.
    pub kind: u16,
    pub front_texture: Option<String>,
    pub back_texture: Option<String>,
    #[serde(default, skip_serializing_if = "Dictionary::is_empty")]
    pub properties: Dictionary,
}

/// Floor and ceiling data attached to a sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    pub floor_height: f64,
    pub ceiling_height: f64,
    pub floor_texture: Option<String>,
    pub ceiling_texture: Option<String>,
    #[serde(default, skip_serializing_if = "Dictionary::is_empty")]
    pub properties: Dictionary,
}

impl Default for SectorData {
    fn default() -> Self {
        Self {
            floor_height: 0.0,
            ceiling_height: 128.0,
            floor_texture: None,
            ceiling_texture: None,
            properties: Dictionary::default(),
        }
    }
}
