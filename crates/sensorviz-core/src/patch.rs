//! Partial viewable updates emitted once per tick

use serde::{Deserialize, Serialize};

use crate::sensor::Position;
use crate::style::Color;
use crate::viewable::ViewableId;

/// A single-field update to one viewable
///
/// Serializes as an object with exactly one key, e.g. `{"url": "fan-01.svg"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewablePatch {
    /// Swap the sprite image
    Url(String),
    /// Tint the sprite
    Color(Color),
    /// Move the sprite
    Position(Position),
}

/// Patches produced by one tick, keyed by viewable id
pub type PatchBatch = Vec<(ViewableId, ViewablePatch)>;
