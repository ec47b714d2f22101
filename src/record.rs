//! The shared station document.
//!
//! One record per station lives in the yard-wide store; many processes
//! read and write it. This controller cares about four fields and must
//! not disturb the rest — dispatch, RFID bookkeeping, and timing
//! statistics are owned by other writers and round-trip untouched through
//! the `extra` side-map.
//!
//! Ownership split per field:
//! - `in_progress` — written by the dispatch process, read-only here.
//! - `in_place`    — written here (field-scoped update), read by dispatch.
//! - `enabled`     — operator-maintained; read-only here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Store field name for the presence flag (the one field this controller
/// writes).
pub const FIELD_IN_PLACE: &str = "in_place";

/// One station's document in the shared store.
///
/// Unknown fields are captured verbatim in `extra` so that a fetch
/// followed by a write cannot clobber state owned by other processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Store-assigned identity.
    #[serde(rename = "_id", default)]
    pub station_id: i64,

    /// Station name — the lookup key used by every process in the yard.
    #[serde(default)]
    pub name: String,

    /// True while a remote process is performing a pickup/drop-off here.
    #[serde(default)]
    pub in_progress: bool,

    /// True when a rack/cart is detected at the station (our output).
    #[serde(default)]
    pub in_place: bool,

    /// Operator switch: a disabled station keeps sensing but goes dark.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Everything else in the document, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_enabled() -> bool {
    true
}

impl StationRecord {
    /// A fresh record for a station that has never been stored.
    pub fn named(name: &str) -> Self {
        Self {
            station_id: 0,
            name: name.to_string(),
            in_progress: false,
            in_place: false,
            enabled: true,
            extra: Map::new(),
        }
    }
}
