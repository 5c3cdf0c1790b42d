//! Node: a single located point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tags;

/// A versioned point with optional coordinates.
///
/// `lat`/`lon` are absent when the node has been redacted for output:
/// invisible nodes served through the batch path must not leak their last
/// stored position. User attribution is absent when the owning account has
/// opted out of public attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Element identifier.
    pub id: i64,
    /// Latitude in decimal degrees, if served.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lat: Option<f64>,
    /// Longitude in decimal degrees, if served.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub lon: Option<f64>,
    /// Display name of the editing user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
    /// Identifier of the editing user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<i64>,
    /// Whether this version of the node is visible.
    pub visible: bool,
    /// Version number, starting at 1.
    pub version: i64,
    /// Changeset that produced this version.
    pub changeset: i64,
    /// When this version was created.
    #[serde(with = "crate::time::ts_format")]
    pub timestamp: DateTime<Utc>,
    /// Tag list in as-stored order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Tags,
}

impl Node {
    /// Withhold coordinates when the node is not visible.
    ///
    /// Historical tombstone rows retain their stored coordinates for the
    /// history endpoints; the batch path calls this before assembly.
    pub fn redact_location(&mut self) {
        if !self.visible {
            self.lat = None;
            self.lon = None;
        }
    }
}
