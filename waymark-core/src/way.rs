//! Way: an ordered polyline of node references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tags;

/// A versioned polyline.
///
/// The node reference order defines the path and is preserved exactly as
/// stored; it is only ever re-sorted inside cloned documents during
/// equality comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Way {
    /// Element identifier.
    pub id: i64,
    /// Whether this version of the way is visible.
    pub visible: bool,
    /// Version number, starting at 1.
    pub version: i64,
    /// Display name of the editing user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
    /// Identifier of the editing user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<i64>,
    /// Changeset that produced this version.
    pub changeset: i64,
    /// When this version was created.
    #[serde(with = "crate::time::ts_format")]
    pub timestamp: DateTime<Utc>,
    /// Ordered node references forming the path.
    pub nodes: Vec<i64>,
    /// Tag list in as-stored order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Tags,
}
