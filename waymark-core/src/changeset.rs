//! Changeset metadata and its optional discussion thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tags;

/// One comment in a changeset discussion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier of the commenting user.
    pub uid: i64,
    /// Display name of the commenting user.
    pub user: String,
    /// When the comment was posted.
    #[serde(with = "crate::time::ts_format")]
    pub timestamp: DateTime<Utc>,
    /// Comment body.
    pub text: String,
}

/// The ordered comment thread of a changeset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discussion {
    /// Comments in posting order.
    pub comments: Vec<Comment>,
}

/// Metadata describing one set of edits.
///
/// The discussion is populated only when a request explicitly asks for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    /// Changeset identifier.
    pub id: i64,
    /// Display name of the owning user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
    /// Identifier of the owning user, when publicly attributable.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uid: Option<i64>,
    /// When the changeset was opened.
    #[serde(with = "crate::time::ts_format")]
    pub created_at: DateTime<Utc>,
    /// When the changeset was closed.
    #[serde(with = "crate::time::ts_format")]
    pub closed_at: DateTime<Utc>,
    /// Whether the changeset is still open.
    pub open: bool,
    /// Southern edge of the bounding box, decimal degrees.
    pub min_lat: f64,
    /// Northern edge of the bounding box, decimal degrees.
    pub max_lat: f64,
    /// Western edge of the bounding box, decimal degrees.
    pub min_lon: f64,
    /// Eastern edge of the bounding box, decimal degrees.
    pub max_lon: f64,
    /// Number of changes recorded in the changeset.
    pub num_changes: i64,
    /// Number of discussion comments.
    pub comments_count: i64,
    /// Tag list in as-stored order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Tags,
    /// Discussion thread, present only when requested.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub discussion: Option<Discussion>,
}
