//! Key/value tags attached to elements and changesets.

use serde::{Deserialize, Serialize};

/// A single key/value tag.
///
/// Keys are unique within one element's tag list but the list itself is
/// stored in arbitrary order; ordering only matters during
/// canonicalization, where the derived [`Ord`] (key first, then value)
/// supplies the sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// Tag key.
    pub k: String,
    /// Tag value.
    pub v: String,
}

impl Tag {
    /// Build a tag from anything string-like.
    pub fn new(k: impl Into<String>, v: impl Into<String>) -> Self {
        Self {
            k: k.into(),
            v: v.into(),
        }
    }
}

/// An element's tag list, in as-stored order.
pub type Tags = Vec<Tag>;
