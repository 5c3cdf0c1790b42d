//! Relation: an ordered grouping of heterogeneous members.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tag::Tags;

/// The kind of element a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    /// The member is a node.
    Node,
    /// The member is a way.
    Way,
    /// The member is another relation.
    Relation,
}

impl MemberType {
    /// Wire-format name of the member type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a relation's ordered member list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Kind of the referenced element.
    #[serde(rename = "type")]
    pub member_type: MemberType,
    /// Identifier of the referenced element.
    #[serde(rename = "ref")]
    pub ref_id: i64,
    /// Role the member plays within the relation.
    pub role: String,
}

impl Member {
    /// Build a member entry.
    pub fn new(member_type: MemberType, ref_id: i64, role: impl Into<String>) -> Self {
        Self {
            member_type,
            ref_id,
            role: role.into(),
        }
    }
}

/// A versioned grouping of members.
///
/// Member order defines presentation order and is preserved for serving;
/// it is normalised only inside cloned documents during equality
/// comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// Element identifier.
    pub id: i64,
    /// Whether this version of the relation is visible.
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
    /// Tag list in as-stored order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Tags,
    /// Ordered member list.
    pub members: Vec<Member>,
}
