//! Read-only query contract between the resolution engine and a backing
//! store.
//!
//! The engine never builds SQL; it resolves identifiers, checks
//! visibility and extracts rows exclusively through [`OsmStore`]. A store
//! handle is passed into the engine explicitly, so implementations decide
//! how connections are pooled and shared. Every failure surfaces as an
//! opaque [`StoreError`]; classification of infrastructure faults is not
//! the engine's concern and no query is retried.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bbox::ScaledBbox;
use crate::changeset::Changeset;
use crate::node::Node;
use crate::relation::Relation;
use crate::way::Way;

/// The three element kinds resolvable by identifier.
///
/// Identifier namespaces are separate per kind: node 5 and way 5 are
/// unrelated elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Point elements.
    Node,
    /// Polyline elements.
    Way,
    /// Grouping elements.
    Relation,
}

impl ElementKind {
    /// Lowercase wire name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one historical snapshot of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionRef {
    /// Element identifier.
    pub id: i64,
    /// Version number of the snapshot.
    pub version: i64,
}

impl VersionRef {
    /// Build a reference to `id` at `version`.
    pub const fn new(id: i64, version: i64) -> Self {
        Self { id, version }
    }
}

/// Opaque infrastructure failure raised by a store backend.
///
/// Deliberately unstructured: the resolution engine treats every backend
/// fault identically, aborting the request without retry.
#[derive(Debug)]
pub struct StoreError {
    source: Box<dyn Error + Send + Sync + 'static>,
}

impl StoreError {
    /// Wrap a backend failure.
    pub fn new(source: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store query failed: {}", self.source)
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Read-only access to current and historical element rows.
///
/// Contract notes shared by all implementations:
/// - extraction methods return rows ordered by id ascending (historical
///   variants by `(id, version)`), and that order is served verbatim;
/// - extraction joins user attribution and yields `None` user fields when
///   the owning account has opted out of public attribution;
/// - derived-reference queries return de-duplicated id sets whose order is
///   not significant, since consumers re-sort;
/// - implementations must be safe for concurrent use from multiple
///   requests (acquire-per-query or internally synchronised).
pub trait OsmStore {
    /// Filter `ids` down to those with a current row of the given kind.
    fn resolve_ids(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>, StoreError>;

    /// Current visibility of one element; `None` when the id is unknown.
    fn is_visible(&self, kind: ElementKind, id: i64) -> Result<Option<bool>, StoreError>;

    /// All versions of one element, ascending. Empty when the id is unknown.
    fn history(&self, kind: ElementKind, id: i64) -> Result<Vec<VersionRef>, StoreError>;

    /// Extract current node rows, ordered by id.
    fn nodes_by_ids(&self, ids: &[i64]) -> Result<Vec<Node>, StoreError>;

    /// Extract current way rows, ordered by id.
    fn ways_by_ids(&self, ids: &[i64]) -> Result<Vec<Way>, StoreError>;

    /// Extract current relation rows, ordered by id.
    fn relations_by_ids(&self, ids: &[i64]) -> Result<Vec<Relation>, StoreError>;

    /// Extract historical node snapshots, ordered by `(id, version)`.
    fn historical_nodes(&self, refs: &[VersionRef]) -> Result<Vec<Node>, StoreError>;

    /// Extract historical way snapshots, ordered by `(id, version)`.
    fn historical_ways(&self, refs: &[VersionRef]) -> Result<Vec<Way>, StoreError>;

    /// Extract historical relation snapshots, ordered by `(id, version)`.
    fn historical_relations(&self, refs: &[VersionRef]) -> Result<Vec<Relation>, StoreError>;

    /// Ids of ways whose node list references any of `node_ids`.
    fn ways_referencing_nodes(&self, node_ids: &[i64]) -> Result<Vec<i64>, StoreError>;

    /// Ids of nodes referenced by any of `way_ids`.
    fn nodes_referenced_by_ways(&self, way_ids: &[i64]) -> Result<Vec<i64>, StoreError>;

    /// Ids of direct members of the given kind across `relation_ids`.
    fn relation_members(
        &self,
        kind: ElementKind,
        relation_ids: &[i64],
    ) -> Result<Vec<i64>, StoreError>;

    /// Ids of relations holding a member of the given kind in `ids`.
    fn relations_referencing(
        &self,
        kind: ElementKind,
        ids: &[i64],
    ) -> Result<Vec<i64>, StoreError>;

    /// Ids of visible nodes inside the box, at most `limit` of them.
    fn node_ids_in_bbox(&self, bbox: &ScaledBbox, limit: usize) -> Result<Vec<i64>, StoreError>;

    /// Filter `ids` down to existing changesets.
    fn resolve_changesets(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError>;

    /// Extract changeset rows, ordered by id, with the discussion thread
    /// attached only when `include_discussion` is set.
    fn changesets_by_ids(
        &self,
        ids: &[i64],
        include_discussion: bool,
    ) -> Result<Vec<Changeset>, StoreError>;
}
