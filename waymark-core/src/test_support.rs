//! Test-only, in-memory [`OsmStore`] implementation used by unit and
//! integration tests.
//!
//! The store performs linear scans and is intended only for small, seeded
//! datasets. Current and historical rows are held in separate lists; seed
//! the historical list with every version (including the latest) when a
//! test exercises history or versioned lookups.

use std::collections::BTreeSet;

use crate::bbox::{COORDINATE_SCALE, ScaledBbox};
use crate::changeset::Changeset;
use crate::node::Node;
use crate::relation::Relation;
use crate::store::{ElementKind, OsmStore, StoreError, VersionRef};
use crate::way::Way;

/// In-memory store over seeded element rows.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: Vec<Node>,
    ways: Vec<Way>,
    relations: Vec<Relation>,
    historical_nodes: Vec<Node>,
    historical_ways: Vec<Way>,
    historical_relations: Vec<Relation>,
    changesets: Vec<Changeset>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed current node rows.
    #[must_use]
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    /// Seed current way rows.
    #[must_use]
    pub fn with_ways(mut self, ways: impl IntoIterator<Item = Way>) -> Self {
        self.ways.extend(ways);
        self
    }

    /// Seed current relation rows.
    #[must_use]
    pub fn with_relations(mut self, relations: impl IntoIterator<Item = Relation>) -> Self {
        self.relations.extend(relations);
        self
    }

    /// Seed historical node snapshots.
    #[must_use]
    pub fn with_historical_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.historical_nodes.extend(nodes);
        self
    }

    /// Seed historical way snapshots.
    #[must_use]
    pub fn with_historical_ways(mut self, ways: impl IntoIterator<Item = Way>) -> Self {
        self.historical_ways.extend(ways);
        self
    }

    /// Seed historical relation snapshots.
    #[must_use]
    pub fn with_historical_relations(
        mut self,
        relations: impl IntoIterator<Item = Relation>,
    ) -> Self {
        self.historical_relations.extend(relations);
        self
    }

    /// Seed changeset rows.
    #[must_use]
    pub fn with_changesets(mut self, changesets: impl IntoIterator<Item = Changeset>) -> Self {
        self.changesets.extend(changesets);
        self
    }

    fn current_ids(&self, kind: ElementKind) -> Vec<i64> {
        match kind {
            ElementKind::Node => self.nodes.iter().map(|n| n.id).collect(),
            ElementKind::Way => self.ways.iter().map(|w| w.id).collect(),
            ElementKind::Relation => self.relations.iter().map(|r| r.id).collect(),
        }
    }

    fn visibility(&self, kind: ElementKind, id: i64) -> Option<bool> {
        match kind {
            ElementKind::Node => self.nodes.iter().find(|n| n.id == id).map(|n| n.visible),
            ElementKind::Way => self.ways.iter().find(|w| w.id == id).map(|w| w.visible),
            ElementKind::Relation => self
                .relations
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.visible),
        }
    }

    fn member_refs(&self, relation_ids: &[i64]) -> Vec<&Relation> {
        let wanted: BTreeSet<i64> = relation_ids.iter().copied().collect();
        self.relations
            .iter()
            .filter(|r| wanted.contains(&r.id))
            .collect()
    }
}

fn sorted(set: BTreeSet<i64>) -> Vec<i64> {
    set.into_iter().collect()
}

impl OsmStore for MemoryStore {
    fn resolve_ids(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let existing: BTreeSet<i64> = self
            .current_ids(kind)
            .into_iter()
            .filter(|id| wanted.contains(id))
            .collect();
        Ok(sorted(existing))
    }

    fn is_visible(&self, kind: ElementKind, id: i64) -> Result<Option<bool>, StoreError> {
        Ok(self.visibility(kind, id))
    }

    fn history(&self, kind: ElementKind, id: i64) -> Result<Vec<VersionRef>, StoreError> {
        let mut versions: Vec<VersionRef> = match kind {
            ElementKind::Node => self
                .historical_nodes
                .iter()
                .filter(|n| n.id == id)
                .map(|n| VersionRef::new(n.id, n.version))
                .collect(),
            ElementKind::Way => self
                .historical_ways
                .iter()
                .filter(|w| w.id == id)
                .map(|w| VersionRef::new(w.id, w.version))
                .collect(),
            ElementKind::Relation => self
                .historical_relations
                .iter()
                .filter(|r| r.id == id)
                .map(|r| VersionRef::new(r.id, r.version))
                .collect(),
        };
        versions.sort_unstable();
        Ok(versions)
    }

    fn nodes_by_ids(&self, ids: &[i64]) -> Result<Vec<Node>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let mut rows: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| wanted.contains(&n.id))
            .cloned()
            .collect();
        rows.sort_by_key(|n| n.id);
        Ok(rows)
    }

    fn ways_by_ids(&self, ids: &[i64]) -> Result<Vec<Way>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let mut rows: Vec<Way> = self
            .ways
            .iter()
            .filter(|w| wanted.contains(&w.id))
            .cloned()
            .collect();
        rows.sort_by_key(|w| w.id);
        Ok(rows)
    }

    fn relations_by_ids(&self, ids: &[i64]) -> Result<Vec<Relation>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let mut rows: Vec<Relation> = self
            .relations
            .iter()
            .filter(|r| wanted.contains(&r.id))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    fn historical_nodes(&self, refs: &[VersionRef]) -> Result<Vec<Node>, StoreError> {
        let wanted: BTreeSet<VersionRef> = refs.iter().copied().collect();
        let mut rows: Vec<Node> = self
            .historical_nodes
            .iter()
            .filter(|n| wanted.contains(&VersionRef::new(n.id, n.version)))
            .cloned()
            .collect();
        rows.sort_by_key(|n| (n.id, n.version));
        Ok(rows)
    }

    fn historical_ways(&self, refs: &[VersionRef]) -> Result<Vec<Way>, StoreError> {
        let wanted: BTreeSet<VersionRef> = refs.iter().copied().collect();
        let mut rows: Vec<Way> = self
            .historical_ways
            .iter()
            .filter(|w| wanted.contains(&VersionRef::new(w.id, w.version)))
            .cloned()
            .collect();
        rows.sort_by_key(|w| (w.id, w.version));
        Ok(rows)
    }

    fn historical_relations(&self, refs: &[VersionRef]) -> Result<Vec<Relation>, StoreError> {
        let wanted: BTreeSet<VersionRef> = refs.iter().copied().collect();
        let mut rows: Vec<Relation> = self
            .historical_relations
            .iter()
            .filter(|r| wanted.contains(&VersionRef::new(r.id, r.version)))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.id, r.version));
        Ok(rows)
    }

    fn ways_referencing_nodes(&self, node_ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let wanted: BTreeSet<i64> = node_ids.iter().copied().collect();
        let ids: BTreeSet<i64> = self
            .ways
            .iter()
            .filter(|w| w.nodes.iter().any(|id| wanted.contains(id)))
            .map(|w| w.id)
            .collect();
        Ok(sorted(ids))
    }

    fn nodes_referenced_by_ways(&self, way_ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let wanted: BTreeSet<i64> = way_ids.iter().copied().collect();
        let ids: BTreeSet<i64> = self
            .ways
            .iter()
            .filter(|w| wanted.contains(&w.id))
            .flat_map(|w| w.nodes.iter().copied())
            .collect();
        Ok(sorted(ids))
    }

    fn relation_members(
        &self,
        kind: ElementKind,
        relation_ids: &[i64],
    ) -> Result<Vec<i64>, StoreError> {
        let member_kind = member_type_for(kind);
        let ids: BTreeSet<i64> = self
            .member_refs(relation_ids)
            .into_iter()
            .flat_map(|r| r.members.iter())
            .filter(|m| m.member_type == member_kind)
            .map(|m| m.ref_id)
            .collect();
        Ok(sorted(ids))
    }

    fn relations_referencing(
        &self,
        kind: ElementKind,
        ids: &[i64],
    ) -> Result<Vec<i64>, StoreError> {
        let member_kind = member_type_for(kind);
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let parents: BTreeSet<i64> = self
            .relations
            .iter()
            .filter(|r| {
                r.members
                    .iter()
                    .any(|m| m.member_type == member_kind && wanted.contains(&m.ref_id))
            })
            .map(|r| r.id)
            .collect();
        Ok(sorted(parents))
    }

    fn node_ids_in_bbox(&self, bbox: &ScaledBbox, limit: usize) -> Result<Vec<i64>, StoreError> {
        let mut ids: Vec<i64> = self
            .nodes
            .iter()
            .filter(|n| n.visible)
            .filter(|n| {
                let (Some(lat), Some(lon)) = (n.lat, n.lon) else {
                    return false;
                };
                let lat = scale(lat);
                let lon = scale(lon);
                lat >= bbox.min_lat
                    && lat <= bbox.max_lat
                    && lon >= bbox.min_lon
                    && lon <= bbox.max_lon
            })
            .map(|n| n.id)
            .collect();
        ids.sort_unstable();
        ids.truncate(limit);
        Ok(ids)
    }

    fn resolve_changesets(&self, ids: &[i64]) -> Result<Vec<i64>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let existing: BTreeSet<i64> = self
            .changesets
            .iter()
            .map(|c| c.id)
            .filter(|id| wanted.contains(id))
            .collect();
        Ok(sorted(existing))
    }

    fn changesets_by_ids(
        &self,
        ids: &[i64],
        include_discussion: bool,
    ) -> Result<Vec<Changeset>, StoreError> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let mut rows: Vec<Changeset> = self
            .changesets
            .iter()
            .filter(|c| wanted.contains(&c.id))
            .cloned()
            .map(|mut changeset| {
                if !include_discussion {
                    changeset.discussion = None;
                }
                changeset
            })
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }
}

const fn member_type_for(kind: ElementKind) -> crate::relation::MemberType {
    match kind {
        ElementKind::Node => crate::relation::MemberType::Node,
        ElementKind::Way => crate::relation::MemberType::Way,
        ElementKind::Relation => crate::relation::MemberType::Relation,
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "coordinates are bounded to +-180 degrees"
)]
fn scale(degrees: f64) -> i64 {
    (degrees * COORDINATE_SCALE).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn node(id: i64, lat: f64, lon: f64) -> Node {
        Node {
            id,
            lat: Some(lat),
            lon: Some(lon),
            user: None,
            uid: None,
            visible: true,
            version: 1,
            changeset: 1,
            timestamp: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            tags: Vec::new(),
        }
    }

    #[rstest]
    fn resolve_ids_reports_membership() {
        let store = MemoryStore::new().with_nodes([node(1, 0.0, 0.0), node(2, 1.0, 1.0)]);
        let ids = store
            .resolve_ids(ElementKind::Node, &[1, 2, 3])
            .expect("resolve");
        assert_eq!(ids, vec![1, 2]);
    }

    #[rstest]
    fn bbox_query_excludes_invisible_nodes() {
        let mut hidden = node(2, 0.5, 0.5);
        hidden.visible = false;
        let store = MemoryStore::new().with_nodes([node(1, 0.5, 0.5), hidden]);
        let bbox = crate::Bbox::new(0.0, 0.0, 1.0, 1.0).expect("bbox").scaled();
        let ids = store.node_ids_in_bbox(&bbox, 10).expect("query");
        assert_eq!(ids, vec![1]);
    }
}
