//! Relation request resolution, including one-hop full expansion.

use std::collections::BTreeSet;

use waymark_core::{ElementKind, Osm, OsmStore, VersionRef};

use crate::refs::ElementRefs;
use crate::{ApiError, Engine};

impl<S: OsmStore> Engine<S> {
    /// Current version of a single relation.
    pub fn relation(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.require_visible(ElementKind::Relation, id)?;
        let mut doc = Osm::new();
        doc.relations = self.store().relations_by_ids(&ids)?;
        Ok(doc)
    }

    /// One historical version of a relation, tombstones included.
    pub fn relation_version(&self, id: i64, version: i64) -> Result<Osm, ApiError> {
        let rows = self
            .store()
            .historical_relations(&[VersionRef::new(id, version)])?;
        if rows.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.relations = rows;
        Ok(doc)
    }

    /// Every version of a relation, ascending.
    pub fn relation_history(&self, id: i64) -> Result<Osm, ApiError> {
        let versions = self.store().history(ElementKind::Relation, id)?;
        if versions.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.relations = self.store().historical_relations(&versions)?;
        Ok(doc)
    }

    /// Batch lookup over a mixed current/versioned reference list, with
    /// the same all-or-nothing completeness rule as node batches.
    pub fn relations(&self, refs: &ElementRefs) -> Result<Osm, ApiError> {
        let mut rows = self.store().relations_by_ids(&refs.current)?;
        rows.extend(self.store().historical_relations(&refs.versioned)?);
        if rows.len() != refs.len() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.relations = rows;
        Ok(doc)
    }

    /// A relation with its members expanded exactly one hop.
    ///
    /// Member nodes and ways are included, the nodes of member ways are
    /// included, and member relations are included as rows without
    /// expanding their own members. Every id participates at most once,
    /// however many member entries point at it.
    pub fn relation_full(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.require_visible(ElementKind::Relation, id)?;

        let way_ids = self.store().relation_members(ElementKind::Way, &ids)?;
        let mut node_ids: BTreeSet<i64> = self
            .store()
            .relation_members(ElementKind::Node, &ids)?
            .into_iter()
            .collect();
        node_ids.extend(self.store().nodes_referenced_by_ways(&way_ids)?);

        let mut relation_ids: BTreeSet<i64> = ids.iter().copied().collect();
        relation_ids.extend(self.store().relation_members(ElementKind::Relation, &ids)?);

        let node_ids: Vec<i64> = node_ids.into_iter().collect();
        let relation_ids: Vec<i64> = relation_ids.into_iter().collect();

        let mut doc = Osm::new();
        doc.nodes = self.store().nodes_by_ids(&node_ids)?;
        doc.ways = self.store().ways_by_ids(&way_ids)?;
        doc.relations = self.store().relations_by_ids(&relation_ids)?;
        Ok(doc)
    }
}
