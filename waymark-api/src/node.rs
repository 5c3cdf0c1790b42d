//! Node request resolution.

use waymark_core::{ElementKind, Osm, OsmStore, VersionRef};

use crate::refs::ElementRefs;
use crate::{ApiError, Engine};

impl<S: OsmStore> Engine<S> {
    /// Current version of a single node.
    pub fn node(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.require_visible(ElementKind::Node, id)?;
        let mut doc = Osm::new();
        doc.nodes = self.store().nodes_by_ids(&ids)?;
        Ok(doc)
    }

    /// One historical version of a node.
    ///
    /// Tombstone versions are valid history and are returned as stored;
    /// there is no visibility short-circuit on this path.
    pub fn node_version(&self, id: i64, version: i64) -> Result<Osm, ApiError> {
        let rows = self
            .store()
            .historical_nodes(&[VersionRef::new(id, version)])?;
        if rows.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.nodes = rows;
        Ok(doc)
    }

    /// Every version of a node, ascending, tombstones included.
    pub fn node_history(&self, id: i64) -> Result<Osm, ApiError> {
        let versions = self.store().history(ElementKind::Node, id)?;
        if versions.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.nodes = self.store().historical_nodes(&versions)?;
        Ok(doc)
    }

    /// Batch lookup over a mixed current/versioned reference list.
    ///
    /// All-or-nothing: the row count must match the distinct token count
    /// exactly, otherwise the whole request is `NotFound`. Invisible nodes
    /// are still listed but have their coordinates withheld.
    pub fn nodes(&self, refs: &ElementRefs) -> Result<Osm, ApiError> {
        let mut rows = self.store().nodes_by_ids(&refs.current)?;
        rows.extend(self.store().historical_nodes(&refs.versioned)?);
        if rows.len() != refs.len() {
            return Err(ApiError::NotFound);
        }
        for node in &mut rows {
            node.redact_location();
        }
        let mut doc = Osm::new();
        doc.nodes = rows;
        Ok(doc)
    }

    /// The visible ways whose node list references the given node.
    pub fn node_ways(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.store().resolve_ids(ElementKind::Node, &[id])?;
        if ids.is_empty() {
            return Err(ApiError::NotFound);
        }
        let way_ids = self.store().ways_referencing_nodes(&ids)?;
        if way_ids.is_empty() {
            return Err(ApiError::NotFound);
        }
        for way_id in &way_ids {
            match self.store().is_visible(ElementKind::Way, *way_id)? {
                Some(true) => {}
                Some(false) => return Err(ApiError::Gone),
                None => return Err(ApiError::NotFound),
            }
        }
        let mut doc = Osm::new();
        doc.ways = self.store().ways_by_ids(&way_ids)?;
        Ok(doc)
    }
}
