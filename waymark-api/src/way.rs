//! Way request resolution.

use waymark_core::{ElementKind, Osm, OsmStore, VersionRef};

use crate::refs::ElementRefs;
use crate::{ApiError, Engine};

impl<S: OsmStore> Engine<S> {
    /// Current version of a single way.
    pub fn way(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.require_visible(ElementKind::Way, id)?;
        let mut doc = Osm::new();
        doc.ways = self.store().ways_by_ids(&ids)?;
        Ok(doc)
    }

    /// One historical version of a way, tombstones included.
    pub fn way_version(&self, id: i64, version: i64) -> Result<Osm, ApiError> {
        let rows = self
            .store()
            .historical_ways(&[VersionRef::new(id, version)])?;
        if rows.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.ways = rows;
        Ok(doc)
    }

    /// Every version of a way, ascending.
    pub fn way_history(&self, id: i64) -> Result<Osm, ApiError> {
        let versions = self.store().history(ElementKind::Way, id)?;
        if versions.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.ways = self.store().historical_ways(&versions)?;
        Ok(doc)
    }

    /// Batch lookup over a mixed current/versioned reference list, with
    /// the same all-or-nothing completeness rule as node batches.
    pub fn ways(&self, refs: &ElementRefs) -> Result<Osm, ApiError> {
        let mut rows = self.store().ways_by_ids(&refs.current)?;
        rows.extend(self.store().historical_ways(&refs.versioned)?);
        if rows.len() != refs.len() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.ways = rows;
        Ok(doc)
    }

    /// A way together with every node it references.
    pub fn way_full(&self, id: i64) -> Result<Osm, ApiError> {
        let ids = self.require_visible(ElementKind::Way, id)?;
        let mut doc = Osm::new();
        doc.ways = self.store().ways_by_ids(&ids)?;
        let node_ids = self.store().nodes_referenced_by_ways(&ids)?;
        doc.nodes = self.store().nodes_by_ids(&node_ids)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{node, tombstone_way, way};
    use rstest::rstest;
    use waymark_core::test_support::MemoryStore;

    #[rstest]
    fn returns_single_visible_way() {
        let store = MemoryStore::new().with_ways([way(3004, vec![10, 11])]);
        let engine = Engine::new(store);
        let doc = engine.way(3004).expect("resolve way");
        assert_eq!(doc.ways.len(), 1);
        assert_eq!(doc.ways[0].nodes, vec![10, 11]);
        assert!(doc.nodes.is_empty());
    }

    #[rstest]
    fn deleted_way_is_gone() {
        let store = MemoryStore::new().with_ways([tombstone_way(3004)]);
        let engine = Engine::new(store);
        assert!(matches!(engine.way(3004), Err(ApiError::Gone)));
    }

    #[rstest]
    fn full_closure_includes_referenced_nodes() {
        let store = MemoryStore::new()
            .with_nodes([node(10, 1), node(11, 1), node(99, 1)])
            .with_ways([way(3004, vec![11, 10])]);
        let engine = Engine::new(store);
        let doc = engine.way_full(3004).expect("full");
        assert_eq!(doc.ways.len(), 1);
        // Membership in the document is id-ordered; the way itself keeps
        // its own node sequence.
        let node_ids: Vec<i64> = doc.nodes.iter().map(|n| n.id).collect();
        assert_eq!(node_ids, vec![10, 11]);
        assert_eq!(doc.ways[0].nodes, vec![11, 10]);
    }

    #[rstest]
    fn full_closure_of_unknown_way_is_not_found() {
        let engine = Engine::new(MemoryStore::new());
        assert!(matches!(engine.way_full(3004), Err(ApiError::NotFound)));
    }

    #[rstest]
    fn history_and_versioned_reads_cover_tombstones() {
        let mut deleted = way(3004, Vec::new());
        deleted.version = 2;
        deleted.visible = false;
        let store =
            MemoryStore::new().with_historical_ways([way(3004, vec![10, 11]), deleted]);
        let engine = Engine::new(store);

        let history = engine.way_history(3004).expect("history");
        assert_eq!(history.ways.len(), 2);
        assert!(!history.ways[1].visible);

        let v2 = engine.way_version(3004, 2).expect("versioned get");
        assert!(!v2.ways[0].visible);
    }

    #[rstest]
    fn batch_requires_every_token_to_resolve() {
        let store = MemoryStore::new().with_ways([way(3004, vec![10])]);
        let engine = Engine::new(store);
        let refs: ElementRefs = "3004,3005".parse().expect("parse");
        assert!(matches!(engine.ways(&refs), Err(ApiError::NotFound)));

        let refs: ElementRefs = "3004".parse().expect("parse");
        let doc = engine.ways(&refs).expect("batch");
        assert_eq!(doc.ways.len(), 1);
    }
}
