//! Bounding-box map extraction.

use std::collections::BTreeSet;

use log::debug;
use waymark_core::{Bbox, ElementKind, Osm, OsmStore};

use crate::{ApiError, Engine};

/// Hard cap on nodes directly inside a requested bounding box.
pub const MAX_BBOX_NODES: usize = 50_000;

impl<S: OsmStore> Engine<S> {
    /// Every element relevant to a bounding box.
    ///
    /// Starting from the visible nodes inside the box, the closure pulls
    /// in ways referencing any of those nodes, the remaining nodes of
    /// those ways (outside the box included), relations referencing any
    /// collected node or way, and finally relations referencing those
    /// relations, one hop only. A box holding no nodes, or more than
    /// [`MAX_BBOX_NODES`], resolves to `NotFound`.
    pub fn map(&self, bbox: &Bbox) -> Result<Osm, ApiError> {
        let scaled = bbox.scaled();
        // Fetch one row past the cap so an oversized box is distinguishable
        // from one that is exactly full.
        let seed_ids = self.store().node_ids_in_bbox(&scaled, MAX_BBOX_NODES + 1)?;
        if seed_ids.is_empty() || seed_ids.len() > MAX_BBOX_NODES {
            return Err(ApiError::NotFound);
        }

        let way_ids = self.store().ways_referencing_nodes(&seed_ids)?;
        let mut node_ids: BTreeSet<i64> = seed_ids.iter().copied().collect();
        node_ids.extend(self.store().nodes_referenced_by_ways(&way_ids)?);
        let node_ids: Vec<i64> = node_ids.into_iter().collect();

        let mut relation_ids: BTreeSet<i64> = self
            .store()
            .relations_referencing(ElementKind::Node, &node_ids)?
            .into_iter()
            .collect();
        relation_ids.extend(
            self.store()
                .relations_referencing(ElementKind::Way, &way_ids)?,
        );
        let direct: Vec<i64> = relation_ids.iter().copied().collect();
        relation_ids.extend(
            self.store()
                .relations_referencing(ElementKind::Relation, &direct)?,
        );
        let relation_ids: Vec<i64> = relation_ids.into_iter().collect();

        debug!(
            "map extraction: {} nodes, {} ways, {} relations",
            node_ids.len(),
            way_ids.len(),
            relation_ids.len()
        );

        let mut doc = Osm::new();
        doc.nodes = self.store().nodes_by_ids(&node_ids)?;
        doc.ways = self.store().ways_by_ids(&way_ids)?;
        doc.relations = self.store().relations_by_ids(&relation_ids)?;
        Ok(doc)
    }
}
