//! Changeset request resolution.

use waymark_core::{Osm, OsmStore};

use crate::{ApiError, Engine};

impl<S: OsmStore> Engine<S> {
    /// Metadata for one changeset, with the discussion thread attached
    /// only when `include_discussion` is set.
    ///
    /// Changesets have no visibility flag, so the only domain failure is
    /// an unknown id.
    pub fn changeset(&self, id: i64, include_discussion: bool) -> Result<Osm, ApiError> {
        let ids = self.store().resolve_changesets(&[id])?;
        if ids.is_empty() {
            return Err(ApiError::NotFound);
        }
        let mut doc = Osm::new();
        doc.changesets = self.store().changesets_by_ids(&ids, include_discussion)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{changeset, ts};
    use rstest::rstest;
    use waymark_core::test_support::MemoryStore;
    use waymark_core::{Comment, Discussion};

    fn discussed(id: i64) -> waymark_core::Changeset {
        let mut c = changeset(id);
        c.comments_count = 1;
        c.discussion = Some(Discussion {
            comments: vec![Comment {
                uid: 7,
                user: "reviewer".to_owned(),
                timestamp: ts(),
                text: "looks fine".to_owned(),
            }],
        });
        c
    }

    #[rstest]
    fn returns_changeset_without_discussion_by_default() {
        let store = MemoryStore::new().with_changesets([discussed(9000)]);
        let engine = Engine::new(store);
        let doc = engine.changeset(9000, false).expect("changeset");
        assert_eq!(doc.changesets.len(), 1);
        assert!(doc.changesets[0].discussion.is_none());
    }

    #[rstest]
    fn attaches_discussion_when_requested() {
        let store = MemoryStore::new().with_changesets([discussed(9000)]);
        let engine = Engine::new(store);
        let doc = engine.changeset(9000, true).expect("changeset");
        let discussion = doc.changesets[0].discussion.as_ref().expect("discussion");
        assert_eq!(discussion.comments[0].text, "looks fine");
    }

    #[rstest]
    fn unknown_changeset_is_not_found() {
        let engine = Engine::new(MemoryStore::new());
        assert!(matches!(engine.changeset(1, false), Err(ApiError::NotFound)));
    }
}
