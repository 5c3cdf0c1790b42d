//! Resolution engine for the Waymark read-only map API.
//!
//! Each request shape (single id, id plus version, history, batch token
//! list, full closure, bounding box) is resolved statelessly against an
//! [`OsmStore`]: the engine decides which identifiers to fetch, in what
//! order, and assembles the resulting rows into one [`Osm`] document.
//! Domain failures ([`ApiError::NotFound`], [`ApiError::Gone`]) are raised
//! before bulk extraction wherever possible and abort the request; no
//! partial documents are ever produced.

#![forbid(unsafe_code)]

mod changeset;
mod error;
mod map;
mod node;
mod refs;
mod relation;
#[cfg(test)]
mod testutil;
mod way;

use waymark_core::{ElementKind, OsmStore};

pub use error::ApiError;
pub use map::MAX_BBOX_NODES;
pub use refs::{ElementRefs, RefListError};

/// The resolution engine.
///
/// Holds its store handle explicitly; one engine serves any number of
/// concurrent requests, since every operation is stateless.
#[derive(Debug)]
pub struct Engine<S> {
    store: S,
}

impl<S: OsmStore> Engine<S> {
    /// Create an engine over the given store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Confirm an element exists and is currently visible.
    ///
    /// Resolution order matters: an unknown id is `NotFound` while a known
    /// but invisible one is `Gone`, and both short-circuit before any bulk
    /// extraction runs.
    fn require_visible(&self, kind: ElementKind, id: i64) -> Result<Vec<i64>, ApiError> {
        let ids = self.store.resolve_ids(kind, &[id])?;
        if ids.is_empty() {
            return Err(ApiError::NotFound);
        }
        for resolved in &ids {
            match self.store.is_visible(kind, *resolved)? {
                Some(true) => {}
                Some(false) => return Err(ApiError::Gone),
                None => return Err(ApiError::NotFound),
            }
        }
        Ok(ids)
    }
}
