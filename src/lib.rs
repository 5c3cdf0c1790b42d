//! Facade crate for the Waymark read-only map API.
//!
//! This crate re-exports the element model, the resolution engine and,
//! behind a feature flag, the SQLite store implementation.

#![forbid(unsafe_code)]

pub use waymark_api::{ApiError, ElementRefs, Engine, MAX_BBOX_NODES, RefListError};
pub use waymark_core::{
    Bbox, BboxError, Changeset, Comment, Discussion, ElementKind, Member, MemberType, Node, Osm,
    OsmStore, Relation, StoreError, Tag, Tags, VersionRef, Way,
};

#[cfg(feature = "store-sqlite")]
pub use waymark_store::{SqliteOsmStore, SqliteStoreError};
