//! Core domain types for the Waymark read-only map API.
//!
//! This crate models the versioned map entities served by the API (nodes,
//! ways, relations and changesets) together with the document container
//! that carries them over the wire, the canonicalization rules used for
//! document equality, and the [`OsmStore`] contract the resolution engine
//! queries. Storage backends and request handling live in sibling crates.

#![forbid(unsafe_code)]

mod bbox;
mod changeset;
mod document;
mod node;
mod relation;
pub mod store;
mod tag;
pub mod time;
mod way;
pub mod xml;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bbox::{Bbox, BboxError, ScaledBbox, COORDINATE_SCALE};
pub use changeset::{Changeset, Comment, Discussion};
pub use document::{
    Object, Osm, ATTRIBUTION, COPYRIGHT, GENERATOR, LICENSE, PROTOCOL_VERSION,
};
pub use node::Node;
pub use relation::{Member, MemberType, Relation};
pub use store::{ElementKind, OsmStore, StoreError, VersionRef};
pub use tag::{Tag, Tags};
pub use way::Way;
