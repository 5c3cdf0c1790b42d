//! SQLite-backed [`waymark_core::OsmStore`] implementation.
//!
//! The store serves a pre-built database laid out by [`schema`]: current
//! and historical element tables with fixed-point coordinates, side
//! tables for tags, way node lists and relation member lists, plus
//! changesets, their comments and the owning user accounts. The database
//! is opened read-only; building it is an ingest concern outside this
//! crate.

#![forbid(unsafe_code)]

mod error;
pub mod schema;
mod sqlite;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use error::SqliteStoreError;
pub use sqlite::SqliteOsmStore;
