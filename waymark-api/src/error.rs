//! Domain-level outcomes of request resolution.

use thiserror::Error;
use waymark_core::StoreError;

/// Errors produced while resolving a request.
///
/// `NotFound` and `Gone` are the only domain-level outcomes beyond
/// success; everything else is an infrastructure failure carried opaquely.
/// The transport layer maps these onto status codes (404, 410, 500).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested element or set does not exist, a batch completeness
    /// check failed, or a bounding-box query returned nothing or exceeded
    /// the result cap.
    #[error("element doesn't exist")]
    NotFound,
    /// The element exists but its current version is not visible.
    #[error("element is deleted")]
    Gone,
    /// The backing store failed; not retried, surfaced as a server error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// Whether this is a domain outcome rather than an infrastructure
    /// failure.
    pub const fn is_domain(&self) -> bool {
        matches!(self, Self::NotFound | Self::Gone)
    }
}
