//! Bounding boxes for map queries.
//!
//! Requests carry decimal degrees; the store works in the fixed-point
//! integer representation coordinates are persisted in, so a parsed box is
//! converted once with [`Bbox::scaled`] before any query runs.

use std::str::FromStr;

use thiserror::Error;

/// Multiplier between decimal degrees and stored fixed-point coordinates.
pub const COORDINATE_SCALE: f64 = 1e7;

/// A validated bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bbox {
    /// Southern edge.
    pub min_lat: f64,
    /// Western edge.
    pub min_lon: f64,
    /// Northern edge.
    pub max_lat: f64,
    /// Eastern edge.
    pub max_lon: f64,
}

/// Errors raised while parsing or validating a bounding box.
#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    /// The input did not contain exactly four comma-separated bounds.
    #[error("bounding box needs exactly four comma-separated bounds, got {found}")]
    WrongArity {
        /// Number of bounds found in the input.
        found: usize,
    },
    /// A bound could not be parsed as a decimal number.
    #[error("bounding box bound {value:?} is not a decimal number")]
    InvalidNumber {
        /// The offending token.
        value: String,
    },
    /// A bound lies outside the valid WGS84 range.
    #[error("bounding box bound {value} is outside the valid coordinate range")]
    OutOfRange {
        /// The offending value.
        value: f64,
    },
    /// A minimum bound exceeds its corresponding maximum.
    #[error("bounding box minimum exceeds maximum")]
    Inverted,
}

impl Bbox {
    /// Validate and construct a box from `(min_lat, min_lon, max_lat, max_lon)`.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, BboxError> {
        for (value, limit) in [
            (min_lat, 90.0),
            (max_lat, 90.0),
            (min_lon, 180.0),
            (max_lon, 180.0),
        ] {
            if !value.is_finite() || value < -limit || value > limit {
                return Err(BboxError::OutOfRange { value });
            }
        }
        if min_lat > max_lat || min_lon > max_lon {
            return Err(BboxError::Inverted);
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Convert to the store's fixed-point integer representation.
    pub fn scaled(&self) -> ScaledBbox {
        ScaledBbox {
            min_lat: scale(self.min_lat),
            min_lon: scale(self.min_lon),
            max_lat: scale(self.max_lat),
            max_lon: scale(self.max_lon),
        }
    }
}

impl FromStr for Bbox {
    type Err = BboxError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        // Arity is checked before any token parses, so a wrong count is
        // always reported as such whatever the tokens hold.
        let tokens: Vec<&str> = raw.split(',').collect();
        let [min_lat, min_lon, max_lat, max_lon] = tokens[..] else {
            return Err(BboxError::WrongArity {
                found: tokens.len(),
            });
        };
        let mut bounds = [0.0_f64; 4];
        for (slot, token) in bounds
            .iter_mut()
            .zip([min_lat, min_lon, max_lat, max_lon])
        {
            let token = token.trim();
            *slot = token.parse().map_err(|_| BboxError::InvalidNumber {
                value: token.to_owned(),
            })?;
        }
        let [min_lat, min_lon, max_lat, max_lon] = bounds;
        Self::new(min_lat, min_lon, max_lat, max_lon)
    }
}

/// A bounding box in the store's fixed-point integer representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledBbox {
    /// Southern edge, scaled.
    pub min_lat: i64,
    /// Western edge, scaled.
    pub min_lon: i64,
    /// Northern edge, scaled.
    pub max_lat: i64,
    /// Eastern edge, scaled.
    pub max_lon: i64,
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "inputs are validated to +-180 degrees, far inside i64 range"
)]
fn scale(degrees: f64) -> i64 {
    (degrees * COORDINATE_SCALE).round() as i64
}
