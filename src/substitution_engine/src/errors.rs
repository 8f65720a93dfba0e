//! Error types surfaced by the engine.
//!
//! "No alternative found" is an outcome, not an error; see
//! [`crate::result::Outcome::NoAlternative`]. Insufficient banding is likewise
//! carried inside the result ([`crate::banding::InsufficientBanding`]).

use thiserror::Error;

/// Rejections raised before any lookup runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The query carries nothing to search for, or a field is malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    /// Requested quantity was zero.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
}

/// Index lookups on identities that were never imported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The identity is not part of the active snapshot.
    #[error("unknown product: {0}")]
    UnknownProduct(String),
}

/// Malformed import data. Any of these aborts the whole import and leaves the
/// previously active snapshot in place.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    /// A code was blank after trimming.
    #[error("{entity} code cannot be empty after trimming")]
    EmptyCode {
        /// Which record kind carried the blank code.
        entity: &'static str,
    },
    /// A stock row had a blank location.
    #[error("{entity} stock for {code} has an empty location")]
    EmptyLocation {
        /// `product` or `banding`.
        entity: &'static str,
        /// The item whose row was malformed.
        code: String,
    },
    /// Two records normalize to the same code.
    #[error("duplicate {entity} code after normalization: {code}")]
    DuplicateCode {
        /// Which record kind was duplicated.
        entity: &'static str,
        /// The colliding code.
        code: String,
    },
    /// A link points from an identity to itself.
    #[error("{entity} link from {code} to itself")]
    SelfLink {
        /// `product` or `banding`.
        entity: &'static str,
        /// The offending identity.
        code: String,
    },
    /// A link score was NaN or outside `[0, 1]`.
    #[error("{entity} link {a} <-> {b} has score {score} outside [0, 1]")]
    ScoreOutOfRange {
        /// `product` or `banding`.
        entity: &'static str,
        /// One end.
        a: String,
        /// The other end.
        b: String,
        /// The rejected score.
        score: f64,
    },
    /// A record references an identity missing from the catalog.
    #[error("{entity} references unknown code {code}")]
    UnknownReference {
        /// The kind of record holding the dangling reference.
        entity: &'static str,
        /// The missing identity.
        code: String,
    },
}
