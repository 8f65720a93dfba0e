//! What a query returns.

use std::fmt;

use fallback_search::models::Snippet;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    banding::{BandingRecommendation, InsufficientBanding},
    model::{Identity, LocationId, Product, ProductCode},
    query::NormalizedQuery,
    ranking::{RankKey, Rankable},
};

/// Net stock of a candidate at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationStock {
    /// Where.
    pub location: LocationId,
    /// Sheets available there.
    pub quantity: u64,
}

/// An in-catalog board that can be sold instead of the request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionCandidate {
    /// 1-based position in the result.
    pub rank: usize,
    /// Catalog record.
    pub product: Product,
    /// 1.0 for the requested product, link score product otherwise.
    pub similarity: f64,
    /// Sheets at the requested location.
    pub at_location: u64,
    /// Sheets across every location.
    pub total: u64,
    /// Locations with stock, primary first.
    pub locations: Vec<LocationStock>,
    /// The requested location is short but the network total covers the demand.
    pub cross_location: bool,
    /// The network total covers the demand.
    pub covers_demand: bool,
    /// Identity whose link produced this candidate; `None` for roots.
    pub via: Option<ProductCode>,
}

impl Rankable for SubstitutionCandidate {
    fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            id: self.product.code.as_str(),
            at_location: self.at_location,
            score: self.similarity,
            total: self.total,
        }
    }
}

/// A web hit offered when nothing internal is available.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalCandidate {
    /// 1-based position, in provider order.
    pub rank: usize,
    /// The hit.
    pub snippet: Snippet,
}

/// Which path produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Requested product in stock at the requested location.
    InternalExact,
    /// In-catalog equivalents.
    InternalEquivalent,
    /// Web lookup.
    ExternalFallback,
    /// Nothing found.
    NoAlternative,
}

/// Terminal decision of the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "provenance", content = "candidates", rename_all = "snake_case")]
pub enum Outcome {
    /// The requested product itself.
    InternalExact(SubstitutionCandidate),
    /// Ranked in-catalog equivalents; never empty.
    InternalEquivalent(Vec<SubstitutionCandidate>),
    /// Web hits; never empty, never mixed with internal candidates.
    ExternalFallback(Vec<ExternalCandidate>),
    /// Internal search and fallback both came up empty.
    NoAlternative,
}

impl Outcome {
    /// Path that produced this outcome.
    pub fn provenance(&self) -> Provenance {
        match self {
            Outcome::InternalExact(_) => Provenance::InternalExact,
            Outcome::InternalEquivalent(_) => Provenance::InternalEquivalent,
            Outcome::ExternalFallback(_) => Provenance::ExternalFallback,
            Outcome::NoAlternative => Provenance::NoAlternative,
        }
    }

    /// Internal candidates in rank order; empty for external outcomes.
    pub fn internal(&self) -> &[SubstitutionCandidate] {
        match self {
            Outcome::InternalExact(c) => std::slice::from_ref(c),
            Outcome::InternalEquivalent(v) => v,
            _ => &[],
        }
    }

    /// External candidates in rank order; empty for internal outcomes.
    pub fn external(&self) -> &[ExternalCandidate] {
        match self {
            Outcome::ExternalFallback(v) => v,
            _ => &[],
        }
    }

    /// Best internal candidate, if any.
    pub fn top(&self) -> Option<&SubstitutionCandidate> {
        self.internal().first()
    }

    fn ranked_keys(&self) -> Vec<&str> {
        match self {
            Outcome::ExternalFallback(v) => v.iter().map(|c| c.snippet.url.as_str()).collect(),
            other => other
                .internal()
                .iter()
                .map(|c| c.product.code.as_str())
                .collect(),
        }
    }
}

/// Side information attached to a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The requested code is not in the catalog (as opposed to out of stock).
    UnknownProduct {
        /// The code as requested.
        code: ProductCode,
    },
    /// No banding stock covers the requirement; the board recommendation stands.
    InsufficientBanding(InsufficientBanding),
    /// A banding requirement was given but could not be evaluated.
    BandingSkipped {
        /// Why.
        reason: String,
    },
}

const RESULT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1d_2c4e_8a53_4b9e_9d07_51c3_a2e8_f640);

/// Stable result identifier handed to the feedback recorder.
///
/// Derived from snapshot version, normalized query and ranked identities, so
/// replaying a query on the same snapshot yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ResultId(Uuid);

impl ResultId {
    /// Derives the id for one decision.
    pub fn derive(snapshot_version: u64, query: &NormalizedQuery, outcome: &Outcome) -> Self {
        let mut name = format!("v{snapshot_version};{query:?};{:?}", outcome.provenance());
        for key in outcome.ranked_keys() {
            name.push(';');
            name.push_str(key);
        }
        Self(Uuid::new_v5(&RESULT_NAMESPACE, name.as_bytes()))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Everything the front end needs to answer the customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionResult {
    /// Stable identifier.
    pub id: ResultId,
    /// Snapshot the decision was made on.
    pub snapshot_version: u64,
    /// The query after validation.
    pub query: NormalizedQuery,
    /// The decision.
    pub outcome: Outcome,
    /// Banding for the top internal candidate, when requested and available.
    pub banding: Option<BandingRecommendation>,
    /// Side information.
    pub notices: Vec<Notice>,
}

impl SubstitutionResult {
    /// Shorthand for `self.outcome.provenance()`.
    pub fn provenance(&self) -> Provenance {
        self.outcome.provenance()
    }

    /// The insufficient-banding notice, if present.
    pub fn insufficient_banding(&self) -> Option<&InsufficientBanding> {
        self.notices.iter().find_map(|n| match n {
            Notice::InsufficientBanding(i) => Some(i),
            _ => None,
        })
    }

    /// Whether the requested product was unknown to the catalog.
    pub fn has_unknown_product(&self) -> bool {
        self.notices
            .iter()
            .any(|n| matches!(n, Notice::UnknownProduct { .. }))
    }
}
