//! Substitution queries as handed over by the front end.
//!
//! [`SubstitutionQuery`] is the loose input shape; [`SubstitutionQuery::normalize`]
//! validates it into a [`NormalizedQuery`] the orchestrator works on.

use fallback_search::models::SearchRequest;
use serde::{Deserialize, Serialize};

use crate::{
    errors::QueryError,
    model::{LocationId, Product, ProductCode},
};

/// Free-text description of what the customer asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductAttributes {
    /// Pattern or commercial name.
    pub name: Option<String>,
    /// Manufacturer.
    pub brand: Option<String>,
    /// Thickness in millimetres.
    pub thickness_mm: Option<f64>,
    /// Surface finish.
    pub finish: Option<String>,
    /// Color or decor.
    pub color: Option<String>,
    /// Material class.
    pub material_class: Option<String>,
}

fn clean(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ProductAttributes {
    /// True when no attribute carries information.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.brand.is_none()
            && self.thickness_mm.is_none()
            && self.finish.is_none()
            && self.color.is_none()
            && self.material_class.is_none()
    }

    fn normalized(self) -> Self {
        Self {
            name: clean(self.name),
            brand: clean(self.brand),
            thickness_mm: self.thickness_mm.filter(|t| t.is_finite() && *t > 0.0),
            finish: clean(self.finish),
            color: clean(self.color),
            material_class: clean(self.material_class),
        }
    }
}

/// A catalog identity proposed by the fuzzy-match collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    /// Proposed product.
    pub code: ProductCode,
    /// Match confidence in `[0, 1]`.
    pub match_score: f64,
}

/// Edge-banding needs for the requested boards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandingRequest {
    /// How many long edges of each board get tape (0..=2).
    pub long_edges: u8,
    /// How many short edges of each board get tape (0..=2).
    pub short_edges: u8,
    /// Board length override in millimetres.
    #[serde(default)]
    pub length_mm: Option<u32>,
    /// Board width override in millimetres.
    #[serde(default)]
    pub width_mm: Option<u32>,
}

impl BandingRequest {
    /// Tape on every edge, dimensions taken from the chosen board.
    pub fn all_edges() -> Self {
        Self {
            long_edges: 2,
            short_edges: 2,
            length_mm: None,
            width_mm: None,
        }
    }

    fn validate(&self) -> Result<(), QueryError> {
        if self.long_edges > 2 || self.short_edges > 2 {
            return Err(QueryError::InvalidQuery(
                "a board has at most two long and two short edges".into(),
            ));
        }
        if self.long_edges == 0 && self.short_edges == 0 {
            return Err(QueryError::InvalidQuery("banding request covers no edge".into()));
        }
        if self.length_mm == Some(0) || self.width_mm == Some(0) {
            return Err(QueryError::InvalidQuery("board dimensions must be positive".into()));
        }
        Ok(())
    }
}

/// Input to [`crate::orchestrator::SubstitutionOrchestrator::submit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstitutionQuery {
    /// Requested product, when the front end knows its code.
    pub product: Option<ProductCode>,
    /// Candidate identities resolved from free text.
    pub resolved: Vec<ResolvedIdentity>,
    /// Descriptive attributes from the original request.
    pub attributes: ProductAttributes,
    /// Sheets wanted.
    pub quantity: u64,
    /// Where the customer wants them; defaults to the primary location.
    pub location: Option<LocationId>,
    /// Banding needs, if any.
    pub banding: Option<BandingRequest>,
}

impl SubstitutionQuery {
    /// Query for a known code.
    pub fn for_product(code: impl Into<ProductCode>, quantity: u64) -> Self {
        Self {
            product: Some(code.into()),
            quantity,
            ..Self::default()
        }
    }

    /// Query driven only by descriptive attributes.
    pub fn describing(attributes: ProductAttributes, quantity: u64) -> Self {
        Self {
            attributes,
            quantity,
            ..Self::default()
        }
    }

    /// Sets the requested location.
    pub fn at(mut self, location: impl Into<LocationId>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Adds a collaborator-resolved identity.
    pub fn with_resolved(mut self, code: impl Into<ProductCode>, match_score: f64) -> Self {
        self.resolved.push(ResolvedIdentity {
            code: code.into(),
            match_score,
        });
        self
    }

    /// Sets the banding requirement.
    pub fn with_banding(mut self, banding: BandingRequest) -> Self {
        self.banding = Some(banding);
        self
    }

    /// Validates the query and fills defaults.
    ///
    /// Errors:
    /// - [`QueryError::InvalidQuantity`] when `quantity` is zero
    /// - [`QueryError::InvalidQuery`] when there is nothing to search for, a
    ///   match score is outside `[0, 1]`, or the banding request is malformed
    pub fn normalize(self, primary: &LocationId) -> Result<NormalizedQuery, QueryError> {
        if self.quantity == 0 {
            return Err(QueryError::InvalidQuantity);
        }

        let product = self.product.filter(|p| !p.is_empty());
        let attributes = self.attributes.normalized();

        let mut resolved: Vec<ResolvedIdentity> = Vec::with_capacity(self.resolved.len());
        for r in self.resolved.into_iter().filter(|r| !r.code.is_empty()) {
            if !(0.0..=1.0).contains(&r.match_score) {
                return Err(QueryError::InvalidQuery(format!(
                    "match score {} for {} is outside [0, 1]",
                    r.match_score, r.code
                )));
            }
            match resolved.iter_mut().find(|seen| seen.code == r.code) {
                Some(seen) => seen.match_score = seen.match_score.max(r.match_score),
                None => resolved.push(r),
            }
        }
        resolved.sort_by(|a, b| {
            b.match_score
                .total_cmp(&a.match_score)
                .then_with(|| a.code.cmp(&b.code))
        });

        if product.is_none() && resolved.is_empty() && attributes.is_empty() {
            return Err(QueryError::InvalidQuery(
                "no product code, resolved identity or descriptive attribute".into(),
            ));
        }

        if let Some(banding) = &self.banding {
            banding.validate()?;
        }

        let location = self
            .location
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| primary.clone());

        Ok(NormalizedQuery {
            product,
            resolved,
            attributes,
            quantity: self.quantity,
            location,
            banding: self.banding,
        })
    }
}

/// A validated query with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedQuery {
    /// Requested product, if any.
    pub product: Option<ProductCode>,
    /// Resolved identities, best match first, de-duplicated.
    pub resolved: Vec<ResolvedIdentity>,
    /// Trimmed attributes; blanks removed.
    pub attributes: ProductAttributes,
    /// Sheets wanted (at least one).
    pub quantity: u64,
    /// Requested location.
    pub location: LocationId,
    /// Banding needs, if any.
    pub banding: Option<BandingRequest>,
}

impl NormalizedQuery {
    /// Builds the external lookup from the query's attributes, filling gaps
    /// from the catalog record of the requested product when there is one.
    pub fn search_request(&self, known: Option<&Product>) -> SearchRequest {
        let attrs = &self.attributes;
        let name = attrs
            .name
            .clone()
            .or_else(|| known.and_then(|p| p.name.clone()))
            .or_else(|| {
                let parts: Vec<&str> = [&attrs.color, &attrs.finish, &attrs.material_class]
                    .into_iter()
                    .filter_map(|f| f.as_deref())
                    .collect();
                (!parts.is_empty()).then(|| parts.join(" "))
            })
            .or_else(|| self.product.as_ref().map(ToString::to_string))
            .or_else(|| self.resolved.first().map(|r| r.code.to_string()))
            .unwrap_or_default();

        SearchRequest {
            product_name: name,
            brand: attrs.brand.clone().or_else(|| known.and_then(|p| p.brand.clone())),
            thickness_mm: attrs.thickness_mm.or_else(|| known.and_then(|p| p.thickness_mm)),
            max_results: 0,
        }
    }
}
