//! Edge-banding advisor.
//!
//! Given the board chosen by the orchestrator, computes how much tape the job
//! needs and picks a tape line that can cover it:
//!
//! 1. tapes listing the board as compatible, or with the same color (and a
//!    compatible finish when both sides name one); when the board has none,
//!    the tapes of the product originally requested;
//! 2. otherwise tapes linked to those in the banding equivalence graph (same
//!    hop rules as boards), tapes in the same color family, and tapes whose
//!    name, brand or color resembles the board's name or color;
//!
//! each tier ranked with the shared [`crate::ranking`] policy. When nothing
//! covers the requirement the advisor reports the shortfall instead of
//! failing.

pub mod appearance;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    model::{BandingCode, BandingItem, Identity, LocationId, Product, ProductCode},
    query::BandingRequest,
    ranking::{self, RankKey, Rankable},
    settings::BandingSettings,
    snapshot::BandingCatalog,
};

/// Similarity assigned to a tape that only shares the board's color family.
pub const COLOR_FAMILY_SCORE: f64 = 0.5;

/// Minimum [`EdgeBandingAdvisor::name_similarity`] for a name match.
pub const NAME_MATCH_THRESHOLD: f64 = 0.5;

/// Total tape length for `quantity` boards, in millimetres.
///
/// `long_edges × length + short_edges × width` per board. Integer arithmetic,
/// so the result is exactly linear in `quantity`.
pub fn required_length_mm(
    long_edges: u8,
    short_edges: u8,
    length_mm: u32,
    width_mm: u32,
    quantity: u64,
) -> u64 {
    let per_unit = u64::from(long_edges) * u64::from(length_mm)
        + u64::from(short_edges) * u64::from(width_mm);
    per_unit.saturating_mul(quantity)
}

/// Tape needed for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BandingRequirement {
    /// Board long side, in millimetres.
    pub length_mm: u32,
    /// Board short side, in millimetres.
    pub width_mm: u32,
    /// Tape per board.
    pub per_unit_mm: u64,
    /// Boards in the job.
    pub quantity: u64,
    /// Tape for the whole job.
    pub required_mm: u64,
}

impl BandingRequirement {
    /// Requirement for `quantity` boards, dimensions taken from the request
    /// and completed from the board record. `None` when a dimension is unknown.
    pub fn for_board(request: &BandingRequest, board: &Product, quantity: u64) -> Option<Self> {
        let (board_long, board_short) = match (board.width_mm, board.height_mm) {
            (Some(a), Some(b)) => (Some(a.max(b)), Some(a.min(b))),
            (a, b) => (a, b),
        };
        let length_mm = request.length_mm.or(board_long)?;
        let width_mm = request.width_mm.or(board_short)?;
        Some(Self {
            length_mm,
            width_mm,
            per_unit_mm: required_length_mm(request.long_edges, request.short_edges, length_mm, width_mm, 1),
            quantity,
            required_mm: required_length_mm(
                request.long_edges,
                request.short_edges,
                length_mm,
                width_mm,
                quantity,
            ),
        })
    }
}

/// How a recommended tape relates to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandingMatch {
    /// Listed as compatible, or same color and finish.
    Exact,
    /// Exact tape of the product originally requested.
    RequestedBoard,
    /// Linked to an exact tape in the banding graph.
    Equivalent,
    /// Same color family only.
    ColorFamily,
    /// Name, brand or color resembles the board's.
    NameMatch,
}

/// The tape to sell with the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandingRecommendation {
    /// Tape line.
    pub item: BandingItem,
    /// Relation to the board.
    pub match_kind: BandingMatch,
    /// 1.0 for exact tapes and tapes of the requested product.
    pub score: f64,
    /// Exact tape whose link produced this one.
    pub via: Option<BandingCode>,
    /// What the job needs.
    pub requirement: BandingRequirement,
    /// Length of one roll of this tape.
    pub roll_length_mm: u64,
    /// Rolls to pick.
    pub rolls_needed: u64,
    /// Tape at the requested location.
    pub at_location_mm: u64,
    /// Tape across every location.
    pub available_mm: u64,
    /// The requested location alone cannot cover the job.
    pub cross_location: bool,
}

/// No tape line covers the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("banding for {board}: {required_mm} mm required, best available {best_available_mm} mm")]
pub struct InsufficientBanding {
    /// Board the tape was meant for.
    pub board: ProductCode,
    /// Tape the job needs.
    pub required_mm: u64,
    /// Longest stock of any candidate tape; 0 when no candidate exists.
    pub best_available_mm: u64,
}

/// Result of [`EdgeBandingAdvisor::advise`].
#[derive(Debug, Clone, PartialEq)]
pub enum BandingAdvice {
    /// A tape covers the job.
    Recommended(BandingRecommendation),
    /// Nothing covers the job.
    Insufficient(InsufficientBanding),
    /// The requirement could not be computed.
    Skipped(String),
}

#[derive(Debug)]
struct Offer<'a> {
    item: &'a BandingItem,
    match_kind: BandingMatch,
    score: f64,
    via: Option<BandingCode>,
    roll_length_mm: u64,
    at_location_mm: u64,
    available_mm: u64,
}

impl Rankable for Offer<'_> {
    fn rank_key(&self) -> RankKey<'_> {
        RankKey {
            id: self.item.code.as_str(),
            at_location: self.at_location_mm,
            score: self.score,
            total: self.available_mm,
        }
    }
}

/// Picks tape for a board.
#[derive(Debug, Clone)]
pub struct EdgeBandingAdvisor {
    default_roll_length_mm: u64,
}

impl EdgeBandingAdvisor {
    /// Advisor using `roll_length_m` for tapes without their own roll length.
    /// A zero length is raised to one metre.
    pub fn new(roll_length_m: u32) -> Self {
        Self {
            default_roll_length_mm: u64::from(roll_length_m.max(1)) * 1_000,
        }
    }

    /// Advisor configured from `[banding]` settings.
    pub fn from_settings(settings: &BandingSettings) -> Self {
        Self::new(settings.roll_length_m)
    }

    /// Roll length of `item` in millimetres.
    pub fn roll_length_mm(&self, item: &BandingItem) -> u64 {
        item.roll_length_m
            .filter(|m| *m > 0)
            .map_or(self.default_roll_length_mm, |m| u64::from(m) * 1_000)
    }

    /// Whether `item` is an exact tape for `board`.
    pub fn is_exact(item: &BandingItem, board: &Product) -> bool {
        if item.compatible_products.contains(&board.code) {
            return true;
        }
        let (Some(item_color), Some(board_color)) = (&item.color, &board.color) else {
            return false;
        };
        if !appearance::colors_match(item_color, board_color) {
            return false;
        }
        match (&item.finish, &board.finish) {
            (Some(a), Some(b)) => appearance::finishes_compatible(a, b),
            _ => true,
        }
    }

    /// Best token-sort similarity between the board's name or color and the
    /// tape's name, brand, brand plus name, or color.
    pub fn name_similarity(item: &BandingItem, board: &Product) -> f64 {
        let combined = match (&item.brand, &item.name) {
            (Some(brand), Some(name)) => Some(format!("{brand} {name}")),
            _ => None,
        };
        let tape_texts = [
            item.name.as_deref(),
            item.brand.as_deref(),
            combined.as_deref(),
            item.color.as_deref(),
        ];
        [board.name.as_deref(), board.color.as_deref()]
            .into_iter()
            .flatten()
            .flat_map(|b| {
                tape_texts
                    .into_iter()
                    .flatten()
                    .map(move |t| appearance::token_sort_similarity(b, t))
            })
            .fold(0.0, f64::max)
    }

    fn exact_offers<'a>(
        &self,
        catalog: &'a BandingCatalog,
        board: &Product,
        location: &LocationId,
        match_kind: BandingMatch,
    ) -> Vec<Offer<'a>> {
        let mut offers: Vec<Offer<'a>> = catalog
            .items()
            .filter(|item| Self::is_exact(item, board))
            .map(|item| self.offer(catalog, item, location, match_kind, 1.0, None))
            .collect();
        ranking::rank(&mut offers, usize::MAX);
        offers
    }

    fn offer<'a>(
        &self,
        catalog: &BandingCatalog,
        item: &'a BandingItem,
        location: &LocationId,
        match_kind: BandingMatch,
        score: f64,
        via: Option<BandingCode>,
    ) -> Offer<'a> {
        let roll = self.roll_length_mm(item);
        let stock = catalog.stock();
        let rolls_here = stock.quantity_at(&item.code, location).unwrap_or(0);
        let rolls_total = stock.total_quantity(&item.code).unwrap_or(0);
        Offer {
            item,
            match_kind,
            score,
            via,
            roll_length_mm: roll,
            at_location_mm: rolls_here.saturating_mul(roll),
            available_mm: rolls_total.saturating_mul(roll),
        }
    }

    /// Recommends tape for `quantity` boards of `board` at `location`.
    ///
    /// `requested` is the product the customer asked for; its tapes stand in
    /// when the board has no exact tape of its own.
    pub fn advise(
        &self,
        catalog: &BandingCatalog,
        board: &Product,
        requested: Option<&Product>,
        request: &BandingRequest,
        quantity: u64,
        location: &LocationId,
    ) -> BandingAdvice {
        let Some(requirement) = BandingRequirement::for_board(request, board, quantity) else {
            return BandingAdvice::Skipped(format!("dimensions of {} are unknown", board.code));
        };
        let required = requirement.required_mm;

        let mut exact = self.exact_offers(catalog, board, location, BandingMatch::Exact);
        if exact.is_empty() {
            if let Some(original) = requested.filter(|p| p.code != board.code) {
                exact = self.exact_offers(catalog, original, location, BandingMatch::RequestedBoard);
            }
        }
        let mut best_available = exact.iter().map(|o| o.available_mm).max().unwrap_or(0);
        if let Some(hit) = exact.iter().find(|o| o.available_mm >= required) {
            return BandingAdvice::Recommended(recommend(hit, requirement));
        }

        let mut pool: HashMap<&BandingCode, Offer<'_>> = HashMap::new();
        let roots: Vec<(BandingCode, f64)> = exact.iter().map(|o| (o.item.code.clone(), 1.0)).collect();
        for reached in catalog.equivalence().reach(&roots) {
            if let Some(item) = catalog.item(&reached.id) {
                let offer = self.offer(
                    catalog,
                    item,
                    location,
                    BandingMatch::Equivalent,
                    reached.score,
                    Some(reached.via),
                );
                admit(&mut pool, offer);
            }
        }

        let family = board
            .color
            .as_deref()
            .and_then(appearance::color_family)
            .or_else(|| board.name.as_deref().and_then(appearance::color_family));
        if let Some(family) = family {
            for item in catalog.items() {
                if exact.iter().any(|o| o.item.code == item.code) {
                    continue;
                }
                let item_family = item
                    .color
                    .as_deref()
                    .and_then(appearance::color_family)
                    .or_else(|| item.name.as_deref().and_then(appearance::color_family));
                if item_family != Some(family) {
                    continue;
                }
                let offer = self.offer(
                    catalog,
                    item,
                    location,
                    BandingMatch::ColorFamily,
                    COLOR_FAMILY_SCORE,
                    None,
                );
                admit(&mut pool, offer);
            }
        }

        for item in catalog.items() {
            if exact.iter().any(|o| o.item.code == item.code) {
                continue;
            }
            let score = Self::name_similarity(item, board);
            if score >= NAME_MATCH_THRESHOLD {
                let offer = self.offer(catalog, item, location, BandingMatch::NameMatch, score, None);
                admit(&mut pool, offer);
            }
        }

        let mut alternatives: Vec<Offer<'_>> = pool.into_values().collect();
        ranking::rank(&mut alternatives, usize::MAX);
        if let Some(hit) = alternatives.iter().find(|o| o.available_mm >= required) {
            debug!(board = %board.code, tape = %hit.item.code, "no exact tape covers the job, using alternative");
            return BandingAdvice::Recommended(recommend(hit, requirement));
        }
        best_available = best_available.max(alternatives.iter().map(|o| o.available_mm).max().unwrap_or(0));

        BandingAdvice::Insufficient(InsufficientBanding {
            board: board.code.clone(),
            required_mm: required,
            best_available_mm: best_available,
        })
    }
}

/// Keeps the higher-scored offer for each tape.
fn admit<'a>(pool: &mut HashMap<&'a BandingCode, Offer<'a>>, offer: Offer<'a>) {
    match pool.get(&offer.item.code) {
        Some(held) if held.score >= offer.score => {}
        _ => {
            let item = offer.item;
            pool.insert(&item.code, offer);
        }
    }
}

fn recommend(offer: &Offer<'_>, requirement: BandingRequirement) -> BandingRecommendation {
    BandingRecommendation {
        item: offer.item.clone(),
        match_kind: offer.match_kind,
        score: offer.score,
        via: offer.via.clone(),
        requirement,
        roll_length_mm: offer.roll_length_mm,
        rolls_needed: requirement.required_mm.div_ceil(offer.roll_length_mm),
        at_location_mm: offer.at_location_mm,
        available_mm: offer.available_mm,
        cross_location: offer.at_location_mm < requirement.required_mm,
    }
}
