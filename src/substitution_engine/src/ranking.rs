//! Ranking policy shared by board and banding candidates.
//!
//! Order: stock at the requested location first, then score descending, then
//! network total descending, then identity ascending. The last key makes the
//! order total, so equal inputs always rank the same way.

use std::cmp::Ordering;

/// Inputs the policy looks at.
#[derive(Debug, Clone, Copy)]
pub struct RankKey<'a> {
    /// Identity text, used as the final tie-breaker.
    pub id: &'a str,
    /// Quantity at the requested location.
    pub at_location: u64,
    /// Similarity score.
    pub score: f64,
    /// Quantity across all locations.
    pub total: u64,
}

/// Anything the policy can order.
pub trait Rankable {
    /// Projection onto the ranking inputs.
    fn rank_key(&self) -> RankKey<'_>;
}

/// Compares two keys under the policy (`Less` ranks first).
pub fn compare(a: &RankKey<'_>, b: &RankKey<'_>) -> Ordering {
    (b.at_location > 0)
        .cmp(&(a.at_location > 0))
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| b.total.cmp(&a.total))
        .then_with(|| a.id.cmp(b.id))
}

/// Sorts `items` under the policy and keeps at most `cap` of them.
pub fn rank<T: Rankable>(items: &mut Vec<T>, cap: usize) {
    items.sort_by(|a, b| compare(&a.rank_key(), &b.rank_key()));
    items.truncate(cap);
}
