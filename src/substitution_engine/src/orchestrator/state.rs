//! The decision state machine.
//!
//! ```text
//! Received -> ExactCheck -> Done(InternalExact)
//!                        -> EquivalentSearch -> StockFilter -> Done(InternalEquivalent)
//!                                                           -> Fallback -> Done(ExternalFallback)
//!                                                                       -> Done(NoAlternative)
//! ```
//!
//! Every transition is a pure function of the state and a snapshot. The one
//! step that needs I/O, resolving `Fallback`, takes the snippets as input so
//! the caller owns the await point.

use fallback_search::models::{SearchRequest, Snippet};
use tracing::debug;

use crate::{
    errors::QueryError,
    model::{LocationId, ProductCode},
    query::{NormalizedQuery, SubstitutionQuery},
    ranking,
    result::{ExternalCandidate, LocationStock, Notice, Outcome, SubstitutionCandidate},
    snapshot::Snapshot,
};

/// Limits applied by the decision logic.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPolicy {
    /// Location used when the query names none.
    pub primary_location: LocationId,
    /// Cap on internal candidates.
    pub max_results: usize,
}

/// Data carried through every non-initial state.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryContext {
    /// Validated query.
    pub query: NormalizedQuery,
    /// Notices gathered so far.
    pub notices: Vec<Notice>,
}

/// An identity considered during the stock filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    /// Candidate board.
    pub code: ProductCode,
    /// Similarity to the request.
    pub score: f64,
    /// Identity whose link produced it; `None` for roots.
    pub via: Option<ProductCode>,
}

/// One step of a decision.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState {
    /// Raw query, not yet validated.
    Received(SubstitutionQuery),
    /// Is the requested product in stock where it was asked for?
    ExactCheck(QueryContext),
    /// Collect equivalents of the roots.
    EquivalentSearch(QueryContext),
    /// Keep candidates with stock and rank them.
    StockFilter {
        /// Query context.
        ctx: QueryContext,
        /// Roots and their equivalents, before stock filtering.
        pool: Vec<PoolEntry>,
    },
    /// Nothing internal; waiting for the external lookup.
    Fallback {
        /// Query context.
        ctx: QueryContext,
        /// Lookup to run.
        request: SearchRequest,
    },
    /// Terminal.
    Done {
        /// Query context.
        ctx: QueryContext,
        /// The decision.
        outcome: Outcome,
    },
}

impl QueryState {
    /// Short state label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            QueryState::Received(_) => "received",
            QueryState::ExactCheck(_) => "exact_check",
            QueryState::EquivalentSearch(_) => "equivalent_search",
            QueryState::StockFilter { .. } => "stock_filter",
            QueryState::Fallback { .. } => "fallback",
            QueryState::Done { .. } => "done",
        }
    }

    /// Whether no further transition applies.
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Done { .. })
    }
}

/// Performs one synchronous transition.
///
/// `Fallback` needs [`resolve_fallback`] and `Done` is terminal; both are
/// returned unchanged.
pub fn advance(
    state: QueryState,
    snapshot: &Snapshot,
    policy: &DecisionPolicy,
) -> Result<QueryState, QueryError> {
    Ok(match state {
        QueryState::Received(query) => receive(query, policy)?,
        QueryState::ExactCheck(ctx) => exact_check(ctx, snapshot),
        QueryState::EquivalentSearch(ctx) => equivalent_search(ctx, snapshot),
        QueryState::StockFilter { ctx, pool } => stock_filter(ctx, pool, snapshot, policy.max_results),
        waiting @ (QueryState::Fallback { .. } | QueryState::Done { .. }) => waiting,
    })
}

/// Turns the external lookup's snippets into the terminal state.
pub fn resolve_fallback(ctx: QueryContext, snippets: Vec<Snippet>) -> QueryState {
    let outcome = if snippets.is_empty() {
        Outcome::NoAlternative
    } else {
        Outcome::ExternalFallback(
            snippets
                .into_iter()
                .enumerate()
                .map(|(i, snippet)| ExternalCandidate { rank: i + 1, snippet })
                .collect(),
        )
    };
    QueryState::Done { ctx, outcome }
}

fn receive(query: SubstitutionQuery, policy: &DecisionPolicy) -> Result<QueryState, QueryError> {
    let query = query.normalize(&policy.primary_location)?;
    Ok(QueryState::ExactCheck(QueryContext {
        query,
        notices: Vec::new(),
    }))
}

fn exact_check(mut ctx: QueryContext, snapshot: &Snapshot) -> QueryState {
    let Some(code) = ctx.query.product.clone() else {
        return QueryState::EquivalentSearch(ctx);
    };
    if snapshot.product(&code).is_none() {
        ctx.notices.push(Notice::UnknownProduct { code });
        return QueryState::EquivalentSearch(ctx);
    }

    let here = snapshot
        .stock()
        .quantity_at(&code, &ctx.query.location)
        .unwrap_or(0);
    if here < ctx.query.quantity {
        debug!(product = %code, here, wanted = ctx.query.quantity, "requested product short at location");
        return QueryState::EquivalentSearch(ctx);
    }

    match build_candidate(snapshot, &ctx.query, &code, 1.0, None) {
        Some(mut candidate) => {
            candidate.rank = 1;
            QueryState::Done {
                ctx,
                outcome: Outcome::InternalExact(candidate),
            }
        }
        None => QueryState::EquivalentSearch(ctx),
    }
}

fn equivalent_search(ctx: QueryContext, snapshot: &Snapshot) -> QueryState {
    let roots: Vec<(ProductCode, f64)> = match &ctx.query.product {
        Some(code) if snapshot.product(code).is_some() => vec![(code.clone(), 1.0)],
        _ => ctx
            .query
            .resolved
            .iter()
            .filter(|r| snapshot.product(&r.code).is_some())
            .map(|r| (r.code.clone(), r.match_score))
            .collect(),
    };

    let mut pool: Vec<PoolEntry> = roots
        .iter()
        .map(|(code, score)| PoolEntry {
            code: code.clone(),
            score: *score,
            via: None,
        })
        .collect();
    for r in snapshot.equivalence().reach(&roots) {
        match pool.iter_mut().find(|p| p.code == r.id) {
            // a resolved root linked from a stronger root keeps the better path
            Some(root) if r.score > root.score => {
                root.score = r.score;
                root.via = Some(r.via);
            }
            Some(_) => {}
            None => pool.push(PoolEntry {
                code: r.id,
                score: r.score,
                via: Some(r.via),
            }),
        }
    }
    debug!(roots = roots.len(), pool = pool.len(), "equivalent search");

    QueryState::StockFilter { ctx, pool }
}

fn stock_filter(
    ctx: QueryContext,
    pool: Vec<PoolEntry>,
    snapshot: &Snapshot,
    max_results: usize,
) -> QueryState {
    let mut candidates: Vec<SubstitutionCandidate> = pool
        .iter()
        .filter_map(|p| build_candidate(snapshot, &ctx.query, &p.code, p.score, p.via.clone()))
        .filter(|c| c.total > 0)
        .collect();
    ranking::rank(&mut candidates, max_results);

    if candidates.is_empty() {
        let known = ctx.query.product.as_ref().and_then(|c| snapshot.product(c));
        let request = ctx.query.search_request(known);
        return QueryState::Fallback { ctx, request };
    }

    for (i, c) in candidates.iter_mut().enumerate() {
        c.rank = i + 1;
    }
    QueryState::Done {
        ctx,
        outcome: Outcome::InternalEquivalent(candidates),
    }
}

fn build_candidate(
    snapshot: &Snapshot,
    query: &NormalizedQuery,
    code: &ProductCode,
    similarity: f64,
    via: Option<ProductCode>,
) -> Option<SubstitutionCandidate> {
    let product = snapshot.product(code)?;
    let stock = snapshot.stock();
    let total = stock.total_quantity(code).ok()?;
    let at_location = stock.quantity_at(code, &query.location).ok()?;
    let locations = stock
        .locations_with_stock(code)
        .ok()?
        .into_iter()
        .map(|(location, quantity)| LocationStock { location, quantity })
        .collect();

    Some(SubstitutionCandidate {
        rank: 0,
        product: product.clone(),
        similarity,
        at_location,
        total,
        locations,
        cross_location: at_location < query.quantity && total >= query.quantity,
        covers_demand: total >= query.quantity,
        via,
    })
}
