//! Substitution orchestrator: drives [`state`] transitions for one query.
//!
//! A query pins one snapshot for its whole run, so a concurrent import can
//! never mix two datasets in one decision. The only await point is the
//! fallback lookup.

pub mod state;

use std::sync::Arc;

use fallback_search::providers::ProviderInitError;
use tracing::{debug, info};

use crate::{
    banding::{BandingAdvice, BandingRecommendation, EdgeBandingAdvisor},
    errors::QueryError,
    gateway::FallbackSearchGateway,
    query::{NormalizedQuery, SubstitutionQuery},
    result::{Notice, Outcome, ResultId, SubstitutionResult},
    settings::Settings,
    snapshot::{Snapshot, SnapshotStore},
};

pub use state::{DecisionPolicy, QueryContext, QueryState};

/// The decision engine.
#[derive(Debug)]
pub struct SubstitutionOrchestrator {
    store: Arc<SnapshotStore>,
    gateway: FallbackSearchGateway,
    advisor: EdgeBandingAdvisor,
    policy: DecisionPolicy,
}

impl SubstitutionOrchestrator {
    /// Assembles an orchestrator from its parts.
    pub fn new(
        store: Arc<SnapshotStore>,
        gateway: FallbackSearchGateway,
        advisor: EdgeBandingAdvisor,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            store,
            gateway,
            advisor,
            policy,
        }
    }

    /// Builds the gateway, advisor and policy from `settings`.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<SnapshotStore>,
    ) -> Result<Self, ProviderInitError> {
        Ok(Self::new(
            store,
            FallbackSearchGateway::from_settings(&settings.fallback)?,
            EdgeBandingAdvisor::from_settings(&settings.banding),
            DecisionPolicy {
                primary_location: settings.primary_location.clone(),
                max_results: settings.max_results,
            },
        ))
    }

    /// The snapshot store queries read from.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Runs one query to a decision.
    ///
    /// Errors: [`QueryError`] for malformed queries only. Not finding anything
    /// is [`Outcome::NoAlternative`].
    pub async fn submit(&self, query: SubstitutionQuery) -> Result<SubstitutionResult, QueryError> {
        let snapshot = self.store.snapshot();

        let mut state = QueryState::Received(query);
        let (ctx, outcome) = loop {
            state = match state {
                QueryState::Done { ctx, outcome } => break (ctx, outcome),
                QueryState::Fallback { ctx, request } => {
                    let snippets = self.gateway.search(&request).await;
                    state::resolve_fallback(ctx, snippets)
                }
                other => state::advance(other, &snapshot, &self.policy).inspect_err(|e| {
                    debug!(error = %e, "query rejected");
                })?,
            };
            debug!(state = state.name(), version = snapshot.version(), "transition");
        };

        let QueryContext { query, mut notices } = ctx;
        let banding = self.advise_banding(&snapshot, &query, &outcome, &mut notices);
        let id = ResultId::derive(snapshot.version(), &query, &outcome);

        info!(
            %id,
            provenance = ?outcome.provenance(),
            candidates = outcome.internal().len() + outcome.external().len(),
            notices = notices.len(),
            version = snapshot.version(),
            "substitution decided"
        );

        Ok(SubstitutionResult {
            id,
            snapshot_version: snapshot.version(),
            query,
            outcome,
            banding,
            notices,
        })
    }

    fn advise_banding(
        &self,
        snapshot: &Snapshot,
        query: &NormalizedQuery,
        outcome: &Outcome,
        notices: &mut Vec<Notice>,
    ) -> Option<BandingRecommendation> {
        let request = query.banding.as_ref()?;
        let Some(board) = outcome.top() else {
            notices.push(Notice::BandingSkipped {
                reason: "no internal board to band".into(),
            });
            return None;
        };

        let requested = query.product.as_ref().and_then(|code| snapshot.product(code));
        match self.advisor.advise(
            snapshot.banding(),
            &board.product,
            requested,
            request,
            query.quantity,
            &query.location,
        ) {
            BandingAdvice::Recommended(rec) => Some(rec),
            BandingAdvice::Insufficient(short) => {
                notices.push(Notice::InsufficientBanding(short));
                None
            }
            BandingAdvice::Skipped(reason) => {
                notices.push(Notice::BandingSkipped { reason });
                None
            }
        }
    }
}
