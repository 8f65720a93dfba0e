//! Timeout-bounded access to the external search provider.
//!
//! The orchestrator only ever sees a list of snippets: provider errors and
//! timeouts are logged and turned into an empty list, which the decision logic
//! reads as "nothing found".

use std::time::Duration;

use fallback_search::{
    models::{SearchRequest, Snippet},
    providers::{ProviderInitError, SearchProvider},
};
use tracing::{debug, warn};

use crate::{providers::build_provider, settings::FallbackSettings};

/// Wraps a [`SearchProvider`] with a timeout and a snippet cap.
pub struct FallbackSearchGateway {
    provider: Box<dyn SearchProvider + Send + Sync>,
    timeout: Duration,
    max_snippets: usize,
}

impl std::fmt::Debug for FallbackSearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackSearchGateway")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("max_snippets", &self.max_snippets)
            .finish()
    }
}

impl FallbackSearchGateway {
    /// Gateway over an already built provider.
    pub fn new(
        provider: Box<dyn SearchProvider + Send + Sync>,
        timeout: Duration,
        max_snippets: usize,
    ) -> Self {
        Self {
            provider,
            timeout,
            max_snippets,
        }
    }

    /// Gateway over the provider named in `[fallback]`.
    pub fn from_settings(settings: &FallbackSettings) -> Result<Self, ProviderInitError> {
        let provider = build_provider(settings.provider)?;
        Ok(Self::new(provider, settings.timeout(), settings.max_snippets))
    }

    /// Name of the wrapped provider.
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Runs one lookup. Never fails; errors and timeouts yield no snippets.
    pub async fn search(&self, request: &SearchRequest) -> Vec<Snippet> {
        let request = SearchRequest {
            max_results: self.max_snippets,
            ..request.clone()
        };
        let provider = self.provider.name();

        match tokio::time::timeout(self.timeout, self.provider.search(&request)).await {
            Ok(Ok(mut snippets)) => {
                snippets.truncate(self.max_snippets);
                debug!(provider, found = snippets.len(), "fallback search finished");
                snippets
            }
            Ok(Err(e)) => {
                warn!(provider, error = %e, "fallback search failed");
                Vec::new()
            }
            Err(_) => {
                warn!(provider, timeout_ms = self.timeout.as_millis() as u64, "fallback search timed out");
                Vec::new()
            }
        }
    }
}
