//! Provider abstraction for external product lookups.
//!
//! This module defines the [`SearchProvider`] trait, the single interface the
//! substitution engine uses to reach any web search vendor (e.g. Brave).
//! Each concrete provider handles vendor-specific request building, response
//! decoding and relevance filtering.
//!
//! The trait is async and object safe, so callers can pick the provider at
//! runtime and hold it as `Box<dyn SearchProvider + Send + Sync>`.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use fallback_search::models::{SearchRequest, Snippet};
//! use fallback_search::providers::{ProviderError, SearchProvider};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl SearchProvider for MyProvider {
//!     fn name(&self) -> &'static str {
//!         "mine"
//!     }
//!
//!     async fn search(&self, _request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod brave_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{SearchRequest, Snippet};

/// Trait for looking up free-text product references from an external source.
#[async_trait]
pub trait SearchProvider {
    /// Short provider label used in logs.
    fn name(&self) -> &'static str;

    /// Runs one lookup.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Snippet>)` - relevant hits, at most `request.max_results`, possibly empty.
    /// * `Err(ProviderError)` - transport, API or validation failure.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError>;
}

/// A provider that never finds anything.
///
/// Used when no web search is configured, so the engine still walks its full
/// decision path and ends in "no alternative".
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledProvider;

#[async_trait]
impl SearchProvider for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains characters that are not valid in a header.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `SearchProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout, bad JSON).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered with a non-success status.
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider's quota is exhausted (HTTP 429).
    #[snafu(display("Rate limited by provider"))]
    RateLimited { backtrace: Backtrace },

    /// The request was invalid for this provider.
    #[snafu(display("Invalid search request: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedProvider(Vec<Snippet>);

    #[async_trait]
    impl SearchProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn search(&self, request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
            Ok(self.0.iter().take(request.max_results).cloned().collect())
        }
    }

    // Picks the provider at runtime; only possible through `Box<dyn SearchProvider>`.
    fn get_provider(name: &str) -> Box<dyn SearchProvider + Send + Sync> {
        if name == "canned" {
            Box::new(CannedProvider(vec![
                Snippet {
                    title: "MDF Carvalho".into(),
                    text: "chapa de MDF".into(),
                    url: "https://example.com/a".into(),
                },
                Snippet {
                    title: "MDF Nogal".into(),
                    text: "painel".into(),
                    url: "https://example.com/b".into(),
                },
            ]))
        } else {
            Box::new(DisabledProvider)
        }
    }

    #[tokio::test]
    async fn dynamic_provider_respects_max_results() {
        let provider = get_provider("canned");
        let hits = provider
            .search(&SearchRequest::new("Carvalho", 1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://example.com/a");
    }

    #[tokio::test]
    async fn disabled_provider_finds_nothing() {
        let provider = get_provider("off");
        assert_eq!(provider.name(), "disabled");
        let hits = provider
            .search(&SearchRequest::new("Carvalho", 5))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
