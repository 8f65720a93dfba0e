use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::{ResultExt, ensure};

use crate::{
    models::{SearchRequest, Snippet},
    providers::{
        ApiSnafu, ClientBuildSnafu, InvalidApiKeySnafu, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, RateLimitedSnafu, ReqwestSnafu, SearchProvider, ValidationSnafu,
        brave_rest::{params::construct_params, response::BraveResponse},
    },
    relevance::is_relevant,
};

const BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Environment variable holding the subscription token.
pub const API_KEY_VAR: &str = "BRAVE_API_KEY";

pub struct BraveProvider {
    client: Client,
    base_url: String,
    _api_key: SecretString,
}

impl BraveProvider {
    /// Creates a new Brave provider.
    ///
    /// Reads the subscription token from the `BRAVE_API_KEY` environment variable.
    pub fn new() -> Result<Self, ProviderInitError> {
        let api_key = SecretString::new(get_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?.into());
        Self::with_api_key(api_key)
    }

    /// Creates a provider with an explicit token.
    pub fn with_api_key(api_key: SecretString) -> Result<Self, ProviderInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            "X-Subscription-Token",
            header::HeaderValue::from_str(api_key.expose_secret()).context(InvalidApiKeySnafu)?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            _api_key: api_key,
        })
    }

    /// Points the provider at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for BraveProvider {
    fn name(&self) -> &'static str {
        "brave"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
        ensure!(
            !request.product_name.trim().is_empty(),
            ValidationSnafu {
                message: "product name is empty"
            }
        );

        let query_params = construct_params(request);
        let response = self
            .client
            .get(&self.base_url)
            .query(&query_params)
            .send()
            .await
            .context(ReqwestSnafu)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RateLimitedSnafu.fail();
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.json::<BraveResponse>().await.context(ReqwestSnafu)?;
        let total = body.web.results.len();

        let snippets: Vec<Snippet> = body
            .web
            .results
            .into_iter()
            .filter(|r| is_relevant(&r.title, &r.description, &request.product_name))
            .take(request.max_results)
            .map(|r| Snippet {
                title: r.title,
                text: r.description,
                url: r.url,
            })
            .collect();

        tracing::debug!(
            provider = "brave",
            returned = total,
            kept = snippets.len(),
            "web search finished"
        );
        Ok(snippets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_product_name_is_rejected_before_any_request() {
        let provider = BraveProvider::with_api_key(SecretString::from("token".to_string()))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/unreachable");
        let err = provider
            .search(&SearchRequest::new("   ", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation { .. }));
    }

    #[test]
    fn header_unsafe_token_is_an_init_error() {
        let err = BraveProvider::with_api_key(SecretString::from("bad\ntoken".to_string()));
        assert!(matches!(err, Err(ProviderInitError::InvalidApiKey { .. })));
    }
}
