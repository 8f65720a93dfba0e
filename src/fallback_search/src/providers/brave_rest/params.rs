use serde::{Deserialize, Serialize};

use crate::models::SearchRequest;

/// Brave caps `count` at 20 results per page.
pub const MAX_COUNT: usize = 20;

/// Brave-specific request parameters for a web search.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BraveSearchParams {
    pub q: String,
    pub count: usize,
    pub search_lang: String,
    pub country: String,
}

impl Default for BraveSearchParams {
    fn default() -> Self {
        Self {
            q: String::new(),
            count: 8,
            search_lang: "pt-br".to_string(),
            country: "BR".to_string(),
        }
    }
}

/// Maps a vendor-agnostic request onto Brave query parameters.
pub fn construct_params(request: &SearchRequest) -> Vec<(&'static str, String)> {
    let params = BraveSearchParams {
        q: request.query_string(),
        count: request.max_results.clamp(1, MAX_COUNT),
        ..Default::default()
    };
    vec![
        ("q", params.q),
        ("count", params.count.to_string()),
        ("search_lang", params.search_lang),
        ("country", params.country),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_clamped_to_provider_limits() {
        let params = construct_params(&SearchRequest::new("Nogal", 500));
        assert!(params.contains(&("count", "20".to_string())));

        let params = construct_params(&SearchRequest::new("Nogal", 0));
        assert!(params.contains(&("count", "1".to_string())));
    }

    #[test]
    fn locale_defaults_to_brazilian_portuguese() {
        let params = construct_params(&SearchRequest::new("Nogal", 8));
        assert!(params.contains(&("search_lang", "pt-br".to_string())));
        assert!(params.contains(&("country", "BR".to_string())));
        assert_eq!(params[0].1, "Nogal MDF similar alternativa");
    }
}
