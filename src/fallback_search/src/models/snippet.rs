use serde::{Deserialize, Serialize};

/// One free-text search hit, as shown to the salesperson.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    /// Page title.
    pub title: String,
    /// Short description / excerpt returned by the search engine.
    pub text: String,
    /// Source page.
    pub url: String,
}
