use serde::{Deserialize, Serialize};

/// Trailing terms appended to every web query so results lean towards panel
/// substitutes rather than unrelated uses of the product name.
pub const QUERY_SUFFIX: &str = "MDF similar alternativa";

/// Vendor-agnostic description of what to look up.
///
/// Built from the descriptive attributes of the original query; providers
/// translate it into their own request parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Product name or pattern as the customer asked for it (e.g. "Carvalho Hanover").
    pub product_name: String,
    /// Manufacturer, when known.
    #[serde(default)]
    pub brand: Option<String>,
    /// Board thickness in millimetres, when known.
    #[serde(default)]
    pub thickness_mm: Option<f64>,
    /// Maximum number of snippets the caller wants back.
    pub max_results: usize,
}

impl SearchRequest {
    /// Creates a request for `product_name` with no optional attributes.
    pub fn new(product_name: impl Into<String>, max_results: usize) -> Self {
        Self {
            product_name: product_name.into(),
            brand: None,
            thickness_mm: None,
            max_results,
        }
    }

    /// Free-text query sent to web search engines.
    ///
    /// Layout: `[brand] name [NNmm] MDF similar alternativa`.
    pub fn query_string(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(4);
        if let Some(brand) = self.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            parts.push(brand.to_string());
        }
        parts.push(self.product_name.trim().to_string());
        if let Some(t) = self.thickness_mm {
            parts.push(format!("{t}mm"));
        }
        parts.push(QUERY_SUFFIX.to_string());
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_orders_brand_name_thickness() {
        let req = SearchRequest {
            product_name: " Carvalho Hanover ".into(),
            brand: Some("Duratex".into()),
            thickness_mm: Some(18.0),
            max_results: 5,
        };
        assert_eq!(
            req.query_string(),
            "Duratex Carvalho Hanover 18mm MDF similar alternativa"
        );
    }

    #[test]
    fn blank_brand_is_skipped() {
        let mut req = SearchRequest::new("Branco TX", 3);
        req.brand = Some("  ".into());
        assert_eq!(req.query_string(), "Branco TX MDF similar alternativa");
    }
}
