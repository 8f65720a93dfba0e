use serde::Deserialize;

/// Top-level Brave web search response; only the parts we read.
#[derive(Debug, Default, Deserialize)]
pub struct BraveResponse {
    #[serde(default)]
    pub web: BraveWeb,
}

#[derive(Debug, Default, Deserialize)]
pub struct BraveWeb {
    #[serde(default)]
    pub results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
pub struct BraveResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_partial_payloads() {
        let json = r#"{
            "type": "search",
            "web": { "results": [
                { "title": "MDF Louro Freijó", "description": "Chapa MDF 18mm", "url": "https://a.example" },
                { "title": "sem descricao" }
            ] }
        }"#;
        let resp: BraveResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.web.results.len(), 2);
        assert_eq!(resp.web.results[1].description, "");
    }

    #[test]
    fn missing_web_section_is_empty() {
        let resp: BraveResponse = serde_json::from_str(r#"{"type":"search"}"#).unwrap();
        assert!(resp.web.results.is_empty());
    }
}
