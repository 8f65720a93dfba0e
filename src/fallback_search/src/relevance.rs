//! Relevance filter for raw web hits.
//!
//! Search engines happily return furniture blogs, paint catalogues and
//! unrelated pages for a pattern name like "Nogal". A hit is kept only when
//! it mentions a panel term and shares at least one meaningful word with the
//! product name.

/// Terms that mark a page as being about panels / joinery.
pub const PANEL_TERMS: &[&str] = &["mdf", "melamina", "chapa", "painel", "madeira", "marcenaria"];

/// Words this short ("de", "tx") say nothing about the product.
const MIN_WORD_LEN: usize = 3;

/// Returns `true` if the hit (title + text) is worth showing for `product_name`.
pub fn is_relevant(title: &str, text: &str, product_name: &str) -> bool {
    let combined = format!("{title} {text}").to_lowercase();

    if !PANEL_TERMS.iter().any(|term| combined.contains(term)) {
        return false;
    }

    product_name
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .any(|w| combined.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_a_panel_term() {
        assert!(!is_relevant("Nogal Terracota", "tinta acrílica nogal", "Nogal Terracota"));
        assert!(is_relevant("Nogal Terracota", "chapa MDF 15mm", "Nogal Terracota"));
    }

    #[test]
    fn requires_a_shared_product_word() {
        assert!(!is_relevant("MDF Branco", "chapa branca", "Cinza Sagrado"));
        assert!(is_relevant("MDF Cinza", "painel cinza", "Cinza Sagrado"));
    }

    #[test]
    fn short_words_do_not_count() {
        assert!(!is_relevant("MDF TX", "chapa tx", "TX BP"));
    }
}
