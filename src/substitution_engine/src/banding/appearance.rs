//! Color and finish matching for edge banding.
//!
//! Sheet names and tape names rarely agree letter for letter ("Branco Neve TX"
//! vs "BRANCO"), so matching happens on folded words: lowercase, Portuguese
//! accents stripped, split on anything that is not alphanumeric.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Word → color family.
static COLOR_FAMILIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("branco", "branco"),
        ("branca", "branco"),
        ("neve", "branco"),
        ("white", "branco"),
        ("artico", "branco"),
        ("cinza", "cinza"),
        ("grafite", "cinza"),
        ("grafito", "cinza"),
        ("titanio", "cinza"),
        ("chumbo", "cinza"),
        ("preto", "preto"),
        ("preta", "preto"),
        ("black", "preto"),
        ("areia", "neutro_claro"),
        ("beige", "neutro_claro"),
        ("bege", "neutro_claro"),
        ("creme", "neutro_claro"),
        ("marfim", "neutro_claro"),
        ("perola", "neutro_claro"),
        ("verde", "verde"),
        ("erva", "verde"),
        ("salvia", "verde"),
        ("selva", "verde"),
        ("azul", "azul"),
        ("petroleo", "azul"),
        ("chocolate", "marrom"),
        ("cafe", "marrom"),
        ("tabaco", "marrom"),
    ]
    .into_iter()
    .collect()
});

/// Word → finish group index. Finishes in the same group look alike on an edge.
static FINISH_GROUPS: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    const GROUPS: [&[&str]; 5] = [
        &["design", "essencial", "nature", "natura"],
        &["matt", "soft", "supermatte", "acetinatta"],
        &["chess", "trama", "pele"],
        &["lacca", "liso"],
        &["silk", "linho"],
    ];
    GROUPS
        .iter()
        .enumerate()
        .flat_map(|(group, words)| words.iter().map(move |w| (*w, group)))
        .collect()
});

/// Lowercases, strips accents and collapses separators to single spaces.
pub fn fold(text: &str) -> String {
    words(text).join(" ")
}

fn words(text: &str) -> Vec<String> {
    let folded: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Similarity in [0, 1] of two texts with their folded words sorted, so word
/// order does not matter ("Carvalho Hanover" vs "Hanover Carvalho" is 1.0).
pub fn token_sort_similarity(a: &str, b: &str) -> f64 {
    let sorted = |text: &str| {
        let mut w = words(text);
        w.sort_unstable();
        w.join(" ")
    };
    let (a, b) = (sorted(a), sorted(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Family of the first word in `text` that names a known color.
pub fn color_family(text: &str) -> Option<&'static str> {
    words(text)
        .iter()
        .find_map(|w| COLOR_FAMILIES.get(w.as_str()).copied())
}

/// Same folded color text.
pub fn colors_match(a: &str, b: &str) -> bool {
    let a = fold(a);
    !a.is_empty() && a == fold(b)
}

/// Same folded finish, or both finishes fall in one finish group.
pub fn finishes_compatible(a: &str, b: &str) -> bool {
    let (fa, fb) = (fold(a), fold(b));
    if fa == fb {
        return true;
    }
    let groups = |s: &str| -> Vec<usize> {
        s.split(' ').filter_map(|w| FINISH_GROUPS.get(w).copied()).collect()
    };
    let ga = groups(&fa);
    groups(&fb).iter().any(|g| ga.contains(g))
}
