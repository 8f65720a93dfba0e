//! Imported domain records: products, stock, equivalence links, banding.
//!
//! Identities are normalized on construction (product and banding codes are
//! trimmed and upper-cased, locations trimmed), so two spellings of the same
//! code from different spreadsheets compare equal everywhere downstream.

use std::{fmt, hash::Hash};

use serde::{Deserialize, Serialize};

/// Behaviour shared by every key the indexes are built on.
pub trait Identity:
    Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The normalized textual form.
    fn as_str(&self) -> &str;
}

macro_rules! identity {
    ($(#[$meta:meta])* $name:ident, $normalize:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Builds a normalized identity from raw text.
            pub fn new(raw: impl AsRef<str>) -> Self {
                let f: fn(&str) -> String = $normalize;
                Self(f(raw.as_ref()))
            }

            /// True when nothing but whitespace was supplied.
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl Identity for $name {
            fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identity!(
    /// Stable product key, e.g. `MDF18-PT-TX`.
    ProductCode,
    |s| s.trim().to_uppercase()
);

identity!(
    /// Stable edge-banding key, e.g. `FITA-22-BR`.
    BandingCode,
    |s| s.trim().to_uppercase()
);

identity!(
    /// Warehouse / store identifier, e.g. `L1` or `principal`.
    LocationId,
    |s| s.trim().to_string()
);

/// A board as imported from the product sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    /// Stable key.
    pub code: ProductCode,
    /// Manufacturer (e.g. "Duratex").
    pub brand: Option<String>,
    /// Commercial pattern name (e.g. "Carvalho Hanover").
    pub name: Option<String>,
    /// Thickness in millimetres.
    pub thickness_mm: Option<f64>,
    /// Surface finish (e.g. "TX", "Matt").
    pub finish: Option<String>,
    /// Color or decor name used for banding matches.
    pub color: Option<String>,
    /// Material class (e.g. "mdf", "mdp").
    pub material_class: Option<String>,
    /// Board length in millimetres (long edge).
    pub width_mm: Option<u32>,
    /// Board width in millimetres (short edge).
    pub height_mm: Option<u32>,
}

impl Product {
    /// A product carrying only its code; handy for tests and sparse imports.
    pub fn bare(code: impl Into<ProductCode>) -> Self {
        Self {
            code: code.into(),
            brand: None,
            name: None,
            thickness_mm: None,
            finish: None,
            color: None,
            material_class: None,
            width_mm: None,
            height_mm: None,
        }
    }
}

/// Quantity of one item held at one location.
///
/// `reserved` units are already promised to other orders; every index works on
/// the net figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StockEntry<Id> {
    /// Product or banding code.
    pub code: Id,
    /// Where the stock sits.
    pub location: LocationId,
    /// Units on hand (sheets for boards, rolls for banding).
    pub quantity: u64,
    /// Units already reserved.
    #[serde(default)]
    pub reserved: u64,
}

impl<Id> StockEntry<Id> {
    /// Builds an entry with nothing reserved.
    pub fn new(code: impl Into<Id>, location: impl Into<LocationId>, quantity: u64) -> Self {
        Self {
            code: code.into(),
            location: location.into(),
            quantity,
            reserved: 0,
        }
    }

    /// Units that can actually be sold.
    pub fn available(&self) -> u64 {
        self.quantity.saturating_sub(self.reserved)
    }
}

/// How strongly two items are interchangeable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Loose alternative; customer should be told.
    Alternative,
    /// Equivalent product from another line or brand.
    #[default]
    Equivalent,
    /// Same product under another code. Traversal may chain through it once.
    Exact,
}

/// Weighted, undirected interchangeability relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EquivalenceLink<Id> {
    /// One end.
    pub a: Id,
    /// The other end.
    pub b: Id,
    /// Similarity in `[0, 1]`.
    pub score: f64,
    /// Link strength class.
    #[serde(default)]
    pub kind: LinkKind,
    /// Where the equivalence came from (manufacturer table, sales team...).
    #[serde(default)]
    pub source: Option<String>,
}

impl<Id> EquivalenceLink<Id> {
    /// Builds a link with no recorded source.
    pub fn new(a: impl Into<Id>, b: impl Into<Id>, score: f64, kind: LinkKind) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
            score,
            kind,
            source: None,
        }
    }
}

/// An edge-banding tape line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BandingItem {
    /// Stable key.
    pub code: BandingCode,
    /// Manufacturer.
    pub brand: Option<String>,
    /// Commercial name.
    pub name: Option<String>,
    /// Color or decor name.
    pub color: Option<String>,
    /// Surface finish.
    pub finish: Option<String>,
    /// Tape width in millimetres.
    pub width_mm: Option<u32>,
    /// Boards this tape is officially sold for.
    #[serde(default)]
    pub compatible_products: Vec<ProductCode>,
    /// Roll length in metres when it differs from the configured default.
    pub roll_length_m: Option<u32>,
}

impl BandingItem {
    /// A banding item carrying only its code and color.
    pub fn colored(code: impl Into<BandingCode>, color: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            brand: None,
            name: None,
            color: Some(color.into()),
            finish: None,
            width_mm: None,
            compatible_products: Vec::new(),
            roll_length_m: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(ProductCode::new("  mdf18-pt-tx "), ProductCode::new("MDF18-PT-TX"));
        assert_eq!(BandingCode::from("fita-br").as_str(), "FITA-BR");
        assert_eq!(LocationId::from(" Loja Centro ").as_str(), "Loja Centro");
    }

    #[test]
    fn deserialized_codes_are_normalized() {
        let entry: StockEntry<ProductCode> =
            toml::from_str("code = ' mdf15-br-tx'\nlocation = 'L1 '\nquantity = 4").unwrap();
        assert_eq!(entry.code.as_str(), "MDF15-BR-TX");
        assert_eq!(entry.location.as_str(), "L1");
        assert_eq!(entry.reserved, 0);
    }

    #[test]
    fn negative_quantities_do_not_deserialize() {
        let res: Result<StockEntry<ProductCode>, _> =
            toml::from_str("code = 'A'\nlocation = 'L1'\nquantity = -2");
        assert!(res.is_err());
    }

    #[test]
    fn reserved_stock_saturates_at_zero() {
        let mut e = StockEntry::<ProductCode>::new("A", "L1", 3);
        e.reserved = 5;
        assert_eq!(e.available(), 0);
    }

    #[test]
    fn link_kind_defaults_to_equivalent() {
        let link: EquivalenceLink<ProductCode> = toml::from_str("a = 'A'\nb = 'B'\nscore = 0.8").unwrap();
        assert_eq!(link.kind, LinkKind::Equivalent);
    }
}
