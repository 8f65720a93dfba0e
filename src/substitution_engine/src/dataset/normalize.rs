//! Dataset normalization.
//!
//! Codes are already trimmed/upper-cased by their types; this pass enforces the
//! cross-record rules:
//! - product and banding codes are non-empty and unique
//! - stock rows for the same (code, location) are merged by summing
//! - links are de-duplicated per unordered pair, keeping the highest score
//! - self links and out-of-range scores are errors
//! - references to unknown codes are dropped or rejected per
//!   [`UnknownReferencePolicy`]

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    dataset::{BandingData, Dataset},
    errors::ImportError,
    model::{EquivalenceLink, Identity, LocationId, StockEntry},
};

/// Summary of changes performed during normalization.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    /// Stock rows folded into an earlier row for the same (code, location).
    pub stock_rows_merged: usize,
    /// Links removed because the same pair appeared earlier.
    pub links_deduped: usize,
    /// Repeated compatible-product hints removed from banding items.
    pub hints_deduped: usize,
    /// Records dropped because they referenced an unknown code
    /// ([`UnknownReferencePolicy::Drop`] only).
    pub unknown_references_dropped: usize,
}

/// What to do with records that reference codes missing from the catalog.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownReferencePolicy {
    /// Drop the record and count it.
    Drop,
    /// Abort the import.
    #[default]
    Error,
}

impl UnknownReferencePolicy {
    /// `Ok(false)` means drop the record, `Ok(true)` keep it.
    fn admit(
        self,
        known: bool,
        entity: &'static str,
        code: &dyn std::fmt::Display,
        report: &mut NormalizationReport,
    ) -> Result<bool, ImportError> {
        match (known, self) {
            (true, _) => Ok(true),
            (false, UnknownReferencePolicy::Drop) => {
                report.unknown_references_dropped += 1;
                debug!(entity, %code, "dropping record with unknown reference");
                Ok(false)
            }
            (false, UnknownReferencePolicy::Error) => Err(ImportError::UnknownReference {
                entity,
                code: code.to_string(),
            }),
        }
    }
}

/// Normalize a dataset in place.
///
/// Errors:
/// - empty or duplicate product / banding codes
/// - stock rows with an empty location
/// - self links, NaN or out-of-range scores
/// - unknown references when `policy` is [`UnknownReferencePolicy::Error`]
pub fn normalize_dataset_with_policy(
    ds: &mut Dataset,
    policy: UnknownReferencePolicy,
) -> Result<NormalizationReport, ImportError> {
    let mut report = NormalizationReport::default();

    let products = unique_codes(ds.products.iter().map(|p| &p.code), "product")?;

    ds.stock = normalize_stock(
        std::mem::take(&mut ds.stock),
        &products,
        policy,
        "product stock",
        &mut report,
    )?;
    ds.equivalences = normalize_links(
        std::mem::take(&mut ds.equivalences),
        &products,
        policy,
        "product link",
        &mut report,
    )?;
    normalize_banding(&mut ds.banding, &products, policy, &mut report)?;

    Ok(report)
}

fn normalize_banding(
    banding: &mut BandingData,
    products: &HashSet<crate::model::ProductCode>,
    policy: UnknownReferencePolicy,
    report: &mut NormalizationReport,
) -> Result<(), ImportError> {
    let items = unique_codes(banding.items.iter().map(|i| &i.code), "banding")?;

    for item in &mut banding.items {
        let before = item.compatible_products.len();
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(before);
        for hint in std::mem::take(&mut item.compatible_products) {
            if !seen.insert(hint.clone()) {
                report.hints_deduped += 1;
                continue;
            }
            if policy.admit(products.contains(&hint), "banding hint", &hint, report)? {
                kept.push(hint);
            }
        }
        item.compatible_products = kept;
    }

    banding.stock = normalize_stock(
        std::mem::take(&mut banding.stock),
        &items,
        policy,
        "banding stock",
        report,
    )?;
    banding.links = normalize_links(
        std::mem::take(&mut banding.links),
        &items,
        policy,
        "banding link",
        report,
    )?;
    Ok(())
}

fn unique_codes<'a, Id: Identity>(
    codes: impl Iterator<Item = &'a Id>,
    entity: &'static str,
) -> Result<HashSet<Id>, ImportError> {
    let mut seen = HashSet::new();
    for code in codes {
        if code.as_str().is_empty() {
            return Err(ImportError::EmptyCode { entity });
        }
        if !seen.insert(code.clone()) {
            return Err(ImportError::DuplicateCode {
                entity,
                code: code.to_string(),
            });
        }
    }
    Ok(seen)
}

fn normalize_stock<Id: Identity>(
    entries: Vec<StockEntry<Id>>,
    known: &HashSet<Id>,
    policy: UnknownReferencePolicy,
    entity: &'static str,
    report: &mut NormalizationReport,
) -> Result<Vec<StockEntry<Id>>, ImportError> {
    let mut merged: IndexMap<(Id, LocationId), StockEntry<Id>> = IndexMap::new();
    for entry in entries {
        if entry.code.as_str().is_empty() {
            return Err(ImportError::EmptyCode { entity });
        }
        if entry.location.is_empty() {
            return Err(ImportError::EmptyLocation {
                entity,
                code: entry.code.to_string(),
            });
        }
        if !policy.admit(known.contains(&entry.code), entity, &entry.code, report)? {
            continue;
        }
        let key = (entry.code.clone(), entry.location.clone());
        match merged.get_mut(&key) {
            Some(row) => {
                row.quantity = row.quantity.saturating_add(entry.quantity);
                row.reserved = row.reserved.saturating_add(entry.reserved);
                report.stock_rows_merged += 1;
            }
            None => {
                merged.insert(key, entry);
            }
        }
    }
    Ok(merged.into_values().collect())
}

fn normalize_links<Id: Identity>(
    links: Vec<EquivalenceLink<Id>>,
    known: &HashSet<Id>,
    policy: UnknownReferencePolicy,
    entity: &'static str,
    report: &mut NormalizationReport,
) -> Result<Vec<EquivalenceLink<Id>>, ImportError> {
    let mut by_pair: IndexMap<(Id, Id), EquivalenceLink<Id>> = IndexMap::new();
    for link in links {
        if link.a.as_str().is_empty() || link.b.as_str().is_empty() {
            return Err(ImportError::EmptyCode { entity });
        }
        if link.a == link.b {
            return Err(ImportError::SelfLink {
                entity,
                code: link.a.to_string(),
            });
        }
        if !(0.0..=1.0).contains(&link.score) {
            return Err(ImportError::ScoreOutOfRange {
                entity,
                a: link.a.to_string(),
                b: link.b.to_string(),
                score: link.score,
            });
        }
        if !policy.admit(known.contains(&link.a), entity, &link.a, report)?
            || !policy.admit(known.contains(&link.b), entity, &link.b, report)?
        {
            continue;
        }

        let key = if link.a < link.b {
            (link.a.clone(), link.b.clone())
        } else {
            (link.b.clone(), link.a.clone())
        };
        match by_pair.get_mut(&key) {
            Some(kept) => {
                report.links_deduped += 1;
                if link.score > kept.score || (link.score == kept.score && link.kind > kept.kind) {
                    *kept = link;
                }
            }
            None => {
                by_pair.insert(key, link);
            }
        }
    }
    Ok(by_pair.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BandingItem, LinkKind, Product, ProductCode};

    fn mk() -> Dataset {
        let mut fita = BandingItem::colored("fita-br", "Branco");
        fita.compatible_products = vec!["MDF15-BR-TX".into(), "mdf15-br-tx".into(), "GONE".into()];
        Dataset {
            products: vec![Product::bare(" mdf15-br-tx"), Product::bare("MDF15-BR-TX-ALT")],
            stock: vec![
                StockEntry::new("MDF15-BR-TX", "L1", 10),
                StockEntry::new("mdf15-br-tx", "L1", 5),
                StockEntry::new("GONE", "L1", 1),
            ],
            equivalences: vec![
                EquivalenceLink::new("MDF15-BR-TX", "MDF15-BR-TX-ALT", 0.6, LinkKind::Equivalent),
                EquivalenceLink::new("MDF15-BR-TX-ALT", "MDF15-BR-TX", 0.8, LinkKind::Alternative),
                EquivalenceLink::new("MDF15-BR-TX", "GONE", 0.8, LinkKind::Equivalent),
            ],
            banding: BandingData {
                items: vec![fita],
                stock: vec![StockEntry::new("FITA-BR", "L1", 2)],
                links: vec![],
            },
        }
    }

    #[test]
    fn merges_dedupes_and_drops_unknown_references() {
        let mut ds = mk();
        let report = normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Drop).unwrap();

        assert_eq!(ds.stock.len(), 1);
        assert_eq!(ds.stock[0].quantity, 15);
        assert_eq!(ds.equivalences.len(), 1);
        assert_eq!(ds.equivalences[0].score, 0.8);
        assert_eq!(ds.banding.items[0].compatible_products, vec![ProductCode::new("MDF15-BR-TX")]);

        insta::assert_json_snapshot!(report, @r###"
        {
          "stock_rows_merged": 1,
          "links_deduped": 1,
          "hints_deduped": 1,
          "unknown_references_dropped": 3
        }
        "###);
    }

    #[test]
    fn error_policy_rejects_unknown_references() {
        let mut ds = mk();
        let err = normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Error).unwrap_err();
        assert_eq!(
            err,
            ImportError::UnknownReference {
                entity: "product stock",
                code: "GONE".into()
            }
        );
    }

    #[test]
    fn duplicate_product_collision_errors() {
        let mut ds = mk();
        ds.products.push(Product::bare("MDF15-br-TX "));
        let err = normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Drop).unwrap_err();
        assert!(err.to_string().contains("duplicate product code"));
    }

    #[test]
    fn blank_codes_and_locations_error() {
        let mut ds = Dataset {
            products: vec![Product::bare("   ")],
            ..Dataset::default()
        };
        assert_eq!(
            normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Drop).unwrap_err(),
            ImportError::EmptyCode { entity: "product" }
        );

        let mut ds = mk();
        ds.stock.push(StockEntry::new("MDF15-BR-TX", " ", 1));
        assert!(matches!(
            normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Drop).unwrap_err(),
            ImportError::EmptyLocation { .. }
        ));
    }

    #[test]
    fn self_links_error_even_under_drop() {
        let mut ds = mk();
        ds.equivalences
            .push(EquivalenceLink::new("GONE", "gone", 1.0, LinkKind::Exact));
        assert!(matches!(
            normalize_dataset_with_policy(&mut ds, UnknownReferencePolicy::Drop).unwrap_err(),
            ImportError::SelfLink { .. }
        ));
    }
}
