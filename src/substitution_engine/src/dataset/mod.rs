//! TOML dataset: the bulk import payload.
//!
//! A dataset bundles every entity the engine indexes:
//!
//! ```toml
//! [[products]]
//! code = "MDF18-PT-TX"
//! name = "Preto TX"
//! thickness_mm = 18.0
//!
//! [[stock]]
//! code = "MDF18-PT-TX"
//! location = "L1"
//! quantity = 12
//!
//! [[equivalences]]
//! a = "MDF18-PT-TX"
//! b = "MDF18-PT-TX-ALT"
//! score = 0.9
//!
//! [[banding.items]]
//! code = "FITA-22-PT"
//! color = "Preto"
//!
//! [[banding.stock]]
//! code = "FITA-22-PT"
//! location = "L1"
//! quantity = 3
//! ```
//!
//! Entrypoints:
//! - Parse + normalize from a TOML string: [`load_dataset_str`]
//! - Parse + normalize from a file path: [`load_dataset_path`]
//! - Normalization alone: [`normalize::normalize_dataset_with_policy`]

pub mod normalize;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::model::{BandingCode, BandingItem, EquivalenceLink, Product, ProductCode, StockEntry};

pub use normalize::{NormalizationReport, UnknownReferencePolicy, normalize_dataset_with_policy};

/// Every entity of one import.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Dataset {
    /// Board catalog.
    pub products: Vec<Product>,
    /// Board stock per location, in sheets.
    pub stock: Vec<StockEntry<ProductCode>>,
    /// Board equivalence links.
    pub equivalences: Vec<EquivalenceLink<ProductCode>>,
    /// Edge-banding catalog, stock and links.
    pub banding: BandingData,
}

/// Edge-banding part of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BandingData {
    /// Tape catalog.
    pub items: Vec<BandingItem>,
    /// Tape stock per location, in rolls.
    pub stock: Vec<StockEntry<BandingCode>>,
    /// Tape equivalence links.
    pub links: Vec<EquivalenceLink<BandingCode>>,
}

/// Parse and normalize a dataset from a TOML string.
///
/// Errors:
/// - TOML parse failures (including negative quantities and unknown fields)
/// - Normalization errors (see [`normalize_dataset_with_policy`])
pub fn load_dataset_str(
    toml_str: &str,
    policy: UnknownReferencePolicy,
) -> anyhow::Result<(Dataset, NormalizationReport)> {
    let mut ds: Dataset = toml::from_str(toml_str).context("failed to parse dataset TOML")?;
    let report = normalize_dataset_with_policy(&mut ds, policy).context("normalize_dataset failed")?;
    Ok((ds, report))
}

/// Read a dataset TOML file from disk, parse, and normalize it.
pub fn load_dataset_path(
    path: impl AsRef<std::path::Path>,
    policy: UnknownReferencePolicy,
) -> anyhow::Result<(Dataset, NormalizationReport)> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read dataset file {}", path.as_ref().display()))?;
    load_dataset_str(&text, policy)
}
