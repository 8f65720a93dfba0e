//! Immutable data snapshot and the store that swaps it atomically.
//!
//! Readers call [`SnapshotStore::snapshot`] once per query and keep the
//! returned `Arc<Snapshot>` for the whole query, so a concurrent import never
//! changes the data mid-decision. Imports build a complete new snapshot off to
//! the side and publish it with a single pointer store.
//!
//! Implementation notes:
//! - Uses `arc-swap` for atomic pointer swaps + cheap reads (no RwLock).
//! - Imports serialize on a `Mutex<()>`; readers never touch it.
//! - Starts as an empty snapshot (version 0) until the first import.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    dataset::{BandingData, Dataset, NormalizationReport, UnknownReferencePolicy, normalize_dataset_with_policy},
    errors::ImportError,
    graph::EquivalenceGraph,
    model::{BandingCode, BandingItem, EquivalenceLink, LocationId, Product, ProductCode, StockEntry},
    settings::Settings,
    stock::StockIndex,
};

/// Edge-banding side of a snapshot.
#[derive(Debug, Clone)]
pub struct BandingCatalog {
    items: IndexMap<BandingCode, BandingItem>,
    equivalence: EquivalenceGraph<BandingCode>,
    stock: StockIndex<BandingCode>,
}

impl BandingCatalog {
    fn build(primary: &LocationId, data: &BandingData) -> Result<Self, ImportError> {
        let items: IndexMap<BandingCode, BandingItem> = data
            .items
            .iter()
            .map(|i| (i.code.clone(), i.clone()))
            .collect();
        let equivalence = EquivalenceGraph::build(items.keys().cloned(), &data.links, "banding link")?;
        let stock = StockIndex::build(primary.clone(), items.keys().cloned(), &data.stock, "banding stock")?;
        Ok(Self {
            items,
            equivalence,
            stock,
        })
    }

    /// Looks up one tape line.
    pub fn item(&self, code: &BandingCode) -> Option<&BandingItem> {
        self.items.get(code)
    }

    /// Tape lines in import order.
    pub fn items(&self) -> impl Iterator<Item = &BandingItem> {
        self.items.values()
    }

    /// Banding equivalence graph.
    pub fn equivalence(&self) -> &EquivalenceGraph<BandingCode> {
        &self.equivalence
    }

    /// Banding stock, in rolls.
    pub fn stock(&self) -> &StockIndex<BandingCode> {
        &self.stock
    }
}

/// Everything a query reads, frozen at import time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    version: u64,
    loaded_at: DateTime<Utc>,
    source: Dataset,
    products: IndexMap<ProductCode, Product>,
    equivalence: EquivalenceGraph<ProductCode>,
    stock: StockIndex<ProductCode>,
    banding: BandingCatalog,
}

impl Snapshot {
    /// The empty snapshot served before the first import.
    pub fn empty(primary: LocationId) -> Self {
        Self {
            version: 0,
            loaded_at: Utc::now(),
            source: Dataset::default(),
            products: IndexMap::new(),
            equivalence: EquivalenceGraph::default(),
            stock: StockIndex::empty(primary.clone()),
            banding: BandingCatalog {
                items: IndexMap::new(),
                equivalence: EquivalenceGraph::default(),
                stock: StockIndex::empty(primary),
            },
        }
    }

    /// Builds every index from an already normalized dataset.
    pub fn build(version: u64, primary: LocationId, source: Dataset) -> Result<Self, ImportError> {
        let products: IndexMap<ProductCode, Product> = source
            .products
            .iter()
            .map(|p| (p.code.clone(), p.clone()))
            .collect();
        let equivalence =
            EquivalenceGraph::build(products.keys().cloned(), &source.equivalences, "product link")?;
        let stock = StockIndex::build(primary.clone(), products.keys().cloned(), &source.stock, "product stock")?;
        let banding = BandingCatalog::build(&primary, &source.banding)?;

        Ok(Self {
            version,
            loaded_at: Utc::now(),
            source,
            products,
            equivalence,
            stock,
            banding,
        })
    }

    /// Monotonic import counter; 0 before the first import.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When this snapshot was published.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Looks up one board.
    pub fn product(&self, code: &ProductCode) -> Option<&Product> {
        self.products.get(code)
    }

    /// Boards in import order.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Board equivalence graph.
    pub fn equivalence(&self) -> &EquivalenceGraph<ProductCode> {
        &self.equivalence
    }

    /// Board stock, in sheets.
    pub fn stock(&self) -> &StockIndex<ProductCode> {
        &self.stock
    }

    /// Edge-banding catalog.
    pub fn banding(&self) -> &BandingCatalog {
        &self.banding
    }

    /// The normalized data this snapshot was built from.
    pub fn dataset(&self) -> &Dataset {
        &self.source
    }
}

/// What an import produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    /// Version of the snapshot now active.
    pub version: u64,
    /// Boards in the snapshot.
    pub products: usize,
    /// Board stock rows after merging.
    pub stock_rows: usize,
    /// Distinct board links.
    pub product_links: usize,
    /// Tape lines in the snapshot.
    pub banding_items: usize,
    /// Tape stock rows after merging.
    pub banding_stock_rows: usize,
    /// Distinct tape links.
    pub banding_links: usize,
    /// What normalization changed.
    pub normalization: NormalizationReport,
}

impl ImportReport {
    fn new(snapshot: &Snapshot, normalization: NormalizationReport) -> Self {
        let ds = snapshot.dataset();
        Self {
            version: snapshot.version,
            products: ds.products.len(),
            stock_rows: ds.stock.len(),
            product_links: snapshot.equivalence.link_count(),
            banding_items: ds.banding.items.len(),
            banding_stock_rows: ds.banding.stock.len(),
            banding_links: snapshot.banding.equivalence.link_count(),
            normalization,
        }
    }
}

/// Holder of the active snapshot.
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwap<Snapshot>,
    import_lock: Mutex<()>,
    primary: LocationId,
    policy: UnknownReferencePolicy,
}

impl SnapshotStore {
    /// A store serving the empty snapshot.
    pub fn new(primary: LocationId, policy: UnknownReferencePolicy) -> Self {
        Self {
            current: ArcSwap::from_pointee(Snapshot::empty(primary.clone())),
            import_lock: Mutex::new(()),
            primary,
            policy,
        }
    }

    /// A store configured from [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.primary_location.clone(), settings.import.unknown_reference)
    }

    /// The active snapshot. Hold on to it for the duration of one query.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Replaces every entity at once.
    pub fn import_dataset(&self, dataset: Dataset) -> Result<ImportReport, ImportError> {
        self.replace("dataset", self.policy, |ds| *ds = dataset)
    }

    /// Replaces the board catalog.
    ///
    /// Stock rows, links and banding hints that refer to boards no longer in
    /// the catalog are dropped and counted in
    /// [`NormalizationReport::unknown_references_dropped`].
    pub fn load_products(&self, products: Vec<Product>) -> Result<ImportReport, ImportError> {
        self.replace("products", UnknownReferencePolicy::Drop, |ds| ds.products = products)
    }

    /// Replaces board stock.
    pub fn load_stock(&self, stock: Vec<StockEntry<ProductCode>>) -> Result<ImportReport, ImportError> {
        self.replace("stock", self.policy, |ds| ds.stock = stock)
    }

    /// Replaces board equivalence links.
    pub fn load_equivalence(
        &self,
        links: Vec<EquivalenceLink<ProductCode>>,
    ) -> Result<ImportReport, ImportError> {
        self.replace("equivalence", self.policy, |ds| ds.equivalences = links)
    }

    /// Replaces the banding catalog, its stock and its links.
    pub fn load_banding(&self, banding: BandingData) -> Result<ImportReport, ImportError> {
        self.replace("banding", self.policy, |ds| ds.banding = banding)
    }

    fn replace(
        &self,
        what: &'static str,
        policy: UnknownReferencePolicy,
        edit: impl FnOnce(&mut Dataset),
    ) -> Result<ImportReport, ImportError> {
        let _guard = self.import_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load_full();

        let mut next = current.source.clone();
        edit(&mut next);

        let built = normalize_dataset_with_policy(&mut next, policy).and_then(|normalization| {
            Snapshot::build(current.version + 1, self.primary.clone(), next).map(|s| (s, normalization))
        });
        let (snapshot, normalization) = match built {
            Ok(ok) => ok,
            Err(e) => {
                warn!(import = what, error = %e, active_version = current.version, "import rejected");
                return Err(e);
            }
        };

        let report = ImportReport::new(&snapshot, normalization);
        self.current.store(Arc::new(snapshot));
        info!(
            import = what,
            version = report.version,
            products = report.products,
            product_links = report.product_links,
            banding_items = report.banding_items,
            "snapshot published"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkKind;

    fn store() -> SnapshotStore {
        SnapshotStore::new(LocationId::new("L1"), UnknownReferencePolicy::Error)
    }

    fn dataset() -> Dataset {
        Dataset {
            products: vec![Product::bare("A"), Product::bare("B"), Product::bare("C")],
            stock: vec![StockEntry::new("A", "L1", 3), StockEntry::new("C", "L2", 1)],
            equivalences: vec![
                EquivalenceLink::new("A", "B", 0.9, LinkKind::Equivalent),
                EquivalenceLink::new("A", "C", 0.5, LinkKind::Alternative),
            ],
            banding: BandingData::default(),
        }
    }

    #[test]
    fn starts_empty_then_imports() {
        let s = store();
        assert_eq!(s.snapshot().version(), 0);
        assert!(s.snapshot().equivalence().is_empty());

        let report = s.import_dataset(dataset()).unwrap();
        assert_eq!(report.version, 1);
        assert_eq!(report.products, 3);
        assert_eq!(report.product_links, 2);
        assert!(s.snapshot().product(&"B".into()).is_some());
    }

    #[test]
    fn failed_import_keeps_previous_snapshot() {
        let s = store();
        s.import_dataset(dataset()).unwrap();

        let err = s
            .load_equivalence(vec![EquivalenceLink::new("A", "Q", 0.5, LinkKind::Exact)])
            .unwrap_err();
        assert!(matches!(err, ImportError::UnknownReference { .. }));

        let snap = s.snapshot();
        assert_eq!(snap.version(), 1);
        assert_eq!(snap.equivalence().link_count(), 2);
    }

    #[test]
    fn readers_keep_their_snapshot_across_imports() {
        let s = store();
        s.import_dataset(dataset()).unwrap();
        let held = s.snapshot();

        s.load_stock(vec![StockEntry::new("B", "L1", 7)]).unwrap();

        assert_eq!(held.stock().quantity_at(&"A".into(), &LocationId::new("L1")).unwrap(), 3);
        let fresh = s.snapshot();
        assert_eq!(fresh.version(), 2);
        assert_eq!(fresh.stock().quantity_at(&"A".into(), &LocationId::new("L1")).unwrap(), 0);
        assert_eq!(fresh.stock().quantity_at(&"B".into(), &LocationId::new("L1")).unwrap(), 7);
        // untouched entities carry over
        assert_eq!(fresh.equivalence().link_count(), 2);
    }

    #[test]
    fn load_products_prunes_dangling_references() {
        let s = store();
        s.import_dataset(dataset()).unwrap();

        let report = s.load_products(vec![Product::bare("A"), Product::bare("B")]).unwrap();
        assert_eq!(report.normalization.unknown_references_dropped, 2);
        let snap = s.snapshot();
        assert!(snap.product(&"C".into()).is_none());
        assert_eq!(snap.equivalence().link_count(), 1);
        assert!(snap.stock().total_quantity(&"C".into()).is_err());
    }

    #[test]
    fn banding_replaced_independently() {
        let s = store();
        s.import_dataset(dataset()).unwrap();
        let banding = BandingData {
            items: vec![BandingItem::colored("FITA-BR", "Branco")],
            stock: vec![StockEntry::new("FITA-BR", "L1", 2)],
            links: vec![],
        };
        let report = s.load_banding(banding).unwrap();
        assert_eq!(report.banding_items, 1);
        assert_eq!(report.products, 3);
        let snap = s.snapshot();
        assert_eq!(
            snap.banding().stock().total_quantity(&"FITA-BR".into()).unwrap(),
            2
        );
    }
}
