#![allow(dead_code)]

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use fallback_search::{
    models::{SearchRequest, Snippet},
    providers::{ProviderError, SearchProvider, ValidationSnafu},
};
use substitution_engine::{
    banding::EdgeBandingAdvisor,
    dataset::{BandingData, Dataset, UnknownReferencePolicy},
    gateway::FallbackSearchGateway,
    model::{BandingItem, EquivalenceLink, LinkKind, LocationId, Product, StockEntry},
    orchestrator::{DecisionPolicy, SubstitutionOrchestrator},
    snapshot::SnapshotStore,
};

/// Provider returning fixed snippets and counting calls.
pub struct CannedProvider {
    pub snippets: Vec<Snippet>,
    pub calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SearchProvider for CannedProvider {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snippets.clone())
    }
}

/// Provider that always errors.
pub struct FailingProvider;

#[async_trait]
impl SearchProvider for FailingProvider {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
        ValidationSnafu {
            message: "boom".to_string(),
        }
        .fail()
    }
}

/// Provider slower than any test timeout.
pub struct StalledProvider;

#[async_trait]
impl SearchProvider for StalledProvider {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn search(&self, _request: &SearchRequest) -> Result<Vec<Snippet>, ProviderError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(vec![snippet(0)])
    }
}

pub fn snippet(i: usize) -> Snippet {
    Snippet {
        title: format!("MDF alternativo {i}"),
        text: "chapa MDF similar".into(),
        url: format!("https://example.test/mdf/{i}"),
    }
}

pub fn canned(n: usize) -> (Box<CannedProvider>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = CannedProvider {
        snippets: (0..n).map(snippet).collect(),
        calls: calls.clone(),
    };
    (Box::new(provider), calls)
}

fn board(code: &str, color: &str) -> Product {
    let mut p = Product::bare(code);
    p.brand = Some("Duratex".into());
    p.color = Some(color.into());
    p.finish = Some("TX".into());
    p.material_class = Some("mdf".into());
    p.width_mm = Some(2750);
    p.height_mm = Some(1840);
    p
}

/// Catalog covering the documented decision scenarios.
///
/// - `MDF15-BR-TX`: 15 sheets at L1 (exact hit), one 20 m roll of white tape
/// - `MDF18-PT-TX`: nothing at L1, linked (0.9) to `MDF18-PT-TX-ALT` with 8 at L1
/// - `MDF25-CZ`: linked to `MDF25-CZ-ALT`; neither has stock anywhere
/// - `MDF6-AZ`: 4 at L2 only
pub fn scenario_dataset() -> Dataset {
    let mut fita_br = BandingItem::colored("FITA-22-BR", "Branco");
    fita_br.compatible_products = vec!["MDF15-BR-TX".into()];

    Dataset {
        products: vec![
            board("MDF15-BR-TX", "Branco"),
            board("MDF18-PT-TX", "Preto"),
            board("MDF18-PT-TX-ALT", "Preto"),
            board("MDF25-CZ", "Cinza"),
            board("MDF25-CZ-ALT", "Grafite"),
            board("MDF6-AZ", "Azul"),
        ],
        stock: vec![
            StockEntry::new("MDF15-BR-TX", "L1", 15),
            StockEntry::new("MDF18-PT-TX", "L1", 0),
            StockEntry::new("MDF18-PT-TX-ALT", "L1", 8),
            StockEntry::new("MDF25-CZ-ALT", "L2", 0),
            StockEntry::new("MDF6-AZ", "L2", 4),
        ],
        equivalences: vec![
            EquivalenceLink::new("MDF18-PT-TX", "MDF18-PT-TX-ALT", 0.9, LinkKind::Equivalent),
            EquivalenceLink::new("MDF25-CZ", "MDF25-CZ-ALT", 0.8, LinkKind::Equivalent),
        ],
        banding: BandingData {
            items: vec![fita_br, BandingItem::colored("FITA-22-PT", "Preto")],
            stock: vec![
                StockEntry::new("FITA-22-BR", "L1", 1),
                StockEntry::new("FITA-22-PT", "L1", 10),
            ],
            links: vec![],
        },
    }
}

pub fn store_with(dataset: Dataset) -> Arc<SnapshotStore> {
    let store = Arc::new(SnapshotStore::new(LocationId::new("L1"), UnknownReferencePolicy::Error));
    store.import_dataset(dataset).expect("import");
    store
}

pub fn orchestrator(
    store: Arc<SnapshotStore>,
    provider: Box<dyn SearchProvider + Send + Sync>,
) -> SubstitutionOrchestrator {
    orchestrator_with_timeout(store, provider, Duration::from_secs(2))
}

pub fn orchestrator_with_timeout(
    store: Arc<SnapshotStore>,
    provider: Box<dyn SearchProvider + Send + Sync>,
    timeout: Duration,
) -> SubstitutionOrchestrator {
    SubstitutionOrchestrator::new(
        store,
        FallbackSearchGateway::new(provider, timeout, 8),
        EdgeBandingAdvisor::new(20),
        DecisionPolicy {
            primary_location: LocationId::new("L1"),
            max_results: 5,
        },
    )
}
