mod common;

use std::sync::Arc;

use common::*;
use fallback_search::providers::DisabledProvider;
use substitution_engine::{
    dataset::Dataset,
    model::{EquivalenceLink, LinkKind, Product, StockEntry},
    query::SubstitutionQuery,
    result::Provenance,
};

/// Odd versions: X in stock. Even versions: X out, Y linked and in stock.
fn flavour(x_in_stock: bool) -> Dataset {
    let stock = if x_in_stock {
        vec![StockEntry::new("X", "L1", 10)]
    } else {
        vec![StockEntry::new("Y", "L1", 6)]
    };
    Dataset {
        products: vec![Product::bare("X"), Product::bare("Y")],
        stock,
        equivalences: vec![EquivalenceLink::new("X", "Y", 0.7, LinkKind::Equivalent)],
        ..Dataset::default()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn queries_never_observe_a_half_imported_snapshot() {
    let store = store_with(flavour(true));
    let engine = Arc::new(orchestrator(store.clone(), Box::new(DisabledProvider)));

    let writer = std::thread::spawn(move || {
        for i in 0..60 {
            store.import_dataset(flavour(i % 2 == 1)).unwrap();
        }
    });

    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = engine.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..60 {
                let result = engine
                    .submit(SubstitutionQuery::for_product("X", 5).at("L1"))
                    .await
                    .unwrap();
                let expect_exact = result.snapshot_version % 2 == 1;
                match result.provenance() {
                    Provenance::InternalExact => assert!(expect_exact, "v{}", result.snapshot_version),
                    Provenance::InternalEquivalent => {
                        assert!(!expect_exact, "v{}", result.snapshot_version);
                        assert_eq!(result.outcome.top().unwrap().product.code.to_string(), "Y");
                    }
                    other => panic!("unexpected {other:?} at v{}", result.snapshot_version),
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    for r in readers {
        r.await.unwrap();
    }
    writer.join().unwrap();
    assert_eq!(engine.store().snapshot().version(), 61);
}

#[tokio::test]
async fn rejected_import_leaves_queries_unaffected() {
    let store = store_with(flavour(true));
    let engine = orchestrator(store.clone(), Box::new(DisabledProvider));

    let mut broken = flavour(false);
    broken
        .equivalences
        .push(EquivalenceLink::new("X", "Y", 1.5, LinkKind::Exact));
    assert!(store.import_dataset(broken).is_err());

    let result = engine
        .submit(SubstitutionQuery::for_product("X", 5).at("L1"))
        .await
        .unwrap();
    assert_eq!(result.snapshot_version, 1);
    assert_eq!(result.provenance(), Provenance::InternalExact);
}
