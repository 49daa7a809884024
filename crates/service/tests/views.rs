use chrono::Local;
use common::{BatchRef, OrderId, Sku};
use domain::{Allocate, ChangeBatchQuantity, CreateBatch};
use projections::{AllocationRow, AllocationsView};
use service::{Dependencies, RetryPolicy, bootstrap, views};
use storage::InMemoryStorage;

fn row(sku: &str, batchref: &str) -> AllocationRow {
    AllocationRow {
        sku: Sku::new(sku),
        batchref: BatchRef::new(batchref),
    }
}

#[tokio::test]
async fn allocations_view() {
    let allocations = AllocationsView::new();
    let dependencies = Dependencies {
        allocations: allocations.clone(),
        ..Dependencies::default()
    };
    let bus = bootstrap(InMemoryStorage::new(), dependencies, RetryPolicy::immediate(3)).unwrap();
    let mut uow = bus.unit_of_work();
    let today = Local::now().date_naive();

    bus.handle(CreateBatch::new("sku1batch", "sku1", 50, None), &mut uow)
        .await
        .unwrap();
    bus.handle(CreateBatch::new("sku2batch", "sku2", 50, Some(today)), &mut uow)
        .await
        .unwrap();
    bus.handle(Allocate::new("order1", "sku1", 20), &mut uow)
        .await
        .unwrap();
    bus.handle(Allocate::new("order1", "sku2", 20), &mut uow)
        .await
        .unwrap();

    // Spurious batch and order to make sure only order1's rows come back.
    bus.handle(CreateBatch::new("sku1batch-later", "sku1", 50, Some(today)), &mut uow)
        .await
        .unwrap();
    bus.handle(Allocate::new("otherorder", "sku1", 30), &mut uow)
        .await
        .unwrap();
    bus.handle(Allocate::new("otherorder", "sku2", 10), &mut uow)
        .await
        .unwrap();

    assert_eq!(
        views::allocations(&OrderId::new("order1"), &allocations).await,
        vec![row("sku1", "sku1batch"), row("sku2", "sku2batch")]
    );
}

#[tokio::test]
async fn deallocation_removes_rows() {
    let allocations = AllocationsView::new();
    let dependencies = Dependencies {
        allocations: allocations.clone(),
        ..Dependencies::default()
    };
    let bus = bootstrap(InMemoryStorage::new(), dependencies, RetryPolicy::immediate(3)).unwrap();
    let mut uow = bus.unit_of_work();

    bus.handle(CreateBatch::new("b1", "sku1", 50, None), &mut uow)
        .await
        .unwrap();
    bus.handle(Allocate::new("o1", "sku1", 40), &mut uow)
        .await
        .unwrap();
    assert_eq!(
        views::allocations(&OrderId::new("o1"), &allocations).await,
        vec![row("sku1", "b1")]
    );

    // No other batch can take the line once b1 shrinks.
    bus.handle(ChangeBatchQuantity::new("b1", 10), &mut uow)
        .await
        .unwrap();

    assert!(
        views::allocations(&OrderId::new("o1"), &allocations)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn batches_are_listed_by_sku_then_reference() {
    let bus = bootstrap(
        InMemoryStorage::new(),
        Dependencies::default(),
        RetryPolicy::immediate(3),
    )
    .unwrap();
    let mut uow = bus.unit_of_work();

    // Equal etas keep insertion order, so b3 is preferred over b1.
    for (reference, sku) in [("b2", "sku2"), ("b3", "sku1"), ("b1", "sku1")] {
        bus.handle(CreateBatch::new(reference, sku, 10, None), &mut uow)
            .await
            .unwrap();
    }
    bus.handle(Allocate::new("o1", "sku1", 4), &mut uow)
        .await
        .unwrap();

    let batches = views::batches(&mut uow).await.unwrap();
    let listed: Vec<_> = batches
        .iter()
        .map(|batch| (batch.sku.as_str(), batch.reference.as_str(), batch.available_quantity))
        .collect();
    assert_eq!(
        listed,
        vec![("sku1", "b1", 10), ("sku1", "b3", 6), ("sku2", "b2", 10)]
    );
    assert_eq!(uow.storage().commit_count().await, 4);
}
