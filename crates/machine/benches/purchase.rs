use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::Utc;
use uuid::Uuid;
use vending_core::{AccountId, ProductId};
use vending_events::{EventEnvelope, InMemoryEventBus, ProjectionRunner};
use vending_machine::{
    AddProduct, BuyProduct, InMemoryWallets, ProductPurchased, PurchaseHistory, VendingEnvelope, VendingEvent,
    VendingMachine,
};
use std::sync::Arc;

type BenchMachine = VendingMachine<Arc<InMemoryWallets>, Arc<InMemoryEventBus<VendingEnvelope>>>;

fn setup_machine(stock: u64) -> (BenchMachine, AccountId) {
    let owner = AccountId::new();
    let machine = VendingMachine::new(owner, Arc::new(InMemoryWallets::new()), Arc::new(InMemoryEventBus::new()));
    machine
        .add_product(AddProduct {
            caller: owner,
            product_id: ProductId::new(1),
            name: "Coca Cola".to_string(),
            price: 10,
            stock,
            occurred_at: Utc::now(),
        })
        .unwrap();
    (machine, owner)
}

fn bench_purchase_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_latency");
    group.sample_size(1000);

    // Exact payment: one event, no transfer
    group.bench_function("exact_payment", |b| {
        let (machine, _) = setup_machine(u64::MAX);
        let buyer = AccountId::new();
        b.iter(|| {
            machine
                .buy_product(BuyProduct {
                    buyer,
                    product_id: ProductId::new(1),
                    payment: black_box(10),
                    occurred_at: Utc::now(),
                })
                .unwrap();
        });
    });

    // Overpayment: refund transfer plus two events
    group.bench_function("with_refund", |b| {
        let (machine, _) = setup_machine(u64::MAX);
        let buyer = AccountId::new();
        b.iter(|| {
            machine
                .buy_product(BuyProduct {
                    buyer,
                    product_id: ProductId::new(1),
                    payment: black_box(15),
                    occurred_at: Utc::now(),
                })
                .unwrap();
        });
    });

    // Rejected purchase: lookup and checks only
    group.bench_function("sold_out", |b| {
        let (machine, _) = setup_machine(0);
        let buyer = AccountId::new();
        b.iter(|| {
            black_box(
                machine
                    .buy_product(BuyProduct {
                        buyer,
                        product_id: ProductId::new(1),
                        payment: 10,
                        occurred_at: Utc::now(),
                    })
                    .unwrap_err(),
            );
        });
    });

    group.finish();
}

fn bench_history_rebuild_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("history_rebuild_speed");

    for log_size in [100, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*log_size as u64));
        group.bench_with_input(BenchmarkId::new("rebuild", log_size), log_size, |b, &size| {
            let machine_id = vending_core::MachineId::new();
            let buyers: Vec<AccountId> = (0..16).map(|_| AccountId::new()).collect();
            let log: Vec<EventEnvelope<VendingEvent>> = (0..size)
                .map(|i| {
                    let event = VendingEvent::ProductPurchased(ProductPurchased {
                        product_id: ProductId::new(1),
                        buyer: buyers[i % buyers.len()],
                        price: 10,
                        occurred_at: Utc::now(),
                    });
                    EventEnvelope::new(Uuid::now_v7(), machine_id, i as u64 + 1, event)
                })
                .collect();

            b.iter(|| {
                let (history, _) = ProjectionRunner::rebuild_from_scratch(PurchaseHistory::new, &log).unwrap();
                black_box(history.total_revenue());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_purchase_latency, bench_history_rebuild_speed);
criterion_main!(benches);
