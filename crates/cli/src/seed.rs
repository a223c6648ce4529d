//! Catalog seed files.
//!
//! A seed is a JSON array of `{ "id", "name", "price", "stock" }` records.
//! Each record is added on its own: a rejected record is reported and the rest
//! of the file still goes in.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use vending_catalog::{Catalog, NewProduct, Product};
use vending_core::{AccountId, Amount, DomainError, ProductId};
use vending_events::EventBus;
use vending_machine::{AddProduct, ValueTransfer, VendingEnvelope, VendingMachine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedProduct {
    pub id: u64,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
}

impl SeedProduct {
    pub fn product_id(&self) -> ProductId {
        ProductId::new(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFailure {
    pub product_id: ProductId,
    pub name: String,
    pub error: DomainError,
}

/// Outcome of seeding, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: Vec<ProductId>,
    pub failed: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.added.len() + self.failed.len()
    }

    fn record(&mut self, seed: &SeedProduct, result: Result<ProductId, DomainError>) {
        match result {
            Ok(id) => self.added.push(id),
            Err(error) => {
                tracing::warn!(product_id = seed.id, name = %seed.name, error = %error, "seed product rejected");
                self.failed.push(SeedFailure {
                    product_id: seed.product_id(),
                    name: seed.name.clone(),
                    error,
                });
            }
        }
    }
}

pub fn parse_seed(json: &str) -> anyhow::Result<Vec<SeedProduct>> {
    serde_json::from_str(json).context("seed must be a JSON array of {id, name, price, stock}")
}

pub fn load_seed(path: &Path) -> anyhow::Result<Vec<SeedProduct>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_seed(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Validate a seed without a machine: the products that would be accepted, in
/// order, plus the rejected ones.
pub fn inspect_seed(products: &[SeedProduct]) -> (Vec<Product>, SeedReport) {
    let mut catalog = Catalog::new();
    let mut report = SeedReport::default();

    for seed in products {
        let result = catalog
            .add(NewProduct::new(seed.id, seed.name.clone(), seed.price, seed.stock))
            .map(|p| p.id());
        report.record(seed, result);
    }

    (catalog.list().cloned().collect(), report)
}

/// Add every seed product to `machine` as `owner`, continuing past failures.
pub fn seed_machine<T, B>(machine: &VendingMachine<T, B>, owner: AccountId, products: &[SeedProduct]) -> SeedReport
where
    T: ValueTransfer,
    B: EventBus<VendingEnvelope>,
{
    let mut report = SeedReport::default();

    for seed in products {
        let result = machine
            .add_product(AddProduct {
                caller: owner,
                product_id: seed.product_id(),
                name: seed.name.clone(),
                price: seed.price,
                stock: seed.stock,
                occurred_at: Utc::now(),
            })
            .map(|committed| committed.value.id());
        report.record(seed, result);
    }

    tracing::info!(
        added = report.added.len(),
        failed = report.failed.len(),
        "catalog seeded"
    );
    report
}
