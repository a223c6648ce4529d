//! Catalog store: the mapping from product identifier to product record.
//!
//! Pure in-memory domain logic (no IO, no locking). The settlement engine owns
//! the single `Catalog` and serializes access to it.

pub mod product;
pub mod store;

pub use product::{NewProduct, Product};
pub use store::Catalog;
