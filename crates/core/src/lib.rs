//! `vending-core`: shared vocabulary of the vending ledger.
//!
//! Identifiers, the settlement unit and the domain error taxonomy. No IO.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AccountId, MachineId, ProductId};

/// Value in the smallest unit of the settlement medium (e.g. wei, cents).
pub type Amount = u128;
