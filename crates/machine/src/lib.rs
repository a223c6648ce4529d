//! Purchase/settlement engine of the vending ledger.
//!
//! `VendingMachine` owns the catalog and the ledger balance and runs the
//! purchase protocol: validate, refund overpayment, commit, emit. Only the
//! owner may administer it.
//!
//! Value leaves the machine only through a `ValueTransfer` implementation;
//! events leave it through an `EventBus`. Both are external collaborators.

pub mod access;
pub mod command;
pub mod engine;
pub mod events;
pub mod history;
pub mod snapshot;
pub mod transfer;

pub use access::Ownership;
pub use command::{AddProduct, BuyProduct, Withdraw};
pub use engine::{Committed, VendingEnvelope, VendingMachine};
pub use events::{ProductAdded, ProductPurchased, RefundSent, VendingEvent};
pub use history::{PurchaseHistory, PurchaseRecord, RefundRecord};
pub use snapshot::MachineSnapshot;
pub use transfer::{InMemoryWallets, TransferError, ValueTransfer};
