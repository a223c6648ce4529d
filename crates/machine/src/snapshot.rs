use serde::{Deserialize, Serialize};

use vending_catalog::{Catalog, NewProduct, Product};
use vending_core::{AccountId, Amount, DomainResult, MachineId};

use crate::engine::MachineState;

/// Persisted state layout of a machine.
///
/// Products are listed in catalog (insertion) order. `next_sequence` is the
/// sequence number the next emitted event will carry, so a restored machine
/// continues its log without reusing positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub machine_id: MachineId,
    pub owner: AccountId,
    pub balance: Amount,
    pub next_sequence: u64,
    pub products: Vec<Product>,
}

impl MachineSnapshot {
    /// Rebuild the machine state, running every product back through catalog
    /// validation. A snapshot with a reserved, duplicate, zero-priced or
    /// unnamed product is rejected as a whole.
    pub(crate) fn restore_state(&self) -> DomainResult<MachineState> {
        let mut catalog = Catalog::new();
        for product in &self.products {
            catalog.add(NewProduct::from(product.clone()))?;
        }

        Ok(MachineState {
            catalog,
            balance: self.balance,
            next_sequence: self.next_sequence.max(1),
        })
    }
}
