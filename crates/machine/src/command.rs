use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vending_catalog::NewProduct;
use vending_core::{AccountId, Amount, ProductId};

/// Command: AddProduct (owner only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddProduct {
    pub caller: AccountId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
    pub occurred_at: DateTime<Utc>,
}

impl AddProduct {
    pub(crate) fn to_new_product(&self) -> NewProduct {
        NewProduct::new(self.product_id, self.name.clone(), self.price, self.stock)
    }
}

/// Command: BuyProduct. The buyer is the caller and `payment` is the value
/// attached to the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyProduct {
    pub buyer: AccountId,
    pub product_id: ProductId,
    pub payment: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Withdraw (owner only). Moves the whole ledger balance to the owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdraw {
    pub caller: AccountId,
}
