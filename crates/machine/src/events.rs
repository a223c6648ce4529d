use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vending_core::{AccountId, Amount, ProductId};
use vending_events::Event;

/// Event: ProductAdded (full record as created).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdded {
    pub product_id: ProductId,
    pub name: String,
    pub price: Amount,
    pub stock: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductPurchased. `price` is the unit price charged, not the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPurchased {
    pub product_id: ProductId,
    pub buyer: AccountId,
    pub price: Amount,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RefundSent (overpayment returned to the buyer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundSent {
    pub buyer: AccountId,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendingEvent {
    ProductAdded(ProductAdded),
    ProductPurchased(ProductPurchased),
    RefundSent(RefundSent),
}

impl Event for VendingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VendingEvent::ProductAdded(_) => "vending.product.added",
            VendingEvent::ProductPurchased(_) => "vending.product.purchased",
            VendingEvent::RefundSent(_) => "vending.refund.sent",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            VendingEvent::ProductAdded(e) => e.occurred_at,
            VendingEvent::ProductPurchased(e) => e.occurred_at,
            VendingEvent::RefundSent(e) => e.occurred_at,
        }
    }
}
