//! Purchase history read model.
//!
//! Built by replaying `ProductPurchased` and `RefundSent` envelopes; catalog
//! events are ignored. The view is disposable and can be rebuilt from the log
//! with `ProjectionRunner::rebuild_from_scratch`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use vending_core::{AccountId, Amount, ProductId};
use vending_events::{EventEnvelope, Projection};

use crate::events::VendingEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseRecord {
    pub sequence_number: u64,
    pub product_id: ProductId,
    pub buyer: AccountId,
    pub price: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundRecord {
    pub sequence_number: u64,
    pub buyer: AccountId,
    pub amount: Amount,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseHistory {
    purchases: Vec<PurchaseRecord>,
    refunds: Vec<RefundRecord>,
}

impl PurchaseHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Purchases in log order.
    pub fn purchases(&self) -> &[PurchaseRecord] {
        &self.purchases
    }

    pub fn refunds(&self) -> &[RefundRecord] {
        &self.refunds
    }

    pub fn purchases_by(&self, buyer: AccountId) -> impl Iterator<Item = &PurchaseRecord> + '_ {
        self.purchases.iter().filter(move |p| p.buyer == buyer)
    }

    /// Sum of prices paid by `buyer`, saturating at `Amount::MAX`.
    pub fn total_spent(&self, buyer: AccountId) -> Amount {
        self.purchases_by(buyer)
            .fold(0, |acc: Amount, p| acc.saturating_add(p.price))
    }

    pub fn total_refunded(&self, buyer: AccountId) -> Amount {
        self.refunds
            .iter()
            .filter(|r| r.buyer == buyer)
            .fold(0, |acc: Amount, r| acc.saturating_add(r.amount))
    }

    /// Sum of all unit prices charged, saturating at `Amount::MAX`.
    pub fn total_revenue(&self) -> Amount {
        self.purchases
            .iter()
            .fold(0, |acc: Amount, p| acc.saturating_add(p.price))
    }
}

impl Projection for PurchaseHistory {
    type Ev = VendingEvent;

    fn apply(&mut self, envelope: &EventEnvelope<VendingEvent>) {
        match envelope.payload() {
            VendingEvent::ProductPurchased(e) => self.purchases.push(PurchaseRecord {
                sequence_number: envelope.sequence_number(),
                product_id: e.product_id,
                buyer: e.buyer,
                price: e.price,
                occurred_at: e.occurred_at,
            }),
            VendingEvent::RefundSent(e) => self.refunds.push(RefundRecord {
                sequence_number: envelope.sequence_number(),
                buyer: e.buyer,
                amount: e.amount,
                occurred_at: e.occurred_at,
            }),
            VendingEvent::ProductAdded(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vending_core::MachineId;
    use vending_events::ProjectionRunner;

    use super::*;
    use crate::events::{ProductAdded, ProductPurchased, RefundSent};

    fn log(machine_id: MachineId, alice: AccountId, bob: AccountId) -> Vec<EventEnvelope<VendingEvent>> {
        let at = Utc::now();
        let events = vec![
            VendingEvent::ProductAdded(ProductAdded {
                product_id: ProductId::new(1),
                name: "Coca Cola".to_string(),
                price: 10,
                stock: 5,
                occurred_at: at,
            }),
            VendingEvent::RefundSent(RefundSent {
                buyer: alice,
                amount: 5,
                occurred_at: at,
            }),
            VendingEvent::ProductPurchased(ProductPurchased {
                product_id: ProductId::new(1),
                buyer: alice,
                price: 10,
                occurred_at: at,
            }),
            VendingEvent::ProductPurchased(ProductPurchased {
                product_id: ProductId::new(1),
                buyer: bob,
                price: 10,
                occurred_at: at,
            }),
        ];

        events
            .into_iter()
            .enumerate()
            .map(|(i, e)| EventEnvelope::new(Uuid::now_v7(), machine_id, i as u64 + 1, e))
            .collect()
    }

    #[test]
    fn history_tracks_purchases_and_refunds_per_buyer() {
        let machine_id = MachineId::new();
        let alice = AccountId::new();
        let bob = AccountId::new();

        let mut runner = ProjectionRunner::new_for_machine(machine_id, PurchaseHistory::new());
        runner.run(&log(machine_id, alice, bob)).unwrap();
        let history = runner.projection();

        assert_eq!(history.purchases().len(), 2);
        assert_eq!(history.purchases()[0].sequence_number, 3);
        assert_eq!(history.purchases_by(alice).count(), 1);
        assert_eq!(history.total_spent(alice), 10);
        assert_eq!(history.total_refunded(alice), 5);
        assert_eq!(history.total_refunded(bob), 0);
        assert_eq!(history.total_revenue(), 20);
    }

    #[test]
    fn rebuild_matches_incremental_view() {
        let machine_id = MachineId::new();
        let envelopes = log(machine_id, AccountId::new(), AccountId::new());

        let mut runner = ProjectionRunner::new(PurchaseHistory::new());
        runner.run(&envelopes).unwrap();
        let (rebuilt, cursor) = ProjectionRunner::rebuild_from_scratch(PurchaseHistory::new, &envelopes).unwrap();

        assert_eq!(&rebuilt, runner.projection());
        assert_eq!(cursor.unwrap().last_sequence_number(), 4);
    }
}
