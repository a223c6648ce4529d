//! Purchase/settlement engine.
//!
//! Every mutating call runs under the write guard of one `RwLock` that covers
//! the catalog, the ledger balance and the event sequence counter:
//!
//! ```text
//! call
//!   ↓
//! 1. Authorize (administrative calls only)
//!   ↓
//! 2. Decide against the locked state (no mutation)
//!   ↓
//! 3. Transfer value out (refund / withdrawal); failure ends the call here
//!   ↓
//! 4. Commit catalog + balance changes
//!   ↓
//! 5. Envelope the events, publish them, return them
//! ```
//!
//! Because nothing is written before step 4, a refused transfer leaves the
//! state exactly as it was before the call.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use vending_catalog::{Catalog, Product};
use vending_core::{AccountId, Amount, DomainError, DomainResult, MachineId, ProductId};
use vending_events::{Event, EventBus, EventEnvelope, Subscription};

use crate::access::Ownership;
use crate::command::{AddProduct, BuyProduct, Withdraw};
use crate::events::{ProductAdded, ProductPurchased, RefundSent, VendingEvent};
use crate::snapshot::MachineSnapshot;
use crate::transfer::ValueTransfer;

/// Envelope type published by the machine.
pub type VendingEnvelope = EventEnvelope<VendingEvent>;

/// Result of a committed mutating call: its value plus the envelopes it
/// appended, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    pub value: T,
    pub events: Vec<VendingEnvelope>,
}

impl<T> Committed<T> {
    pub fn payloads(&self) -> impl Iterator<Item = &VendingEvent> {
        self.events.iter().map(|env| env.payload())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MachineState {
    pub(crate) catalog: Catalog,
    pub(crate) balance: Amount,
    pub(crate) next_sequence: u64,
}

impl Default for MachineState {
    fn default() -> Self {
        Self {
            catalog: Catalog::new(),
            balance: 0,
            next_sequence: 1,
        }
    }
}

/// A purchase that passed every check but has not touched the state yet.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct PurchasePlan {
    price: Amount,
    refund: Amount,
    balance_after: Amount,
}

impl MachineState {
    fn plan_purchase(&self, cmd: &BuyProduct) -> DomainResult<PurchasePlan> {
        // Existence first, then stock, then payment.
        let product = self.catalog.get(cmd.product_id)?;
        if !product.in_stock() {
            return Err(DomainError::OutOfStock(cmd.product_id));
        }

        let price = product.price();
        if cmd.payment < price {
            return Err(DomainError::InsufficientPayment {
                required: price,
                offered: cmd.payment,
            });
        }

        let balance_after = self
            .balance
            .checked_add(price)
            .ok_or(DomainError::LedgerOverflow)?;

        Ok(PurchasePlan {
            price,
            refund: cmd.payment - price,
            balance_after,
        })
    }
}

/// The vending ledger engine.
///
/// Constructed once per deployment with a fixed owner; there is no global
/// instance. Share it across threads by reference or `Arc`.
#[derive(Debug)]
pub struct VendingMachine<T, B> {
    machine_id: MachineId,
    access: Ownership,
    state: RwLock<MachineState>,
    transfers: T,
    bus: B,
}

impl<T, B> VendingMachine<T, B> {
    /// Empty catalog, zero balance, fixed owner.
    pub fn new(owner: AccountId, transfers: T, bus: B) -> Self {
        Self {
            machine_id: MachineId::new(),
            access: Ownership::new(owner),
            state: RwLock::new(MachineState::default()),
            transfers,
            bus,
        }
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    pub fn owner(&self) -> AccountId {
        self.access.owner()
    }

    pub fn transfers(&self) -> &T {
        &self.transfers
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, MachineState>> {
        self.state.read().map_err(|_| DomainError::Poisoned)
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, MachineState>> {
        self.state.write().map_err(|_| DomainError::Poisoned)
    }

    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        Ok(self.read()?.catalog.get(id)?.clone())
    }

    /// All products in insertion order.
    pub fn get_products(&self) -> DomainResult<Vec<Product>> {
        Ok(self.read()?.catalog.list().cloned().collect())
    }

    pub fn product_count(&self) -> DomainResult<usize> {
        Ok(self.read()?.catalog.len())
    }

    /// Funds collected and not yet withdrawn.
    pub fn balance(&self) -> DomainResult<Amount> {
        Ok(self.read()?.balance)
    }

    /// Capture the persisted state layout (see `MachineSnapshot`).
    pub fn snapshot(&self) -> DomainResult<MachineSnapshot> {
        let state = self.read()?;
        Ok(MachineSnapshot {
            machine_id: self.machine_id,
            owner: self.access.owner(),
            balance: state.balance,
            next_sequence: state.next_sequence,
            products: state.catalog.list().cloned().collect(),
        })
    }

    /// Rebuild an engine from a snapshot, re-validating every product.
    pub fn from_snapshot(snapshot: MachineSnapshot, transfers: T, bus: B) -> DomainResult<Self> {
        let state = snapshot.restore_state()?;
        Ok(Self {
            machine_id: snapshot.machine_id,
            access: Ownership::new(snapshot.owner),
            state: RwLock::new(state),
            transfers,
            bus,
        })
    }
}

impl<T, B> VendingMachine<T, B>
where
    T: ValueTransfer,
    B: EventBus<VendingEnvelope>,
{
    pub fn subscribe(&self) -> Subscription<VendingEnvelope> {
        self.bus.subscribe()
    }

    /// Add a product to the catalog (owner only).
    pub fn add_product(&self, cmd: AddProduct) -> DomainResult<Committed<Product>> {
        self.access.authorize(cmd.caller).inspect_err(|err| {
            tracing::debug!(caller = %cmd.caller, error = %err, "add_product rejected");
        })?;

        let mut state = self.write()?;
        let product = state
            .catalog
            .add(cmd.to_new_product())
            .inspect_err(|err| {
                tracing::debug!(product_id = %cmd.product_id, error = %err, "add_product rejected");
            })?
            .clone();

        let event = VendingEvent::ProductAdded(ProductAdded {
            product_id: product.id(),
            name: product.name().to_string(),
            price: product.price(),
            stock: product.stock(),
            occurred_at: cmd.occurred_at,
        });
        let events = self.append(&mut state, vec![event]);

        tracing::info!(
            product_id = %product.id(),
            price = %product.price(),
            stock = product.stock(),
            "product added"
        );

        Ok(Committed {
            value: product,
            events,
        })
    }

    /// Buy one unit of a product. Returns the unit price charged.
    ///
    /// Any payment above the price is transferred back to the buyer before the
    /// purchase commits; if that transfer fails the purchase does not happen.
    pub fn buy_product(&self, cmd: BuyProduct) -> DomainResult<Committed<Amount>> {
        let mut state = self.write()?;
        let plan = state.plan_purchase(&cmd).inspect_err(|err| {
            tracing::debug!(
                product_id = %cmd.product_id,
                buyer = %cmd.buyer,
                payment = %cmd.payment,
                error = %err,
                "purchase rejected"
            );
        })?;

        if plan.refund > 0 {
            self.transfers
                .transfer(cmd.buyer, plan.refund)
                .map_err(|e| DomainError::transfer_failed(cmd.buyer, plan.refund, e.to_string()))
                .inspect_err(|err| {
                    tracing::warn!(
                        product_id = %cmd.product_id,
                        buyer = %cmd.buyer,
                        error = %err,
                        "refund failed; purchase rolled back"
                    );
                })?;
        }

        // Checked under the same guard by `plan_purchase`.
        let charged = state.catalog.decrement_stock(cmd.product_id)?;
        debug_assert_eq!(charged, plan.price);
        state.balance = plan.balance_after;

        let mut decided = Vec::with_capacity(2);
        if plan.refund > 0 {
            decided.push(VendingEvent::RefundSent(RefundSent {
                buyer: cmd.buyer,
                amount: plan.refund,
                occurred_at: cmd.occurred_at,
            }));
        }
        decided.push(VendingEvent::ProductPurchased(ProductPurchased {
            product_id: cmd.product_id,
            buyer: cmd.buyer,
            price: plan.price,
            occurred_at: cmd.occurred_at,
        }));
        let events = self.append(&mut state, decided);

        tracing::info!(
            product_id = %cmd.product_id,
            buyer = %cmd.buyer,
            price = %plan.price,
            refund = %plan.refund,
            "product purchased"
        );

        Ok(Committed {
            value: plan.price,
            events,
        })
    }

    /// Transfer the whole balance to the owner (owner only).
    ///
    /// A zero balance is a successful no-op: nothing is transferred and `0` is
    /// returned.
    pub fn withdraw(&self, cmd: Withdraw) -> DomainResult<Amount> {
        self.access.authorize(cmd.caller).inspect_err(|err| {
            tracing::debug!(caller = %cmd.caller, error = %err, "withdraw rejected");
        })?;

        let mut state = self.write()?;
        let amount = state.balance;
        if amount == 0 {
            tracing::info!("withdraw requested with zero balance; nothing to transfer");
            return Ok(0);
        }

        let owner = self.access.owner();
        self.transfers
            .transfer(owner, amount)
            .map_err(|e| DomainError::transfer_failed(owner, amount, e.to_string()))
            .inspect_err(|err| {
                tracing::warn!(error = %err, "withdraw failed; balance kept");
            })?;
        state.balance = 0;

        tracing::info!(amount = %amount, "funds withdrawn");
        Ok(amount)
    }

    /// Envelope, sequence and publish events of a committed call.
    fn append(&self, state: &mut MachineState, decided: Vec<VendingEvent>) -> Vec<VendingEnvelope> {
        let mut committed = Vec::with_capacity(decided.len());
        for event in decided {
            let envelope = EventEnvelope::new(Uuid::now_v7(), self.machine_id, state.next_sequence, event);
            state.next_sequence += 1;

            tracing::debug!(
                sequence_number = envelope.sequence_number(),
                schema = %envelope.payload().schema(),
                "event appended"
            );
            // The call is already committed; a failing sink must not undo it.
            if let Err(err) = self.bus.publish(envelope.clone()) {
                tracing::warn!(
                    sequence_number = envelope.sequence_number(),
                    schema = %envelope.payload().schema(),
                    error = ?err,
                    "failed to publish event"
                );
            }
            committed.push(envelope);
        }
        committed
    }
}
