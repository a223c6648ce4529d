//! Scripted sessions against an in-memory machine.
//!
//! A script is JSON Lines: one command object per line, tagged by `"op"`.
//! Accounts are named by labels; the configured owner label is the machine
//! owner and every other label gets a fresh account on first use. Every
//! command produces exactly one JSON result line.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use vending_catalog::Product;
use vending_core::{AccountId, Amount, DomainError, DomainResult, ProductId};
use vending_events::{Event, InMemoryEventBus, ProjectionRunner, Subscription};
use vending_machine::{
    AddProduct, BuyProduct, Committed, InMemoryWallets, PurchaseHistory, VendingEnvelope, VendingEvent, VendingMachine,
    Withdraw,
};

use crate::seed::{SeedProduct, SeedReport, seed_machine};

pub type SessionMachine = VendingMachine<Arc<InMemoryWallets>, InMemoryEventBus<VendingEnvelope>>;

/// One script line. Amounts are whole units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptCommand {
    AddProduct {
        /// Defaults to the owner label.
        #[serde(default)]
        caller: Option<String>,
        id: u64,
        name: String,
        price: u64,
        #[serde(default)]
        stock: u64,
    },
    Buy {
        buyer: String,
        id: u64,
        payment: u64,
    },
    Withdraw {
        #[serde(default)]
        caller: Option<String>,
    },
    GetProduct {
        id: u64,
    },
    ListProducts,
    Count,
    Balance,
    /// Total value transferred to an account so far.
    Wallet {
        account: String,
    },
    /// Make an account refuse (or accept again) incoming transfers.
    RefuseTransfers {
        account: String,
        #[serde(default = "refuse_by_default")]
        refuse: bool,
    },
}

fn refuse_by_default() -> bool {
    true
}

impl ScriptCommand {
    pub fn op(&self) -> &'static str {
        match self {
            ScriptCommand::AddProduct { .. } => "add_product",
            ScriptCommand::Buy { .. } => "buy",
            ScriptCommand::Withdraw { .. } => "withdraw",
            ScriptCommand::GetProduct { .. } => "get_product",
            ScriptCommand::ListProducts => "list_products",
            ScriptCommand::Count => "count",
            ScriptCommand::Balance => "balance",
            ScriptCommand::Wallet { .. } => "wallet",
            ScriptCommand::RefuseTransfers { .. } => "refuse_transfers",
        }
    }
}

/// Label to account mapping, in first-use order.
#[derive(Debug, Clone)]
pub struct Accounts {
    owner_label: String,
    labels: Vec<(String, AccountId)>,
    index: HashMap<String, usize>,
}

impl Accounts {
    pub fn new(owner_label: impl Into<String>, owner: AccountId) -> Self {
        let owner_label = owner_label.into();
        let mut accounts = Self {
            owner_label: owner_label.clone(),
            labels: Vec::new(),
            index: HashMap::new(),
        };
        accounts.insert(owner_label, owner);
        accounts
    }

    fn insert(&mut self, label: String, account: AccountId) {
        self.index.insert(label.clone(), self.labels.len());
        self.labels.push((label, account));
    }

    pub fn owner_label(&self) -> &str {
        &self.owner_label
    }

    /// Account for `label`, creating one on first use.
    pub fn resolve(&mut self, label: &str) -> AccountId {
        if let Some(&slot) = self.index.get(label) {
            return self.labels[slot].1;
        }
        let account = AccountId::new();
        self.insert(label.to_string(), account);
        account
    }

    pub fn label_of(&self, account: AccountId) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, id)| *id == account)
            .map(|(label, _)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, AccountId)> + '_ {
        self.labels.iter().map(|(label, id)| (label.as_str(), *id))
    }
}

/// Counts of a finished run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub commands: usize,
    pub rejected: usize,
}

/// A machine plus the bookkeeping a script needs around it.
pub struct Session {
    machine: SessionMachine,
    wallets: Arc<InMemoryWallets>,
    accounts: Accounts,
    subscription: Subscription<VendingEnvelope>,
    history: ProjectionRunner<PurchaseHistory>,
}

impl Session {
    pub fn new(owner_label: &str) -> Self {
        let owner = AccountId::new();
        let wallets = Arc::new(InMemoryWallets::new());
        let machine = VendingMachine::new(owner, wallets.clone(), InMemoryEventBus::new());
        let subscription = machine.subscribe();
        let history = ProjectionRunner::new_for_machine(machine.machine_id(), PurchaseHistory::new());

        tracing::info!(machine_id = %machine.machine_id(), owner = %owner, "session started");

        Self {
            machine,
            wallets,
            accounts: Accounts::new(owner_label, owner),
            subscription,
            history,
        }
    }

    pub fn machine(&self) -> &SessionMachine {
        &self.machine
    }

    pub fn accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn seed(&mut self, products: &[SeedProduct]) -> SeedReport {
        seed_machine(&self.machine, self.machine.owner(), products)
    }

    /// Execute one command and render its result line.
    pub fn execute(&mut self, command: ScriptCommand) -> Value {
        let op = command.op();
        match self.dispatch(command) {
            Ok(mut result) => {
                if let Value::Object(map) = &mut result {
                    map.insert("ok".to_string(), Value::Bool(true));
                    map.insert("op".to_string(), Value::from(op));
                }
                result
            }
            Err(err) => rejection(op, &err),
        }
    }

    /// Parse and execute one script line.
    pub fn execute_line(&mut self, line: &str) -> Value {
        match serde_json::from_str::<ScriptCommand>(line) {
            Ok(command) => self.execute(command),
            Err(err) => {
                tracing::warn!(error = %err, "unreadable script line");
                json!({
                    "ok": false,
                    "error": "invalid_command",
                    "message": err.to_string(),
                })
            }
        }
    }

    /// Run every non-blank line of `input`, writing one result line each.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (number, line) in input.lines().enumerate() {
            let line = line.with_context(|| format!("failed to read script line {}", number + 1))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let result = self.execute_line(line);
            summary.commands += 1;
            if result["ok"] == Value::Bool(false) {
                summary.rejected += 1;
            }
            writeln!(out, "{result}").context("failed to write result")?;
        }

        Ok(summary)
    }

    /// Purchase history built from everything published so far.
    pub fn history(&mut self) -> &PurchaseHistory {
        for envelope in self.subscription.drain() {
            if let Err(err) = self.history.apply(&envelope) {
                tracing::warn!(error = %err, "envelope skipped by purchase history");
            }
        }
        self.history.projection()
    }

    pub fn history_summary(&mut self) -> Value {
        self.history();
        let history = self.history.projection();

        let buyers: Vec<Value> = self
            .accounts
            .iter()
            .filter(|(_, account)| history.purchases_by(*account).next().is_some())
            .map(|(label, account)| {
                json!({
                    "account": label,
                    "purchases": history.purchases_by(account).count(),
                    "spent": amount_value(history.total_spent(account)),
                    "refunded": amount_value(history.total_refunded(account)),
                })
            })
            .collect();

        json!({
            "history": {
                "purchases": history.purchases().len(),
                "refunds": history.refunds().len(),
                "revenue": amount_value(history.total_revenue()),
                "buyers": buyers,
            }
        })
    }

    /// Final machine state in the `MachineSnapshot` layout, with amounts
    /// rendered through `amount_value`.
    pub fn snapshot(&self) -> anyhow::Result<Value> {
        let snapshot = self.machine.snapshot()?;
        let products: Vec<Value> = snapshot.products.iter().map(product_value).collect();
        Ok(json!({
            "snapshot": {
                "machine_id": snapshot.machine_id.to_string(),
                "owner": snapshot.owner.to_string(),
                "balance": amount_value(snapshot.balance),
                "next_sequence": snapshot.next_sequence,
                "products": products,
            }
        }))
    }

    fn dispatch(&mut self, command: ScriptCommand) -> DomainResult<Value> {
        match command {
            ScriptCommand::AddProduct {
                caller,
                id,
                name,
                price,
                stock,
            } => {
                let caller = self.caller(caller);
                let committed = self.machine.add_product(AddProduct {
                    caller,
                    product_id: ProductId::new(id),
                    name,
                    price: Amount::from(price),
                    stock,
                    occurred_at: Utc::now(),
                })?;
                Ok(json!({
                    "product": product_value(&committed.value),
                    "events": event_types(&committed),
                }))
            }
            ScriptCommand::Buy { buyer, id, payment } => {
                let buyer = self.accounts.resolve(&buyer);
                let committed = self.machine.buy_product(BuyProduct {
                    buyer,
                    product_id: ProductId::new(id),
                    payment: Amount::from(payment),
                    occurred_at: Utc::now(),
                })?;
                let refund: Amount = committed
                    .payloads()
                    .map(|event| match event {
                        VendingEvent::RefundSent(refund) => refund.amount,
                        _ => 0,
                    })
                    .sum();
                Ok(json!({
                    "charged": amount_value(committed.value),
                    "refund": amount_value(refund),
                    "events": event_types(&committed),
                }))
            }
            ScriptCommand::Withdraw { caller } => {
                let caller = self.caller(caller);
                let amount = self.machine.withdraw(Withdraw { caller })?;
                Ok(json!({ "amount": amount_value(amount) }))
            }
            ScriptCommand::GetProduct { id } => {
                let product = self.machine.get_product(ProductId::new(id))?;
                Ok(json!({ "product": product_value(&product) }))
            }
            ScriptCommand::ListProducts => {
                let products: Vec<Value> = self.machine.get_products()?.iter().map(product_value).collect();
                Ok(json!({ "products": products }))
            }
            ScriptCommand::Count => Ok(json!({ "count": self.machine.product_count()? })),
            ScriptCommand::Balance => Ok(json!({ "balance": amount_value(self.machine.balance()?) })),
            ScriptCommand::Wallet { account } => {
                let id = self.accounts.resolve(&account);
                Ok(json!({
                    "account": account,
                    "received": amount_value(self.wallets.received(id)),
                }))
            }
            ScriptCommand::RefuseTransfers { account, refuse } => {
                let id = self.accounts.resolve(&account);
                if refuse {
                    self.wallets.refuse(id);
                } else {
                    self.wallets.accept(id);
                }
                Ok(json!({ "account": account, "refusing": refuse }))
            }
        }
    }

    fn caller(&mut self, label: Option<String>) -> AccountId {
        match label {
            Some(label) => self.accounts.resolve(&label),
            None => self.machine.owner(),
        }
    }
}

fn rejection(op: &str, err: &DomainError) -> Value {
    json!({
        "ok": false,
        "op": op,
        "error": err.code(),
        "message": err.to_string(),
    })
}

/// JSON number when it fits in `u64`, decimal string otherwise.
pub fn amount_value(amount: Amount) -> Value {
    match u64::try_from(amount) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(amount.to_string()),
    }
}

pub fn product_value(product: &Product) -> Value {
    json!({
        "id": product.id().get(),
        "name": product.name(),
        "price": amount_value(product.price()),
        "stock": product.stock(),
    })
}

fn event_types<T>(committed: &Committed<T>) -> Vec<&'static str> {
    committed.payloads().map(|event| event.event_type()).collect()
}
