//! Settlement medium seam: how value leaves the machine.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use vending_core::{AccountId, Amount};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The recipient cannot accept value.
    #[error("recipient {0} rejected the transfer")]
    Rejected(AccountId),

    #[error("transfer medium unavailable: {0}")]
    Unavailable(String),
}

/// Moves value out of the machine (refunds, withdrawals).
///
/// A transfer either fully happens or fully fails; the engine relies on that to
/// keep its own state untouched when a transfer is refused.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, to: AccountId, amount: Amount) -> Result<(), TransferError>;
}

impl<T> ValueTransfer for Arc<T>
where
    T: ValueTransfer + ?Sized,
{
    fn transfer(&self, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(to, amount)
    }
}

/// In-memory settlement medium: records what each account received.
///
/// Accounts marked with `refuse` reject every transfer, which stands in for a
/// recipient that cannot accept value.
#[derive(Debug, Default)]
pub struct InMemoryWallets {
    received: RwLock<HashMap<AccountId, Amount>>,
    refusing: RwLock<HashSet<AccountId>>,
}

impl InMemoryWallets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, account: AccountId) {
        if let Ok(mut refusing) = self.refusing.write() {
            refusing.insert(account);
        }
    }

    pub fn accept(&self, account: AccountId) {
        if let Ok(mut refusing) = self.refusing.write() {
            refusing.remove(&account);
        }
    }

    /// Total value transferred to `account` so far.
    pub fn received(&self, account: AccountId) -> Amount {
        self.received
            .read()
            .ok()
            .and_then(|received| received.get(&account).copied())
            .unwrap_or(0)
    }

    pub fn total_paid_out(&self) -> Amount {
        self.received
            .read()
            .map(|received| received.values().sum())
            .unwrap_or(0)
    }
}

impl ValueTransfer for InMemoryWallets {
    fn transfer(&self, to: AccountId, amount: Amount) -> Result<(), TransferError> {
        let refusing = self
            .refusing
            .read()
            .map_err(|_| TransferError::Unavailable("lock poisoned".to_string()))?;
        if refusing.contains(&to) {
            return Err(TransferError::Rejected(to));
        }

        let mut received = self
            .received
            .write()
            .map_err(|_| TransferError::Unavailable("lock poisoned".to_string()))?;
        let entry = received.entry(to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Unavailable(format!("balance of {to} would overflow")))?;
        Ok(())
    }
}
