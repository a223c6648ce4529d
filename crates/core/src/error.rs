//! Domain error model.

use thiserror::Error;

use crate::{AccountId, Amount, ProductId};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a rejected call with no partial effect. Variants are kept
/// distinct so callers can tell "pay more" apart from "sold out" and from
/// "not allowed".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The identifier is reserved or unparseable (e.g. product id `0`).
    #[error("invalid product identifier: {0}")]
    InvalidIdentifier(String),

    /// A product with this identifier already exists.
    #[error("product {0} already exists")]
    DuplicateIdentifier(ProductId),

    /// Unit prices must be strictly positive.
    #[error("price must be greater than 0")]
    InvalidPrice,

    #[error("product name cannot be empty")]
    InvalidName,

    #[error("product {0} does not exist")]
    ProductNotFound(ProductId),

    #[error("product {0} is out of stock")]
    OutOfStock(ProductId),

    #[error("insufficient payment: required {required}, offered {offered}")]
    InsufficientPayment { required: Amount, offered: Amount },

    /// Caller is not the owner of the machine.
    #[error("caller {0} is not the owner")]
    Unauthorized(AccountId),

    /// The settlement medium refused a refund or withdrawal.
    #[error("transfer of {amount} to {recipient} failed: {reason}")]
    TransferFailed {
        recipient: AccountId,
        amount: Amount,
        reason: String,
    },

    /// Crediting the ledger would exceed the representable balance.
    #[error("ledger balance overflow")]
    LedgerOverflow,

    /// Internal state lock was poisoned by a panicking writer.
    #[error("machine state unavailable (lock poisoned)")]
    Poisoned,
}

impl DomainError {
    pub fn invalid_id(raw: impl Into<String>) -> Self {
        Self::InvalidIdentifier(raw.into())
    }

    pub fn transfer_failed(recipient: AccountId, amount: Amount, reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            recipient,
            amount,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for this rejection.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidIdentifier(_) => "invalid_identifier",
            DomainError::DuplicateIdentifier(_) => "duplicate_identifier",
            DomainError::InvalidPrice => "invalid_price",
            DomainError::InvalidName => "invalid_name",
            DomainError::ProductNotFound(_) => "product_not_found",
            DomainError::OutOfStock(_) => "out_of_stock",
            DomainError::InsufficientPayment { .. } => "insufficient_payment",
            DomainError::Unauthorized(_) => "unauthorized",
            DomainError::TransferFailed { .. } => "transfer_failed",
            DomainError::LedgerOverflow => "ledger_overflow",
            DomainError::Poisoned => "poisoned",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let account = AccountId::new();
        let errors = [
            DomainError::invalid_id("0"),
            DomainError::DuplicateIdentifier(ProductId::new(1)),
            DomainError::InvalidPrice,
            DomainError::InvalidName,
            DomainError::ProductNotFound(ProductId::new(1)),
            DomainError::OutOfStock(ProductId::new(1)),
            DomainError::InsufficientPayment {
                required: 10,
                offered: 5,
            },
            DomainError::Unauthorized(account),
            DomainError::transfer_failed(account, 1, "rejected"),
            DomainError::LedgerOverflow,
            DomainError::Poisoned,
        ];

        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn messages_name_the_failed_precondition() {
        let err = DomainError::InsufficientPayment {
            required: 10,
            offered: 5,
        };
        assert_eq!(err.to_string(), "insufficient payment: required 10, offered 5");
        assert_eq!(
            DomainError::OutOfStock(ProductId::new(3)).to_string(),
            "product 3 is out of stock"
        );
    }
}
