use vending_core::{AccountId, DomainError, DomainResult};

/// Single-owner access policy.
///
/// The owner is fixed when the machine is constructed; there is no transfer of
/// ownership. Every administrative call is checked here before any other
/// validation runs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ownership {
    owner: AccountId,
}

impl Ownership {
    pub fn new(owner: AccountId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> AccountId {
        self.owner
    }

    pub fn is_owner(&self, caller: AccountId) -> bool {
        caller == self.owner
    }

    /// Authorize an administrative call.
    ///
    /// - No IO
    /// - No panics
    pub fn authorize(&self, caller: AccountId) -> DomainResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized(caller))
        }
    }
}
