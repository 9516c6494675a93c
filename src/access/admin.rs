//! Admin Slot
//!
//! Each access-controlled table owns exactly one admin account, set once
//! (from configuration or by the first `init-admin` caller) and checked on
//! every privileged call.

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};

/// Single-assignment admin account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSlot {
    admin: Option<AccountId>,
}

impl AdminSlot {
    /// Slot with an optional bootstrap admin.
    pub fn new(admin: Option<AccountId>) -> Self {
        Self { admin }
    }

    /// Current admin.
    pub fn admin(&self) -> Option<AccountId> {
        self.admin
    }

    /// Claim the slot. Only succeeds while it is empty.
    pub fn init(&mut self, table: &'static str, caller: AccountId) -> ArcadeResult<()> {
        if self.admin.is_some() {
            return Err(ArcadeError::WrongState("admin already set"));
        }
        self.admin = Some(caller);
        info!(table, admin = %caller.short(), "Admin initialized");
        Ok(())
    }

    /// Fail with `Unauthorized` unless `caller` is the admin.
    pub fn require(&self, caller: &AccountId) -> ArcadeResult<()> {
        match &self.admin {
            Some(admin) if admin == caller => Ok(()),
            _ => Err(ArcadeError::Unauthorized),
        }
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_opt_account(self.admin.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_caller_claims() {
        let a = AccountId::from_label("wallet_1");
        let b = AccountId::from_label("wallet_2");
        let mut slot = AdminSlot::default();

        assert_eq!(slot.require(&a), Err(ArcadeError::Unauthorized));
        slot.init("scoreboard", a).unwrap();
        assert!(slot.require(&a).is_ok());
        assert_eq!(slot.require(&b), Err(ArcadeError::Unauthorized));
        assert!(matches!(slot.init("scoreboard", b), Err(ArcadeError::WrongState(_))));
        assert_eq!(slot.admin(), Some(a));
    }

    #[test]
    fn test_bootstrap_admin() {
        let a = AccountId::from_label("deployer");
        let slot = AdminSlot::new(Some(a));
        assert!(slot.require(&a).is_ok());
    }
}
