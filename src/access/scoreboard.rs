//! Scoreboard
//!
//! Admin-gated key-value store of scores. No escrow.

use std::collections::BTreeMap;

use tracing::info;

use crate::access::admin::AdminSlot;
use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};

/// Scores per account.
#[derive(Clone, Debug, Default)]
pub struct Scoreboard {
    admin: AdminSlot,
    scores: BTreeMap<AccountId, u64>,
}

impl Scoreboard {
    /// Create with an optional bootstrap admin.
    pub fn new(admin: Option<AccountId>) -> Self {
        Self {
            admin: AdminSlot::new(admin),
            scores: BTreeMap::new(),
        }
    }

    /// Claim the admin slot.
    pub fn init_admin(&mut self, caller: AccountId) -> ArcadeResult<()> {
        self.admin.init("scoreboard", caller)
    }

    /// Overwrite a score.
    pub fn set(&mut self, caller: &AccountId, player: AccountId, value: u64) -> ArcadeResult<u64> {
        self.admin.require(caller)?;
        self.scores.insert(player, value);
        info!(player = %player.short(), value, "Score set");
        Ok(value)
    }

    /// Add to a score. Returns the new total.
    pub fn add(&mut self, caller: &AccountId, player: AccountId, delta: u64) -> ArcadeResult<u64> {
        self.admin.require(caller)?;
        let total = self.get(&player).checked_add(delta).ok_or(ArcadeError::Overflow)?;
        self.scores.insert(player, total);
        info!(player = %player.short(), delta, total, "Score added");
        Ok(total)
    }

    /// Score of a player, zero if unknown.
    pub fn get(&self, player: &AccountId) -> u64 {
        self.scores.get(player).copied().unwrap_or(0)
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.admin.hash_into(hasher);
        hasher.update_u64(self.scores.len() as u64);
        for (player, score) in &self.scores {
            hasher.update_account(player);
            hasher.update_u64(*score);
        }
    }
}
