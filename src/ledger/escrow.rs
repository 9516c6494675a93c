//! Escrow Ledger
//!
//! Custodies every unit of value the engine touches:
//!
//! ```text
//! ┌──────────────┐  deposit   ┌─────────────────────┐  release  ┌──────────────┐
//! │   balances   │ ─────────► │ escrow[EscrowKey]   │ ────────► │   balances   │
//! │ (per account)│            │ held/deposited/paid │           │   or house   │
//! └──────────────┘            └─────────────────────┘           └──────────────┘
//!        │  fund_house                 ▲  reserve_from_house
//!        ▼                             │
//! ┌──────────────┐ ────────────────────┘
//! │  house pool  │
//! └──────────────┘
//! ```
//!
//! Each escrow account is attributed to exactly one record. A release is
//! checked as a whole before any balance moves, so a payout either fully
//! applies or fails with nothing changed.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::game::variant::GameVariant;

/// Record an escrow account belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EscrowKey {
    /// Commit-reveal wager.
    Wager(GameVariant, u64),
    /// Hot-potato game.
    HotPotato(u64),
    /// Lottery round.
    Lottery(u64),
    /// Tournament.
    Tournament(u64),
}

impl EscrowKey {
    fn hash_into(&self, hasher: &mut StateHasher) {
        match self {
            Self::Wager(variant, id) => {
                hasher.update_u8(0);
                hasher.update_u8(variant.tag());
                hasher.update_u64(*id);
            }
            Self::HotPotato(id) => {
                hasher.update_u8(1);
                hasher.update_u64(*id);
            }
            Self::Lottery(id) => {
                hasher.update_u8(2);
                hasher.update_u64(*id);
            }
            Self::Tournament(id) => {
                hasher.update_u8(3);
                hasher.update_u64(*id);
            }
        }
    }
}

/// Where released value goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payee {
    /// An account balance.
    Account(AccountId),
    /// The house pool.
    House,
}

/// Value attributed to one record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Currently held.
    pub held: u64,
    /// Total ever deposited (participants and house reserve).
    pub deposited: u64,
    /// Total ever released.
    pub paid_out: u64,
}

/// Balances, escrow accounts and the house pool.
#[derive(Clone, Debug, Default)]
pub struct EscrowLedger {
    balances: BTreeMap<AccountId, u64>,
    escrows: BTreeMap<EscrowKey, EscrowAccount>,
    house: u64,
}

impl EscrowLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spendable balance of an account.
    pub fn balance(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// House pool balance.
    pub fn house_balance(&self) -> u64 {
        self.house
    }

    /// Escrow account of a record, if it ever received value.
    pub fn escrow(&self, key: &EscrowKey) -> Option<&EscrowAccount> {
        self.escrows.get(key)
    }

    /// Value currently held for a record.
    pub fn held(&self, key: &EscrowKey) -> u64 {
        self.escrows.get(key).map(|e| e.held).unwrap_or(0)
    }

    /// Sum of every balance, escrow and the house.
    pub fn total_value(&self) -> u128 {
        let balances: u128 = self.balances.values().map(|v| *v as u128).sum();
        let escrowed: u128 = self.escrows.values().map(|e| e.held as u128).sum();
        balances + escrowed + self.house as u128
    }

    /// Add value to an account from outside the engine (genesis, host bridge).
    pub fn credit(&mut self, account: AccountId, amount: u64) -> ArcadeResult<u64> {
        let balance = self.balance(&account);
        let updated = balance.checked_add(amount).ok_or(ArcadeError::Overflow)?;
        self.balances.insert(account, updated);
        Ok(updated)
    }

    /// Fail unless `account` can pay `amount`.
    pub fn ensure_can_pay(&self, account: &AccountId, amount: u64) -> ArcadeResult<()> {
        if amount == 0 {
            return Err(ArcadeError::InvalidAmount);
        }
        let available = self.balance(account);
        if available < amount {
            return Err(ArcadeError::InsufficientFunds { need: amount, available });
        }
        Ok(())
    }

    /// Fail unless the house can reserve `amount`.
    pub fn ensure_house_covers(&self, amount: u64) -> ArcadeResult<()> {
        if self.house < amount {
            return Err(ArcadeError::InsufficientFunds { need: amount, available: self.house });
        }
        Ok(())
    }

    /// Move `amount` from an account into the house pool.
    pub fn fund_house(&mut self, from: AccountId, amount: u64) -> ArcadeResult<u64> {
        self.ensure_can_pay(&from, amount)?;
        let house = self.house.checked_add(amount).ok_or(ArcadeError::Overflow)?;
        self.debit(from, amount);
        self.house = house;
        Ok(house)
    }

    /// Seed the house pool from outside the engine.
    pub fn credit_house(&mut self, amount: u64) -> ArcadeResult<u64> {
        self.house = self.house.checked_add(amount).ok_or(ArcadeError::Overflow)?;
        Ok(self.house)
    }

    /// Move `amount` from an account into a record's escrow.
    pub fn deposit(&mut self, key: EscrowKey, from: AccountId, amount: u64) -> ArcadeResult<()> {
        self.ensure_can_pay(&from, amount)?;
        let updated = self.credited_escrow(&key, amount)?;
        self.debit(from, amount);
        self.escrows.insert(key, updated);
        debug!(?key, account = %from.short(), amount, "escrow deposit");
        Ok(())
    }

    /// Move `amount` from the house pool into a record's escrow.
    pub fn reserve_from_house(&mut self, key: EscrowKey, amount: u64) -> ArcadeResult<()> {
        if amount == 0 {
            return Ok(());
        }
        self.ensure_house_covers(amount)?;
        let updated = self.credited_escrow(&key, amount)?;
        self.house -= amount;
        self.escrows.insert(key, updated);
        debug!(?key, amount, "house reserve");
        Ok(())
    }

    /// Pay value out of a record's escrow.
    ///
    /// The whole payout set is checked against the held amount and every
    /// recipient balance before anything moves.
    pub fn release(&mut self, key: EscrowKey, payouts: &[(Payee, u64)]) -> ArcadeResult<()> {
        let account = self.escrows.get(&key).copied().unwrap_or_default();

        let mut total: u64 = 0;
        let mut per_account: BTreeMap<AccountId, u64> = BTreeMap::new();
        let mut to_house: u64 = 0;
        for (payee, amount) in payouts {
            total = total.checked_add(*amount).ok_or(ArcadeError::Overflow)?;
            match payee {
                Payee::Account(id) => {
                    let entry = per_account.entry(*id).or_insert(0);
                    *entry = entry.checked_add(*amount).ok_or(ArcadeError::Overflow)?;
                }
                Payee::House => {
                    to_house = to_house.checked_add(*amount).ok_or(ArcadeError::Overflow)?;
                }
            }
        }

        if total > account.held {
            return Err(ArcadeError::EscrowShortfall { payout: total, held: account.held });
        }

        let mut new_balances = Vec::with_capacity(per_account.len());
        for (id, amount) in &per_account {
            let updated = self.balance(id).checked_add(*amount).ok_or(ArcadeError::Overflow)?;
            new_balances.push((*id, updated));
        }
        let house = self.house.checked_add(to_house).ok_or(ArcadeError::Overflow)?;

        // Checked; apply.
        for (id, updated) in new_balances {
            self.balances.insert(id, updated);
        }
        self.house = house;
        self.escrows.insert(
            key,
            EscrowAccount {
                held: account.held - total,
                deposited: account.deposited,
                paid_out: account.paid_out + total,
            },
        );
        debug!(?key, total, "escrow release");
        Ok(())
    }

    /// Fold the ledger into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.house);
        hasher.update_u64(self.balances.len() as u64);
        for (account, balance) in &self.balances {
            hasher.update_account(account);
            hasher.update_u64(*balance);
        }
        hasher.update_u64(self.escrows.len() as u64);
        for (key, escrow) in &self.escrows {
            key.hash_into(hasher);
            hasher.update_u64(escrow.held);
            hasher.update_u64(escrow.deposited);
            hasher.update_u64(escrow.paid_out);
        }
    }

    fn credited_escrow(&self, key: &EscrowKey, amount: u64) -> ArcadeResult<EscrowAccount> {
        let mut account = self.escrows.get(key).copied().unwrap_or_default();
        account.held = account.held.checked_add(amount).ok_or(ArcadeError::Overflow)?;
        account.deposited = account.deposited.checked_add(amount).ok_or(ArcadeError::Overflow)?;
        Ok(account)
    }

    /// Caller has already checked the balance.
    fn debit(&mut self, account: AccountId, amount: u64) {
        let balance = self.balance(&account);
        self.balances.insert(account, balance - amount);
    }
}

// =============================================================================
// TESTS
// =============================================================================
