//! Hot Potato
//!
//! Not commit-reveal: a single holder pointer and a countdown. The first
//! taker matches the creator's stake and becomes the opponent; after that
//! only the two players may take. Every take resets the timer. Once the
//! timer runs out, `settle` pays the whole pot to whoever holds the potato.
//! A pass is irreversible, so cancellation is only possible before the
//! first take.

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::{EscrowKey, Payee, Registry, TxContext};

/// Hot-potato lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PotatoStatus {
    /// Timer running.
    Open,
    /// Pot paid to the holder.
    Settled,
    /// Withdrawn before any pass.
    Cancelled,
}

/// One hot-potato game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotPotatoGame {
    /// Identifier.
    pub id: u64,
    /// Creator and first holder.
    pub creator: AccountId,
    /// First taker.
    pub opponent: Option<AccountId>,
    /// Current holder.
    pub holder: AccountId,
    /// Stake per player.
    pub stake: u64,
    /// Number of takes so far.
    pub passes: u32,
    /// Status.
    pub status: PotatoStatus,
    /// Creation height.
    pub created_at: u64,
    /// Height at which the timer runs out.
    pub deadline: u64,
    /// Account paid at settlement.
    pub winner: Option<AccountId>,
}

impl HotPotatoGame {
    /// Numeric status: 0 open, 1 settled, 2 cancelled.
    pub fn status_code(&self) -> u8 {
        match self.status {
            PotatoStatus::Open => 0,
            PotatoStatus::Settled => 1,
            PotatoStatus::Cancelled => 2,
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id);
        hasher.update_account(&self.creator);
        hasher.update_opt_account(self.opponent.as_ref());
        hasher.update_account(&self.holder);
        hasher.update_u64(self.stake);
        hasher.update_u32(self.passes);
        hasher.update_u8(self.status_code());
        hasher.update_u64(self.created_at);
        hasher.update_u64(self.deadline);
        hasher.update_opt_account(self.winner.as_ref());
    }
}

/// All hot-potato games.
#[derive(Clone, Debug)]
pub struct HotPotatoTable {
    timer: u64,
    games: Registry<HotPotatoGame>,
}

impl HotPotatoTable {
    /// Create an empty table with the given countdown.
    pub fn new(timer: u64) -> Self {
        Self {
            timer,
            games: Registry::new("hot-potato game"),
        }
    }

    /// Look up a game.
    pub fn get(&self, id: u64) -> Option<&HotPotatoGame> {
        self.games.get(id)
    }

    /// Stake and take the potato first.
    pub fn create(&mut self, tx: &mut TxContext<'_>, stake: u64) -> ArcadeResult<u64> {
        if stake == 0 {
            return Err(ArcadeError::InvalidAmount);
        }
        let deadline = tx.height.checked_add(self.timer).ok_or(ArcadeError::Overflow)?;
        let key = EscrowKey::HotPotato(self.games.next_id());
        tx.escrow.deposit(key, tx.caller, stake)?;

        let creator = tx.caller;
        let height = tx.height;
        let id = self.games.allocate(|id| HotPotatoGame {
            id,
            creator,
            opponent: None,
            holder: creator,
            stake,
            passes: 0,
            status: PotatoStatus::Open,
            created_at: height,
            deadline,
            winner: None,
        });

        info!(game_id = id, creator = %creator.short(), stake, deadline, "Hot potato created");
        Ok(id)
    }

    /// Grab the potato and restart the timer.
    pub fn take(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<()> {
        let game = self.games.require(id)?;
        if game.status != PotatoStatus::Open {
            return Err(ArcadeError::WrongState("game is not open"));
        }
        if tx.height >= game.deadline {
            return Err(ArcadeError::DeadlinePassed { deadline: game.deadline, now: tx.height });
        }
        if tx.caller == game.holder {
            return Err(ArcadeError::WrongState("caller already holds the potato"));
        }
        let joining = match game.opponent {
            None => true,
            Some(opponent) if tx.caller == opponent || tx.caller == game.creator => false,
            Some(_) => return Err(ArcadeError::Unauthorized),
        };
        let passes = game.passes.checked_add(1).ok_or(ArcadeError::Overflow)?;
        let deadline = tx.height.checked_add(self.timer).ok_or(ArcadeError::Overflow)?;

        if joining {
            tx.escrow.deposit(EscrowKey::HotPotato(id), tx.caller, game.stake)?;
        }

        let game = self.games.require_mut(id)?;
        if joining {
            game.opponent = Some(tx.caller);
        }
        game.holder = tx.caller;
        game.passes = passes;
        game.deadline = deadline;

        info!(game_id = id, holder = %tx.caller.short(), passes, deadline, "Potato taken");
        Ok(())
    }

    /// Pay the pot to the holder once the timer ran out. Callable by anyone.
    pub fn settle(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<AccountId> {
        let key = EscrowKey::HotPotato(id);
        let game = self.games.require(id)?;
        if game.status != PotatoStatus::Open {
            return Err(ArcadeError::WrongState("game is not open"));
        }
        if tx.height < game.deadline {
            return Err(ArcadeError::DeadlineNotReached { deadline: game.deadline, now: tx.height });
        }

        let winner = game.holder;
        let pot = tx.escrow.held(&key);
        tx.escrow.release(key, &[(Payee::Account(winner), pot)])?;

        let game = self.games.require_mut(id)?;
        game.status = PotatoStatus::Settled;
        game.winner = Some(winner);

        info!(game_id = id, winner = %winner.short(), pot, "Hot potato settled");
        Ok(winner)
    }

    /// Creator withdraws before anyone took the potato.
    pub fn cancel(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<()> {
        let key = EscrowKey::HotPotato(id);
        let game = self.games.require(id)?;
        if tx.caller != game.creator {
            return Err(ArcadeError::Unauthorized);
        }
        if game.status != PotatoStatus::Open || game.passes > 0 {
            return Err(ArcadeError::WrongState("potato already passed"));
        }

        let refund = tx.escrow.held(&key);
        tx.escrow.release(key, &[(Payee::Account(game.creator), refund)])?;

        let game = self.games.require_mut(id)?;
        game.status = PotatoStatus::Cancelled;

        warn!(game_id = id, refund, "Hot potato cancelled");
        Ok(())
    }

    /// Fold the table into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.games.next_id());
        for (_, game) in self.games.iter() {
            game.hash_into(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use super::*;
    use crate::core::clock::LedgerClock;
    use crate::core::rng::FixedSeed;
    use crate::ledger::EscrowLedger;

    const STAKE: u64 = 1_000_000;

    fn p(label: &str) -> AccountId {
        AccountId::from_label(label)
    }

    fn setup() -> (EscrowLedger, FixedSeed) {
        let mut escrow = EscrowLedger::new();
        for name in ["wallet_1", "wallet_2", "wallet_3"] {
            escrow.credit(p(name), 5 * STAKE).unwrap();
        }
        (escrow, FixedSeed(0))
    }

    fn genesis() -> &'static LedgerClock {
        static CLOCK: OnceLock<LedgerClock> = OnceLock::new();
        CLOCK.get_or_init(LedgerClock::default)
    }

    fn tx<'a>(
        escrow: &'a mut EscrowLedger,
        seed: &'a FixedSeed,
        caller: &str,
        height: u64,
    ) -> TxContext<'a> {
        TxContext {
            caller: p(caller),
            height,
            clock: genesis(),
            escrow,
            randomness: seed,
        }
    }

    #[test]
    fn test_take_then_settle_pays_holder() {
        let (mut escrow, seed) = setup();
        let mut table = HotPotatoTable::new(30);

        let id = table.create(&mut tx(&mut escrow, &seed, "wallet_1", 0), STAKE).unwrap();
        table.take(&mut tx(&mut escrow, &seed, "wallet_2", 0), id).unwrap();
        assert_eq!(escrow.held(&EscrowKey::HotPotato(id)), 2 * STAKE);

        let early = table.settle(&mut tx(&mut escrow, &seed, "wallet_1", 29), id).unwrap_err();
        assert!(matches!(early, ArcadeError::DeadlineNotReached { deadline: 30, now: 29 }));

        let winner = table.settle(&mut tx(&mut escrow, &seed, "wallet_1", 40), id).unwrap();
        assert_eq!(winner, p("wallet_2"));
        assert_eq!(escrow.balance(&p("wallet_2")), 6 * STAKE);
        assert_eq!(escrow.balance(&p("wallet_1")), 4 * STAKE);
        assert_eq!(table.get(id).unwrap().status_code(), 1);
    }

    #[test]
    fn test_take_resets_timer_and_restricts_players() {
        let (mut escrow, seed) = setup();
        let mut table = HotPotatoTable::new(30);
        let id = table.create(&mut tx(&mut escrow, &seed, "wallet_1", 0), STAKE).unwrap();
        table.take(&mut tx(&mut escrow, &seed, "wallet_2", 20), id).unwrap();
        assert_eq!(table.get(id).unwrap().deadline, 50);

        let again = table.take(&mut tx(&mut escrow, &seed, "wallet_2", 21), id).unwrap_err();
        assert!(matches!(again, ArcadeError::WrongState(_)));

        let outsider = table.take(&mut tx(&mut escrow, &seed, "wallet_3", 21), id).unwrap_err();
        assert_eq!(outsider, ArcadeError::Unauthorized);

        table.take(&mut tx(&mut escrow, &seed, "wallet_1", 45), id).unwrap();
        let game = table.get(id).unwrap();
        assert_eq!(game.holder, p("wallet_1"));
        assert_eq!(game.passes, 2);
        assert_eq!(game.deadline, 75);
        // No second deposit from the creator.
        assert_eq!(escrow.held(&EscrowKey::HotPotato(id)), 2 * STAKE);

        let late = table.take(&mut tx(&mut escrow, &seed, "wallet_2", 75), id).unwrap_err();
        assert!(matches!(late, ArcadeError::DeadlinePassed { .. }));
    }

    #[test]
    fn test_cancel_blocked_after_pass() {
        let (mut escrow, seed) = setup();
        let mut table = HotPotatoTable::new(30);
        let id = table.create(&mut tx(&mut escrow, &seed, "wallet_1", 0), STAKE).unwrap();
        table.take(&mut tx(&mut escrow, &seed, "wallet_2", 1), id).unwrap();

        let err = table.cancel(&mut tx(&mut escrow, &seed, "wallet_1", 2), id).unwrap_err();
        assert!(matches!(err, ArcadeError::WrongState(_)));
    }

    #[test]
    fn test_cancel_before_pass_refunds() {
        let (mut escrow, seed) = setup();
        let mut table = HotPotatoTable::new(30);
        let id = table.create(&mut tx(&mut escrow, &seed, "wallet_1", 0), STAKE).unwrap();

        let err = table.cancel(&mut tx(&mut escrow, &seed, "wallet_2", 1), id).unwrap_err();
        assert_eq!(err, ArcadeError::Unauthorized);

        table.cancel(&mut tx(&mut escrow, &seed, "wallet_1", 1), id).unwrap();
        assert_eq!(escrow.balance(&p("wallet_1")), 5 * STAKE);
        assert_eq!(table.get(id).unwrap().status, PotatoStatus::Cancelled);
    }
}
