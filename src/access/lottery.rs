//! Lottery Rounds
//!
//! Admin opens a round with a ticket price and a duration. Anyone buys
//! tickets until the deadline; each purchase is one entry. After the
//! deadline anyone may trigger the draw, which picks a uniform ticket index
//! from the executing block and pays the whole pot to its holder.

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::access::admin::AdminSlot;
use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::{EscrowKey, Payee, Registry, TxContext};

/// Draw domain for lottery seeds.
const LOTTERY_DOMAIN: &[u8] = b"lottery";

/// Round lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundStatus {
    /// Selling tickets or waiting for the draw.
    Open,
    /// Winner drawn and paid.
    Drawn,
    /// Closed by the admin before any sale.
    Cancelled,
}

/// One lottery round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryRound {
    /// Identifier.
    pub id: u64,
    /// Price of one ticket.
    pub ticket_price: u64,
    /// Creation height.
    pub created_at: u64,
    /// First height at which sales stop and the draw opens.
    pub deadline: u64,
    /// One entry per purchased ticket, in purchase order.
    pub tickets: Vec<AccountId>,
    /// Status.
    pub status: RoundStatus,
    /// Winning ticket index.
    pub winning_ticket: Option<u64>,
    /// Paid account.
    pub winner: Option<AccountId>,
}

impl LotteryRound {
    /// Numeric status: 0 open, 1 drawn, 2 cancelled.
    pub fn status_code(&self) -> u8 {
        match self.status {
            RoundStatus::Open => 0,
            RoundStatus::Drawn => 1,
            RoundStatus::Cancelled => 2,
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id);
        hasher.update_u64(self.ticket_price);
        hasher.update_u64(self.created_at);
        hasher.update_u64(self.deadline);
        hasher.update_u64(self.tickets.len() as u64);
        for holder in &self.tickets {
            hasher.update_account(holder);
        }
        hasher.update_u8(self.status_code());
        hasher.update_opt_u64(self.winning_ticket);
        hasher.update_opt_account(self.winner.as_ref());
    }
}

/// Outcome of a draw.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    /// Winning ticket index.
    pub ticket: u64,
    /// Holder of that ticket.
    pub winner: AccountId,
    /// Amount paid.
    pub pot: u64,
}

/// All lottery rounds.
#[derive(Clone, Debug)]
pub struct Lottery {
    admin: AdminSlot,
    rounds: Registry<LotteryRound>,
}

impl Lottery {
    /// Create with an optional bootstrap admin.
    pub fn new(admin: Option<AccountId>) -> Self {
        Self {
            admin: AdminSlot::new(admin),
            rounds: Registry::new("round"),
        }
    }

    /// Claim the admin slot.
    pub fn init_admin(&mut self, caller: AccountId) -> ArcadeResult<()> {
        self.admin.init("lottery", caller)
    }

    /// Look up a round.
    pub fn get(&self, id: u64) -> Option<&LotteryRound> {
        self.rounds.get(id)
    }

    /// Open a round. Admin only.
    pub fn create_round(
        &mut self,
        tx: &TxContext<'_>,
        ticket_price: u64,
        duration: u64,
    ) -> ArcadeResult<u64> {
        self.admin.require(&tx.caller)?;
        if ticket_price == 0 {
            return Err(ArcadeError::InvalidAmount);
        }
        if duration == 0 {
            return Err(ArcadeError::OutOfRange { field: "duration", value: 0, max: u64::MAX });
        }
        let deadline = tx.height.checked_add(duration).ok_or(ArcadeError::Overflow)?;

        let created_at = tx.height;
        let id = self.rounds.allocate(|id| LotteryRound {
            id,
            ticket_price,
            created_at,
            deadline,
            tickets: Vec::new(),
            status: RoundStatus::Open,
            winning_ticket: None,
            winner: None,
        });
        info!(round_id = id, ticket_price, deadline, "Lottery round created");
        Ok(id)
    }

    /// Buy one ticket at the round's price.
    pub fn buy_ticket(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<u64> {
        let round = self.rounds.require(id)?;
        if round.status != RoundStatus::Open {
            return Err(ArcadeError::WrongState("round is not open"));
        }
        if tx.height >= round.deadline {
            return Err(ArcadeError::DeadlinePassed { deadline: round.deadline, now: tx.height });
        }

        tx.escrow.deposit(EscrowKey::Lottery(id), tx.caller, round.ticket_price)?;

        let round = self.rounds.require_mut(id)?;
        round.tickets.push(tx.caller);
        let ticket = round.tickets.len() as u64 - 1;
        info!(round_id = id, buyer = %tx.caller.short(), ticket, "Ticket bought");
        Ok(ticket)
    }

    /// Pick a winner and pay the pot. Anyone may call once the deadline passed.
    pub fn draw(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<DrawOutcome> {
        let key = EscrowKey::Lottery(id);
        let round = self.rounds.require(id)?;
        if round.status != RoundStatus::Open {
            return Err(ArcadeError::WrongState("round is not open"));
        }
        if tx.height < round.deadline {
            return Err(ArcadeError::DeadlineNotReached { deadline: round.deadline, now: tx.height });
        }
        if round.tickets.is_empty() {
            return Err(ArcadeError::WrongState("no tickets sold"));
        }

        // Sales close at the deadline; the first block sealed from then on
        // decides, however long the draw call is delayed.
        let ticket = tx.draw(
            LOTTERY_DOMAIN,
            id,
            &[],
            round.tickets.len() as u64,
            round.deadline.saturating_sub(1),
        )?;
        let winner = round.tickets[ticket as usize];
        let pot = tx.escrow.held(&key);
        tx.escrow.release(key, &[(Payee::Account(winner), pot)])?;

        let round = self.rounds.require_mut(id)?;
        round.status = RoundStatus::Drawn;
        round.winning_ticket = Some(ticket);
        round.winner = Some(winner);

        info!(round_id = id, ticket, winner = %winner.short(), pot, "Lottery drawn");
        Ok(DrawOutcome { ticket, winner, pot })
    }

    /// Close a round nobody bought into. Admin only.
    pub fn cancel_round(&mut self, tx: &TxContext<'_>, id: u64) -> ArcadeResult<()> {
        self.admin.require(&tx.caller)?;
        let round = self.rounds.require_mut(id)?;
        if round.status != RoundStatus::Open {
            return Err(ArcadeError::WrongState("round is not open"));
        }
        if !round.tickets.is_empty() {
            return Err(ArcadeError::WrongState("tickets already sold"));
        }
        round.status = RoundStatus::Cancelled;
        warn!(round_id = id, "Lottery round cancelled");
        Ok(())
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.admin.hash_into(hasher);
        hasher.update_u64(self.rounds.next_id());
        for (_, round) in self.rounds.iter() {
            round.hash_into(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::LedgerClock;
    use crate::core::rng::{DeterministicRng, FixedSeed};
    use crate::ledger::EscrowLedger;

    const PRICE: u64 = 1_000_000;

    fn wallet(n: u8) -> AccountId {
        AccountId::from_label(&format!("wallet_{}", n))
    }

    struct Env {
        escrow: EscrowLedger,
        seed: FixedSeed,
        clock: LedgerClock,
    }

    impl Env {
        fn new() -> Self {
            let mut escrow = EscrowLedger::new();
            for n in 1..=4 {
                escrow.credit(wallet(n), 10 * PRICE).unwrap();
            }
            Self { escrow, seed: FixedSeed(99), clock: LedgerClock::new(0) }
        }

        fn tx(&mut self, n: u8, height: u64) -> TxContext<'_> {
            TxContext {
                caller: wallet(n),
                height,
                clock: &self.clock,
                escrow: &mut self.escrow,
                randomness: &self.seed,
            }
        }
    }

    #[test]
    fn test_round_sells_and_draws() {
        let mut env = Env::new();
        let mut lottery = Lottery::new(None);
        lottery.init_admin(wallet(1)).unwrap();

        let id = lottery.create_round(&env.tx(1, 0), PRICE, 1).unwrap();
        lottery.buy_ticket(&mut env.tx(2, 0), id).unwrap();
        lottery.buy_ticket(&mut env.tx(3, 0), id).unwrap();
        lottery.buy_ticket(&mut env.tx(2, 0), id).unwrap();

        let late = lottery.buy_ticket(&mut env.tx(4, 1), id).unwrap_err();
        assert!(matches!(late, ArcadeError::DeadlinePassed { .. }));

        let unsealed = lottery.draw(&mut env.tx(1, 2), id).unwrap_err();
        assert!(matches!(unsealed, ArcadeError::WrongState(_)));
        assert_eq!(lottery.get(id).unwrap().status_code(), 0);
        assert_eq!(env.escrow.held(&EscrowKey::Lottery(id)), 3 * PRICE);

        env.clock.seal(&[5; 32]);
        let outcome = lottery.draw(&mut env.tx(1, 2), id).unwrap();
        let expected = DeterministicRng::new(99).next_below(3);
        assert_eq!(outcome.ticket, expected);
        assert_eq!(outcome.pot, 3 * PRICE);

        let round = lottery.get(id).unwrap();
        assert_eq!(round.status_code(), 1);
        assert_eq!(round.winner, Some(round.tickets[expected as usize]));
        assert_eq!(env.escrow.held(&EscrowKey::Lottery(id)), 0);

        let again = lottery.draw(&mut env.tx(1, 3), id).unwrap_err();
        assert!(matches!(again, ArcadeError::WrongState(_)));
    }

    #[test]
    fn test_draw_needs_deadline_and_tickets() {
        let mut env = Env::new();
        let mut lottery = Lottery::new(Some(wallet(1)));
        let id = lottery.create_round(&env.tx(1, 0), PRICE, 5).unwrap();

        let early = lottery.draw(&mut env.tx(2, 4), id).unwrap_err();
        assert_eq!(early, ArcadeError::DeadlineNotReached { deadline: 5, now: 4 });

        let empty = lottery.draw(&mut env.tx(2, 5), id).unwrap_err();
        assert!(matches!(empty, ArcadeError::WrongState(_)));
    }

    #[test]
    fn test_admin_only_create_and_cancel() {
        let mut env = Env::new();
        let mut lottery = Lottery::new(Some(wallet(1)));

        let err = lottery.create_round(&env.tx(2, 0), PRICE, 5).unwrap_err();
        assert_eq!(err, ArcadeError::Unauthorized);

        let id = lottery.create_round(&env.tx(1, 0), PRICE, 5).unwrap();
        assert_eq!(lottery.cancel_round(&env.tx(2, 0), id), Err(ArcadeError::Unauthorized));
        lottery.cancel_round(&env.tx(1, 0), id).unwrap();
        assert_eq!(lottery.get(id).unwrap().status_code(), 2);

        let sold = lottery.create_round(&env.tx(1, 0), PRICE, 5).unwrap();
        lottery.buy_ticket(&mut env.tx(3, 0), sold).unwrap();
        assert!(matches!(
            lottery.cancel_round(&env.tx(1, 0), sold),
            Err(ArcadeError::WrongState(_))
        ));
    }

    #[test]
    fn test_invalid_round_parameters() {
        let mut env = Env::new();
        let mut lottery = Lottery::new(Some(wallet(1)));
        assert_eq!(lottery.create_round(&env.tx(1, 0), 0, 5), Err(ArcadeError::InvalidAmount));
        assert!(matches!(
            lottery.create_round(&env.tx(1, 0), PRICE, 0),
            Err(ArcadeError::OutOfRange { field: "duration", .. })
        ));
    }
}
