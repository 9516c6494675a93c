//! Wager State Machine
//!
//! One generic lifecycle for every commit-reveal variant:
//!
//! ```text
//!             join (duels)                 last reveal
//!   ┌──────┐ ─────────────► ┌────────────────┐ ─────────► ┌──────────┐
//!   │ Open │                │ AwaitingReveal │            │ Resolved │
//!   └──────┘ ──────┐        └────────────────┘            └──────────┘
//!     │ │  reveal  └───────────────────────────────────────────▲
//!     │ │  (house games)       │ expire (height >= deadline)
//!     │ ▼ cancel               ▼
//!   ┌───────────┐          ┌─────────┐
//!   │ Cancelled │          │ Expired │
//!   └───────────┘          └─────────┘
//! ```
//!
//! Every operation validates completely before the first escrow movement,
//! and the escrow movement itself is all-or-nothing, so a rejected call
//! leaves the table and the ledger untouched.

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::config::BPS_DENOMINATOR;
use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::game::commitment::{verify, Commitment, Secret};
use crate::game::resolver::{Reveals, Verdict};
use crate::game::state::{GameResult, GameStatus, Side, WagerGame};
use crate::game::variant::{ExpiryPolicy, VariantPolicy};
use crate::ledger::{EscrowKey, Payee, Registry, TxContext};

/// Result of an accepted reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevealOutcome {
    /// Recorded; the counterpart has not revealed yet.
    Pending,
    /// All parties revealed; the game is resolved and paid.
    Resolved(GameResult),
}

/// How an expired game was settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirySettlement {
    /// Sole revealer awarded the pot, if any.
    pub winner: Option<AccountId>,
    /// Value returned or awarded to accounts.
    pub payouts: Vec<(AccountId, u64)>,
    /// Value that went to the house pool.
    pub to_house: u64,
}

/// All games of one variant plus the policy they run under.
#[derive(Clone, Debug)]
pub struct WagerTable {
    policy: VariantPolicy,
    games: Registry<WagerGame>,
}

impl WagerTable {
    /// Create an empty table.
    pub fn new(policy: VariantPolicy) -> Self {
        Self {
            policy,
            games: Registry::new("game"),
        }
    }

    /// Policy of this table.
    pub fn policy(&self) -> &VariantPolicy {
        &self.policy
    }

    /// Look up a game.
    pub fn get(&self, id: u64) -> Option<&WagerGame> {
        self.games.get(id)
    }

    /// Games in id order.
    pub fn games(&self) -> impl Iterator<Item = &WagerGame> {
        self.games.iter().map(|(_, game)| game)
    }

    /// Escrow account of a game.
    pub fn escrow_key(&self, id: u64) -> EscrowKey {
        EscrowKey::Wager(self.policy.variant, id)
    }

    /// Stake and commit. House games also reserve the worst-case winnings
    /// from the house pool.
    pub fn create(
        &mut self,
        tx: &mut TxContext<'_>,
        stake: u64,
        commitment: Commitment,
    ) -> ArcadeResult<u64> {
        if stake == 0 {
            return Err(ArcadeError::InvalidAmount);
        }
        let reserve = self.policy.house_reserve(stake)?;
        tx.escrow.ensure_can_pay(&tx.caller, stake)?;
        tx.escrow.ensure_house_covers(reserve)?;
        let deadline = tx
            .height
            .checked_add(self.policy.reveal_window)
            .ok_or(ArcadeError::Overflow)?;

        let key = self.escrow_key(self.games.next_id());
        tx.escrow.deposit(key, tx.caller, stake)?;
        tx.escrow.reserve_from_house(key, reserve)?;

        let variant = self.policy.variant;
        let creator = tx.caller;
        let height = tx.height;
        let id = self.games.allocate(|id| WagerGame {
            id,
            variant,
            creator,
            opponent: None,
            stake,
            house_reserve: reserve,
            commitment_creator: commitment,
            commitment_opponent: None,
            revealed_creator: None,
            revealed_opponent: None,
            status: GameStatus::Open,
            created_at: height,
            joined_at: None,
            reveal_deadline: deadline,
            result: None,
            expiry_winner: None,
        });

        info!(
            variant = variant.name(),
            game_id = id,
            creator = %creator.short(),
            stake,
            reserve,
            deadline,
            "Game created"
        );
        Ok(id)
    }

    /// Match the stake as the second party. Restarts the reveal window.
    pub fn join(
        &mut self,
        tx: &mut TxContext<'_>,
        id: u64,
        commitment: Commitment,
    ) -> ArcadeResult<()> {
        let key = self.escrow_key(id);
        let window = self.policy.reveal_window;
        let game = self.games.require(id)?;

        if self.policy.revealers < 2 {
            return Err(ArcadeError::WrongState("single-player games take no opponent"));
        }
        if game.status != GameStatus::Open || game.opponent.is_some() {
            return Err(ArcadeError::WrongState("game is not open for joining"));
        }
        if tx.caller == game.creator {
            return Err(ArcadeError::AlreadyJoined);
        }
        if tx.height >= game.reveal_deadline {
            return Err(ArcadeError::DeadlinePassed {
                deadline: game.reveal_deadline,
                now: tx.height,
            });
        }
        let deadline = tx.height.checked_add(window).ok_or(ArcadeError::Overflow)?;
        let stake = game.stake;

        tx.escrow.deposit(key, tx.caller, stake)?;

        let game = self.games.require_mut(id)?;
        game.opponent = Some(tx.caller);
        game.commitment_opponent = Some(commitment);
        game.joined_at = Some(tx.height);
        game.reveal_deadline = deadline;
        game.status = GameStatus::AwaitingReveal;

        info!(
            variant = game.variant.name(),
            game_id = id,
            opponent = %tx.caller.short(),
            deadline,
            "Game joined"
        );
        Ok(())
    }

    /// Open a commitment. Resolves and pays out once every party revealed.
    pub fn reveal(
        &mut self,
        tx: &mut TxContext<'_>,
        id: u64,
        choices: &[u64],
        secret: &Secret,
    ) -> ArcadeResult<RevealOutcome> {
        let policy = self.policy;
        let key = self.escrow_key(id);
        let game = self.games.require(id)?;

        if !game.status.is_active() {
            return Err(ArcadeError::WrongState("game is not active"));
        }
        let side = game.side_of(&tx.caller).ok_or(ArcadeError::Unauthorized)?;
        if policy.revealers == 2 && game.status != GameStatus::AwaitingReveal {
            return Err(ArcadeError::WrongState("waiting for an opponent"));
        }
        if tx.height >= game.reveal_deadline {
            return Err(ArcadeError::DeadlinePassed {
                deadline: game.reveal_deadline,
                now: tx.height,
            });
        }
        if policy.revealers == 1 && tx.height <= game.created_at {
            // The draw must come from a block mined after the commitment.
            return Err(ArcadeError::DeadlineNotReached {
                deadline: game.created_at + 1,
                now: tx.height,
            });
        }
        if game.revealed(side).is_some() {
            return Err(ArcadeError::WrongState("already revealed"));
        }

        let bytes = policy.check_choices(choices)?;
        let commitment = game
            .commitment(side)
            .ok_or(ArcadeError::WrongState("no commitment stored"))?;
        if !verify(commitment, secret, &bytes) {
            return Err(ArcadeError::CommitmentMismatch);
        }

        let counterpart_revealed = match side {
            Side::Creator => game.revealed_opponent.is_some(),
            Side::Opponent => game.revealed_creator.is_some(),
        };
        if policy.revealers == 2 && !counterpart_revealed {
            let game = self.games.require_mut(id)?;
            match side {
                Side::Creator => game.revealed_creator = Some(bytes),
                Side::Opponent => game.revealed_opponent = Some(bytes),
            }
            info!(
                variant = policy.variant.name(),
                game_id = id,
                side = ?side,
                "Reveal recorded, waiting for counterpart"
            );
            return Ok(RevealOutcome::Pending);
        }

        // Final reveal: resolve.
        let (creator_bytes, opponent_bytes) = match side {
            Side::Creator => (bytes.clone(), game.revealed_opponent.clone().unwrap_or_default()),
            Side::Opponent => (game.revealed_creator.clone().unwrap_or_default(), bytes.clone()),
        };
        let resolver = policy.variant.resolver();
        let draw = match resolver.draw_bound() {
            Some(bound) => {
                tx.draw(policy.variant.name().as_bytes(), id, secret, bound, game.created_at)? as u8
            }
            None => 0,
        };
        let verdict = resolver.resolve(&Reveals {
            creator: &creator_bytes,
            opponent: &opponent_bytes,
            draw,
        });

        let held = tx.escrow.held(&key);
        let settlement = settle_verdict(game, verdict, held)?;
        tx.escrow.release(key, &settlement.transfers)?;

        let result = GameResult {
            verdict,
            winner: settlement.winner,
            payouts: settlement.paid,
            resolved_at: tx.height,
        };

        let game = self.games.require_mut(id)?;
        game.revealed_creator = Some(creator_bytes);
        if policy.revealers == 2 {
            game.revealed_opponent = Some(opponent_bytes);
        }
        game.status = GameStatus::Resolved;
        game.result = Some(result.clone());

        info!(
            variant = policy.variant.name(),
            game_id = id,
            verdict = ?verdict,
            winner = ?result.winner.map(|w| w.short()),
            "Game resolved"
        );
        Ok(RevealOutcome::Resolved(result))
    }

    /// Settle a game whose deadline passed.
    ///
    /// A sole revealer takes the whole pot. Otherwise the variant's expiry
    /// policy applies; a duel that was never joined always refunds.
    pub fn expire(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<ExpirySettlement> {
        let key = self.escrow_key(id);
        let game = self.games.require(id)?;

        if !game.status.is_active() {
            return Err(ArcadeError::WrongState("game is not active"));
        }
        if tx.height < game.reveal_deadline {
            return Err(ArcadeError::DeadlineNotReached {
                deadline: game.reveal_deadline,
                now: tx.height,
            });
        }

        let held = tx.escrow.held(&key);
        let sole_revealer = match (&game.revealed_creator, &game.revealed_opponent, game.opponent) {
            (Some(_), None, Some(_)) => Some(game.creator),
            (None, Some(_), Some(opponent)) => Some(opponent),
            _ => None,
        };

        let transfers: Vec<(Payee, u64)> = match sole_revealer {
            Some(winner) => vec![(Payee::Account(winner), held)],
            None if self.policy.expiry == ExpiryPolicy::ForfeitToHouse
                && self.policy.revealers == 1 =>
            {
                vec![(Payee::House, held)]
            }
            None => {
                let mut refunds = vec![(Payee::Account(game.creator), game.stake)];
                if let Some(opponent) = game.opponent {
                    refunds.push((Payee::Account(opponent), game.stake));
                }
                if game.house_reserve > 0 {
                    refunds.push((Payee::House, game.house_reserve));
                }
                refunds
            }
        };
        tx.escrow.release(key, &transfers)?;

        let settlement = summarize(sole_revealer, &transfers);
        let game = self.games.require_mut(id)?;
        game.status = GameStatus::Expired;
        game.expiry_winner = sole_revealer;

        warn!(
            variant = game.variant.name(),
            game_id = id,
            winner = ?sole_revealer.map(|w| w.short()),
            to_house = settlement.to_house,
            "Game expired"
        );
        Ok(settlement)
    }

    /// Withdraw an unjoined duel.
    pub fn cancel(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<()> {
        let key = self.escrow_key(id);
        let game = self.games.require(id)?;

        if self.policy.revealers < 2 {
            return Err(ArcadeError::WrongState("single-player games cannot be cancelled"));
        }
        if tx.caller != game.creator {
            return Err(ArcadeError::Unauthorized);
        }
        if game.status != GameStatus::Open || game.opponent.is_some() {
            return Err(ArcadeError::WrongState("only an unjoined game can be cancelled"));
        }

        let held = tx.escrow.held(&key);
        tx.escrow.release(key, &[(Payee::Account(game.creator), held)])?;

        let game = self.games.require_mut(id)?;
        game.status = GameStatus::Cancelled;

        warn!(variant = game.variant.name(), game_id = id, refund = held, "Game cancelled");
        Ok(())
    }

    /// Fold the table into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.policy.variant.tag());
        hasher.update_u64(self.games.next_id());
        for game in self.games() {
            game.hash_into(hasher);
        }
    }
}

struct VerdictSettlement {
    transfers: Vec<(Payee, u64)>,
    winner: Option<AccountId>,
    paid: Vec<(AccountId, u64)>,
}

fn settle_verdict(game: &WagerGame, verdict: Verdict, held: u64) -> ArcadeResult<VerdictSettlement> {
    let settlement = match verdict {
        Verdict::House { payout_bps, .. } => {
            let win = u64::try_from(
                game.stake as u128 * payout_bps as u128 / BPS_DENOMINATOR as u128,
            )
            .map_err(|_| ArcadeError::Overflow)?;
            if win > held {
                return Err(ArcadeError::EscrowShortfall { payout: win, held });
            }
            let mut transfers = Vec::with_capacity(2);
            if win > 0 {
                transfers.push((Payee::Account(game.creator), win));
            }
            if held > win {
                transfers.push((Payee::House, held - win));
            }
            VerdictSettlement {
                transfers,
                winner: (win > 0).then_some(game.creator),
                paid: vec![(game.creator, win)],
            }
        }
        Verdict::CreatorWins | Verdict::OpponentWins => {
            let opponent = game
                .opponent
                .ok_or(ArcadeError::WrongState("duel has no opponent"))?;
            let (winner, loser) = if verdict == Verdict::CreatorWins {
                (game.creator, opponent)
            } else {
                (opponent, game.creator)
            };
            VerdictSettlement {
                transfers: vec![(Payee::Account(winner), held)],
                winner: Some(winner),
                paid: ordered(game.creator, winner, held, loser),
            }
        }
        Verdict::Push => {
            let opponent = game
                .opponent
                .ok_or(ArcadeError::WrongState("duel has no opponent"))?;
            VerdictSettlement {
                transfers: vec![
                    (Payee::Account(game.creator), game.stake),
                    (Payee::Account(opponent), game.stake),
                ],
                winner: None,
                paid: vec![(game.creator, game.stake), (opponent, game.stake)],
            }
        }
    };
    Ok(settlement)
}

/// Creator first, then opponent.
fn ordered(creator: AccountId, winner: AccountId, pot: u64, loser: AccountId) -> Vec<(AccountId, u64)> {
    if winner == creator {
        vec![(winner, pot), (loser, 0)]
    } else {
        vec![(loser, 0), (winner, pot)]
    }
}

fn summarize(winner: Option<AccountId>, transfers: &[(Payee, u64)]) -> ExpirySettlement {
    let mut payouts = Vec::new();
    let mut to_house = 0;
    for (payee, amount) in transfers {
        match payee {
            Payee::Account(account) => payouts.push((*account, *amount)),
            Payee::House => to_house += amount,
        }
    }
    ExpirySettlement { winner, payouts, to_house }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArcadeConfig;
    use crate::core::clock::LedgerClock;
    use crate::core::rng::{DeterministicRng, FixedSeed};
    use crate::game::commitment::commit_to;
    use crate::game::resolver::HigherLowerResolver;
    use crate::game::variant::GameVariant;
    use crate::ledger::EscrowLedger;

    const STAKE: u64 = 1_000_000;

    fn alice() -> AccountId {
        AccountId::from_label("wallet_1")
    }

    fn bob() -> AccountId {
        AccountId::from_label("wallet_2")
    }

    fn carol() -> AccountId {
        AccountId::from_label("wallet_3")
    }

    struct Harness {
        escrow: EscrowLedger,
        seed: FixedSeed,
        clock: LedgerClock,
        height: u64,
    }

    impl Harness {
        fn new() -> Self {
            let mut escrow = EscrowLedger::new();
            for account in [alice(), bob(), carol()] {
                escrow.credit(account, 10 * STAKE).unwrap();
            }
            escrow.credit_house(50 * STAKE).unwrap();
            Self { escrow, seed: FixedSeed(7), clock: LedgerClock::new(10), height: 10 }
        }

        /// Move to the next block and seal it.
        fn mine(&mut self) {
            self.height += 1;
            self.clock.seal(&[self.height as u8; 32]);
        }

        fn tx(&mut self, caller: AccountId) -> TxContext<'_> {
            TxContext {
                caller,
                height: self.height,
                clock: &self.clock,
                escrow: &mut self.escrow,
                randomness: &self.seed,
            }
        }
    }

    fn table(variant: GameVariant) -> WagerTable {
        WagerTable::new(variant.policy(&ArcadeConfig::default()))
    }

    fn conserved(table: &WagerTable, escrow: &EscrowLedger, id: u64) {
        let account = escrow.escrow(&table.escrow_key(id)).unwrap();
        assert_eq!(account.held, 0);
        assert_eq!(account.deposited, account.paid_out);
    }

    #[test]
    fn test_duel_resolves_to_winner() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::RockPaperScissors);

        // paper (1) beats rock (0)
        let c1 = commit_to(&[1; 32], &[1]);
        let c2 = commit_to(&[2; 32], &[0]);

        let id = t.create(&mut h.tx(alice()), STAKE, c1).unwrap();
        t.join(&mut h.tx(bob()), id, c2).unwrap();
        assert_eq!(t.get(id).unwrap().status, GameStatus::AwaitingReveal);

        let first = t.reveal(&mut h.tx(bob()), id, &[0], &[2; 32]).unwrap();
        assert_eq!(first, RevealOutcome::Pending);

        let second = t.reveal(&mut h.tx(alice()), id, &[1], &[1; 32]).unwrap();
        match second {
            RevealOutcome::Resolved(result) => {
                assert_eq!(result.verdict, Verdict::CreatorWins);
                assert_eq!(result.winner, Some(alice()));
            }
            other => panic!("expected resolution, got {:?}", other),
        }

        assert_eq!(h.escrow.balance(&alice()), 11 * STAKE);
        assert_eq!(h.escrow.balance(&bob()), 9 * STAKE);
        assert_eq!(t.get(id).unwrap().status_code(), 2);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_duel_tie_refunds_both() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);

        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&[1; 32], &[2])).unwrap();
        t.join(&mut h.tx(bob()), id, commit_to(&[2; 32], &[2])).unwrap();
        t.reveal(&mut h.tx(alice()), id, &[2], &[1; 32]).unwrap();
        t.reveal(&mut h.tx(bob()), id, &[2], &[2; 32]).unwrap();

        assert_eq!(h.escrow.balance(&alice()), 10 * STAKE);
        assert_eq!(h.escrow.balance(&bob()), 10 * STAKE);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_mismatch_leaves_game_untouched() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);

        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&[1; 32], &[0])).unwrap();
        t.join(&mut h.tx(bob()), id, commit_to(&[2; 32], &[1])).unwrap();
        let before = t.get(id).unwrap().clone();

        let err = t.reveal(&mut h.tx(alice()), id, &[0], &[9; 32]).unwrap_err();
        assert_eq!(err, ArcadeError::CommitmentMismatch);
        assert_eq!(t.get(id).unwrap(), &before);
    }

    #[test]
    fn test_out_of_range_checked_before_commitment() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);

        let c = commit_to(&[5; 32], &[0]);
        let id = t.create(&mut h.tx(alice()), STAKE, c).unwrap();
        t.join(&mut h.tx(bob()), id, c).unwrap();

        let err = t.reveal(&mut h.tx(alice()), id, &[9], &[5; 32]).unwrap_err();
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn test_second_join_rejected() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::RockPaperScissors);

        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        t.join(&mut h.tx(bob()), id, [1; 32]).unwrap();
        let err = t.join(&mut h.tx(carol()), id, [2; 32]).unwrap_err();
        assert!(matches!(err, ArcadeError::WrongState(_)));
        assert_eq!(h.escrow.balance(&carol()), 10 * STAKE);
    }

    #[test]
    fn test_creator_cannot_join_own_game() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::RockPaperScissors);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        assert_eq!(t.join(&mut h.tx(alice()), id, [0; 32]), Err(ArcadeError::AlreadyJoined));
    }

    #[test]
    fn test_late_join_rejected() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::RockPaperScissors);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();

        h.height += 150;
        let err = t.join(&mut h.tx(bob()), id, [1; 32]).unwrap_err();
        assert_eq!(err, ArcadeError::DeadlinePassed { deadline: 160, now: 160 });
    }

    #[test]
    fn test_expire_refunds_when_nobody_revealed() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        t.join(&mut h.tx(bob()), id, [1; 32]).unwrap();

        h.height += 149;
        let early = t.expire(&mut h.tx(carol()), id).unwrap_err();
        assert_eq!(early, ArcadeError::DeadlineNotReached { deadline: 160, now: 159 });

        h.height += 1;
        let settlement = t.expire(&mut h.tx(carol()), id).unwrap();
        assert_eq!(settlement.winner, None);
        assert_eq!(settlement.payouts, vec![(alice(), STAKE), (bob(), STAKE)]);
        assert_eq!(h.escrow.balance(&alice()), 10 * STAKE);
        assert_eq!(h.escrow.balance(&bob()), 10 * STAKE);
        assert_eq!(t.get(id).unwrap().status, GameStatus::Expired);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_expire_awards_sole_revealer() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);
        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&[3; 32], &[1])).unwrap();
        t.join(&mut h.tx(bob()), id, commit_to(&[4; 32], &[2])).unwrap();
        t.reveal(&mut h.tx(alice()), id, &[1], &[3; 32]).unwrap();

        h.height += 200;
        let settlement = t.expire(&mut h.tx(bob()), id).unwrap();
        assert_eq!(settlement.winner, Some(alice()));
        assert_eq!(h.escrow.balance(&alice()), 11 * STAKE);
        assert_eq!(t.get(id).unwrap().status_code(), 3);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_reveal_after_deadline_rejected() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::EmojiBattle);
        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&[3; 32], &[1])).unwrap();
        t.join(&mut h.tx(bob()), id, commit_to(&[4; 32], &[2])).unwrap();

        h.height += 150;
        let err = t.reveal(&mut h.tx(alice()), id, &[1], &[3; 32]).unwrap_err();
        assert!(matches!(err, ArcadeError::DeadlinePassed { .. }));
    }

    #[test]
    fn test_cancel_rules() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::RockPaperScissors);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();

        assert_eq!(t.cancel(&mut h.tx(bob()), id), Err(ArcadeError::Unauthorized));
        t.cancel(&mut h.tx(alice()), id).unwrap();
        assert_eq!(t.get(id).unwrap().status_code(), 4);
        assert_eq!(h.escrow.balance(&alice()), 10 * STAKE);

        let joined = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        t.join(&mut h.tx(bob()), joined, [1; 32]).unwrap();
        assert!(matches!(
            t.cancel(&mut h.tx(alice()), joined),
            Err(ArcadeError::WrongState(_))
        ));
    }

    #[test]
    fn test_house_game_win_pays_multiplier() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::CoinFlip);
        let draw = DeterministicRng::new(7).next_below(2);

        let secret = [1; 32];
        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&secret, &[draw])).unwrap();
        assert_eq!(h.escrow.house_balance(), 49 * STAKE);

        // Same block: the draw header already exists.
        let early = t.reveal(&mut h.tx(alice()), id, &[draw], &secret).unwrap_err();
        assert!(matches!(early, ArcadeError::DeadlineNotReached { .. }));

        // Next block, not yet sealed: no draw entropy yet.
        h.height += 1;
        let unsealed = t.reveal(&mut h.tx(alice()), id, &[draw], &secret).unwrap_err();
        assert!(matches!(unsealed, ArcadeError::WrongState(_)));
        assert_eq!(t.get(id).unwrap().status_code(), 0);
        assert_eq!(h.escrow.house_balance(), 49 * STAKE);

        h.mine();
        let outcome = t.reveal(&mut h.tx(alice()), id, &[draw], &secret).unwrap();
        assert!(matches!(outcome, RevealOutcome::Resolved(ref r) if r.verdict.player_won()));
        assert_eq!(h.escrow.balance(&alice()), 11 * STAKE);
        assert_eq!(h.escrow.house_balance(), 49 * STAKE);
        assert_eq!(t.get(id).unwrap().status_code(), 1);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_house_game_loss_feeds_house() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::GuessTheNumber);
        let draw = DeterministicRng::new(7).next_below(10);
        let pick = (draw + 1) % 10;

        let secret = [8; 32];
        let id = t.create(&mut h.tx(bob()), STAKE, commit_to(&secret, &[pick])).unwrap();
        assert_eq!(h.escrow.house_balance(), 41 * STAKE);

        h.mine();
        t.reveal(&mut h.tx(bob()), id, &[pick], &secret).unwrap();
        assert_eq!(h.escrow.balance(&bob()), 9 * STAKE);
        assert_eq!(h.escrow.house_balance(), 51 * STAKE);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_higher_lower_win_pays_bps_odds() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::HigherLower);
        let draw = DeterministicRng::new(7).next_below(10);
        let (higher, target) = if draw > 0 { (1, draw - 1) } else { (0, 1) };
        let winning = HigherLowerResolver::winning_draws(higher == 1, target as u8);

        let stake = 3_001;
        let secret = [6; 32];
        let id = t.create(&mut h.tx(alice()), stake, commit_to(&secret, &[higher, target])).unwrap();
        h.mine();
        let outcome = t.reveal(&mut h.tx(alice()), id, &[higher, target], &secret).unwrap();
        assert!(matches!(outcome, RevealOutcome::Resolved(ref r) if r.verdict.player_won()));

        let win = stake * (10 * BPS_DENOMINATOR / winning) / BPS_DENOMINATOR;
        assert_eq!(h.escrow.balance(&alice()), 10 * STAKE - stake + win);
        conserved(&t, &h.escrow, id);
    }

    #[test]
    fn test_house_must_cover_reserve() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::GuessTheNumber);
        let err = t.create(&mut h.tx(alice()), 6 * STAKE, [0; 32]).unwrap_err();
        assert!(matches!(err, ArcadeError::InsufficientFunds { .. }));
        assert_eq!(h.escrow.balance(&alice()), 10 * STAKE);
        assert_eq!(t.games().count(), 0);
    }

    #[test]
    fn test_house_expiry_policies() {
        let mut h = Harness::new();
        let mut refund = table(GameVariant::CoinFlip);
        let id = refund.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        h.height += 100;
        let settlement = refund.expire(&mut h.tx(bob()), id).unwrap();
        assert_eq!(settlement.payouts, vec![(alice(), STAKE)]);
        assert_eq!(settlement.to_house, STAKE);
        assert_eq!(refund.get(id).unwrap().status_code(), 2);

        let config = ArcadeConfig {
            house_expiry: ExpiryPolicy::ForfeitToHouse,
            ..ArcadeConfig::default()
        };
        let mut forfeit = WagerTable::new(GameVariant::HigherLower.policy(&config));
        let id = forfeit.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        h.height += 100;
        let settlement = forfeit.expire(&mut h.tx(bob()), id).unwrap();
        assert!(settlement.payouts.is_empty());
        assert_eq!(settlement.to_house, 10 * STAKE);
        assert_eq!(h.escrow.house_balance(), 51 * STAKE);
        assert_eq!(h.escrow.balance(&alice()), 9 * STAKE);
    }

    #[test]
    fn test_house_game_cannot_be_joined_or_cancelled() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::HigherLower);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        assert!(matches!(t.join(&mut h.tx(bob()), id, [0; 32]), Err(ArcadeError::WrongState(_))));
        assert!(matches!(t.cancel(&mut h.tx(alice()), id), Err(ArcadeError::WrongState(_))));
    }

    #[test]
    fn test_outsider_cannot_reveal() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::CoinFlip);
        let id = t.create(&mut h.tx(alice()), STAKE, [0; 32]).unwrap();
        h.height += 1;
        assert_eq!(
            t.reveal(&mut h.tx(bob()), id, &[0], &[0; 32]),
            Err(ArcadeError::Unauthorized)
        );
    }

    #[test]
    fn test_resolution_happens_once() {
        let mut h = Harness::new();
        let mut t = table(GameVariant::CoinFlip);
        let secret = [4; 32];
        let id = t.create(&mut h.tx(alice()), STAKE, commit_to(&secret, &[0])).unwrap();
        h.mine();
        t.reveal(&mut h.tx(alice()), id, &[0], &secret).unwrap();

        let again = t.reveal(&mut h.tx(alice()), id, &[0], &secret).unwrap_err();
        assert!(matches!(again, ArcadeError::WrongState(_)));
        h.height += 200;
        assert!(matches!(t.expire(&mut h.tx(bob()), id), Err(ArcadeError::WrongState(_))));
    }
}
