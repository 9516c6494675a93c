//! Tournaments
//!
//! Entry fees pool in escrow while the tournament is open. The table admin
//! creates tournaments, locks entries, then settles to one winner or a
//! top-3 split after `end_height`. A cancelled tournament lets every
//! participant reclaim their fee once.
//!
//! ```text
//! Open ──lock──► Locked ──settle──► Settled
//!   │               │
//!   └───cancel──────┴──► Cancelled ──claim-refund (once each)
//! ```

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::access::admin::AdminSlot;
use crate::config::BPS_DENOMINATOR;
use crate::core::hash::StateHasher;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ArcadeResult};
use crate::ledger::{EscrowKey, Payee, Registry, TxContext};

/// Largest field a tournament may accept.
pub const MAX_TOURNAMENT_PLAYERS: u64 = 1_024;

/// Tournament lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TournamentStatus {
    /// Accepting entries until `start_height`.
    Open,
    /// Entries closed.
    Locked,
    /// Prizes paid.
    Settled,
    /// Called off; fees refundable.
    Cancelled,
}

/// Parameters of `create-tournament`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentParams {
    /// Fee per entry.
    pub entry_fee: u64,
    /// Capacity.
    pub max_players: u64,
    /// Entries close at this height.
    pub start_height: u64,
    /// Settlement opens at this height.
    pub end_height: u64,
    /// 1 (winner takes all) or 3 (top-3 split).
    pub winners_count: u8,
}

/// One tournament.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    /// Identifier.
    pub id: u64,
    /// Admin that created it.
    pub organizer: AccountId,
    /// Creation parameters.
    pub params: TournamentParams,
    /// Entrants in join order.
    pub participants: Vec<AccountId>,
    /// Status.
    pub status: TournamentStatus,
    /// Prizes paid at settlement, in placement order.
    pub prizes: Vec<(AccountId, u64)>,
    /// Participants that reclaimed their fee after cancellation.
    pub refunded: BTreeSet<AccountId>,
}

impl Tournament {
    /// Numeric status: 0 open, 1 locked, 2 settled, 3 cancelled.
    pub fn status_code(&self) -> u8 {
        match self.status {
            TournamentStatus::Open => 0,
            TournamentStatus::Locked => 1,
            TournamentStatus::Settled => 2,
            TournamentStatus::Cancelled => 3,
        }
    }

    fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id);
        hasher.update_account(&self.organizer);
        hasher.update_u64(self.params.entry_fee);
        hasher.update_u64(self.params.max_players);
        hasher.update_u64(self.params.start_height);
        hasher.update_u64(self.params.end_height);
        hasher.update_u8(self.params.winners_count);
        hasher.update_u64(self.participants.len() as u64);
        for p in &self.participants {
            hasher.update_account(p);
        }
        hasher.update_u8(self.status_code());
        for (winner, prize) in &self.prizes {
            hasher.update_account(winner);
            hasher.update_u64(*prize);
        }
        hasher.update_u64(self.refunded.len() as u64);
        for p in &self.refunded {
            hasher.update_account(p);
        }
    }
}

/// All tournaments.
#[derive(Clone, Debug)]
pub struct TournamentTable {
    admin: AdminSlot,
    top3_split_bps: [u64; 3],
    tournaments: Registry<Tournament>,
}

impl TournamentTable {
    /// Create with an optional bootstrap admin and the top-3 split
    /// (basis points; dust goes to first).
    pub fn new(admin: Option<AccountId>, top3_split_bps: [u64; 3]) -> Self {
        Self {
            admin: AdminSlot::new(admin),
            top3_split_bps,
            tournaments: Registry::new("tournament"),
        }
    }

    /// Claim the admin slot.
    pub fn init_admin(&mut self, caller: AccountId) -> ArcadeResult<()> {
        self.admin.init("tournament", caller)
    }

    /// Look up a tournament.
    pub fn get(&self, id: u64) -> Option<&Tournament> {
        self.tournaments.get(id)
    }

    /// Create a tournament. Admin only.
    pub fn create(&mut self, tx: &TxContext<'_>, params: TournamentParams) -> ArcadeResult<u64> {
        self.admin.require(&tx.caller)?;
        if params.entry_fee == 0 {
            return Err(ArcadeError::InvalidAmount);
        }
        if params.winners_count != 1 && params.winners_count != 3 {
            return Err(ArcadeError::OutOfRange {
                field: "winners_count",
                value: params.winners_count as u64,
                max: 3,
            });
        }
        if params.max_players < params.winners_count as u64
            || params.max_players > MAX_TOURNAMENT_PLAYERS
        {
            return Err(ArcadeError::OutOfRange {
                field: "max_players",
                value: params.max_players,
                max: MAX_TOURNAMENT_PLAYERS,
            });
        }
        if params.start_height >= params.end_height {
            return Err(ArcadeError::OutOfRange {
                field: "start_height",
                value: params.start_height,
                max: params.end_height.saturating_sub(1),
            });
        }

        let organizer = tx.caller;
        let id = self.tournaments.allocate(|id| Tournament {
            id,
            organizer,
            params,
            participants: Vec::new(),
            status: TournamentStatus::Open,
            prizes: Vec::new(),
            refunded: BTreeSet::new(),
        });
        info!(
            tournament_id = id,
            organizer = %organizer.short(),
            entry_fee = params.entry_fee,
            max_players = params.max_players,
            "Tournament created"
        );
        Ok(id)
    }

    /// Pay the entry fee and enter.
    pub fn join(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<()> {
        let tournament = self.tournaments.require(id)?;
        if tournament.status != TournamentStatus::Open {
            return Err(ArcadeError::WrongState("tournament is not open"));
        }
        if tx.height >= tournament.params.start_height {
            return Err(ArcadeError::DeadlinePassed {
                deadline: tournament.params.start_height,
                now: tx.height,
            });
        }
        if tournament.participants.contains(&tx.caller) {
            return Err(ArcadeError::AlreadyJoined);
        }
        if tournament.participants.len() as u64 >= tournament.params.max_players {
            return Err(ArcadeError::WrongState("tournament is full"));
        }

        tx.escrow
            .deposit(EscrowKey::Tournament(id), tx.caller, tournament.params.entry_fee)?;

        let tournament = self.tournaments.require_mut(id)?;
        tournament.participants.push(tx.caller);
        info!(
            tournament_id = id,
            player = %tx.caller.short(),
            entrants = tournament.participants.len(),
            "Tournament joined"
        );
        Ok(())
    }

    /// Stop accepting entries. Admin only.
    pub fn lock(&mut self, tx: &TxContext<'_>, id: u64) -> ArcadeResult<()> {
        self.admin.require(&tx.caller)?;
        let tournament = self.tournaments.require_mut(id)?;
        if tournament.status != TournamentStatus::Open {
            return Err(ArcadeError::WrongState("tournament is not open"));
        }
        tournament.status = TournamentStatus::Locked;
        info!(tournament_id = id, entrants = tournament.participants.len(), "Tournament locked");
        Ok(())
    }

    /// Pay the whole pool to a single winner. Admin only.
    pub fn settle_single(
        &mut self,
        tx: &mut TxContext<'_>,
        id: u64,
        winner: AccountId,
    ) -> ArcadeResult<Vec<(AccountId, u64)>> {
        self.settle(tx, id, &[winner])
    }

    /// Split the pool between the top three. Admin only.
    pub fn settle_top3(
        &mut self,
        tx: &mut TxContext<'_>,
        id: u64,
        winners: [AccountId; 3],
    ) -> ArcadeResult<Vec<(AccountId, u64)>> {
        self.settle(tx, id, &winners)
    }

    fn settle(
        &mut self,
        tx: &mut TxContext<'_>,
        id: u64,
        winners: &[AccountId],
    ) -> ArcadeResult<Vec<(AccountId, u64)>> {
        self.admin.require(&tx.caller)?;
        let key = EscrowKey::Tournament(id);
        let tournament = self.tournaments.require(id)?;
        if tournament.status != TournamentStatus::Locked {
            return Err(ArcadeError::WrongState("tournament is not locked"));
        }
        if winners.len() != tournament.params.winners_count as usize {
            return Err(ArcadeError::WrongState("winner count does not match tournament"));
        }
        if tx.height < tournament.params.end_height {
            return Err(ArcadeError::DeadlineNotReached {
                deadline: tournament.params.end_height,
                now: tx.height,
            });
        }
        for (i, winner) in winners.iter().enumerate() {
            if !tournament.participants.contains(winner) {
                return Err(ArcadeError::NotParticipant);
            }
            if winners[..i].contains(winner) {
                return Err(ArcadeError::DuplicateWinner);
            }
        }

        let pool = tx.escrow.held(&key);
        let prizes = split_pool(pool, winners, &self.top3_split_bps);
        let transfers: Vec<(Payee, u64)> = prizes
            .iter()
            .map(|(winner, prize)| (Payee::Account(*winner), *prize))
            .collect();
        tx.escrow.release(key, &transfers)?;

        let tournament = self.tournaments.require_mut(id)?;
        tournament.status = TournamentStatus::Settled;
        tournament.prizes = prizes.clone();
        info!(tournament_id = id, pool, winners = winners.len(), "Tournament settled");
        Ok(prizes)
    }

    /// Call off an unsettled tournament. Admin only.
    pub fn cancel(&mut self, tx: &TxContext<'_>, id: u64) -> ArcadeResult<()> {
        self.admin.require(&tx.caller)?;
        let tournament = self.tournaments.require_mut(id)?;
        if !matches!(tournament.status, TournamentStatus::Open | TournamentStatus::Locked) {
            return Err(ArcadeError::WrongState("tournament already finished"));
        }
        tournament.status = TournamentStatus::Cancelled;
        warn!(
            tournament_id = id,
            refundable = tournament.participants.len(),
            "Tournament cancelled"
        );
        Ok(())
    }

    /// Reclaim the entry fee of a cancelled tournament. Once per participant.
    pub fn claim_refund(&mut self, tx: &mut TxContext<'_>, id: u64) -> ArcadeResult<u64> {
        let tournament = self.tournaments.require(id)?;
        if tournament.status != TournamentStatus::Cancelled {
            return Err(ArcadeError::WrongState("tournament is not cancelled"));
        }
        if !tournament.participants.contains(&tx.caller) {
            return Err(ArcadeError::NotParticipant);
        }
        if tournament.refunded.contains(&tx.caller) {
            return Err(ArcadeError::AlreadyClaimed);
        }

        let fee = tournament.params.entry_fee;
        tx.escrow
            .release(EscrowKey::Tournament(id), &[(Payee::Account(tx.caller), fee)])?;

        let tournament = self.tournaments.require_mut(id)?;
        tournament.refunded.insert(tx.caller);
        info!(tournament_id = id, player = %tx.caller.short(), fee, "Entry refunded");
        Ok(fee)
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        self.admin.hash_into(hasher);
        hasher.update_u64(self.tournaments.next_id());
        for (_, tournament) in self.tournaments.iter() {
            tournament.hash_into(hasher);
        }
    }
}

/// Divide `pool` among winners. Rounding dust and any unallocated basis
/// points go to first place.
fn split_pool(pool: u64, winners: &[AccountId], split_bps: &[u64; 3]) -> Vec<(AccountId, u64)> {
    if winners.len() == 1 {
        return vec![(winners[0], pool)];
    }
    let share = |bps: u64| ((pool as u128 * bps as u128) / BPS_DENOMINATOR as u128) as u64;
    let second = share(split_bps[1]);
    let third = share(split_bps[2]);
    let first = pool - second - third;
    vec![(winners[0], first), (winners[1], second), (winners[2], third)]
}
