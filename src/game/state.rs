//! Wager Records
//!
//! The persisted record of one commit-reveal game instance, shared by every
//! variant in the policy table.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHasher;
use crate::core::hex_bytes;
use crate::core::ids::AccountId;
use crate::game::commitment::Commitment;
use crate::game::resolver::Verdict;
use crate::game::variant::GameVariant;

/// Lifecycle status of a wager.
///
/// `Resolved`, `Expired` and `Cancelled` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameStatus {
    /// Created; waiting for an opponent (duel) or the reveal (house game).
    Open,
    /// Both sides staked; waiting for reveals.
    AwaitingReveal,
    /// Outcome computed and paid.
    Resolved,
    /// Deadline passed and stakes settled by expiry.
    Expired,
    /// Withdrawn by the creator before anyone joined.
    Cancelled,
}

impl GameStatus {
    /// Still accepting transitions.
    pub fn is_active(&self) -> bool {
        matches!(self, GameStatus::Open | GameStatus::AwaitingReveal)
    }
}

/// A party to a duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Side {
    /// Created the game.
    Creator,
    /// Joined the game.
    Opponent,
}

/// Outcome stored on the `Resolved` transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    /// Resolver verdict.
    pub verdict: Verdict,
    /// Account that took the pot, if any.
    pub winner: Option<AccountId>,
    /// Amount paid to each player (creator first).
    pub payouts: Vec<(AccountId, u64)>,
    /// Height of resolution.
    pub resolved_at: u64,
}

/// One commit-reveal game instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerGame {
    /// Identifier within the variant's table.
    pub id: u64,
    /// Variant this game runs under.
    pub variant: GameVariant,
    /// Account that created and staked first.
    pub creator: AccountId,
    /// Second party (duels only).
    pub opponent: Option<AccountId>,
    /// Stake per participant.
    pub stake: u64,
    /// House value reserved to cover a win (house games only).
    pub house_reserve: u64,
    /// Creator's commitment.
    #[serde(with = "hex_bytes::array")]
    pub commitment_creator: Commitment,
    /// Opponent's commitment.
    #[serde(with = "hex_bytes::option_array", default)]
    pub commitment_opponent: Option<Commitment>,
    /// Creator's revealed choice bytes.
    pub revealed_creator: Option<Vec<u8>>,
    /// Opponent's revealed choice bytes.
    pub revealed_opponent: Option<Vec<u8>>,
    /// Current status.
    pub status: GameStatus,
    /// Creation height.
    pub created_at: u64,
    /// Join height (duels).
    pub joined_at: Option<u64>,
    /// First height at which reveals are refused and expiry is allowed.
    pub reveal_deadline: u64,
    /// Outcome, set once on resolution.
    pub result: Option<GameResult>,
    /// Account awarded the pot at expiry for being the only one to reveal.
    pub expiry_winner: Option<AccountId>,
}

impl WagerGame {
    /// Which side `account` plays, if any.
    pub fn side_of(&self, account: &AccountId) -> Option<Side> {
        if *account == self.creator {
            Some(Side::Creator)
        } else if self.opponent.as_ref() == Some(account) {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    /// Stored commitment of a side.
    pub fn commitment(&self, side: Side) -> Option<&Commitment> {
        match side {
            Side::Creator => Some(&self.commitment_creator),
            Side::Opponent => self.commitment_opponent.as_ref(),
        }
    }

    /// Revealed bytes of a side.
    pub fn revealed(&self, side: Side) -> Option<&[u8]> {
        match side {
            Side::Creator => self.revealed_creator.as_deref(),
            Side::Opponent => self.revealed_opponent.as_deref(),
        }
    }

    /// Numeric status as exposed by the deployed tables.
    ///
    /// House games: 0 open, 1 resolved, 2 expired.
    /// Duels: 0 open, 1 awaiting reveal, 2 resolved, 3 expired, 4 cancelled.
    pub fn status_code(&self) -> u8 {
        if self.variant.is_house_game() {
            match self.status {
                GameStatus::Open | GameStatus::AwaitingReveal => 0,
                GameStatus::Resolved => 1,
                GameStatus::Expired => 2,
                GameStatus::Cancelled => 3,
            }
        } else {
            match self.status {
                GameStatus::Open => 0,
                GameStatus::AwaitingReveal => 1,
                GameStatus::Resolved => 2,
                GameStatus::Expired => 3,
                GameStatus::Cancelled => 4,
            }
        }
    }

    /// Fold into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.id);
        hasher.update_u8(self.variant.tag());
        hasher.update_account(&self.creator);
        hasher.update_opt_account(self.opponent.as_ref());
        hasher.update_u64(self.stake);
        hasher.update_u64(self.house_reserve);
        hasher.update_bytes(&self.commitment_creator);
        match &self.commitment_opponent {
            Some(c) => {
                hasher.update_u8(1);
                hasher.update_bytes(c);
            }
            None => hasher.update_u8(0),
        }
        for revealed in [&self.revealed_creator, &self.revealed_opponent] {
            match revealed {
                Some(bytes) => {
                    hasher.update_u8(1);
                    hasher.update_u64(bytes.len() as u64);
                    hasher.update_bytes(bytes);
                }
                None => hasher.update_u8(0),
            }
        }
        hasher.update_u8(self.status_code());
        hasher.update_u64(self.created_at);
        hasher.update_opt_u64(self.joined_at);
        hasher.update_u64(self.reveal_deadline);
        match &self.result {
            Some(result) => {
                hasher.update_u8(1);
                match result.verdict {
                    Verdict::House { draw, payout_bps } => {
                        hasher.update_u8(0);
                        hasher.update_u8(draw);
                        hasher.update_u64(payout_bps);
                    }
                    Verdict::CreatorWins => hasher.update_u8(1),
                    Verdict::OpponentWins => hasher.update_u8(2),
                    Verdict::Push => hasher.update_u8(3),
                }
                hasher.update_opt_account(result.winner.as_ref());
                for (account, amount) in &result.payouts {
                    hasher.update_account(account);
                    hasher.update_u64(*amount);
                }
                hasher.update_u64(result.resolved_at);
            }
            None => hasher.update_u8(0),
        }
        hasher.update_opt_account(self.expiry_winner.as_ref());
    }
}
