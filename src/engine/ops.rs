//! Operations
//!
//! Every action an external caller can submit, as one tagged enum. The
//! externally tagged kebab-case form reads naturally in JSON operation logs
//! (`{"create-game": {"variant": "coin-flip", ...}}`) and stays compact
//! under bincode in transcripts.

use serde::{Serialize, Deserialize};

use crate::core::hex_bytes;
use crate::core::ids::AccountId;
use crate::game::commitment::{Commitment, Secret};
use crate::game::variant::GameVariant;

/// Tables that own an admin slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminTable {
    /// Scoreboard.
    Scoreboard,
    /// Lottery rounds.
    Lottery,
    /// Tournaments.
    Tournament,
    /// Cosmetics drops.
    Cosmetics,
}

impl AdminTable {
    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AdminTable::Scoreboard => "scoreboard",
            AdminTable::Lottery => "lottery",
            AdminTable::Tournament => "tournament",
            AdminTable::Cosmetics => "cosmetics",
        }
    }
}

/// An operation submitted by a caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    // Ledger
    /// Move value from the caller into the house pool.
    FundHouse { amount: u64 },
    /// Mine `blocks` blocks. These carry no host beacon, so they never
    /// serve as draw entropy.
    Advance { blocks: u64 },
    /// Read an account balance.
    GetBalance { account: AccountId },
    /// Read the house pool.
    GetHouseBalance,

    // Commit-reveal games
    /// Stake and commit.
    CreateGame {
        /// Variant table.
        variant: GameVariant,
        /// Stake.
        stake: u64,
        /// `sha256(secret ‖ choice bytes)`.
        #[serde(with = "hex_bytes::array")]
        commitment: Commitment,
    },
    /// Match the stake of an open duel.
    JoinGame {
        /// Variant table.
        variant: GameVariant,
        /// Game id.
        id: u64,
        /// Opponent commitment.
        #[serde(with = "hex_bytes::array")]
        commitment: Commitment,
    },
    /// Open a commitment.
    Reveal {
        /// Variant table.
        variant: GameVariant,
        /// Game id.
        id: u64,
        /// Choice fields in commitment order.
        choices: Vec<u64>,
        /// Commitment secret.
        #[serde(with = "hex_bytes::array")]
        secret: Secret,
    },
    /// Settle a game whose reveal deadline passed.
    ExpireGame { variant: GameVariant, id: u64 },
    /// Withdraw an unjoined duel.
    CancelGame { variant: GameVariant, id: u64 },
    /// Read a game record.
    GetGame { variant: GameVariant, id: u64 },

    // Hot potato
    /// Open a hot-potato game holding the potato.
    CreatePotato { stake: u64 },
    /// Take the potato.
    TakePotato { id: u64 },
    /// Pay the holder once the timer ran out.
    SettlePotato { id: u64 },
    /// Withdraw before any pass.
    CancelPotato { id: u64 },
    /// Read a hot-potato record.
    GetPotato { id: u64 },

    // Tic-tac-toe
    /// Open a board as X.
    CreateBoard,
    /// Join a board as O.
    JoinBoard { id: u64 },
    /// Mark a cell (0-8, row-major).
    Play { id: u64, cell: u64 },
    /// Read a board.
    GetBoard { id: u64 },

    // Admin slots
    /// Claim the admin slot of a table.
    InitAdmin { table: AdminTable },

    // Scoreboard
    /// Overwrite a score.
    SetScore { player: AccountId, value: u64 },
    /// Add to a score.
    AddScore { player: AccountId, delta: u64 },
    /// Read a score.
    GetScore { player: AccountId },

    // Lottery
    /// Open a round.
    CreateRound { ticket_price: u64, duration: u64 },
    /// Buy one ticket.
    BuyTicket { round_id: u64 },
    /// Draw the winner.
    Draw { round_id: u64 },
    /// Close an unsold round.
    CancelRound { round_id: u64 },
    /// Read a round.
    GetRound { round_id: u64 },

    // Tournament
    /// Create a tournament organized by the caller.
    CreateTournament {
        /// Fee per entry.
        entry_fee: u64,
        /// Capacity.
        max_players: u64,
        /// Entries close.
        start_height: u64,
        /// Settlement opens.
        end_height: u64,
        /// 1 or 3.
        winners_count: u8,
    },
    /// Pay the entry fee.
    JoinTournament { id: u64 },
    /// Close entries.
    LockTournament { id: u64 },
    /// Call off.
    CancelTournament { id: u64 },
    /// Reclaim an entry fee after cancellation.
    ClaimRefund { id: u64 },
    /// Pay one winner.
    SettleSingle { id: u64, winner: AccountId },
    /// Pay the top three.
    SettleTop3 {
        /// Tournament id.
        id: u64,
        /// First place.
        first: AccountId,
        /// Second place.
        second: AccountId,
        /// Third place.
        third: AccountId,
    },
    /// Read a tournament.
    GetTournament { id: u64 },

    // Cosmetics
    /// Open a drop.
    CreateDrop { category: u64, skin: u64, max_supply: u64, required_badge: u64 },
    /// Set a drop's metadata URI.
    SetDropUri { id: u64, uri: String },
    /// Pause or resume a drop.
    SetDropActive { id: u64, active: bool },
    /// Register the permit signer.
    SetClaimSigner {
        /// Ed25519 public key.
        #[serde(with = "hex_bytes::array")]
        public_key: [u8; 32],
    },
    /// Grant a badge.
    GrantBadge { player: AccountId, badge: u64 },
    /// Claim with the drop's badge.
    ClaimDrop { id: u64 },
    /// Claim with a signed permit.
    ClaimWithPermit {
        /// Drop id.
        id: u64,
        /// Single-use nonce.
        nonce: u64,
        /// Ed25519 signature over the permit message.
        #[serde(with = "hex_bytes::array")]
        signature: [u8; 64],
    },
    /// Move a token.
    Transfer { token_id: u64, from: AccountId, to: AccountId },
    /// Read a drop.
    GetDrop { id: u64 },
    /// Read a token.
    GetToken { id: u64 },
    /// Read a token's URI.
    GetTokenUri { id: u64 },
    /// Whether a player holds a badge.
    GetBadge { player: AccountId, badge: u64 },

    // Tasks
    /// Create a task.
    CreateTask,
    /// Set a task's done flag.
    SetCompleted { id: u64, completed: bool },
    /// Read a task.
    GetTask { id: u64 },
    /// Delete a task.
    DeleteTask { id: u64 },
}

impl Operation {
    /// Kebab-case action name, as used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::FundHouse { .. } => "fund-house",
            Operation::Advance { .. } => "advance",
            Operation::GetBalance { .. } => "get-balance",
            Operation::GetHouseBalance => "get-house-balance",
            Operation::CreateGame { .. } => "create-game",
            Operation::JoinGame { .. } => "join-game",
            Operation::Reveal { .. } => "reveal",
            Operation::ExpireGame { .. } => "expire-game",
            Operation::CancelGame { .. } => "cancel-game",
            Operation::GetGame { .. } => "get-game",
            Operation::CreatePotato { .. } => "create-potato",
            Operation::TakePotato { .. } => "take-potato",
            Operation::SettlePotato { .. } => "settle-potato",
            Operation::CancelPotato { .. } => "cancel-potato",
            Operation::GetPotato { .. } => "get-potato",
            Operation::CreateBoard => "create-board",
            Operation::JoinBoard { .. } => "join-board",
            Operation::Play { .. } => "play",
            Operation::GetBoard { .. } => "get-board",
            Operation::InitAdmin { .. } => "init-admin",
            Operation::SetScore { .. } => "set-score",
            Operation::AddScore { .. } => "add-score",
            Operation::GetScore { .. } => "get-score",
            Operation::CreateRound { .. } => "create-round",
            Operation::BuyTicket { .. } => "buy-ticket",
            Operation::Draw { .. } => "draw",
            Operation::CancelRound { .. } => "cancel-round",
            Operation::GetRound { .. } => "get-round",
            Operation::CreateTournament { .. } => "create-tournament",
            Operation::JoinTournament { .. } => "join-tournament",
            Operation::LockTournament { .. } => "lock-tournament",
            Operation::CancelTournament { .. } => "cancel-tournament",
            Operation::ClaimRefund { .. } => "claim-refund",
            Operation::SettleSingle { .. } => "settle-single",
            Operation::SettleTop3 { .. } => "settle-top3",
            Operation::GetTournament { .. } => "get-tournament",
            Operation::CreateDrop { .. } => "create-drop",
            Operation::SetDropUri { .. } => "set-drop-uri",
            Operation::SetDropActive { .. } => "set-drop-active",
            Operation::SetClaimSigner { .. } => "set-claim-signer",
            Operation::GrantBadge { .. } => "grant-badge",
            Operation::ClaimDrop { .. } => "claim-drop",
            Operation::ClaimWithPermit { .. } => "claim-with-permit",
            Operation::Transfer { .. } => "transfer",
            Operation::GetDrop { .. } => "get-drop",
            Operation::GetToken { .. } => "get-token",
            Operation::GetTokenUri { .. } => "get-token-uri",
            Operation::GetBadge { .. } => "get-badge",
            Operation::CreateTask => "create-task",
            Operation::SetCompleted { .. } => "set-completed",
            Operation::GetTask { .. } => "get-task",
            Operation::DeleteTask { .. } => "delete-task",
        }
    }

    /// True for lookups that never mutate state.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Operation::GetBalance { .. }
                | Operation::GetHouseBalance
                | Operation::GetGame { .. }
                | Operation::GetPotato { .. }
                | Operation::GetBoard { .. }
                | Operation::GetScore { .. }
                | Operation::GetRound { .. }
                | Operation::GetTournament { .. }
                | Operation::GetDrop { .. }
                | Operation::GetToken { .. }
                | Operation::GetTokenUri { .. }
                | Operation::GetBadge { .. }
                | Operation::GetTask { .. }
        )
    }
}

/// One line of an operation log: who submits what.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOp {
    /// Submitting account (UUID string or label in JSON).
    pub caller: AccountId,
    /// The operation.
    pub op: Operation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_log_shape() {
        let json = r#"{
            "caller": "wallet_1",
            "op": {"create-game": {
                "variant": "rock-paper-scissors",
                "stake": 1000000,
                "commitment": "0x0000000000000000000000000000000000000000000000000000000000000001"
            }}
        }"#;
        let signed: SignedOp = serde_json::from_str(json).unwrap();
        assert_eq!(signed.caller, AccountId::from_label("wallet_1"));
        match signed.op {
            Operation::CreateGame { variant, stake, commitment } => {
                assert_eq!(variant, GameVariant::RockPaperScissors);
                assert_eq!(stake, 1_000_000);
                assert_eq!(commitment[31], 1);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn test_unit_ops_and_names() {
        let op: Operation = serde_json::from_str(r#""create-task""#).unwrap();
        assert_eq!(op, Operation::CreateTask);
        assert_eq!(op.name(), "create-task");
        assert!(!op.is_read_only());
        assert!(Operation::GetScore { player: AccountId::default() }.is_read_only());
    }

    #[test]
    fn test_bincode_keeps_hex_fields() {
        let op = Operation::ClaimWithPermit { id: 3, nonce: 9, signature: [7; 64] };
        let bytes = bincode::serialize(&op).unwrap();
        let back: Operation = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, op);
    }
}
