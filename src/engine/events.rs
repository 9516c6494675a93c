//! Receipts
//!
//! What the engine hands back for every submitted operation: the success
//! payload or the failure kind and code. Receipts are what a UI branches
//! on and what the replay binary prints.

use serde::{Serialize, Deserialize};

use crate::access::{CosmeticDrop, DrawOutcome, LotteryRound, Task, Token, Tournament};
use crate::core::hash::StateHash;
use crate::core::ids::AccountId;
use crate::error::{ArcadeError, ErrorKind};
use crate::game::{BoardStatus, ExpirySettlement, HotPotatoGame, RevealOutcome, TicTacToeGame, WagerGame};

/// Success payload of an operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpOutput {
    /// Accepted with nothing to report.
    Done,
    /// New record identifier.
    Created(u64),
    /// An amount (balance, score, refund, new house pool).
    Amount(u64),
    /// A flag.
    Flag(bool),
    /// New ledger height.
    Height(u64),
    /// Reveal result.
    Reveal(RevealOutcome),
    /// Expiry settlement.
    Expired(ExpirySettlement),
    /// Account that took a pot.
    Winner(AccountId),
    /// Board after a move.
    Board(BoardStatus),
    /// Lottery draw.
    Drawn(DrawOutcome),
    /// Tournament prizes in placement order.
    Prizes(Vec<(AccountId, u64)>),
    /// Wager game lookup.
    Game(Option<WagerGame>),
    /// Hot-potato lookup.
    Potato(Option<HotPotatoGame>),
    /// Tic-tac-toe lookup.
    TicTacToe(Option<TicTacToeGame>),
    /// Lottery round lookup.
    Round(Option<LotteryRound>),
    /// Tournament lookup.
    Tournament(Option<Tournament>),
    /// Drop lookup.
    Drop(Option<CosmeticDrop>),
    /// Token lookup.
    Token(Option<Token>),
    /// Token URI lookup.
    Uri(Option<String>),
    /// Task lookup.
    Task(Option<Task>),
}

/// Outcome of one submitted operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Position in the engine's operation log.
    pub seq: u64,
    /// Ledger height the operation executed at.
    pub height: u64,
    /// Submitting account.
    pub caller: AccountId,
    /// Action name.
    pub action: String,
    /// 0 on success, otherwise [`ArcadeError::code`].
    pub code: u32,
    /// Failure kind when rejected.
    pub error_kind: Option<ErrorKind>,
    /// Failure description when rejected.
    pub error: Option<String>,
    /// Payload when accepted.
    pub output: Option<OpOutput>,
    /// State hash after the operation.
    #[serde(with = "crate::core::hex_bytes::array")]
    pub state_hash: StateHash,
}

impl Receipt {
    /// Build from an execution result.
    pub fn new(
        seq: u64,
        height: u64,
        caller: AccountId,
        action: &str,
        result: &Result<OpOutput, ArcadeError>,
        state_hash: StateHash,
    ) -> Self {
        let (code, error_kind, error, output) = match result {
            Ok(output) => (0, None, None, Some(output.clone())),
            Err(err) => (err.code(), Some(err.kind()), Some(err.to_string()), None),
        };
        Self {
            seq,
            height,
            caller,
            action: action.to_string(),
            code,
            error_kind,
            error,
            output,
            state_hash,
        }
    }

    /// True when the operation was accepted.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_from_error() {
        let caller = AccountId::from_label("wallet_2");
        let result = Err(ArcadeError::Unauthorized);
        let receipt = Receipt::new(4, 10, caller, "set-score", &result, [1; 32]);

        assert!(!receipt.is_ok());
        assert_eq!(receipt.code, 900);
        assert_eq!(receipt.error_kind, Some(ErrorKind::Unauthorized));
        assert!(receipt.output.is_none());
    }

    #[test]
    fn test_receipt_json() {
        let caller = AccountId::from_label("wallet_1");
        let receipt = Receipt::new(0, 3, caller, "create-game", &Ok(OpOutput::Created(0)), [0; 32]);
        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["code"], 0);
        assert_eq!(json["output"]["created"], 0);
        assert_eq!(json["state_hash"], "0".repeat(64));
    }
}
