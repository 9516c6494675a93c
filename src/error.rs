//! Engine Errors
//!
//! Every operation returns `Result<_, ArcadeError>`. Each variant belongs to
//! exactly one [`ErrorKind`] so callers can branch on the cause, and carries
//! a stable numeric code for receipts and transcripts.
//!
//! All errors are raised before any state is touched.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArcadeError {
    /// Stake, fee, price or amount was zero.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Caller cannot cover the amount.
    #[error("insufficient funds: need {need}, available {available}")]
    InsufficientFunds {
        /// Amount required.
        need: u64,
        /// Amount the payer holds.
        available: u64,
    },

    /// Referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record type ("game", "round", "drop", ...).
        entity: &'static str,
        /// Requested identifier.
        id: u64,
    },

    /// Operation attempted outside its valid status.
    #[error("wrong state: {0}")]
    WrongState(&'static str),

    /// Caller lacks the required role.
    #[error("unauthorized")]
    Unauthorized,

    /// Revealed secret and choices do not hash to the stored commitment.
    #[error("commitment mismatch")]
    CommitmentMismatch,

    /// Choice or argument outside its domain.
    #[error("{field} out of range: {value} (max {max})")]
    OutOfRange {
        /// Argument name.
        field: &'static str,
        /// Supplied value.
        value: u64,
        /// Largest accepted value.
        max: u64,
    },

    /// Operation needs the deadline to have passed.
    #[error("deadline not reached: deadline {deadline}, height {now}")]
    DeadlineNotReached {
        /// Deadline height.
        deadline: u64,
        /// Current height.
        now: u64,
    },

    /// Operation must happen before the deadline.
    #[error("deadline passed: deadline {deadline}, height {now}")]
    DeadlinePassed {
        /// Deadline height.
        deadline: u64,
        /// Current height.
        now: u64,
    },

    /// Claim or refund already taken by this account.
    #[error("already claimed")]
    AlreadyClaimed,

    /// Drop supply cap reached.
    #[error("supply exhausted (max {max_supply})")]
    SupplyExhausted {
        /// Cap of the drop.
        max_supply: u64,
    },

    /// Permit nonce already consumed.
    #[error("nonce {nonce} already used")]
    NonceReused {
        /// The replayed nonce.
        nonce: u64,
    },

    /// Permit signature did not verify.
    #[error("invalid permit signature")]
    InvalidSignature,

    /// Account already entered this tournament or game.
    #[error("already joined")]
    AlreadyJoined,

    /// Named account never joined.
    #[error("not a participant")]
    NotParticipant,

    /// The same account was named for two placements.
    #[error("duplicate winner")]
    DuplicateWinner,

    /// Tic-tac-toe move by the side not on turn.
    #[error("not your turn")]
    NotYourTurn,

    /// Tic-tac-toe cell already taken.
    #[error("cell occupied")]
    CellOccupied,

    /// Arithmetic would overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Escrow would pay out more than it holds. Indicates an engine bug.
    #[error("escrow shortfall: payout {payout}, held {held}")]
    EscrowShortfall {
        /// Requested payout total.
        payout: u64,
        /// Value held for the record.
        held: u64,
    },
}

/// Failure kinds callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Zero or unaffordable amount.
    InvalidAmount,
    /// Missing record.
    NotFound,
    /// Wrong lifecycle status.
    WrongState,
    /// Missing role.
    Unauthorized,
    /// Reveal did not match.
    CommitmentMismatch,
    /// Argument outside its domain.
    OutOfRange,
    /// Too early.
    DeadlineNotReached,
    /// Too late.
    DeadlinePassed,
    /// Replayed claim.
    AlreadyClaimed,
    /// Capacity reached.
    SupplyExhausted,
    /// Replayed permit.
    NonceReused,
    /// Bad permit.
    InvalidSignature,
    /// Duplicate entry.
    AlreadyJoined,
    /// Unknown participant.
    NotParticipant,
    /// Duplicate placement.
    DuplicateWinner,
    /// Out of turn.
    NotYourTurn,
    /// Occupied cell.
    CellOccupied,
    /// Overflow.
    Overflow,
    /// Engine invariant violated.
    Internal,
}

impl ArcadeError {
    /// Failure kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount | Self::InsufficientFunds { .. } => ErrorKind::InvalidAmount,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::WrongState(_) => ErrorKind::WrongState,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::CommitmentMismatch => ErrorKind::CommitmentMismatch,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::DeadlineNotReached { .. } => ErrorKind::DeadlineNotReached,
            Self::DeadlinePassed { .. } => ErrorKind::DeadlinePassed,
            Self::AlreadyClaimed => ErrorKind::AlreadyClaimed,
            Self::SupplyExhausted { .. } => ErrorKind::SupplyExhausted,
            Self::NonceReused { .. } => ErrorKind::NonceReused,
            Self::InvalidSignature => ErrorKind::InvalidSignature,
            Self::AlreadyJoined => ErrorKind::AlreadyJoined,
            Self::NotParticipant => ErrorKind::NotParticipant,
            Self::DuplicateWinner => ErrorKind::DuplicateWinner,
            Self::NotYourTurn => ErrorKind::NotYourTurn,
            Self::CellOccupied => ErrorKind::CellOccupied,
            Self::Overflow => ErrorKind::Overflow,
            Self::EscrowShortfall { .. } => ErrorKind::Internal,
        }
    }

    /// Stable numeric code for receipts. Zero is reserved for success.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidAmount => 101,
            Self::InsufficientFunds { .. } => 102,
            Self::NotFound { .. } => 104,
            Self::WrongState(_) => 105,
            Self::CommitmentMismatch => 106,
            Self::DeadlineNotReached { .. } => 107,
            Self::DeadlinePassed { .. } => 108,
            Self::OutOfRange { .. } => 400,
            Self::NotYourTurn => 402,
            Self::CellOccupied => 403,
            Self::AlreadyJoined => 500,
            Self::NotParticipant => 501,
            Self::DuplicateWinner => 502,
            Self::AlreadyClaimed => 700,
            Self::SupplyExhausted { .. } => 701,
            Self::NonceReused { .. } => 702,
            Self::InvalidSignature => 703,
            Self::Overflow => 800,
            Self::Unauthorized => 900,
            Self::EscrowShortfall { .. } => 999,
        }
    }

    /// Shorthand for a missing record.
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Engine result alias.
pub type ArcadeResult<T> = Result<T, ArcadeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_errors_share_kind() {
        assert_eq!(ArcadeError::InvalidAmount.kind(), ErrorKind::InvalidAmount);
        let short = ArcadeError::InsufficientFunds { need: 10, available: 3 };
        assert_eq!(short.kind(), ErrorKind::InvalidAmount);
        assert_ne!(short.code(), ArcadeError::InvalidAmount.code());
    }

    #[test]
    fn test_mismatch_and_range_are_distinct() {
        let range = ArcadeError::OutOfRange { field: "pick", value: 12, max: 9 };
        assert_ne!(range.kind(), ArcadeError::CommitmentMismatch.kind());
        assert_eq!(ArcadeError::CommitmentMismatch.code(), 106);
        assert_eq!(range.code(), 400);
    }

    #[test]
    fn test_display() {
        let err = ArcadeError::not_found("game", 7);
        assert_eq!(err.to_string(), "game 7 not found");
        assert_eq!(ArcadeError::Unauthorized.code(), 900);
    }
}
