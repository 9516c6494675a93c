//! Access-Controlled Tables
//!
//! Lottery, tournaments, cosmetics, scoreboard and tasks. Each reuses the
//! escrow ledger and clock through [`TxContext`](crate::ledger::TxContext)
//! but applies its own authorization rule:
//!
//! | Table       | Privileged role             | Escrow |
//! |-------------|-----------------------------|--------|
//! | scoreboard  | admin slot                  | no     |
//! | lottery     | admin slot                  | yes    |
//! | cosmetics   | admin slot + claim signer   | no     |
//! | tournament  | admin slot                  | yes    |
//! | tasks       | owner                       | no     |

pub mod admin;
pub mod cosmetics;
pub mod lottery;
pub mod scoreboard;
pub mod tasks;
pub mod tournament;

pub use admin::AdminSlot;
pub use cosmetics::{CosmeticDrop, Cosmetics, PermitSignature, SignerKey, Token, permit_message};
pub use lottery::{DrawOutcome, Lottery, LotteryRound, RoundStatus};
pub use scoreboard::Scoreboard;
pub use tasks::{Task, TaskList};
pub use tournament::{Tournament, TournamentParams, TournamentStatus, TournamentTable};
