//! # Arcade Ledger
//!
//! Deterministic commit-reveal wagering engine for ledger-settled mini-games.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ARCADE LEDGER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── clock.rs    - Ledger height, headers, sealed blocks     │
//! │  ├── ids.rs      - 16-byte account ids                       │
//! │  ├── rng.rs      - Xorshift128+ and randomness sources       │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  ledger/         - Value custody                             │
//! │  ├── escrow.rs   - Balances, house pool, per-record escrow   │
//! │  └── registry.rs - Identifier-indexed record tables          │
//! │                                                              │
//! │  game/           - Commit-reveal engine                      │
//! │  ├── machine.rs  - Generic wager state machine               │
//! │  ├── variant.rs  - Per-variant policy table                  │
//! │  ├── resolver.rs - Outcome rules                             │
//! │  └── hot_potato.rs, tic_tac_toe.rs                           │
//! │                                                              │
//! │  access/         - Lottery, tournaments, cosmetics,          │
//! │                    scoreboard, tasks                         │
//! │  engine/         - Operation enum, receipts, executor        │
//! │  proof/          - Transcript + verification by replay       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same configuration, randomness source, operation log and host
//! events (credits and sealed blocks), the engine reaches the same state
//! hash on any platform:
//! - Integer arithmetic only, overflow checked
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time; the ledger height is the only clock
//! - Draws seeded from the first host-sealed header after the commitment

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod access;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod game;
pub mod ledger;
pub mod proof;

// Re-export commonly used types
pub use config::{ArcadeConfig, ConfigError};
pub use core::ids::AccountId;
pub use core::rng::{FixedSeed, LedgerEntropy, RandomnessSource};
pub use engine::{Arcade, OpOutput, Operation, Receipt, SignedOp};
pub use error::{ArcadeError, ArcadeResult, ErrorKind};
pub use game::{GameStatus, GameVariant, commit_to};
pub use proof::{Transcript, verify_transcript};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
