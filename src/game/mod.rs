//! Game Logic
//!
//! The commit-reveal engine and the non-escrowed board games.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    WagerTable (machine)                  │
//! │  create → join → reveal → resolve │ expire │ cancel      │
//! └──────────────────────────────────────────────────────────┘
//!          │ policy               │ verify        │ resolve
//!          ▼                      ▼               ▼
//! ┌────────────────┐   ┌──────────────────┐   ┌──────────────┐
//! │ VariantPolicy  │   │ commitment       │   │ resolver     │
//! │ (variant.rs)   │   │ sha256(s ‖ c)    │   │ per variant  │
//! └────────────────┘   └──────────────────┘   └──────────────┘
//! ```

pub mod commitment;
pub mod hot_potato;
pub mod machine;
pub mod resolver;
pub mod state;
pub mod tic_tac_toe;
pub mod variant;

pub use commitment::{Commitment, Secret, commit_to, compute_commitment, verify};
pub use hot_potato::{HotPotatoGame, HotPotatoTable, PotatoStatus};
pub use machine::{ExpirySettlement, RevealOutcome, WagerTable};
pub use resolver::{OutcomeResolver, Verdict};
pub use state::{GameResult, GameStatus, Side, WagerGame};
pub use tic_tac_toe::{BoardStatus, Mark, TicTacToeGame, TicTacToeTable};
pub use variant::{ExpiryPolicy, GameVariant, VariantPolicy};
