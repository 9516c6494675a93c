//! Core deterministic primitives.
//!
//! Everything the engine needs that is not game-specific: who is calling,
//! what time it is on the ledger, how state is hashed and where draws
//! get their seeds.

pub mod clock;
pub mod hash;
pub mod hex_bytes;
pub mod ids;
pub mod rng;

// Re-export core types
pub use clock::{Clock, LedgerClock};
pub use hash::{StateHash, StateHasher};
pub use ids::AccountId;
pub use rng::{DeterministicRng, DrawRequest, FixedSeed, LedgerEntropy, RandomnessSource};
