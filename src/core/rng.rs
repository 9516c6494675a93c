//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ algorithm for fast, high-quality, deterministic randomness.
//! Given the same seed, produces identical sequence on all platforms.
//!
//! Seeds come from a [`RandomnessSource`]. The engine never reads entropy
//! on its own: house draws and lottery picks ask the injected source for a
//! seed built from ledger material that exists only at execution time.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

use super::hash::StateHash;

/// Domain separator for draw seeds.
const DRAW_DOMAIN: &[u8] = b"ARCADE_LEDGER_DRAW_V1";

/// Deterministic PRNG using Xorshift128+ algorithm.
///
/// # Determinism Guarantee
///
/// Given the same seed, this RNG will produce the exact same sequence
/// of random numbers on any platform.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Ensure state is never all zeros
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a uniform integer in range [0, bound).
    ///
    /// Rejection sampling removes the modulo bias, so every ticket in a
    /// lottery and every face of a house draw is equally likely.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        if bound <= 1 {
            return 0;
        }
        // Largest multiple of `bound` that fits in u64
        let zone = u64::MAX - (u64::MAX % bound);
        loop {
            let value = self.next_u64();
            if value < zone {
                return value % bound;
            }
        }
    }
}

/// SplitMix64 for seed initialization.
/// Produces well-distributed values from sequential seeds.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// RANDOMNESS SOURCES
// =============================================================================

/// Everything a randomness source may mix into a draw seed.
#[derive(Clone, Copy, Debug)]
pub struct DrawRequest<'a> {
    /// Which table is drawing (e.g. `b"coin-flip"`, `b"lottery"`).
    pub domain: &'a [u8],
    /// Identifier of the instance being resolved.
    pub scope: u64,
    /// Height of the sealed block the draw reads.
    pub height: u64,
    /// Header hash of that block.
    pub header_hash: StateHash,
    /// Extra material revealed in the same operation (player secret, ...).
    pub salt: &'a [u8],
}

/// Injected capability that turns execution-time material into a seed.
pub trait RandomnessSource: Send + Sync {
    /// Produce the seed for one draw.
    fn seed(&self, request: &DrawRequest<'_>) -> u64;

    /// Short name for logs and transcripts.
    fn name(&self) -> &'static str;
}

/// Production source: hashes a host-sealed ledger header.
///
/// Draws read the first block sealed after the commitment. Its header
/// mixes in a beacon the host supplies when sealing, so it does not exist
/// when the player commits.
#[derive(Clone, Copy, Debug, Default)]
pub struct LedgerEntropy;

impl RandomnessSource for LedgerEntropy {
    fn seed(&self, request: &DrawRequest<'_>) -> u64 {
        derive_draw_seed(request)
    }

    fn name(&self) -> &'static str {
        "ledger-entropy"
    }
}

/// Test source: every draw uses the same seed.
#[derive(Clone, Copy, Debug)]
pub struct FixedSeed(pub u64);

impl RandomnessSource for FixedSeed {
    fn seed(&self, _request: &DrawRequest<'_>) -> u64 {
        self.0
    }

    fn name(&self) -> &'static str {
        "fixed-seed"
    }
}

/// Derive a draw seed from verifiable execution-time parameters.
pub fn derive_draw_seed(request: &DrawRequest<'_>) -> u64 {
    let mut hasher = Sha256::new();

    hasher.update(DRAW_DOMAIN);
    hasher.update((request.domain.len() as u64).to_le_bytes());
    hasher.update(request.domain);
    hasher.update(request.header_hash);
    hasher.update(request.height.to_le_bytes());
    hasher.update(request.scope.to_le_bytes());
    hasher.update(request.salt);

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(seed)
}

/// Draw a uniform value in [0, bound) through the given source.
pub fn draw_below(source: &dyn RandomnessSource, request: &DrawRequest<'_>, bound: u64) -> u64 {
    DeterministicRng::new(source.seed(request)).next_below(bound)
}

// =============================================================================
// TESTS
// =============================================================================
