//! State Hashing for Verification
//!
//! Provides deterministic hashing of engine state for:
//! - Replay verification of operation transcripts
//! - "Rejected operation left nothing behind" checks
//! - Ledger header chaining in the clock

use sha2::{Sha256, Digest};

use super::ids::AccountId;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for engine state.
///
/// Wraps SHA-256 with helpers for the integer and id types used in records.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for the full engine state.
    pub fn for_arcade_state() -> Self {
        Self::new(b"ARCADE_LEDGER_STATE_V1")
    }

    /// Create hasher for a ledger header.
    pub fn for_header() -> Self {
        Self::new(b"ARCADE_LEDGER_HEADER_V1")
    }

    /// Create hasher for one executed operation.
    pub fn for_operation() -> Self {
        Self::new(b"ARCADE_LEDGER_OP_V1")
    }

    /// Create hasher for the operations folded into a pending block.
    pub fn for_block_body() -> Self {
        Self::new(b"ARCADE_LEDGER_BLOCK_BODY_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with an account id (16 bytes).
    #[inline]
    pub fn update_account(&mut self, account: &AccountId) {
        self.hasher.update(account.as_bytes());
    }

    /// Update with an optional account id (presence byte first).
    #[inline]
    pub fn update_opt_account(&mut self, account: Option<&AccountId>) {
        match account {
            Some(account) => {
                self.update_u8(1);
                self.update_account(account);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with an optional u64 (presence byte first).
    #[inline]
    pub fn update_opt_u64(&mut self, value: Option<u64>) {
        match value {
            Some(value) => {
                self.update_u8(1);
                self.update_u64(value);
            }
            None => self.update_u8(0),
        }
    }

    /// Update with a length-prefixed byte string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_arcade_state();
            hasher.update_u32(100);
            hasher.update_u64(12345);
            hasher.update_account(&AccountId::new([3; 16]));
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(1);
            h.update_u64(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u64(2);
            h.update_u64(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_domain_separation() {
        let data = [1u8, 2, 3, 4];

        let hash1 = {
            let mut h = StateHasher::new(b"DOMAIN_A");
            h.update_bytes(&data);
            h.finalize()
        };
        let hash2 = {
            let mut h = StateHasher::new(b"DOMAIN_B");
            h.update_bytes(&data);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_optional_fields_are_unambiguous() {
        let none_then_zero = {
            let mut h = StateHasher::new(b"opt");
            h.update_opt_u64(None);
            h.update_u64(0);
            h.finalize()
        };
        let some_zero = {
            let mut h = StateHasher::new(b"opt");
            h.update_opt_u64(Some(0));
            h.finalize()
        };

        assert_ne!(none_then_zero, some_zero);
    }
}
