//! Ledger Clock
//!
//! The only notion of time in the engine is the height of the shared
//! ledger. Deadlines are heights; nothing is ever scheduled.
//!
//! Every header commits to the previous header, the new height and a
//! digest of the operations executed since the last block. Blocks mined
//! by `advance` carry nothing else and are fully predictable. Blocks the
//! host seals also carry a beacon supplied from outside the operation log;
//! only those headers are used as draw entropy.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Serialize, Deserialize};

use super::hash::{StateHash, StateHasher};

/// Read access to the ledger height and the executing block's header.
pub trait Clock {
    /// Current ledger height (monotonically increasing).
    fn height(&self) -> u64;

    /// Header hash of the block at the current height.
    fn header_hash(&self) -> StateHash;
}

/// Clock driven by the operation log and host-sealed blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerClock {
    height: u64,
    header_hash: StateHash,
    /// Digest of the operations executed since the last block.
    body: StateHash,
    /// Headers of host-sealed blocks, by height.
    sealed: BTreeMap<u64, StateHash>,
}

impl Default for LedgerClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl LedgerClock {
    /// Start at the given height with a genesis header.
    pub fn new(height: u64) -> Self {
        let mut hasher = StateHasher::for_header();
        hasher.update_bytes(b"genesis");
        hasher.update_u64(height);
        Self {
            height,
            header_hash: hasher.finalize(),
            body: [0; 32],
            sealed: BTreeMap::new(),
        }
    }

    /// Fold an executed operation into the pending block body.
    pub fn record(&mut self, digest: &StateHash) {
        let mut hasher = StateHasher::for_block_body();
        hasher.update_bytes(&self.body);
        hasher.update_bytes(digest);
        self.body = hasher.finalize();
    }

    /// Mine `blocks` blocks without fresh entropy. Returns the new height.
    pub fn advance(&mut self, blocks: u64) -> u64 {
        for _ in 0..blocks {
            self.mine(None);
        }
        self.height
    }

    /// Mine one block whose header mixes in `beacon`. Returns its height.
    pub fn seal(&mut self, beacon: &StateHash) -> u64 {
        self.mine(Some(beacon));
        self.sealed.insert(self.height, self.header_hash);
        self.height
    }

    /// First sealed block strictly above `height`.
    pub fn sealed_after(&self, height: u64) -> Option<(u64, StateHash)> {
        self.sealed
            .range((Bound::Excluded(height), Bound::Unbounded))
            .next()
            .map(|(h, header)| (*h, *header))
    }

    /// Fold heights and sealed headers into a state hash. The pending body
    /// is left out so a rejected operation does not move the hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u64(self.height);
        hasher.update_bytes(&self.header_hash);
        hasher.update_u64(self.sealed.len() as u64);
        for (height, header) in &self.sealed {
            hasher.update_u64(*height);
            hasher.update_bytes(header);
        }
    }

    fn mine(&mut self, beacon: Option<&StateHash>) {
        let next = self.height.saturating_add(1);
        let mut hasher = StateHasher::for_header();
        hasher.update_bytes(&self.header_hash);
        hasher.update_u64(next);
        hasher.update_bytes(&self.body);
        match beacon {
            Some(beacon) => {
                hasher.update_u8(1);
                hasher.update_bytes(beacon);
            }
            None => hasher.update_u8(0),
        }
        self.header_hash = hasher.finalize();
        self.height = next;
        self.body = [0; 32];
    }
}

impl Clock for LedgerClock {
    fn height(&self) -> u64 {
        self.height
    }

    fn header_hash(&self) -> StateHash {
        self.header_hash
    }
}
