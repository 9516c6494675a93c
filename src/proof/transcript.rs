//! Operation Transcript
//!
//! Records everything needed to re-execute an engine session and check
//! that it ends in the same state: the configuration, the randomness
//! source, the genesis hash, the host credits and sealed blocks between
//! operations and, per operation, the caller, the operation, the result
//! code and the state hash after it.

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::config::ArcadeConfig;
use crate::core::hash::StateHash;
use crate::core::ids::AccountId;
use crate::engine::ops::Operation;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 2;

/// Full session record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    /// Version for forward compatibility.
    pub version: u8,
    /// Configuration the session started from.
    pub config: ArcadeConfig,
    /// Name of the randomness source.
    pub randomness: String,
    /// Balances credited by the host before or between operations.
    pub credits: Vec<HostCredit>,
    /// Blocks the host sealed before or between operations.
    pub blocks: Vec<HostBlock>,
    /// State hash before the first operation.
    #[serde(with = "crate::core::hex_bytes::array")]
    pub genesis_hash: StateHash,
    /// Executed operations in order.
    pub entries: Vec<TranscriptEntry>,
}

/// Value the host credited outside any operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCredit {
    /// Number of operations executed before the credit.
    pub before_seq: u64,
    /// Credited account.
    pub account: AccountId,
    /// Amount.
    pub amount: u64,
}

/// Block the host sealed outside any operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostBlock {
    /// Number of operations executed before the block.
    pub before_seq: u64,
    /// Beacon mixed into the block header.
    #[serde(with = "crate::core::hex_bytes::array")]
    pub beacon: StateHash,
}

/// One executed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Position in the log.
    pub seq: u64,
    /// Height at execution.
    pub height: u64,
    /// Submitting account.
    pub caller: AccountId,
    /// The operation.
    pub op: Operation,
    /// Result code (0 = accepted).
    pub code: u32,
    /// State hash after execution.
    #[serde(with = "crate::core::hex_bytes::array")]
    pub state_hash: StateHash,
}

impl Transcript {
    /// Start a transcript.
    pub fn new(config: ArcadeConfig, randomness: &str, genesis_hash: StateHash) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            config,
            randomness: randomness.to_string(),
            credits: Vec::new(),
            blocks: Vec::new(),
            genesis_hash,
            entries: Vec::new(),
        }
    }

    /// Record a host-side credit.
    pub fn record_credit(&mut self, account: AccountId, amount: u64) {
        self.credits.push(HostCredit {
            before_seq: self.entries.len() as u64,
            account,
            amount,
        });
    }

    /// Record a host-sealed block.
    pub fn record_block(&mut self, beacon: StateHash) {
        self.blocks.push(HostBlock {
            before_seq: self.entries.len() as u64,
            beacon,
        });
    }

    /// Record an executed operation.
    pub fn record(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    /// State hash after the last operation (genesis if none).
    pub fn final_hash(&self) -> StateHash {
        self.entries
            .last()
            .map(|entry| entry.state_hash)
            .unwrap_or(self.genesis_hash)
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no operation was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        bincode::serialize(self).map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bincode, checking the version.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self = bincode::deserialize(data)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TranscriptError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, checking the version.
    pub fn from_json(data: &str) -> Result<Self, TranscriptError> {
        let transcript: Self = serde_json::from_str(data)
            .map_err(|e| TranscriptError::DeserializationFailed(e.to_string()))?;
        transcript.check_version()?;
        Ok(transcript)
    }

    fn check_version(&self) -> Result<(), TranscriptError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: self.version,
            });
        }
        Ok(())
    }
}

/// Transcript encoding errors.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Encoding failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),
    /// Decoding failed.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),
    /// Written by an incompatible version.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Supported version.
        expected: u8,
        /// Version found.
        got: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transcript {
        let mut transcript = Transcript::new(ArcadeConfig::default(), "fixed-seed", [9; 32]);
        transcript.record_credit(AccountId::from_label("wallet_1"), 500);
        transcript.record_block([4; 32]);
        transcript.record(TranscriptEntry {
            seq: 0,
            height: 0,
            caller: AccountId::from_label("wallet_1"),
            op: Operation::FundHouse { amount: 100 },
            code: 0,
            state_hash: [1; 32],
        });
        transcript.record(TranscriptEntry {
            seq: 1,
            height: 0,
            caller: AccountId::from_label("wallet_2"),
            op: Operation::CreateTask,
            code: 0,
            state_hash: [2; 32],
        });
        transcript
    }

    #[test]
    fn test_final_hash() {
        let empty = Transcript::new(ArcadeConfig::default(), "fixed-seed", [9; 32]);
        assert_eq!(empty.final_hash(), [9; 32]);
        assert!(empty.is_empty());
        assert_eq!(sample().final_hash(), [2; 32]);
    }

    #[test]
    fn test_bincode_and_json_agree() {
        let transcript = sample();
        let from_bin = Transcript::from_bytes(&transcript.to_bytes().unwrap()).unwrap();
        let from_json = Transcript::from_json(&transcript.to_json().unwrap()).unwrap();
        assert_eq!(from_bin, transcript);
        assert_eq!(from_json, transcript);
        assert_eq!(from_bin.credits[0].before_seq, 0);
        assert_eq!(from_json.blocks, vec![HostBlock { before_seq: 0, beacon: [4; 32] }]);
    }

    #[test]
    fn test_version_checked() {
        let mut transcript = sample();
        transcript.version = 9;
        let bytes = transcript.to_bytes().unwrap();
        assert!(matches!(
            Transcript::from_bytes(&bytes),
            Err(TranscriptError::VersionMismatch { expected: TRANSCRIPT_VERSION, got: 9 })
        ));
    }
}
