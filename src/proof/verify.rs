//! Verification API
//!
//! Verify an engine session by deterministic replay: rebuild the engine
//! from the recorded configuration, re-execute every operation in order
//! and compare each result code and state hash against the transcript.

use tracing::{debug, warn};

use crate::core::hash::StateHash;
use crate::core::rng::RandomnessSource;
use crate::engine::Arcade;
use crate::proof::transcript::{Transcript, TRANSCRIPT_VERSION};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from transcript).
    pub expected_final_hash: StateHash,

    /// Per-operation results, up to the first mismatch.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

/// Result of re-executing a single operation.
#[derive(Debug)]
pub struct CheckpointResult {
    /// Operation sequence number.
    pub seq: u64,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone)]
pub enum VerificationError {
    /// Transcript version mismatch.
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Replay randomness differs from the recorded one.
    RandomnessMismatch {
        /// Recorded source.
        expected: String,
        /// Source supplied for replay.
        got: String,
    },

    /// Recorded configuration is rejected.
    InvalidConfig(String),

    /// Genesis state hash mismatch.
    GenesisMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// A recorded host credit could not be applied.
    CreditRejected {
        /// Operations executed before the credit.
        before_seq: u64,
    },

    /// Operation accepted or rejected differently on replay.
    CodeMismatch {
        /// Operation sequence number.
        seq: u64,
        /// Recorded result code.
        expected: u32,
        /// Replayed result code.
        got: u32,
    },

    /// State hash after an operation differs.
    CheckpointMismatch {
        /// Operation sequence number.
        seq: u64,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VersionMismatch { expected, got } => {
                write!(f, "Version mismatch: expected {}, got {}", expected, got)
            }
            Self::RandomnessMismatch { expected, got } => {
                write!(f, "Randomness mismatch: recorded {}, replayed with {}", expected, got)
            }
            Self::InvalidConfig(msg) => write!(f, "Invalid recorded config: {}", msg),
            Self::GenesisMismatch { .. } => write!(f, "Genesis state hash mismatch"),
            Self::CreditRejected { before_seq } => {
                write!(f, "Host credit before operation {} rejected", before_seq)
            }
            Self::CodeMismatch { seq, expected, got } => {
                write!(f, "Result code mismatch at operation {}: expected {}, got {}", seq, expected, got)
            }
            Self::CheckpointMismatch { seq, .. } => {
                write!(f, "State hash mismatch at operation {}", seq)
            }
        }
    }
}

impl std::error::Error for VerificationError {}

fn failed(
    computed: StateHash,
    expected: StateHash,
    checkpoint_results: Vec<CheckpointResult>,
    error: VerificationError,
) -> VerificationResult {
    warn!(%error, "Transcript verification failed");
    VerificationResult {
        valid: false,
        computed_final_hash: computed,
        expected_final_hash: expected,
        checkpoint_results,
        error: Some(error),
    }
}

/// Verify a transcript by full replay.
///
/// `randomness` must be the same kind of source the session ran with;
/// draws are replayed from the recorded beacons, re-sealed at the same
/// positions in the log.
pub fn verify_transcript(
    transcript: &Transcript,
    randomness: Box<dyn RandomnessSource>,
) -> VerificationResult {
    let expected_final = transcript.final_hash();

    if transcript.version != TRANSCRIPT_VERSION {
        return failed([0; 32], expected_final, vec![], VerificationError::VersionMismatch {
            expected: TRANSCRIPT_VERSION,
            got: transcript.version,
        });
    }
    if randomness.name() != transcript.randomness {
        return failed([0; 32], expected_final, vec![], VerificationError::RandomnessMismatch {
            expected: transcript.randomness.clone(),
            got: randomness.name().to_string(),
        });
    }

    // 1. Rebuild the engine and check genesis
    let mut arcade = match Arcade::new(transcript.config.clone(), randomness) {
        Ok(arcade) => arcade,
        Err(err) => {
            return failed([0; 32], expected_final, vec![], VerificationError::InvalidConfig(err.to_string()));
        }
    };
    let genesis = arcade.state_hash();
    if genesis != transcript.genesis_hash {
        return failed(genesis, transcript.genesis_hash, vec![], VerificationError::GenesisMismatch {
            expected: transcript.genesis_hash,
            computed: genesis,
        });
    }

    // 2. Replay operations, applying host credits and sealed blocks where
    //    they happened. Credits touch only balances and seals only the
    //    clock, so their relative order within one gap does not matter.
    let mut credits = transcript.credits.iter().peekable();
    let mut blocks = transcript.blocks.iter().peekable();
    let mut checkpoint_results = Vec::with_capacity(transcript.entries.len());

    for entry in &transcript.entries {
        while let Some(credit) = credits.next_if(|credit| credit.before_seq <= entry.seq) {
            if arcade.credit(credit.account, credit.amount).is_err() {
                let computed = arcade.state_hash();
                return failed(computed, expected_final, checkpoint_results, VerificationError::CreditRejected {
                    before_seq: credit.before_seq,
                });
            }
        }
        while let Some(block) = blocks.next_if(|block| block.before_seq <= entry.seq) {
            arcade.seal_block(block.beacon);
        }

        let code = match arcade.execute(entry.caller, entry.op.clone()) {
            Ok(_) => 0,
            Err(err) => err.code(),
        };
        let computed = arcade.state_hash();

        if code != entry.code {
            return failed(computed, expected_final, checkpoint_results, VerificationError::CodeMismatch {
                seq: entry.seq,
                expected: entry.code,
                got: code,
            });
        }

        let valid = computed == entry.state_hash;
        checkpoint_results.push(CheckpointResult {
            seq: entry.seq,
            expected: entry.state_hash,
            computed,
            valid,
        });
        if !valid {
            return failed(computed, expected_final, checkpoint_results, VerificationError::CheckpointMismatch {
                seq: entry.seq,
                expected: entry.state_hash,
                computed,
            });
        }
    }

    // 3. Final state
    let computed_final = arcade.transcript().final_hash();
    debug!(
        operations = transcript.entries.len(),
        final_hash = %hex::encode(computed_final),
        "Transcript replayed"
    );

    VerificationResult {
        valid: computed_final == expected_final,
        computed_final_hash: computed_final,
        expected_final_hash: expected_final,
        checkpoint_results,
        error: None,
    }
}
