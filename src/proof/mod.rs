//! Replay Verification
//!
//! A session is fully determined by its configuration, its randomness
//! source and the ordered operation log. The transcript records all three
//! along with the state hash after every operation, so anyone can re-run
//! the session and check it ends in the same state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Config, host events, ops, state hashes   │
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod verify;

pub use transcript::{HostBlock, HostCredit, Transcript, TranscriptEntry, TranscriptError, TRANSCRIPT_VERSION};
pub use verify::{verify_transcript, CheckpointResult, VerificationError, VerificationResult};
