//! Ledger layer: value custody and record storage shared by every table.

pub mod escrow;
pub mod registry;

pub use escrow::{EscrowAccount, EscrowKey, EscrowLedger, Payee};
pub use registry::Registry;

use crate::core::clock::LedgerClock;
use crate::core::ids::AccountId;
use crate::core::rng::{DrawRequest, RandomnessSource, draw_below};
use crate::error::{ArcadeError, ArcadeResult};

/// Everything one operation executes against.
///
/// Built by the engine for a single operation and dropped afterwards.
pub struct TxContext<'a> {
    /// Authenticated caller.
    pub caller: AccountId,
    /// Ledger height at execution.
    pub height: u64,
    /// Ledger headers; draws read the host-sealed ones.
    pub clock: &'a LedgerClock,
    /// Value custody.
    pub escrow: &'a mut EscrowLedger,
    /// Seed source for draws.
    pub randomness: &'a dyn RandomnessSource,
}

impl<'a> TxContext<'a> {
    /// Uniform draw in [0, bound) for `scope`, seeded by the first block
    /// sealed above `after`.
    ///
    /// Callers pass the height at which the outcome was last open to
    /// influence (a commitment, a ticket sale), so the header used was
    /// mined after every input to the draw was fixed.
    pub fn draw(
        &self,
        domain: &[u8],
        scope: u64,
        salt: &[u8],
        bound: u64,
        after: u64,
    ) -> ArcadeResult<u64> {
        let (height, header_hash) = self
            .clock
            .sealed_after(after)
            .ok_or(ArcadeError::WrongState("waiting for a sealed block"))?;
        let request = DrawRequest {
            domain,
            scope,
            height,
            header_hash,
            salt,
        };
        Ok(draw_below(self.randomness, &request, bound))
    }
}
