//! Engine: the operation surface and the executor that applies it.

pub mod arcade;
pub mod events;
pub mod ops;

pub use arcade::{Arcade, MAX_ADVANCE_BLOCKS};
pub use events::{OpOutput, Receipt};
pub use ops::{AdminTable, Operation, SignedOp};
