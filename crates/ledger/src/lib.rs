//! Ledger state: the nullifier set and the block applier tying the records
//! accumulator, root history, and nullifier set together.
//!
//! All operations are pure, synchronous transformations on explicit state.
//! The canonical store is single-writer; off-chain replicas replay the same
//! ordered block sequence and must reach identical state.

pub mod block;
pub mod nullifiers;
pub mod replica;

pub use block::{Block, BlockEffect, CapeState};
pub use nullifiers::NullifierSet;
pub use replica::Replica;

use accum::AccumError;
use primitives::{FieldElem, Nullifier};
use thiserror::Error;

/// Rejection taxonomy for block application. Every variant is detected
/// before any mutation; a rejected block produces no state change.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum LedgerError {
    /// The submitted frontier/leaf count no longer matches the accumulator;
    /// the submitter must refetch state and rebuild the block.
    #[error("stale frontier: submitted state does not match the accumulator")]
    StaleFrontier,
    /// The block's new records would exceed the tree capacity.
    #[error("records accumulator is full")]
    Full,
    /// A nullifier in the block is already spent (or repeated within the
    /// block); the entire batch is rejected.
    #[error("nullifier already spent: {0}")]
    AlreadySpent(Nullifier),
    /// A transaction references a root outside the validity window, either
    /// evicted or never produced.
    #[error("unknown or expired root: {0}")]
    InvalidRoot(FieldElem),
    /// The requested tree height is unsupported.
    #[error("unsupported tree height {0}")]
    InvalidHeight(u8),
}

impl From<AccumError> for LedgerError {
    fn from(err: AccumError) -> Self {
        match err {
            AccumError::StaleFrontier => LedgerError::StaleFrontier,
            AccumError::Full => LedgerError::Full,
            AccumError::InvalidHeight(h) => LedgerError::InvalidHeight(h),
        }
    }
}
