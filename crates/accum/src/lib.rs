//! Append-only records accumulator.
//!
//! A fixed-height, arity-3 incremental Merkle tree maintained through an
//! O(height) frontier, with amortized O(1) batched appends, a bounded
//! history of recent roots, and membership proofs. The same code runs in
//! the canonical single-writer store and in off-chain replicas replaying
//! the identical block sequence; both must reach bit-identical roots.

pub mod dense;
pub mod frontier;
pub mod proof;
pub mod roots;
pub mod tree;

pub use dense::DenseTree;
pub use frontier::Frontier;
pub use proof::{verify_path, MerklePath, NodePos, PathNode};
pub use roots::RootStore;
pub use tree::{BatchUpdate, RecordsAccumulator};

use thiserror::Error;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum AccumError {
    /// The caller's frontier/leaf count does not reproduce the stored root.
    /// The caller must refetch the current state and retry.
    #[error("stale frontier: claimed state does not reproduce the current root")]
    StaleFrontier,
    /// Insertion would exceed the fixed 3^height capacity. Permanent for
    /// this accumulator instance.
    #[error("records accumulator is full")]
    Full,
    /// 3^height does not fit the u64 leaf counter.
    #[error("unsupported tree height {0}")]
    InvalidHeight(u8),
}

/// Largest height whose capacity 3^h fits in a u64.
pub const MAX_HEIGHT: u8 = 40;

/// Leaf capacity of a tree of the given height, if representable.
pub fn capacity(height: u8) -> Option<u64> {
    3u64.checked_pow(u32::from(height))
}
