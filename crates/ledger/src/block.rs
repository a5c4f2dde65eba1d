//! Block application against the three ledger stores.

use accum::{Frontier, RecordsAccumulator, RootStore};
use primitives::{Blake2bNodeHash, FieldElem, NodeHash, Nullifier};
use serde::{Deserialize, Serialize};

use crate::nullifiers::NullifierSet;
use crate::LedgerError;

/// One validated batch of ledger effects, as assembled by the relayer from
/// a block of transactions.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug, Default)]
pub struct Block {
    /// New record commitments, in transaction order.
    pub leaves: Vec<FieldElem>,
    /// Nullifiers consumed by the block's transactions, in order.
    pub nullifiers: Vec<Nullifier>,
    /// Roots the transactions were built against; each must still be inside
    /// the validity window.
    pub roots: Vec<FieldElem>,
    /// The submitter's view of the current frontier. Checked against the
    /// stored root before anything is applied.
    pub frontier: Frontier,
    /// The submitter's view of the current leaf count.
    pub num_leaves: u64,
}

/// State reached by a successful block application.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BlockEffect {
    pub root: FieldElem,
    pub frontier: Frontier,
    pub num_leaves: u64,
    pub nullifier_commitment: FieldElem,
}

/// The trust-anchor state: records accumulator, root history, and nullifier
/// set, mutated together once per validated block and by nothing else.
///
/// Atomicity is validate-then-commit rather than commit-then-rollback:
/// every rejection is detected before the first mutation, so a failed
/// `apply_block` leaves all three stores untouched without relying on a
/// host runtime's revert semantics.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "H: Default"))]
pub struct CapeState<H: NodeHash = Blake2bNodeHash> {
    records: RecordsAccumulator<H>,
    roots: RootStore,
    nullifiers: NullifierSet<H>,
    block_height: u64,
}

impl<H: NodeHash + Default> CapeState<H> {
    /// Genesis state: empty tree, root history seeded with the empty root,
    /// empty nullifier set. `height` and `n_roots` are fixed for the
    /// lifetime of the instance.
    pub fn new(height: u8, n_roots: usize) -> Result<Self, LedgerError> {
        let records = RecordsAccumulator::with_hasher(height, H::default())?;
        let roots = RootStore::new(n_roots, records.root());
        Ok(Self {
            records,
            roots,
            nullifiers: NullifierSet::with_hasher(H::default()),
            block_height: 0,
        })
    }
}

impl<H: NodeHash> CapeState<H> {
    /// Apply one block atomically: all checks first, then all mutations.
    pub fn apply_block(&mut self, block: &Block) -> Result<BlockEffect, LedgerError> {
        if !self.records.verify_frontier(&block.frontier, block.num_leaves) {
            return Err(LedgerError::StaleFrontier);
        }
        if !self.records.has_room_for(block.leaves.len()) {
            return Err(LedgerError::Full);
        }
        for &root in &block.roots {
            if !self.roots.contains(root) {
                return Err(LedgerError::InvalidRoot(root));
            }
        }
        self.nullifiers.check_batch(&block.nullifiers)?;

        // Past this point nothing can fail: the frontier and capacity were
        // just verified and the nullifier batch was pre-checked.
        let update = self
            .records
            .insert_batch(&block.frontier, block.num_leaves, &block.leaves)?;
        let nullifier_commitment = self.nullifiers.insert_batch(&block.nullifiers)?;
        self.roots.push(update.root);
        self.block_height += 1;

        Ok(BlockEffect {
            root: update.root,
            frontier: update.frontier,
            num_leaves: update.num_leaves,
            nullifier_commitment,
        })
    }

    /// Latest accumulator root.
    pub fn current_root(&self) -> FieldElem {
        self.records.root()
    }

    /// Whether `root` is inside the validity window.
    pub fn is_root_valid(&self, root: FieldElem) -> bool {
        self.roots.contains(root)
    }

    /// Whether `nf` has ever been spent.
    pub fn is_nullifier_spent(&self, nf: &Nullifier) -> bool {
        self.nullifiers.contains(nf)
    }

    pub fn nullifier_commitment(&self) -> FieldElem {
        self.nullifiers.commitment()
    }

    pub fn num_leaves(&self) -> u64 {
        self.records.num_leaves()
    }

    pub fn height(&self) -> u8 {
        self.records.height()
    }

    /// Number of blocks applied since genesis.
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Current frontier, for submitters assembling the next block.
    pub fn frontier(&self) -> &Frontier {
        self.records.frontier()
    }
}
