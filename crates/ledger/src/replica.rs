//! Full-tree replica: the trust-anchor state plus a dense record index.
//!
//! The anchor state keeps only the frontier and cannot serve membership
//! proofs. A replica feeds every applied block into a `DenseTree` as well,
//! so wallets can fetch a proof for any record. The two stay in lockstep:
//! the dense root after each block equals the anchor's current root.

use accum::{DenseTree, MerklePath};
use primitives::{Blake2bNodeHash, FieldElem, NodeHash};
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockEffect, CapeState};
use crate::LedgerError;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "H: Default"))]
pub struct Replica<H: NodeHash = Blake2bNodeHash> {
    state: CapeState<H>,
    records: DenseTree<H>,
}

impl<H: NodeHash + Default> Replica<H> {
    pub fn new(height: u8, n_roots: usize) -> Result<Self, LedgerError> {
        Ok(Self {
            state: CapeState::new(height, n_roots)?,
            records: DenseTree::with_hasher(height, H::default())?,
        })
    }
}

impl<H: NodeHash> Replica<H> {
    /// Apply a block to the anchor state and, on success, mirror its leaves
    /// into the record index. A rejected block touches neither.
    pub fn apply_block(&mut self, block: &Block) -> Result<BlockEffect, LedgerError> {
        let effect = self.state.apply_block(block)?;
        self.records.push_batch(&block.leaves);
        debug_assert_eq!(self.records.root(), effect.root);
        Ok(effect)
    }

    pub fn state(&self) -> &CapeState<H> {
        &self.state
    }

    /// Record value and authentication path for `index`, if occupied.
    /// The path verifies against `state().current_root()`.
    pub fn membership_proof(&self, index: u64) -> Option<(FieldElem, MerklePath)> {
        self.records.proof(index)
    }
}
