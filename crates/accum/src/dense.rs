//! Array-backed record index used by off-chain mirrors.
//!
//! The canonical store keeps only the O(height) frontier and cannot answer
//! proof queries for arbitrary positions. A mirror that serves wallets
//! retains every record commitment instead; `DenseTree` is that retained
//! form: per-level value arrays (no pointer graph), appending with O(height)
//! ancestor updates, producing roots bit-identical to the frontier
//! accumulator for the same leaf sequence.

use primitives::{Blake2bNodeHash, FieldElem, NodeHash};
use serde::{Deserialize, Serialize};

use crate::frontier::leaf_hash;
use crate::proof::{MerklePath, NodePos, PathNode};
use crate::{capacity, AccumError, MAX_HEIGHT};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "H: Default"))]
pub struct DenseTree<H: NodeHash = Blake2bNodeHash> {
    height: u8,
    capacity: u64,
    /// Raw leaf values in insertion order.
    leaves: Vec<FieldElem>,
    /// levels[0] holds leaf commitments; levels[h] the nodes at height h.
    /// Nodes right of the filled region are implicitly zero.
    levels: Vec<Vec<FieldElem>>,
    #[serde(skip)]
    hasher: H,
}

impl<H: NodeHash + Default> DenseTree<H> {
    pub fn new(height: u8) -> Result<Self, AccumError> {
        Self::with_hasher(height, H::default())
    }
}

impl<H: NodeHash> DenseTree<H> {
    pub fn with_hasher(height: u8, hasher: H) -> Result<Self, AccumError> {
        if height > MAX_HEIGHT {
            return Err(AccumError::InvalidHeight(height));
        }
        let capacity = capacity(height).ok_or(AccumError::InvalidHeight(height))?;
        Ok(Self {
            height,
            capacity,
            leaves: Vec::new(),
            levels: vec![Vec::new(); usize::from(height) + 1],
            hasher,
        })
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn num_leaves(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn root(&self) -> FieldElem {
        if self.leaves.is_empty() {
            FieldElem::zero()
        } else {
            self.levels[usize::from(self.height)][0]
        }
    }

    pub fn leaf(&self, index: u64) -> Option<FieldElem> {
        self.leaves.get(index as usize).copied()
    }

    fn node(&self, level: usize, index: u64) -> FieldElem {
        self.levels[level]
            .get(index as usize)
            .copied()
            .unwrap_or_else(FieldElem::zero)
    }

    /// Append one leaf, updating the ancestors along its path.
    ///
    /// Panics only if the tree is over capacity; callers sit behind the
    /// accumulator's `Full` check.
    pub fn push(&mut self, elem: FieldElem) {
        let uid = self.num_leaves();
        assert!(uid < self.capacity, "record index over capacity");
        self.leaves.push(elem);
        let mut cur = leaf_hash(&self.hasher, uid, elem);
        let mut index = uid as usize;
        for level in 0..usize::from(self.height) + 1 {
            if index == self.levels[level].len() {
                self.levels[level].push(cur);
            } else {
                self.levels[level][index] = cur;
            }
            if level == usize::from(self.height) {
                break;
            }
            let group = index - index % 3;
            cur = self.hasher.hash3(
                self.node(level, group as u64),
                self.node(level, group as u64 + 1),
                self.node(level, group as u64 + 2),
            );
            index /= 3;
        }
    }

    pub fn push_batch(&mut self, elems: &[FieldElem]) {
        for &elem in elems {
            self.push(elem);
        }
    }

    /// Leaf value and authentication path for `index`, if occupied.
    pub fn proof(&self, index: u64) -> Option<(FieldElem, MerklePath)> {
        let elem = self.leaf(index)?;
        let mut nodes = Vec::with_capacity(usize::from(self.height));
        let mut pos = index;
        for level in 0..usize::from(self.height) {
            let digit = pos % 3;
            let group = pos - digit;
            let (pos_enum, sibling1, sibling2) = match digit {
                0 => (
                    NodePos::Left,
                    self.node(level, group + 1),
                    self.node(level, group + 2),
                ),
                1 => (
                    NodePos::Middle,
                    self.node(level, group),
                    self.node(level, group + 2),
                ),
                _ => (
                    NodePos::Right,
                    self.node(level, group),
                    self.node(level, group + 1),
                ),
            };
            nodes.push(PathNode {
                sibling1,
                sibling2,
                pos: pos_enum,
            });
            pos /= 3;
        }
        Some((elem, MerklePath { nodes }))
    }
}
