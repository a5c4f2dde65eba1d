//! The records accumulator: root, leaf count, and frontier of the ternary
//! records tree, with batched amortized-O(1) insertion.

use primitives::{Blake2bNodeHash, FieldElem, NodeHash};
use serde::{Deserialize, Serialize};

use crate::frontier::{root_from_frontier, Frontier, OpenLevels};
use crate::{capacity, AccumError, MAX_HEIGHT};

/// Result of a successful batch insertion: the authoritative state a caller
/// needs to build the next batch against.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct BatchUpdate {
    pub root: FieldElem,
    pub frontier: Frontier,
    pub num_leaves: u64,
}

/// Fixed-height, arity-3 incremental Merkle accumulator.
///
/// Resident state is O(height): the root, the leaf counter, and the
/// frontier. Callers that do not persist the frontier themselves resupply
/// it with every batch; [`Self::verify_frontier`] checks the claim against
/// the stored root before anything is mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "H: Default"))]
pub struct RecordsAccumulator<H: NodeHash = Blake2bNodeHash> {
    height: u8,
    capacity: u64,
    num_leaves: u64,
    root: FieldElem,
    frontier: Frontier,
    #[serde(skip)]
    hasher: H,
}

impl<H: NodeHash + Default> RecordsAccumulator<H> {
    /// Empty accumulator of the given height (capacity 3^height leaves).
    pub fn new(height: u8) -> Result<Self, AccumError> {
        Self::with_hasher(height, H::default())
    }
}

impl<H: NodeHash> RecordsAccumulator<H> {
    pub fn with_hasher(height: u8, hasher: H) -> Result<Self, AccumError> {
        if height > MAX_HEIGHT {
            return Err(AccumError::InvalidHeight(height));
        }
        let capacity = capacity(height).ok_or(AccumError::InvalidHeight(height))?;
        Ok(Self {
            height,
            capacity,
            num_leaves: 0,
            root: FieldElem::zero(),
            frontier: Frontier::empty(height),
            hasher,
        })
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn num_leaves(&self) -> u64 {
        self.num_leaves
    }

    pub fn root(&self) -> FieldElem {
        self.root
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn is_full(&self) -> bool {
        self.num_leaves == self.capacity
    }

    /// Whether `extra` more leaves fit.
    pub fn has_room_for(&self, extra: usize) -> bool {
        (extra as u64)
            .checked_add(self.num_leaves)
            .map_or(false, |total| total <= self.capacity)
    }

    /// Check that a claimed `(frontier, num_leaves)` pair reproduces the
    /// stored root. This is the freshness gate for batch submission.
    pub fn verify_frontier(&self, claimed: &Frontier, claimed_num_leaves: u64) -> bool {
        claimed.height() == usize::from(self.height)
            && claimed_num_leaves == self.num_leaves
            && root_from_frontier(&self.hasher, claimed, claimed_num_leaves) == self.root
    }

    /// Append `new_leaves` in order, on top of the state witnessed by the
    /// claimed frontier.
    ///
    /// Rejects with [`AccumError::StaleFrontier`] before touching anything
    /// if the claim does not match, and with [`AccumError::Full`] if the
    /// batch does not fit. The final root is identical for any partitioning
    /// of the same leaf sequence into batches.
    pub fn insert_batch(
        &mut self,
        claimed: &Frontier,
        claimed_num_leaves: u64,
        new_leaves: &[FieldElem],
    ) -> Result<BatchUpdate, AccumError> {
        if claimed.height() != usize::from(self.height) || claimed_num_leaves != self.num_leaves {
            return Err(AccumError::StaleFrontier);
        }
        let (mut open, claimed_root) =
            OpenLevels::from_frontier(&self.hasher, claimed, claimed_num_leaves);
        if claimed_root != self.root {
            return Err(AccumError::StaleFrontier);
        }
        if !self.has_room_for(new_leaves.len()) {
            return Err(AccumError::Full);
        }
        if new_leaves.is_empty() {
            return Ok(self.snapshot());
        }

        let mut uid = self.num_leaves;
        let mut last_leaf = FieldElem::zero();
        let mut top_carry = None;
        for &leaf in new_leaves {
            top_carry = open.push(&self.hasher, uid, leaf);
            last_leaf = leaf;
            uid += 1;
        }
        let frontier = open.to_frontier(uid - 1, last_leaf);
        // The carry escapes the top level exactly when the tree fills; in
        // every other case one bottom-up pass closes the open path.
        let root = match top_carry {
            Some(root) => root,
            None => root_from_frontier(&self.hasher, &frontier, uid),
        };

        self.root = root;
        self.frontier = frontier;
        self.num_leaves = uid;
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> BatchUpdate {
        BatchUpdate {
            root: self.root,
            frontier: self.frontier.clone(),
            num_leaves: self.num_leaves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::DenseTree;
    use std::cell::Cell;

    fn leaves(range: std::ops::Range<u64>) -> Vec<FieldElem> {
        range.map(FieldElem::from_u64).collect()
    }

    fn insert_all(acc: &mut RecordsAccumulator, batch: &[FieldElem]) -> BatchUpdate {
        let frontier = acc.frontier().clone();
        let n = acc.num_leaves();
        acc.insert_batch(&frontier, n, batch).unwrap()
    }

    #[test]
    fn empty_tree() {
        let acc: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        assert_eq!(acc.root(), FieldElem::zero());
        assert_eq!(acc.num_leaves(), 0);
        assert_eq!(acc.capacity(), 27);
        assert!(acc.verify_frontier(&Frontier::empty(3), 0));
    }

    #[test]
    fn rejects_invalid_height() {
        assert_eq!(
            RecordsAccumulator::<primitives::Blake2bNodeHash>::new(41).unwrap_err(),
            AccumError::InvalidHeight(41)
        );
    }

    #[test]
    fn batch_boundaries_do_not_affect_the_root() {
        let all = leaves(1..27);

        let mut one_shot: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        let single = insert_all(&mut one_shot, &all);

        let mut chunked: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        let mut update = None;
        for chunk in [&all[0..5], &all[5..10], &all[10..15], &all[15..20], &all[20..26]] {
            update = Some(insert_all(&mut chunked, chunk));
        }
        let update = update.unwrap();

        assert_eq!(single.root, update.root);
        assert_eq!(single.frontier, update.frontier);
        assert_eq!(single.num_leaves, 26);
    }

    #[test]
    fn agrees_with_dense_reference_on_every_prefix() {
        let mut acc: RecordsAccumulator = RecordsAccumulator::new(4).unwrap();
        let mut dense: DenseTree = DenseTree::new(4).unwrap();
        for uid in 0..40u64 {
            let leaf = FieldElem::from_u64(900 + uid);
            insert_all(&mut acc, &[leaf]);
            dense.push(leaf);
            assert_eq!(acc.root(), dense.root(), "uid {uid}");
        }
    }

    #[test]
    fn capacity_is_exact() {
        // Height 3 holds exactly 27 leaves.
        let mut acc: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        insert_all(&mut acc, &leaves(1..27));
        assert_eq!(acc.num_leaves(), 26);

        // Two more leaves would make 28.
        let frontier = acc.frontier().clone();
        let err = acc
            .insert_batch(&frontier, 26, &leaves(27..29))
            .unwrap_err();
        assert_eq!(err, AccumError::Full);
        assert_eq!(acc.num_leaves(), 26);

        // One more is fine and fills the tree; the full-tree root must agree
        // with the dense reference.
        let update = insert_all(&mut acc, &leaves(27..28));
        assert_eq!(update.num_leaves, 27);
        assert!(acc.is_full());
        let mut dense: DenseTree = DenseTree::new(3).unwrap();
        for leaf in leaves(1..28) {
            dense.push(leaf);
        }
        assert_eq!(update.root, dense.root());

        // Full is terminal.
        let frontier = acc.frontier().clone();
        let err = acc
            .insert_batch(&frontier, 27, &leaves(28..29))
            .unwrap_err();
        assert_eq!(err, AccumError::Full);
    }

    #[test]
    fn stale_frontier_is_rejected() {
        let mut acc: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        let update = insert_all(&mut acc, &leaves(1..6));
        assert!(acc.verify_frontier(&update.frontier, update.num_leaves));

        // Move the accumulator on; the old witness must stop verifying.
        let stale = (update.frontier.clone(), update.num_leaves);
        insert_all(&mut acc, &leaves(6..9));
        assert!(!acc.verify_frontier(&stale.0, stale.1));
        assert_eq!(
            acc.insert_batch(&stale.0, stale.1, &leaves(9..10)).unwrap_err(),
            AccumError::StaleFrontier
        );

        // Wrong leaf count with the right frontier is also stale.
        let frontier = acc.frontier().clone();
        assert!(!acc.verify_frontier(&frontier, acc.num_leaves() + 1));
    }

    /// Hasher wrapper counting node-hash invocations.
    #[derive(Clone, Debug, Default)]
    struct CountingHash {
        inner: primitives::Blake2bNodeHash,
        hash3_calls: Cell<u64>,
    }

    impl NodeHash for CountingHash {
        fn hash3(&self, a: FieldElem, b: FieldElem, c: FieldElem) -> FieldElem {
            self.hash3_calls.set(self.hash3_calls.get() + 1);
            self.inner.hash3(a, b, c)
        }
        fn hash2(&self, a: FieldElem, b: FieldElem) -> FieldElem {
            self.inner.hash2(a, b)
        }
    }

    #[test]
    fn batched_insertion_meets_the_amortized_bound() {
        // One batch of N appends must cost no more than 1.5 * N + height
        // node hashes: N leaf commitments, a geometric carry series, and at
        // most one closing path computation.
        for (height, n) in [(7u8, 1000u64), (7, 2187), (5, 243), (4, 50)] {
            let mut acc = RecordsAccumulator::with_hasher(height, CountingHash::default()).unwrap();
            let batch: Vec<FieldElem> = (0..n).map(|i| FieldElem::from_u64(3 + i)).collect();
            let frontier = acc.frontier().clone();
            acc.hasher.hash3_calls.set(0);
            acc.insert_batch(&frontier, 0, &batch).unwrap();
            let calls = acc.hasher.hash3_calls.get();
            let bound = n + n / 2 + u64::from(height);
            assert!(
                calls <= bound,
                "height {height}, n {n}: {calls} hashes > bound {bound}"
            );
        }
    }

    #[test]
    fn serde_roundtrip_preserves_behavior() {
        let mut acc: RecordsAccumulator = RecordsAccumulator::new(3).unwrap();
        insert_all(&mut acc, &leaves(1..14));

        let enc = serde_json::to_string(&acc).unwrap();
        let mut restored: RecordsAccumulator = serde_json::from_str(&enc).unwrap();
        assert_eq!(restored.root(), acc.root());
        assert_eq!(restored.num_leaves(), acc.num_leaves());

        let next = leaves(14..20);
        let a = insert_all(&mut acc, &next);
        let b = insert_all(&mut restored, &next);
        assert_eq!(a, b);
    }
}
