//! Spent-nullifier set with an insertion-order chain commitment.

use primitives::{Blake2bNodeHash, FieldElem, NodeHash, Nullifier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::LedgerError;

/// Every nullifier ever spent, plus a running commitment over insertion
/// order.
///
/// The set answers non-membership in O(1) forever (the double-spend guard);
/// the chain commitment `C_0 = 0, C_i = hash2(C_{i-1}, nf_i)` is a compact,
/// tamper-evident summary of the full insertion history that lets an
/// external verifier attest to a specific order without holding the set.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "H: Default"))]
pub struct NullifierSet<H: NodeHash = Blake2bNodeHash> {
    spent: HashSet<Nullifier>,
    commitment: FieldElem,
    #[serde(skip)]
    hasher: H,
}

impl<H: NodeHash + Default> NullifierSet<H> {
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }
}

impl<H: NodeHash + Default> Default for NullifierSet<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: NodeHash> NullifierSet<H> {
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            spent: HashSet::new(),
            commitment: FieldElem::zero(),
            hasher,
        }
    }

    /// Whether `nf` has ever been spent.
    pub fn contains(&self, nf: &Nullifier) -> bool {
        self.spent.contains(nf)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Current chain commitment over all insertions so far.
    pub fn commitment(&self) -> FieldElem {
        self.commitment
    }

    /// Validate a batch without mutating: every entry must be unspent and
    /// unique within the batch. Returns the first offender.
    pub fn check_batch(&self, nfs: &[Nullifier]) -> Result<(), LedgerError> {
        let mut seen = HashSet::with_capacity(nfs.len());
        for nf in nfs {
            if self.spent.contains(nf) || !seen.insert(*nf) {
                return Err(LedgerError::AlreadySpent(*nf));
            }
        }
        Ok(())
    }

    /// Insert a batch in order, extending the chain commitment per entry.
    /// All or nothing: any already-spent (or repeated) nullifier rejects the
    /// whole batch with set and commitment untouched.
    pub fn insert_batch(&mut self, nfs: &[Nullifier]) -> Result<FieldElem, LedgerError> {
        self.check_batch(nfs)?;
        for nf in nfs {
            self.spent.insert(*nf);
            self.commitment = self.hasher.hash2(self.commitment, nf.0);
        }
        Ok(self.commitment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nf(v: u64) -> Nullifier {
        Nullifier::from_u64(v)
    }

    #[test]
    fn chain_commitment_follows_insertion_order() {
        let h = Blake2bNodeHash;
        let mut set: NullifierSet = NullifierSet::new();
        assert_eq!(set.commitment(), FieldElem::zero());

        set.insert_batch(&[nf(1), nf(2)]).unwrap();
        let mut expected = h.hash2(FieldElem::zero(), nf(1).0);
        expected = h.hash2(expected, nf(2).0);
        assert_eq!(set.commitment(), expected);

        // Same values, opposite order, different commitment.
        let mut other: NullifierSet = NullifierSet::new();
        other.insert_batch(&[nf(2), nf(1)]).unwrap();
        assert_ne!(other.commitment(), set.commitment());
    }

    #[test]
    fn batch_boundaries_do_not_affect_the_commitment() {
        let mut one: NullifierSet = NullifierSet::new();
        one.insert_batch(&[nf(1), nf(2), nf(3), nf(4)]).unwrap();

        let mut split: NullifierSet = NullifierSet::new();
        split.insert_batch(&[nf(1)]).unwrap();
        split.insert_batch(&[nf(2), nf(3)]).unwrap();
        split.insert_batch(&[nf(4)]).unwrap();

        assert_eq!(one.commitment(), split.commitment());
    }

    #[test]
    fn double_spend_rejects_whole_batch() {
        let mut set: NullifierSet = NullifierSet::new();
        set.insert_batch(&[nf(1), nf(2)]).unwrap();
        let commitment = set.commitment();

        // Across batches.
        let err = set.insert_batch(&[nf(3), nf(2), nf(4)]).unwrap_err();
        assert_eq!(err, LedgerError::AlreadySpent(nf(2)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.commitment(), commitment);
        assert!(!set.contains(&nf(3)));

        // Within one batch.
        let err = set.insert_batch(&[nf(5), nf(5)]).unwrap_err();
        assert_eq!(err, LedgerError::AlreadySpent(nf(5)));
        assert_eq!(set.len(), 2);
        assert_eq!(set.commitment(), commitment);
    }
}
