//! Node-hash primitive for tree and chain commitments.
//!
//! The accumulator and the nullifier chain are agnostic to the concrete
//! permutation; everything goes through [`NodeHash`]. The one hard
//! requirement is that every replica of the system (the contract and every
//! off-chain mirror) runs the same implementation bit for bit, since roots
//! and chain commitments are compared across replicas.

use blake2b_simd::Params as Blake2bParams;
use ff::FromUniformBytes;

use crate::field::{FieldElem, Fr, FIELD_ELEM_LEN};

/// Domain separators for BLAKE2b derivations (16-byte `personal` strings).
const DS_NODE3_V1: &[u8; 16] = b"cape.node3.v1\0\0\0"; // 13 + 3 = 16
const DS_CHAIN2_V1: &[u8; 16] = b"cape.chain2.v1\0\0"; // 14 + 2 = 16

/// Fixed-arity hash over field elements.
///
/// `hash3` is the tree-node compression (arity 3); `hash2` chains nullifier
/// insertions (arity 2). Both must be deterministic and free of side effects.
pub trait NodeHash {
    fn hash3(&self, a: FieldElem, b: FieldElem, c: FieldElem) -> FieldElem;
    fn hash2(&self, a: FieldElem, b: FieldElem) -> FieldElem;
}

/// Default permutation: BLAKE2b-512 over the canonical encodings of the
/// inputs, domain-separated per arity, reduced to a Vesta scalar by wide
/// reduction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Blake2bNodeHash;

fn hash_to_field(personal: &[u8; 16], input: &[u8]) -> FieldElem {
    let hash = Blake2bParams::new()
        .hash_length(64)
        .personal(personal)
        .hash(input);
    let mut wide = [0u8; 64];
    wide.copy_from_slice(hash.as_bytes());
    FieldElem(<Fr as FromUniformBytes<64>>::from_uniform_bytes(&wide))
}

impl NodeHash for Blake2bNodeHash {
    fn hash3(&self, a: FieldElem, b: FieldElem, c: FieldElem) -> FieldElem {
        let mut buf = [0u8; 3 * FIELD_ELEM_LEN];
        buf[..32].copy_from_slice(&a.to_bytes());
        buf[32..64].copy_from_slice(&b.to_bytes());
        buf[64..].copy_from_slice(&c.to_bytes());
        hash_to_field(DS_NODE3_V1, &buf)
    }

    fn hash2(&self, a: FieldElem, b: FieldElem) -> FieldElem {
        let mut buf = [0u8; 2 * FIELD_ELEM_LEN];
        buf[..32].copy_from_slice(&a.to_bytes());
        buf[32..].copy_from_slice(&b.to_bytes());
        hash_to_field(DS_CHAIN2_V1, &buf)
    }
}
