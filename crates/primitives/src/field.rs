//! Canonical field element wrapper for ledger state values.
//!
//! Every value that enters the records tree or the nullifier chain is a
//! Vesta scalar. The canonical byte form everywhere (serde, hashing inputs,
//! wire encodings) is the 32-byte little-endian representation; deserializing
//! a non-canonical encoding is an error.

use ff::PrimeField;
use serde::{Deserialize, Serialize};

/// Scalar field of the Vesta curve (Pasta cycle).
pub type Fr = pasta_curves::vesta::Scalar;

pub const FIELD_ELEM_LEN: usize = 32;

/// A single ledger value: record commitment, tree node, root, or chain state.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldElem(pub Fr);

impl FieldElem {
    pub fn zero() -> Self {
        Self(Fr::from(0u64))
    }

    pub fn from_u64(v: u64) -> Self {
        Self(Fr::from(v))
    }

    /// Canonical 32-byte little-endian representation.
    pub fn to_bytes(&self) -> [u8; FIELD_ELEM_LEN] {
        let mut out = [0u8; FIELD_ELEM_LEN];
        out.copy_from_slice(self.0.to_repr().as_ref());
        out
    }

    /// Parse a canonical representation; `None` if the bytes are not a valid
    /// field element encoding.
    pub fn from_bytes(bytes: &[u8; FIELD_ELEM_LEN]) -> Option<Self> {
        let mut repr = <Fr as PrimeField>::Repr::default();
        repr.as_mut().copy_from_slice(bytes);
        Option::from(Fr::from_repr(repr)).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl core::hash::Hash for FieldElem {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        state.write(&self.to_bytes());
    }
}

impl core::fmt::Debug for FieldElem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FieldElem({})", hex::encode(self.to_bytes()))
    }
}

impl core::fmt::Display for FieldElem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl serde::Serialize for FieldElem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.to_bytes())
    }
}

impl<'de> serde::Deserialize<'de> for FieldElem {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ElemVisitor;
        impl<'de> serde::de::Visitor<'de> for ElemVisitor {
            type Value = FieldElem;
            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "a canonical 32-byte field element")
            }
            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.len() != FIELD_ELEM_LEN {
                    return Err(E::invalid_length(v.len(), &self));
                }
                let mut bytes = [0u8; FIELD_ELEM_LEN];
                bytes.copy_from_slice(v);
                FieldElem::from_bytes(&bytes)
                    .ok_or_else(|| E::custom("non-canonical field element encoding"))
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut bytes = [0u8; FIELD_ELEM_LEN];
                for (i, b) in bytes.iter_mut().enumerate() {
                    *b = match seq.next_element::<u8>()? {
                        Some(b) => b,
                        None => return Err(serde::de::Error::invalid_length(i, &self)),
                    };
                }
                FieldElem::from_bytes(&bytes)
                    .ok_or_else(|| serde::de::Error::custom("non-canonical field element encoding"))
            }
        }
        deserializer.deserialize_bytes(ElemVisitor)
    }
}

/// A one-time spend token revealed when a private record is consumed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Debug, Default)]
pub struct Nullifier(pub FieldElem);

impl Nullifier {
    pub fn from_u64(v: u64) -> Self {
        Self(FieldElem::from_u64(v))
    }
}

impl core::fmt::Display for Nullifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}
