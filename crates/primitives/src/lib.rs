//! Field and hashing primitives shared by the records accumulator and the
//! nullifier set.

pub mod field;
pub mod hash;

pub use field::*;
pub use hash::*;
