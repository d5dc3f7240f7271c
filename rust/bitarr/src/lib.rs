//! Fixed-length bit arrays over caller-supplied `u64` storage.

pub mod bit_array;
pub mod bit_store;
#[cfg(test)]
mod tests;

pub use bit_array::{BitArray, BitArrayBase, BitArrayView, BitArrayViewMut};
pub use bit_store::BitStore;
