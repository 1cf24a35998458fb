//! Vectorized data structures: the read-only input batch and the typed,
//! null-aware column buffers evaluation writes into.

pub mod batch;
pub mod column;

pub use batch::{SelectionVector, VectorizedBatch, DEFAULT_BATCH_SIZE};
pub use column::{Column, FixedNative};
