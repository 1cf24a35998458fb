//! Batch kernels for the comparison function family.
//!
//! Kernels operate on column slices and never allocate; signatures in
//! [`crate::builtin`] lease scratch space and compose them. Every kernel
//! matches on its operator or domain tag once, outside the row loop.

pub mod compare;
pub mod interval;
pub mod nulls;
pub mod reduce;

pub use compare::{collapse, compare_int_pair, CompareOp};
pub use interval::IntervalSearch;
pub use nulls::merge_nulls;
pub use reduce::{Extremum, StringFold};
