//! vexpr - vectorized comparison functions
//!
//! Batch evaluation of the SQL comparison family over Arrow-backed input:
//! relational operators (`<`, `<=`, `>`, `>=`, `=`, `<>`, `<=>`),
//! `GREATEST`, `LEAST`, `COALESCE` and `INTERVAL`.
//!
//! # Architecture
//!
//! - [`vectorized`]: the read-only input batch and typed, null-aware columns.
//! - [`pool`]: scratch columns leased per call and released on every exit path.
//! - [`kernels`]: null merge, comparators, reductions and interval search.
//! - [`expression`]: the [`Expression`] trait, leaves and the evaluation context.
//! - [`builtin`]: one signature per function and operand domain.
//!
//! # Example
//!
//! ```ignore
//! let ctx = EvalContext::default();
//! let lt = new_signature(
//!     ComparisonFunction::Compare(CompareOp::Lt),
//!     EvalType::Int,
//!     vec![Box::new(ColumnRef::from_schema(&schema, "a")?), Box::new(Constant::int(10))],
//! )?;
//! let mut out = Column::new(EvalType::Int, batch.num_rows());
//! lt.vec_eval_int(&ctx, &batch, &mut out)?;
//! ```

pub mod builtin;
pub mod error;
pub mod expression;
pub mod kernels;
pub mod pool;
pub mod types;
pub mod vectorized;

pub use builtin::{
    new_signature, CoalesceSig, CompareSig, ComparisonFunction, ExtremumSig, IntervalSig,
};
pub use error::{Result, VexprError};
pub use expression::{
    eval_batch, eval_value, vec_eval, ColumnRef, Constant, EvalConfig, EvalContext, Expression,
};
pub use kernels::{CompareOp, Extremum, IntervalSearch};
pub use pool::{BufferPool, BufferPoolStats, PoolConfig, ScratchColumn};
pub use types::{EvalType, FieldType, Value};
pub use vectorized::{Column, SelectionVector, VectorizedBatch, DEFAULT_BATCH_SIZE};
