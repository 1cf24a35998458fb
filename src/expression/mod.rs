//! Expression trees and their evaluation entry points.
//!
//! Every node implements [`Expression`], which exposes one batch entry point
//! and one row entry point per evaluation domain. A node only answers the
//! entry points of its own domain; the rest return a type error.
//!
//! Batch entry points write `input.num_rows()` rows into a caller-provided
//! column. On error the contents of that column are unspecified.

mod column_ref;
mod constant;
mod context;

use std::fmt;

use rust_decimal::Decimal;

use crate::error::{Result, VexprError};
use crate::types::{EvalType, FieldType, Value};
use crate::vectorized::{Column, VectorizedBatch};

pub use column_ref::ColumnRef;
pub use constant::Constant;
pub use context::{EvalConfig, EvalContext};

/// A node of an expression tree.
pub trait Expression: fmt::Debug + Send + Sync {
    /// Result type of this node.
    fn field_type(&self) -> FieldType;

    /// Display name, used in errors and logs.
    fn name(&self) -> String;

    /// Whether the batch entry point of this node's domain can serve the
    /// whole subtree: the node itself and every child it evaluates in batch.
    ///
    /// Calling a batch entry point on a node that is not vectorized returns
    /// `NotVectorized`; callers fall back to the row entry points.
    fn vectorized(&self) -> bool {
        true
    }

    // ==================== Batch entry points ====================

    fn vec_eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Int))
    }

    fn vec_eval_real(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Real))
    }

    fn vec_eval_decimal(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Decimal))
    }

    fn vec_eval_string(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::String))
    }

    fn vec_eval_duration(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Duration))
    }

    fn vec_eval_time(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Time))
    }

    fn vec_eval_json(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let _ = (ctx, input, result);
        Err(domain_mismatch(self, EvalType::Json))
    }

    // ==================== Row entry points ====================
    //
    // `row` is a logical row of `input`. `Ok(None)` is SQL NULL.

    fn eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Int))
    }

    fn eval_real(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<f64>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Real))
    }

    fn eval_decimal(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Decimal>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Decimal))
    }

    fn eval_string(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Vec<u8>>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::String))
    }

    /// Nanoseconds.
    fn eval_duration(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Duration))
    }

    /// Microseconds since the Unix epoch.
    fn eval_time(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Time))
    }

    fn eval_json(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<String>> {
        let _ = (ctx, input, row);
        Err(domain_mismatch(self, EvalType::Json))
    }
}

/// Error for an entry point called outside the node's domain.
pub(crate) fn domain_mismatch<E: Expression + ?Sized>(expr: &E, requested: EvalType) -> VexprError {
    VexprError::TypeError {
        expected: expr.field_type().eval_type.name().into(),
        actual: format!("{requested} entry point of {}", expr.name()),
    }
}

/// Evaluates `expr` over `input` through the batch entry point of its own domain.
///
/// # Errors
///
/// Propagates the error of the entry point.
pub fn vec_eval(
    expr: &dyn Expression,
    ctx: &EvalContext,
    input: &VectorizedBatch,
    result: &mut Column,
) -> Result<()> {
    match expr.field_type().eval_type {
        EvalType::Int => expr.vec_eval_int(ctx, input, result),
        EvalType::Real => expr.vec_eval_real(ctx, input, result),
        EvalType::Decimal => expr.vec_eval_decimal(ctx, input, result),
        EvalType::String => expr.vec_eval_string(ctx, input, result),
        EvalType::Duration => expr.vec_eval_duration(ctx, input, result),
        EvalType::Time => expr.vec_eval_time(ctx, input, result),
        EvalType::Json => expr.vec_eval_json(ctx, input, result),
    }
}

/// Evaluates `expr` at one row through the row entry point of its own domain.
///
/// # Errors
///
/// Propagates the error of the entry point.
pub fn eval_value(
    expr: &dyn Expression,
    ctx: &EvalContext,
    input: &VectorizedBatch,
    row: usize,
) -> Result<Value> {
    let value = match expr.field_type().eval_type {
        EvalType::Int => expr.eval_int(ctx, input, row)?.map(Value::Int),
        EvalType::Real => expr.eval_real(ctx, input, row)?.map(Value::Real),
        EvalType::Decimal => expr.eval_decimal(ctx, input, row)?.map(Value::Decimal),
        EvalType::String => expr.eval_string(ctx, input, row)?.map(Value::String),
        EvalType::Duration => expr.eval_duration(ctx, input, row)?.map(Value::Duration),
        EvalType::Time => expr.eval_time(ctx, input, row)?.map(Value::Time),
        EvalType::Json => expr.eval_json(ctx, input, row)?.map(Value::Json),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Evaluates `expr` over every row of `input` into `result`, using the batch
/// entry point when available and the row entry point otherwise.
///
/// # Errors
///
/// Propagates the first evaluation error.
pub fn eval_batch(
    expr: &dyn Expression,
    ctx: &EvalContext,
    input: &VectorizedBatch,
    result: &mut Column,
) -> Result<()> {
    if expr.vectorized() {
        return vec_eval(expr, ctx, input, result);
    }
    result.reset();
    result.reserve(input.num_rows())?;
    for row in 0..input.num_rows() {
        let value = eval_value(expr, ctx, input, row)?;
        result.append_value(&value)?;
    }
    Ok(())
}
