use rust_decimal::Decimal;

use crate::error::Result;
use crate::expression::{domain_mismatch, eval_value, EvalContext, Expression};
use crate::types::{EvalType, FieldType, Value};
use crate::vectorized::{Column, VectorizedBatch};

use super::{check_min_arity, check_operands, not_vectorized};

/// `COALESCE(a, b, ...)`: the first non-NULL operand. Row-only.
#[derive(Debug)]
pub struct CoalesceSig {
    domain: EvalType,
    field_type: FieldType,
    args: Vec<Box<dyn Expression>>,
}

impl CoalesceSig {
    /// # Errors
    ///
    /// Returns `InvalidArgument` without operands and a type error if an
    /// operand does not evaluate in `domain`.
    pub fn new(domain: EvalType, args: Vec<Box<dyn Expression>>) -> Result<Self> {
        check_min_arity("coalesce", &args, 1)?;
        check_operands(domain, args.iter().map(|arg| &**arg))?;

        let unsigned = domain == EvalType::Int && args.iter().all(|arg| arg.field_type().unsigned);
        // NULL only if every operand can be.
        let nullable = args.iter().all(|arg| arg.field_type().nullable);
        let field_type = FieldType::new(domain)
            .with_unsigned(unsigned)
            .with_nullable(nullable);

        Ok(Self {
            domain,
            field_type,
            args,
        })
    }

    /// Evaluates operands left to right, stopping at the first non-NULL one.
    fn eval_row(
        &self,
        requested: EvalType,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Value> {
        if requested != self.domain {
            return Err(domain_mismatch(self, requested));
        }
        for arg in &self.args {
            let value = eval_value(arg.as_ref(), ctx, input, row)?;
            if !value.is_null() {
                return Ok(value);
            }
        }
        Ok(Value::Null)
    }

    fn check_batch(&self, requested: EvalType) -> Result<()> {
        if requested == self.domain {
            Err(not_vectorized(&self.name()))
        } else {
            Err(domain_mismatch(self, requested))
        }
    }
}

impl Expression for CoalesceSig {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn name(&self) -> String {
        format!("coalesce({})", self.domain.name().to_lowercase())
    }

    fn vectorized(&self) -> bool {
        false
    }

    fn vec_eval_int(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Int)
    }

    fn vec_eval_real(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Real)
    }

    fn vec_eval_decimal(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Decimal)
    }

    fn vec_eval_string(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::String)
    }

    fn vec_eval_duration(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Duration)
    }

    fn vec_eval_time(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Time)
    }

    fn vec_eval_json(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Json)
    }

    fn eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        Ok(self.eval_row(EvalType::Int, ctx, input, row)?.as_int())
    }

    fn eval_real(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<f64>> {
        Ok(self.eval_row(EvalType::Real, ctx, input, row)?.as_real())
    }

    fn eval_decimal(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Decimal>> {
        Ok(self.eval_row(EvalType::Decimal, ctx, input, row)?.as_decimal())
    }

    fn eval_string(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Vec<u8>>> {
        match self.eval_row(EvalType::String, ctx, input, row)? {
            Value::String(bytes) => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }

    fn eval_duration(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        match self.eval_row(EvalType::Duration, ctx, input, row)? {
            Value::Duration(nanos) => Ok(Some(nanos)),
            _ => Ok(None),
        }
    }

    fn eval_time(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        match self.eval_row(EvalType::Time, ctx, input, row)? {
            Value::Time(micros) => Ok(Some(micros)),
            _ => Ok(None),
        }
    }

    fn eval_json(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<String>> {
        match self.eval_row(EvalType::Json, ctx, input, row)? {
            Value::Json(text) => Ok(Some(text)),
            _ => Ok(None),
        }
    }
}
