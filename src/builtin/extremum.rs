use rust_decimal::Decimal;
use tracing::trace;

use crate::error::Result;
use crate::expression::{domain_mismatch, eval_value, vec_eval, EvalContext, Expression};
use crate::kernels::reduce::{fold_ints, fold_ordered, fold_strings};
use crate::kernels::Extremum;
use crate::types::{EvalType, FieldType, Value};
use crate::vectorized::{Column, FixedNative, VectorizedBatch};

use super::{check_min_arity, check_operands, not_vectorized};

/// `GREATEST(a, b, ...)` / `LEAST(a, b, ...)` over one domain.
#[derive(Debug)]
pub struct ExtremumSig {
    kind: Extremum,
    domain: EvalType,
    field_type: FieldType,
    args: Vec<Box<dyn Expression>>,
}

impl ExtremumSig {
    /// # Errors
    ///
    /// Returns `InvalidArgument` without operands and a type error if an
    /// operand does not evaluate in `domain`.
    pub fn new(kind: Extremum, domain: EvalType, args: Vec<Box<dyn Expression>>) -> Result<Self> {
        check_min_arity(kind.name(), &args, 1)?;
        check_operands(domain, args.iter().map(|arg| &**arg))?;

        // An integer reduction is unsigned only if every operand is.
        let unsigned = domain == EvalType::Int && args.iter().all(|arg| arg.field_type().unsigned);
        let nullable = args.iter().any(|arg| arg.field_type().nullable);
        let field_type = FieldType::new(domain)
            .with_unsigned(unsigned)
            .with_nullable(nullable);

        Ok(Self {
            kind,
            domain,
            field_type,
            args,
        })
    }

    #[must_use]
    pub fn kind(&self) -> Extremum {
        self.kind
    }

    /// Whether a reduction over `domain` has a batch implementation.
    #[must_use]
    pub fn supports_vectorized(domain: EvalType) -> bool {
        matches!(
            domain,
            EvalType::Int | EvalType::Real | EvalType::Decimal | EvalType::String
        )
    }

    fn check_batch(&self, requested: EvalType) -> Result<()> {
        if requested != self.domain {
            return Err(domain_mismatch(self, requested));
        }
        if !Self::supports_vectorized(self.domain) {
            return Err(not_vectorized(&self.name()));
        }
        Ok(())
    }

    /// In-place fold for fixed-width domains.
    fn fold_fixed<T: FixedNative>(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
        fold: impl Fn(&mut [T], &[bool], &[T]),
    ) -> Result<()> {
        let mut buf = ctx.pool().lease(self.domain, input.num_rows())?;
        vec_eval(self.args[0].as_ref(), ctx, input, result)?;
        for arg in &self.args[1..] {
            vec_eval(arg.as_ref(), ctx, input, &mut buf)?;
            result.merge_nulls(&[&*buf]);
            let (values, nulls) = result.values_and_nulls_mut::<T>();
            fold(values, nulls, buf.values::<T>());
        }
        Ok(())
    }

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
        let unsigned = self.field_type.unsigned;
        let mut best: Option<Value> = None;
        let mut null = false;
        for arg in &self.args {
            let value = eval_value(arg.as_ref(), ctx, input, row)?;
            if value.is_null() {
                null = true;
                continue;
            }
            best = match best {
                Some(current) => {
                    // Reals fold on the strict float order: a NaN neither
                    // replaces nor is replaced.
                    let ordering = match (&value, &current) {
                        (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
                        _ => value.compare(&current, unsigned, unsigned),
                    };
                    match ordering {
                        Some(ordering) if self.kind.prefers(ordering) => Some(value),
                        _ => Some(current),
                    }
                }
                None => Some(value),
            };
        }
        Ok(if null { Value::Null } else { best.unwrap_or(Value::Null) })
    }
}

impl Expression for ExtremumSig {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn name(&self) -> String {
        format!("{}({})", self.kind.name(), self.domain.name().to_lowercase())
    }

    fn vectorized(&self) -> bool {
        Self::supports_vectorized(self.domain) && self.args.iter().all(|arg| arg.vectorized())
    }

    fn vec_eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Int)?;
        let (kind, unsigned) = (self.kind, self.field_type.unsigned);
        self.fold_fixed::<i64>(ctx, input, result, |values, nulls, arg| {
            fold_ints(kind, unsigned, values, nulls, arg);
        })
    }

    fn vec_eval_real(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Real)?;
        let kind = self.kind;
        self.fold_fixed::<f64>(ctx, input, result, |values, nulls, arg| {
            fold_ordered(kind, values, nulls, arg);
        })
    }

    fn vec_eval_decimal(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::Decimal)?;
        let kind = self.kind;
        self.fold_fixed::<Decimal>(ctx, input, result, |values, nulls, arg| {
            fold_ordered(kind, values, nulls, arg);
        })
    }

    fn vec_eval_string(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.check_batch(EvalType::String)?;
        let n = input.num_rows();
        let mut arg = ctx.pool().lease(EvalType::String, n)?;
        let mut spare = ctx.pool().lease(EvalType::String, n)?;

        vec_eval(self.args[0].as_ref(), ctx, input, result)?;
        let fold = fold_strings(
            self.kind,
            self.args.len(),
            result,
            &mut arg,
            &mut spare,
            |j, column| vec_eval(self.args[j].as_ref(), ctx, input, column),
        )?;
        if fold.copied_back {
            trace!(
                signature = %self.name(),
                steps = fold.steps,
                "copied string fold back into output"
            );
        }
        Ok(())
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
