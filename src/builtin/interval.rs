use crate::error::{Result, VexprError};
use crate::expression::{domain_mismatch, EvalContext, Expression};
use crate::kernels::interval::{int_target_lt, real_target_lt, search};
use crate::kernels::IntervalSearch;
use crate::types::{EvalType, FieldType};
use crate::vectorized::{Column, VectorizedBatch};

use super::{check_min_arity, check_operands};

/// `INTERVAL(target, b1, ..., bm)`: how many boundaries are not greater than
/// `target`, or -1 when `target` is NULL.
///
/// The target is evaluated as a batch; boundaries are evaluated one row at a
/// time, only at the positions the search probes.
#[derive(Debug)]
pub struct IntervalSig {
    target: Box<dyn Expression>,
    boundaries: Vec<Box<dyn Expression>>,
    search: IntervalSearch,
}

impl IntervalSig {
    /// `args[0]` is the target, the rest are boundaries of the same domain.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` with fewer than two arguments and a type
    /// error unless every argument is `Int`, or every argument is `Real`.
    pub fn new(mut args: Vec<Box<dyn Expression>>, search: IntervalSearch) -> Result<Self> {
        check_min_arity("interval", &args, 2)?;
        let boundaries = args.split_off(1);
        let Some(target) = args.pop() else {
            return Err(VexprError::InvalidArgument("interval expects a target".into()));
        };

        let domain = target.field_type().eval_type;
        if !matches!(domain, EvalType::Int | EvalType::Real) {
            return Err(VexprError::TypeError {
                expected: "INT or REAL".into(),
                actual: domain.name().into(),
            });
        }
        check_operands(domain, boundaries.iter().map(|b| &**b))?;

        Ok(Self {
            target,
            boundaries,
            search,
        })
    }

    #[must_use]
    pub fn target_domain(&self) -> EvalType {
        self.target.field_type().eval_type
    }

    #[must_use]
    pub fn search(&self) -> IntervalSearch {
        self.search
    }

    fn position_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
        target: i64,
    ) -> Result<i64> {
        let target_unsigned = self.target.field_type().unsigned;
        let position = search(self.search, self.boundaries.len(), |idx| {
            let boundary = &self.boundaries[idx];
            Ok(boundary.eval_int(ctx, input, row)?.is_some_and(|v| {
                int_target_lt(target, target_unsigned, v, boundary.field_type().unsigned)
            }))
        })?;
        Ok(position as i64)
    }

    fn position_real(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
        target: f64,
    ) -> Result<i64> {
        let position = search(self.search, self.boundaries.len(), |idx| {
            Ok(self.boundaries[idx]
                .eval_real(ctx, input, row)?
                .is_some_and(|v| real_target_lt(target, v)))
        })?;
        Ok(position as i64)
    }

    fn vec_eval_int_target(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.target.vec_eval_int(ctx, input, result)?;
        let (values, nulls) = result.values_and_nulls_mut::<i64>();
        for (row, (value, null)) in values.iter_mut().zip(nulls.iter_mut()).enumerate() {
            *value = if *null {
                -1
            } else {
                self.position_int(ctx, input, row, *value)?
            };
            *null = false;
        }
        Ok(())
    }

    fn vec_eval_real_target(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        let n = input.num_rows();
        let mut target = ctx.pool().lease(EvalType::Real, n)?;
        self.target.vec_eval_real(ctx, input, &mut target)?;

        result.resize(n);
        for (row, slot) in result.i64s_mut().iter_mut().enumerate() {
            *slot = if target.is_null(row) {
                -1
            } else {
                self.position_real(ctx, input, row, target.get_f64(row))?
            };
        }
        Ok(())
    }
}

impl Expression for IntervalSig {
    fn field_type(&self) -> FieldType {
        FieldType::int().with_nullable(false)
    }

    fn name(&self) -> String {
        format!("interval({})", self.target_domain().name().to_lowercase())
    }

    // Boundaries are only ever evaluated through their row entry points.
    fn vectorized(&self) -> bool {
        self.target.vectorized()
    }

    fn vec_eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        match self.target_domain() {
            EvalType::Int => self.vec_eval_int_target(ctx, input, result),
            EvalType::Real => self.vec_eval_real_target(ctx, input, result),
            other => Err(domain_mismatch(self.target.as_ref(), other)),
        }
    }

    fn eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        let position = match self.target_domain() {
            EvalType::Int => match self.target.eval_int(ctx, input, row)? {
                Some(target) => self.position_int(ctx, input, row, target)?,
                None => -1,
            },
            EvalType::Real => match self.target.eval_real(ctx, input, row)? {
                Some(target) => self.position_real(ctx, input, row, target)?,
                None => -1,
            },
            other => return Err(domain_mismatch(self.target.as_ref(), other)),
        };
        Ok(Some(position))
    }
}
