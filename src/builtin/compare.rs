use std::cmp::Ordering;

use crate::error::Result;
use crate::expression::{eval_value, vec_eval, EvalContext, Expression};
use crate::kernels::compare::{compare_bytes, compare_decimals, compare_ints, compare_reals};
use crate::kernels::{collapse, CompareOp};
use crate::types::{EvalType, FieldType};
use crate::vectorized::{Column, VectorizedBatch};

use super::{check_operands, not_vectorized};

/// Binary relational operator over one operand domain. Produces 0/1 `Int`.
#[derive(Debug)]
pub struct CompareSig {
    op: CompareOp,
    domain: EvalType,
    lhs: Box<dyn Expression>,
    rhs: Box<dyn Expression>,
}

impl CompareSig {
    /// # Errors
    ///
    /// Returns a type error if either operand does not evaluate in `domain`.
    pub fn new(
        op: CompareOp,
        domain: EvalType,
        lhs: Box<dyn Expression>,
        rhs: Box<dyn Expression>,
    ) -> Result<Self> {
        let sig = Self {
            op,
            domain,
            lhs,
            rhs,
        };
        check_operands(domain, [sig.lhs.as_ref(), sig.rhs.as_ref()])?;
        Ok(sig)
    }

    #[must_use]
    pub fn op(&self) -> CompareOp {
        self.op
    }

    #[must_use]
    pub fn domain(&self) -> EvalType {
        self.domain
    }

    /// Whether `op` over `domain` has a batch implementation.
    ///
    /// Null-safe equality, integer `=`/`<>` and every JSON comparison are
    /// row-only.
    #[must_use]
    pub fn supports_vectorized(op: CompareOp, domain: EvalType) -> bool {
        match (op, domain) {
            (CompareOp::NullEq, _) | (_, EvalType::Json) => false,
            (CompareOp::Eq | CompareOp::Ne, EvalType::Int) => false,
            _ => true,
        }
    }
}

impl Expression for CompareSig {
    fn field_type(&self) -> FieldType {
        let nullable = self.op != CompareOp::NullEq
            && (self.lhs.field_type().nullable || self.rhs.field_type().nullable);
        FieldType::int().with_nullable(nullable)
    }

    fn name(&self) -> String {
        format!("{}({})", self.op.name(), self.domain.name().to_lowercase())
    }

    fn vectorized(&self) -> bool {
        Self::supports_vectorized(self.op, self.domain)
            && self.lhs.vectorized()
            && self.rhs.vectorized()
    }

    fn vec_eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        if !Self::supports_vectorized(self.op, self.domain) {
            return Err(not_vectorized(&self.name()));
        }

        let n = input.num_rows();
        let mut lhs = ctx.pool().lease(self.domain, n)?;
        vec_eval(self.lhs.as_ref(), ctx, input, &mut lhs)?;
        let mut rhs = ctx.pool().lease(self.domain, n)?;
        vec_eval(self.rhs.as_ref(), ctx, input, &mut rhs)?;

        result.resize(n);
        let deltas = result.i64s_mut();
        match self.domain {
            EvalType::Int => compare_ints(
                self.lhs.field_type().unsigned,
                self.rhs.field_type().unsigned,
                lhs.i64s(),
                rhs.i64s(),
                deltas,
            ),
            EvalType::Duration | EvalType::Time => {
                compare_ints(false, false, lhs.i64s(), rhs.i64s(), deltas);
            }
            EvalType::Real => compare_reals(lhs.f64s(), rhs.f64s(), deltas),
            EvalType::Decimal => compare_decimals(lhs.decimals(), rhs.decimals(), deltas),
            EvalType::String => compare_bytes(&lhs, &rhs, deltas),
            EvalType::Json => return Err(not_vectorized(&self.name())),
        }
        result.merge_nulls(&[&*lhs, &*rhs]);
        collapse(self.op, result.i64s_mut());
        Ok(())
    }

    fn eval_int(
        &self,
        ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        let lhs = eval_value(self.lhs.as_ref(), ctx, input, row)?;
        let rhs = eval_value(self.rhs.as_ref(), ctx, input, row)?;
        let ordering = lhs.compare(
            &rhs,
            self.lhs.field_type().unsigned,
            self.rhs.field_type().unsigned,
        );

        if self.op == CompareOp::NullEq {
            let equal = match (lhs.is_null(), rhs.is_null()) {
                (true, true) => true,
                (false, false) => ordering == Some(Ordering::Equal),
                _ => false,
            };
            return Ok(Some(i64::from(equal)));
        }
        Ok(ordering.map(|ordering| i64::from(self.op.holds(ordering))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Constant;
    use crate::types::Value;

    fn sig(op: CompareOp, lhs: Constant, rhs: Constant) -> CompareSig {
        let domain = lhs.field_type().eval_type;
        CompareSig::new(op, domain, Box::new(lhs), Box::new(rhs)).unwrap()
    }

    #[test]
    fn test_vectorized_matrix() {
        assert!(CompareSig::supports_vectorized(CompareOp::Lt, EvalType::Int));
        assert!(CompareSig::supports_vectorized(CompareOp::Ge, EvalType::Int));
        assert!(!CompareSig::supports_vectorized(CompareOp::Eq, EvalType::Int));
        assert!(!CompareSig::supports_vectorized(CompareOp::Ne, EvalType::Int));
        assert!(CompareSig::supports_vectorized(CompareOp::Eq, EvalType::String));
        assert!(!CompareSig::supports_vectorized(CompareOp::NullEq, EvalType::Real));
        assert!(!CompareSig::supports_vectorized(CompareOp::Lt, EvalType::Json));
    }

    #[test]
    fn test_batch_unsigned_vs_signed() {
        let input = VectorizedBatch::empty_with_rows(2).unwrap();
        let ctx = EvalContext::default();
        // u64::MAX > -1 regardless of bit pattern.
        let gt = sig(CompareOp::Gt, Constant::uint(u64::MAX), Constant::int(-1));

        let mut out = Column::new(EvalType::Int, 2);
        gt.vec_eval_int(&ctx, &input, &mut out).unwrap();
        assert_eq!(out.i64s(), &[1, 1]);
        assert_eq!(out.null_count(), 0);
        assert_eq!(ctx.pool().stats().outstanding, 0);
    }

    #[test]
    fn test_not_vectorized_fails_every_call() {
        let input = VectorizedBatch::empty_with_rows(1).unwrap();
        let ctx = EvalContext::default();
        let eq = sig(CompareOp::Eq, Constant::int(1), Constant::int(1));

        let mut out = Column::new(EvalType::Int, 1);
        for _ in 0..3 {
            assert!(eq.vec_eval_int(&ctx, &input, &mut out).unwrap_err().is_not_vectorized());
        }
        assert_eq!(eq.eval_int(&ctx, &input, 0).unwrap(), Some(1));
    }

    #[test]
    fn test_row_null_safe_equals() {
        let input = VectorizedBatch::empty_with_rows(1).unwrap();
        let ctx = EvalContext::default();

        let both_null = sig(
            CompareOp::NullEq,
            Constant::null(EvalType::Int),
            Constant::null(EvalType::Int),
        );
        assert_eq!(both_null.eval_int(&ctx, &input, 0).unwrap(), Some(1));
        assert!(!both_null.field_type().nullable);

        let one_null = sig(CompareOp::NullEq, Constant::int(1), Constant::null(EvalType::Int));
        assert_eq!(one_null.eval_int(&ctx, &input, 0).unwrap(), Some(0));

        let lt = sig(CompareOp::Lt, Constant::int(1), Constant::null(EvalType::Int));
        assert_eq!(lt.eval_int(&ctx, &input, 0).unwrap(), None);
    }

    #[test]
    fn test_rejects_operand_of_other_domain() {
        let err = CompareSig::new(
            CompareOp::Lt,
            EvalType::Int,
            Box::new(Constant::int(1)),
            Box::new(Constant::real(1.0)),
        )
        .unwrap_err();
        assert!(err.to_string().contains("REAL"));
    }

    #[test]
    fn test_string_and_decimal_batches() {
        let input = VectorizedBatch::empty_with_rows(1).unwrap();
        let ctx = EvalContext::default();
        let mut out = Column::new(EvalType::Int, 1);

        sig(CompareOp::Le, Constant::string("abc"), Constant::string("abd"))
            .vec_eval_int(&ctx, &input, &mut out)
            .unwrap();
        assert_eq!(out.value(0), Value::Int(1));

        sig(
            CompareOp::Ne,
            Constant::decimal(rust_decimal::Decimal::new(150, 2)),
            Constant::decimal(rust_decimal::Decimal::new(15, 1)),
        )
        .vec_eval_int(&ctx, &input, &mut out)
        .unwrap();
        assert_eq!(out.value(0), Value::Int(0));
    }
}
