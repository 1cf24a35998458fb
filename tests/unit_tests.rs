//! Unit tests for vexpr.

mod common;

use std::cmp::Ordering;

use common::*;
use rust_decimal_macros::dec;
use vexpr::kernels::compare::compare_int_pair;
use vexpr::{
    eval_batch, eval_value, new_signature, BufferPool, Column, CompareOp, CompareSig,
    ComparisonFunction, Constant, EvalConfig, EvalContext, EvalType, Expression, FieldType,
    IntervalSearch, PoolConfig, SelectionVector, Value, VectorizedBatch, VexprError,
};

// =============================================================================
// Error Tests
// =============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_not_vectorized_display() {
        let err = VexprError::NotVectorized("eq(int)".into());
        assert!(err.to_string().contains("Not implemented"));
        assert!(err.to_string().contains("eq(int)"));
        assert!(err.is_not_vectorized());
        assert!(!err.is_allocation_failure());
    }

    #[test]
    fn test_type_error_display() {
        let err = VexprError::TypeError {
            expected: "INT".into(),
            actual: "STRING".into(),
        };
        assert!(err.to_string().contains("INT"));
        assert!(err.to_string().contains("STRING"));
    }

    #[test]
    fn test_allocation_failed_display() {
        let err = VexprError::AllocationFailed("buffer pool exhausted".into());
        assert!(err.to_string().contains("Allocation failed"));
        assert!(err.is_allocation_failure());
    }
}

// =============================================================================
// Type Tests
// =============================================================================

mod type_tests {
    use super::*;

    #[test]
    fn test_value_compare_across_signedness() {
        let minus_one = Value::Int(-1);
        let zero = Value::Int(0);
        assert_eq!(minus_one.compare(&zero, false, false), Some(Ordering::Less));
        assert_eq!(minus_one.compare(&zero, true, false), Some(Ordering::Greater));
        assert_eq!(minus_one.compare(&zero, false, true), Some(Ordering::Less));
        assert_eq!(minus_one.compare(&zero, true, true), Some(Ordering::Greater));
        assert_eq!(compare_int_pair(true, true, -1, i64::MAX), 1);
    }

    #[test]
    fn test_value_compare_null() {
        assert_eq!(Value::Null.compare(&Value::Int(1), false, false), None);
    }

    #[test]
    fn test_value_compare_decimal_scale_insensitive() {
        let a = Value::Decimal(dec!(1.50));
        let b = Value::Decimal(dec!(1.5));
        assert_eq!(a.compare(&b, false, false), Some(Ordering::Equal));
    }

    #[test]
    fn test_field_type_builders() {
        let ft = FieldType::unsigned_int().with_nullable(false);
        assert_eq!(ft.eval_type, EvalType::Int);
        assert!(ft.unsigned);
        assert!(!ft.nullable);
    }

    #[test]
    fn test_eval_type_names() {
        let names: Vec<&str> = EvalType::ALL.iter().map(EvalType::name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"DECIMAL"));
    }
}

// =============================================================================
// Column Tests
// =============================================================================

mod column_tests {
    use super::*;

    #[test]
    fn test_fixed_width_set_and_get() {
        let mut column = Column::new(EvalType::Decimal, 2);
        column.resize(2);
        column.decimals_mut()[1] = dec!(3.25);
        column.set_null(0, true);
        assert_eq!(column.value(0), Value::Null);
        assert_eq!(column.value(1), Value::Decimal(dec!(3.25)));
    }

    #[test]
    fn test_variable_width_append_and_reset() {
        let mut column = Column::new(EvalType::String, 4);
        column.append_bytes(b"abc");
        column.append_null();
        column.append_bytes(b"");
        assert_eq!(column.len(), 3);
        assert_eq!(column.get_bytes(0), b"abc");
        assert!(column.is_null(1));
        assert_eq!(column.get_bytes(2), b"");

        let capacity = column.capacity();
        column.reset();
        assert!(column.is_empty());
        assert_eq!(column.capacity(), capacity);
    }

    #[test]
    fn test_merge_nulls_and_copy_into() {
        let mut a = Column::from_values(EvalType::Int, &[Value::Int(1), Value::Int(2), Value::Null])
            .expect("column");
        let b = Column::from_values(EvalType::Int, &[Value::Null, Value::Int(2), Value::Int(3)])
            .expect("column");
        a.merge_nulls(&[&b]);
        assert_eq!(a.nulls(), &[true, false, true]);

        let mut copy = Column::new(EvalType::Int, 0);
        a.copy_into(&mut copy);
        assert_eq!(copy, a);
    }

    #[test]
    fn test_arrow_round_trip_keeps_nulls() {
        let array = ints(vec![Some(1), None, Some(-7)]);
        let column = Column::from_array(array.as_ref(), EvalType::Int).expect("import");
        let exported = column.to_array(false).expect("export");
        assert_eq!(exported.as_ref(), array.as_ref());
    }
}

// =============================================================================
// Batch Tests
// =============================================================================

mod batch_tests {
    use super::*;

    #[test]
    fn test_filter_with_comparison_result() {
        let input = batch(vec![("a", ints(vec![Some(1), Some(7), None, Some(9)]))]);
        let ctx = EvalContext::default();
        let gt = new_signature(
            ComparisonFunction::Compare(CompareOp::Gt),
            EvalType::Int,
            vec![col(&input, "a"), Box::new(Constant::int(5))],
        )
        .expect("signature");

        let mut predicate = Column::new(EvalType::Int, input.num_rows());
        gt.vec_eval_int(&ctx, &input, &mut predicate).expect("evaluate");
        let filtered = input.filter(&predicate).expect("filter");
        assert_eq!(filtered.num_rows(), 2);

        let a = col(&filtered, "a");
        let mut out = Column::new(EvalType::Int, 2);
        a.vec_eval_int(&ctx, &filtered, &mut out).expect("evaluate");
        assert_eq!(int_rows(&out), vec![Some(7), Some(9)]);
    }

    #[test]
    fn test_selection_vector_accessors() {
        let selection = SelectionVector::new(vec![3, 1]);
        assert_eq!(selection.len(), 2);
        assert!(!selection.is_empty());
        assert_eq!(selection.get(0), Some(3));
    }
}

// =============================================================================
// Pool Tests
// =============================================================================

mod pool_tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let pool = BufferPool::new(PoolConfig::default(), 8);
        {
            let _a = pool.lease(EvalType::Int, 8).expect("lease");
            let _b = pool.lease(EvalType::String, 8).expect("lease");
            assert_eq!(pool.stats().outstanding, 2);
        }
        let stats = pool.stats();
        assert_eq!(stats.outstanding, 0);
        assert_eq!(stats.cached, 2);
    }

    #[test]
    fn test_exhaustion_surfaces_as_allocation_failure() {
        // A comparison needs two scratch columns.
        let ctx = EvalContext::new(
            EvalConfig::new().with_pool(PoolConfig::default().with_max_leased(1)),
        );
        let input = batch(vec![("a", ints(vec![Some(1)]))]);
        let lt = new_signature(
            ComparisonFunction::Compare(CompareOp::Lt),
            EvalType::Int,
            vec![col(&input, "a"), col(&input, "a")],
        )
        .expect("signature");

        let err = eval_ints(lt.as_ref(), &ctx, &input).unwrap_err();
        assert!(err.is_allocation_failure());
        assert_eq!(ctx.pool().stats().outstanding, 0);
    }
}

// =============================================================================
// Signature Construction Tests
// =============================================================================

mod signature_tests {
    use super::*;

    #[test]
    fn test_compare_arity() {
        let err = new_signature(
            ComparisonFunction::Compare(CompareOp::Lt),
            EvalType::Int,
            vec![Box::new(Constant::int(1))],
        )
        .unwrap_err();
        assert!(matches!(err, VexprError::InvalidArgument(_)));
    }

    #[test]
    fn test_interval_domain_must_match_target() {
        let err = new_signature(
            ComparisonFunction::Interval(IntervalSearch::Binary),
            EvalType::Real,
            vec![Box::new(Constant::int(1)), Box::new(Constant::int(2))],
        )
        .unwrap_err();
        assert!(matches!(err, VexprError::TypeError { .. }));
    }

    #[test]
    fn test_names() {
        let sig = CompareSig::new(
            CompareOp::Ge,
            EvalType::Duration,
            Box::new(Constant::duration(1)),
            Box::new(Constant::duration(2)),
        )
        .expect("signature");
        assert_eq!(sig.name(), "ge(duration)");
        assert!(sig.vectorized());
    }
}

// =============================================================================
// Row Fallback Tests
// =============================================================================

mod row_fallback_tests {
    use super::*;

    #[test]
    fn test_eval_batch_routes_tree_with_row_only_child() {
        let input = batch(vec![
            ("a", ints(vec![None, Some(5), None])),
            ("b", ints(vec![Some(2), Some(1), None])),
        ]);
        let ctx = EvalContext::default();
        let coalesce = new_signature(
            ComparisonFunction::Coalesce,
            EvalType::Int,
            vec![col(&input, "a"), col(&input, "b")],
        )
        .expect("coalesce");
        let greatest = new_signature(
            ComparisonFunction::Greatest,
            EvalType::Int,
            vec![coalesce, col(&input, "b")],
        )
        .expect("greatest");
        assert!(!greatest.vectorized());

        let mut out = Column::new(EvalType::Int, 3);
        eval_batch(greatest.as_ref(), &ctx, &input, &mut out).expect("evaluate");
        assert_eq!(int_rows(&out), vec![Some(2), Some(5), None]);
        assert_eq!(ctx.pool().stats().outstanding, 0);
    }

    #[test]
    fn test_compare_over_row_only_child_is_not_vectorized() {
        let input = batch(vec![("a", ints(vec![None, Some(9)]))]);
        let ctx = EvalContext::default();
        let coalesce = new_signature(
            ComparisonFunction::Coalesce,
            EvalType::Int,
            vec![col(&input, "a"), Box::new(Constant::int(0))],
        )
        .expect("coalesce");
        let lt = new_signature(
            ComparisonFunction::Compare(CompareOp::Lt),
            EvalType::Int,
            vec![coalesce, Box::new(Constant::int(5))],
        )
        .expect("lt");
        assert!(!lt.vectorized());

        let mut out = Column::new(EvalType::Int, 2);
        eval_batch(lt.as_ref(), &ctx, &input, &mut out).expect("evaluate");
        assert_eq!(int_rows(&out), vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_eval_batch_routes_row_only_signatures() {
        let input = batch(vec![
            ("a", ints(vec![Some(1), None, Some(3)])),
            ("b", ints(vec![Some(1), None, Some(4)])),
        ]);
        let ctx = EvalContext::default();
        let null_eq = new_signature(
            ComparisonFunction::Compare(CompareOp::NullEq),
            EvalType::Int,
            vec![col(&input, "a"), col(&input, "b")],
        )
        .expect("signature");

        let mut out = Column::new(EvalType::Int, 3);
        eval_batch(null_eq.as_ref(), &ctx, &input, &mut out).expect("evaluate");
        assert_eq!(int_rows(&out), vec![Some(1), Some(1), Some(0)]);
    }

    #[test]
    fn test_coalesce_rows() {
        let input = batch(vec![
            ("a", strings(vec![None, Some("x"), None])),
            ("b", strings(vec![Some("y"), Some("z"), None])),
        ]);
        let ctx = EvalContext::default();
        let coalesce = new_signature(
            ComparisonFunction::Coalesce,
            EvalType::String,
            vec![col(&input, "a"), col(&input, "b")],
        )
        .expect("signature");

        let values: Vec<Value> = (0..3)
            .map(|row| eval_value(coalesce.as_ref(), &ctx, &input, row).expect("evaluate"))
            .collect();
        assert_eq!(values, vec![Value::string("y"), Value::string("x"), Value::Null]);
    }

    #[test]
    fn test_json_compare_is_row_only() {
        let input = VectorizedBatch::empty_with_rows(1).expect("batch");
        let ctx = EvalContext::default();
        let lt = new_signature(
            ComparisonFunction::Compare(CompareOp::Lt),
            EvalType::Json,
            vec![Box::new(Constant::json("1")), Box::new(Constant::json("2"))],
        )
        .expect("signature");
        assert!(!lt.vectorized());
        assert_eq!(lt.eval_int(&ctx, &input, 0).expect("evaluate"), Some(1));
    }
}
