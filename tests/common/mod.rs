//! Shared helpers for the integration test binaries.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use vexpr::{
    Column, ColumnRef, EvalContext, EvalType, Expression, FieldType, Result, VectorizedBatch,
    VexprError,
};

static INIT: Once = Once::new();

/// Installs a tracing subscriber once per test binary. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_tracing() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Builds a batch from named Arrow arrays; every field is nullable.
pub fn batch(columns: Vec<(&str, ArrayRef)>) -> VectorizedBatch {
    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
        .collect();
    let arrays = columns.into_iter().map(|(_, array)| array).collect();
    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).expect("build batch");
    VectorizedBatch::new(batch)
}

pub fn ints(values: Vec<Option<i64>>) -> ArrayRef {
    Arc::new(Int64Array::from(values))
}

pub fn uints(values: Vec<Option<u64>>) -> ArrayRef {
    Arc::new(UInt64Array::from(values))
}

pub fn reals(values: Vec<Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

pub fn strings(values: Vec<Option<&str>>) -> ArrayRef {
    Arc::new(StringArray::from(values))
}

/// Column reference to `name` in `input`.
pub fn col(input: &VectorizedBatch, name: &str) -> Box<dyn Expression> {
    Box::new(ColumnRef::from_schema(&input.schema(), name).expect("resolve column"))
}

/// Reads an `Int` result column back as options.
pub fn int_rows(column: &Column) -> Vec<Option<i64>> {
    (0..column.len())
        .map(|row| (!column.is_null(row)).then(|| column.get_i64(row)))
        .collect()
}

/// Reads a `String` result column back as options.
pub fn string_rows(column: &Column) -> Vec<Option<String>> {
    (0..column.len())
        .map(|row| {
            (!column.is_null(row))
                .then(|| String::from_utf8_lossy(column.get_bytes(row)).into_owned())
        })
        .collect()
}

/// Evaluates `expr` as an `Int` batch into a fresh column.
pub fn eval_ints(
    expr: &dyn Expression,
    ctx: &EvalContext,
    input: &VectorizedBatch,
) -> Result<Vec<Option<i64>>> {
    let mut out = Column::new(EvalType::Int, input.num_rows());
    expr.vec_eval_int(ctx, input, &mut out)?;
    Ok(int_rows(&out))
}

/// Operand that fails every entry point, standing in for a broken child.
#[derive(Debug)]
pub struct FailingExpr {
    field_type: FieldType,
}

impl FailingExpr {
    pub fn new(eval_type: EvalType) -> Self {
        Self {
            field_type: FieldType::new(eval_type),
        }
    }

    fn fail(&self) -> VexprError {
        VexprError::EvaluationError("operand failed".into())
    }
}

impl Expression for FailingExpr {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn name(&self) -> String {
        "failing".into()
    }

    fn vec_eval_int(&self, _: &EvalContext, _: &VectorizedBatch, _: &mut Column) -> Result<()> {
        Err(self.fail())
    }

    fn vec_eval_real(&self, _: &EvalContext, _: &VectorizedBatch, _: &mut Column) -> Result<()> {
        Err(self.fail())
    }

    fn vec_eval_string(&self, _: &EvalContext, _: &VectorizedBatch, _: &mut Column) -> Result<()> {
        Err(self.fail())
    }

    fn eval_int(&self, _: &EvalContext, _: &VectorizedBatch, _: usize) -> Result<Option<i64>> {
        Err(self.fail())
    }

    fn eval_real(&self, _: &EvalContext, _: &VectorizedBatch, _: usize) -> Result<Option<f64>> {
        Err(self.fail())
    }
}
