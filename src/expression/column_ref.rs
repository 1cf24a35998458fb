use arrow::array::ArrayRef;
use arrow::datatypes::Schema;
use rust_decimal::Decimal;

use crate::error::{Result, VexprError};
use crate::types::{EvalType, FieldType, Value};
use crate::vectorized::{Column, VectorizedBatch};

use super::{domain_mismatch, EvalContext, Expression};

/// Leaf reading one column of the input batch.
#[derive(Debug, Clone)]
pub struct ColumnRef {
    index: usize,
    name: String,
    field_type: FieldType,
}

impl ColumnRef {
    pub fn new(index: usize, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            index,
            name: name.into(),
            field_type,
        }
    }

    /// Resolves `name` against `schema`, deriving the field type from the
    /// Arrow field.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if the schema has no such field and
    /// `UnsupportedOperation` if its Arrow type maps to no domain.
    pub fn from_schema(schema: &Schema, name: &str) -> Result<Self> {
        let index = schema
            .index_of(name)
            .map_err(|_| VexprError::ColumnNotFound(name.to_string()))?;
        let field = schema.field(index);
        let field_type = FieldType::from_arrow(field).ok_or_else(|| {
            VexprError::UnsupportedOperation(format!(
                "column {name} has Arrow type {}",
                field.data_type()
            ))
        })?;
        Ok(Self::new(index, name, field_type))
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    fn array<'a>(&self, input: &'a VectorizedBatch) -> Result<&'a ArrayRef> {
        input.column(self.index).ok_or_else(|| {
            VexprError::ColumnNotFound(format!("{} (index {})", self.name, self.index))
        })
    }

    fn fill(
        &self,
        requested: EvalType,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        if requested != self.field_type.eval_type {
            return Err(domain_mismatch(self, requested));
        }
        let array = self.array(input)?;
        result.fill_from_array(array.as_ref(), input.selection())
    }

    fn value_at(&self, requested: EvalType, input: &VectorizedBatch, row: usize) -> Result<Value> {
        if requested != self.field_type.eval_type {
            return Err(domain_mismatch(self, requested));
        }
        let array = self.array(input)?;
        let slice = array.slice(input.physical_row(row), 1);
        Ok(Column::from_array(slice.as_ref(), requested)?.value(0))
    }
}

impl Expression for ColumnRef {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn name(&self) -> String {
        format!("column({})", self.name)
    }

    fn vec_eval_int(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Int, input, result)
    }

    fn vec_eval_real(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Real, input, result)
    }

    fn vec_eval_decimal(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Decimal, input, result)
    }

    fn vec_eval_string(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::String, input, result)
    }

    fn vec_eval_duration(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Duration, input, result)
    }

    fn vec_eval_time(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Time, input, result)
    }

    fn vec_eval_json(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        result: &mut Column,
    ) -> Result<()> {
        self.fill(EvalType::Json, input, result)
    }

    fn eval_int(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        Ok(self.value_at(EvalType::Int, input, row)?.as_int())
    }

    fn eval_real(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<f64>> {
        Ok(self.value_at(EvalType::Real, input, row)?.as_real())
    }

    fn eval_decimal(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Decimal>> {
        Ok(self.value_at(EvalType::Decimal, input, row)?.as_decimal())
    }

    fn eval_string(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<Vec<u8>>> {
        match self.value_at(EvalType::String, input, row)? {
            Value::String(bytes) => Ok(Some(bytes)),
            _ => Ok(None),
        }
    }

    fn eval_duration(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        match self.value_at(EvalType::Duration, input, row)? {
            Value::Duration(nanos) => Ok(Some(nanos)),
            _ => Ok(None),
        }
    }

    fn eval_time(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<i64>> {
        match self.value_at(EvalType::Time, input, row)? {
            Value::Time(micros) => Ok(Some(micros)),
            _ => Ok(None),
        }
    }

    fn eval_json(
        &self,
        _ctx: &EvalContext,
        input: &VectorizedBatch,
        row: usize,
    ) -> Result<Option<String>> {
        match self.value_at(EvalType::Json, input, row)? {
            Value::Json(text) => Ok(Some(text)),
            _ => Ok(None),
        }
    }
}
