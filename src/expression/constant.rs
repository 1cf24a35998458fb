use rust_decimal::Decimal;

use crate::error::{Result, VexprError};
use crate::types::{EvalType, FieldType, Value};
use crate::vectorized::{Column, VectorizedBatch};

use super::{domain_mismatch, EvalContext, Expression};

/// Leaf producing the same value on every row.
#[derive(Debug, Clone)]
pub struct Constant {
    value: Value,
    field_type: FieldType,
}

impl Constant {
    /// Creates a constant of `field_type`.
    ///
    /// # Errors
    ///
    /// Returns a type error if `value` is neither NULL nor of the field's domain.
    pub fn new(value: Value, field_type: FieldType) -> Result<Self> {
        if let Some(actual) = value.eval_type() {
            if actual != field_type.eval_type {
                return Err(VexprError::TypeError {
                    expected: field_type.eval_type.name().into(),
                    actual: actual.name().into(),
                });
            }
        }
        let field_type = field_type.with_nullable(value.is_null());
        Ok(Self { value, field_type })
    }

    fn of(value: Value, field_type: FieldType) -> Self {
        let field_type = field_type.with_nullable(value.is_null());
        Self { value, field_type }
    }

    #[must_use]
    pub fn int(v: i64) -> Self {
        Self::of(Value::Int(v), FieldType::int())
    }

    /// Unsigned integer, stored as its 64-bit pattern.
    #[must_use]
    pub fn uint(v: u64) -> Self {
        Self::of(Value::Int(v as i64), FieldType::unsigned_int())
    }

    #[must_use]
    pub fn real(v: f64) -> Self {
        Self::of(Value::Real(v), FieldType::new(EvalType::Real))
    }

    #[must_use]
    pub fn decimal(v: Decimal) -> Self {
        Self::of(Value::Decimal(v), FieldType::new(EvalType::Decimal))
    }

    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::of(Value::string(s), FieldType::new(EvalType::String))
    }

    #[must_use]
    pub fn duration(nanos: i64) -> Self {
        Self::of(Value::Duration(nanos), FieldType::new(EvalType::Duration))
    }

    #[must_use]
    pub fn time(micros: i64) -> Self {
        Self::of(Value::Time(micros), FieldType::new(EvalType::Time))
    }

    #[must_use]
    pub fn json(text: &str) -> Self {
        Self::of(Value::Json(text.to_string()), FieldType::new(EvalType::Json))
    }

    /// Typed NULL.
    #[must_use]
    pub fn null(eval_type: EvalType) -> Self {
        Self::of(Value::Null, FieldType::new(eval_type).with_nullable(true))
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
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
        let n = input.num_rows();
        result.reset();
        result.reserve(n)?;
        for _ in 0..n {
            result.append_value(&self.value)?;
        }
        Ok(())
    }

    fn value_for(&self, requested: EvalType) -> Result<&Value> {
        if requested == self.field_type.eval_type {
            Ok(&self.value)
        } else {
            Err(domain_mismatch(self, requested))
        }
    }
}

impl Expression for Constant {
    fn field_type(&self) -> FieldType {
        self.field_type
    }

    fn name(&self) -> String {
        format!("constant({})", self.value)
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
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<i64>> {
        Ok(self.value_for(EvalType::Int)?.as_int())
    }

    fn eval_real(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<f64>> {
        Ok(self.value_for(EvalType::Real)?.as_real())
    }

    fn eval_decimal(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<Decimal>> {
        Ok(self.value_for(EvalType::Decimal)?.as_decimal())
    }

    fn eval_string(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<Vec<u8>>> {
        Ok(self.value_for(EvalType::String)?.as_bytes().map(<[u8]>::to_vec))
    }

    fn eval_duration(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<i64>> {
        match self.value_for(EvalType::Duration)? {
            Value::Duration(nanos) => Ok(Some(*nanos)),
            _ => Ok(None),
        }
    }

    fn eval_time(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<i64>> {
        match self.value_for(EvalType::Time)? {
            Value::Time(micros) => Ok(Some(*micros)),
            _ => Ok(None),
        }
    }

    fn eval_json(
        &self,
        _ctx: &EvalContext,
        _input: &VectorizedBatch,
        _row: usize,
    ) -> Result<Option<String>> {
        match self.value_for(EvalType::Json)? {
            Value::Json(text) => Ok(Some(text.clone())),
            _ => Ok(None),
        }
    }
}
