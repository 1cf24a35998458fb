//! Null-aware column buffers for one evaluation batch.
//!
//! A [`Column`] holds exactly one slot per row plus a parallel null flag.
//! Fixed-width domains (`Int`, `Duration`, `Time`, `Real`, `Decimal`) allow
//! per-row get/set; variable-width domains (`String`, `Json`) are built by
//! appending rows in order and are reused via [`Column::reset`].

use std::fmt;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array,
    DurationMicrosecondArray, DurationNanosecondArray, Float32Array, Float64Array, Int16Array,
    Int32Array, Int64Array, Int8Array, LargeBinaryArray, LargeStringArray, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use rust_decimal::Decimal;

use crate::error::{Result, VexprError};
use crate::kernels::nulls::merge_nulls;
use crate::types::{EvalType, Value};

use super::batch::SelectionVector;

const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Backing storage, one variant per storage class.
#[derive(Debug, Clone, PartialEq)]
enum Storage {
    /// `Int` (signed or unsigned bit pattern), `Duration`, `Time`.
    Fixed64(Vec<i64>),
    Real(Vec<f64>),
    Decimal(Vec<Decimal>),
    /// `String`, `Json`: row `i` spans `ends[i - 1]..ends[i]` of `bytes`.
    Bytes { ends: Vec<usize>, bytes: Vec<u8> },
}

impl Storage {
    fn for_type(eval_type: EvalType, capacity: usize) -> Self {
        match eval_type {
            EvalType::Int | EvalType::Duration | EvalType::Time => {
                Storage::Fixed64(Vec::with_capacity(capacity))
            }
            EvalType::Real => Storage::Real(Vec::with_capacity(capacity)),
            EvalType::Decimal => Storage::Decimal(Vec::with_capacity(capacity)),
            EvalType::String | EvalType::Json => Storage::Bytes {
                ends: Vec::with_capacity(capacity),
                bytes: Vec::new(),
            },
        }
    }
}

/// Typed column with a null flag per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    eval_type: EvalType,
    storage: Storage,
    nulls: Vec<bool>,
}

/// Native slot type of a fixed-width column.
///
/// Implemented for `i64` (`Int`, `Duration`, `Time`), `f64` (`Real`) and
/// [`Decimal`].
pub trait FixedNative: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Name used in contract-violation messages.
    const NAME: &'static str;

    #[doc(hidden)]
    fn slots(column: &Column) -> &[Self];

    #[doc(hidden)]
    fn slots_and_nulls_mut(column: &mut Column) -> (&mut [Self], &mut [bool]);

    #[doc(hidden)]
    fn push_slot(column: &mut Column, value: Self);
}

macro_rules! impl_fixed_native {
    ($native:ty, $variant:ident, $name:literal) => {
        impl FixedNative for $native {
            const NAME: &'static str = $name;

            fn slots(column: &Column) -> &[Self] {
                match &column.storage {
                    Storage::$variant(values) => values.as_slice(),
                    _ => storage_mismatch(column.eval_type, Self::NAME),
                }
            }

            fn slots_and_nulls_mut(column: &mut Column) -> (&mut [Self], &mut [bool]) {
                let Column {
                    eval_type,
                    storage,
                    nulls,
                } = column;
                match storage {
                    Storage::$variant(values) => (values.as_mut_slice(), nulls.as_mut_slice()),
                    _ => storage_mismatch(*eval_type, Self::NAME),
                }
            }

            fn push_slot(column: &mut Column, value: Self) {
                match &mut column.storage {
                    Storage::$variant(values) => values.push(value),
                    _ => storage_mismatch(column.eval_type, Self::NAME),
                }
            }
        }
    };
}

impl_fixed_native!(i64, Fixed64, "i64");
impl_fixed_native!(f64, Real, "f64");
impl_fixed_native!(Decimal, Decimal, "decimal");

#[cold]
fn storage_mismatch(eval_type: EvalType, wanted: &str) -> ! {
    panic!("{eval_type} column has no {wanted} storage")
}

impl Column {
    /// Creates an empty column with room for `capacity` rows.
    #[must_use]
    pub fn new(eval_type: EvalType, capacity: usize) -> Self {
        Column {
            eval_type,
            storage: Storage::for_type(eval_type, capacity),
            nulls: Vec::with_capacity(capacity),
        }
    }

    /// Creates an empty column, reporting allocation failure instead of aborting.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailed` if the buffers cannot be reserved.
    pub fn try_with_capacity(eval_type: EvalType, capacity: usize) -> Result<Self> {
        let mut column = Column::new(eval_type, 0);
        column.reserve(capacity)?;
        Ok(column)
    }

    /// Builds a column from row values.
    ///
    /// # Errors
    ///
    /// Returns a type error if a non-null value belongs to another domain.
    pub fn from_values(eval_type: EvalType, values: &[Value]) -> Result<Self> {
        let mut column = Column::try_with_capacity(eval_type, values.len())?;
        for value in values {
            column.append_value(value)?;
        }
        Ok(column)
    }

    /// Returns the element domain.
    #[must_use]
    pub fn eval_type(&self) -> EvalType {
        self.eval_type
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nulls.len()
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nulls.is_empty()
    }

    /// Returns how many rows fit without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        let slots = match &self.storage {
            Storage::Fixed64(v) => v.capacity(),
            Storage::Real(v) => v.capacity(),
            Storage::Decimal(v) => v.capacity(),
            Storage::Bytes { ends, .. } => ends.capacity(),
        };
        slots.min(self.nulls.capacity())
    }

    /// Ensures capacity for at least `rows` rows.
    ///
    /// # Errors
    ///
    /// Returns `AllocationFailed` if the allocator refuses the request.
    pub fn reserve(&mut self, rows: usize) -> Result<()> {
        let eval_type = self.eval_type;
        let fail = |e: std::collections::TryReserveError| {
            VexprError::AllocationFailed(format!("cannot reserve {rows} {eval_type} rows: {e}"))
        };
        let additional = rows.saturating_sub(self.nulls.len());
        self.nulls.try_reserve(additional).map_err(fail)?;
        match &mut self.storage {
            Storage::Fixed64(v) => v.try_reserve(rows.saturating_sub(v.len())).map_err(fail),
            Storage::Real(v) => v.try_reserve(rows.saturating_sub(v.len())).map_err(fail),
            Storage::Decimal(v) => v.try_reserve(rows.saturating_sub(v.len())).map_err(fail),
            Storage::Bytes { ends, .. } => {
                ends.try_reserve(rows.saturating_sub(ends.len())).map_err(fail)
            }
        }
    }

    /// Sets the row count to `n`, marking every row non-null.
    ///
    /// Stored values of the first rows survive; callers overwrite every slot
    /// they read. A variable-width column becomes `n` empty strings.
    pub fn resize(&mut self, n: usize) {
        match &mut self.storage {
            Storage::Fixed64(v) => v.resize(n, 0),
            Storage::Real(v) => v.resize(n, 0.0),
            Storage::Decimal(v) => v.resize(n, Decimal::ZERO),
            Storage::Bytes { ends, bytes } => {
                bytes.clear();
                ends.clear();
                ends.resize(n, 0);
            }
        }
        self.nulls.clear();
        self.nulls.resize(n, false);
    }

    /// Drops all rows, keeping capacity.
    pub fn reset(&mut self) {
        match &mut self.storage {
            Storage::Fixed64(v) => v.clear(),
            Storage::Real(v) => v.clear(),
            Storage::Decimal(v) => v.clear(),
            Storage::Bytes { ends, bytes } => {
                ends.clear();
                bytes.clear();
            }
        }
        self.nulls.clear();
    }

    // ==================== Fixed-width access ====================

    /// Returns the slots of a fixed-width column.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the native type of this column's domain.
    #[must_use]
    pub fn values<T: FixedNative>(&self) -> &[T] {
        T::slots(self)
    }

    /// Returns the mutable slots of a fixed-width column.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the native type of this column's domain.
    pub fn values_mut<T: FixedNative>(&mut self) -> &mut [T] {
        T::slots_and_nulls_mut(self).0
    }

    /// Returns the mutable slots together with the null flags.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the native type of this column's domain.
    pub fn values_and_nulls_mut<T: FixedNative>(&mut self) -> (&mut [T], &mut [bool]) {
        T::slots_and_nulls_mut(self)
    }

    /// Integer slots (`Int`, `Duration`, `Time`).
    #[must_use]
    pub fn i64s(&self) -> &[i64] {
        self.values()
    }

    /// Mutable integer slots.
    pub fn i64s_mut(&mut self) -> &mut [i64] {
        self.values_mut()
    }

    /// Real slots.
    #[must_use]
    pub fn f64s(&self) -> &[f64] {
        self.values()
    }

    /// Mutable real slots.
    pub fn f64s_mut(&mut self) -> &mut [f64] {
        self.values_mut()
    }

    /// Decimal slots.
    #[must_use]
    pub fn decimals(&self) -> &[Decimal] {
        self.values()
    }

    /// Mutable decimal slots.
    pub fn decimals_mut(&mut self) -> &mut [Decimal] {
        self.values_mut()
    }

    #[must_use]
    pub fn get_i64(&self, row: usize) -> i64 {
        self.i64s()[row]
    }

    /// Reads an `Int` slot as unsigned.
    #[must_use]
    pub fn get_u64(&self, row: usize) -> u64 {
        self.i64s()[row] as u64
    }

    #[must_use]
    pub fn get_f64(&self, row: usize) -> f64 {
        self.f64s()[row]
    }

    #[must_use]
    pub fn get_decimal(&self, row: usize) -> Decimal {
        self.decimals()[row]
    }

    /// Appends a non-null fixed-width value.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not the native type of this column's domain.
    pub fn append<T: FixedNative>(&mut self, value: T) {
        T::push_slot(self, value);
        self.nulls.push(false);
    }

    pub fn append_i64(&mut self, value: i64) {
        self.append(value);
    }

    pub fn append_f64(&mut self, value: f64) {
        self.append(value);
    }

    pub fn append_decimal(&mut self, value: Decimal) {
        self.append(value);
    }

    // ==================== Variable-width access ====================

    /// Returns the bytes stored at `row` of a variable-width column.
    ///
    /// # Panics
    ///
    /// Panics if this column is fixed-width.
    #[must_use]
    pub fn get_bytes(&self, row: usize) -> &[u8] {
        match &self.storage {
            Storage::Bytes { ends, bytes } => {
                let start = if row == 0 { 0 } else { ends[row - 1] };
                &bytes[start..ends[row]]
            }
            _ => storage_mismatch(self.eval_type, "byte"),
        }
    }

    /// Returns the string at `row`, or None if it is not valid UTF-8.
    #[must_use]
    pub fn get_str(&self, row: usize) -> Option<&str> {
        std::str::from_utf8(self.get_bytes(row)).ok()
    }

    /// Appends a non-null byte string.
    ///
    /// # Panics
    ///
    /// Panics if this column is fixed-width.
    pub fn append_bytes(&mut self, value: &[u8]) {
        match &mut self.storage {
            Storage::Bytes { ends, bytes } => {
                bytes.extend_from_slice(value);
                ends.push(bytes.len());
            }
            _ => storage_mismatch(self.eval_type, "byte"),
        }
        self.nulls.push(false);
    }

    // ==================== Nulls ====================

    /// Appends a NULL row to a column of any domain.
    pub fn append_null(&mut self) {
        match &mut self.storage {
            Storage::Fixed64(v) => v.push(0),
            Storage::Real(v) => v.push(0.0),
            Storage::Decimal(v) => v.push(Decimal::ZERO),
            Storage::Bytes { ends, bytes } => ends.push(bytes.len()),
        }
        self.nulls.push(true);
    }

    #[must_use]
    pub fn is_null(&self, row: usize) -> bool {
        self.nulls[row]
    }

    pub fn set_null(&mut self, row: usize, null: bool) {
        self.nulls[row] = null;
    }

    /// Null flags, one per row.
    #[must_use]
    pub fn nulls(&self) -> &[bool] {
        &self.nulls
    }

    /// Mutable null flags.
    pub fn nulls_mut(&mut self) -> &mut [bool] {
        &mut self.nulls
    }

    #[must_use]
    pub fn null_count(&self) -> usize {
        self.nulls.iter().filter(|&&null| null).count()
    }

    /// OR-combines the null flags of `sources` into this column.
    ///
    /// # Panics
    ///
    /// Panics if a source's row count differs from this column's.
    pub fn merge_nulls(&mut self, sources: &[&Column]) {
        for source in sources {
            merge_nulls(&mut self.nulls, source.nulls());
        }
    }

    // ==================== Whole-column operations ====================

    /// Deep-copies this column into `dst`, reusing `dst`'s allocations.
    pub fn copy_into(&self, dst: &mut Column) {
        dst.eval_type = self.eval_type;
        match (&mut dst.storage, &self.storage) {
            (Storage::Fixed64(d), Storage::Fixed64(s)) => d.clone_from(s),
            (Storage::Real(d), Storage::Real(s)) => d.clone_from(s),
            (Storage::Decimal(d), Storage::Decimal(s)) => d.clone_from(s),
            (
                Storage::Bytes { ends: de, bytes: db },
                Storage::Bytes { ends: se, bytes: sb },
            ) => {
                de.clone_from(se);
                db.clone_from(sb);
            }
            (d, s) => *d = s.clone(),
        }
        dst.nulls.clone_from(&self.nulls);
    }

    /// Returns the value at `row` as a row-level [`Value`].
    #[must_use]
    pub fn value(&self, row: usize) -> Value {
        if self.is_null(row) {
            return Value::Null;
        }
        match self.eval_type {
            EvalType::Int => Value::Int(self.get_i64(row)),
            EvalType::Duration => Value::Duration(self.get_i64(row)),
            EvalType::Time => Value::Time(self.get_i64(row)),
            EvalType::Real => Value::Real(self.get_f64(row)),
            EvalType::Decimal => Value::Decimal(self.get_decimal(row)),
            EvalType::String => Value::String(self.get_bytes(row).to_vec()),
            EvalType::Json => {
                Value::Json(String::from_utf8_lossy(self.get_bytes(row)).into_owned())
            }
        }
    }

    /// Appends a row-level value; `Value::Null` appends a NULL row.
    ///
    /// # Errors
    ///
    /// Returns a type error if the value belongs to another domain.
    pub fn append_value(&mut self, value: &Value) -> Result<()> {
        match (self.eval_type, value) {
            (_, Value::Null) => self.append_null(),
            (EvalType::Int, Value::Int(v))
            | (EvalType::Duration, Value::Duration(v))
            | (EvalType::Time, Value::Time(v)) => self.append_i64(*v),
            (EvalType::Real, Value::Real(v)) => self.append_f64(*v),
            (EvalType::Decimal, Value::Decimal(v)) => self.append_decimal(*v),
            (EvalType::String, Value::String(v)) => self.append_bytes(v),
            (EvalType::Json, Value::Json(v)) => self.append_bytes(v.as_bytes()),
            (eval_type, other) => {
                return Err(VexprError::TypeError {
                    expected: eval_type.name().into(),
                    actual: other.eval_type().map_or("NULL", |t| t.name()).into(),
                })
            }
        }
        Ok(())
    }

    // ==================== Arrow interop ====================

    /// Builds a column of `eval_type` from an Arrow array.
    ///
    /// # Errors
    ///
    /// Returns a type error if the Arrow type cannot be read as `eval_type`.
    pub fn from_array(array: &dyn Array, eval_type: EvalType) -> Result<Self> {
        let mut column = Column::new(eval_type, array.len());
        column.fill_from_array(array, None)?;
        Ok(column)
    }

    /// Overwrites this column with the rows of `array`, restricted to
    /// `selection` when given.
    ///
    /// # Errors
    ///
    /// Returns a type error if the Arrow type cannot be read as this column's
    /// domain, or `AllocationFailed` if the rows cannot be reserved.
    pub fn fill_from_array(
        &mut self,
        array: &dyn Array,
        selection: Option<&SelectionVector>,
    ) -> Result<()> {
        let rows = selection.map_or(array.len(), SelectionVector::len);
        self.reset();
        self.reserve(rows)?;

        let sel = selection;
        match (self.eval_type, array.data_type()) {
            (EvalType::Int, ArrowDataType::Int64) => {
                self.fill_with::<Int64Array, _>(array, sel, |c, a, r| c.append_i64(a.value(r)))?;
            }
            (EvalType::Int, ArrowDataType::Int32) => {
                self.fill_with::<Int32Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::Int16) => {
                self.fill_with::<Int16Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::Int8) => {
                self.fill_with::<Int8Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::UInt64) => {
                self.fill_with::<UInt64Array, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r) as i64);
                })?;
            }
            (EvalType::Int, ArrowDataType::UInt32) => {
                self.fill_with::<UInt32Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::UInt16) => {
                self.fill_with::<UInt16Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::UInt8) => {
                self.fill_with::<UInt8Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Int, ArrowDataType::Boolean) => {
                self.fill_with::<BooleanArray, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)));
                })?;
            }
            (EvalType::Real, ArrowDataType::Float64) => {
                self.fill_with::<Float64Array, _>(array, sel, |c, a, r| c.append_f64(a.value(r)))?;
            }
            (EvalType::Real, ArrowDataType::Float32) => {
                self.fill_with::<Float32Array, _>(array, sel, |c, a, r| {
                    c.append_f64(f64::from(a.value(r)));
                })?;
            }
            (EvalType::Decimal, ArrowDataType::Decimal128(_, scale)) => {
                let scale = u32::try_from(*scale).map_err(|_| {
                    VexprError::UnsupportedOperation(format!("negative decimal scale {scale}"))
                })?;
                let typed = downcast::<Decimal128Array>(array)?;
                for row in physical_rows(array.len(), selection) {
                    if typed.is_null(row) {
                        self.append_null();
                    } else {
                        let value = Decimal::try_from_i128_with_scale(typed.value(row), scale)
                            .map_err(|e| VexprError::EvaluationError(e.to_string()))?;
                        self.append_decimal(value);
                    }
                }
            }
            (EvalType::String | EvalType::Json, ArrowDataType::Utf8) => {
                self.fill_with::<StringArray, _>(array, sel, |c, a, r| {
                    c.append_bytes(a.value(r).as_bytes());
                })?;
            }
            (EvalType::String | EvalType::Json, ArrowDataType::LargeUtf8) => {
                self.fill_with::<LargeStringArray, _>(array, sel, |c, a, r| {
                    c.append_bytes(a.value(r).as_bytes());
                })?;
            }
            (EvalType::String, ArrowDataType::Binary) => {
                self.fill_with::<BinaryArray, _>(array, sel, |c, a, r| c.append_bytes(a.value(r)))?;
            }
            (EvalType::String, ArrowDataType::LargeBinary) => {
                self.fill_with::<LargeBinaryArray, _>(array, sel, |c, a, r| {
                    c.append_bytes(a.value(r));
                })?;
            }
            (EvalType::Duration, ArrowDataType::Duration(TimeUnit::Nanosecond)) => {
                self.fill_with::<DurationNanosecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r));
                })?;
            }
            (EvalType::Duration, ArrowDataType::Duration(TimeUnit::Microsecond)) => {
                self.fill_with::<DurationMicrosecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r).saturating_mul(1_000));
                })?;
            }
            (EvalType::Time, ArrowDataType::Timestamp(TimeUnit::Microsecond, _)) => {
                self.fill_with::<TimestampMicrosecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r));
                })?;
            }
            (EvalType::Time, ArrowDataType::Timestamp(TimeUnit::Nanosecond, _)) => {
                self.fill_with::<TimestampNanosecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r).div_euclid(1_000));
                })?;
            }
            (EvalType::Time, ArrowDataType::Timestamp(TimeUnit::Millisecond, _)) => {
                self.fill_with::<TimestampMillisecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r).saturating_mul(1_000));
                })?;
            }
            (EvalType::Time, ArrowDataType::Timestamp(TimeUnit::Second, _)) => {
                self.fill_with::<TimestampSecondArray, _>(array, sel, |c, a, r| {
                    c.append_i64(a.value(r).saturating_mul(1_000_000));
                })?;
            }
            (EvalType::Time, ArrowDataType::Date32) => {
                self.fill_with::<Date32Array, _>(array, sel, |c, a, r| {
                    c.append_i64(i64::from(a.value(r)) * MICROS_PER_DAY);
                })?;
            }
            (eval_type, data_type) => {
                return Err(VexprError::TypeError {
                    expected: eval_type.name().into(),
                    actual: format!("{data_type:?}"),
                })
            }
        }
        Ok(())
    }

    /// Appends every selected row of `array`, converting non-null rows with `push`.
    fn fill_with<A, F>(
        &mut self,
        array: &dyn Array,
        selection: Option<&SelectionVector>,
        mut push: F,
    ) -> Result<()>
    where
        A: Array + 'static,
        F: FnMut(&mut Column, &A, usize),
    {
        let typed = downcast::<A>(array)?;
        for row in physical_rows(array.len(), selection) {
            if typed.is_null(row) {
                self.append_null();
            } else {
                push(self, typed, row);
            }
        }
        Ok(())
    }

    /// Exports this column as an Arrow array.
    ///
    /// `Int` columns export as `UInt64` when `unsigned` is set. Decimals are
    /// rescaled to the largest scale present. `String` columns export as
    /// `Utf8` when every row is valid UTF-8 and as `Binary` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a decimal cannot be represented at the common
    /// scale or a JSON row is not valid UTF-8.
    pub fn to_array(&self, unsigned: bool) -> Result<ArrayRef> {
        let rows = 0..self.len();
        let array: ArrayRef = match self.eval_type {
            EvalType::Int if unsigned => Arc::new(
                rows.map(|r| (!self.is_null(r)).then(|| self.get_u64(r)))
                    .collect::<UInt64Array>(),
            ),
            EvalType::Int => Arc::new(
                rows.map(|r| (!self.is_null(r)).then(|| self.get_i64(r)))
                    .collect::<Int64Array>(),
            ),
            EvalType::Duration => Arc::new(
                rows.map(|r| (!self.is_null(r)).then(|| self.get_i64(r)))
                    .collect::<DurationNanosecondArray>(),
            ),
            EvalType::Time => Arc::new(
                rows.map(|r| (!self.is_null(r)).then(|| self.get_i64(r)))
                    .collect::<TimestampMicrosecondArray>(),
            ),
            EvalType::Real => Arc::new(
                rows.map(|r| (!self.is_null(r)).then(|| self.get_f64(r)))
                    .collect::<Float64Array>(),
            ),
            EvalType::Decimal => Arc::new(self.decimals_to_array()?),
            EvalType::String => {
                let all_utf8 = rows
                    .clone()
                    .all(|r| self.is_null(r) || self.get_str(r).is_some());
                if all_utf8 {
                    Arc::new(
                        rows.map(|r| (!self.is_null(r)).then(|| self.get_str(r)).flatten())
                            .collect::<StringArray>(),
                    )
                } else {
                    Arc::new(
                        rows.map(|r| (!self.is_null(r)).then(|| self.get_bytes(r)))
                            .collect::<BinaryArray>(),
                    )
                }
            }
            EvalType::Json => {
                let mut values = Vec::with_capacity(self.len());
                for r in rows {
                    if self.is_null(r) {
                        values.push(None);
                    } else {
                        let text = self.get_str(r).ok_or_else(|| {
                            VexprError::EvaluationError(format!("invalid UTF-8 in JSON row {r}"))
                        })?;
                        values.push(Some(text));
                    }
                }
                Arc::new(StringArray::from(values))
            }
        };
        Ok(array)
    }

    fn decimals_to_array(&self) -> Result<Decimal128Array> {
        let scale = (0..self.len())
            .filter(|&r| !self.is_null(r))
            .map(|r| self.get_decimal(r).scale())
            .max()
            .unwrap_or(0);
        let mut mantissas = Vec::with_capacity(self.len());
        for r in 0..self.len() {
            if self.is_null(r) {
                mantissas.push(None);
                continue;
            }
            let mut value = self.get_decimal(r);
            value.rescale(scale);
            if value.scale() != scale {
                return Err(VexprError::EvaluationError(format!(
                    "decimal {} does not fit scale {scale}",
                    self.get_decimal(r)
                )));
            }
            mantissas.push(Some(value.mantissa()));
        }
        Ok(Decimal128Array::from(mantissas).with_precision_and_scale(38, scale as i8)?)
    }
}

fn downcast<A: Array + 'static>(array: &dyn Array) -> Result<&A> {
    array.as_any().downcast_ref::<A>().ok_or_else(|| VexprError::TypeError {
        expected: std::any::type_name::<A>().into(),
        actual: format!("{:?}", array.data_type()),
    })
}

fn physical_rows(
    len: usize,
    selection: Option<&SelectionVector>,
) -> impl Iterator<Item = usize> + '_ {
    let selected = selection.map(|s| s.indices.iter().map(|&i| i as usize));
    let all = selection.is_none().then_some(0..len);
    selected.into_iter().flatten().chain(all.into_iter().flatten())
}
