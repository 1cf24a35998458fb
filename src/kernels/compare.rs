//! Comparator and boolean-collapse kernels.
//!
//! A comparator writes, per row, a delta whose sign is the sign of the
//! mathematical difference `lhs - rhs`. A collapse then turns deltas into the
//! 0/1 answer of one relational operator.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::vectorized::Column;

/// Relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<=>`, equality where NULL equals NULL.
    NullEq,
}

impl CompareOp {
    /// Function name used in signature names and errors.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Lt => "lt",
            CompareOp::Le => "le",
            CompareOp::Gt => "gt",
            CompareOp::Ge => "ge",
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::NullEq => "nulleq",
        }
    }

    /// SQL operator symbol.
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::NullEq => "<=>",
        }
    }

    /// Returns whether the operator holds for two non-null operands.
    #[must_use]
    pub fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Lt => ordering.is_lt(),
            CompareOp::Le => ordering.is_le(),
            CompareOp::Gt => ordering.is_gt(),
            CompareOp::Ge => ordering.is_ge(),
            CompareOp::Eq | CompareOp::NullEq => ordering.is_eq(),
            CompareOp::Ne => ordering.is_ne(),
        }
    }
}

#[inline]
fn delta(ordering: Ordering) -> i64 {
    ordering as i64
}

/// Both operands unsigned.
#[inline]
pub fn compare_uu(a: i64, b: i64) -> i64 {
    delta((a as u64).cmp(&(b as u64)))
}

/// Unsigned `a` against signed `b`: a negative `b` is below every unsigned value.
#[inline]
pub fn compare_ui(a: i64, b: i64) -> i64 {
    if b < 0 {
        1
    } else {
        delta((a as u64).cmp(&(b as u64)))
    }
}

/// Signed `a` against unsigned `b`: a negative `a` is below every unsigned value.
#[inline]
pub fn compare_iu(a: i64, b: i64) -> i64 {
    if a < 0 {
        -1
    } else {
        delta((a as u64).cmp(&(b as u64)))
    }
}

/// Both operands signed.
#[inline]
pub fn compare_ii(a: i64, b: i64) -> i64 {
    delta(a.cmp(&b))
}

/// Row-level form of [`compare_ints`].
#[inline]
#[must_use]
pub fn compare_int_pair(lhs_unsigned: bool, rhs_unsigned: bool, a: i64, b: i64) -> i64 {
    match (lhs_unsigned, rhs_unsigned) {
        (true, true) => compare_uu(a, b),
        (true, false) => compare_ui(a, b),
        (false, true) => compare_iu(a, b),
        (false, false) => compare_ii(a, b),
    }
}

#[inline]
fn compare_with<T: Copy>(lhs: &[T], rhs: &[T], out: &mut [i64], cmp: impl Fn(T, T) -> i64) {
    debug_assert!(lhs.len() == out.len() && rhs.len() == out.len());
    for ((o, &a), &b) in out.iter_mut().zip(lhs).zip(rhs) {
        *o = cmp(a, b);
    }
}

/// Integer deltas, dispatching once on the pair of signedness flags.
pub fn compare_ints(
    lhs_unsigned: bool,
    rhs_unsigned: bool,
    lhs: &[i64],
    rhs: &[i64],
    out: &mut [i64],
) {
    match (lhs_unsigned, rhs_unsigned) {
        (true, true) => compare_with(lhs, rhs, out, compare_uu),
        (true, false) => compare_with(lhs, rhs, out, compare_ui),
        (false, true) => compare_with(lhs, rhs, out, compare_iu),
        (false, false) => compare_with(lhs, rhs, out, compare_ii),
    }
}

/// Row-level real comparison. Any pair involving NaN yields 1.
#[inline]
#[must_use]
pub fn compare_real_pair(a: f64, b: f64) -> i64 {
    if a < b {
        -1
    } else if a == b {
        0
    } else {
        1
    }
}

pub fn compare_reals(lhs: &[f64], rhs: &[f64], out: &mut [i64]) {
    compare_with(lhs, rhs, out, compare_real_pair);
}

pub fn compare_decimals(lhs: &[Decimal], rhs: &[Decimal], out: &mut [i64]) {
    compare_with(lhs, rhs, out, |a, b| delta(a.cmp(&b)));
}

/// Byte-wise comparison of two variable-width columns.
pub fn compare_bytes(lhs: &Column, rhs: &Column, out: &mut [i64]) {
    for (row, o) in out.iter_mut().enumerate() {
        *o = delta(lhs.get_bytes(row).cmp(rhs.get_bytes(row)));
    }
}

/// Replaces every delta with 1 if `op` holds for it and 0 otherwise.
///
/// Null flags are left alone; the stored 0/1 of a null row is meaningless.
pub fn collapse(op: CompareOp, deltas: &mut [i64]) {
    match op {
        CompareOp::Lt => collapse_with(deltas, |d| d < 0),
        CompareOp::Le => collapse_with(deltas, |d| d <= 0),
        CompareOp::Gt => collapse_with(deltas, |d| d > 0),
        CompareOp::Ge => collapse_with(deltas, |d| d >= 0),
        CompareOp::Eq | CompareOp::NullEq => collapse_with(deltas, |d| d == 0),
        CompareOp::Ne => collapse_with(deltas, |d| d != 0),
    }
}

#[inline]
fn collapse_with(deltas: &mut [i64], holds: impl Fn(i64) -> bool) {
    for d in deltas {
        *d = i64::from(holds(*d));
    }
}
