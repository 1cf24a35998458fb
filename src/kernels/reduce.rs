//! GREATEST / LEAST reductions.
//!
//! Fixed-width domains fold each operand into the output in place.
//! Variable-width domains cannot overwrite a row in place, so they alternate
//! between the output column and one spare column, rebuilding a whole column
//! per operand.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::vectorized::Column;

/// Which extreme a reduction keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extremum {
    Greatest,
    Least,
}

impl Extremum {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Extremum::Greatest => "greatest",
            Extremum::Least => "least",
        }
    }

    /// Whether a candidate ordered `ordering` against the current value
    /// replaces it. Ties keep the current value.
    #[must_use]
    pub fn prefers(&self, ordering: Ordering) -> bool {
        match self {
            Extremum::Greatest => ordering.is_gt(),
            Extremum::Least => ordering.is_lt(),
        }
    }
}

/// Overwrites `values[i]` with `arg[i]` where `better(arg[i], values[i])`,
/// skipping rows already flagged null.
#[inline]
pub fn fold_fixed<T: Copy>(
    values: &mut [T],
    nulls: &[bool],
    arg: &[T],
    better: impl Fn(T, T) -> bool,
) {
    debug_assert!(values.len() == nulls.len() && values.len() == arg.len());
    for ((current, &null), &candidate) in values.iter_mut().zip(nulls).zip(arg) {
        if !null && better(candidate, *current) {
            *current = candidate;
        }
    }
}

/// Integer fold. `unsigned` applies to the reduction as a whole and is
/// resolved once, outside the row loop.
pub fn fold_ints(kind: Extremum, unsigned: bool, values: &mut [i64], nulls: &[bool], arg: &[i64]) {
    match (kind, unsigned) {
        (Extremum::Greatest, false) => fold_fixed(values, nulls, arg, |c, v| c > v),
        (Extremum::Greatest, true) => {
            fold_fixed(values, nulls, arg, |c, v| (c as u64) > (v as u64));
        }
        (Extremum::Least, false) => fold_fixed(values, nulls, arg, |c, v| c < v),
        (Extremum::Least, true) => {
            fold_fixed(values, nulls, arg, |c, v| (c as u64) < (v as u64));
        }
    }
}

/// Fold over a partially ordered native type (`f64`, `Decimal`).
pub fn fold_ordered<T: Copy + PartialOrd>(
    kind: Extremum,
    values: &mut [T],
    nulls: &[bool],
    arg: &[T],
) {
    match kind {
        Extremum::Greatest => fold_fixed(values, nulls, arg, |c, v| c > v),
        Extremum::Least => fold_fixed(values, nulls, arg, |c, v| c < v),
    }
}

/// Rebuilds `dst` row by row from whichever of `src` and `arg` wins.
///
/// A row is NULL in `dst` if it is NULL in either input. On a tie the
/// bytes of `arg` are taken; they are equal to `src`'s.
pub fn pick_bytes(kind: Extremum, src: &Column, arg: &Column, dst: &mut Column) {
    dst.reset();
    for row in 0..src.len() {
        if src.is_null(row) || arg.is_null(row) {
            dst.append_null();
            continue;
        }
        let (current, candidate) = (src.get_bytes(row), arg.get_bytes(row));
        let keep_current = kind.prefers(current.cmp(candidate));
        dst.append_bytes(if keep_current { current } else { candidate });
    }
}

/// Bookkeeping of one [`fold_strings`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringFold {
    /// Number of pick steps, one per operand after the first.
    pub steps: usize,
    /// Whether the final values sat in the spare column and were copied back.
    pub copied_back: bool,
}

/// Reduces `operands` string operands into `result`.
///
/// On entry `result` holds operand 0. For every further operand `j`,
/// `eval_operand(j, arg)` fills `arg` (reset beforehand) and one pick step
/// runs: even steps read `result` and write `spare`, odd steps read `spare`
/// and write `result`. When the step count is odd the last write went to
/// `spare`, so it is copied back into `result`.
///
/// # Errors
///
/// Propagates the first error returned by `eval_operand`; `result` is then
/// unspecified.
pub fn fold_strings<F>(
    kind: Extremum,
    operands: usize,
    result: &mut Column,
    arg: &mut Column,
    spare: &mut Column,
    mut eval_operand: F,
) -> Result<StringFold>
where
    F: FnMut(usize, &mut Column) -> Result<()>,
{
    let steps = operands.saturating_sub(1);
    for step in 0..steps {
        arg.reset();
        eval_operand(step + 1, arg)?;
        if step % 2 == 0 {
            pick_bytes(kind, result, arg, spare);
        } else {
            pick_bytes(kind, spare, arg, result);
        }
    }

    let copied_back = steps % 2 == 1;
    if copied_back {
        spare.copy_into(result);
    }
    Ok(StringFold { steps, copied_back })
}
