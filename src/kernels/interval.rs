//! INTERVAL position search.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::compare::{compare_int_pair, compare_real_pair};

/// How boundaries are scanned for one row.
///
/// Both strategies return the same position for sorted boundaries; only
/// `Binary` assumes they are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntervalSearch {
    /// O(log m) boundary evaluations per row.
    #[default]
    Binary,
    /// First boundary greater than the target, O(m) evaluations per row.
    Linear,
}

/// Returns the number of leading boundaries the target is not below.
///
/// `target_lt(idx)` answers whether the target is strictly less than
/// boundary `idx`; a NULL boundary must answer `false`.
///
/// # Errors
///
/// Stops at and returns the first error raised by `target_lt`.
pub fn search<F>(mode: IntervalSearch, boundaries: usize, mut target_lt: F) -> Result<usize>
where
    F: FnMut(usize) -> Result<bool>,
{
    match mode {
        IntervalSearch::Binary => {
            let (mut lo, mut hi) = (0, boundaries);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if target_lt(mid)? {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            Ok(lo)
        }
        IntervalSearch::Linear => {
            for idx in 0..boundaries {
                if target_lt(idx)? {
                    return Ok(idx);
                }
            }
            Ok(boundaries)
        }
    }
}

/// Strict `target < boundary` across signed and unsigned integers.
#[inline]
#[must_use]
pub fn int_target_lt(
    target: i64,
    target_unsigned: bool,
    boundary: i64,
    boundary_unsigned: bool,
) -> bool {
    compare_int_pair(target_unsigned, boundary_unsigned, target, boundary) < 0
}

#[inline]
#[must_use]
pub fn real_target_lt(target: f64, boundary: f64) -> bool {
    compare_real_pair(target, boundary) < 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VexprError;

    fn position(mode: IntervalSearch, target: i64, boundaries: &[Option<i64>]) -> usize {
        search(mode, boundaries.len(), |idx| {
            Ok(boundaries[idx].is_some_and(|b| int_target_lt(target, false, b, false)))
        })
        .unwrap()
    }

    #[test]
    fn test_position_counts_boundaries_not_above_target() {
        let boundaries = [Some(1), Some(3), Some(5), Some(9)];
        for mode in [IntervalSearch::Binary, IntervalSearch::Linear] {
            assert_eq!(position(mode, 0, &boundaries), 0);
            assert_eq!(position(mode, 1, &boundaries), 1);
            assert_eq!(position(mode, 4, &boundaries), 2);
            assert_eq!(position(mode, 5, &boundaries), 3);
            assert_eq!(position(mode, 10, &boundaries), 4);
        }
    }

    #[test]
    fn test_no_boundaries() {
        assert_eq!(position(IntervalSearch::Binary, 3, &[]), 0);
        assert_eq!(position(IntervalSearch::Linear, 3, &[]), 0);
    }

    #[test]
    fn test_null_boundary_is_not_above_target() {
        assert_eq!(position(IntervalSearch::Binary, 4, &[Some(1), None, Some(9)]), 2);
        assert_eq!(position(IntervalSearch::Linear, 4, &[None, None]), 2);
    }

    #[test]
    fn test_binary_probes_logarithmically() {
        let boundaries: Vec<Option<i64>> = (0..1024).map(Some).collect();
        let mut probes = 0;
        search(IntervalSearch::Binary, boundaries.len(), |idx| {
            probes += 1;
            Ok(boundaries[idx].is_some_and(|b| 500 < b))
        })
        .unwrap();
        assert!(probes <= 11, "{probes} probes");
    }

    #[test]
    fn test_int_signedness_matrix() {
        // Signed target, unsigned boundary.
        assert!(int_target_lt(-1, false, 0, true));
        assert!(int_target_lt(3, false, -1, true));
        // Unsigned target, signed boundary.
        assert!(!int_target_lt(0, true, -1, false));
        assert!(!int_target_lt(0, true, 0, false));
        assert!(int_target_lt(2, true, 3, false));
        // Both unsigned.
        assert!(int_target_lt(i64::MAX, true, -1, true));
        // Both signed.
        assert!(!int_target_lt(i64::MAX, false, -1, false));
    }

    #[test]
    fn test_real_target_lt() {
        assert!(real_target_lt(1.5, 2.0));
        assert!(!real_target_lt(2.0, 2.0));
    }

    #[test]
    fn test_search_stops_on_error() {
        let mut probes = 0;
        let err = search(IntervalSearch::Linear, 5, |idx| {
            probes += 1;
            if idx == 1 {
                Err(VexprError::EvaluationError("boundary".into()))
            } else {
                Ok(false)
            }
        })
        .unwrap_err();
        assert!(matches!(err, VexprError::EvaluationError(_)));
        assert_eq!(probes, 2);
    }
}
