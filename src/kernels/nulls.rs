//! Null-merge kernel.

/// Sets `dst[i] |= src[i]` for every row.
///
/// OR is commutative and associative, so operands may be merged one at a
/// time as a fold visits them.
///
/// # Panics
///
/// Panics if `dst` and `src` differ in length.
pub fn merge_nulls(dst: &mut [bool], src: &[bool]) {
    assert_eq!(dst.len(), src.len(), "null merge over columns of different length");
    for (d, &s) in dst.iter_mut().zip(src) {
        *d |= s;
    }
}
