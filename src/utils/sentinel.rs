use num::Float;

/// The "unknown" feature marker.
/// NaN is never a legal parsed value, so it can't collide with an explicit 0.0.
#[inline(always)]
pub fn unknown<N: Float>() -> N {
    N::nan()
}

#[inline(always)]
pub fn is_unknown<N: Float>(value: N) -> bool {
    value.is_nan()
}

/// Compare two value slices treating the unknown marker as equal to itself.
pub fn same_values<N: Float>(a: &[N], b: &[N]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(&x, &y)| {
            (is_unknown(x) && is_unknown(y)) || x == y
        })
}
