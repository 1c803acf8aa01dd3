use num::Num;

/// Dot product of two equal-length slices
#[inline]
pub fn dot<N>(a: &[N], b: &[N]) -> N
where
    N: Num + Copy,
{
    debug_assert_eq!(a.len(), b.len(), "dot product of mismatched lengths");
    a.iter()
        .zip(b.iter())
        .fold(N::zero(), |acc, (&x, &y)| acc + x * y)
}

/// `y += alpha * x`
#[inline]
pub fn axpy<N>(alpha: N, x: &[N], y: &mut [N])
where
    N: Num + Copy,
{
    debug_assert_eq!(x.len(), y.len(), "axpy of mismatched lengths");
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = *yi + alpha * xi;
    }
}

/// Arithmetic mean, 0 for an empty slice
#[inline]
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
