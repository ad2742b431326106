use nalgebra::Vector3;

/// Lagrange polynomial through `degree + 1` samples nearest `x`.
///
/// `values` holds x,y,z interleaved (`values.len() == 3 * times.len()`);
/// `times` must be ascending. When fewer samples exist than the degree asks
/// for, every sample is used. Outside the table the polynomial extrapolates.
pub fn interpolate(times: &[f64], values: &[f64], x: f64, degree: usize) -> Vector3<f64> {
    let n = times.len().min(values.len() / 3);
    if n == 0 {
        return Vector3::zeros();
    }
    let width = (degree + 1).min(n);
    let start = window_start(&times[..n], x, width);

    let mut result = Vector3::zeros();
    for i in start..start + width {
        let mut coefficient = 1.0;
        for j in start..start + width {
            if j != i {
                coefficient *= (x - times[j]) / (times[i] - times[j]);
            }
        }
        result += coefficient * Vector3::new(values[3 * i], values[3 * i + 1], values[3 * i + 2]);
    }
    result
}

/// First index of a `width`-sample window centred on `x`.
fn window_start(times: &[f64], x: f64, width: usize) -> usize {
    let n = times.len();
    if width >= n {
        return 0;
    }
    let upper = times.partition_point(|&t| t < x);
    upper.saturating_sub(width / 2).min(n - width)
}
