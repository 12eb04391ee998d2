//! `f(x)_i = e^(x_i) / sum_j e^(x_j)`, max-subtracted for numerical
//! stability. Its backward produces the full `L x L` Jacobian `J[i,j] =
//! f[i] * (delta_ij - f[j])` rather than an elementwise derivative, so
//! [`Activation::backward`][super::Activation::backward] routes this kind
//! to [`backward`] below instead of overwriting `buf` in place.

/// Softmax `buf` over its own elements, in place.
pub fn forward(buf: &mut [f32]) {
    let max = buf.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for x in buf.iter_mut() {
        *x = (*x - max).exp();
        sum += *x;
    }
    for x in buf.iter_mut() {
        *x /= sum;
    }
}

/// Write the `len x len` Jacobian of the softmax evaluated at `f` (the
/// post-activation probabilities) into `jacobian`, row-major:
/// `jacobian[i*len + j] = f[i] * (delta_ij - f[j])`.
pub fn backward(f: &[f32], jacobian: &mut [f32]) {
    let len = f.len();
    for i in 0..len {
        for j in 0..len {
            let delta = if i == j { 1.0 } else { 0.0 };
            jacobian[i * len + j] = f[i] * (delta - f[j]);
        }
    }
}
