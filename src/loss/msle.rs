//! `L = mean((ln(y+1) - ln(y_hat+1))^2)`.

use crate::util::EPS;

fn safe_ln(x: f32) -> f32 {
    x.max(EPS).ln()
}

pub fn forward(y_hat: &[f32], y: &[f32]) -> f32 {
    let len = y.len() as f32;
    y.iter()
        .zip(y_hat)
        .map(|(yi, yhi)| (safe_ln(yi + 1.0) - safe_ln(yhi + 1.0)).powi(2))
        .sum::<f32>()
        / len
}

/// `-2/L * (ln(y_i+1) - ln(y_hat_i+1)) / (y_hat_i+1+eps)`.
pub fn backward(y_hat: &[f32], y: &[f32], out: &mut [f32]) {
    let len = y.len() as f32;
    for ((o, yi), yhi) in out.iter_mut().zip(y).zip(y_hat) {
        let diff = safe_ln(yi + 1.0) - safe_ln(yhi + 1.0);
        *o = -2.0 / len * diff / (yhi + 1.0 + EPS);
    }
}
