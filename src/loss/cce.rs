//! `L = -sum(y*ln(y_hat))` — a sum, not a mean, unlike every other kind.

use crate::util::EPS;

fn safe_ln(x: f32) -> f32 {
    x.max(EPS).ln()
}

pub fn forward(y_hat: &[f32], y: &[f32]) -> f32 {
    -y.iter().zip(y_hat).map(|(yi, yhi)| yi * safe_ln(*yhi)).sum::<f32>()
}

/// `-y_i / (y_hat_i + eps)`.
pub fn backward(y_hat: &[f32], y: &[f32], out: &mut [f32]) {
    for ((o, yi), yhi) in out.iter_mut().zip(y).zip(y_hat) {
        *o = -yi / (yhi + EPS);
    }
}
