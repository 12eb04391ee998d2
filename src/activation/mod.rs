//! Nine activation functions, each paired with its analytic derivative and a
//! per-call scratch buffer.
//!
//! Grounded on `leaf::layers::activation::{relu, sigmoid, tanh}` — one
//! module per kind, each owning its own forward/backward math — but
//! generalized from `leaf`'s generic-backend `ComputeOutput`/
//! `ComputeInputGradient` traits (which exist to dispatch to a GPU kernel)
//! down to plain `&mut [f32]` kernels, since this engine has no backend
//! abstraction to dispatch through. Per the "eager, not lazy" redesign
//! note, the derivative-scratch buffer is allocated at [`Activation::new`]
//! rather than on first forward.

mod elu;
mod hard_sigmoid;
mod leaky_relu;
mod linear;
mod sigmoid;
mod softmax;
mod softsign;
mod swish;
mod tanh;

use crate::bitmask::BitMask;
use crate::error::PetalError;

/// Which activation an [`Activation`] applies, plus its per-kind scalars.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivationKind {
    /// `f(x) = alpha*x + c`.
    Linear { alpha: f32, c: f32 },
    /// `f(x) = x` if `x >= 0` else `leak*x`.
    LeakyRelu { leak: f32 },
    /// `f(x) = x` if `x >= 0` else `alpha*(e^x - 1)`.
    Elu { alpha: f32 },
    /// `f(x) = x / (|x| + 1)`.
    Softsign,
    /// `f(x) = 1 / (1 + e^-x)`.
    Sigmoid,
    /// Piecewise-linear sigmoid approximation.
    HardSigmoid,
    /// `f(x) = beta*x*sigmoid(x)` (Swish when `beta = 1`, E-Swish otherwise).
    Swish { beta: f32 },
    /// `f(x)_i = e^(x_i) / sum_j e^(x_j)`, max-subtracted for stability.
    /// Its backward produces a full Jacobian rather than an elementwise
    /// derivative — see [`Activation::jacobian`].
    Softmax,
    /// `f(x) = tanh(x)`.
    Tanh,
}

/// A tagged activation plus its lazily-sized, eagerly-allocated
/// derivative-scratch buffer.
#[derive(Debug, Clone)]
pub struct Activation {
    kind: ActivationKind,
    /// `output_len` elements for every kind except Softmax, which needs
    /// `output_len^2` to hold its Jacobian.
    scratch: Vec<f32>,
    has_forward: bool,
}

impl Activation {
    /// Build an activation for an output buffer of `output_len` elements,
    /// eagerly allocating its scratch buffer.
    pub fn new(kind: ActivationKind, output_len: usize) -> Activation {
        let scratch_len = match kind {
            ActivationKind::Softmax => output_len * output_len,
            _ => output_len,
        };
        Activation { kind, scratch: vec![0.0; scratch_len], has_forward: false }
    }

    /// Which kind this activation applies.
    pub fn kind(&self) -> ActivationKind {
        self.kind
    }

    /// Apply this activation to `buf` in place. Indices whose `mask` bit is
    /// set are skipped (left at whatever the layer forward kernel already
    /// wrote, typically `0`), matching dropout's "don't even activate a
    /// dropped output" rule.
    pub fn forward(&mut self, buf: &mut [f32], mask: Option<&BitMask>) -> Result<(), PetalError> {
        let dropped = |i: usize| mask.map(|m| m.get_unchecked(i)).unwrap_or(false);

        match self.kind {
            ActivationKind::Linear { alpha, c } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = linear::forward(*x, alpha, c);
                }
            }
            ActivationKind::LeakyRelu { leak } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    self.scratch[i] = *x;
                    *x = leaky_relu::forward(*x, leak);
                }
            }
            ActivationKind::Elu { alpha } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    self.scratch[i] = *x;
                    *x = elu::forward(*x, alpha);
                }
            }
            ActivationKind::Softsign => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    let (f, saved) = softsign::forward(*x);
                    self.scratch[i] = saved;
                    *x = f;
                }
            }
            ActivationKind::Sigmoid => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = sigmoid::forward(*x);
                }
            }
            ActivationKind::HardSigmoid => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    self.scratch[i] = *x;
                    *x = hard_sigmoid::forward(*x);
                }
            }
            ActivationKind::Swish { beta } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    let (f, saved) = swish::forward(*x, beta);
                    self.scratch[i] = saved;
                    *x = f;
                }
            }
            ActivationKind::Softmax => {
                softmax::forward(buf);
            }
            ActivationKind::Tanh => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = tanh::forward(*x);
                }
            }
        }

        self.has_forward = true;
        Ok(())
    }

    /// Replace the post-activation values in `buf` with `d output / d
    /// pre-activation`, using only the scratch state saved on the most
    /// recent `forward` call. For [`ActivationKind::Softmax`] this instead
    /// writes the full Jacobian into the internal scratch buffer, leaving
    /// `buf` holding the raw softmax probabilities — see
    /// [`Activation::jacobian`].
    pub fn backward(&mut self, buf: &mut [f32], mask: Option<&BitMask>) -> Result<(), PetalError> {
        if !self.has_forward {
            return Err(PetalError::ActivationNoTemp);
        }
        let dropped = |i: usize| mask.map(|m| m.get_unchecked(i)).unwrap_or(false);

        match self.kind {
            ActivationKind::Linear { alpha, .. } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = linear::backward(alpha);
                }
            }
            ActivationKind::LeakyRelu { leak } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = leaky_relu::backward(self.scratch[i], leak);
                }
            }
            ActivationKind::Elu { alpha } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = elu::backward(self.scratch[i], *x, alpha);
                }
            }
            ActivationKind::Softsign => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = softsign::backward(self.scratch[i]);
                }
            }
            ActivationKind::Sigmoid => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = sigmoid::backward(*x);
                }
            }
            ActivationKind::HardSigmoid => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = hard_sigmoid::backward(self.scratch[i]);
                }
            }
            ActivationKind::Swish { beta } => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = swish::backward(*x, self.scratch[i], beta);
                }
            }
            ActivationKind::Softmax => {
                let len = buf.len();
                softmax::backward(buf, &mut self.scratch[..len * len]);
            }
            ActivationKind::Tanh => {
                for (i, x) in buf.iter_mut().enumerate() {
                    if dropped(i) {
                        continue;
                    }
                    *x = tanh::backward(*x);
                }
            }
        }
        Ok(())
    }

    /// The `len x len` Jacobian computed by the most recent
    /// [`Activation::backward`] call, flattened row-major. Only meaningful
    /// for [`ActivationKind::Softmax`]; `None` for every other kind.
    pub fn jacobian(&self, len: usize) -> Option<&[f32]> {
        match self.kind {
            ActivationKind::Softmax => Some(&self.scratch[..len * len]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod activation_spec {
    use super::*;

    fn numerical_derivative(kind: ActivationKind, x: f32) -> f32 {
        let h = 1e-3;
        let f = |v: f32| {
            let mut buf = [v];
            let mut a = Activation::new(kind, 1);
            a.forward(&mut buf, None).unwrap();
            buf[0]
        };
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    fn assert_matches_numerical(kind: ActivationKind) {
        for &x in &[-2.0f32, -1.0, 0.0, 1.0, 2.0] {
            let mut a = Activation::new(kind, 1);
            let mut buf = [x];
            a.forward(&mut buf, None).unwrap();
            a.backward(&mut buf, None).unwrap();
            let analytic = buf[0];
            let numeric = numerical_derivative(kind, x);
            assert!(
                (analytic - numeric).abs() < 0.02,
                "{kind:?} at x={x}: analytic={analytic} numeric={numeric}"
            );
        }
    }

    #[test]
    fn linear_round_trip() {
        let mut a = Activation::new(ActivationKind::Linear { alpha: 0.5, c: 1.0 }, 5);
        let mut buf = [-2.0f32, -1.0, 0.0, 1.0, 2.0];
        a.forward(&mut buf, None).unwrap();
        assert_eq!(buf, [0.0, 0.5, 1.0, 1.5, 2.0]);
        a.backward(&mut buf, None).unwrap();
        assert_eq!(buf, [0.5; 5]);
    }

    #[test]
    fn leaky_relu_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::LeakyRelu { leak: 0.1 });
    }

    #[test]
    fn elu_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::Elu { alpha: 1.0 });
    }

    #[test]
    fn softsign_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::Softsign);
    }

    #[test]
    fn sigmoid_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::Sigmoid);
    }

    #[test]
    fn swish_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::Swish { beta: 1.0 });
    }

    #[test]
    fn tanh_matches_numerical_derivative() {
        assert_matches_numerical(ActivationKind::Tanh);
    }

    #[test]
    fn hard_sigmoid_middle_band_derivative_is_point_two() {
        let mut a = Activation::new(ActivationKind::HardSigmoid, 1);
        let mut buf = [0.0f32];
        a.forward(&mut buf, None).unwrap();
        a.backward(&mut buf, None).unwrap();
        assert!((buf[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn hard_sigmoid_outside_band_derivative_is_zero() {
        let mut a = Activation::new(ActivationKind::HardSigmoid, 1);
        let mut buf = [10.0f32];
        a.forward(&mut buf, None).unwrap();
        a.backward(&mut buf, None).unwrap();
        assert_eq!(buf[0], 0.0);
    }

    #[test]
    fn softmax_forward_sums_to_one_and_stays_in_unit_interval() {
        let mut a = Activation::new(ActivationKind::Softmax, 5);
        let mut buf = [-2.0f32, -1.0, 0.0, 1.0, 2.0];
        a.forward(&mut buf, None).unwrap();
        let sum: f32 = buf.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for &p in &buf {
            assert!(p > 0.0 && p < 1.0);
        }
        let expected = [0.0117f32, 0.0317, 0.0861, 0.2341, 0.6364];
        for (got, want) in buf.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3, "{got} vs {want}");
        }
    }

    #[test]
    fn softmax_jacobian_matches_reference_formula() {
        let mut a = Activation::new(ActivationKind::Softmax, 3);
        let mut buf = [0.1f32, 0.2, 0.7];
        a.forward(&mut buf, None).unwrap();
        let f = buf;
        a.backward(&mut buf, None).unwrap();
        let j = a.jacobian(3).unwrap();
        for i in 0..3 {
            for k in 0..3 {
                let expected = if i == k { f[i] * (1.0 - f[k]) } else { -f[i] * f[k] };
                let got = j[i * 3 + k];
                assert!((got - expected).abs() < 1e-5, "J[{i},{k}] = {got} vs {expected}");
            }
        }
    }

    #[test]
    fn backward_before_forward_is_reported() {
        let mut a = Activation::new(ActivationKind::Sigmoid, 2);
        let mut buf = [0.0f32, 0.0];
        assert_eq!(a.backward(&mut buf, None).unwrap_err(), PetalError::ActivationNoTemp);
    }

    #[test]
    fn dropped_indices_are_skipped_on_forward() {
        let mut mask = BitMask::new(3);
        mask.set(1);
        let mut a = Activation::new(ActivationKind::Sigmoid, 3);
        let mut buf = [1.0f32, 1.0, 1.0];
        a.forward(&mut buf, Some(&mask)).unwrap();
        assert_eq!(buf[1], 1.0);
        assert_ne!(buf[0], 1.0);
    }
}
