//! Six loss functions, each paired with its analytic derivative with
//! respect to the prediction, plus the two scratch buffers that let
//! `backward` recompute that derivative from nothing but an index and the
//! state `forward` stashed.
//!
//! Grounded on `leaf::solver::confusion_matrix` for the "prediction vs.
//! target vector" shape of the problem, generalized the way
//! [`crate::activation`] generalizes `leaf`'s per-kind layer modules: one
//! file per kind holding plain `forward`/`backward` math, dispatched from
//! a tagged enum here. Per the "eager, not lazy" redesign note, both
//! scratch buffers and the loss buffer are sized at [`Loss::new`].

mod bce;
mod cce;
mod mae;
mod mse;
mod msle;
mod rmsle;

use crate::error::PetalError;

/// Which loss a [`Loss`] computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    /// `mean((y - y_hat)^2)`.
    Mse,
    /// `mean((ln(y+1) - ln(y_hat+1))^2)`.
    Msle,
    /// `sqrt(Msle)`.
    Rmsle,
    /// `mean(|y - y_hat|)`.
    Mae,
    /// `-mean(y*ln(y_hat) + (1-y)*ln(1-y_hat))`.
    Bce,
    /// `-sum(y*ln(y_hat))`.
    Cce,
}

/// A tagged loss, its output buffer, and the snapshots `backward` needs.
///
/// `loss[0]` holds the scalar loss after [`Loss::forward`]; after
/// [`Loss::backward`] every element of `loss` holds `d loss / d y_hat_i`.
/// `y` and `y_hat` are the two scratch buffers the data model calls for —
/// here they hold the forward call's inputs verbatim, since every kind's
/// backward formula is expressible purely in terms of the original `(y,
/// y_hat)` pair (plus, for RMSLE, the scalar forward value snapshotted
/// separately below).
#[derive(Debug, Clone)]
pub struct Loss {
    kind: LossKind,
    loss: Vec<f32>,
    y: Vec<f32>,
    y_hat: Vec<f32>,
    forward_value: f32,
    has_forward: bool,
}

impl Loss {
    /// Build a loss for vectors of `length` elements, eagerly allocating
    /// its output and scratch buffers.
    pub fn new(kind: LossKind, length: usize) -> Loss {
        Loss {
            kind,
            loss: vec![0.0; length],
            y: vec![0.0; length],
            y_hat: vec![0.0; length],
            forward_value: 0.0,
            has_forward: false,
        }
    }

    /// Which kind this loss computes.
    pub fn kind(&self) -> LossKind {
        self.kind
    }

    /// The loss buffer: `loss[0]` holds the scalar loss after `forward`,
    /// every element holds `d loss / d y_hat_i` after `backward`.
    pub fn buffer(&self) -> &[f32] {
        &self.loss
    }

    /// Compute the scalar loss for `(y_hat, y)`, writing it to `loss[0]`
    /// and snapshotting both vectors so `backward` can run without them.
    pub fn forward(&mut self, y_hat: &[f32], y: &[f32]) -> Result<(), PetalError> {
        if y_hat.len() != y.len() || y.len() != self.loss.len() {
            return Err(PetalError::ShapesNotEqual);
        }

        let value = match self.kind {
            LossKind::Mse => mse::forward(y_hat, y),
            LossKind::Msle => msle::forward(y_hat, y),
            LossKind::Rmsle => rmsle::forward(y_hat, y),
            LossKind::Mae => mae::forward(y_hat, y),
            LossKind::Bce => bce::forward(y_hat, y),
            LossKind::Cce => cce::forward(y_hat, y),
        };

        self.y_hat.copy_from_slice(y_hat);
        self.y.copy_from_slice(y);
        self.forward_value = value;
        self.loss[0] = value;
        self.has_forward = true;
        Ok(())
    }

    /// Overwrite the entire loss buffer with `d loss / d y_hat_i`, using
    /// only the `(y, y_hat)` pair snapshotted by the most recent
    /// `forward` call.
    pub fn backward(&mut self) -> Result<(), PetalError> {
        if !self.has_forward {
            return Err(PetalError::LossNoTemp);
        }

        match self.kind {
            LossKind::Mse => mse::backward(&self.y_hat, &self.y, &mut self.loss),
            LossKind::Msle => msle::backward(&self.y_hat, &self.y, &mut self.loss),
            LossKind::Rmsle => {
                rmsle::backward(&self.y_hat, &self.y, self.forward_value, &mut self.loss)
            }
            LossKind::Mae => mae::backward(&self.y_hat, &self.y, &mut self.loss),
            LossKind::Bce => bce::backward(&self.y_hat, &self.y, &mut self.loss),
            LossKind::Cce => cce::backward(&self.y_hat, &self.y, &mut self.loss),
        }
        Ok(())
    }
}

#[cfg(test)]
mod loss_spec {
    use super::*;

    fn numerical_backward(kind: LossKind, y_hat: &[f32], y: &[f32]) -> Vec<f32> {
        let h = 1e-3;
        let loss_at = |y_hat: &[f32]| {
            let mut l = Loss::new(kind, y.len());
            l.forward(y_hat, y).unwrap();
            l.buffer()[0]
        };
        (0..y.len())
            .map(|i| {
                let mut plus = y_hat.to_vec();
                plus[i] += h;
                let mut minus = y_hat.to_vec();
                minus[i] -= h;
                (loss_at(&plus) - loss_at(&minus)) / (2.0 * h)
            })
            .collect()
    }

    fn assert_matches_numerical(kind: LossKind, y_hat: &[f32], y: &[f32]) {
        let mut l = Loss::new(kind, y.len());
        l.forward(y_hat, y).unwrap();
        l.backward().unwrap();
        let numeric = numerical_backward(kind, y_hat, y);
        for (i, (analytic, numeric)) in l.buffer().iter().zip(numeric.iter()).enumerate() {
            assert!(
                (analytic - numeric).abs() < 0.01,
                "{kind:?}[{i}]: analytic={analytic} numeric={numeric}"
            );
        }
    }

    #[test]
    fn mse_forward_and_backward_match_reference_scenario() {
        let y_hat = [0.0f32, 0.5, 0.1, 0.9, 0.4, 0.9];
        let y = [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0];
        let mut l = Loss::new(LossKind::Mse, 6);
        l.forward(&y_hat, &y).unwrap();
        assert!((l.buffer()[0] - 0.2067).abs() < 1e-3);
        l.backward().unwrap();
        let expected = [0.0f32, 0.1667, 0.0333, -0.0333, 0.1333, 0.3000];
        for (got, want) in l.buffer().iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3, "{got} vs {want}");
        }
    }

    #[test]
    fn mse_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Mse, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn msle_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Msle, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn rmsle_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Rmsle, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn mae_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Mae, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn bce_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Bce, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn cce_matches_numerical_derivative() {
        assert_matches_numerical(LossKind::Cce, &[0.2, 0.8, 0.5], &[0.0, 1.0, 0.5]);
    }

    #[test]
    fn backward_before_forward_is_reported() {
        let mut l = Loss::new(LossKind::Mse, 3);
        assert_eq!(l.backward().unwrap_err(), PetalError::LossNoTemp);
    }

    #[test]
    fn mismatched_lengths_are_reported() {
        let mut l = Loss::new(LossKind::Mse, 3);
        assert_eq!(l.forward(&[0.1, 0.2], &[0.0, 0.0, 0.0]).unwrap_err(), PetalError::ShapesNotEqual);
    }
}
