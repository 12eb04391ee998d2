//! Pure configuration describing how a [`Weights`][crate::weights::Weights]
//! record is updated from its accumulated gradient.
//!
//! Grounded on `leaf`'s `solver::SolverConfig` — one flat config struct
//! whose fields (`momentum`, `base_lr`, `gamma`, ...) are only meaningful
//! for some solver kinds, with a `Default` impl and a `kind` tag selecting
//! behavior — generalized here to the four update rules the distilled spec
//! names. Unlike `leaf::solver::ISolver`, which owns solver-side state
//! (`iter`) outside the network, PetalFlow keeps all per-parameter state
//! (`m`, `v`, `step`) inside [`Weights`][crate::weights::Weights] itself, so
//! an `OptimizerConfig` stays fully stateless and `Copy`.

/// Which update rule an [`OptimizerConfig`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    /// `v <- momentum*v - lr*g; w <- w + v`. `momentum = 0` collapses to
    /// plain gradient descent.
    SgdMomentum,
    /// `v <- beta1*v + (1-beta1)*g^2; w <- w - lr*g/(sqrt(v)+eps)`.
    RmsProp,
    /// `v <- v + g^2; w <- w - lr*g/(sqrt(v)+eps)`.
    AdaGrad,
    /// Bias-corrected first/second moment estimates per Kingma & Ba.
    Adam,
}

/// Pure, stateless optimizer configuration.
///
/// Only the fields relevant to `kind` are consulted by
/// [`Weights::update`][crate::weights::Weights::update]; the others are
/// simply ignored, the same way `leaf::solver::SolverConfig::momentum` only
/// matters when `solver` is an SGD kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerConfig {
    /// Which update rule to apply.
    pub kind: OptimizerKind,
    /// The learning rate.
    pub lr: f32,
    /// Momentum coefficient, used by [`OptimizerKind::SgdMomentum`].
    pub momentum: f32,
    /// `beta1` in RMSProp (there called just "beta") and Adam.
    pub beta1: f32,
    /// `beta2`, used only by Adam.
    pub beta2: f32,
    /// Division/log guard added to denominators.
    pub eps: f32,
}

impl Default for OptimizerConfig {
    fn default() -> OptimizerConfig {
        OptimizerConfig {
            kind: OptimizerKind::SgdMomentum,
            lr: 0.01,
            momentum: 0.0,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// Convenience constructor for plain (momentum-free) SGD.
    pub fn sgd(lr: f32) -> OptimizerConfig {
        OptimizerConfig { kind: OptimizerKind::SgdMomentum, lr, momentum: 0.0, ..Default::default() }
    }

    /// Convenience constructor for SGD with momentum.
    pub fn sgd_momentum(lr: f32, momentum: f32) -> OptimizerConfig {
        OptimizerConfig { kind: OptimizerKind::SgdMomentum, lr, momentum, ..Default::default() }
    }

    /// Convenience constructor for RMSProp.
    pub fn rmsprop(lr: f32, beta: f32) -> OptimizerConfig {
        OptimizerConfig { kind: OptimizerKind::RmsProp, lr, beta1: beta, ..Default::default() }
    }

    /// Convenience constructor for AdaGrad.
    pub fn adagrad(lr: f32) -> OptimizerConfig {
        OptimizerConfig { kind: OptimizerKind::AdaGrad, lr, ..Default::default() }
    }

    /// Convenience constructor for Adam.
    pub fn adam(lr: f32, beta1: f32, beta2: f32) -> OptimizerConfig {
        OptimizerConfig { kind: OptimizerKind::Adam, lr, beta1, beta2, ..Default::default() }
    }
}

#[cfg(test)]
mod optimizer_spec {
    use super::*;

    #[test]
    fn default_is_plain_sgd() {
        let cfg = OptimizerConfig::default();
        assert_eq!(cfg.kind, OptimizerKind::SgdMomentum);
        assert_eq!(cfg.momentum, 0.0);
    }
}
