//! The stable error taxonomy shared by every fallible operation in the crate.
//!
//! `leaf` latched an error code onto the aggregate that owned the failing
//! operation (a layer's `error_code`, a mask's out-of-bounds flag) and left
//! callers to remember to check it after the fact. PetalFlow instead returns
//! `Result<T, PetalError>` everywhere a fallible operation can fail, keeping
//! the same fixed, human-readable taxonomy.

use thiserror::Error;

/// Every way a PetalFlow operation can fail.
///
/// Variant names and meanings are a stable external contract: callers may
/// match on them. `None` from the distilled error enumeration has no
/// variant here — it is represented by `Ok(_)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetalError {
    /// A tensor or buffer could not be sized; in practice this fires when a
    /// computed length would overflow `usize`, since the Rust allocator
    /// aborts the process on true out-of-memory rather than returning.
    #[error("allocation failed")]
    Alloc,
    /// A layer kind does not support the operation being requested of it.
    #[error("wrong layer kind for this operation")]
    WrongLayerKind,
    /// An initializer kind does not match what the weights record expects.
    #[error("wrong weights initializer")]
    WrongWeightsInit,
    /// An activation kind does not match what the caller expected.
    #[error("wrong activation kind")]
    WrongActivation,
    /// A `Shape` was constructed with a zero dimension.
    #[error("shape dimension is zero")]
    ShapeZero,
    /// A `Shape`'s derived length would overflow.
    #[error("shape is too big")]
    ShapeTooBig,
    /// Two shapes that were required to match did not.
    #[error("shapes are not equal")]
    ShapesNotEqual,
    /// `Activation::backward` was called before `forward` populated the
    /// derivative-scratch buffer.
    #[error("activation has no scratch buffer from a prior forward pass")]
    ActivationNoTemp,
    /// `Loss::backward` was called before `forward` populated the scratch
    /// buffers.
    #[error("loss has no scratch buffer from a prior forward pass")]
    LossNoTemp,
    /// A `BitMask` operation addressed a bit index `>= length_bits`.
    #[error("bit index out of bounds")]
    MaskOutOfBounds,
    /// An optimizer kind does not match what the weights record expects.
    #[error("wrong optimizer kind")]
    WrongOptimizer,
    /// A `Flower` was asked to predict/train with zero layers.
    #[error("flower has no layers")]
    FlowerNoLayers,
    /// A loss kind does not match what the caller expected.
    #[error("wrong loss kind")]
    WrongLossKind,
    /// A batch size of zero (or larger than the training set where that is
    /// nonsensical) was requested.
    #[error("wrong batch size")]
    WrongBatchSize,
}
