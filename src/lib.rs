#![deny(missing_docs, missing_debug_implementations, unsafe_code, unused_import_braces, unused_qualifications)]

//! PetalFlow is a lightweight neural-network engine: a linear stack of
//! layers ("petals") composed into a model ("flower"), evaluated forward
//! for inference and trained by mini-batch backpropagation.
//!
//! The crate owns the numerical core only: layer kernels, the dense-layer
//! gradient accumulator, activation/loss derivative pairs, weight
//! initializers, optimizer update rules, and the flower-level training
//! loop that chains them together. It does not perform I/O, parse
//! configuration, or ship a model-serialization format — wire those up
//! around it the way `demos/classifier.rs` does.

/// The stable error taxonomy shared by every fallible operation.
pub mod error;
/// A deterministic, seedable uniform generator (process-wide and per-instance).
pub mod prng;
/// Three-dimensional buffer extents.
pub mod shape;
/// A packed-bit vector with bounds-checked set/clear/get/not.
pub mod bitmask;
/// Populates a `BitMask` with a target drop ratio.
pub mod dropout;
/// Parameter tensor, gradient accumulator, and optimizer update rules.
pub mod weights;
/// Pure optimizer configuration (SGD+momentum / RMSProp / AdaGrad / Adam).
pub mod optimizer;
/// Nine activation functions, paired with their analytic derivatives.
pub mod activation;
/// Six loss functions, paired with their analytic derivatives.
pub mod loss;
/// The Petal: one layer's forward/backward kernel and owned buffers.
pub mod layer;
/// The Flower: a layer stack plus training orchestration.
pub mod flower;
/// Argmax / threshold / one-hot / multi-hot conversions.
pub mod labels;
/// Per-batch metrics, reported to a caller-supplied sink.
pub mod metrics;
mod util;

pub use error::PetalError;
pub use flower::{Dataset, Flower, TrainConfig, Targets};
pub use layer::{Layer, LayerKind};
pub use loss::{Loss, LossKind};
pub use metrics::{BatchMetrics, LoggingMetricsSink, MetricsSink, NullMetricsSink, Phase};
pub use optimizer::{OptimizerConfig, OptimizerKind};
pub use prng::Prng;
pub use shape::Shape;
pub use weights::{Initializer, Weights, WeightsConfig};
