//! Per-batch metrics, emitted to an external collaborator rather than
//! computed or stored by the core.
//!
//! Grounded on `leaf::solver::confusion_matrix::{ConfusionMatrix,
//! Accuracy}`: that type tracked prediction/target pairs and derived an
//! accuracy from them inside the solver. The distilled spec pushes metrics
//! reporting out of the core's concern ("the progress-bar metrics printer"
//! is an explicit non-goal), so here the Flower only ever *computes* a
//! batch's mean loss and accuracy and hands them to a caller-supplied sink
//! — `leaf` has no such seam, so the trait shape instead follows
//! `log`'s own `Log` trait (a single method the caller implements).

use std::fmt;

/// What the Flower reports after each training or validation batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchMetrics {
    /// Epoch index, zero-based.
    pub epoch: usize,
    /// Batch index within the epoch, zero-based.
    pub batch: usize,
    /// Whether this batch was a training pass or a validation pass.
    pub phase: Phase,
    /// Mean loss over the batch.
    pub mean_loss: f32,
    /// Fraction of samples in the batch whose argmax prediction matched
    /// their argmax target.
    pub accuracy: f32,
}

/// Which pass a [`BatchMetrics`] reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// A training batch (forward + loss + backward + optimizer step).
    Train,
    /// A validation batch (forward + loss only).
    Validate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Validate => write!(f, "validate"),
        }
    }
}

/// Receives a [`BatchMetrics`] record after every batch the Flower runs.
pub trait MetricsSink {
    /// Called once per batch, in training-loop order.
    fn report(&mut self, metrics: BatchMetrics);
}

/// Emits each batch's metrics as a `log::info!` line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMetricsSink;

impl MetricsSink for LoggingMetricsSink {
    fn report(&mut self, metrics: BatchMetrics) {
        log::info!(
            "epoch {} batch {} [{}] loss={:.4} accuracy={:.4}",
            metrics.epoch,
            metrics.batch,
            metrics.phase,
            metrics.mean_loss,
            metrics.accuracy
        );
    }
}

/// Discards every batch's metrics. Useful for tests and benchmarks that
/// don't want logging overhead in the training loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMetricsSink;

impl MetricsSink for NullMetricsSink {
    fn report(&mut self, _metrics: BatchMetrics) {}
}

#[cfg(test)]
mod metrics_spec {
    use super::*;

    #[test]
    fn null_sink_accepts_every_report_without_panicking() {
        let mut sink = NullMetricsSink;
        sink.report(BatchMetrics { epoch: 0, batch: 0, phase: Phase::Train, mean_loss: 1.0, accuracy: 0.0 });
    }

    #[test]
    fn a_closure_backed_sink_observes_every_batch() {
        struct Collecting(Vec<BatchMetrics>);
        impl MetricsSink for Collecting {
            fn report(&mut self, metrics: BatchMetrics) {
                self.0.push(metrics);
            }
        }

        let mut sink = Collecting(Vec::new());
        sink.report(BatchMetrics { epoch: 0, batch: 0, phase: Phase::Train, mean_loss: 0.5, accuracy: 0.8 });
        sink.report(BatchMetrics { epoch: 0, batch: 1, phase: Phase::Validate, mean_loss: 0.4, accuracy: 0.9 });
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[1].phase, Phase::Validate);
    }
}
