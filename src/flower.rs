//! The Flower: a linear stack of petals plus the training orchestration
//! that chains them — forward, loss, backward, optimizer step, optional
//! validation — into a single call.
//!
//! Grounded on `leaf::network::Network` (the layer-stack-owning container)
//! and `leaf::solver::Solver::train_minibatch` (forward/loss/backward/step
//! per batch), collapsed to the single-threaded, backend-free shape this
//! engine's Non-goals call for.

use crate::error::PetalError;
use crate::labels;
use crate::layer::Layer;
use crate::loss::{Loss, LossKind};
use crate::metrics::{BatchMetrics, MetricsSink, Phase};
use crate::optimizer::OptimizerConfig;
use crate::prng::Prng;

/// A training or validation target set: either dense one-hot/multi-hot
/// vectors, already the right length for the final layer, or sparse class
/// indices paired with the number of classes (expanded to one-hot lazily,
/// per sample, via [`crate::labels::one_hot`]).
#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    /// One target vector per sample, each already dense.
    Dense(Vec<Vec<f32>>),
    /// One class index per sample, plus the one-hot length to expand to.
    Sparse(Vec<usize>, usize),
}

impl Targets {
    fn len(&self) -> usize {
        match self {
            Targets::Dense(v) => v.len(),
            Targets::Sparse(v, _) => v.len(),
        }
    }

    fn dense(&self, i: usize) -> Vec<f32> {
        match self {
            Targets::Dense(v) => v[i].clone(),
            Targets::Sparse(indices, num_classes) => labels::one_hot(indices[i], *num_classes),
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        match self {
            Targets::Dense(v) => v.swap(a, b),
            Targets::Sparse(v, _) => v.swap(a, b),
        }
    }
}

/// A set of samples with their targets, permuted jointly by [`Dataset::shuffle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// One input vector per sample.
    pub inputs: Vec<Vec<f32>>,
    /// The matching targets, dense or sparse.
    pub targets: Targets,
}

impl Dataset {
    /// Pair up `inputs` with dense `targets`. Panics (a caller bug, not a
    /// runtime condition) if the lengths disagree.
    pub fn dense(inputs: Vec<Vec<f32>>, targets: Vec<Vec<f32>>) -> Dataset {
        assert_eq!(inputs.len(), targets.len());
        Dataset { inputs, targets: Targets::Dense(targets) }
    }

    /// Pair up `inputs` with sparse class-index `targets` expanded to
    /// `num_classes`-length one-hot vectors on demand.
    pub fn sparse(inputs: Vec<Vec<f32>>, indices: Vec<usize>, num_classes: usize) -> Dataset {
        assert_eq!(inputs.len(), indices.len());
        Dataset { inputs, targets: Targets::Sparse(indices, num_classes) }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Whether this dataset holds zero samples.
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    /// The dense target for sample `i`.
    pub fn dense_target(&self, i: usize) -> Vec<f32> {
        self.targets.dense(i)
    }

    /// Permute every sample in place, inputs and targets jointly, via a
    /// Fisher-Yates shuffle driven by `prng`.
    pub fn shuffle(&mut self, prng: &mut Prng) {
        let n = self.len();
        for i in (1..n).rev() {
            let j = (prng.draw_double() * (i + 1) as f64) as usize;
            let j = j.min(i);
            self.inputs.swap(i, j);
            self.targets.swap(i, j);
        }
    }
}

/// Configuration consumed by [`Flower::train`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainConfig {
    /// Which loss to compute against the final layer's output.
    pub loss_kind: LossKind,
    /// The update rule applied to every layer's weights/bias at each
    /// batch boundary.
    pub optimizer: OptimizerConfig,
    /// Samples per batch.
    pub batch_size: usize,
    /// Number of passes over the (re-shuffled, each time) training set.
    pub epochs: usize,
}

/// An ordered stack of petals plus a lazily-allocated loss record.
#[derive(Debug, Clone)]
pub struct Flower {
    layers: Vec<Layer>,
    loss: Option<Loss>,
}

impl Flower {
    /// Build a flower from `layers`, checking that the i-th layer's output
    /// length matches the (i+1)-th layer's input length.
    pub fn new(layers: Vec<Layer>) -> Result<Flower, PetalError> {
        if layers.is_empty() {
            return Err(PetalError::FlowerNoLayers);
        }
        for pair in layers.windows(2) {
            pair[0].output_shape().require_eq_length(&pair[1].input_shape())?;
        }
        Ok(Flower { layers, loss: None })
    }

    /// The layers in this flower, in forward order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Run the forward chain in inference mode and return the final
    /// layer's output.
    pub fn predict(&mut self, input: &[f32], prng: &mut Prng) -> Result<&[f32], PetalError> {
        self.forward_chain(input, false, prng)?;
        Ok(self.layers.last().expect("checked non-empty at construction").output())
    }

    fn forward_chain(&mut self, input: &[f32], training: bool, prng: &mut Prng) -> Result<(), PetalError> {
        for i in 0..self.layers.len() {
            if i == 0 {
                self.layers[i].forward(input, training, prng)?;
            } else {
                let prev_output = self.layers[i - 1].output().to_vec();
                self.layers[i].forward(&prev_output, training, prng)?;
            }
        }
        Ok(())
    }

    /// Run the backward chain: `loss_grad` seeds the last layer's
    /// upstream error; each earlier layer then consumes the next layer's
    /// freshly computed upstream-error buffer. `original_input` is handed
    /// to the first layer as its "left output".
    fn backward_chain(&mut self, original_input: &[f32], loss_grad: &[f32]) -> Result<(), PetalError> {
        let n = self.layers.len();
        let mut upstream = loss_grad.to_vec();
        for i in (0..n).rev() {
            let left = if i == 0 { original_input.to_vec() } else { self.layers[i - 1].output().to_vec() };
            self.layers[i].backward(&upstream, &left)?;
            if i > 0 {
                upstream = self.layers[i].upstream_error().to_vec();
            }
        }
        Ok(())
    }

    fn run_batch(
        &mut self,
        dataset: &Dataset,
        from: usize,
        to: usize,
        training: bool,
        prng: &mut Prng,
    ) -> Result<(f32, f32), PetalError> {
        let mut loss_sum = 0.0f32;
        let mut correct = 0usize;

        for sample in from..to {
            let input = dataset.inputs[sample].clone();
            let target = dataset.dense_target(sample);

            self.forward_chain(&input, training, prng)?;
            let predicted = self.layers.last().expect("checked non-empty at construction").output().to_vec();

            let loss = self.loss.as_mut().expect("allocated before any batch runs");
            loss.forward(&predicted, &target)?;
            loss_sum += loss.buffer()[0];
            if labels::argmax(&predicted) == labels::argmax(&target) {
                correct += 1;
            }

            if training {
                loss.backward()?;
                let grad = loss.buffer().to_vec();
                self.backward_chain(&input, &grad)?;
            }
        }

        let count = (to - from).max(1) as f32;
        Ok((loss_sum / count, correct as f32 / count))
    }

    /// Train this flower: for each epoch, reshuffle the training set, then
    /// for each batch run a forward/loss/backward pass over every sample
    /// in the batch (gradients accumulate across the whole batch), apply
    /// the optimizer once at the batch boundary, optionally run a
    /// validation batch (cycling through `val_set`, since a held-out set
    /// rarely divides evenly by `batch_size`), and report both to
    /// `metrics`.
    pub fn train(
        &mut self,
        config: &TrainConfig,
        train_set: &mut Dataset,
        val_set: Option<&Dataset>,
        metrics: &mut dyn MetricsSink,
        prng: &mut Prng,
    ) -> Result<(), PetalError> {
        if self.layers.is_empty() {
            return Err(PetalError::FlowerNoLayers);
        }
        if config.batch_size == 0 {
            return Err(PetalError::WrongBatchSize);
        }

        let out_len = self.layers.last().expect("checked non-empty above").output_shape().length();
        if self.loss.as_ref().map(|l| l.kind()) != Some(config.loss_kind) {
            self.loss = Some(Loss::new(config.loss_kind, out_len));
        }

        let batches_per_epoch = (train_set.len() + config.batch_size - 1) / config.batch_size;
        if batches_per_epoch == 0 {
            return Err(PetalError::WrongBatchSize);
        }

        let val_batches = val_set.filter(|v| !v.is_empty()).map(|v| (v.len() + config.batch_size - 1) / config.batch_size);

        for epoch in 0..config.epochs {
            train_set.shuffle(prng);

            for batch in 0..batches_per_epoch {
                let from = batch * config.batch_size;
                let to = (from + config.batch_size).min(train_set.len());

                let (mean_loss, accuracy) = self.run_batch(train_set, from, to, true, prng)?;
                for layer in &mut self.layers {
                    layer.apply_optimizer(&config.optimizer);
                }
                metrics.report(BatchMetrics { epoch, batch, phase: Phase::Train, mean_loss, accuracy });

                if let (Some(val), Some(val_batches)) = (val_set, val_batches) {
                    let vb = batch % val_batches;
                    let vfrom = vb * config.batch_size;
                    let vto = (vfrom + config.batch_size).min(val.len());
                    let (mean_loss, accuracy) = self.run_batch(val, vfrom, vto, false, prng)?;
                    metrics.report(BatchMetrics { epoch, batch, phase: Phase::Validate, mean_loss, accuracy });
                }
            }
        }

        Ok(())
    }
}
