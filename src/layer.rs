//! The Petal: one layer in the stack, with its per-kind forward/backward
//! kernel, its optional weights/activation, its dropout mask, and the
//! output/upstream-error buffers it owns for its whole lifetime.
//!
//! Grounded on `leaf::layer::ILayer` and its `ComputeOutput`/
//! `ComputeInputGradient` split, but collapsed from a generic-backend trait
//! with nine GPU-dispatching implementers down to the tagged-variant design
//! the redesign notes call for: "a tagged variant with a per-kind
//! forward/backward is preferable to an interface with nine implementers."

use crate::activation::Activation;
use crate::bitmask::BitMask;
use crate::dropout;
use crate::error::PetalError;
use crate::optimizer::OptimizerConfig;
use crate::prng::Prng;
use crate::shape::Shape;
use crate::util::EPS;
use crate::weights::{Weights, WeightsConfig};

/// Which kernel a [`Layer`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Copies input to output unchanged (besides dropout).
    Direct,
    /// Min/max-normalizes the whole input to `[-1, 1]`, then rescales by
    /// `(center, deviation)`.
    NormalizeAll,
    /// Same mapping as [`NormalizeAll`][LayerKind::NormalizeAll], applied
    /// independently per row.
    NormalizeRows,
    /// Same mapping as [`NormalizeAll`][LayerKind::NormalizeAll], applied
    /// independently per channel (stride = depth).
    NormalizeChannels,
    /// `out[j] = sum_i W[j,i]*in[i] + b[j]`; sums unweighted inputs if `W`
    /// is absent.
    Dense,
}

/// A single layer: its shapes, optional weights, optional activation,
/// dropout configuration, and the buffers it owns for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Layer {
    kind: LayerKind,
    is_first: bool,
    input_shape: Shape,
    output_shape: Shape,
    weights: Option<Weights>,
    bias: Option<Weights>,
    activation: Option<Activation>,
    dropout_ratio: f32,
    center: f32,
    deviation: f32,
    mask: Option<BitMask>,
    output: Vec<f32>,
    upstream_error: Vec<f32>,
}

impl Layer {
    /// Build a layer, eagerly allocating its output and (if not first)
    /// upstream-error buffers and its dropout mask (if `dropout_ratio >
    /// 0`). `weights`/`bias`, if present, must already match
    /// `output_shape.length() * input_shape.length()` /
    /// `output_shape.length()`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: LayerKind,
        is_first: bool,
        input_shape: Shape,
        output_shape: Shape,
        weights: Option<Weights>,
        bias: Option<Weights>,
        activation: Option<Activation>,
        dropout_ratio: f32,
        center: f32,
        deviation: f32,
    ) -> Result<Layer, PetalError> {
        if let Some(w) = &weights {
            w.init_or_check(output_shape.length() * input_shape.length())?;
        }
        if let Some(b) = &bias {
            b.init_or_check(output_shape.length())?;
        }

        let mask = if dropout_ratio > 0.0 { Some(BitMask::new(output_shape.length())) } else { None };

        Ok(Layer {
            kind,
            is_first,
            input_shape,
            output_shape,
            weights,
            bias,
            activation,
            dropout_ratio,
            center,
            deviation,
            mask,
            output: vec![0.0; output_shape.length()],
            upstream_error: if is_first { Vec::new() } else { vec![0.0; input_shape.length()] },
        })
    }

    /// This layer's input shape.
    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    /// This layer's output shape.
    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    /// The layer's output buffer, populated by the most recent `forward`.
    pub fn output(&self) -> &[f32] {
        &self.output
    }

    /// The layer's upstream-error buffer, populated by the most recent
    /// `backward`. Empty for the first layer in a chain.
    pub fn upstream_error(&self) -> &[f32] {
        &self.upstream_error
    }

    /// The layer's trainable weight tensor, if any.
    pub fn weights(&self) -> Option<&Weights> {
        self.weights.as_ref()
    }

    /// The layer's trainable bias tensor, if any.
    pub fn bias(&self) -> Option<&Weights> {
        self.bias.as_ref()
    }

    /// Apply the optimizer's update rule to this layer's weights and bias,
    /// if present.
    pub fn apply_optimizer(&mut self, optimizer: &OptimizerConfig) {
        if let Some(w) = &mut self.weights {
            w.update(optimizer);
        }
        if let Some(b) = &mut self.bias {
            b.update(optimizer);
        }
    }

    /// Run this layer's kernel, then its activation (if any), then dropout
    /// compensation scaling (if `training` and `dropout_ratio > 0`).
    ///
    /// Dropout is re-sampled at the start of every training forward pass;
    /// in inference mode (`training = false`) the mask is left untouched
    /// and no compensation scaling is applied.
    pub fn forward(&mut self, input: &[f32], training: bool, prng: &mut Prng) -> Result<(), PetalError> {
        self.input_shape.require_eq_length(&Shape::flat(input.len())?)?;

        if training && self.dropout_ratio > 0.0 {
            if let Some(mask) = &mut self.mask {
                dropout::sample(mask, self.dropout_ratio, prng);
            }
        }

        match self.kind {
            LayerKind::Direct => self.forward_direct(input),
            LayerKind::NormalizeAll => self.forward_normalize_all(input),
            LayerKind::NormalizeRows => self.forward_normalize_rows(input),
            LayerKind::NormalizeChannels => self.forward_normalize_channels(input),
            LayerKind::Dense => self.forward_dense(input),
        }

        if let Some(activation) = &mut self.activation {
            activation.forward(&mut self.output, self.mask.as_ref())?;
        }

        if training && self.dropout_ratio > 0.0 {
            let scale = 1.0 / (1.0 - self.dropout_ratio + EPS);
            let mask = self.mask.as_ref();
            for (i, x) in self.output.iter_mut().enumerate() {
                let dropped = mask.map(|m| m.get_unchecked(i)).unwrap_or(false);
                if dropped {
                    *x = 0.0;
                } else {
                    *x *= scale;
                }
            }
        }

        Ok(())
    }

    fn forward_direct(&mut self, input: &[f32]) {
        let mask = self.mask.as_ref();
        for (i, (o, x)) in self.output.iter_mut().zip(input).enumerate() {
            let dropped = mask.map(|m| m.get_unchecked(i)).unwrap_or(false);
            *o = if dropped { 0.0 } else { *x };
        }
    }

    fn normalize_slice(&self, input: &[f32], output: &mut [f32]) {
        let min = input.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = input.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min + EPS;
        for (o, x) in output.iter_mut().zip(input) {
            *o = (x - min) / range * 2.0 * self.deviation + self.center - self.deviation;
        }
    }

    fn forward_normalize_all(&mut self, input: &[f32]) {
        let mut out = vec![0.0; input.len()];
        self.normalize_slice(input, &mut out);
        self.apply_mask_and_store(&out);
    }

    fn forward_normalize_rows(&mut self, input: &[f32]) {
        let cols = self.input_shape.cols() * self.input_shape.depth();
        let mut out = vec![0.0; input.len()];
        for row in 0..self.input_shape.rows() {
            let from = row * cols;
            let to = from + cols;
            self.normalize_slice(&input[from..to], &mut out[from..to]);
        }
        self.apply_mask_and_store(&out);
    }

    fn forward_normalize_channels(&mut self, input: &[f32]) {
        let depth = self.input_shape.depth();
        let mut out = vec![0.0; input.len()];
        for channel in 0..depth {
            let strided: Vec<f32> = input.iter().skip(channel).step_by(depth).cloned().collect();
            let mut strided_out = vec![0.0; strided.len()];
            self.normalize_slice(&strided, &mut strided_out);
            for (i, v) in strided_out.into_iter().enumerate() {
                out[i * depth + channel] = v;
            }
        }
        self.apply_mask_and_store(&out);
    }

    fn apply_mask_and_store(&mut self, computed: &[f32]) {
        let mask = self.mask.as_ref();
        for (i, (o, x)) in self.output.iter_mut().zip(computed).enumerate() {
            let dropped = mask.map(|m| m.get_unchecked(i)).unwrap_or(false);
            *o = if dropped { 0.0 } else { *x };
        }
    }

    fn forward_dense(&mut self, input: &[f32]) {
        let in_len = self.input_shape.length();
        let out_len = self.output_shape.length();
        let mask = self.mask.as_ref();

        for j in 0..out_len {
            if mask.map(|m| m.get_unchecked(j)).unwrap_or(false) {
                self.output[j] = 0.0;
                continue;
            }
            let mut sum = match &self.weights {
                Some(w) => {
                    let row = &w.values()[j * in_len..(j + 1) * in_len];
                    row.iter().zip(input).map(|(wi, xi)| wi * xi).sum::<f32>()
                }
                None => input.iter().sum(),
            };
            if let Some(b) = &self.bias {
                sum += b.values()[j];
            }
            self.output[j] = sum;
        }
    }

    /// Backward through this layer. `upstream_err` is the error flowing in
    /// from the next layer (the loss gradient for the last layer); `left`
    /// is the value this layer saw on its left during forward (the
    /// previous layer's output, or the network input for the first
    /// layer).
    ///
    /// For [`LayerKind::Direct`] and the normalize kinds the layer's
    /// transfer function is treated as identity for gradient purposes (an
    /// open question preserved from the source this design was distilled
    /// from), so `upstream_err` is copied through unchanged.
    pub fn backward(&mut self, upstream_err: &[f32], left: &[f32]) -> Result<(), PetalError> {
        match self.kind {
            LayerKind::Direct | LayerKind::NormalizeAll | LayerKind::NormalizeRows | LayerKind::NormalizeChannels => {
                if !self.is_first {
                    self.upstream_error.copy_from_slice(upstream_err);
                }
                Ok(())
            }
            LayerKind::Dense => self.backward_dense(upstream_err, left),
        }
    }

    fn backward_dense(&mut self, upstream_err: &[f32], left: &[f32]) -> Result<(), PetalError> {
        let in_len = self.input_shape.length();
        let out_len = self.output_shape.length();

        let delta = if let Some(activation) = &mut self.activation {
            activation.backward(&mut self.output, self.mask.as_ref())?;
            match activation.jacobian(out_len) {
                Some(jacobian) => {
                    let mut delta = vec![0.0; out_len];
                    for j in 0..out_len {
                        delta[j] = (0..out_len).map(|k| jacobian[j * out_len + k] * upstream_err[k]).sum();
                    }
                    delta
                }
                None => self.output.iter().zip(upstream_err).map(|(f, e)| f * e).collect(),
            }
        } else {
            upstream_err.to_vec()
        };

        if !self.is_first {
            for u in self.upstream_error.iter_mut() {
                *u = 0.0;
            }
        }

        for j in 0..out_len {
            if let Some(w) = &mut self.weights {
                let trainable = w.trainable();
                for i in 0..in_len {
                    if !self.is_first {
                        self.upstream_error[i] += w.values()[j * in_len + i] * delta[j];
                    }
                    if trainable {
                        w.gradient_mut()[j * in_len + i] += delta[j] * left[i];
                    }
                }
            } else if !self.is_first {
                for u in self.upstream_error.iter_mut() {
                    *u += delta[j];
                }
            }

            if let Some(b) = &mut self.bias {
                if b.trainable() {
                    b.gradient_mut()[j] += delta[j];
                }
            }
        }

        Ok(())
    }
}

/// Convenience constructor for a dense layer over fresh weights and bias —
/// the common case in every test and the classifier demo.
#[allow(clippy::too_many_arguments)]
pub fn dense_layer(
    is_first: bool,
    in_len: usize,
    out_len: usize,
    weights_config: WeightsConfig,
    bias_config: WeightsConfig,
    activation: Option<Activation>,
    dropout_ratio: f32,
    prng: &mut Prng,
) -> Result<Layer, PetalError> {
    let input_shape = Shape::flat(in_len)?;
    let output_shape = Shape::flat(out_len)?;
    let weights = Weights::new(true, weights_config, out_len * in_len, prng);
    let bias = Weights::new(true, bias_config, out_len, prng);
    Layer::new(LayerKind::Dense, is_first, input_shape, output_shape, Some(weights), Some(bias), activation, dropout_ratio, 0.0, 1.0)
}
