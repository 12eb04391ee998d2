//! Trains the 2-in, 2-class-out toy classifier used as PetalFlow's
//! canonical end-to-end scenario: three dense layers (2->2->2->2),
//! Xavier-Gaussian weights, constant-zero biases, ReLU-ReLU-Softmax,
//! trained with Adam on samples labeled by whether their first coordinate
//! exceeds their second.

use log::info;
use petalflow::activation::{Activation, ActivationKind};
use petalflow::layer::dense_layer;
use petalflow::loss::LossKind;
use petalflow::weights::{Initializer, WeightsConfig};
use petalflow::{Dataset, Flower, LoggingMetricsSink, OptimizerConfig, Prng, TrainConfig};

fn sample(prng: &mut Prng) -> (Vec<f32>, usize) {
    let x0 = (prng.draw_float() - 0.5) * 40.0;
    let x1 = (prng.draw_float() - 0.5) * 40.0;
    let label = if x0 > x1 { 0 } else { 1 };
    (vec![x0, x1], label)
}

fn dataset(count: usize, prng: &mut Prng) -> Dataset {
    let mut inputs = Vec::with_capacity(count);
    let mut indices = Vec::with_capacity(count);
    for _ in 0..count {
        let (x, label) = sample(prng);
        inputs.push(x);
        indices.push(label);
    }
    Dataset::sparse(inputs, indices, 2)
}

fn main() {
    env_logger::init();
    let mut prng = Prng::new(0);

    let weights_config = WeightsConfig { initializer: Initializer::XavierGaussian, ..Default::default() };
    let bias_config = WeightsConfig { initializer: Initializer::Constant, center: 0.0, deviation: 0.0, ..Default::default() };

    let l0 = dense_layer(true, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::LeakyRelu { leak: 0.0 }, 2)), 0.0, &mut prng)
        .expect("layer 0");
    let l1 = dense_layer(false, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::LeakyRelu { leak: 0.0 }, 2)), 0.0, &mut prng)
        .expect("layer 1");
    let l2 =
        dense_layer(false, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::Softmax, 2)), 0.0, &mut prng).expect("layer 2");

    let mut flower = Flower::new(vec![l0, l1, l2]).expect("non-empty, shape-compatible stack");

    let mut train_set = dataset(800, &mut prng);
    let val_set = dataset(200, &mut prng);

    let config = TrainConfig {
        loss_kind: LossKind::Cce,
        optimizer: OptimizerConfig::adam(0.01, 0.89, 0.99),
        batch_size: 40,
        epochs: 10,
    };

    let mut sink = LoggingMetricsSink;
    flower.train(&config, &mut train_set, Some(&val_set), &mut sink, &mut prng).expect("training");

    for input in [[1.0, 10.0], [20.0, 10.0], [-1.0, 10.0]] {
        let prediction = flower.predict(&input, &mut prng).expect("predict");
        info!("predict({input:?}) -> {prediction:?}");
    }
}
