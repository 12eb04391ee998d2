#[cfg(test)]
mod layer_spec {
    use petalflow::activation::{Activation, ActivationKind};
    use petalflow::layer::{dense_layer, Layer, LayerKind};
    use petalflow::shape::Shape;
    use petalflow::weights::{Initializer, WeightsConfig};
    use petalflow::Prng;

    #[test]
    fn dropout_compensation_doubles_the_mean_of_surviving_outputs() {
        let mut prng = Prng::new(11);
        let mut with_dropout =
            Layer::new(LayerKind::Direct, true, Shape::flat(200).unwrap(), Shape::flat(200).unwrap(), None, None, None, 0.5, 0.0, 1.0).unwrap();
        let mut without_dropout =
            Layer::new(LayerKind::Direct, true, Shape::flat(200).unwrap(), Shape::flat(200).unwrap(), None, None, None, 0.0, 0.0, 1.0).unwrap();

        let input = vec![1.0f32; 200];
        with_dropout.forward(&input, true, &mut prng).unwrap();
        without_dropout.forward(&input, false, &mut prng).unwrap();

        let mean_with: f32 = with_dropout.output().iter().sum::<f32>() / 200.0;
        let mean_without: f32 = without_dropout.output().iter().sum::<f32>() / 200.0;

        assert!((mean_with - 2.0 * mean_without).abs() < 0.05, "mean_with={mean_with} mean_without={mean_without}");
    }

    #[test]
    fn a_three_layer_stack_with_softmax_last_sums_to_one() {
        let mut prng = Prng::new(0);
        let weights_config = WeightsConfig { initializer: Initializer::XavierGaussian, ..Default::default() };
        let bias_config = WeightsConfig { initializer: Initializer::Constant, center: 0.0, deviation: 0.0, ..Default::default() };

        let mut l0 = dense_layer(true, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::Tanh, 2)), 0.0, &mut prng).unwrap();
        let mut l1 = dense_layer(false, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::Tanh, 2)), 0.0, &mut prng).unwrap();
        let mut l2 = dense_layer(false, 2, 2, weights_config, bias_config, Some(Activation::new(ActivationKind::Softmax, 2)), 0.0, &mut prng)
            .unwrap();

        l0.forward(&[0.3, -0.8], false, &mut prng).unwrap();
        let out0 = l0.output().to_vec();
        l1.forward(&out0, false, &mut prng).unwrap();
        let out1 = l1.output().to_vec();
        l2.forward(&out1, false, &mut prng).unwrap();

        let sum: f32 = l2.output().iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        // Backward an all-ones upstream error through the softmax layer
        // and check the bias gradient has been populated via the Jacobian
        // branch rather than left untouched.
        l2.backward(&[1.0, 1.0], &out1).unwrap();
        assert!(l2.bias().unwrap().gradient().iter().any(|&g| g != 0.0));
    }
}
