// Tests for the forward pass of dense layers and networks.
// Expected values are worked out by hand from small fixed parameters.

use approx::assert_relative_eq;
use mlp_trainer::layers::DenseLayer;
use mlp_trainer::utils::activations::sigmoid;
use mlp_trainer::utils::{Activation, SimpleRng};
use mlp_trainer::{Matrix, NeuralNetwork};

fn fixed_layer(activation: Activation) -> DenseLayer {
    DenseLayer::new(
        Matrix::from_vec(2, 2, vec![0.1, 0.2, 0.3, 0.4]),
        Matrix::row_vector(vec![0.5, -0.5]),
        activation,
    )
}

#[test]
fn test_weighted_input_includes_bias() {
    let layer = fixed_layer(Activation::Sigmoid);
    let (_, cache) = layer.feed_forward(0, &Matrix::row_vector(vec![1.0, 2.0]));

    // [1, 2] x W = [0.7, 1.0], plus [0.5, -0.5]
    assert_relative_eq!(cache.weighted_input.get(0, 0), 1.2, epsilon = 1e-12);
    assert_relative_eq!(cache.weighted_input.get(0, 1), 0.5, epsilon = 1e-12);
    assert_relative_eq!(cache.activated.get(0, 0), sigmoid(1.2), epsilon = 1e-12);
    assert!(cache.gradient_signal.is_none());
}

#[test]
fn test_infer_matches_feed_forward() {
    for activation in Activation::ALL {
        let layer = fixed_layer(activation);
        let input = Matrix::row_vector(vec![0.3, -0.9]);
        let (output, cache) = layer.feed_forward(4, &input);

        assert_eq!(layer.infer(&input), output);
        assert_eq!(cache.activated, output);
        assert_eq!(cache.input, input);
        assert_eq!(cache.layer_index, 4);
    }
}

#[test]
fn test_network_chains_layers() {
    let first = fixed_layer(Activation::Tanh);
    let second = DenseLayer::new(
        Matrix::from_vec(2, 1, vec![1.0, -1.0]),
        Matrix::row_vector(vec![0.0]),
        Activation::Sigmoid,
    );
    let nn = NeuralNetwork::from_layers(vec![first.clone(), second.clone()]).unwrap();

    let input = Matrix::row_vector(vec![1.0, 2.0]);
    let hidden = first.infer(&input);
    let expected = sigmoid(hidden.get(0, 0) - hidden.get(0, 1));

    let output = nn.infer(&input);
    assert_eq!(output.shape(), (1, 1));
    assert_relative_eq!(output.get(0, 0), expected, epsilon = 1e-12);

    let (trained_output, cache) = nn.feed_forward(&input);
    assert_eq!(trained_output, output);
    assert_eq!(cache.layer_caches.len(), 2);
    assert_eq!(cache.layer_caches[1].input, hidden);
}

#[test]
fn test_softmax_network_output_sums_to_one() {
    let mut rng = SimpleRng::new(11);
    let nn = NeuralNetwork::random(&[6, 5, 4], Activation::Sigmoid, Activation::Softmax, &mut rng)
        .unwrap();
    let output = nn.infer(&Matrix::row_vector(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));
    assert_relative_eq!(output.sum(), 1.0, epsilon = 1e-12);
}

#[test]
fn test_same_seed_same_network() {
    let a = NeuralNetwork::random(&[3, 4, 2], Activation::Sigmoid, Activation::Sigmoid, &mut SimpleRng::new(9))
        .unwrap();
    let b = NeuralNetwork::random(&[3, 4, 2], Activation::Sigmoid, Activation::Sigmoid, &mut SimpleRng::new(9))
        .unwrap();
    assert_eq!(a, b);
}

#[test]
#[should_panic(expected = "matmul requires lhs cols == rhs rows")]
fn test_wrong_input_width_panics() {
    let layer = fixed_layer(Activation::Sigmoid);
    let _ = layer.infer(&Matrix::row_vector(vec![1.0, 2.0, 3.0]));
}
