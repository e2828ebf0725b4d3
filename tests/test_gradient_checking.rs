// Tests for numerical gradient checking using finite differences.
// These tests verify that backpropagated gradients match central
// differences of the total cost, perturbing one parameter at a time
// through a checkpoint copy of the network.

use approx::assert_relative_eq;
use mlp_trainer::io::ModelCheckpoint;
use mlp_trainer::layers::LayerGradients;
use mlp_trainer::utils::{Activation, Cost, SimpleRng};
use mlp_trainer::{Matrix, NeuralNetwork};

const EPS: f64 = 1e-5;
const TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy)]
enum Param {
    Weight,
    Bias,
}

fn total_cost(checkpoint: &ModelCheckpoint, input: &Matrix, expected: &Matrix) -> f64 {
    let nn = NeuralNetwork::from_checkpoint(checkpoint).unwrap();
    Cost::MeanSquared.total(&nn.infer(input), expected)
}

fn numeric_gradient(
    nn: &NeuralNetwork,
    layer: usize,
    param: Param,
    index: usize,
    input: &Matrix,
    expected: &Matrix,
) -> f64 {
    let nudge = |delta: f64| {
        let mut cp = nn.to_checkpoint();
        let values = match param {
            Param::Weight => &mut cp.layers[layer].weights,
            Param::Bias => &mut cp.layers[layer].biases,
        };
        values[index] += delta;
        total_cost(&cp, input, expected)
    };
    (nudge(EPS) - nudge(-EPS)) / (2.0 * EPS)
}

fn check_network(nn: &NeuralNetwork, input: &Matrix, expected: &Matrix) {
    let (_, mut cache) = nn.feed_forward(input);
    let grads: Vec<LayerGradients> = nn.back_propagate(&mut cache, Cost::MeanSquared, expected);

    for (l, grad) in grads.iter().enumerate() {
        for (i, &analytic) in grad.weights.as_slice().iter().enumerate() {
            let numeric = numeric_gradient(nn, l, Param::Weight, i, input, expected);
            assert_relative_eq!(analytic, numeric, epsilon = TOLERANCE);
        }
        for (i, &analytic) in grad.biases.as_slice().iter().enumerate() {
            let numeric = numeric_gradient(nn, l, Param::Bias, i, input, expected);
            assert_relative_eq!(analytic, numeric, epsilon = TOLERANCE);
        }
    }
}

#[test]
fn test_sigmoid_network_gradients() {
    let mut rng = SimpleRng::new(42);
    let nn = NeuralNetwork::random(&[3, 4, 2], Activation::Sigmoid, Activation::Sigmoid, &mut rng)
        .unwrap();
    check_network(
        &nn,
        &Matrix::row_vector(vec![0.2, -0.4, 0.9]),
        &Matrix::one_hot(2, 1),
    );
}

#[test]
fn test_tanh_hidden_layers_gradients() {
    let mut rng = SimpleRng::new(7);
    let nn = NeuralNetwork::random(&[4, 5, 3, 3], Activation::Tanh, Activation::Sigmoid, &mut rng)
        .unwrap();
    check_network(
        &nn,
        &Matrix::row_vector(vec![0.1, 0.5, -0.3, 0.8]),
        &Matrix::one_hot(3, 0),
    );
}

#[test]
fn test_single_layer_gradients() {
    let mut rng = SimpleRng::new(3);
    let nn = NeuralNetwork::random(&[5, 2], Activation::Tanh, Activation::Tanh, &mut rng).unwrap();
    check_network(
        &nn,
        &Matrix::row_vector(vec![0.3, 0.3, -0.1, 0.0, 1.0]),
        &Matrix::one_hot(2, 0),
    );
}

#[test]
fn test_checkpoint_copy_preserves_output() {
    let mut rng = SimpleRng::new(13);
    let nn = NeuralNetwork::random(&[3, 3, 2], Activation::Sigmoid, Activation::Softmax, &mut rng)
        .unwrap();
    let input = Matrix::row_vector(vec![0.5, 0.5, 0.5]);
    let copy = NeuralNetwork::from_checkpoint(&nn.to_checkpoint()).unwrap();
    assert_eq!(copy.infer(&input), nn.infer(&input));
}
