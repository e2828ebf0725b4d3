//! Dense (fully connected) layer implementation
//!
//! A `DenseLayer` performs `activation(x × W + B)` on a single input row and
//! carries the momentum velocities used by its parameter updates.
//!
//! Training goes through a fixed per-sample sequence:
//!
//! 1. [`DenseLayer::feed_forward`] produces a [`LayerLearnCache`].
//! 2. The last layer calls [`DenseLayer::output_gradient_signal`]; every
//!    earlier layer, walking backwards, calls
//!    [`DenseLayer::hidden_gradient_signal`] with the next layer's cache.
//! 3. [`DenseLayer::extract_gradients`] reads the gradient pair out of the
//!    cache.
//!
//! The backward calls only take `&self`, so many threads can run them
//! against one shared layer. Only [`DenseLayer::apply_gradients`] mutates.

use std::ops::AddAssign;

use crate::matrix::Matrix;
use crate::optimizers::MomentumSgd;
use crate::utils::{Activation, Cost, SimpleRng};

/// Dense layer with weights, biases and momentum velocities.
///
/// # Fields
///
/// * `weights` - `input_size × output_size`
/// * `biases` - `1 × output_size`
/// * `weight_velocities`, `bias_velocities` - same shapes, start at zero
/// * `activation` - applied to the weighted input
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    weights: Matrix,
    biases: Matrix,
    weight_velocities: Matrix,
    bias_velocities: Matrix,
    activation: Activation,
}

/// Per-sample state recorded by a forward pass and filled in by the backward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerLearnCache {
    /// Position of the owning layer in its network.
    pub layer_index: usize,
    /// Row fed into the layer.
    pub input: Matrix,
    /// `input × W + B`, before activation.
    pub weighted_input: Matrix,
    /// Activated output.
    pub activated: Matrix,
    /// ∂cost/∂weighted_input, present once a gradient signal has been computed.
    pub gradient_signal: Option<Matrix>,
}

impl LayerLearnCache {
    fn signal(&self) -> &Matrix {
        match &self.gradient_signal {
            Some(signal) => signal,
            None => panic!(
                "gradient signal for layer {} has not been computed",
                self.layer_index
            ),
        }
    }
}

/// Cost gradients for one layer's weights and biases.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl LayerGradients {
    /// Zero gradients shaped like `layer`'s parameters.
    pub fn zeros_like(layer: &DenseLayer) -> Self {
        Self {
            weights: Matrix::new(layer.input_size(), layer.output_size()),
            biases: Matrix::new(1, layer.output_size()),
        }
    }
}

impl AddAssign<&LayerGradients> for LayerGradients {
    fn add_assign(&mut self, rhs: &LayerGradients) {
        self.weights += &rhs.weights;
        self.biases += &rhs.biases;
    }
}

impl DenseLayer {
    /// Build a layer from existing parameters with zero velocities.
    ///
    /// # Panics
    ///
    /// Panics if `biases` is not a single row as wide as `weights`.
    pub fn new(weights: Matrix, biases: Matrix, activation: Activation) -> Self {
        assert_eq!(biases.rows(), 1, "biases must be a single row");
        assert_eq!(
            weights.cols(),
            biases.cols(),
            "weights and biases must have the same column count"
        );
        Self {
            weight_velocities: Matrix::new(weights.rows(), weights.cols()),
            bias_velocities: Matrix::new(1, biases.cols()),
            weights,
            biases,
            activation,
        }
    }

    /// Layer with weights and biases drawn from the standard normal distribution.
    ///
    /// # Example
    ///
    /// ```
    /// use mlp_trainer::layers::DenseLayer;
    /// use mlp_trainer::utils::{Activation, SimpleRng};
    ///
    /// let mut rng = SimpleRng::new(42);
    /// let layer = DenseLayer::random(784, 200, Activation::Sigmoid, &mut rng);
    /// assert_eq!(layer.input_size(), 784);
    /// assert_eq!(layer.output_size(), 200);
    /// ```
    pub fn random(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut SimpleRng,
    ) -> Self {
        let weights = Matrix::random_normal(input_size, output_size, rng);
        let biases = Matrix::random_normal(1, output_size, rng);
        Self::new(weights, biases, activation)
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows()
    }

    pub fn output_size(&self) -> usize {
        self.weights.cols()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    pub fn weight_velocities(&self) -> &Matrix {
        &self.weight_velocities
    }

    pub fn bias_velocities(&self) -> &Matrix {
        &self.bias_velocities
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    pub fn parameter_count(&self) -> usize {
        self.weights.as_slice().len() + self.biases.as_slice().len()
    }

    fn weighted_input(&self, input: &Matrix) -> Matrix {
        let mut z = input.matmul(&self.weights);
        z += &self.biases;
        z
    }

    /// Forward pass without recording anything.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        self.activation.activate(&self.weighted_input(input))
    }

    /// Forward pass that records the values the backward pass needs.
    ///
    /// `layer_index` is this layer's position in its network.
    pub fn feed_forward(&self, layer_index: usize, input: &Matrix) -> (Matrix, LayerLearnCache) {
        let weighted_input = self.weighted_input(input);
        let activated = self.activation.activate(&weighted_input);
        let cache = LayerLearnCache {
            layer_index,
            input: input.clone(),
            weighted_input,
            activated: activated.clone(),
            gradient_signal: None,
        };
        (activated, cache)
    }

    /// δ = cost'(activated, expected) ⊙ activation'(weighted_input).
    ///
    /// Only meaningful for the last layer of a network.
    pub fn output_gradient_signal(&self, cache: &mut LayerLearnCache, cost: Cost, expected: &Matrix) {
        let mut signal = self.activation.derivative(&cache.weighted_input);
        signal.hadamard_in_place(&cost.derivative(&cache.activated, expected));
        cache.gradient_signal = Some(signal);
    }

    /// δ = (δ_next × W_nextᵀ) ⊙ activation'(weighted_input).
    ///
    /// # Panics
    ///
    /// Panics if `next_cache` has no gradient signal yet.
    pub fn hidden_gradient_signal(
        &self,
        cache: &mut LayerLearnCache,
        next_layer: &DenseLayer,
        next_cache: &LayerLearnCache,
    ) {
        let mut signal = next_cache.signal().matmul(&next_layer.weights.transpose());
        signal.hadamard_in_place(&self.activation.derivative(&cache.weighted_input));
        cache.gradient_signal = Some(signal);
    }

    /// Weight gradient `inputᵀ × δ` and bias gradient `δ`.
    ///
    /// # Panics
    ///
    /// Panics if no gradient signal was computed for `cache`.
    pub fn extract_gradients(&self, cache: &LayerLearnCache) -> LayerGradients {
        let signal = cache.signal();
        LayerGradients {
            weights: cache.input.transpose().matmul(signal),
            biases: signal.clone(),
        }
    }

    /// Apply already-summed gradients with momentum and weight decay.
    pub fn apply_gradients(&mut self, gradients: LayerGradients, optimizer: &MomentumSgd) {
        optimizer.update_weights(&mut self.weights, &mut self.weight_velocities, gradients.weights);
        optimizer.update_biases(&mut self.biases, &mut self.bias_velocities, gradients.biases);
    }
}
