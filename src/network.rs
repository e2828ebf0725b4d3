//! Feed-forward network: an ordered stack of dense layers
//!
//! `infer`, `feed_forward` and `back_propagate` only read the network, so a
//! shared `Arc<NeuralNetwork>` can serve many worker threads at once.
//! `apply_gradients` is the only mutation and happens once per batch.

use crate::config::TrainParameters;
use crate::error::{NetworkError, Result};
use crate::io::checkpoint::{LayerCheckpoint, ModelCheckpoint};
use crate::layers::{DenseLayer, LayerGradients, LayerLearnCache};
use crate::matrix::Matrix;
use crate::optimizers::MomentumSgd;
use crate::utils::{Activation, Cost, SimpleRng};

#[derive(Debug, Clone, PartialEq)]
pub struct NeuralNetwork {
    layers: Vec<DenseLayer>,
}

/// One [`LayerLearnCache`] per layer, index-aligned with the network.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkLearnCache {
    pub layer_caches: Vec<LayerLearnCache>,
}

impl NeuralNetwork {
    /// Build a network from layers, checking that adjacent widths agree.
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(NetworkError::dimension_mismatch("network needs at least one layer"));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(NetworkError::dimension_mismatch(format!(
                    "layer {} has output width {}, while layer {} has input width {}",
                    i,
                    pair[0].output_size(),
                    i + 1,
                    pair[1].input_size()
                )));
            }
        }
        Ok(Self { layers })
    }

    /// Randomly initialized network for the given widths.
    ///
    /// `layer_sizes = [784, 200, 10]` yields two layers, 784→200 and 200→10.
    /// Every layer but the last uses `intermediate`; the last uses `output`.
    pub fn random(
        layer_sizes: &[usize],
        intermediate: Activation,
        output: Activation,
        rng: &mut SimpleRng,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(NetworkError::invalid_config(
                "layer_sizes needs at least an input and an output width",
            ));
        }
        if let Some(pos) = layer_sizes.iter().position(|&w| w == 0) {
            return Err(NetworkError::invalid_config(format!(
                "layer_sizes[{}] must be non-zero",
                pos
            )));
        }
        let last = layer_sizes.len() - 2;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let activation = if i == last { output } else { intermediate };
                DenseLayer::random(w[0], w[1], activation, rng)
            })
            .collect();
        Self::from_layers(layers)
    }

    /// Rebuild a network from a checkpoint. Velocities start at zero.
    pub fn from_checkpoint(checkpoint: &ModelCheckpoint) -> Result<Self> {
        checkpoint.validate()?;
        let layers = checkpoint
            .layers
            .iter()
            .map(|layer| {
                let rows = layer.row_count as usize;
                let cols = layer.col_count as usize;
                DenseLayer::new(
                    Matrix::from_vec(rows, cols, layer.weights.clone()),
                    Matrix::from_vec(1, cols, layer.biases.clone()),
                    layer.activation,
                )
            })
            .collect();
        Self::from_layers(layers)
    }

    pub fn to_checkpoint(&self) -> ModelCheckpoint {
        let layers = self
            .layers
            .iter()
            .map(|layer| LayerCheckpoint {
                row_count: layer.input_size() as u32,
                col_count: layer.output_size() as u32,
                activation: layer.activation(),
                weights: layer.weights().as_slice().to_vec(),
                biases: layer.biases().as_slice().to_vec(),
            })
            .collect();
        ModelCheckpoint::new(layers)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer(&self, index: usize) -> &DenseLayer {
        &self.layers[index]
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    /// Forward pass with no bookkeeping.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        self.layers
            .iter()
            .fold(input.clone(), |value, layer| layer.infer(&value))
    }

    /// Forward pass that keeps every layer's cache for `back_propagate`.
    pub fn feed_forward(&self, input: &Matrix) -> (Matrix, NetworkLearnCache) {
        let mut layer_caches = Vec::with_capacity(self.layers.len());
        let mut value = input.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            let (output, cache) = layer.feed_forward(i, &value);
            layer_caches.push(cache);
            value = output;
        }
        (value, NetworkLearnCache { layer_caches })
    }

    /// Gradient pairs for every layer, in forward order.
    ///
    /// The last layer's signal is computed from the cost; each earlier layer
    /// then receives its signal through the following layer's weights.
    ///
    /// # Panics
    ///
    /// Panics if `cache` was not produced by this network's `feed_forward`.
    pub fn back_propagate(
        &self,
        cache: &mut NetworkLearnCache,
        cost: Cost,
        expected_output: &Matrix,
    ) -> Vec<LayerGradients> {
        assert_eq!(
            cache.layer_caches.len(),
            self.layers.len(),
            "cache does not belong to this network"
        );
        let last = self.layers.len() - 1;
        let mut gradients = Vec::with_capacity(self.layers.len());

        self.layers[last].output_gradient_signal(&mut cache.layer_caches[last], cost, expected_output);
        gradients.push(self.layers[last].extract_gradients(&cache.layer_caches[last]));

        for i in (0..last).rev() {
            let (head, tail) = cache.layer_caches.split_at_mut(i + 1);
            self.layers[i].hidden_gradient_signal(&mut head[i], &self.layers[i + 1], &tail[0]);
            gradients.push(self.layers[i].extract_gradients(&head[i]));
        }

        gradients.reverse();
        gradients
    }

    /// Zero gradient pairs shaped like every layer, for accumulation.
    pub fn zero_gradients(&self) -> Vec<LayerGradients> {
        self.layers.iter().map(LayerGradients::zeros_like).collect()
    }

    /// Apply one batch's summed gradients to every layer.
    ///
    /// # Panics
    ///
    /// Panics if there is not exactly one gradient pair per layer.
    pub fn apply_gradients(&mut self, gradients: Vec<LayerGradients>, params: &TrainParameters) {
        assert_eq!(
            gradients.len(),
            self.layers.len(),
            "one gradient pair per layer required"
        );
        let optimizer = MomentumSgd::from_params(params);
        for (layer, gradient) in self.layers.iter_mut().zip(gradients) {
            layer.apply_gradients(gradient, &optimizer);
        }
    }
}
