//! Architecture configuration structures
//!
//! Describes the network shape as a list of layer widths plus the
//! activation used by hidden layers and the one used by the output layer.
//! Can be loaded from JSON so shapes can be changed without code changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::network::NeuralNetwork;
use crate::utils::{Activation, SimpleRng};

/// Network shape.
///
/// # Example
///
/// ```json
/// {
///   "layer_sizes": [784, 200, 80, 10],
///   "intermediate_activation": "sigmoid",
///   "output_activation": "softmax"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchitectureConfig {
    /// Input width, hidden widths, output width
    pub layer_sizes: Vec<usize>,

    /// Activation of every layer except the last
    pub intermediate_activation: Activation,

    /// Activation of the last layer
    pub output_activation: Activation,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            layer_sizes: vec![784, 200, 80, 10],
            intermediate_activation: Activation::Sigmoid,
            output_activation: Activation::Softmax,
        }
    }
}

impl ArchitectureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.layer_sizes.len() < 2 {
            return Err(NetworkError::invalid_config(
                "layer_sizes needs at least an input and an output width",
            ));
        }
        if let Some(pos) = self.layer_sizes.iter().position(|&w| w == 0) {
            return Err(NetworkError::invalid_config(format!(
                "layer_sizes[{}] must be non-zero",
                pos
            )));
        }
        Ok(())
    }

    /// Randomly initialized network with this shape.
    pub fn build_network(&self, rng: &mut SimpleRng) -> Result<NeuralNetwork> {
        self.validate()?;
        NeuralNetwork::random(
            &self.layer_sizes,
            self.intermediate_activation,
            self.output_activation,
            rng,
        )
    }

    /// Whether `network` has exactly this shape and these activations.
    pub fn matches(&self, network: &NeuralNetwork) -> bool {
        let mut sizes = vec![network.input_size()];
        sizes.extend(network.layers().iter().map(|l| l.output_size()));
        let last = network.layer_count() - 1;
        sizes == self.layer_sizes
            && network.layers().iter().enumerate().all(|(i, layer)| {
                let expected = if i == last {
                    self.output_activation
                } else {
                    self.intermediate_activation
                };
                layer.activation() == expected
            })
    }
}

/// Parse a comma separated width list such as `784,200,10`.
pub fn parse_layer_sizes(text: &str) -> Result<Vec<usize>> {
    text.split(',')
        .map(|part| {
            part.trim().parse::<usize>().map_err(|e| {
                NetworkError::invalid_config(format!("invalid layer width '{}': {}", part.trim(), e))
            })
        })
        .collect()
}

/// Loads an architecture configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use mlp_trainer::architecture::load_architecture;
///
/// let arch = load_architecture("config/mnist.json").unwrap();
/// assert!(arch.layer_sizes.len() >= 2);
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}
