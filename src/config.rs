//! Configuration structures for training
//!
//! [`TrainParameters`] is the immutable per-run configuration shared by the
//! trainer, the worker jobs and the parameter update rule. It can be parsed
//! from a JSON file; missing fields fall back to defaults.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};
use crate::utils::Cost;

/// Training hyperparameters.
///
/// # Example
///
/// ```json
/// {
///   "cost": "mean_squared",
///   "learn_rate": 0.05,
///   "momentum": 0.5,
///   "regularization": 0.0,
///   "num_threads": 8,
///   "num_epochs": 3,
///   "train_batch_size": 10,
///   "test_batch_size": 100,
///   "input_scale": 255.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainParameters {
    /// Cost function used for the output gradient signal and loss reporting
    pub cost: Cost,

    /// Step size of each parameter update
    pub learn_rate: f64,

    /// Fraction of the previous velocity carried into the next update
    pub momentum: f64,

    /// L2 weight decay coefficient (weights only, never biases)
    pub regularization: f64,

    /// Worker threads used to process partitions of a batch
    pub num_threads: usize,

    /// Full passes over the training data
    pub num_epochs: usize,

    /// Samples per gradient update
    pub train_batch_size: usize,

    /// Samples per evaluation batch
    pub test_batch_size: usize,

    /// Every raw input value is divided by this before the forward pass
    pub input_scale: f64,
}

impl Default for TrainParameters {
    fn default() -> Self {
        Self {
            cost: Cost::MeanSquared,
            learn_rate: 0.05,
            momentum: 0.5,
            regularization: 0.0,
            num_threads: default_thread_count(),
            num_epochs: 1,
            train_batch_size: 10,
            test_batch_size: 100,
            input_scale: 255.0,
        }
    }
}

fn default_thread_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl TrainParameters {
    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if !(self.learn_rate.is_finite() && self.learn_rate > 0.0) {
            return Err(NetworkError::invalid_config("learn_rate must be positive"));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(NetworkError::invalid_config("momentum must be in [0, 1)"));
        }
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(NetworkError::invalid_config(
                "regularization must be non-negative",
            ));
        }
        if self.num_threads == 0 {
            return Err(NetworkError::invalid_config("num_threads must be positive"));
        }
        if self.num_epochs == 0 {
            return Err(NetworkError::invalid_config("num_epochs must be positive"));
        }
        if self.train_batch_size == 0 || self.test_batch_size == 0 {
            return Err(NetworkError::invalid_config("batch sizes must be positive"));
        }
        if !(self.input_scale.is_finite() && self.input_scale > 0.0) {
            return Err(NetworkError::invalid_config("input_scale must be positive"));
        }
        Ok(())
    }
}

impl fmt::Display for TrainParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ cost: {}, learn_rate: {}, momentum: {}, regularization: {}, num_threads: {}, \
             num_epochs: {}, train_batch_size: {}, test_batch_size: {}, input_scale: {} }}",
            self.cost,
            self.learn_rate,
            self.momentum,
            self.regularization,
            self.num_threads,
            self.num_epochs,
            self.train_batch_size,
            self.test_batch_size,
            self.input_scale
        )
    }
}

/// Loads training parameters from a JSON file.
///
/// Reads the file at `path`, deserializes it and validates the result.
///
/// # Examples
///
/// ```no_run
/// use mlp_trainer::config::load_config;
///
/// let params = load_config("config/train.json").unwrap();
/// assert!(params.learn_rate > 0.0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainParameters> {
    let contents = fs::read_to_string(path.as_ref())?;
    let params: TrainParameters = serde_json::from_str(&contents)?;
    params.validate()?;
    Ok(params)
}
