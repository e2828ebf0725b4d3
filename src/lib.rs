//! Feed-forward neural network trainer
//!
//! Dense matrix arithmetic, fully connected layers with pluggable
//! activations, backpropagation, momentum gradient descent with weight
//! decay, and mini-batch training spread over a worker pool.
//!
//! # Modules
//!
//! - `matrix`: dense `f64` matrix
//! - `utils`: activations, cost functions, RNG
//! - `layers`: dense layer, per-sample caches, gradient pairs
//! - `optimizers`: momentum SGD update rule
//! - `network`: layer stack, forward and backward passes
//! - `pool`: fixed-size worker thread pool
//! - `trainer`: partitioned batch training and evaluation
//! - `io`: CSV samples and binary checkpoints
//! - `config`: training hyperparameters
//! - `architecture`: network shape configuration

pub mod architecture;
pub mod config;
pub mod error;
pub mod io;
pub mod layers;
pub mod matrix;
pub mod network;
pub mod optimizers;
pub mod pool;
pub mod trainer;
pub mod utils;

pub use error::{NetworkError, Result};
pub use matrix::Matrix;
pub use network::NeuralNetwork;
