//! Shared utilities for neural network implementations
//!
//! Random number generation, activation functions and cost functions.

pub mod activations;
pub mod cost;
pub mod rng;

pub use activations::Activation;
pub use cost::Cost;
pub use rng::SimpleRng;
