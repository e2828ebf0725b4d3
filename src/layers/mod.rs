//! Layer abstractions for neural networks
//!
//! Only fully connected layers are provided.

pub mod dense;

pub use dense::{DenseLayer, LayerGradients, LayerLearnCache};
