//! Activation functions for neural networks
//!
//! Every activation maps a `1 × n` row to a `1 × n` row. Sigmoid, tanh and
//! the clamped ReLU work element by element; softmax works over the whole
//! row. Derivatives are taken with respect to the pre-activation input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::matrix::Matrix;

/// Closed set of activations a layer can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    /// Clamps to `[0, 1]`, not the unbounded ReLU.
    Relu,
    Tanh,
    /// Row-wise softmax without max subtraction.
    Softmax,
}

impl Activation {
    pub const ALL: [Activation; 4] = [
        Activation::Sigmoid,
        Activation::Relu,
        Activation::Tanh,
        Activation::Softmax,
    ];

    /// Apply the activation to a single row.
    ///
    /// # Panics
    ///
    /// Panics if `row` has more than one row.
    pub fn activate(self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows(), 1, "activations operate on a single row");
        match self {
            Activation::Sigmoid => row.map(sigmoid),
            Activation::Relu => row.map(|x| x.clamp(0.0, 1.0)),
            Activation::Tanh => row.map(f64::tanh),
            Activation::Softmax => {
                let exp_sum: f64 = row.as_slice().iter().map(|x| x.exp()).sum();
                row.map(|x| x.exp() / exp_sum)
            }
        }
    }

    /// Derivative of the activation evaluated at the weighted input `row`.
    ///
    /// # Panics
    ///
    /// Panics if `row` has more than one row.
    pub fn derivative(self, row: &Matrix) -> Matrix {
        assert_eq!(row.rows(), 1, "activations operate on a single row");
        match self {
            Activation::Sigmoid => row.map(|x| {
                let a = sigmoid(x);
                a * (1.0 - a)
            }),
            // Constant slope, even where the clamp is flat.
            Activation::Relu => row.map(|_| 1.0),
            Activation::Tanh => row.map(|x| {
                let t = x.tanh();
                1.0 - t * t
            }),
            // Diagonal of the Jacobian only: (e^x * S - e^x * e^x) / S^2
            Activation::Softmax => {
                let exp_sum: f64 = row.as_slice().iter().map(|x| x.exp()).sum();
                row.map(|x| {
                    let ex = x.exp();
                    (ex * exp_sum - ex * ex) / (exp_sum * exp_sum)
                })
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Relu => "relu",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Activation::ALL
            .into_iter()
            .find(|a| a.name() == lowered)
            .ok_or_else(|| {
                let valid: Vec<&str> = Activation::ALL.iter().map(|a| a.name()).collect();
                NetworkError::invalid_config(format!(
                    "Invalid activation function '{}'. Must be one of: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
