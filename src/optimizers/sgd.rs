//! Momentum stochastic gradient descent with decoupled L2 weight decay
//!
//! For a parameter `p` with velocity `v` and gradient `g`:
//!
//! ```text
//! v = v * momentum - g * learn_rate
//! p = p * decay + v          decay = 1 - regularization * learn_rate
//! ```
//!
//! Biases are stepped with `decay = 1`.

use crate::config::TrainParameters;
use crate::matrix::Matrix;

/// Update rule shared by every layer for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumSgd {
    learn_rate: f64,
    momentum: f64,
    regularization: f64,
}

impl MomentumSgd {
    /// Creates an optimizer with explicit coefficients.
    ///
    /// # Examples
    ///
    /// ```
    /// use mlp_trainer::optimizers::MomentumSgd;
    ///
    /// let optimizer = MomentumSgd::new(0.01, 0.0, 0.0);
    /// assert_eq!(optimizer.learn_rate(), 0.01);
    /// ```
    pub fn new(learn_rate: f64, momentum: f64, regularization: f64) -> Self {
        Self {
            learn_rate,
            momentum,
            regularization,
        }
    }

    pub fn from_params(params: &TrainParameters) -> Self {
        Self::new(params.learn_rate, params.momentum, params.regularization)
    }

    pub fn learn_rate(&self) -> f64 {
        self.learn_rate
    }

    /// Multiplier applied to weights before the velocity is added.
    pub fn weight_decay(&self) -> f64 {
        1.0 - self.regularization * self.learn_rate
    }

    /// Step a weight matrix, applying the regularization decay.
    pub fn update_weights(&self, weights: &mut Matrix, velocity: &mut Matrix, gradient: Matrix) {
        self.step(weights, velocity, gradient, self.weight_decay());
    }

    /// Step a bias row; biases are never decayed.
    pub fn update_biases(&self, biases: &mut Matrix, velocity: &mut Matrix, gradient: Matrix) {
        self.step(biases, velocity, gradient, 1.0);
    }

    fn step(&self, parameters: &mut Matrix, velocity: &mut Matrix, mut gradient: Matrix, decay: f64) {
        assert_eq!(
            parameters.shape(),
            gradient.shape(),
            "Parameters and gradients must have the same shape"
        );
        gradient *= self.learn_rate;
        *velocity *= self.momentum;
        *velocity -= &gradient;
        if decay != 1.0 {
            *parameters *= decay;
        }
        *parameters += &*velocity;
    }
}
