//! Cost functions comparing a network output row against the expected row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::matrix::Matrix;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cost {
    /// `0.5 * (a - e)^2` per element.
    #[default]
    MeanSquared,
}

impl Cost {
    pub const ALL: [Cost; 1] = [Cost::MeanSquared];

    /// Elementwise cost of `actual` against `expected`.
    pub fn cost(self, actual: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            Cost::MeanSquared => actual.merge(expected, |a, e| 0.5 * (a - e) * (a - e)),
        }
    }

    /// Elementwise derivative of the cost with respect to `actual`.
    pub fn derivative(self, actual: &Matrix, expected: &Matrix) -> Matrix {
        match self {
            Cost::MeanSquared => actual - expected,
        }
    }

    /// Cost summed over every element.
    pub fn total(self, actual: &Matrix, expected: &Matrix) -> f64 {
        self.cost(actual, expected).sum()
    }

    pub fn name(self) -> &'static str {
        match self {
            Cost::MeanSquared => "mean_squared",
        }
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Cost {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Cost::ALL
            .into_iter()
            .find(|c| c.name() == lowered)
            .ok_or_else(|| NetworkError::invalid_config(format!("Invalid cost function '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_squared_cost() {
        let a = Matrix::row_vector(vec![1.0, 0.0, 0.5]);
        let e = Matrix::row_vector(vec![0.0, 0.0, 1.0]);
        assert_eq!(Cost::MeanSquared.cost(&a, &e).as_slice(), &[0.5, 0.0, 0.125]);
        assert_eq!(Cost::MeanSquared.total(&a, &e), 0.625);
    }

    #[test]
    fn test_mean_squared_derivative() {
        let a = Matrix::row_vector(vec![1.0, 0.0, 0.5]);
        let e = Matrix::row_vector(vec![0.0, 0.0, 1.0]);
        assert_eq!(Cost::MeanSquared.derivative(&a, &e).as_slice(), &[1.0, 0.0, -0.5]);
    }

    #[test]
    fn test_parse() {
        assert_eq!("mean_squared".parse::<Cost>().unwrap(), Cost::MeanSquared);
        assert!("cross_entropy".parse::<Cost>().is_err());
    }
}
