//! Dense row-major matrix of `f64`
//!
//! The single numeric container used by every layer, cache entry and
//! gradient. Value-returning operations allocate a new matrix; the
//! `*_in_place` methods and the compound-assignment operators mutate.
//!
//! Shape mismatches are caller bugs and panic immediately. Nothing is
//! broadcast or truncated.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};

use crate::utils::SimpleRng;

/// Dense 2-D matrix stored in row-major order.
///
/// Invariant: `data.len() == rows * cols`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled matrix of the given shape.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Wrap row-major `data` as a `rows × cols` matrix.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "Matrix data length must equal rows * cols"
        );
        Self { rows, cols, data }
    }

    /// `1 × n` row vector.
    pub fn row_vector(data: Vec<f64>) -> Self {
        let cols = data.len();
        Self::from_vec(1, cols, data)
    }

    /// Matrix with every element drawn from the standard normal distribution.
    pub fn random_normal(rows: usize, cols: usize, rng: &mut SimpleRng) -> Self {
        let data = (0..rows * cols).map(|_| rng.next_normal()).collect();
        Self { rows, cols, data }
    }

    /// `1 × width` row with a single 1.0 at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= width`.
    pub fn one_hot(width: usize, index: usize) -> Self {
        assert!(index < width, "one-hot index {} out of range {}", index, width);
        let mut m = Self::new(1, width);
        m.data[index] = 1.0;
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major element slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Element at `(r, c)`.
    ///
    /// # Panics
    ///
    /// Panics when the position is outside the matrix.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[self.offset(r, c)]
    }

    /// Mutable element at `(r, c)`.
    ///
    /// # Panics
    ///
    /// Panics when the position is outside the matrix.
    pub fn get_mut(&mut self, r: usize, c: usize) -> &mut f64 {
        let offset = self.offset(r, c);
        &mut self.data[offset]
    }

    fn offset(&self, r: usize, c: usize) -> usize {
        assert!(
            r < self.rows && c < self.cols,
            "index ({}, {}) out of bounds for {}x{} matrix",
            r,
            c,
            self.rows,
            self.cols
        );
        r * self.cols + c
    }

    fn assert_same_shape(&self, other: &Matrix, op: &str) {
        assert!(
            self.shape() == other.shape(),
            "shape mismatch in {}: {}x{} vs {}x{}",
            op,
            self.rows,
            self.cols,
            other.rows,
            other.cols
        );
    }

    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix::new(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                result.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        result
    }

    /// Elementwise product.
    pub fn hadamard(&self, other: &Matrix) -> Matrix {
        self.merge(other, |a, b| a * b)
    }

    pub fn hadamard_in_place(&mut self, other: &Matrix) {
        self.assert_same_shape(other, "hadamard");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a *= b;
        }
    }

    /// Matrix product `self × other` (i-k-j loop order).
    ///
    /// # Panics
    ///
    /// Panics if `self.cols() != other.rows()`.
    pub fn matmul(&self, other: &Matrix) -> Matrix {
        assert_eq!(
            self.cols, other.rows,
            "matmul requires lhs cols == rhs rows ({}x{} * {}x{})",
            self.rows, self.cols, other.rows, other.cols
        );
        let mut result = Matrix::new(self.rows, other.cols);
        for i in 0..self.rows {
            let out_row = &mut result.data[i * other.cols..(i + 1) * other.cols];
            for k in 0..self.cols {
                let lhs = self.data[i * self.cols + k];
                let rhs_row = &other.data[k * other.cols..(k + 1) * other.cols];
                for (out, rhs) in out_row.iter_mut().zip(rhs_row) {
                    *out += lhs * rhs;
                }
            }
        }
        result
    }

    /// Apply `f` to every element.
    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| f(x)).collect(),
        }
    }

    /// Combine two equally shaped matrices element by element.
    pub fn merge<F>(&self, other: &Matrix, f: F) -> Matrix
    where
        F: Fn(f64, f64) -> f64,
    {
        self.assert_same_shape(other, "merge");
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Column index of the largest element of a single-row matrix.
    ///
    /// Ties resolve to the lowest index.
    ///
    /// # Panics
    ///
    /// Panics if the matrix is not a single row or has no columns.
    pub fn classify(&self) -> usize {
        assert_eq!(self.rows, 1, "classify requires a single-row matrix");
        assert!(self.cols > 0, "classify requires at least one column");
        let mut best = 0;
        for (i, &value) in self.data.iter().enumerate().skip(1) {
            if value > self.data[best] {
                best = i;
            }
        }
        best
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks(self.cols.max(1)).take(self.rows) {
            write!(f, "| ")?;
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:.6}", value)?;
            }
            writeln!(f, " |")?;
        }
        Ok(())
    }
}

impl Add<&Matrix> for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: &Matrix) -> Matrix {
        self.assert_same_shape(rhs, "add");
        self.merge(rhs, |a, b| a + b)
    }
}

impl AddAssign<&Matrix> for Matrix {
    fn add_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs, "add");
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }
}

impl Sub<&Matrix> for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: &Matrix) -> Matrix {
        self.assert_same_shape(rhs, "sub");
        self.merge(rhs, |a, b| a - b)
    }
}

impl SubAssign<&Matrix> for Matrix {
    fn sub_assign(&mut self, rhs: &Matrix) {
        self.assert_same_shape(rhs, "sub");
        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a -= b;
        }
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, scalar: f64) -> Matrix {
        self.map(|x| x * scalar)
    }
}

impl MulAssign<f64> for Matrix {
    fn mul_assign(&mut self, scalar: f64) {
        for x in self.data.iter_mut() {
            *x *= scalar;
        }
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &Matrix) -> Matrix {
        self.matmul(rhs)
    }
}
