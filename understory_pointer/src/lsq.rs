// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weighted least-squares polynomial fitting.
//!
//! [`LeastSquaresSolver`] fits `y ≈ c0 + c1·x + … + cn·xⁿ` to weighted samples
//! by QR-decomposing the weighted Vandermonde matrix with the Gram–Schmidt
//! process and back-substituting. Degenerate inputs (too few samples, or a
//! basis vector that collapses to zero because the `x` values do not vary
//! enough) produce `None` rather than a NaN-laden fit.
//!
//! ```rust
//! use understory_pointer::LeastSquaresSolver;
//!
//! let x = [0.0, 1.0, 2.0, 3.0];
//! let y = [1.0, 3.0, 5.0, 7.0];
//! let w = [1.0; 4];
//! let fit = LeastSquaresSolver::new(&x, &y, &w).solve(1).unwrap();
//! assert!((fit.coefficients[0] - 1.0).abs() < 1e-9);
//! assert!((fit.coefficients[1] - 2.0).abs() < 1e-9);
//! ```

use alloc::vec;
use alloc::vec::Vec;

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use smallvec::SmallVec;

/// Norms below this are treated as a linearly dependent basis vector.
const PRECISION_TOLERANCE: f64 = 1e-10;

/// Result of a successful fit.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialFit {
    /// Coefficients, lowest order first.
    pub coefficients: SmallVec<[f64; 4]>,
    /// Weighted coefficient of determination in `[0, 1]` for well-behaved data.
    pub confidence: f64,
}

impl PolynomialFit {
    /// Evaluates the polynomial at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Evaluates the first derivative at `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        let mut acc = 0.0;
        for (power, c) in self.coefficients.iter().enumerate().skip(1).rev() {
            acc = acc * x + c * power as f64;
        }
        acc
    }
}

/// Weighted least-squares solver over borrowed sample slices.
#[derive(Clone, Copy, Debug)]
pub struct LeastSquaresSolver<'a> {
    x: &'a [f64],
    y: &'a [f64],
    w: &'a [f64],
}

/// Row-major `rows × cols` matrix.
struct Matrix {
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(a, b)| a * b).sum()
}

impl<'a> LeastSquaresSolver<'a> {
    /// Creates a solver for samples `(x[i], y[i])` weighted by `w[i]`.
    pub fn new(x: &'a [f64], y: &'a [f64], w: &'a [f64]) -> Self {
        Self { x, y, w }
    }

    /// Fits a polynomial of the given degree.
    ///
    /// Returns `None` when there are fewer than `degree + 1` samples, when the
    /// slices disagree in length, or when the data is numerically degenerate.
    pub fn solve(&self, degree: usize) -> Option<PolynomialFit> {
        let m = self.x.len();
        let n = degree + 1;
        if m < n || self.y.len() != m || self.w.len() != m {
            return None;
        }

        // Weighted Vandermonde matrix, one basis function per row.
        let mut a = Matrix::new(n, m);
        for h in 0..m {
            a.set(0, h, self.w[h]);
            for i in 1..n {
                a.set(i, h, a.get(i - 1, h) * self.x[h]);
            }
        }

        // Gram–Schmidt: Q has orthonormal rows, R is upper triangular.
        let mut q = Matrix::new(n, m);
        let mut r = Matrix::new(n, n);
        for j in 0..n {
            q.row_mut(j).copy_from_slice(a.row(j));
            for i in 0..j {
                let d = dot(q.row(j), q.row(i));
                for h in 0..m {
                    let qi = q.get(i, h);
                    q.set(j, h, q.get(j, h) - d * qi);
                }
            }

            let norm = dot(q.row(j), q.row(j)).sqrt();
            if norm.is_nan() || norm < PRECISION_TOLERANCE {
                return None;
            }
            let inverse = 1.0 / norm;
            for value in q.row_mut(j) {
                *value *= inverse;
            }
            for i in j..n {
                r.set(j, i, dot(q.row(j), a.row(i)));
            }
        }

        // Solve R·c = Qᵀ·W·y by back substitution.
        let wy: Vec<f64> = self.y.iter().zip(self.w).map(|(y, w)| y * w).collect();
        let mut coefficients: SmallVec<[f64; 4]> = SmallVec::from_elem(0.0, n);
        for i in (0..n).rev() {
            let mut c = dot(q.row(i), &wy);
            for j in (i + 1)..n {
                c -= r.get(i, j) * coefficients[j];
            }
            coefficients[i] = c / r.get(i, i);
        }
        if coefficients.iter().any(|c| !c.is_finite()) {
            return None;
        }

        let confidence = self.confidence(&coefficients);
        Some(PolynomialFit {
            coefficients,
            confidence,
        })
    }

    fn confidence(&self, coefficients: &[f64]) -> f64 {
        let m = self.x.len();
        let mean = self.y.iter().sum::<f64>() / m as f64;
        let mut squared_error = 0.0;
        let mut squared_total = 0.0;
        for h in 0..m {
            let mut term = 1.0;
            let mut err = self.y[h] - coefficients[0];
            for c in &coefficients[1..] {
                term *= self.x[h];
                err -= term * c;
            }
            let w2 = self.w[h] * self.w[h];
            squared_error += w2 * err * err;
            let v = self.y[h] - mean;
            squared_total += w2 * v * v;
        }
        if squared_total <= PRECISION_TOLERANCE {
            1.0
        } else {
            1.0 - squared_error / squared_total
        }
    }
}
