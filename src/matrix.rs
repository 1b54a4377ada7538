//! Dense square matrices and the deterministic operand factory.
//!
//! Every benchmark run multiplies the same pair of inputs:
//!
//! * `A` holds `1.0` in every cell.
//! * `B` holds `i + 1` in every cell of row `i`.
//!
//! With these operands every cell of `C = A * B` equals `n(n+1)/2`, which gives
//! a closed-form oracle ([`expected_entry`]) for checking any kernel.
//!
//! Matrices are stored **row-major**: element `(i, j)` lives at `i * n + j`.

use log::debug;
use ndarray::ArrayView2;

use crate::error::{allocation_error, Result};

/// Calculates the 1D index for a 2D element in a row-major square matrix.
#[inline(always)]
pub fn at(i: usize, j: usize, n: usize) -> usize {
    i * n + j
}

/// An owned, contiguous `n x n` matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    n: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Allocates an `n x n` matrix and fills cell `(i, j)` with `fill(i, j)`.
    ///
    /// Allocation goes through `try_reserve_exact`, so an impossible request
    /// surfaces as [`MatprodError::AllocationError`](crate::error::MatprodError)
    /// instead of aborting inside the allocator.
    pub fn from_fn(n: usize, fill: impl Fn(usize, usize) -> f64) -> Result<Self> {
        let len = n
            .checked_mul(n)
            .ok_or_else(|| allocation_error(usize::MAX, format!("{n}x{n} overflows usize")))?;
        let bytes = len.saturating_mul(std::mem::size_of::<f64>());

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| allocation_error(bytes, e.to_string()))?;
        debug!("allocated {n}x{n} matrix ({bytes} bytes)");

        for i in 0..n {
            data.extend((0..n).map(|j| fill(i, j)));
        }

        Ok(Matrix { n, data })
    }

    /// A zero-initialized result buffer.
    pub fn zeros(n: usize) -> Result<Self> {
        Self::from_fn(n, |_, _| 0.0)
    }

    /// Operand `A`: every cell is `1.0`.
    pub fn ones(n: usize) -> Result<Self> {
        Self::from_fn(n, |_, _| 1.0)
    }

    /// Operand `B`: every cell of row `i` is `i + 1`.
    pub fn row_constant(n: usize) -> Result<Self> {
        Self::from_fn(n, |i, _| (i + 1) as f64)
    }

    /// Side length of the matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Element `(i, j)`. Panics if either index is out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(
            i < self.n && j < self.n,
            "index ({i}, {j}) out of bounds for {n}x{n} matrix",
            n = self.n
        );
        self.data[at(i, j, self.n)]
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    /// The first `min(len, n)` entries of row 0.
    pub fn preview(&self, len: usize) -> Vec<f64> {
        if self.n == 0 {
            return Vec::new();
        }
        self.row(0)[..len.min(self.n)].to_vec()
    }

    /// Borrows the buffer as an `ndarray` view with shape `(n, n)`.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        ArrayView2::from_shape((self.n, self.n), &self.data)
            .expect("matrix buffer always holds n * n elements")
    }
}

/// Builds the `(A, B)` operand pair for dimension `n`.
pub fn operands(n: usize) -> Result<(Matrix, Matrix)> {
    Ok((Matrix::ones(n)?, Matrix::row_constant(n)?))
}

/// The value every cell of `A * B` must hold: `n(n+1)/2`.
pub fn expected_entry(n: usize) -> f64 {
    let n = n as f64;
    n * (n + 1.0) / 2.0
}

/// Largest relative deviation of any cell of `c` from [`expected_entry`].
pub fn max_relative_error(c: &Matrix) -> f64 {
    let expected = expected_entry(c.dim());
    c.as_slice()
        .iter()
        .map(|&x| ((x - expected) / expected).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ones_fill() {
        let a = Matrix::ones(3).unwrap();
        assert_eq!(a.dim(), 3);
        assert_eq!(a.as_slice(), &[1.0; 9]);
    }

    #[test]
    fn test_row_constant_fill() {
        let b = Matrix::row_constant(3).unwrap();
        assert_eq!(
            b.as_slice(),
            &[1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]
        );
        assert_eq!(b.get(2, 0), 3.0);
        assert_eq!(b.row(1), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_operands_share_dimension() {
        let (a, b) = operands(5).unwrap();
        assert_eq!(a.dim(), 5);
        assert_eq!(b.dim(), 5);
        assert_eq!(a.as_slice().len(), 25);
        assert_eq!(b.as_slice().len(), 25);
    }

    #[test]
    fn test_preview_truncates() {
        let b = Matrix::row_constant(20).unwrap();
        assert_eq!(b.preview(10).len(), 10);
        assert_eq!(Matrix::zeros(3).unwrap().preview(10), vec![0.0; 3]);
    }

    #[test]
    fn test_view_shape() {
        let b = Matrix::row_constant(4).unwrap();
        let view = b.view();
        assert_eq!(view.shape(), &[4, 4]);
        assert_eq!(view[[3, 1]], 4.0);
    }

    #[test]
    fn test_expected_entry() {
        assert_eq!(expected_entry(1), 1.0);
        assert_eq!(expected_entry(2), 3.0);
        assert_eq!(expected_entry(3), 6.0);
        assert_eq!(expected_entry(500), 125_250.0);
    }

    #[test]
    fn test_max_relative_error() {
        let exact = Matrix::from_fn(2, |_, _| 3.0).unwrap();
        assert_eq!(max_relative_error(&exact), 0.0);

        let off = Matrix::from_fn(2, |i, j| if i == 1 && j == 1 { 3.3 } else { 3.0 }).unwrap();
        assert!((max_relative_error(&off) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_overflowing_dimension_is_allocation_error() {
        let err = Matrix::zeros(usize::MAX).unwrap_err();
        assert!(matches!(
            err,
            crate::error::MatprodError::AllocationError { .. }
        ));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        Matrix::zeros(2).unwrap().get(2, 0);
    }
}
