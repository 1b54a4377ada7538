//! # Square Matrix Multiplication Kernels
//!
//! Five interchangeable ways of computing `C = A * B` for dense, row-major
//! `n x n` matrices of `f64`. They differ only in loop order, tiling and how
//! work is spread across threads:
//!
//! | Kernel                 | Loop nest           | Parallelism                         |
//! |------------------------|---------------------|-------------------------------------|
//! | [`matmul_naive`]       | `i, j, k`           | none                                |
//! | [`matmul_line`]        | `i, k, j`           | none                                |
//! | [`matmul_block`]       | tiled `i0, k0, j0`  | none                                |
//! | [`par_matmul_line`]    | `i, k, j`           | rows of `C` spread across the pool  |
//! | [`par_matmul_line_v2`] | `i, k, j`           | `j` range shared out per `(i, k)`   |
//!
//! Every kernel adds the `k` terms of a cell in increasing `k` order, so for the
//! same inputs they all produce bit-identical results, whatever the thread count.
//!
//! The parallel kernels use whatever Rayon pool they are called from; wrap the
//! call in [`rayon::ThreadPool::install`] to pin the worker count.

use std::cmp::min;
use std::fmt;

use log::debug;
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::{
    error::{dimension_mismatch, invalid_block_size, invalid_dimension, Result},
    matrix::{at, Matrix},
};

/// Panics unless all three buffers hold exactly `n * n` elements.
#[inline]
fn check_lengths(a: &[f64], b: &[f64], c: &[f64], n: usize) {
    let len = n * n;
    assert_eq!(a.len(), len, "A: expected {n}x{n}={len} elements");
    assert_eq!(b.len(), len, "B: expected {n}x{n}={len} elements");
    assert_eq!(c.len(), len, "C: expected {n}x{n}={len} elements");
}

/// Textbook `i-j-k` multiplication.
///
/// Each cell is summed in a local accumulator and stored once, so `c` does not
/// need to be zeroed beforehand. The innermost loop walks `B` down a column
/// (stride `n`), which thrashes the cache once a column no longer fits.
pub fn matmul_naive(a: &[f64], b: &[f64], c: &mut [f64], n: usize) {
    check_lengths(a, b, c, n);

    for i in 0..n {
        for j in 0..n {
            let mut temp = 0.0;
            for k in 0..n {
                temp += a[at(i, k, n)] * b[at(k, j, n)];
            }
            c[at(i, j, n)] = temp;
        }
    }
}

/// Accumulates one row of `C`: `c_row += a_row * B` in `k-j` order.
///
/// `B` and `c_row` are both walked with stride 1.
#[inline(always)]
fn line_row(a_row: &[f64], b: &[f64], c_row: &mut [f64], n: usize) {
    for (k, &a_ik) in a_row.iter().enumerate() {
        let b_row = &b[k * n..(k + 1) * n];
        for (c_ij, &b_kj) in c_row.iter_mut().zip(b_row) {
            *c_ij += a_ik * b_kj;
        }
    }
}

/// Line multiplication (`i-k-j` order): `C += A * B`.
///
/// Swapping the two inner loops makes every access to `B` and `C` sequential,
/// at the price of reading and writing `C[i][j]` on every `k` step instead of
/// keeping it in a register. `c` must be zeroed to obtain `A * B`.
pub fn matmul_line(a: &[f64], b: &[f64], c: &mut [f64], n: usize) {
    check_lengths(a, b, c, n);
    if n == 0 {
        return;
    }

    for (a_row, c_row) in a.chunks_exact(n).zip(c.chunks_exact_mut(n)) {
        line_row(a_row, b, c_row, n);
    }
}

/// Cache-blocked line multiplication: `C += A * B`.
///
/// The `i`, `k` and `j` ranges are cut into tiles of `block_size` so that the
/// active tiles of `A`, `B` and `C` stay resident while they are reused. Edge
/// tiles are clipped with `min(start + block_size, n)`, so `block_size` does
/// not have to divide `n`.
///
/// # Panics
///
/// Panics if `block_size` is zero.
pub fn matmul_block(a: &[f64], b: &[f64], c: &mut [f64], n: usize, block_size: usize) {
    check_lengths(a, b, c, n);
    assert!(block_size > 0, "block_size must be positive");

    for i0 in (0..n).step_by(block_size) {
        let i_end = min(i0 + block_size, n);
        for k0 in (0..n).step_by(block_size) {
            let k_end = min(k0 + block_size, n);
            for j0 in (0..n).step_by(block_size) {
                let j_end = min(j0 + block_size, n);

                for i in i0..i_end {
                    for k in k0..k_end {
                        let a_ik = a[at(i, k, n)];
                        for j in j0..j_end {
                            c[at(i, j, n)] += a_ik * b[at(k, j, n)];
                        }
                    }
                }
            }
        }
    }
}

/// Line multiplication with the outer `i` loop spread across Rayon workers.
///
/// `C` is split into its rows with `par_chunks_mut`, so each row has exactly one
/// writer and no locking is needed. `A` and `B` are shared read-only.
pub fn par_matmul_line(a: &[f64], b: &[f64], c: &mut [f64], n: usize) {
    check_lengths(a, b, c, n);
    if n == 0 {
        return;
    }

    c.par_chunks_mut(n)
        .enumerate()
        .for_each(|(i, c_row)| line_row(&a[i * n..(i + 1) * n], b, c_row, n));
}

/// Line multiplication with the innermost `j` loop shared out across workers.
///
/// The `i` and `k` loops stay on the calling thread; for every `(i, k)` pair the
/// row `C[i][..]` is cut into one column range per worker and each range is
/// updated by a single task. This synchronises `n²` times per call, which is
/// the overhead this variant exists to show.
pub fn par_matmul_line_v2(a: &[f64], b: &[f64], c: &mut [f64], n: usize) {
    check_lengths(a, b, c, n);
    if n == 0 {
        return;
    }

    let chunk_len = n.div_ceil(rayon::current_num_threads()).max(1);
    debug!(
        "line v2: {} workers, column chunks of {chunk_len}",
        rayon::current_num_threads()
    );

    for (a_row, c_row) in a.chunks_exact(n).zip(c.chunks_exact_mut(n)) {
        for (k, &a_ik) in a_row.iter().enumerate() {
            let b_row = &b[k * n..(k + 1) * n];
            c_row
                .par_chunks_mut(chunk_len)
                .zip(b_row.par_chunks(chunk_len))
                .for_each(|(c_part, b_part)| {
                    for (c_ij, &b_kj) in c_part.iter_mut().zip(b_part) {
                        *c_ij += a_ik * b_kj;
                    }
                });
        }
    }
}

/// Checks a user-supplied dimension and converts it to `usize`.
pub fn validate_dimension(dimension: i64) -> Result<usize> {
    if dimension <= 0 {
        return Err(invalid_dimension(dimension));
    }
    usize::try_from(dimension).map_err(|_| invalid_dimension(dimension))
}

/// Checks a user-supplied block size against the dimension it will tile.
pub fn validate_block_size(block_size: i64, n: usize) -> Result<usize> {
    match usize::try_from(block_size) {
        Ok(size) if (1..=n).contains(&size) => Ok(size),
        _ => Err(invalid_block_size(block_size, n)),
    }
}

/// One of the multiplication strategies, selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// [`matmul_naive`]
    Naive,
    /// [`matmul_line`]
    Line,
    /// [`matmul_block`] with the given tile size.
    Block { block_size: usize },
    /// [`par_matmul_line`]
    ParallelRows,
    /// [`par_matmul_line_v2`]
    ParallelColumns,
}

impl Strategy {
    /// Human-readable name, matching the menu entries.
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Naive => "Multiplication",
            Strategy::Line => "Line Multiplication",
            Strategy::Block { .. } => "Block Multiplication",
            Strategy::ParallelRows => "Line Multiplication Parallel V1",
            Strategy::ParallelColumns => "Line Multiplication Parallel V2",
        }
    }

    /// Whether the kernel runs on a Rayon pool.
    pub fn is_parallel(&self) -> bool {
        matches!(self, Strategy::ParallelRows | Strategy::ParallelColumns)
    }

    /// Runs the kernel on already allocated buffers.
    ///
    /// `c` must be zeroed for every strategy except [`Strategy::Naive`], which
    /// overwrites each cell. Parallel strategies use the current Rayon pool.
    ///
    /// Fails with `InvalidDimension` for empty operands, `DimensionMismatch` when
    /// `B` or `C` is not the size of `A`, and `InvalidBlockSize` when a tile size
    /// is outside `1..=n`.
    pub fn compute(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        let n = a.dim();
        if n == 0 {
            return Err(invalid_dimension(0));
        }
        for found in [b.dim(), c.dim()] {
            if found != n {
                return Err(dimension_mismatch(n, found));
            }
        }

        let (a, b, c) = (a.as_slice(), b.as_slice(), c.as_mut_slice());
        match *self {
            Strategy::Naive => matmul_naive(a, b, c, n),
            Strategy::Line => matmul_line(a, b, c, n),
            Strategy::Block { block_size } => {
                if block_size == 0 || block_size > n {
                    let requested = i64::try_from(block_size).unwrap_or(i64::MAX);
                    return Err(invalid_block_size(requested, n));
                }
                matmul_block(a, b, c, n, block_size)
            }
            Strategy::ParallelRows => par_matmul_line(a, b, c, n),
            Strategy::ParallelColumns => par_matmul_line_v2(a, b, c, n),
        }
        Ok(())
    }

    /// Computes `A * B` into a freshly allocated matrix.
    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        if a.dim() == 0 {
            return Err(invalid_dimension(0));
        }
        let mut c = Matrix::zeros(a.dim())?;
        debug!("{}: multiplying {n}x{n}", self.label(), n = a.dim());
        self.compute(a, b, &mut c)?;
        Ok(c)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Block { block_size } => {
                write!(f, "{} (block size {block_size})", self.label())
            }
            _ => f.write_str(self.label()),
        }
    }
}
