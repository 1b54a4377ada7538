//! Timing protocol around a single kernel invocation.
//!
//! A run owns its three matrices for its whole lifetime and drops them when
//! it returns. Only the kernel itself is timed: operand allocation and fill,
//! thread-pool construction and preview extraction all happen outside the
//! measured region. For the parallel strategies the hop onto the pool
//! (`ThreadPool::install`) is inside it.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    error::{invalid_dimension, thread_pool_error, Result},
    matmul::{validate_block_size, Strategy},
    matrix::{operands, Matrix},
    PREVIEW_LEN,
};

/// Runtime knobs for a benchmark run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Worker count for the parallel strategies. `None` lets Rayon decide
    /// (logical CPUs, or `RAYON_NUM_THREADS`).
    pub threads: Option<usize>,
    /// How many entries of row 0 the report shows.
    pub preview_len: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            threads: None,
            preview_len: PREVIEW_LEN,
        }
    }
}

impl BenchConfig {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_preview_len(mut self, preview_len: usize) -> Self {
        self.preview_len = preview_len;
        self
    }

    /// Builds the dedicated pool the parallel strategies run on.
    pub fn build_pool(&self) -> Result<ThreadPool> {
        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .thread_name(|i| format!("matprod-worker-{i}"))
            .build()
            .map_err(|e| thread_pool_error(e.to_string()))?;
        debug!("thread pool ready with {} workers", pool.current_num_threads());
        Ok(pool)
    }
}

/// Outcome of one timed multiplication.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchReport {
    pub strategy: Strategy,
    pub dimension: usize,
    pub elapsed: Duration,
    /// The first `min(preview_len, n)` entries of row 0 of the result.
    pub preview: Vec<f64>,
}

impl BenchReport {
    pub fn seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Throughput in billions of floating point operations per second (`2n³` flops).
    pub fn gflops(&self) -> f64 {
        let n = self.dimension as f64;
        let secs = self.seconds();
        if secs == 0.0 {
            return f64::INFINITY;
        }
        2.0 * n * n * n / secs / 1e9
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time: {:.3} seconds", self.seconds())?;
        writeln!(f, "Result matrix:")?;
        for value in &self.preview {
            write!(f, "{value} ")?;
        }
        writeln!(f)
    }
}

/// Times `strategy` on freshly built `n x n` operands and reports the result.
///
/// Returns `InvalidDimension` for `n == 0` and `InvalidBlockSize` for a tile
/// size outside `1..=n`, in both cases before anything is allocated or timed.
pub fn run(strategy: Strategy, n: usize, config: &BenchConfig) -> Result<BenchReport> {
    if n == 0 {
        return Err(invalid_dimension(0));
    }
    if let Strategy::Block { block_size } = strategy {
        let requested = i64::try_from(block_size).unwrap_or(i64::MAX);
        validate_block_size(requested, n)?;
    }

    let pool = if strategy.is_parallel() {
        Some(config.build_pool()?)
    } else {
        None
    };

    let (a, b) = operands(n)?;
    let mut c = Matrix::zeros(n)?;

    let (result, elapsed) = {
        let start = Instant::now();
        let result = match &pool {
            Some(pool) => pool.install(|| strategy.compute(&a, &b, &mut c)),
            None => strategy.compute(&a, &b, &mut c),
        };
        (result, start.elapsed())
    };
    result?;

    let report = BenchReport {
        strategy,
        dimension: n,
        elapsed,
        preview: c.preview(config.preview_len),
    };
    info!(
        "{strategy}: n={n} in {:.6}s ({:.3} GFLOPS)",
        report.seconds(),
        report.gflops()
    );
    Ok(report)
}
