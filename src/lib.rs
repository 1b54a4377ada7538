//! Dense square matrix multiplication, five ways.
//!
//! `matprod` times the same product `C = A * B` under different loop orders,
//! cache blocking and Rayon work distribution. Inputs are built
//! deterministically (see [`matrix`]) so that every cell of the result is
//! known in closed form: `n(n+1)/2`.
//!
//! ```
//! use matprod::{matrix::operands, Strategy};
//!
//! let (a, b) = operands(3).unwrap();
//! let c = Strategy::Block { block_size: 2 }.multiply(&a, &b).unwrap();
//! assert_eq!(c.preview(10), vec![6.0, 6.0, 6.0]);
//! ```

pub mod bench;
pub mod error;
pub mod matmul;
pub mod matrix;
pub mod menu;

pub use bench::{run, BenchConfig, BenchReport};
pub use error::{MatprodError, Result};
pub use matmul::Strategy;
pub use matrix::Matrix;

/// Number of entries of row 0 shown in a report.
pub const PREVIEW_LEN: usize = 10;

/// Tile size used when none is given.
pub const DEFAULT_BLOCK_SIZE: usize = 64;
