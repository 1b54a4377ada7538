//! Error types for matprod operations.
//!
//! Every failure a benchmark run can hit is a variant of [`MatprodError`].
//! Input errors are recoverable (the menu re-prompts), allocation and I/O
//! failures end the session.

use thiserror::Error;

/// Errors that can occur while building operands, multiplying or driving the menu.
#[derive(Debug, Error)]
pub enum MatprodError {
    /// The matrix dimension was zero or negative.
    #[error("Invalid dimension: {dimension} (must be a positive integer)")]
    InvalidDimension {
        /// The dimension that was rejected.
        dimension: i64,
    },
    /// The block size was not in `1..=n`.
    #[error("Invalid block size: {block_size} (must be between 1 and {dimension})")]
    InvalidBlockSize {
        /// The block size that was rejected.
        block_size: i64,
        /// The matrix dimension the block size was checked against.
        dimension: usize,
    },
    /// Operands of different sizes were passed to one multiplication.
    #[error("Dimension mismatch: expected {expected}x{expected}, found {found}x{found}")]
    DimensionMismatch {
        /// Side length of `A`.
        expected: usize,
        /// Side length of the operand that did not match.
        found: usize,
    },
    /// A menu selector outside `0..=5`.
    #[error("Unrecognized selection: {selector}")]
    UnrecognizedSelector {
        /// The selector that was typed.
        selector: i64,
    },
    /// A line that could not be parsed as an integer.
    #[error("Invalid input: {input:?} is not an integer")]
    InvalidInput {
        /// The offending line, trimmed.
        input: String,
    },
    /// Memory for a matrix could not be obtained.
    #[error("Memory allocation failed: {message} (requested {requested_size} bytes)")]
    AllocationError {
        /// The size in bytes that was requested.
        requested_size: usize,
        /// Human-readable error message.
        message: String,
    },
    /// The worker pool for the parallel variants could not be built.
    #[error("Thread pool error: {message}")]
    ThreadPoolError {
        /// Human-readable error message.
        message: String,
    },
    /// Reading the menu input or writing a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatprodError {
    /// Whether the menu should report this error and ask again instead of stopping.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MatprodError::InvalidDimension { .. }
                | MatprodError::InvalidBlockSize { .. }
                | MatprodError::UnrecognizedSelector { .. }
                | MatprodError::InvalidInput { .. }
        )
    }
}

/// Result type alias for matprod operations.
pub type Result<T> = std::result::Result<T, MatprodError>;

/// Creates an invalid dimension error.
pub fn invalid_dimension(dimension: i64) -> MatprodError {
    MatprodError::InvalidDimension { dimension }
}

/// Creates an invalid block size error.
pub fn invalid_block_size(block_size: i64, dimension: usize) -> MatprodError {
    MatprodError::InvalidBlockSize {
        block_size,
        dimension,
    }
}

/// Creates a dimension mismatch error.
pub fn dimension_mismatch(expected: usize, found: usize) -> MatprodError {
    MatprodError::DimensionMismatch { expected, found }
}

/// Creates an unrecognized selector error.
pub fn unrecognized_selector(selector: i64) -> MatprodError {
    MatprodError::UnrecognizedSelector { selector }
}

/// Creates an invalid input error.
pub fn invalid_input(input: impl Into<String>) -> MatprodError {
    MatprodError::InvalidInput {
        input: input.into(),
    }
}

/// Creates an allocation error.
pub fn allocation_error(requested_size: usize, message: impl Into<String>) -> MatprodError {
    MatprodError::AllocationError {
        requested_size,
        message: message.into(),
    }
}

/// Creates a thread pool error.
pub fn thread_pool_error(message: impl Into<String>) -> MatprodError {
    MatprodError::ThreadPoolError {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_dimension_display() {
        let error = invalid_dimension(-5);
        let display = format!("{}", error);
        assert!(display.contains("Invalid dimension"));
        assert!(display.contains("-5"));
    }

    #[test]
    fn test_invalid_block_size_display() {
        let error = invalid_block_size(0, 128);
        let display = format!("{}", error);
        assert!(display.contains("Invalid block size: 0"));
        assert!(display.contains("between 1 and 128"));
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let error = dimension_mismatch(3, 2);
        assert_eq!(
            format!("{}", error),
            "Dimension mismatch: expected 3x3, found 2x2"
        );
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_allocation_error_display() {
        let error = allocation_error(1024, "out of memory");
        let display = format!("{}", error);
        assert!(display.contains("Memory allocation failed"));
        assert!(display.contains("1024 bytes"));
        assert!(display.contains("out of memory"));
    }

    #[test]
    fn test_invalid_input_display() {
        let error = invalid_input("abc");
        assert_eq!(format!("{}", error), "Invalid input: \"abc\" is not an integer");
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(invalid_dimension(0).is_recoverable());
        assert!(invalid_block_size(0, 4).is_recoverable());
        assert!(unrecognized_selector(9).is_recoverable());
        assert!(invalid_input("x").is_recoverable());
        assert!(!allocation_error(8, "test").is_recoverable());
        assert!(!thread_pool_error("test").is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed");
        let error: MatprodError = io.into();
        assert!(matches!(error, MatprodError::Io(_)));
        assert!(!error.is_recoverable());
        assert!(std::error::Error::source(&error).is_some());
    }
}
