//! Error types for the alignment/variant-calling pipeline.
//!
//! Mirrors the five error classes of the original design: configuration
//! errors, capacity overruns, accelerator-reported errors, I/O errors, and
//! non-fatal parse anomalies. The first four are fatal and carry a distinct
//! [`UpvcError::exit_code`]; parse anomalies are recorded and the affected
//! read is dropped without aborting the pipeline.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpvcError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("accelerator error: {0}")]
    Accelerator(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("parse anomaly at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unsupported backend operation: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, UpvcError>;

impl UpvcError {
    /// Distinct non-zero process exit code for each fatal error class.
    ///
    /// `Parse` anomalies are non-fatal and have no corresponding exit code;
    /// callers must not terminate the process for them.
    pub fn exit_code(&self) -> i32 {
        match self {
            UpvcError::Configuration(_) => 10,
            UpvcError::CapacityExceeded(_) => 11,
            UpvcError::Accelerator(_) => 12,
            UpvcError::Io(_) => 13,
            UpvcError::Unsupported(_) => 14,
            UpvcError::Parse { .. } => 1,
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, UpvcError::Parse { .. })
    }
}
