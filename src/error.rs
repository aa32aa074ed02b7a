//! Error types for the transform library and the test driver.
//!
//! The driver only ever fails in two ways: file I/O (reading the input or
//! writing an output) or a transform reported by the image library.

use std::path::PathBuf;
use thiserror::Error;

use crate::cli::Operation;

/// Failure reported by one of the in-memory transforms
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("failed to decode source image")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode result image")]
    Encode(#[source] image::ImageError),

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(
        "crop region {width}x{height}+{left}+{top} is empty on a {image_width}x{image_height} image"
    )]
    EmptyRegion {
        width: u32,
        height: u32,
        left: u32,
        top: u32,
        image_width: u32,
        image_height: u32,
    },
}

impl TransformError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        TransformError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure of a driver stage
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read input {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{operation} transform failed")]
    Transform {
        operation: Operation,
        #[source]
        source: TransformError,
    },
}

impl DriverError {
    /// True when the failure came from the filesystem rather than a transform
    pub fn is_io(&self) -> bool {
        matches!(self, DriverError::Read { .. } | DriverError::Write { .. })
    }

    /// The error message followed by every underlying cause, `: `-separated
    pub fn chain(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            message.push_str(": ");
            message.push_str(&err.to_string());
            source = std::error::Error::source(err);
        }
        message
    }
}
