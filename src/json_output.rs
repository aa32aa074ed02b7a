//! JSON output for machine consumers
//!
//! When --json-progress is enabled, step markers, job results and the final
//! summary are emitted as JSON lines to stdout, suppressing console output.

use serde::Serialize;
use std::path::Path;

use crate::cli::Operation;
use crate::image_processing::ImageInfo;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JsonMessage {
    /// Lifecycle marker (`1`, `1.5`, `2`, `3`)
    #[serde(rename_all = "camelCase")]
    Step {
        step: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<Operation>,
    },
    /// Job that a dry run would execute
    #[serde(rename_all = "camelCase")]
    Planned {
        operation: Operation,
        output_path: String,
        description: String,
    },
    /// Transform finished and its output was written
    #[serde(rename_all = "camelCase")]
    JobCompleted {
        operation: Operation,
        output_path: String,
        bytes: usize,
        processing_time_ms: u128,
    },
    /// Transform or write failed
    #[serde(rename_all = "camelCase")]
    JobFailed {
        operation: Operation,
        output_path: String,
        error: String,
    },
    /// Result of --identify
    Identify {
        path: String,
        #[serde(flatten)]
        info: ImageInfo,
    },
    /// Run summary
    #[serde(rename_all = "camelCase")]
    Summary {
        total_jobs: usize,
        succeeded: usize,
        failed: usize,
        duration_secs: f64,
    },
}

impl JsonMessage {
    /// Emit JSON message to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn step(step: &str, operation: Option<Operation>) {
        Self::Step {
            step: step.to_string(),
            operation,
        }
        .emit();
    }

    pub fn planned(operation: Operation, output_path: &Path, description: String) {
        Self::Planned {
            operation,
            output_path: output_path.display().to_string(),
            description,
        }
        .emit();
    }

    pub fn job_completed(
        operation: Operation,
        output_path: &Path,
        bytes: usize,
        processing_time_ms: u128,
    ) {
        Self::JobCompleted {
            operation,
            output_path: output_path.display().to_string(),
            bytes,
            processing_time_ms,
        }
        .emit();
    }

    pub fn job_failed(operation: Operation, output_path: &Path, error: impl Into<String>) {
        Self::JobFailed {
            operation,
            output_path: output_path.display().to_string(),
            error: error.into(),
        }
        .emit();
    }

    pub fn identify(path: &Path, info: ImageInfo) {
        Self::Identify {
            path: path.display().to_string(),
            info,
        }
        .emit();
    }

    pub fn summary(total_jobs: usize, succeeded: usize, failed: usize, duration_secs: f64) {
        Self::Summary {
            total_jobs,
            succeeded,
            failed,
            duration_secs,
        }
        .emit();
    }
}
