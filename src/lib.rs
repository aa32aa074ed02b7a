// Library exports for reuse by the driver binary and integration tests
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod pipeline;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use cli::{Operation, OutputFormat, ResizeStyle};
pub use config_file::{JobFile, JobPlan};
pub use error::{DriverError, TransformError};
pub use image_processing::{
    convert, crop, identify, normalize, ConvertOptions, CropOptions, ImageInfo, NormalizeOptions,
    Transform,
};
pub use json_output::JsonMessage;
pub use pipeline::{JobOutcome, JobSpec, Pipeline, PipelineConfig, ReportMode, RunReport, StepReporter};
