use clap::{Parser, ValueEnum};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum_macros::{Display, EnumIter};

use crate::image_processing::resize::MAX_DIMENSION;

/// Input image used when neither the command line nor a job file names one
pub const DEFAULT_INPUT: &str = "test/test.jpg";

/// Upper bound for `--jobs` and for the auto-detected thread count
pub const MAX_WORKER_THREADS: usize = 64;

/// Transforms the driver can run as jobs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Display, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Resize and re-encode
    #[value(name = "convert")]
    Convert,
    /// Proportional crop
    #[value(name = "crop")]
    Crop,
    /// EXIF auto-orient plus histogram stretch
    #[value(name = "normalize")]
    Normalize,
}

impl Operation {
    /// Tag inserted into derived output file names (`test.<tag>.jpg`)
    pub fn output_tag(&self) -> &'static str {
        match self {
            Operation::Convert => "convert",
            Operation::Crop => "crop",
            Operation::Normalize => "norm",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JPEG (honours --quality)
    #[value(name = "jpg", alias = "jpeg")]
    #[serde(alias = "jpeg")]
    Jpg,
    /// PNG
    #[value(name = "png")]
    Png,
    /// Lossless WebP
    #[value(name = "webp")]
    Webp,
    /// TIFF
    #[value(name = "tiff", alias = "tif")]
    #[serde(alias = "tif")]
    Tiff,
    /// BMP
    #[value(name = "bmp")]
    Bmp,
}

impl OutputFormat {
    pub fn image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Bmp => ImageFormat::Bmp,
        }
    }

    /// Map a decoded source format to one we can encode
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::WebP => Some(OutputFormat::Webp),
            ImageFormat::Tiff => Some(OutputFormat::Tiff),
            ImageFormat::Bmp => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpg),
            "png" => Some(OutputFormat::Png),
            "webp" => Some(OutputFormat::Webp),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            "bmp" => Some(OutputFormat::Bmp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Bmp => "bmp",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeStyle {
    /// Keep aspect ratio, cover the target and centre-crop the overflow
    #[default]
    #[value(name = "aspectfill")]
    AspectFill,
    /// Keep aspect ratio, largest image that fits inside the target
    #[value(name = "aspectfit")]
    AspectFit,
    /// Stretch to exactly the target size
    #[value(name = "fill")]
    Fill,
}

#[derive(Parser, Debug)]
#[command(
    name = "blobmagick",
    version,
    about = "Concurrent convert/crop/normalize smoke test for in-memory image transforms",
    long_about = "
blobmagick - in-memory image transforms

Reads one image, runs the convert, crop and normalize transforms concurrently
against the same bytes, and writes each result to its own file. Progress is
reported as step markers:

  step 1    input read
  step 1.5  transforms issued
  step 2    a transform finished
  step 3    its output was written

Example Usage:
  # Default smoke test: test/test.jpg -> test.convert.jpg, test.crop.jpg, test.norm.jpg
  blobmagick

  # Custom input, output directory and convert size
  blobmagick -i ~/Photos/IMG_001.jpg -o /tmp/out -s 320x240 --resize-style aspectfit

  # Only crop the top-left quarter, as PNG
  blobmagick -i photo.jpg --ops crop --crop 0.5,0.5,0,0 -f png

  # Jobs and output paths from a JSON file
  blobmagick --config jobs.json --report

  # Print width, height, depth and format of an image
  blobmagick -i photo.jpg --identify

  # Machine-readable progress
  blobmagick --json-progress"
)]
pub struct Args {
    /// Input image file
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory for derived output file names
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON job file with explicit transforms and output paths
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Comma-separated transforms to run: convert, crop, normalize
    #[arg(long = "ops", default_value = "convert,crop,normalize", value_name = "LIST")]
    pub ops_str: String,

    /// Convert target size (format: WIDTHxHEIGHT, 0 keeps the source size on that axis)
    #[arg(
        short = 's',
        long = "size",
        default_value = "100x100",
        value_name = "WIDTHxHEIGHT"
    )]
    pub size: String,

    /// How convert maps the source onto the target size
    #[arg(long = "resize-style", default_value = "aspectfill")]
    pub resize_style: ResizeStyle,

    /// Crop fractions between 0 and 1 (format: WIDTH,HEIGHT,TOP,LEFT)
    #[arg(long = "crop", default_value = "0.5,0.5,0.5,0.5", value_name = "W,H,TOP,LEFT")]
    pub crop: String,

    /// JPEG quality (1-100)
    #[arg(
        short = 'q',
        long = "quality",
        value_name = "N",
        value_parser = clap::value_parser!(u8).range(1..=100)
    )]
    pub quality: Option<u8>,

    /// Output format (defaults to the input's format)
    #[arg(short = 'f', long = "format")]
    pub format: Option<OutputFormat>,

    /// Number of worker threads (0 = auto-detect CPU cores)
    #[arg(short = 'j', long = "jobs", default_value = "0", value_name = "N")]
    pub jobs: usize,

    /// Print width, height, depth and format of the input and exit
    #[arg(long = "identify")]
    pub identify: bool,

    /// Validate the job plan and print it without running any transform
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Display a summary table of all jobs at the end
    #[arg(long = "report")]
    pub report: bool,

    /// Emit progress as JSON lines on stdout instead of console text
    #[arg(long = "json-progress")]
    pub json_progress: bool,

    /// Print intermediate transform geometry to stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Parse the size string into width and height
    pub fn parse_size(&self) -> Result<(u32, u32), String> {
        let parts: Vec<&str> = self.size.split('x').collect();
        if parts.len() != 2 {
            return Err(format!(
                "Invalid size format '{}'. Use WIDTHxHEIGHT (e.g., 100x100)",
                self.size
            ));
        }

        let width = parts[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid width: '{}'", parts[0]))?;
        let height = parts[1]
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid height: '{}'", parts[1]))?;

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(format!(
                "Width and height must be at most {} pixels",
                MAX_DIMENSION
            ));
        }

        Ok((width, height))
    }

    /// Parse the crop string into (width, height, top, left) fractions
    pub fn parse_crop(&self) -> Result<(f64, f64, f64, f64), String> {
        let values = self
            .crop
            .split(',')
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| format!("Invalid crop fraction: '{}'", s.trim()))
            })
            .collect::<Result<Vec<f64>, String>>()?;

        if values.len() != 4 {
            return Err(format!(
                "Invalid crop format '{}'. Use WIDTH,HEIGHT,TOP,LEFT (e.g., 0.5,0.5,0.5,0.5)",
                self.crop
            ));
        }

        for (name, value) in ["width", "height", "top", "left"].iter().zip(&values) {
            if !(0.0..=1.0).contains(value) {
                return Err(format!(
                    "Crop {} must be between 0 and 1, got: {}",
                    name, value
                ));
            }
        }

        Ok((values[0], values[1], values[2], values[3]))
    }

    /// Parse the ops string into a list of operations
    pub fn parse_operations(&self) -> Result<Vec<Operation>, String> {
        let mut operations = Vec::new();

        for op_str in self.ops_str.split(',') {
            let op_str = op_str.trim().to_lowercase();
            if op_str.is_empty() {
                continue;
            }

            let op = Operation::from_str(&op_str, true).map_err(|_| {
                format!(
                    "Invalid operation '{}'. Valid operations: convert, crop, normalize",
                    op_str
                )
            })?;

            // Remove duplicates while preserving order
            if !operations.contains(&op) {
                operations.push(op);
            }
        }

        if operations.is_empty() {
            return Err("No operations specified".to_string());
        }

        Ok(operations)
    }

    /// Threads for the transform pool; `--jobs 0` means one per CPU, capped
    pub fn worker_threads(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get().clamp(1, MAX_WORKER_THREADS)
        } else {
            self.jobs
        }
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input: None,
            output_dir: None,
            config_file: None,
            ops_str: "convert,crop,normalize".to_string(),
            size: "100x100".to_string(),
            resize_style: ResizeStyle::AspectFill,
            crop: "0.5,0.5,0.5,0.5".to_string(),
            quality: None,
            format: None,
            jobs: 0,
            identify: false,
            dry_run: false,
            report: false,
            json_progress: false,
            debug: false,
            verbose: false,
        }
    }
}
