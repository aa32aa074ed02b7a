use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

use crate::cli::{Args, Operation, DEFAULT_INPUT};
use crate::image_processing::{ConvertOptions, CropOptions, NormalizeOptions, Transform};
use crate::pipeline::JobSpec;
use crate::utils::derive_output_path;

/// JSON job file: explicit transforms with explicit output paths
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFile {
    pub input: Option<String>,
    pub output_dir: Option<String>,
    pub debug: Option<bool>,
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Deserialize)]
pub struct JobEntry {
    pub output: String,
    #[serde(flatten)]
    pub transform: Transform,
}

impl JobFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Everything the driver needs, after merging the command line and job file
#[derive(Debug, Clone)]
pub struct JobPlan {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub jobs: Vec<JobSpec>,
    pub debug: bool,
}

impl Args {
    /// Build the job plan from the command line and the optional job file
    ///
    /// Command-line arguments take precedence over job file values. Jobs come
    /// from the file when one is given, otherwise from --ops.
    pub fn job_plan(&self) -> Result<JobPlan> {
        let job_file = match &self.config_file {
            Some(path) => Some(JobFile::load(path)?),
            None => None,
        };
        self.merge_job_file(job_file)
    }

    fn merge_job_file(&self, job_file: Option<JobFile>) -> Result<JobPlan> {
        let (file_input, file_output_dir, file_debug, file_jobs) = match job_file {
            Some(file) => (file.input, file.output_dir, file.debug, Some(file.jobs)),
            None => (None, None, None, None),
        };

        let input = self
            .input
            .clone()
            .or_else(|| file_input.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT));

        let output_dir = self
            .output_dir
            .clone()
            .or_else(|| file_output_dir.map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let debug = self.debug || file_debug.unwrap_or(false);

        let mut jobs = match file_jobs {
            Some(entries) => entries
                .into_iter()
                .map(|entry| JobSpec {
                    transform: entry.transform,
                    output: output_dir.join(entry.output),
                })
                .collect(),
            None => self.operation_jobs(&input, &output_dir)?,
        };

        for job in &mut jobs {
            if debug {
                job.transform.set_debug(true);
            }
            if let Some(quality) = self.quality {
                set_quality(&mut job.transform, quality);
            }
        }

        Ok(JobPlan {
            input,
            output_dir,
            jobs,
            debug,
        })
    }

    /// Jobs for --ops, parameterised by --size, --crop and friends
    fn operation_jobs(&self, input: &Path, output_dir: &Path) -> Result<Vec<JobSpec>> {
        let operations = self.parse_operations().map_err(|e| anyhow::anyhow!(e))?;
        let (width, height) = self.parse_size().map_err(|e| anyhow::anyhow!(e))?;

        let mut jobs = Vec::new();
        // Keep the canonical convert, crop, normalize order regardless of --ops order
        for operation in Operation::iter().filter(|op| operations.contains(op)) {
            let transform = match operation {
                Operation::Convert => Transform::Convert(ConvertOptions {
                    width,
                    height,
                    resize_style: self.resize_style,
                    quality: self.quality,
                    format: self.format,
                    debug: self.debug,
                }),
                Operation::Crop => {
                    let (w, h, top, left) = self.parse_crop().map_err(|e| anyhow::anyhow!(e))?;
                    Transform::Crop(CropOptions {
                        width: Some(w),
                        height: Some(h),
                        top: Some(top),
                        left: Some(left),
                        quality: self.quality,
                        format: self.format,
                        debug: self.debug,
                    })
                }
                Operation::Normalize => Transform::Normalize(NormalizeOptions {
                    quality: self.quality,
                    format: self.format,
                    debug: self.debug,
                }),
            };

            jobs.push(JobSpec {
                transform,
                output: derive_output_path(output_dir, input, operation, self.format),
            });
        }

        Ok(jobs)
    }
}

fn set_quality(transform: &mut Transform, quality: u8) {
    match transform {
        Transform::Convert(options) => options.quality = Some(quality),
        Transform::Crop(options) => options.quality = Some(quality),
        Transform::Normalize(options) => options.quality = Some(quality),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ResizeStyle;

    const SMOKE_JOBS: &str = r#"{
        "input": "test/test.jpg",
        "outputDir": "out",
        "debug": true,
        "jobs": [
            { "operation": "convert", "output": "test.convert.jpg", "width": 100, "height": 100 },
            { "operation": "crop", "output": "test.crop.jpg", "width": 0.5, "height": 0.5, "top": 0.5, "left": 0.5 },
            { "operation": "normalize", "output": "test.norm.jpg", "quality": 90 }
        ]
    }"#;

    #[test]
    fn test_parse_job_file() {
        let file = JobFile::parse(SMOKE_JOBS).unwrap();
        assert_eq!(file.input.as_deref(), Some("test/test.jpg"));
        assert_eq!(file.jobs.len(), 3);
        assert_eq!(file.jobs[1].output, "test.crop.jpg");
        assert_eq!(file.jobs[1].transform, Transform::Crop(CropOptions::quadrant()));
        assert_eq!(
            file.jobs[2].transform,
            Transform::Normalize(NormalizeOptions {
                quality: Some(90),
                ..NormalizeOptions::default()
            })
        );
    }

    #[test]
    fn test_oversized_convert_in_job_file_fails_validation() {
        let json = r#"{"jobs":[{"operation":"convert","output":"a.png","width":4000000,"height":4000000}]}"#;
        let file = JobFile::parse(json).unwrap();
        assert!(file.jobs[0].transform.validate().is_err());

        let src = crate::image_processing::test_support::encoded(
            8,
            8,
            crate::cli::OutputFormat::Png,
        );
        assert!(matches!(
            file.jobs[0].transform.apply(&src),
            Err(crate::error::TransformError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_parse_job_file_rejects_unknown_operation() {
        let json = r#"{"jobs":[{"operation":"sharpen","output":"a.jpg"}]}"#;
        assert!(JobFile::parse(json).is_err());

        let json = r#"{"jobs":[{"operation":"crop"}]}"#;
        assert!(JobFile::parse(json).is_err());
    }

    #[test]
    fn test_plan_from_job_file() {
        let args = Args::default();
        let plan = args
            .merge_job_file(Some(JobFile::parse(SMOKE_JOBS).unwrap()))
            .unwrap();

        assert_eq!(plan.input, PathBuf::from("test/test.jpg"));
        assert_eq!(plan.output_dir, PathBuf::from("out"));
        assert!(plan.debug);
        assert_eq!(plan.jobs[0].output, PathBuf::from("out/test.convert.jpg"));
        assert_eq!(plan.jobs[2].output, PathBuf::from("out/test.norm.jpg"));
        match &plan.jobs[0].transform {
            Transform::Convert(o) => {
                assert!(o.debug);
                assert_eq!((o.width, o.height), (100, 100));
            }
            other => panic!("unexpected transform {:?}", other),
        }
    }

    #[test]
    fn test_command_line_wins_over_job_file() {
        let args = Args {
            input: Some(PathBuf::from("other.png")),
            output_dir: Some(PathBuf::from("cli-out")),
            quality: Some(40),
            ..Default::default()
        };
        let plan = args
            .merge_job_file(Some(JobFile::parse(SMOKE_JOBS).unwrap()))
            .unwrap();

        assert_eq!(plan.input, PathBuf::from("other.png"));
        assert_eq!(plan.jobs[1].output, PathBuf::from("cli-out/test.crop.jpg"));
        match &plan.jobs[2].transform {
            Transform::Normalize(o) => assert_eq!(o.quality, Some(40)),
            other => panic!("unexpected transform {:?}", other),
        }
    }

    #[test]
    fn test_plan_from_operations() {
        let args = Args {
            ops_str: "normalize,convert".to_string(),
            size: "64x48".to_string(),
            resize_style: ResizeStyle::Fill,
            ..Default::default()
        };
        let plan = args.merge_job_file(None).unwrap();

        assert_eq!(plan.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(plan.jobs.len(), 2);
        assert_eq!(plan.jobs[0].operation(), Operation::Convert);
        assert_eq!(plan.jobs[0].output, PathBuf::from("./test.convert.jpg"));
        assert_eq!(plan.jobs[1].output, PathBuf::from("./test.norm.jpg"));
        assert_eq!(
            plan.jobs[0].transform,
            Transform::Convert(ConvertOptions {
                width: 64,
                height: 48,
                resize_style: ResizeStyle::Fill,
                ..ConvertOptions::default()
            })
        );
    }

    #[test]
    fn test_default_plan_matches_smoke_test() {
        let plan = Args::default().merge_job_file(None).unwrap();
        let outputs: Vec<PathBuf> = plan.jobs.iter().map(|j| j.output.clone()).collect();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("./test.convert.jpg"),
                PathBuf::from("./test.crop.jpg"),
                PathBuf::from("./test.norm.jpg"),
            ]
        );
        assert_eq!(plan.jobs[1].transform, Transform::Crop(CropOptions::quadrant()));
    }

    #[test]
    fn test_invalid_operation_string() {
        let args = Args {
            ops_str: "blur".to_string(),
            ..Default::default()
        };
        assert!(args.merge_job_file(None).is_err());
    }
}
