use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::cli::{Operation, OutputFormat, MAX_WORKER_THREADS};
use crate::pipeline::JobSpec;

/// Create a styled progress bar
pub fn create_progress_bar(total: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.blue} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Format duration in a human-readable way
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else if total_secs > 0 {
        format!("{}.{:03}s", total_secs, millis)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Format a byte count as B / KiB / MiB
pub fn format_bytes(bytes: usize) -> String {
    const KIB: f64 = 1024.0;
    let value = bytes as f64;
    if value >= KIB * KIB {
        format!("{:.1} MiB", value / (KIB * KIB))
    } else if value >= KIB {
        format!("{:.1} KiB", value / KIB)
    } else {
        format!("{} B", bytes)
    }
}

/// Validate a job plan before anything is read or written
///
/// Output destinations are explicit configuration: every job needs its own
/// file and none may overwrite the input. `requested_threads` is the raw
/// `--jobs` value, where 0 means auto-detect.
pub fn validate_jobs(input: &Path, jobs: &[JobSpec], requested_threads: usize) -> Result<()> {
    if jobs.is_empty() {
        return Err(anyhow::anyhow!("No jobs to run"));
    }

    if requested_threads > MAX_WORKER_THREADS {
        return Err(anyhow::anyhow!(
            "Job count must be between 0 (auto) and {}, got: {}",
            MAX_WORKER_THREADS,
            requested_threads
        ));
    }

    let input_key = normalize_path(input);
    let mut seen = HashSet::new();

    for job in jobs {
        let key = normalize_path(&job.output);
        if key.as_os_str().is_empty() {
            return Err(anyhow::anyhow!(
                "{} job has an empty output path",
                job.operation()
            ));
        }
        if key == input_key {
            return Err(anyhow::anyhow!(
                "{} job would overwrite the input image: {}",
                job.operation(),
                job.output.display()
            ));
        }
        if !seen.insert(key) {
            return Err(anyhow::anyhow!(
                "Output path used by more than one job: {}",
                job.output.display()
            ));
        }

        job.transform
            .validate()
            .map_err(|e| anyhow::anyhow!("{} job: {}", job.operation(), e))?;
    }

    Ok(())
}

/// Lexically normalize a path (drop `.` components, resolve `..` where possible)
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Get file extension in lowercase
pub fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Derive the output path for an operation: `<dir>/<stem>.<tag>.<ext>`
///
/// The extension follows the requested format, then the input's own
/// extension, then `png`.
pub fn derive_output_path(
    output_dir: &Path,
    input: &Path,
    operation: Operation,
    format: Option<OutputFormat>,
) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let extension = match format {
        Some(format) => format.extension().to_string(),
        None => get_file_extension(input)
            .filter(|ext| OutputFormat::from_extension(ext).is_some())
            .unwrap_or_else(|| OutputFormat::Png.extension().to_string()),
    };

    output_dir.join(format!("{}.{}.{}", stem, operation.output_tag(), extension))
}

/// Print verbose information if verbose mode is enabled
pub fn verbose_println(verbose: bool, message: &str) {
    if verbose {
        println!("{} {}", style("[VERBOSE]").dim(), message);
    }
}

/// Print transform debug information to stderr
pub fn debug_println(debug: bool, message: &str) {
    if debug {
        eprintln!("{} {}", style("[DEBUG]").magenta(), message);
    }
}

/// Print error message
pub fn error_println(message: &str) {
    eprintln!("{} {}", style("[ERROR]").red().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_processing::{ConvertOptions, CropOptions, NormalizeOptions, Transform};

    fn job(transform: Transform, output: &str) -> JobSpec {
        JobSpec {
            transform,
            output: PathBuf::from(output),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
    }

    #[test]
    fn test_derive_output_path() {
        let input = Path::new("test/test.jpg");
        assert_eq!(
            derive_output_path(Path::new("."), input, Operation::Convert, None),
            PathBuf::from("./test.convert.jpg")
        );
        assert_eq!(
            derive_output_path(Path::new("out"), input, Operation::Normalize, None),
            PathBuf::from("out/test.norm.jpg")
        );
        assert_eq!(
            derive_output_path(
                Path::new("out"),
                input,
                Operation::Crop,
                Some(OutputFormat::Png)
            ),
            PathBuf::from("out/test.crop.png")
        );
        assert_eq!(
            derive_output_path(Path::new("."), Path::new("scan.raw"), Operation::Crop, None),
            PathBuf::from("./scan.crop.png")
        );
    }

    #[test]
    fn test_validate_jobs_accepts_distinct_outputs() {
        let jobs = vec![
            job(Transform::Convert(ConvertOptions::default()), "a.jpg"),
            job(Transform::Crop(CropOptions::quadrant()), "b.jpg"),
            job(Transform::Normalize(NormalizeOptions::default()), "c.jpg"),
        ];
        assert!(validate_jobs(Path::new("in.jpg"), &jobs, 4).is_ok());
    }

    #[test]
    fn test_validate_jobs_rejects_reused_output() {
        let jobs = vec![
            job(Transform::Convert(ConvertOptions::default()), "out/test.jpg"),
            job(Transform::Normalize(NormalizeOptions::default()), "out/./test.jpg"),
        ];
        let err = validate_jobs(Path::new("in.jpg"), &jobs, 4).unwrap_err();
        assert!(err.to_string().contains("more than one job"));
    }

    #[test]
    fn test_validate_jobs_rejects_input_overwrite() {
        let jobs = vec![job(
            Transform::Normalize(NormalizeOptions::default()),
            "./photos/in.jpg",
        )];
        assert!(validate_jobs(Path::new("photos/in.jpg"), &jobs, 1).is_err());
    }

    #[test]
    fn test_validate_jobs_rejects_bad_parameters() {
        let crop = CropOptions {
            width: Some(1.5),
            ..CropOptions::default()
        };
        let jobs = vec![job(Transform::Crop(crop), "a.jpg")];
        assert!(validate_jobs(Path::new("in.jpg"), &jobs, 1).is_err());

        assert!(validate_jobs(Path::new("in.jpg"), &[], 1).is_err());

        let jobs = vec![job(Transform::Convert(ConvertOptions::default()), "a.jpg")];
        assert!(validate_jobs(Path::new("in.jpg"), &jobs, 65).is_err());
    }

    #[test]
    fn test_validate_jobs_accepts_auto_thread_count() {
        let jobs = vec![job(Transform::Convert(ConvertOptions::default()), "a.jpg")];
        assert!(validate_jobs(Path::new("in.jpg"), &jobs, 0).is_ok());
        assert!(validate_jobs(Path::new("in.jpg"), &jobs, MAX_WORKER_THREADS).is_ok());
    }

    #[test]
    fn test_validate_jobs_rejects_oversized_convert() {
        let convert = ConvertOptions {
            width: 4_000_000,
            height: 4_000_000,
            ..ConvertOptions::default()
        };
        let jobs = vec![job(Transform::Convert(convert), "a.png")];
        let err = validate_jobs(Path::new("in.png"), &jobs, 1).unwrap_err();
        assert!(err.to_string().contains("width"));
    }
}
