//! The sequential test driver.
//!
//! One input file is read, every job's transform runs concurrently on a
//! dedicated rayon pool against the same bytes, and each successful result is
//! written to its own output path. The pool joins before [`Pipeline::run`]
//! returns, so every branch's outcome is visible in the [`RunReport`].

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cli::Operation;
use crate::error::DriverError;
use crate::image_processing::Transform;
use crate::json_output::JsonMessage;
use crate::utils::{format_bytes, format_duration, verbose_println};

/// One transform and the file its result goes to
#[derive(Debug, Clone, PartialEq)]
pub struct JobSpec {
    pub transform: Transform,
    pub output: PathBuf,
}

impl JobSpec {
    pub fn operation(&self) -> Operation {
        self.transform.operation()
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub jobs: Vec<JobSpec>,
    pub worker_threads: usize,
    pub verbose: bool,
}

/// How lifecycle markers are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    Console,
    Json,
    Quiet,
}

/// Emits `step` markers and job results; shared by all branches
pub struct StepReporter {
    mode: ReportMode,
    progress: Option<ProgressBar>,
}

impl StepReporter {
    pub fn new(mode: ReportMode) -> Self {
        Self {
            mode,
            progress: None,
        }
    }

    /// Advance `progress` once per finished job (console mode only)
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        if self.mode == ReportMode::Console {
            self.progress = Some(progress);
        }
        self
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    fn println(&self, line: String) {
        match &self.progress {
            Some(pb) if !pb.is_hidden() => pb.println(line),
            _ => println!("{}", line),
        }
    }

    /// Console mode prints the bare marker; JSON lines also carry the operation
    pub fn step(&self, step: &str, operation: Option<Operation>) {
        match self.mode {
            ReportMode::Console => self.println(step_marker(step)),
            ReportMode::Json => JsonMessage::step(step, operation),
            ReportMode::Quiet => {}
        }
    }

    fn job_finished(&self, outcome: &JobOutcome) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
            pb.set_message(format!("{} done", outcome.operation));
        }

        match self.mode {
            ReportMode::Console => {}
            ReportMode::Json => match &outcome.error {
                None => JsonMessage::job_completed(
                    outcome.operation,
                    &outcome.output,
                    outcome.output_bytes.unwrap_or(0),
                    outcome.duration.as_millis(),
                ),
                Some(error) => {
                    JsonMessage::job_failed(outcome.operation, &outcome.output, error.chain())
                }
            },
            ReportMode::Quiet => {}
        }
    }

    pub fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }
}

/// What happened to one job
#[derive(Debug)]
pub struct JobOutcome {
    pub operation: Operation,
    pub output: PathBuf,
    /// Size of the transformed image, when the transform succeeded
    pub output_bytes: Option<usize>,
    /// True once the output file was written
    pub written: bool,
    pub duration: Duration,
    pub error: Option<DriverError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub input: PathBuf,
    pub input_bytes: usize,
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Turn the first failed job (in job order) into the run's error
    pub fn into_result(mut self) -> std::result::Result<Self, DriverError> {
        match self.outcomes.iter_mut().find_map(|o| o.error.take()) {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

pub fn read_input(path: &Path) -> std::result::Result<Vec<u8>, DriverError> {
    fs::read(path).map_err(|source| DriverError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn step_marker(step: &str) -> String {
    format!("step {}", step)
}

/// Write one result, creating its parent directory first
pub fn write_output(path: &Path, bytes: &[u8]) -> std::result::Result<(), DriverError> {
    let write_error = |source| DriverError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, bytes).map_err(write_error)
}

pub struct Pipeline {
    config: PipelineConfig,
    pool: rayon::ThreadPool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        // Initialize thread pool with specified number of jobs
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("transform-{}", i))
            .build()
            .context("Failed to initialize thread pool")?;

        Ok(Self { config, pool })
    }

    /// Read the input, run every job, and wait for all of them
    ///
    /// Only a failed read aborts the run early. Transform and write failures
    /// are recorded per job; see [`RunReport::into_result`].
    pub fn run(&self, reporter: &StepReporter) -> std::result::Result<RunReport, DriverError> {
        let start_time = Instant::now();
        let verbose = self.config.verbose && reporter.mode() == ReportMode::Console;

        let read = read_input(&self.config.input);
        reporter.step("1", None);
        let source = read?;

        verbose_println(
            verbose,
            &format!(
                "Read {} ({})",
                self.config.input.display(),
                format_bytes(source.len())
            ),
        );

        reporter.step("1.5", None);

        let outcomes: Vec<JobOutcome> = self.pool.install(|| {
            self.config
                .jobs
                .par_iter()
                .map(|job| {
                    let outcome = run_job(job, &source, reporter);
                    reporter.job_finished(&outcome);
                    outcome
                })
                .collect()
        });

        let elapsed = start_time.elapsed();
        verbose_println(
            verbose,
            &format!(
                "{} jobs finished in {}",
                outcomes.len(),
                format_duration(elapsed)
            ),
        );

        Ok(RunReport {
            input: self.config.input.clone(),
            input_bytes: source.len(),
            outcomes,
            elapsed,
        })
    }
}

/// Transform, then write; a failed transform never reaches the write
fn run_job(job: &JobSpec, source: &[u8], reporter: &StepReporter) -> JobOutcome {
    let started = Instant::now();
    let operation = job.operation();

    let result = job.transform.apply(source);
    reporter.step("2", Some(operation));

    let bytes = match result {
        Ok(bytes) => bytes,
        Err(source) => {
            return JobOutcome {
                operation,
                output: job.output.clone(),
                output_bytes: None,
                written: false,
                duration: started.elapsed(),
                error: Some(DriverError::Transform { operation, source }),
            };
        }
    };

    let written = write_output(&job.output, &bytes);
    reporter.step("3", Some(operation));

    JobOutcome {
        operation,
        output: job.output.clone(),
        output_bytes: Some(bytes.len()),
        written: written.is_ok(),
        duration: started.elapsed(),
        error: written.err(),
    }
}
