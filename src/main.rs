use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::Path;
use std::time::Instant;

use blobmagick::cli::Args;
use blobmagick::pipeline::{read_input, Pipeline, PipelineConfig, ReportMode, RunReport, StepReporter};
use blobmagick::utils::{
    create_progress_bar, error_println, format_bytes, format_duration, validate_jobs,
    verbose_println,
};
use blobmagick::{identify, report, JobPlan, JsonMessage};

/// Print width, height, depth and format of the input image
fn handle_identify(input: &Path, json: bool) -> Result<()> {
    let bytes = read_input(input)?;
    let info = identify(&bytes)
        .with_context(|| format!("Failed to identify {}", input.display()))?;

    if json {
        JsonMessage::identify(input, info);
        return Ok(());
    }

    println!("{}", style(input.display()).bold().cyan());
    println!("  Format:      {}", style(&info.format).bold());
    println!("  Dimensions:  {}x{}", info.width, info.height);
    println!("  Depth:       {}-bit", info.depth);
    if info.orientation != 0 {
        println!("  Orientation: {}", info.orientation);
    }
    Ok(())
}

fn print_plan(plan: &JobPlan, worker_threads: usize) {
    println!("{}", style("Job plan:").bold());
    println!("  Input: {}", plan.input.display());
    println!("  Worker threads: {}", worker_threads);
    for (i, job) in plan.jobs.iter().enumerate() {
        println!(
            "  {}: {} [{}] → {}",
            style(format!("#{}", i + 1)).dim(),
            style(job.operation()).bold(),
            job.transform.describe(),
            style(job.output.display()).cyan()
        );
    }
}

fn print_summary(report: &RunReport) {
    println!();
    println!("{}", style("Results Summary:").bold().green());
    println!(
        "  Succeeded: {}",
        style(report.succeeded()).bold().green()
    );
    if report.failed() > 0 {
        println!("  Failed: {}", style(report.failed()).bold().red());
    }
    println!(
        "  Total processing time: {}",
        style(format_duration(report.elapsed)).bold()
    );

    println!();
    println!("{}", style("Output files:").bold().green());
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!(
                "  {} {} → {} ({}, {})",
                style("✓").green(),
                outcome.operation,
                style(outcome.output.display()).bold(),
                format_bytes(outcome.output_bytes.unwrap_or(0)),
                style(format_duration(outcome.duration)).dim()
            ),
            Some(error) => println!(
                "  {} {} → {} - {}",
                style("✗").red(),
                outcome.operation,
                style(outcome.output.display()).bold().red(),
                error.chain()
            ),
        }
    }
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let args = Args::parse();
    let json = args.json_progress;

    if !json {
        // Print banner
        println!("{}", style("blobmagick - in-memory image transforms").bold().blue());
        println!();
    }

    let plan = args.job_plan()?;

    if args.identify {
        return handle_identify(&plan.input, json);
    }

    validate_jobs(&plan.input, &plan.jobs, args.jobs)?;
    let worker_threads = args.worker_threads();

    let verbose = args.verbose && !json;
    if verbose {
        println!("{}", style("Configuration:").bold());
        println!("  Input: {}", plan.input.display());
        println!("  Output directory: {}", plan.output_dir.display());
        println!("  Jobs: {}", plan.jobs.len());
        println!("  Worker threads: {}", worker_threads);
        println!(
            "  Debug output: {}",
            if plan.debug { "enabled" } else { "disabled" }
        );
        println!();
    }

    if args.dry_run {
        if json {
            for job in &plan.jobs {
                JsonMessage::planned(job.operation(), &job.output, job.transform.describe());
            }
            JsonMessage::summary(plan.jobs.len(), 0, 0, 0.0);
        } else {
            print_plan(&plan, worker_threads);
            println!();
            println!("{}", style("Dry run: no files were read or written").yellow());
        }
        return Ok(());
    }

    let mode = if json {
        ReportMode::Json
    } else {
        ReportMode::Console
    };
    let progress = create_progress_bar(plan.jobs.len() as u64)?;
    let reporter = StepReporter::new(mode).with_progress(progress);

    let total_jobs = plan.jobs.len();
    let pipeline = Pipeline::new(PipelineConfig {
        input: plan.input,
        jobs: plan.jobs,
        worker_threads,
        verbose,
    })?;

    let result = pipeline.run(&reporter);
    reporter.finish();
    let report = result?;

    if json {
        JsonMessage::summary(
            total_jobs,
            report.succeeded(),
            report.failed(),
            start_time.elapsed().as_secs_f64(),
        );
    } else {
        print_summary(&report);
        if args.report {
            report::print(&report);
        }
        verbose_println(
            verbose,
            &format!("Finished in {}", format_duration(start_time.elapsed())),
        );
    }

    if report.failed() > 0 && !json {
        error_println(&format!(
            "{} of {} jobs failed",
            report.failed(),
            total_jobs
        ));
    }

    report.into_result()?;
    Ok(())
}
