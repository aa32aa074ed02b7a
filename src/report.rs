//! Summary table for a finished run
//!
//! One row per job with its output path, result size, timing and status.

use prettytable::{format, Cell, Row, Table};
use std::path::Path;

use crate::pipeline::{JobOutcome, RunReport};
use crate::utils::{format_bytes, format_duration};

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

fn status_cell(outcome: &JobOutcome) -> Cell {
    match &outcome.error {
        None => Cell::new("ok").style_spec("Fg"),
        Some(error) if error.is_io() => Cell::new("write failed").style_spec("Fr"),
        Some(_) => Cell::new("transform failed").style_spec("Fr"),
    }
}

/// Build the job table for a run
pub fn build_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BOX_CHARS);

    // Add header
    table.add_row(Row::new(vec![
        Cell::new("Operation"),
        Cell::new("Output"),
        Cell::new("Size"),
        Cell::new("Time"),
        Cell::new("Status"),
    ]));

    for outcome in &report.outcomes {
        let size = outcome
            .output_bytes
            .map(format_bytes)
            .unwrap_or_else(|| "-".to_string());

        table.add_row(Row::new(vec![
            Cell::new(&outcome.operation.to_string()),
            Cell::new(&file_name(&outcome.output)),
            Cell::new(&size),
            Cell::new(&format_duration(outcome.duration)),
            status_cell(outcome),
        ]));
    }

    table
}

/// Print the run report as a formatted table
pub fn print(report: &RunReport) {
    println!();
    println!(
        "REPORT: {} ({})",
        file_name(&report.input),
        format_bytes(report.input_bytes)
    );
    build_table(report).printstd();
    println!();
}
