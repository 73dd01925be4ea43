//! Estimate command - offline triangulation of a cell report file.

use std::path::Path;

use cellfix::cache::CellLocationCache;
use cellfix::cell::{observations_from_reports, read_cell_reports};
use cellfix::position::PositionReport;
use cellfix::time::{Clock, SystemClock};
use cellfix::triangulation::{estimate, Estimate, TriangulationConfig};

use super::common::describe_position;
use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner, cells: &Path, json: bool) -> Result<(), CliError> {
    runner.log_startup("estimate");

    let reports = read_cell_reports(cells)?;
    let observations = observations_from_reports(&reports);
    let mut cache = CellLocationCache::new(runner.store());
    let result = estimate(
        &observations,
        &mut cache,
        SystemClock.now_ms(),
        &TriangulationConfig::default(),
    );

    let report = match result {
        Estimate::Fix(fix) => Some(PositionReport::from(fix)),
        Estimate::InsufficientData => None,
    };

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::Runtime(format!("Failed to encode result: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "Cells:    {} reported, {} usable",
        reports.len(),
        observations.len()
    );
    println!("Lookups:  {}", cache.stats());
    match report {
        Some(report) => println!("Position: {}", describe_position(&report)),
        None => println!("Position: insufficient data (no usable cell found in dataset)"),
    }
    Ok(())
}
