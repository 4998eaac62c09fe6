//! Import, stage and finalize commands.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;
use towermap_store::{InsertOutcome, Store};
use towermap_types::{Cell, Fix, Measurement, TemporaryLocation};

/// A GPS fix as written in input files. Optional fields default to zero
/// and a missing hash is computed.
#[derive(Debug, Deserialize)]
struct FixRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    accuracy: f64,
    #[serde(default)]
    speed: f64,
    #[serde(default)]
    bearing: f64,
    #[serde(default)]
    altitude: f64,
    #[serde(with = "time::serde::rfc3339")]
    measured_at: OffsetDateTime,
    #[serde(default)]
    content_hash: Option<String>,
}

impl FixRecord {
    fn fix(&self) -> Fix {
        Fix::new(self.latitude, self.longitude, self.measured_at)
            .accuracy(self.accuracy)
            .speed(self.speed)
            .bearing(self.bearing)
            .altitude(self.altitude)
    }
}

#[derive(Debug, Deserialize)]
struct MeasurementRecord {
    #[serde(flatten)]
    fix: FixRecord,
    cells: Vec<Cell>,
}

impl MeasurementRecord {
    fn into_measurement(self) -> Measurement {
        let mut m = Measurement::new(self.fix.fix(), self.cells);
        if let Some(hash) = self.fix.content_hash {
            m.content_hash = hash;
        }
        m
    }
}

impl From<FixRecord> for TemporaryLocation {
    fn from(record: FixRecord) -> Self {
        let mut location = TemporaryLocation::new(record.fix());
        if let Some(hash) = record.content_hash {
            location.content_hash = hash;
        }
        location
    }
}

/// Non-empty lines of `input` (`-` reads stdin), with 1-based line numbers.
fn read_lines(input: &Path) -> Result<Vec<(usize, String)>> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut lines = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        if !line.trim().is_empty() {
            lines.push((index + 1, line));
        }
    }
    Ok(lines)
}

/// Execute the import command.
pub fn cmd_import(store: &Store, input: &Path) -> Result<()> {
    let mut measurements = Vec::new();

    for (line_no, line) in read_lines(input)? {
        let record: MeasurementRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid measurement", input.display(), line_no))?;
        let measurement = record.into_measurement();
        measurement
            .validate()
            .with_context(|| format!("{}:{}: invalid measurement", input.display(), line_no))?;
        measurements.push(measurement);
    }

    let result = store
        .insert_measurements(&measurements)
        .context("Failed to import measurements")?;

    println!(
        "Imported {} measurements ({} duplicates ignored)",
        result.inserted, result.duplicates
    );
    Ok(())
}

/// Execute the stage command.
pub fn cmd_stage(store: &Store, input: &Path) -> Result<()> {
    let mut staged = 0;
    let mut duplicates = 0;

    for (line_no, line) in read_lines(input)? {
        let record: FixRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid location", input.display(), line_no))?;
        let location = TemporaryLocation::from(record);

        match store
            .stage_location(&location)
            .with_context(|| format!("{}:{}: failed to stage", input.display(), line_no))?
        {
            InsertOutcome::Inserted(_) => staged += 1,
            InsertOutcome::DuplicateIgnored => duplicates += 1,
        }
    }

    info!(staged, duplicates, "Staged locations");
    println!("Staged {} locations ({} duplicates ignored)", staged, duplicates);
    Ok(())
}

/// Execute the finalize command.
pub fn cmd_finalize(store: &Store, row_id: i64, cells: &str) -> Result<()> {
    let cells: Vec<Cell> = serde_json::from_str(cells).context("Invalid --cells JSON")?;

    match store.finalize_location(row_id, cells)? {
        Some(InsertOutcome::Inserted(id)) => {
            println!("Finalized staged location {row_id} as measurement {id}")
        }
        Some(InsertOutcome::DuplicateIgnored) => {
            println!("Staged location {row_id} matches an existing measurement; duplicate ignored")
        }
        None => bail!("No staged location with row id {row_id}"),
    }
    Ok(())
}
