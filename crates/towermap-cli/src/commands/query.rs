//! Read-only queries against the local database.

use std::io;

use anyhow::{Result, bail};
use towermap_store::{AreaQuery, Store, StoredMeasurement};
use towermap_types::Boundaries;

use super::write_output;
use crate::cli::OutputFormat;
use crate::format::{as_json, format_measurement_text, format_measurements_text, format_staged_text};

fn print_one(stored: &StoredMeasurement, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => write_output(None, &format_measurement_text(stored)?),
        OutputFormat::Json => write_output(None, &as_json(stored)?),
        OutputFormat::Csv => bail!("CSV output is only supported for area queries and export"),
    }
}

/// Execute the show command.
pub fn cmd_show(store: &Store, id: i64, format: OutputFormat) -> Result<()> {
    match store.get_measurement(id)? {
        Some(stored) => print_one(&stored, format),
        None => bail!("No measurement with id {id}"),
    }
}

/// Execute the last command.
pub fn cmd_last(store: &Store, format: OutputFormat) -> Result<()> {
    match store.last_measurement()? {
        Some(stored) => print_one(&stored, format),
        None => {
            println!("No measurements stored.");
            Ok(())
        }
    }
}

/// Execute the count command.
pub fn cmd_count(store: &Store) -> Result<()> {
    println!("Measurements: {}", store.count_measurements()?);
    println!("Staged locations: {}", store.count_staged()?);
    Ok(())
}

/// Execute the area command.
pub fn cmd_area(
    store: &Store,
    boundaries: Boundaries,
    limit: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut query = AreaQuery::new(boundaries);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }

    match format {
        OutputFormat::Csv => {
            store.export_csv(&query, io::stdout().lock())?;
            Ok(())
        }
        OutputFormat::Json => write_output(None, &as_json(&store.query_area(&query)?)?),
        OutputFormat::Text => {
            write_output(None, &format_measurements_text(&store.query_area(&query)?)?)
        }
    }
}

/// Execute the staged command.
pub fn cmd_staged(store: &Store, format: OutputFormat) -> Result<()> {
    let rows = store.staged_locations()?;
    match format {
        OutputFormat::Text => write_output(None, &format_staged_text(&rows)?),
        OutputFormat::Json => write_output(None, &as_json(&rows)?),
        OutputFormat::Csv => bail!("CSV output is not supported for staged locations"),
    }
}
