//! Export command.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use towermap_store::{AreaQuery, Store};

/// Execute the export command: every stored measurement, as CSV.
pub fn cmd_export(store: &Store, output: Option<&Path>) -> Result<()> {
    let query = AreaQuery::world();

    let rows = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let rows = store.export_csv(&query, BufWriter::new(file))?;
            info!("Exported {} measurements to {}", rows, path.display());
            rows
        }
        None => store.export_csv(&query, io::stdout().lock())?,
    };

    if rows == 0 {
        info!("Database holds no measurements");
    }
    Ok(())
}
