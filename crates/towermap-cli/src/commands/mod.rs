//! Command implementations for the CLI.

mod browse;
mod config;
mod expire;
mod export;
mod import;
mod query;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

pub use browse::cmd_browse;
pub use config::cmd_config;
pub use expire::cmd_expire;
pub use export::cmd_export;
pub use import::{cmd_finalize, cmd_import, cmd_stage};
pub use query::{cmd_area, cmd_count, cmd_last, cmd_show, cmd_staged};

/// Write output to file or stdout
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
