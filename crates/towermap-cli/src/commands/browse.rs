//! Browse command: one viewport load through the incremental loader.

use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::json;
use towermap_loader::{ChannelSink, DisplayEvent, IncrementalLoader, LoaderConfig};
use towermap_store::Store;

use super::write_output;
use crate::cli::OutputFormat;
use crate::format::{as_json, radio_summary};

/// Execute the browse command.
///
/// The viewport is normalized and enlarged exactly as a map view's would
/// be, then loaded in the background and reported once published.
pub async fn cmd_browse(
    store: Arc<Store>,
    config: &LoaderConfig,
    viewport: (f64, f64, f64, f64),
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Csv {
        bail!("CSV output is not supported for browse; use `area --format csv`");
    }

    let (sink, mut events) = ChannelSink::channel();
    let loader = IncrementalLoader::new(store, Arc::new(sink), config.clone());

    let (south, west, north, east) = viewport;
    loader.request_viewport(south, west, north, east)?;
    loader.wait_idle().await;

    match events.try_recv() {
        Some(DisplayEvent::Loaded {
            boundaries,
            measurements,
        }) => match format {
            OutputFormat::Json => write_output(
                None,
                &as_json(&json!({
                    "boundaries": boundaries,
                    "measurements": measurements,
                }))?,
            ),
            _ => {
                println!(
                    "Loaded area {:.5},{:.5} .. {:.5},{:.5} (viewport scaled by {})",
                    boundaries.min_lat(),
                    boundaries.min_lon(),
                    boundaries.max_lat(),
                    boundaries.max_lon(),
                    config.boundary_scale
                );
                let summary = radio_summary(&measurements);
                if summary.is_empty() {
                    println!("{} measurements", measurements.len());
                } else {
                    println!("{} measurements ({})", measurements.len(), summary);
                }
                Ok(())
            }
        },
        Some(DisplayEvent::LoadFailed { message, .. }) => bail!("Load failed: {message}"),
        _ => bail!("Load finished without publishing a result"),
    }
}
