//! Background loading of stored measurements for a map display.
//!
//! This crate sits between a [`towermap_store::Store`] and whatever draws the
//! map. It keeps the displayed set in step with the visible area while the
//! user pans and zooms, without ever running two area queries at once.
//!
//! # Features
//!
//! - One query in flight; newer requests replace any parked one
//! - Cooperative, per-row cancellation
//! - Single measurements appended as they are collected, up to a cap
//! - Debounced viewport feed
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use towermap_loader::{ChannelSink, DisplayEvent, IncrementalLoader, LoaderConfig};
//! use towermap_store::Store;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(Store::open_in_memory()?);
//! let (sink, mut events) = ChannelSink::channel();
//! let loader = IncrementalLoader::new(store, Arc::new(sink), LoaderConfig::default());
//!
//! loader.request_viewport(52.0, 21.0, 52.2, 21.2)?;
//!
//! while let Some(event) = events.next().await {
//!     if let DisplayEvent::Loaded { measurements, .. } = event {
//!         println!("{} measurements in view", measurements.len());
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod display;
mod error;
mod loader;
mod viewport;

pub use config::{FieldError, LoaderConfig};
pub use display::{ChannelSink, DisplayEvent, DisplayEvents, DisplaySink};
pub use error::LoadError;
pub use loader::{IncrementalLoader, LoadOutcome, LoadState};
pub use viewport::{Viewport, ViewportFeed};
