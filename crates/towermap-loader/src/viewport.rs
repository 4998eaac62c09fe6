//! Debounced viewport changes.
//!
//! Map views report a new viewport on every scroll and zoom step. The feed
//! waits until the view has been still for the configured debounce period
//! and only then asks the loader for the latest viewport.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::loader::IncrementalLoader;

/// Edges of a visible map area, as reported by the view.
///
/// `west` may be greater than `east` when the view crosses the date line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Background task forwarding debounced viewports to an [`IncrementalLoader`].
///
/// Stops on [`close`](Self::close), when the cancellation token fires, or
/// when the feed is dropped.
pub struct ViewportFeed {
    sender: mpsc::UnboundedSender<Viewport>,
    handle: tokio::task::JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl ViewportFeed {
    /// Spawn a feed using the loader's configured debounce period.
    pub fn new(loader: Arc<IncrementalLoader>) -> Self {
        let debounce = loader.config().debounce();
        Self::with_debounce(loader, debounce)
    }

    /// Spawn a feed with an explicit debounce period.
    pub fn with_debounce(loader: Arc<IncrementalLoader>, debounce: Duration) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Viewport>();
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            let mut latest: Option<Viewport> = None;

            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("Viewport feed cancelled, stopping");
                        break;
                    }
                    message = receiver.recv() => match message {
                        Some(viewport) => latest = Some(viewport),
                        None => {
                            debug!("Viewport senders dropped, stopping");
                            break;
                        }
                    },
                    _ = tokio::time::sleep(debounce), if latest.is_some() => {
                        if let Some(v) = latest.take()
                            && let Err(e) = loader.request_viewport(v.south, v.west, v.north, v.east)
                        {
                            warn!(viewport = ?v, error = %e, "Ignoring invalid viewport");
                        }
                    }
                }
            }
        });

        Self {
            sender,
            handle,
            cancel_token,
        }
    }

    /// Report the current viewport. Only the last one reported before the
    /// view settles is loaded.
    pub fn viewport_changed(&self, viewport: Viewport) {
        if self.sender.send(viewport).is_err() {
            debug!("Viewport feed stopped, ignoring change");
        }
    }

    /// Stop the feed. A viewport still waiting out its debounce is dropped.
    pub fn close(self) {
        self.cancel_token.cancel();
    }

    /// A token that stops the feed when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Whether the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for ViewportFeed {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
