//! The display side of the loader.
//!
//! The loader never renders anything. It hands finished result sets and
//! single appended measurements to a [`DisplaySink`]. [`ChannelSink`] turns
//! those calls into [`DisplayEvent`]s on a channel that an interactive task
//! can consume as a [`Stream`].

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use towermap_store::StoredMeasurement;
use towermap_types::Boundaries;

use crate::error::LoadError;

/// Receiver of loader output.
///
/// Methods are called from background tasks while the loader holds its
/// internal lock, so they must return quickly and must not call back into
/// the loader.
pub trait DisplaySink: Send + Sync + 'static {
    /// Replace the displayed set with the result of a completed load.
    fn publish(&self, boundaries: Boundaries, measurements: Vec<StoredMeasurement>);

    /// Add one newly stored measurement to the displayed set.
    fn append(&self, measurement: StoredMeasurement);

    /// A load failed. The displayed set should be left as it is.
    fn load_failed(&self, boundaries: Boundaries, error: &LoadError) {
        let _ = (boundaries, error);
    }
}

/// Something the display should do.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// A load completed; show exactly these measurements.
    Loaded {
        boundaries: Boundaries,
        measurements: Vec<StoredMeasurement>,
    },
    /// Add a single measurement to what is shown.
    Appended(StoredMeasurement),
    /// A load failed; keep what is shown.
    LoadFailed {
        boundaries: Boundaries,
        message: String,
    },
}

/// A [`DisplaySink`] that forwards everything over an unbounded channel.
///
/// Sending never blocks. Events sent after the receiving side is dropped are
/// discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<DisplayEvent>,
}

impl ChannelSink {
    /// Create a sink and the stream of events it produces.
    pub fn channel() -> (Self, DisplayEvents) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, DisplayEvents { receiver })
    }

    fn send(&self, event: DisplayEvent) {
        if self.sender.send(event).is_err() {
            debug!("Display receiver dropped, discarding event");
        }
    }
}

impl DisplaySink for ChannelSink {
    fn publish(&self, boundaries: Boundaries, measurements: Vec<StoredMeasurement>) {
        self.send(DisplayEvent::Loaded {
            boundaries,
            measurements,
        });
    }

    fn append(&self, measurement: StoredMeasurement) {
        self.send(DisplayEvent::Appended(measurement));
    }

    fn load_failed(&self, boundaries: Boundaries, error: &LoadError) {
        self.send(DisplayEvent::LoadFailed {
            boundaries,
            message: error.to_string(),
        });
    }
}

/// Stream of [`DisplayEvent`]s produced by a [`ChannelSink`].
///
/// Ends once every sink clone has been dropped.
pub struct DisplayEvents {
    receiver: mpsc::UnboundedReceiver<DisplayEvent>,
}

impl DisplayEvents {
    /// Wait for the next event.
    pub async fn recv(&mut self) -> Option<DisplayEvent> {
        self.receiver.recv().await
    }

    /// Take an event if one is already queued.
    pub fn try_recv(&mut self) -> Option<DisplayEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for DisplayEvents {
    type Item = DisplayEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_channel_sink_forwards_in_order() {
        let (sink, mut events) = ChannelSink::channel();

        sink.publish(Boundaries::WORLD, Vec::new());
        sink.load_failed(
            Boundaries::WORLD,
            &LoadError::Task("boom".to_string()),
        );
        drop(sink);

        assert_eq!(
            events.next().await,
            Some(DisplayEvent::Loaded {
                boundaries: Boundaries::WORLD,
                measurements: Vec::new(),
            })
        );
        match events.next().await {
            Some(DisplayEvent::LoadFailed { message, .. }) => {
                assert_eq!(message, "Load task failed: boom")
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(events.next().await, None);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let (sink, events) = ChannelSink::channel();
        drop(events);
        sink.publish(Boundaries::WORLD, Vec::new());
    }

    #[test]
    fn test_try_recv_empty() {
        let (_sink, mut events) = ChannelSink::channel();
        assert!(events.try_recv().is_none());
    }
}
