//! Cancellable background loading of measurements for a map view.
//!
//! [`IncrementalLoader`] runs at most one area query at a time. A request
//! made while a query is in flight is parked in a single slot that always
//! holds the latest boundaries; when the running query finishes its result
//! is dropped and the parked request starts instead. This keeps a rapidly
//! panning view from ever seeing results land out of order.
//!
//! ```text
//!          request_load            finished, nothing parked
//!   Idle ───────────────▶ Loading ─────────────────────────▶ Idle (published)
//!                           │ ▲
//!          request_load     │ │ finished, request parked
//!          (parks bounds)   ▼ │ (result dropped, parked bounds start)
//!                         Loading
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use towermap_store::{Store, StoredMeasurement};
use towermap_types::{Boundaries, ValidationError};

use crate::config::LoaderConfig;
use crate::display::DisplaySink;
use crate::error::LoadError;

/// Whether a query is in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadState {
    /// Nothing is running.
    Idle,
    /// A query over these boundaries is running.
    Loading { boundaries: Boundaries },
}

/// How the most recent query ended.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Results were published.
    Completed { rows: usize },
    /// A newer request arrived while running; results were dropped.
    Superseded,
    /// The query was cancelled; results were dropped.
    Cancelled,
    /// The query failed; the display was told and kept its previous set.
    Failed(String),
}

#[derive(Default)]
struct Slot {
    /// Cancellation handle of the query in flight.
    loading: Option<CancellationToken>,
    /// Latest request made while a query was in flight.
    pending: Option<Boundaries>,
    /// Boundaries of the most recent request, used for cap reloads.
    last_requested: Option<Boundaries>,
    /// Measurements appended since the last publish.
    appended: usize,
    /// Measurements appended while the query in flight was running.
    appended_during_load: Vec<StoredMeasurement>,
    last_outcome: Option<LoadOutcome>,
}

struct Inner {
    store: Arc<Store>,
    sink: Arc<dyn DisplaySink>,
    config: LoaderConfig,
    slot: Mutex<Slot>,
    state: watch::Sender<LoadState>,
}

/// Coalescing, cancellable loader of measurements inside a viewport.
///
/// Requires a Tokio runtime: queries run on the blocking pool via
/// [`tokio::task::spawn_blocking`].
///
/// Dropping the loader cancels any query in flight.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use towermap_loader::{ChannelSink, DisplayEvent, IncrementalLoader, LoaderConfig};
/// use towermap_store::Store;
/// use towermap_types::Boundaries;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(Store::open_in_memory()?);
/// let (sink, mut events) = ChannelSink::channel();
/// let loader = IncrementalLoader::new(store, Arc::new(sink), LoaderConfig::default());
///
/// loader.request_load(Boundaries::new(52.0, 21.0, 52.2, 21.2)?);
/// loader.wait_idle().await;
///
/// assert!(matches!(events.recv().await, Some(DisplayEvent::Loaded { .. })));
/// # Ok(())
/// # }
/// ```
pub struct IncrementalLoader {
    inner: Arc<Inner>,
}

impl IncrementalLoader {
    /// Create an idle loader reading from `store` and feeding `sink`.
    pub fn new(store: Arc<Store>, sink: Arc<dyn DisplaySink>, config: LoaderConfig) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            inner: Arc::new(Inner {
                store,
                sink,
                config,
                slot: Mutex::new(Slot::default()),
                state,
            }),
        }
    }

    /// Load every measurement inside `boundaries` and publish it.
    ///
    /// Returns immediately. If a query is already running, `boundaries`
    /// replaces any request parked earlier and runs once the current query
    /// finishes; the current query's results are then dropped.
    pub fn request_load(&self, boundaries: Boundaries) {
        self.inner.request_load(boundaries);
    }

    /// Load a map viewport given by its edges.
    ///
    /// The box is normalized the way [`Boundaries::new`] does for views
    /// crossing the date line, then enlarged by
    /// [`LoaderConfig::boundary_scale`] so small pans stay inside the
    /// loaded area. Returns the boundaries actually requested.
    pub fn request_viewport(
        &self,
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    ) -> Result<Boundaries, ValidationError> {
        let boundaries =
            Boundaries::new(south, west, north, east)?.scaled(self.inner.config.boundary_scale)?;
        self.inner.request_load(boundaries);
        Ok(boundaries)
    }

    /// Cancel the query in flight and forget any parked request.
    ///
    /// Nothing is published for a cancelled query. The query stops within a
    /// row of noticing the cancellation.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Offer a newly stored measurement to the display.
    ///
    /// Up to [`LoaderConfig::max_incremental_appends`] measurements are
    /// appended between two publishes. Past that the loader reloads the
    /// last requested boundaries instead.
    ///
    /// A measurement appended while a query runs is also carried into that
    /// query's published set if it lies inside the boundaries and the query
    /// did not already return it.
    pub fn append(&self, measurement: StoredMeasurement) {
        self.inner.append(measurement);
    }

    /// Settings this loader was created with.
    pub fn config(&self) -> &LoaderConfig {
        &self.inner.config
    }

    /// The current state.
    pub fn state(&self) -> LoadState {
        *self.inner.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    /// Whether a query is running.
    pub fn is_loading(&self) -> bool {
        matches!(self.state(), LoadState::Loading { .. })
    }

    /// How the most recent query ended, if any has.
    pub fn last_outcome(&self) -> Option<LoadOutcome> {
        self.inner.lock_slot().last_outcome.clone()
    }

    /// Measurements appended since the last publish.
    pub fn appended_since_publish(&self) -> usize {
        self.inner.lock_slot().appended
    }

    /// Wait until no query is running or parked.
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == LoadState::Idle).await;
    }
}

impl Drop for IncrementalLoader {
    fn drop(&mut self) {
        self.inner.cancel();
    }
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        // The slot holds plain bookkeeping; a panic elsewhere leaves it usable.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn request_load(self: &Arc<Self>, boundaries: Boundaries) {
        let mut slot = self.lock_slot();
        slot.last_requested = Some(boundaries);

        if slot.loading.is_some() {
            debug!(?boundaries, "Load in flight, parking request");
            slot.pending = Some(boundaries);
            return;
        }

        self.start(&mut slot, boundaries);
    }

    fn start(self: &Arc<Self>, slot: &mut Slot, boundaries: Boundaries) {
        let token = CancellationToken::new();
        slot.loading = Some(token.clone());
        slot.appended_during_load.clear();
        self.state.send_replace(LoadState::Loading { boundaries });
        debug!(?boundaries, "Starting load");

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let store = Arc::clone(&inner.store);
            let query_token = token.clone();

            let result = tokio::task::spawn_blocking(move || {
                store.measurements_in_area_until(&boundaries, || query_token.is_cancelled())
            })
            .await;

            let result = match result {
                Ok(rows) => rows.map_err(LoadError::from),
                Err(e) => Err(LoadError::Task(e.to_string())),
            };

            inner.finish(&token, boundaries, result);
        });
    }

    fn finish(
        self: &Arc<Self>,
        token: &CancellationToken,
        boundaries: Boundaries,
        result: Result<Vec<StoredMeasurement>, LoadError>,
    ) {
        let mut slot = self.lock_slot();
        slot.loading = None;

        let outcome = if token.is_cancelled()
            || matches!(result, Err(LoadError::Store(towermap_store::Error::Cancelled)))
        {
            debug!(?boundaries, "Load cancelled, discarding results");
            LoadOutcome::Cancelled
        } else if slot.pending.is_some() {
            debug!(?boundaries, "Load superseded, discarding results");
            LoadOutcome::Superseded
        } else {
            match result {
                Ok(mut measurements) => {
                    merge_appended(
                        &mut measurements,
                        &boundaries,
                        std::mem::take(&mut slot.appended_during_load),
                    );
                    let rows = measurements.len();
                    debug!(?boundaries, rows, "Publishing load");
                    slot.appended = 0;
                    self.sink.publish(boundaries, measurements);
                    LoadOutcome::Completed { rows }
                }
                Err(e) => {
                    warn!(?boundaries, error = %e, "Load failed");
                    self.sink.load_failed(boundaries, &e);
                    LoadOutcome::Failed(e.to_string())
                }
            }
        };
        slot.last_outcome = Some(outcome);

        match slot.pending.take() {
            Some(next) => self.start(&mut slot, next),
            None => {
                self.state.send_replace(LoadState::Idle);
            }
        }
    }

    fn cancel(&self) {
        let mut slot = self.lock_slot();
        slot.pending = None;
        if let Some(token) = &slot.loading {
            debug!("Cancelling load in flight");
            token.cancel();
        }
    }

    fn append(self: &Arc<Self>, measurement: StoredMeasurement) {
        let mut slot = self.lock_slot();

        if slot.appended < self.config.max_incremental_appends {
            slot.appended += 1;
            if slot.loading.is_some() {
                slot.appended_during_load.push(measurement.clone());
            }
            debug!(
                id = measurement.id,
                appended = slot.appended,
                max = self.config.max_incremental_appends,
                "Appending measurement"
            );
            self.sink.append(measurement);
            return;
        }

        match slot.last_requested {
            Some(boundaries) => {
                debug!("Append limit reached, reloading");
                drop(slot);
                self.request_load(boundaries);
            }
            None => debug!(id = measurement.id, "Append limit reached with no area loaded"),
        }
    }
}

/// Add measurements appended during a query that the query itself missed,
/// The display has already received these through `append`.
fn merge_appended(
    measurements: &mut Vec<StoredMeasurement>,
    boundaries: &Boundaries,
    appended: Vec<StoredMeasurement>,
) {
    for m in appended {
        let inside = boundaries.contains(m.latitude(), m.longitude());
        if inside && !measurements.iter().any(|loaded| loaded.id == m.id) {
            measurements.push(m);
        }
    }
}
