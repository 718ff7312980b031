use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use super::column::Row;
use super::error::GridError;

/// Caller-supplied persistence function. Receives the full row collection.
pub type OnSave<T> = Arc<dyn Fn(Vec<T>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wrap an async closure as an [`OnSave`] handler.
pub fn on_save<T, F, Fut>(f: F) -> OnSave<T>
where
    F: Fn(Vec<T>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |rows| f(rows).boxed())
}

/// Rows handed to the save handler, tagged with the attempt they belong to.
#[derive(Debug, Clone)]
pub struct SaveRequest<T> {
    pub generation: u64,
    pub rows: Vec<T>,
}

struct InFlight<T> {
    generation: u64,
    rows: Vec<Arc<T>>,
}

/// Tracks the last persisted snapshot and the save in progress, if any.
pub(crate) struct SaveCoordinator<T> {
    snapshot: Vec<Arc<T>>,
    in_flight: Option<InFlight<T>>,
    next_generation: u64,
    last_error: Option<String>,
}

impl<T: Row> SaveCoordinator<T> {
    pub fn new(rows: &[Arc<T>]) -> Self {
        Self {
            snapshot: rows.to_vec(),
            in_flight: None,
            next_generation: 1,
            last_error: None,
        }
    }

    pub fn snapshot(&self) -> &[Arc<T>] {
        &self.snapshot
    }

    /// Recomputed on every call; there is no dirty flag to go stale.
    pub fn has_changes(&self, rows: &[Arc<T>]) -> bool {
        rows != self.snapshot.as_slice()
    }

    pub fn is_saving(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight_generation(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|f| f.generation)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a save of `rows`. `None` when there is nothing to save.
    pub fn begin(&mut self, rows: &[Arc<T>]) -> Result<Option<SaveRequest<T>>, GridError> {
        if self.is_saving() {
            return Err(GridError::SaveInFlight);
        }
        if !self.has_changes(rows) {
            return Ok(None);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.in_flight = Some(InFlight {
            generation,
            rows: rows.to_vec(),
        });
        tracing::info!(generation, rows = rows.len(), "save started");

        Ok(Some(SaveRequest {
            generation,
            rows: rows.iter().map(|r| T::clone(r)).collect(),
        }))
    }

    /// Settle the save tagged `generation`.
    ///
    /// Returns `None` when the result belongs to an attempt that is no longer
    /// in flight; such results change nothing.
    pub fn finish(
        &mut self,
        generation: u64,
        result: Result<(), String>,
    ) -> Option<Result<(), GridError>> {
        if self.in_flight_generation() != Some(generation) {
            tracing::debug!(generation, "ignoring stale save result");
            return None;
        }
        let in_flight = self.in_flight.take()?;

        match result {
            Ok(()) => {
                self.snapshot = in_flight.rows;
                self.last_error = None;
                tracing::info!(generation, "changes saved");
                Some(Ok(()))
            }
            Err(err) => {
                tracing::error!(generation, error = %err, "failed to save changes");
                self.last_error = Some(err.clone());
                Some(Err(GridError::Save(err)))
            }
        }
    }

    /// Accept `rows` as persisted without calling a handler.
    pub fn rebaseline(&mut self, rows: &[Arc<T>]) {
        self.snapshot = rows.to_vec();
        self.in_flight = None;
        self.last_error = None;
    }
}
