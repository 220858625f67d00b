//! # Concurrency Scope
//!
//! One scope exists per plugin lifetime. It owns (or borrows) the tokio
//! runtime, the primary executor, and a registry of tasks keyed by player so
//! a disconnect or shutdown can cancel everything that player started.

use crate::config::InterfacesConfig;
use crate::error::{InterfacesError, InterfacesResult};
use crate::primary::PrimaryExecutor;
use parking_lot::Mutex;
use satchel_shared::PlayerId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::task::AbortHandle;
use tracing::Instrument;

/// A spawned task with its debug label.
struct TrackedTask {
    label: String,
    handle: AbortHandle,
}

/// Shared concurrency scope.
pub struct InterfacesScope {
    /// Owned runtime, if the scope built one.
    runtime: Option<Runtime>,
    /// Handle used for every spawn.
    handle: Handle,
    /// Container-thread marshalling.
    primary: Arc<dyn PrimaryExecutor>,
    /// Live tasks per player.
    tasks: Mutex<HashMap<PlayerId, Vec<TrackedTask>>>,
}

impl InterfacesScope {
    /// Builds a scope with its own multi-threaded runtime sized from the config.
    pub fn new(config: &InterfacesConfig, primary: Arc<dyn PrimaryExecutor>) -> InterfacesResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("satchel-worker")
            .enable_time()
            .build()
            .map_err(|e| InterfacesError::Config(format!("cannot build runtime: {e}")))?;
        let handle = runtime.handle().clone();

        Ok(Self {
            runtime: Some(runtime),
            handle,
            primary,
            tasks: Mutex::new(HashMap::new()),
        })
    }

    /// Builds a scope on an existing runtime.
    #[must_use]
    pub fn from_handle(handle: Handle, primary: Arc<dyn PrimaryExecutor>) -> Self {
        Self {
            runtime: None,
            handle,
            primary,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// The runtime handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Spawns a task that is not tied to any player.
    pub fn spawn<F>(&self, label: &str, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = tracing::debug_span!("task", label = label);
        self.handle.spawn(future.instrument(span)).abort_handle()
    }

    /// Spawns a task that is cancelled when `player` disconnects.
    pub fn spawn_for<F>(&self, player: PlayerId, label: impl Into<String>, future: F) -> AbortHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let label = label.into();
        let abort = self.spawn(&label, future);

        let mut tasks = self.tasks.lock();
        let entry = tasks.entry(player).or_default();
        entry.retain(|task| !task.handle.is_finished());
        entry.push(TrackedTask {
            label,
            handle: abort.clone(),
        });
        abort
    }

    /// Labels of the player's unfinished tasks.
    #[must_use]
    pub fn task_labels(&self, player: PlayerId) -> Vec<String> {
        self.tasks
            .lock()
            .get(&player)
            .map(|tasks| {
                tasks
                    .iter()
                    .filter(|task| !task.handle.is_finished())
                    .map(|task| task.label.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cancels every task started for the player.
    pub fn cancel_player(&self, player: PlayerId) -> usize {
        let Some(tasks) = self.tasks.lock().remove(&player) else {
            return 0;
        };
        let mut cancelled = 0;
        for task in tasks {
            if !task.handle.is_finished() {
                tracing::debug!(%player, label = %task.label, "cancelling task");
                task.handle.abort();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Cancels every tracked task.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.tasks.lock().drain().collect();
        for (_, tasks) in drained {
            for task in tasks {
                task.handle.abort();
            }
        }
    }

    /// Runs `job` on the primary executor and waits for its result.
    ///
    /// Runs in place when already on the primary thread.
    pub async fn on_primary<F, R>(&self, job: F) -> InterfacesResult<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.primary.is_primary_thread() {
            return Ok(job());
        }
        let (tx, rx) = tokio::sync::oneshot::channel();
        let accepted = self.primary.execute(Box::new(move || {
            let _ = tx.send(job());
        }));
        if !accepted {
            return Err(InterfacesError::PrimaryUnavailable);
        }
        rx.await.map_err(|_| InterfacesError::PrimaryUnavailable)
    }

    /// Runs `job` on the primary executor without waiting.
    pub fn run_on_primary<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.primary.is_primary_thread() {
            job();
            return true;
        }
        self.primary.execute(Box::new(job))
    }
}

impl Drop for InterfacesScope {
    fn drop(&mut self) {
        self.cancel_all();
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for InterfacesScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfacesScope")
            .field("owns_runtime", &self.runtime.is_some())
            .field("players_with_tasks", &self.tasks.lock().len())
            .finish_non_exhaustive()
    }
}

/// Bounds `future` by `duration`, mapping expiry to [`InterfacesError::Timeout`].
pub async fn with_timeout<T, F>(operation: &'static str, duration: Duration, future: F) -> InterfacesResult<T>
where
    F: Future<Output = InterfacesResult<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(InterfacesError::Timeout { operation, duration }),
    }
}
