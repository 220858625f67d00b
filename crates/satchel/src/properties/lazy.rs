//! Lazily loaded state with single-flight evaluation.

use super::Trigger;
use crate::error::InterfacesResult;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default window in which repeated evaluations share one load.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Future produced by a [`LazyProperty`] loader.
pub type LoadFuture<T> = Pin<Box<dyn Future<Output = InterfacesResult<T>> + Send>>;

type Loader<T> = Box<dyn Fn() -> LoadFuture<T> + Send + Sync>;

struct Loaded<T> {
    value: T,
    at: Instant,
}

struct LazyInner<T> {
    loader: Loader<T>,
    state: Mutex<Option<Loaded<T>>>,
    debounce: Duration,
    trigger: Trigger,
}

/// Property whose value comes from an async loader.
///
/// All requesters are serialized on one async lock, so concurrent callers
/// wait for the in-flight load instead of starting their own.
pub struct LazyProperty<T> {
    inner: Arc<LazyInner<T>>,
}

impl<T> Clone for LazyProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> LazyProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a property backed by `loader`.
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InterfacesResult<T>> + Send + 'static,
    {
        Self::with_debounce(DEFAULT_DEBOUNCE, loader)
    }

    /// Creates a property with a custom debounce window.
    pub fn with_debounce<F, Fut>(debounce: Duration, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InterfacesResult<T>> + Send + 'static,
    {
        Self {
            inner: Arc::new(LazyInner {
                loader: Box::new(move || Box::pin(loader())),
                state: Mutex::new(None),
                debounce,
                trigger: Trigger::new(),
            }),
        }
    }

    /// Value, loading it on first access.
    pub async fn get(&self) -> InterfacesResult<T> {
        let mut state = self.inner.state.lock().await;
        if let Some(loaded) = state.as_ref() {
            return Ok(loaded.value.clone());
        }
        let value = (self.inner.loader)().await?;
        *state = Some(Loaded {
            value: value.clone(),
            at: Instant::now(),
        });
        Ok(value)
    }

    /// Reloads the value and fires the trigger if it changed.
    ///
    /// Calls within the debounce window of the last load reuse its result.
    pub async fn reevaluate(&self) -> InterfacesResult<T> {
        let (value, changed) = {
            let mut state = self.inner.state.lock().await;
            if let Some(loaded) = state.as_ref() {
                if loaded.at.elapsed() < self.inner.debounce {
                    return Ok(loaded.value.clone());
                }
            }
            let value = (self.inner.loader)().await?;
            let changed = state.as_ref().map_or(true, |loaded| loaded.value != value);
            *state = Some(Loaded {
                value: value.clone(),
                at: Instant::now(),
            });
            (value, changed)
        };
        if changed {
            self.inner.trigger.trigger();
        }
        Ok(value)
    }

    /// Drops the cached value; the next `get` loads again.
    pub async fn invalidate(&self) {
        *self.inner.state.lock().await = None;
    }

    /// Trigger fired when a reevaluation changes the value.
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> &Trigger {
        &self.inner.trigger
    }
}

impl<T> std::fmt::Debug for LazyProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyProperty")
            .field("debounce", &self.inner.debounce)
            .finish_non_exhaustive()
    }
}
