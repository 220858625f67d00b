//! Chat queries: suspend a view to collect one line of chat.
//!
//! ```text
//! query() ──> evict from index ──> hide ──> prompt ──┬── chat line ──> on_complete ──> re-open
//!                                                    └── timeout ────> on_cancel ────> re-open
//! ```
//!
//! A player has at most one query. Starting another, closing the view, or
//! disconnecting aborts the pending one without running its callbacks.

use super::InterfaceView;
use crate::error::InterfacesResult;
use crate::exception::InterfacesOperation;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);

type CompleteFn = Box<dyn FnOnce(&Arc<InterfaceView>, String) -> InterfacesResult<()> + Send>;
type CancelFn = Box<dyn FnOnce(&Arc<InterfaceView>) + Send>;

/// Definition of a chat query.
pub struct ChatQuery {
    prompt: String,
    timeout: Option<Duration>,
    on_complete: CompleteFn,
    on_cancel: Option<CancelFn>,
}

impl ChatQuery {
    /// Query sending `prompt` and passing the player's reply to `on_complete`.
    pub fn new<F>(prompt: impl Into<String>, on_complete: F) -> Self
    where
        F: FnOnce(&Arc<InterfaceView>, String) -> InterfacesResult<()> + Send + 'static,
    {
        Self {
            prompt: prompt.into(),
            timeout: None,
            on_complete: Box::new(on_complete),
            on_cancel: None,
        }
    }

    /// Overrides the configured query timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Called when the player does not answer in time.
    #[must_use]
    pub fn on_cancel<F>(mut self, on_cancel: F) -> Self
    where
        F: FnOnce(&Arc<InterfaceView>) + Send + 'static,
    {
        self.on_cancel = Some(Box::new(on_cancel));
        self
    }
}

impl std::fmt::Debug for ChatQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatQuery")
            .field("prompt", &self.prompt)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// A pending query in the cross-player index.
pub(crate) struct QueryEntry {
    pub(crate) id: u64,
    pub(crate) view: Arc<InterfaceView>,
    on_complete: CompleteFn,
    on_cancel: Option<CancelFn>,
    timer: AbortHandle,
}

impl QueryEntry {
    /// Drops the query without running its callbacks.
    pub(crate) fn abort(self) {
        self.timer.abort();
        tracing::debug!(player = %self.view.player(), query = self.id, "query aborted");
    }

    /// Delivers the player's reply and re-opens the view.
    pub(crate) fn complete(self, message: String) {
        self.timer.abort();
        let Self { id, view, on_complete, .. } = self;
        tracing::debug!(player = %view.player(), query = id, "query answered");

        let task_view = Arc::clone(&view);
        view.context.scope.spawn_for(view.player(), "query-complete", async move {
            let view = task_view;
            let mut callback = Some(on_complete);
            let completed = view.guarded(InterfacesOperation::Querying, || match callback.take() {
                Some(callback) => callback(&view, message.clone()),
                None => Ok(()),
            });
            if completed.is_some() {
                view.reopen_after_query().await;
            }
        });
    }
}

impl InterfaceView {
    /// Suspends the view and asks the player for a chat line.
    pub fn query(self: &Arc<Self>, query: ChatQuery) {
        let player = self.player;
        if let Some(previous) = self.context.queries.take(player) {
            previous.abort();
        }

        self.in_query.store(true, Ordering::Release);
        self.should_be_open.store(false, Ordering::Release);
        self.open_if_closed.store(false, Ordering::Release);
        self.context.views.evict(self);
        self.hide();

        let host = Arc::clone(&self.context.host);
        let prompt = query.prompt;
        self.context.scope.run_on_primary(move || host.send_message(player, &prompt));

        let id = NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed);
        let timeout = query.timeout.unwrap_or_else(|| self.context.config.query_timeout());
        let view = Arc::clone(self);
        // The timer starts counting only once the entry is in the index.
        let (armed_tx, armed_rx) = tokio::sync::oneshot::channel::<()>();
        let timer = self.context.scope.spawn_for(player, "query-timeout", async move {
            let _ = armed_rx.await;
            tokio::time::sleep(timeout).await;
            let Some(entry) = view.context.queries.take_if(view.player(), id) else {
                return;
            };
            tracing::debug!(%player, query = id, ?timeout, "query timed out");
            if let Some(on_cancel) = entry.on_cancel {
                on_cancel(&view);
            }
            view.reopen_after_query().await;
        });

        tracing::debug!(%player, query = id, "query started");
        let displaced = self.context.queries.insert(
            player,
            QueryEntry {
                id,
                view: Arc::clone(self),
                on_complete: query.on_complete,
                on_cancel: query.on_cancel,
                timer,
            },
        );
        if let Some(displaced) = displaced {
            displaced.abort();
        }
        let _ = armed_tx.send(());
    }

    /// Re-opens after a query unless something else closed or replaced the view.
    async fn reopen_after_query(self: &Arc<Self>) {
        if !self.is_querying() {
            return;
        }
        let replaced = self
            .context
            .views
            .open_view(self.player)
            .is_some_and(|current| !Arc::ptr_eq(&current, self));
        if replaced {
            self.in_query.store(false, Ordering::Release);
            return;
        }
        self.open().await;
    }
}
