//! # View Engine
//!
//! A view is one player's live instance of an [`Interface`]. It owns the
//! layer map, the pending-transform queue, and the open/close state, and
//! reconciles all of it with the host container.
//!
//! ```text
//!            trigger fires
//!                 │
//!                 ▼
//!   pending queue (FIFO, deduplicated)
//!                 │  drain: one worker at a time
//!                 ▼
//!   transform ──> Pane ──complete──> layer map ──collapse──> composed pane
//!                                                               │
//!                                        render: one pass at a time, coalesced
//!                                                               ▼
//!                                             diff-write on the primary executor
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Unopened ──open──> Open ──render*──> Open ──close / mark_closed──> Closed
//!                     ▲                                                 │
//!                     └────────────────────── open ─────────────────────┘
//! ```
//!
//! Opening sets two flags: `should_be_open` (intent, kept across renders) and
//! `open_if_closed` (one-shot, consumed by the next completed render, which
//! then shows the container). Work in flight checks `should_be_open` before
//! starting a render and before storing transform output.
//!
//! ## Tree
//!
//! A child holds its parent strongly and the parent holds its children
//! weakly, so an abandoned child is freed while [`InterfaceView::back`] can
//! always reach the parent.

mod click;
mod query;
mod render;

pub use query::ChatQuery;
pub(crate) use query::QueryEntry;

use crate::compositor::CollapsablePaneMap;
use crate::context::InterfacesContext;
use crate::error::{InterfacesError, InterfacesResult};
use crate::exception::{resolve, ExceptionContext, ExceptionResolution, InterfacesOperation};
use crate::interface::Interface;
use crate::pane::Pane;
use crate::scope::with_timeout;
use parking_lot::Mutex;
use satchel_shared::{ClickTarget, CloseReason, ContainerId, GridPoint, ItemStack, PlayerId, ViewShape};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::Instrument;

static NEXT_VIEW_ID: AtomicU64 = AtomicU64::new(1);

/// Message shown to a player whose inventory interface cannot be built.
const BUILD_FAILURE_MESSAGE: &str = "Your inventory could not be loaded. Please reconnect.";

/// Container-side state, only written on the primary executor.
#[derive(Debug, Default)]
struct ViewState {
    title: String,
    container: Option<ContainerId>,
    needs_new_container: bool,
    /// A render pass completed since the last hide.
    painted: bool,
    /// Transform output was dropped while closed.
    stale: bool,
    /// Items the panes own, by physical point.
    written: HashMap<GridPoint, ItemStack>,
    /// Player-placed items kept across renders.
    persisted: HashMap<GridPoint, ItemStack>,
}

/// One player's live instance of an interface.
pub struct InterfaceView {
    id: u64,
    player: PlayerId,
    interface: Arc<Interface>,
    context: Arc<InterfacesContext>,
    parent: Option<Arc<InterfaceView>>,
    children: Mutex<Vec<Weak<InterfaceView>>>,
    state: Mutex<ViewState>,
    layers: Mutex<CollapsablePaneMap>,
    pending: Mutex<VecDeque<usize>>,
    drain_lock: tokio::sync::Mutex<()>,
    render_lock: tokio::sync::Mutex<()>,
    render_again: AtomicBool,
    should_be_open: AtomicBool,
    open_if_closed: AtomicBool,
    in_query: AtomicBool,
    building_player: AtomicBool,
    processing_click: Arc<AtomicBool>,
    render_passes: AtomicU64,
}

impl InterfaceView {
    /// Creates an unopened view and subscribes it to its transforms' triggers.
    pub(crate) fn new(
        context: Arc<InterfacesContext>,
        interface: Arc<Interface>,
        player: PlayerId,
        parent: Option<Arc<InterfaceView>>,
    ) -> Arc<Self> {
        let shape = interface.shape();
        let fill_base = !interface.options().inherit_existing_items;
        let view = Arc::new(Self {
            id: NEXT_VIEW_ID.fetch_add(1, Ordering::Relaxed),
            player,
            state: Mutex::new(ViewState {
                title: interface.title().to_owned(),
                ..ViewState::default()
            }),
            layers: Mutex::new(CollapsablePaneMap::new(shape, fill_base)),
            interface,
            context,
            parent,
            children: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            drain_lock: tokio::sync::Mutex::new(()),
            render_lock: tokio::sync::Mutex::new(()),
            render_again: AtomicBool::new(false),
            should_be_open: AtomicBool::new(false),
            open_if_closed: AtomicBool::new(false),
            in_query: AtomicBool::new(false),
            building_player: AtomicBool::new(false),
            processing_click: Arc::new(AtomicBool::new(false)),
            render_passes: AtomicU64::new(0),
        });

        for applied in view.interface.transforms() {
            let priority = applied.priority;
            for trigger in &applied.triggers {
                trigger.add_listener(&view, move |view| view.enqueue(priority));
            }
        }

        if let Some(parent) = &view.parent {
            let mut children = parent.children.lock();
            children.retain(|child| child.strong_count() > 0);
            children.push(Arc::downgrade(&view));
        }

        tracing::debug!(view = view.id, player = %player, ?shape, "view created");
        view
    }

    /// Diagnostic identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Owning player.
    #[inline]
    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The definition this view instantiates.
    #[inline]
    #[must_use]
    pub fn interface(&self) -> &Arc<Interface> {
        &self.interface
    }

    /// Shape of the view.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> ViewShape {
        self.interface.shape()
    }

    /// Shared engine context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<InterfacesContext> {
        &self.context
    }

    /// Parent view, if this view was opened as a child.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<InterfaceView>> {
        self.parent.as_ref()
    }

    /// Children that are still alive.
    #[must_use]
    pub fn children(&self) -> Vec<Arc<InterfaceView>> {
        self.children.lock().iter().filter_map(Weak::upgrade).collect()
    }

    /// True while the application wants this view visible.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.should_be_open.load(Ordering::Acquire)
    }

    /// True while a chat query has the view's visuals suspended.
    #[inline]
    #[must_use]
    pub fn is_querying(&self) -> bool {
        self.in_query.load(Ordering::Acquire)
    }

    /// True if this view or any live descendant is open.
    #[must_use]
    pub fn is_tree_opened(&self) -> bool {
        self.is_open() || self.children().iter().any(|child| child.is_tree_opened())
    }

    /// Current title.
    #[must_use]
    pub fn title(&self) -> String {
        self.state.lock().title.clone()
    }

    /// Container currently backing the view.
    #[must_use]
    pub fn container(&self) -> Option<ContainerId> {
        self.state.lock().container
    }

    /// Number of completed render passes.
    #[inline]
    #[must_use]
    pub fn render_passes(&self) -> u64 {
        self.render_passes.load(Ordering::Acquire)
    }

    /// True while a click handler is running or completing later.
    #[inline]
    #[must_use]
    pub fn is_processing_click(&self) -> bool {
        self.processing_click.load(Ordering::Acquire)
    }

    /// Items the panes currently own.
    #[must_use]
    pub fn owned_items(&self) -> Vec<ItemStack> {
        self.state.lock().written.values().cloned().collect()
    }

    /// True if the panes currently own the slot at `target`.
    #[must_use]
    pub fn owns(&self, target: ClickTarget) -> bool {
        let Some(point) = self.shape().point_at(target) else {
            return false;
        };
        self.state.lock().written.contains_key(&point)
    }

    /// Opens (or re-opens) the view and waits for the first render.
    ///
    /// Blocking transforms finish before the render; background transforms
    /// render when they complete.
    pub async fn open(self: &Arc<Self>) {
        self.in_query.store(false, Ordering::Release);
        self.should_be_open.store(true, Ordering::Release);
        self.open_if_closed.store(true, Ordering::Release);
        self.register();

        let needs_setup = {
            let mut state = self.state.lock();
            let needs = !state.painted || state.stale || self.shape().overlaps_player_inventory();
            state.stale = false;
            needs
        };

        if needs_setup {
            let building = self.shape() == ViewShape::Player && !self.state.lock().painted;
            self.building_player.store(building, Ordering::Release);

            let (blocking, background): (Vec<_>, Vec<_>) =
                self.interface.transforms().iter().partition(|applied| applied.blocking);
            {
                let mut pending = self.pending.lock();
                for applied in blocking {
                    if !pending.contains(&applied.priority) {
                        pending.push_back(applied.priority);
                    }
                }
            }
            self.drain(true).await;
            self.building_player.store(false, Ordering::Release);

            for applied in background {
                self.enqueue(applied.priority);
            }
        }

        self.render().await;
    }

    fn register(self: &Arc<Self>) {
        let views = &self.context.views;
        let replaced = match self.shape() {
            ViewShape::Player => views.put_player_view(self),
            ViewShape::Combined { .. } => {
                // Combined views paint over the player's inventory view.
                if let Some(background) = views.player_view(self.player) {
                    background.mark_closed(CloseReason::OpenNew);
                }
                views.put_open(self)
            }
            ViewShape::Chest { .. } => views.put_open(self),
        };
        if let Some(replaced) = replaced {
            replaced.mark_closed(CloseReason::OpenNew);
        }
    }

    /// Closes the view, hiding its container if it is in the foreground.
    pub fn close(self: &Arc<Self>, reason: CloseReason) {
        let was_visible = self.is_open() || self.is_querying();
        self.mark_closed(reason);
        if !was_visible {
            return;
        }
        let Some(container) = self.container() else {
            return;
        };
        let host = Arc::clone(&self.context.host);
        let player = self.player;
        self.context.scope.run_on_primary(move || {
            if host.foreground_container(player) == Some(container) {
                host.close_container(player);
            }
        });
    }

    /// Records that the view is no longer visible.
    ///
    /// Duplicate calls are no-ops, so duplicate host close events are tolerated.
    pub fn mark_closed(self: &Arc<Self>, reason: CloseReason) {
        let was_open = self.should_be_open.swap(false, Ordering::AcqRel);
        let was_querying = self.in_query.swap(false, Ordering::AcqRel);
        if !was_open && !was_querying {
            return;
        }
        self.open_if_closed.store(false, Ordering::Release);
        self.context.views.evict(self);

        let switching = reason.is_view_switch();
        if !switching {
            if let Some(query) = self.context.queries.take_for_view(self) {
                query.abort();
            }
            for child in self.children() {
                child.mark_closed(reason);
            }
        }

        tracing::debug!(view = self.id, player = %self.player, ?reason, "view closed");

        let options = self.interface.options();
        if switching && options.skip_close_handler_on_view_switch {
            return;
        }
        for handler in self.interface.close_handlers() {
            if handler.accepts(reason) {
                handler.run(self, reason);
            }
        }
    }

    /// Re-opens the parent, or closes this view when it has none.
    pub async fn back(self: &Arc<Self>) {
        match &self.parent {
            Some(parent) => parent.open().await,
            None => self.close(CloseReason::Player),
        }
    }

    /// Changes the title. Hosts cannot retitle a live container, so the next
    /// render creates a fresh one and shows it if the view is visible.
    pub fn set_title(self: &Arc<Self>, title: impl Into<String>) {
        let title = title.into();
        {
            let mut state = self.state.lock();
            if state.title == title {
                return;
            }
            state.title = title;
            state.needs_new_container = true;
        }
        if self.is_open() {
            self.open_if_closed.store(true, Ordering::Release);
            self.request_render();
        }
    }

    /// Queues the transform with `priority` and makes sure a drain is running.
    pub(crate) fn enqueue(self: &Arc<Self>, priority: usize) {
        if !self.is_open() {
            self.state.lock().stale = true;
            return;
        }
        {
            let mut pending = self.pending.lock();
            if pending.contains(&priority) {
                return;
            }
            pending.push_back(priority);
        }
        let view = Arc::clone(self);
        let label = format!("transform:{priority}");
        self.context.scope.spawn_for(self.player, label, async move {
            if view.drain(false).await {
                view.render().await;
            }
        });
    }

    /// Runs queued transforms until the queue is empty. Returns true if any ran.
    ///
    /// With `wait` the call waits for a running drain to finish and then
    /// drains itself; otherwise it leaves the queue to the running worker.
    async fn drain(self: &Arc<Self>, wait: bool) -> bool {
        let mut ran = false;
        let mut wait = wait;
        loop {
            let guard = if wait {
                self.drain_lock.lock().await
            } else {
                match self.drain_lock.try_lock() {
                    Ok(guard) => guard,
                    Err(_) => return ran,
                }
            };
            wait = false;

            loop {
                let next = self.pending.lock().pop_front();
                let Some(priority) = next else {
                    break;
                };
                self.run_transform(priority).await;
                ran = true;
            }
            drop(guard);

            // Work queued after the last pop but before the unlock is ours.
            if self.pending.lock().is_empty() {
                return ran;
            }
        }
    }

    async fn run_transform(self: &Arc<Self>, priority: usize) {
        let Some(applied) = self.interface.transform(priority).cloned() else {
            return;
        };
        let base_operation = if self.building_player.load(Ordering::Acquire) {
            InterfacesOperation::BuildingPlayer
        } else {
            InterfacesOperation::Transforming
        };
        let timeout = self.context.config.transform_timeout();
        let span = tracing::debug_span!("transform", view = self.id, id = %applied.id);

        let mut retries = 0;
        loop {
            let attempt = with_timeout("transform", timeout, async {
                let mut pane = Pane::new(self.shape());
                applied.transform.apply(&mut pane, self).await?;
                pane.complete(self.player).await
            })
            .instrument(span.clone())
            .await;

            match attempt {
                Ok(completed) => {
                    if !self.is_open() {
                        self.state.lock().stale = true;
                        return;
                    }
                    self.layers.lock().insert(priority, completed);
                    return;
                }
                Err(error) => {
                    let operation = match error {
                        InterfacesError::PropertyLoad(_) if base_operation == InterfacesOperation::Transforming => {
                            InterfacesOperation::LoadingProperty
                        }
                        _ => base_operation,
                    };
                    if !self.recover(operation, &error, &mut retries) {
                        return;
                    }
                }
            }
        }
    }

    /// Routes a failure through the exception policy. Returns true to retry.
    pub(crate) fn recover(
        self: &Arc<Self>,
        operation: InterfacesOperation,
        error: &InterfacesError,
        retries: &mut u32,
    ) -> bool {
        let context = ExceptionContext {
            player: self.player,
            operation,
            retries: *retries,
            view: Some(Arc::clone(self)),
        };
        match resolve(&*self.context.exceptions, &*self.context.host, error, &context) {
            ExceptionResolution::Ignore => false,
            ExceptionResolution::Retry => {
                *retries += 1;
                true
            }
            ExceptionResolution::Close if operation == InterfacesOperation::BuildingPlayer => {
                tracing::error!(player = %self.player, %error, "player interface unusable, disconnecting");
                self.mark_closed(CloseReason::Plugin);
                let host = Arc::clone(&self.context.host);
                let player = self.player;
                self.context
                    .scope
                    .run_on_primary(move || host.disconnect(player, BUILD_FAILURE_MESSAGE));
                false
            }
            ExceptionResolution::Close => {
                self.close(CloseReason::Plugin);
                false
            }
        }
    }

    /// Runs a fallible unit of work under the exception policy until it
    /// succeeds or the policy gives up.
    pub(crate) fn guarded<T>(
        self: &Arc<Self>,
        operation: InterfacesOperation,
        mut work: impl FnMut() -> InterfacesResult<T>,
    ) -> Option<T> {
        let mut retries = 0;
        loop {
            match work() {
                Ok(value) => return Some(value),
                Err(error) => {
                    if !self.recover(operation, &error, &mut retries) {
                        return None;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for InterfaceView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceView")
            .field("id", &self.id)
            .field("player", &self.player)
            .field("shape", &self.shape())
            .field("open", &self.is_open())
            .field("querying", &self.is_querying())
            .finish_non_exhaustive()
    }
}
