//! # Listener Adapter
//!
//! Translates host events into engine calls. The host constructs exactly one
//! listener per plugin lifetime and forwards its events to it.
//!
//! ```text
//! host event ──> InterfacesListener ──> view lookup (index) ──> InterfaceView
//!                                                                   │
//!                             host writes <── primary executor <────┘
//! ```

use crate::click::ClickOutcome;
use crate::config::InterfacesConfig;
use crate::context::InterfacesContext;
use crate::error::{InterfacesError, InterfacesResult};
use crate::exception::{DefaultExceptionHandler, ExceptionHandler};
use crate::host::InterfaceHost;
use crate::interface::Interface;
use crate::scope::InterfacesScope;
use crate::view::InterfaceView;
use parking_lot::Mutex;
use satchel_shared::{ClickTarget, ClickType, CloseReason, ContainerId, ItemStack, Modifiers, PlayerId};
use std::sync::Arc;

/// Hosts that currently have a listener installed, by adapter address.
static INSTALLED: Mutex<Vec<usize>> = parking_lot::const_mutex(Vec::new());

fn host_key(host: &Arc<dyn InterfaceHost>) -> usize {
    Arc::as_ptr(host).cast::<()>() as usize
}

/// The single event entry point of the engine.
pub struct InterfacesListener {
    context: Arc<InterfacesContext>,
    key: usize,
}

impl InterfacesListener {
    /// Installs the listener with the default exception policy.
    pub fn install(
        host: Arc<dyn InterfaceHost>,
        scope: InterfacesScope,
        config: InterfacesConfig,
    ) -> InterfacesResult<Self> {
        let exceptions = Arc::new(DefaultExceptionHandler::new(config.max_player_build_retries));
        Self::install_with(host, scope, config, exceptions)
    }

    /// Installs the listener with a custom exception policy.
    ///
    /// Fails with [`InterfacesError::AlreadyInstalled`] if a listener for the
    /// same host is still alive.
    pub fn install_with(
        host: Arc<dyn InterfaceHost>,
        scope: InterfacesScope,
        config: InterfacesConfig,
        exceptions: Arc<dyn ExceptionHandler>,
    ) -> InterfacesResult<Self> {
        config.validate()?;
        let key = host_key(&host);
        {
            let mut installed = INSTALLED.lock();
            if installed.contains(&key) {
                return Err(InterfacesError::AlreadyInstalled);
            }
            installed.push(key);
        }
        tracing::info!(worker_threads = config.worker_threads, "interface listener installed");
        Ok(Self {
            context: Arc::new(InterfacesContext::new(host, scope, config, exceptions)),
            key,
        })
    }

    /// Shared engine context.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Arc<InterfacesContext> {
        &self.context
    }

    /// Creates an unopened view of `interface` for `player`.
    #[must_use]
    pub fn create_view(&self, player: PlayerId, interface: &Arc<Interface>) -> Arc<InterfaceView> {
        InterfaceView::new(Arc::clone(&self.context), Arc::clone(interface), player, None)
    }

    /// Opens `interface` for `player` and waits for its first render.
    pub async fn open(&self, player: PlayerId, interface: &Arc<Interface>) -> Arc<InterfaceView> {
        let view = self.create_view(player, interface);
        view.open().await;
        view
    }

    /// Opens `interface` as a child of `parent`; [`InterfaceView::back`] returns to the parent.
    pub async fn open_child(&self, parent: &Arc<InterfaceView>, interface: &Arc<Interface>) -> Arc<InterfaceView> {
        let view = InterfaceView::new(
            Arc::clone(&self.context),
            Arc::clone(interface),
            parent.player(),
            Some(Arc::clone(parent)),
        );
        view.open().await;
        view
    }

    /// The player's foreground container view.
    #[must_use]
    pub fn open_view(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.context.views.open_view(player)
    }

    /// The player's own inventory view.
    #[must_use]
    pub fn player_view(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.context.views.player_view(player)
    }

    /// A container became the player's foreground.
    ///
    /// A container that no view owns means something outside the engine
    /// replaced the player's view.
    pub fn on_container_open(&self, player: PlayerId, container: ContainerId) {
        let Some(view) = self.context.views.open_view(player) else {
            return;
        };
        if view.container() != Some(container) {
            view.mark_closed(CloseReason::OpenNew);
        }
    }

    /// The player's container `container` closed.
    ///
    /// Hosts report the old container's close after a switch has already
    /// shown the new one, so only the view owning `container` is closed.
    /// Closes for a container another view has replaced are stale.
    pub fn on_container_close(&self, player: PlayerId, container: ContainerId, reason: CloseReason) {
        if let Some(view) = self.context.views.open_view(player) {
            if view.container() != Some(container) {
                tracing::debug!(%player, ?container, ?reason, "stale container close ignored");
                return;
            }
            view.mark_closed(reason);
        }
        if !self.context.config.reopens_on(reason) {
            return;
        }
        let Some(background) = self.context.views.player_view(player) else {
            return;
        };
        let context = Arc::clone(&self.context);
        self.context.scope.spawn_for(player, "reopen-background", async move {
            let covered = context
                .views
                .open_view(player)
                .is_some_and(|view| view.shape().overlaps_player_inventory());
            if !covered && !context.queries.contains(player) {
                background.open().await;
            }
        });
    }

    /// A click in an inventory.
    pub fn on_click(
        &self,
        player: PlayerId,
        target: ClickTarget,
        click_type: ClickType,
        modifiers: Modifiers,
    ) -> ClickOutcome {
        let foreground = self.context.views.open_view(player);
        match (target, foreground) {
            (ClickTarget::Bottom(_), Some(view)) if !view.shape().overlaps_player_inventory() => {
                // Chest on top: the bottom half still belongs to the player view.
                if click_type.is_shift() {
                    return ClickOutcome::rejected();
                }
                self.player_click(player, target, click_type, modifiers)
            }
            (_, Some(view)) => view.click(target, click_type, modifiers),
            (ClickTarget::Bottom(_), None) => self.player_click(player, target, click_type, modifiers),
            _ => ClickOutcome::passed(),
        }
    }

    fn player_click(
        &self,
        player: PlayerId,
        target: ClickTarget,
        click_type: ClickType,
        modifiers: Modifiers,
    ) -> ClickOutcome {
        match self.context.views.player_view(player) {
            Some(view) if view.is_open() => view.click(target, click_type, modifiers),
            _ => ClickOutcome::passed(),
        }
    }

    /// A physical interaction with the item in hotbar slot `held_slot`.
    pub fn on_interact(&self, player: PlayerId, held_slot: usize, click_type: ClickType) -> ClickOutcome {
        let target = ClickTarget::Bottom(held_slot);
        let view = self
            .context
            .views
            .open_view(player)
            .filter(|view| view.shape().overlaps_player_inventory())
            .or_else(|| self.context.views.player_view(player));
        match view {
            Some(view) if view.is_open() => view.click(target, click_type, Modifiers::default()),
            _ => ClickOutcome::passed(),
        }
    }

    /// The player tries to drop the item in `slot` of their inventory.
    ///
    /// Returns true when the drop must be cancelled because a view owns the slot.
    pub fn on_drop_item(&self, player: PlayerId, slot: usize) -> bool {
        let views = [self.context.views.open_view(player), self.context.views.player_view(player)];
        views.into_iter().flatten().any(|view| {
            view.is_open()
                && view.shape().overlaps_player_inventory()
                && view.owns(ClickTarget::Bottom(slot))
        })
    }

    /// The player died; removes view-owned items from the drops.
    pub fn on_death(&self, player: PlayerId, drops: &mut Vec<ItemStack>) {
        let Some(view) = self.context.views.player_view(player) else {
            return;
        };
        let owned = view.owned_items();
        drops.retain(|item| !owned.contains(item));
    }

    /// The player respawned; their inventory was reset and is painted again.
    pub fn on_respawn(&self, player: PlayerId) {
        let Some(view) = self.context.views.player_view(player) else {
            return;
        };
        self.context.scope.spawn_for(player, "respawn", async move {
            view.open().await;
        });
    }

    /// The player left. Everything tied to them is dropped.
    pub fn on_quit(&self, player: PlayerId) {
        if let Some(query) = self.context.queries.take(player) {
            let view = Arc::clone(&query.view);
            query.abort();
            view.mark_closed(CloseReason::Disconnect);
        }
        if let Some(view) = self.context.views.take_open(player) {
            view.mark_closed(CloseReason::Disconnect);
        }
        if let Some(view) = self.context.views.take_player_view(player) {
            view.mark_closed(CloseReason::Disconnect);
        }
        let cancelled = self.context.scope.cancel_player(player);
        self.context.throttle.forget(player);
        tracing::info!(%player, cancelled, "player interfaces released");
    }

    /// A chat line. Returns true when it answered a query and must not be broadcast.
    pub fn on_chat(&self, player: PlayerId, message: &str) -> bool {
        match self.context.queries.take(player) {
            Some(query) => {
                query.complete(message.to_owned());
                true
            }
            None => false,
        }
    }

    /// Closes every view and cancels all engine tasks.
    pub fn shutdown(&self) {
        let mut views = self.context.views.drain();
        for query in self.context.queries.drain() {
            views.push(Arc::clone(&query.view));
            query.abort();
        }
        let closed = views.len();
        for view in views {
            view.mark_closed(CloseReason::Shutdown);
        }
        self.context.scope.cancel_all();
        tracing::info!(closed, "interface listener shut down");
    }
}

impl Drop for InterfacesListener {
    fn drop(&mut self) {
        self.shutdown();
        INSTALLED.lock().retain(|key| *key != self.key);
    }
}

impl std::fmt::Debug for InterfacesListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfacesListener")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
