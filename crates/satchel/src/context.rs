//! # Engine Context
//!
//! State shared by every view of one installed listener: the host, the
//! concurrency scope, configuration, the exception policy, and the
//! cross-player indices.
//!
//! The indices are touched from host event threads and worker tasks at the
//! same time, so every check-then-act happens under a single lock
//! acquisition.

use crate::click::ClickThrottle;
use crate::config::InterfacesConfig;
use crate::exception::ExceptionHandler;
use crate::host::InterfaceHost;
use crate::scope::InterfacesScope;
use crate::view::{InterfaceView, QueryEntry};
use parking_lot::Mutex;
use satchel_shared::PlayerId;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything views share.
pub struct InterfacesContext {
    pub(crate) host: Arc<dyn InterfaceHost>,
    pub(crate) scope: InterfacesScope,
    pub(crate) config: InterfacesConfig,
    pub(crate) exceptions: Arc<dyn ExceptionHandler>,
    pub(crate) views: ViewIndex,
    pub(crate) queries: QueryIndex,
    pub(crate) throttle: ClickThrottle,
}

impl InterfacesContext {
    pub(crate) fn new(
        host: Arc<dyn InterfaceHost>,
        scope: InterfacesScope,
        config: InterfacesConfig,
        exceptions: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            host,
            scope,
            config,
            exceptions,
            views: ViewIndex::default(),
            queries: QueryIndex::default(),
            throttle: ClickThrottle::default(),
        }
    }

    /// The host adapter.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &Arc<dyn InterfaceHost> {
        &self.host
    }

    /// The concurrency scope.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> &InterfacesScope {
        &self.scope
    }

    /// Engine configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &InterfacesConfig {
        &self.config
    }
}

impl std::fmt::Debug for InterfacesContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfacesContext")
            .field("scope", &self.scope)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Foreground container views and background player-inventory views.
#[derive(Default)]
pub(crate) struct ViewIndex {
    open: Mutex<HashMap<PlayerId, Arc<InterfaceView>>>,
    players: Mutex<HashMap<PlayerId, Arc<InterfaceView>>>,
}

impl ViewIndex {
    /// Makes `view` the player's foreground view. Returns the view it replaced.
    pub(crate) fn put_open(&self, view: &Arc<InterfaceView>) -> Option<Arc<InterfaceView>> {
        self.open
            .lock()
            .insert(view.player(), Arc::clone(view))
            .filter(|previous| !Arc::ptr_eq(previous, view))
    }

    pub(crate) fn open_view(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.open.lock().get(&player).cloned()
    }

    /// Removes `view` only if it is still the player's foreground view.
    pub(crate) fn evict(&self, view: &Arc<InterfaceView>) -> bool {
        let mut open = self.open.lock();
        match open.get(&view.player()) {
            Some(current) if Arc::ptr_eq(current, view) => {
                open.remove(&view.player());
                true
            }
            _ => false,
        }
    }

    pub(crate) fn take_open(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.open.lock().remove(&player)
    }

    /// Makes `view` the player's inventory view. Returns the view it replaced.
    pub(crate) fn put_player_view(&self, view: &Arc<InterfaceView>) -> Option<Arc<InterfaceView>> {
        self.players
            .lock()
            .insert(view.player(), Arc::clone(view))
            .filter(|previous| !Arc::ptr_eq(previous, view))
    }

    pub(crate) fn player_view(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.players.lock().get(&player).cloned()
    }

    pub(crate) fn take_player_view(&self, player: PlayerId) -> Option<Arc<InterfaceView>> {
        self.players.lock().remove(&player)
    }

    /// Empties both indices.
    pub(crate) fn drain(&self) -> Vec<Arc<InterfaceView>> {
        let mut drained: Vec<_> = self.open.lock().drain().map(|(_, view)| view).collect();
        drained.extend(self.players.lock().drain().map(|(_, view)| view));
        drained
    }
}

/// Pending chat queries, at most one per player.
#[derive(Default)]
pub(crate) struct QueryIndex {
    entries: Mutex<HashMap<PlayerId, QueryEntry>>,
}

impl QueryIndex {
    /// Registers a query, returning the one it displaced.
    pub(crate) fn insert(&self, player: PlayerId, entry: QueryEntry) -> Option<QueryEntry> {
        self.entries.lock().insert(player, entry)
    }

    pub(crate) fn take(&self, player: PlayerId) -> Option<QueryEntry> {
        self.entries.lock().remove(&player)
    }

    /// Takes the player's query only if it is the one with `id`.
    pub(crate) fn take_if(&self, player: PlayerId, id: u64) -> Option<QueryEntry> {
        let mut entries = self.entries.lock();
        match entries.get(&player) {
            Some(entry) if entry.id == id => entries.remove(&player),
            _ => None,
        }
    }

    /// Takes the player's query only if it belongs to `view`.
    pub(crate) fn take_for_view(&self, view: &Arc<InterfaceView>) -> Option<QueryEntry> {
        let mut entries = self.entries.lock();
        match entries.get(&view.player()) {
            Some(entry) if Arc::ptr_eq(&entry.view, view) => entries.remove(&view.player()),
            _ => None,
        }
    }

    pub(crate) fn contains(&self, player: PlayerId) -> bool {
        self.entries.lock().contains_key(&player)
    }

    pub(crate) fn drain(&self) -> Vec<QueryEntry> {
        self.entries.lock().drain().map(|(_, entry)| entry).collect()
    }
}
