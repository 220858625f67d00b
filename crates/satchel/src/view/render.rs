//! Render coalescing and the diff writer.

use super::{InterfaceView, ViewState};
use crate::error::{InterfacesError, InterfacesResult};
use crate::exception::InterfacesOperation;
use crate::pane::CompletedPane;
use crate::scope::with_timeout;
use satchel_shared::ContainerId;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::Instrument;

impl InterfaceView {
    /// Renders the composed layers into the host container.
    ///
    /// At most one pass runs per view. A call arriving while a pass is in
    /// flight only raises the render-again flag and returns; the running
    /// caller then performs exactly one more pass for all such calls.
    pub async fn render(self: &Arc<Self>) {
        self.render_again.store(true, Ordering::SeqCst);
        loop {
            let Ok(guard) = self.render_lock.try_lock() else {
                tracing::debug!(view = self.id, "render coalesced");
                return;
            };
            if !self.render_again.swap(false, Ordering::SeqCst) {
                return;
            }

            let span = tracing::debug_span!("render", view = self.id, player = %self.player);
            self.render_pass().instrument(span).await;
            drop(guard);

            if !self.render_again.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    /// Spawns a render task for this view.
    pub fn request_render(self: &Arc<Self>) {
        let view = Arc::clone(self);
        self.context.scope.spawn_for(self.player, "render", async move {
            view.render().await;
        });
    }

    async fn render_pass(self: &Arc<Self>) {
        let timeout = self.context.config.render_timeout();
        let mut retries = 0;
        loop {
            if !self.is_open() {
                return;
            }
            let composed = self.layers.lock().collapse();
            let Some(decorated) = self.decorate(composed) else {
                return;
            };

            let view = Arc::clone(self);
            let write = self.context.scope.on_primary(move || view.write_composed(&decorated));
            let result = with_timeout("render", timeout, async { write.await.and_then(|written| written) }).await;

            match result {
                Ok(()) => {
                    let passes = self.render_passes.fetch_add(1, Ordering::AcqRel) + 1;
                    tracing::debug!(view = self.id, passes, "render pass complete");
                    return;
                }
                Err(error) => {
                    if matches!(error, InterfacesError::Timeout { .. }) {
                        tracing::warn!(view = self.id, player = %self.player, %error, "render abandoned");
                    }
                    if !self.recover(InterfacesOperation::Rendering, &error, &mut retries) {
                        return;
                    }
                }
            }
        }
    }

    /// Applies the item decorator to every item. `None` if the view closed meanwhile.
    fn decorate(self: &Arc<Self>, composed: Arc<CompletedPane>) -> Option<Arc<CompletedPane>> {
        let Some(decorator) = self.interface.decorator() else {
            return Some(composed);
        };
        let mut decorated = (*composed).clone();
        for (_, cell) in decorated.iter_mut() {
            let Some(item) = cell.item.take() else {
                continue;
            };
            let result = self.guarded(InterfacesOperation::Decorating, || decorator.decorate(self.player, item.clone()));
            if !self.is_open() {
                return None;
            }
            cell.item = Some(result.unwrap_or(item));
        }
        Some(Arc::new(decorated))
    }

    /// Diff-writes `composed` to the host. Runs on the primary executor.
    fn write_composed(self: &Arc<Self>, composed: &CompletedPane) -> InterfacesResult<()> {
        if !self.is_open() {
            return Err(InterfacesError::Cancelled);
        }
        let host = &self.context.host;
        let shape = self.shape();
        let options = self.interface.options();

        let container = {
            let mut state = self.state.lock();
            let container = self.ensure_container(&mut state);
            if options.persist_items {
                self.scan_persisted(&mut state, container);
            }

            let mut written = HashMap::new();
            for point in shape.points() {
                let Some(slot) = shape.slot_at(point, container) else {
                    continue;
                };
                let Some(cell) = composed.get(point) else {
                    // Undefined cells are left alone when inheriting existing items.
                    continue;
                };
                let desired = match &cell.item {
                    Some(item) => {
                        // The element replaces whatever the player left there.
                        state.persisted.remove(&point);
                        written.insert(point, item.clone());
                        Some(item.clone())
                    }
                    None => state.persisted.get(&point).cloned(),
                };
                if host.item(self.player, slot) != desired {
                    host.set_item(self.player, slot, desired);
                }
            }
            state.written = written;
            state.painted = true;
            container
        };

        if self.open_if_closed.swap(false, Ordering::AcqRel) {
            if let Some(container) = container {
                if host.foreground_container(self.player) != Some(container) {
                    host.show_container(self.player, container);
                }
            }
        }
        Ok(())
    }

    fn ensure_container(&self, state: &mut ViewState) -> Option<ContainerId> {
        let shape = self.shape();
        if !shape.has_container() {
            return None;
        }
        match state.container {
            Some(container) if !state.needs_new_container => Some(container),
            _ => {
                let container = self
                    .context
                    .host
                    .create_container(self.player, &state.title, shape.container_rows());
                tracing::debug!(view = self.id, ?container, title = %state.title, "container created");
                state.container = Some(container);
                state.needs_new_container = false;
                state.written.clear();
                Some(container)
            }
        }
    }

    /// Picks up items in slots the panes do not own.
    fn scan_persisted(&self, state: &mut ViewState, container: Option<ContainerId>) {
        let shape = self.shape();
        for point in shape.points() {
            let Some(slot) = shape.slot_at(point, container) else {
                continue;
            };
            let live = self.context.host.item(self.player, slot);
            let owned = state.written.get(&point);
            match live {
                Some(live) if owned != Some(&live) => {
                    state.persisted.insert(point, live);
                }
                Some(_) => {}
                None => {
                    state.persisted.remove(&point);
                }
            }
        }
    }

    /// Clears what the view shows without closing it for good.
    pub(crate) fn hide(self: &Arc<Self>) {
        let view = Arc::clone(self);
        self.context.scope.run_on_primary(move || {
            let host = &view.context.host;
            let shape = view.shape();
            let container = {
                let mut state = view.state.lock();
                if shape.overlaps_player_inventory() {
                    let player_points: Vec<_> = state
                        .written
                        .keys()
                        .copied()
                        .filter(|point| point.row >= shape.container_rows())
                        .collect();
                    for point in player_points {
                        if let Some(slot) = shape.slot_at(point, None) {
                            host.set_item(view.player, slot, None);
                        }
                        state.written.remove(&point);
                    }
                    state.painted = false;
                }
                state.container
            };
            if let Some(container) = container {
                if host.foreground_container(view.player) == Some(container) {
                    host.close_container(view.player);
                }
            }
        });
    }
}
