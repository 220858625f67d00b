//! Click dispatch.

use super::InterfaceView;
use crate::click::{ClickContext, ClickInfo, ClickOutcome, PendingCompletion};
use crate::exception::InterfacesOperation;
use satchel_shared::{ClickTarget, ClickType, GridPoint, Modifiers};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds the view's processing-click flag; releases it on drop.
struct ClickLock(Arc<AtomicBool>);

impl ClickLock {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ClickLock {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl InterfaceView {
    /// Dispatches a click from the host.
    ///
    /// Runs synchronously so the outcome can cancel the host interaction.
    pub fn click(self: &Arc<Self>, target: ClickTarget, click_type: ClickType, modifiers: Modifiers) -> ClickOutcome {
        let Some(point) = self.shape().point_at(target) else {
            return match target {
                // Shift-clicks from the player's inventory would move items into the view.
                ClickTarget::Bottom(_) if click_type.is_shift() => ClickOutcome::rejected(),
                _ => ClickOutcome::passed(),
            };
        };
        self.click_point(point, click_type, modifiers)
    }

    pub(crate) fn click_point(self: &Arc<Self>, point: GridPoint, click_type: ClickType, modifiers: Modifiers) -> ClickOutcome {
        if !self.is_open() || self.is_processing_click() {
            return ClickOutcome::rejected();
        }
        let throttle = self.context.config.click_throttle();
        if !self.context.throttle.try_acquire(self.player, throttle) {
            tracing::debug!(player = %self.player, "click throttled");
            return ClickOutcome::rejected();
        }

        let handler = self
            .layers
            .lock()
            .collapse()
            .get(point)
            .map(|cell| cell.click.clone())
            .unwrap_or_default();
        if handler.is_empty() {
            return if self.interface.options().prevent_clicking_empty_slots {
                ClickOutcome::rejected()
            } else {
                ClickOutcome::passed()
            };
        }

        let Some(lock) = ClickLock::try_acquire(&self.processing_click) else {
            return ClickOutcome::rejected();
        };

        let info = ClickInfo {
            player: self.player,
            view: Arc::clone(self),
            click_type,
            point,
            modifiers,
        };
        for preprocessor in self.interface.preprocessors() {
            preprocessor(info.clone());
        }

        let mut context = ClickContext::new(info);
        let handled = self
            .guarded(InterfacesOperation::ClickHandling, || handler.handle(&mut context))
            .is_some();
        if !handled {
            context.cancel();
        }

        let cancelled = context.is_cancelled();
        if let Some(pending) = context.take_pending() {
            self.await_completion(lock, pending);
        }
        ClickOutcome {
            cancelled,
            handled: true,
        }
    }

    /// Keeps the click lock until the handler completes or the maximum wait elapses.
    fn await_completion(&self, lock: ClickLock, pending: PendingCompletion) {
        let max_wait = self.context.config.max_click_wait();
        let player = self.player;
        self.context.scope.spawn_for(player, "click-completion", async move {
            let _lock = lock;
            if tokio::time::timeout(max_wait, pending.receiver).await.is_err() {
                pending.cancelled.store(true, Ordering::Release);
                tracing::warn!(%player, ?max_wait, "click handler never completed, force cancelled");
            }
        });
    }
}
