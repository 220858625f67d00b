//! # Click Handling Types
//!
//! Handlers run synchronously inside the host's click event so they can
//! decide whether the interaction is cancelled. A handler that needs async
//! work calls [`ClickContext::complete_later`]; the view then blocks further
//! clicks until the returned [`ClickCompletion`] completes or the maximum
//! wait elapses.

use crate::error::InterfacesResult;
use crate::view::InterfaceView;
use parking_lot::Mutex;
use satchel_shared::{ClickType, GridPoint, Modifiers, PlayerId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type HandlerFn = dyn Fn(&mut ClickContext) -> InterfacesResult<()> + Send + Sync;

/// Handler bound to one element.
#[derive(Clone, Default)]
pub struct ClickHandler(Option<Arc<HandlerFn>>);

impl ClickHandler {
    /// No handler: the slot counts as empty for click purposes.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// Wraps a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&mut ClickContext) -> InterfacesResult<()> + Send + Sync + 'static,
    {
        Self(Some(Arc::new(handler)))
    }

    /// True when no handler is bound.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub(crate) fn handle(&self, context: &mut ClickContext) -> InterfacesResult<()> {
        match &self.0 {
            Some(handler) => handler(context),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for ClickHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(if self.is_empty() { "ClickHandler(none)" } else { "ClickHandler(..)" })
    }
}

/// Immutable description of a click, shared with preprocessors.
#[derive(Clone, Debug)]
pub struct ClickInfo {
    /// Who clicked.
    pub player: PlayerId,
    /// View that received the click.
    pub view: Arc<InterfaceView>,
    /// Kind of click.
    pub click_type: ClickType,
    /// Physical grid point that was clicked.
    pub point: GridPoint,
    /// Modifier keys held.
    pub modifiers: Modifiers,
}

/// Non-blocking hook run before the bound handler.
pub type ClickPreprocessor = Arc<dyn Fn(ClickInfo) + Send + Sync>;

/// Mutable state of one click while its handler runs.
#[derive(Debug)]
pub struct ClickContext {
    info: ClickInfo,
    cancelled: bool,
    pending: Option<PendingCompletion>,
}

#[derive(Debug)]
pub(crate) struct PendingCompletion {
    pub(crate) receiver: oneshot::Receiver<()>,
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl ClickContext {
    /// Interface clicks are cancelled unless the handler allows them.
    pub(crate) fn new(info: ClickInfo) -> Self {
        Self {
            info,
            cancelled: true,
            pending: None,
        }
    }

    /// Click description.
    #[inline]
    #[must_use]
    pub fn info(&self) -> &ClickInfo {
        &self.info
    }

    /// Who clicked.
    #[inline]
    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.info.player
    }

    /// View that received the click.
    #[inline]
    #[must_use]
    pub fn view(&self) -> &Arc<InterfaceView> {
        &self.info.view
    }

    /// Kind of click.
    #[inline]
    #[must_use]
    pub fn click_type(&self) -> ClickType {
        self.info.click_type
    }

    /// Physical grid point.
    #[inline]
    #[must_use]
    pub fn point(&self) -> GridPoint {
        self.info.point
    }

    /// Cancels the underlying host interaction.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Lets the host interaction proceed (e.g. taking the item).
    pub fn allow(&mut self) {
        self.cancelled = false;
    }

    /// Whether the host interaction will be cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Declares that the handler finishes asynchronously.
    ///
    /// Until the completion is completed (or times out) the view rejects clicks.
    pub fn complete_later(&mut self) -> ClickCompletion {
        let (sender, receiver) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        self.pending = Some(PendingCompletion {
            receiver,
            cancelled: Arc::clone(&cancelled),
        });
        ClickCompletion {
            sender: Some(sender),
            cancelled,
        }
    }

    pub(crate) fn take_pending(&mut self) -> Option<PendingCompletion> {
        self.pending.take()
    }
}

/// Completion token of a handler that completes later.
#[derive(Debug)]
pub struct ClickCompletion {
    sender: Option<oneshot::Sender<()>>,
    cancelled: Arc<AtomicBool>,
}

impl ClickCompletion {
    /// Marks the handler finished and releases the view.
    pub fn complete(mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(());
        }
    }

    /// True once the view gave up waiting and force-cancelled the handler.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Result of dispatching one click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    /// The host should cancel the interaction.
    pub cancelled: bool,
    /// A bound handler was invoked.
    pub handled: bool,
}

impl ClickOutcome {
    /// Cancelled without invoking a handler.
    #[must_use]
    pub const fn rejected() -> Self {
        Self {
            cancelled: true,
            handled: false,
        }
    }

    /// Allowed without invoking a handler.
    #[must_use]
    pub const fn passed() -> Self {
        Self {
            cancelled: false,
            handled: false,
        }
    }
}

/// Per-player minimum gap between clicks.
#[derive(Debug, Default)]
pub struct ClickThrottle {
    last: Mutex<HashMap<PlayerId, Instant>>,
}

impl ClickThrottle {
    /// Records a click and returns true if it is outside the window of the previous one.
    pub fn try_acquire(&self, player: PlayerId, window: Duration) -> bool {
        let now = Instant::now();
        let mut last = self.last.lock();
        match last.get(&player) {
            Some(previous) if now.duration_since(*previous) < window => false,
            _ => {
                last.insert(player, now);
                true
            }
        }
    }

    /// Forgets the player (on disconnect).
    pub fn forget(&self, player: PlayerId) {
        self.last.lock().remove(&player);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_window() {
        let throttle = ClickThrottle::default();
        let player = PlayerId(3);
        let window = Duration::from_millis(50);

        assert!(throttle.try_acquire(player, window));
        assert!(!throttle.try_acquire(player, window));
        assert!(throttle.try_acquire(PlayerId(4), window));

        std::thread::sleep(Duration::from_millis(60));
        assert!(throttle.try_acquire(player, window));

        throttle.forget(player);
        assert!(throttle.try_acquire(player, window));
    }

    #[test]
    fn test_empty_handler() {
        assert!(ClickHandler::none().is_empty());
        assert!(!ClickHandler::new(|_| Ok(())).is_empty());
    }
}
