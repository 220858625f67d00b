//! # Exception Policy
//!
//! Every failure outside cancellation is classified by the operation that
//! produced it and handed to an [`ExceptionHandler`], which decides whether
//! to swallow it, retry the unit of work, or close the owning view.
//!
//! ```text
//! error ──> cancellation? ──yes──> Ignore (never reaches the handler)
//!              │ no
//!              ▼
//!         handler.handle(error, context) ──> Retry ──> player gone / shutdown? ──> Ignore
//!                                      └───> Ignore | Close
//! ```

use crate::error::InterfacesError;
use crate::host::InterfaceHost;
use crate::view::InterfaceView;
use satchel_shared::PlayerId;
use std::sync::Arc;

/// Kind of work that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterfacesOperation {
    /// Running a transform.
    Transforming,
    /// Writing a composed pane to the host.
    Rendering,
    /// Running a click handler.
    ClickHandling,
    /// Loading a lazy property.
    LoadingProperty,
    /// First build of a player's own inventory interface.
    BuildingPlayer,
    /// Applying the item decorator.
    Decorating,
    /// Chat query callbacks.
    Querying,
}

impl std::fmt::Display for InterfacesOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Transforming => "transforming",
            Self::Rendering => "rendering",
            Self::ClickHandling => "click handling",
            Self::LoadingProperty => "loading property",
            Self::BuildingPlayer => "building player interface",
            Self::Decorating => "decorating",
            Self::Querying => "querying",
        };
        f.write_str(name)
    }
}

/// What the engine knows about a failure.
#[derive(Clone, Debug)]
pub struct ExceptionContext {
    /// Player whose view failed.
    pub player: PlayerId,
    /// Operation that failed.
    pub operation: InterfacesOperation,
    /// Retries already attempted for this unit of work.
    pub retries: u32,
    /// Owning view, if the failure belongs to one.
    pub view: Option<Arc<InterfaceView>>,
}

/// Decision of an exception handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExceptionResolution {
    /// Swallow the failure.
    Ignore,
    /// Run the failed unit of work again.
    Retry,
    /// Close the owning view with [`satchel_shared::CloseReason::Plugin`].
    Close,
}

/// Pluggable failure policy.
pub trait ExceptionHandler: Send + Sync + 'static {
    /// Decides how to resolve `error`.
    fn handle(&self, error: &InterfacesError, context: &ExceptionContext) -> ExceptionResolution;
}

/// Default policy: decoration failures are ignored, player interface builds
/// are retried a bounded number of times, everything else closes the view.
#[derive(Clone, Debug)]
pub struct DefaultExceptionHandler {
    max_player_build_retries: u32,
}

impl DefaultExceptionHandler {
    /// Policy retrying player interface builds `max_player_build_retries` times.
    #[must_use]
    pub const fn new(max_player_build_retries: u32) -> Self {
        Self {
            max_player_build_retries,
        }
    }
}

impl Default for DefaultExceptionHandler {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ExceptionHandler for DefaultExceptionHandler {
    fn handle(&self, error: &InterfacesError, context: &ExceptionContext) -> ExceptionResolution {
        match context.operation {
            InterfacesOperation::Decorating => {
                tracing::warn!(player = %context.player, %error, "item decoration failed");
                ExceptionResolution::Ignore
            }
            InterfacesOperation::BuildingPlayer if context.retries < self.max_player_build_retries => {
                tracing::warn!(
                    player = %context.player,
                    retries = context.retries,
                    %error,
                    "player interface build failed, retrying"
                );
                ExceptionResolution::Retry
            }
            operation => {
                tracing::error!(player = %context.player, %operation, %error, "interface operation failed");
                ExceptionResolution::Close
            }
        }
    }
}

/// Applies the fixed rules around a handler's decision.
pub(crate) fn resolve(
    handler: &dyn ExceptionHandler,
    host: &dyn InterfaceHost,
    error: &InterfacesError,
    context: &ExceptionContext,
) -> ExceptionResolution {
    if error.is_cancellation() {
        return ExceptionResolution::Ignore;
    }
    match handler.handle(error, context) {
        ExceptionResolution::Retry if !host.is_online(context.player) || host.is_shutting_down() => {
            tracing::debug!(player = %context.player, "player unreachable, not retrying");
            ExceptionResolution::Ignore
        }
        resolution => resolution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_shared::{ContainerId, ItemStack, SlotTarget};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Reachability {
        offline: AtomicBool,
        shutting_down: AtomicBool,
    }

    impl InterfaceHost for Reachability {
        fn is_online(&self, _: PlayerId) -> bool {
            !self.offline.load(Ordering::SeqCst)
        }
        fn is_shutting_down(&self) -> bool {
            self.shutting_down.load(Ordering::SeqCst)
        }
        fn create_container(&self, _: PlayerId, _: &str, _: usize) -> ContainerId {
            ContainerId(0)
        }
        fn item(&self, _: PlayerId, _: SlotTarget) -> Option<ItemStack> {
            None
        }
        fn set_item(&self, _: PlayerId, _: SlotTarget, _: Option<ItemStack>) {}
        fn foreground_container(&self, _: PlayerId) -> Option<ContainerId> {
            None
        }
        fn show_container(&self, _: PlayerId, _: ContainerId) {}
        fn close_container(&self, _: PlayerId) {}
        fn send_message(&self, _: PlayerId, _: &str) {}
        fn disconnect(&self, _: PlayerId, _: &str) {}
    }

    struct AlwaysRetry;

    impl ExceptionHandler for AlwaysRetry {
        fn handle(&self, _: &InterfacesError, _: &ExceptionContext) -> ExceptionResolution {
            ExceptionResolution::Retry
        }
    }

    fn context(operation: InterfacesOperation, retries: u32) -> ExceptionContext {
        ExceptionContext {
            player: PlayerId(1),
            operation,
            retries,
            view: None,
        }
    }

    #[test]
    fn test_default_policy() {
        let handler = DefaultExceptionHandler::default();
        let error = InterfacesError::transform("t", "boom");

        assert_eq!(
            handler.handle(&error, &context(InterfacesOperation::Decorating, 0)),
            ExceptionResolution::Ignore
        );
        assert_eq!(
            handler.handle(&error, &context(InterfacesOperation::Transforming, 0)),
            ExceptionResolution::Close
        );
        assert_eq!(
            handler.handle(&error, &context(InterfacesOperation::BuildingPlayer, 2)),
            ExceptionResolution::Retry
        );
        assert_eq!(
            handler.handle(&error, &context(InterfacesOperation::BuildingPlayer, 3)),
            ExceptionResolution::Close
        );
    }

    #[test]
    fn test_cancellation_never_reaches_handler() {
        let host = Reachability::default();
        let resolution = resolve(
            &AlwaysRetry,
            &host,
            &InterfacesError::Cancelled,
            &context(InterfacesOperation::Rendering, 0),
        );
        assert_eq!(resolution, ExceptionResolution::Ignore);
    }

    #[test]
    fn test_retry_short_circuits_for_unreachable_players() {
        let host = Reachability::default();
        let error = InterfacesError::ClickHandler("boom".into());
        let ctx = context(InterfacesOperation::ClickHandling, 0);

        assert_eq!(resolve(&AlwaysRetry, &host, &error, &ctx), ExceptionResolution::Retry);

        host.offline.store(true, Ordering::SeqCst);
        assert_eq!(resolve(&AlwaysRetry, &host, &error, &ctx), ExceptionResolution::Ignore);

        host.offline.store(false, Ordering::SeqCst);
        host.shutting_down.store(true, Ordering::SeqCst);
        assert_eq!(resolve(&AlwaysRetry, &host, &error, &ctx), ExceptionResolution::Ignore);
    }
}
