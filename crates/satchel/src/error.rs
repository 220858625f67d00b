//! # Interface Error Types
//!
//! All errors that can occur while building, rendering or interacting with a view.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the interface engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfacesError {
    /// A transform failed while painting its pane.
    #[error("transform {transform} failed: {reason}")]
    Transform {
        /// Debug identifier of the transform.
        transform: String,
        /// What went wrong.
        reason: String,
    },

    /// An operation exceeded its time bound.
    #[error("{operation} timed out after {duration:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// The bound that was exceeded.
        duration: Duration,
    },

    /// A click handler returned an error.
    #[error("click handler failed: {0}")]
    ClickHandler(String),

    /// A lazily loaded state property failed to load.
    #[error("property load failed: {0}")]
    PropertyLoad(String),

    /// The player's own inventory interface could not be built.
    #[error("player interface build failed: {0}")]
    PlayerBuild(String),

    /// An item decorator failed.
    #[error("decoration failed: {0}")]
    Decoration(String),

    /// The work was cancelled (view closed, player left, shutdown).
    #[error("operation cancelled")]
    Cancelled,

    /// A listener was already installed for this host.
    #[error("interface listener already installed for this host")]
    AlreadyInstalled,

    /// An interface definition has impossible dimensions or options.
    #[error("invalid interface: {0}")]
    InvalidShape(String),

    /// Invalid configuration file or value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The primary executor dropped a job without running it.
    #[error("primary executor unavailable")]
    PrimaryUnavailable,
}

impl InterfacesError {
    /// Shorthand for a transform failure.
    #[must_use]
    pub fn transform(transform: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transform {
            transform: transform.into(),
            reason: reason.into(),
        }
    }

    /// True for cancellation, which is swallowed and never retried.
    #[inline]
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result type for interface operations.
pub type InterfacesResult<T> = Result<T, InterfacesError>;
