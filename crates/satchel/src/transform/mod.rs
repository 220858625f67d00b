//! # Transforms
//!
//! A transform paints a fresh [`Pane`] for a view. Each transform added to an
//! interface becomes an [`AppliedTransform`] with a priority (its insertion
//! index) and the triggers that make it run again.
//!
//! ```text
//! trigger fires ──> view enqueues transform ──> drain (single worker)
//!                                                   │
//!                                   Pane ──complete──> CompletedPane ──> layer map
//! ```

mod paged;
mod pagination;

pub use paged::PagedTransformation;
pub use pagination::{PageRenderer, PaginationTransformation};

use crate::error::InterfacesResult;
use crate::pane::Pane;
use crate::properties::Trigger;
use crate::view::InterfaceView;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by [`Transform::apply`].
pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = InterfacesResult<()>> + Send + 'a>>;

/// Paints elements onto a pane.
pub trait Transform: Send + Sync + 'static {
    /// Paints `pane` for `view`. May suspend to await data.
    fn apply<'a>(&'a self, pane: &'a mut Pane, view: &'a Arc<InterfaceView>) -> TransformFuture<'a>;

    /// Triggers that re-run this transform.
    fn triggers(&self) -> Vec<Trigger> {
        Vec::new()
    }
}

/// Synchronous transform from a closure.
pub struct FnTransform<F> {
    paint: F,
}

impl<F> FnTransform<F>
where
    F: Fn(&mut Pane, &Arc<InterfaceView>) -> InterfacesResult<()> + Send + Sync + 'static,
{
    /// Wraps `paint`.
    pub fn new(paint: F) -> Self {
        Self { paint }
    }
}

impl<F> Transform for FnTransform<F>
where
    F: Fn(&mut Pane, &Arc<InterfaceView>) -> InterfacesResult<()> + Send + Sync + 'static,
{
    fn apply<'a>(&'a self, pane: &'a mut Pane, view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        let result = (self.paint)(pane, view);
        Box::pin(std::future::ready(result))
    }
}

/// Asynchronous transform from a closure returning a boxed future.
pub struct AsyncFnTransform<F> {
    paint: F,
}

impl<F> AsyncFnTransform<F>
where
    F: for<'a> Fn(&'a mut Pane, &'a Arc<InterfaceView>) -> TransformFuture<'a> + Send + Sync + 'static,
{
    /// Wraps `paint`.
    pub fn new(paint: F) -> Self {
        Self { paint }
    }
}

impl<F> Transform for AsyncFnTransform<F>
where
    F: for<'a> Fn(&'a mut Pane, &'a Arc<InterfaceView>) -> TransformFuture<'a> + Send + Sync + 'static,
{
    fn apply<'a>(&'a self, pane: &'a mut Pane, view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        (self.paint)(pane, view)
    }
}

/// A transform bound to its interface.
#[derive(Clone)]
pub struct AppliedTransform {
    /// Insertion index; higher wins when layers overlap.
    pub priority: usize,
    /// Debug identifier.
    pub id: String,
    /// Signals that re-run the transform.
    pub triggers: Vec<Trigger>,
    /// Blocking transforms must finish before the first render of an open.
    pub blocking: bool,
    /// The painter.
    pub transform: Arc<dyn Transform>,
}

impl std::fmt::Debug for AppliedTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppliedTransform")
            .field("priority", &self.priority)
            .field("id", &self.id)
            .field("triggers", &self.triggers.len())
            .field("blocking", &self.blocking)
            .finish_non_exhaustive()
    }
}
