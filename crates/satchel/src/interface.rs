//! # Interface Definitions
//!
//! An [`Interface`] is the immutable description of a menu: its shape,
//! title, transforms, options and hooks. Each player who opens it gets their
//! own [`InterfaceView`].
//!
//! ```text
//! Interface::builder(shape)
//!     .title("Shop")
//!     .with_transform(..)            priority 0
//!     .with_background_transform(..) priority 1 (wins overlaps)
//!     .on_close(&[CloseReason::Player], ..)
//!     .build()?  ──>  Arc<Interface>
//! ```

use crate::click::{ClickInfo, ClickPreprocessor};
use crate::error::{InterfacesError, InterfacesResult};
use crate::pane::Pane;
use crate::properties::Trigger;
use crate::transform::{AppliedTransform, FnTransform, Transform};
use crate::view::InterfaceView;
use satchel_shared::{CloseReason, ItemStack, PlayerId, ViewShape};
use std::sync::Arc;

/// Rewrites every resolved item before it is written to the host.
pub trait ItemDecorator: Send + Sync + 'static {
    /// Decorated copy of `item` for `player`.
    fn decorate(&self, player: PlayerId, item: ItemStack) -> InterfacesResult<ItemStack>;
}

impl<F> ItemDecorator for F
where
    F: Fn(PlayerId, ItemStack) -> InterfacesResult<ItemStack> + Send + Sync + 'static,
{
    fn decorate(&self, player: PlayerId, item: ItemStack) -> InterfacesResult<ItemStack> {
        self(player, item)
    }
}

/// Behaviour switches of an interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceOptions {
    /// Cancel clicks on slots without a handler instead of letting them through.
    pub prevent_clicking_empty_slots: bool,
    /// Leave cells no transform defines untouched instead of clearing them.
    pub inherit_existing_items: bool,
    /// Keep items the player placed into unowned slots across renders.
    pub persist_items: bool,
    /// Do not run close handlers when the view closes because another opened.
    pub skip_close_handler_on_view_switch: bool,
}

impl Default for InterfaceOptions {
    fn default() -> Self {
        Self {
            prevent_clicking_empty_slots: true,
            inherit_existing_items: false,
            persist_items: false,
            skip_close_handler_on_view_switch: true,
        }
    }
}

type CloseFn = dyn Fn(&Arc<InterfaceView>, CloseReason) + Send + Sync;

/// Close handler with the reasons it reacts to.
#[derive(Clone)]
pub struct CloseHandler {
    reasons: Vec<CloseReason>,
    handler: Arc<CloseFn>,
}

impl CloseHandler {
    /// True when the handler should run for `reason`.
    #[inline]
    #[must_use]
    pub fn accepts(&self, reason: CloseReason) -> bool {
        self.reasons.contains(&reason)
    }

    pub(crate) fn run(&self, view: &Arc<InterfaceView>, reason: CloseReason) {
        (self.handler)(view, reason);
    }
}

impl std::fmt::Debug for CloseHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseHandler").field("reasons", &self.reasons).finish_non_exhaustive()
    }
}

/// Immutable menu definition.
pub struct Interface {
    shape: ViewShape,
    title: String,
    transforms: Vec<AppliedTransform>,
    options: InterfaceOptions,
    close_handlers: Vec<CloseHandler>,
    preprocessors: Vec<ClickPreprocessor>,
    decorator: Option<Arc<dyn ItemDecorator>>,
}

impl Interface {
    /// Starts a definition for `shape`.
    #[must_use]
    pub fn builder(shape: ViewShape) -> InterfaceBuilder {
        InterfaceBuilder::new(shape)
    }

    /// Shape of every view of this interface.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> ViewShape {
        self.shape
    }

    /// Initial title.
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Transforms in priority order.
    #[inline]
    #[must_use]
    pub fn transforms(&self) -> &[AppliedTransform] {
        &self.transforms
    }

    /// Transform with the given priority.
    #[must_use]
    pub fn transform(&self, priority: usize) -> Option<&AppliedTransform> {
        self.transforms.get(priority)
    }

    /// Behaviour switches.
    #[inline]
    #[must_use]
    pub fn options(&self) -> InterfaceOptions {
        self.options
    }

    /// Registered close handlers.
    #[inline]
    #[must_use]
    pub fn close_handlers(&self) -> &[CloseHandler] {
        &self.close_handlers
    }

    /// Registered click preprocessors.
    #[inline]
    #[must_use]
    pub fn preprocessors(&self) -> &[ClickPreprocessor] {
        &self.preprocessors
    }

    /// Item decorator, if any.
    #[inline]
    #[must_use]
    pub fn decorator(&self) -> Option<&Arc<dyn ItemDecorator>> {
        self.decorator.as_ref()
    }
}

impl std::fmt::Debug for Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface")
            .field("shape", &self.shape)
            .field("title", &self.title)
            .field("transforms", &self.transforms)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Interface`].
pub struct InterfaceBuilder {
    shape: ViewShape,
    title: String,
    transforms: Vec<AppliedTransform>,
    options: InterfaceOptions,
    close_handlers: Vec<CloseHandler>,
    preprocessors: Vec<ClickPreprocessor>,
    decorator: Option<Arc<dyn ItemDecorator>>,
}

impl InterfaceBuilder {
    fn new(shape: ViewShape) -> Self {
        Self {
            shape,
            title: String::new(),
            transforms: Vec::new(),
            options: InterfaceOptions::default(),
            close_handlers: Vec::new(),
            preprocessors: Vec::new(),
            decorator: None,
        }
    }

    /// Sets the initial title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn push(mut self, transform: Arc<dyn Transform>, extra: &[&Trigger], blocking: bool) -> Self {
        let priority = self.transforms.len();
        let mut triggers = transform.triggers();
        triggers.extend(extra.iter().map(|trigger| (*trigger).clone()));
        self.transforms.push(AppliedTransform {
            priority,
            id: format!("transform-{priority}"),
            triggers,
            blocking,
            transform,
        });
        self
    }

    /// Adds a transform that must finish before the first render of an open.
    #[must_use]
    pub fn with_transform(self, transform: impl Transform) -> Self {
        self.push(Arc::new(transform), &[], true)
    }

    /// Adds a transform that also re-runs when any of `triggers` fires.
    #[must_use]
    pub fn with_reactive_transform(self, triggers: &[&Trigger], transform: impl Transform) -> Self {
        self.push(Arc::new(transform), triggers, true)
    }

    /// Adds a transform that runs in the background; the view renders without waiting for it.
    #[must_use]
    pub fn with_background_transform(self, triggers: &[&Trigger], transform: impl Transform) -> Self {
        self.push(Arc::new(transform), triggers, false)
    }

    /// Adds a synchronous painting closure re-run on `triggers`.
    #[must_use]
    pub fn with_paint<F>(self, triggers: &[&Trigger], paint: F) -> Self
    where
        F: Fn(&mut Pane, &Arc<InterfaceView>) -> InterfacesResult<()> + Send + Sync + 'static,
    {
        self.push(Arc::new(FnTransform::new(paint)), triggers, true)
    }

    /// Cancel (true) or allow (false) clicks on slots without a handler.
    #[must_use]
    pub fn prevent_clicking_empty_slots(mut self, prevent: bool) -> Self {
        self.options.prevent_clicking_empty_slots = prevent;
        self
    }

    /// Leave cells no transform defines untouched.
    #[must_use]
    pub fn inherit_existing_items(mut self, inherit: bool) -> Self {
        self.options.inherit_existing_items = inherit;
        self
    }

    /// Keep player-placed items in unowned slots.
    #[must_use]
    pub fn persist_items(mut self, persist: bool) -> Self {
        self.options.persist_items = persist;
        self
    }

    /// Skip close handlers when another view replaces this one.
    #[must_use]
    pub fn skip_close_handler_on_view_switch(mut self, skip: bool) -> Self {
        self.options.skip_close_handler_on_view_switch = skip;
        self
    }

    /// Registers a close handler for the given reasons.
    #[must_use]
    pub fn on_close<F>(mut self, reasons: &[CloseReason], handler: F) -> Self
    where
        F: Fn(&Arc<InterfaceView>, CloseReason) + Send + Sync + 'static,
    {
        self.close_handlers.push(CloseHandler {
            reasons: reasons.to_vec(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Registers a close handler for every reason.
    #[must_use]
    pub fn on_any_close<F>(self, handler: F) -> Self
    where
        F: Fn(&Arc<InterfaceView>, CloseReason) + Send + Sync + 'static,
    {
        self.on_close(&CloseReason::ALL, handler)
    }

    /// Registers a click preprocessor.
    #[must_use]
    pub fn preprocess<F>(mut self, preprocessor: F) -> Self
    where
        F: Fn(ClickInfo) + Send + Sync + 'static,
    {
        self.preprocessors.push(Arc::new(preprocessor));
        self
    }

    /// Sets the item decorator.
    #[must_use]
    pub fn decorator(mut self, decorator: impl ItemDecorator) -> Self {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// Validates and freezes the definition.
    pub fn build(self) -> InterfacesResult<Arc<Interface>> {
        if !self.shape.is_valid() {
            return Err(InterfacesError::InvalidShape(format!("{:?} cannot be shown", self.shape)));
        }
        if self.options.inherit_existing_items && self.options.persist_items {
            return Err(InterfacesError::InvalidShape(
                "inherit_existing_items and persist_items cannot be combined".into(),
            ));
        }
        Ok(Arc::new(Interface {
            shape: self.shape,
            title: self.title,
            transforms: self.transforms,
            options: self.options,
            close_handlers: self.close_handlers,
            preprocessors: self.preprocessors,
            decorator: self.decorator,
        }))
    }
}

impl std::fmt::Debug for InterfaceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceBuilder")
            .field("shape", &self.shape)
            .field("transforms", &self.transforms.len())
            .finish_non_exhaustive()
    }
}
