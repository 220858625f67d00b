//! # SATCHEL Interface Engine
//!
//! Reactive, declarative inventory interfaces for game server hosts.
//!
//! ## Design Principles
//!
//! 1. **Declarative** - An [`Interface`] is an immutable recipe of transforms;
//!    every player gets their own [`InterfaceView`] of it
//! 2. **Reactive** - Transforms name the [`Trigger`]s they depend on and re-run
//!    only when one fires
//! 3. **Single-flight** - One transform drain and one render pass per view at a
//!    time; bursts of changes coalesce into a single extra render
//! 4. **Host-agnostic** - All container access goes through [`InterfaceHost`],
//!    on the host's primary executor
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  events   ┌────────────────────┐
//! │    Host    │ ────────> │ InterfacesListener │
//! └────────────┘           └─────────┬──────────┘
//!       ▲                            │ route by player
//!       │ diff writes                ▼
//! ┌─────┴──────────┐        ┌────────────────┐  triggers  ┌────────────┐
//! │ PrimaryExecutor│ <───── │ InterfaceView  │ <───────── │ Properties │
//! └────────────────┘ render └────────────────┘            └────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use satchel::{Element, Interface, InterfaceProperty, InterfacesListener, ItemStack, ViewShape};
//!
//! let counter = InterfaceProperty::new(0_u32);
//! let shown = counter.clone();
//! let interface = Interface::builder(ViewShape::Chest { rows: 1 })
//!     .title("Counter")
//!     .with_paint(&[counter.trigger()], move |pane, _| {
//!         pane.set_at(0, 4, Element::item(ItemStack::new("paper").with_amount(shown.get())));
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let listener = InterfacesListener::install(host, scope, config)?;
//! let view = listener.open(player, &interface).await;
//! counter.set(1); // re-paints and re-renders `view`
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod click;
pub mod compositor;
pub mod config;
pub mod context;
pub mod element;
pub mod error;
pub mod exception;
pub mod host;
pub mod interface;
pub mod listener;
pub mod pane;
pub mod primary;
pub mod properties;
pub mod scope;
pub mod transform;
pub mod view;

pub use click::{ClickCompletion, ClickContext, ClickHandler, ClickInfo, ClickOutcome, ClickPreprocessor};
pub use compositor::CollapsablePaneMap;
pub use config::InterfacesConfig;
pub use context::InterfacesContext;
pub use element::{CompletedElement, Drawable, Element};
pub use error::{InterfacesError, InterfacesResult};
pub use exception::{
    DefaultExceptionHandler, ExceptionContext, ExceptionHandler, ExceptionResolution, InterfacesOperation,
};
pub use host::InterfaceHost;
pub use interface::{Interface, InterfaceBuilder, InterfaceOptions, ItemDecorator};
pub use listener::InterfacesListener;
pub use pane::{CombinedPane, CompletedPane, Pane, PlayerPane};
pub use primary::{InlineExecutor, PrimaryExecutor, PrimaryThread};
pub use properties::{BoundInteger, InterfaceProperty, LazyProperty, Subscription, Trigger};
pub use scope::InterfacesScope;
pub use transform::{
    AppliedTransform, AsyncFnTransform, FnTransform, PagedTransformation, PaginationTransformation, Transform,
};
pub use view::{ChatQuery, InterfaceView};

pub use satchel_shared::{
    ClickTarget, ClickType, CloseReason, ContainerId, GridPoint, ItemStack, Modifiers, PlayerId, SlotTarget,
    ViewShape,
};
