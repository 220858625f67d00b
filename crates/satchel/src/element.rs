//! # Elements
//!
//! An element is what a transform places on a pane: something that can draw
//! an item for a player, plus the handler for clicks on it.
//!
//! ```text
//! Element::Static ── Drawable(player) ──────────┐
//!                                               ├──> CompletedElement { item, click }
//! Element::Lazy ──── async producer(player) ────┘
//! ```

use crate::click::ClickHandler;
use crate::error::InterfacesResult;
use satchel_shared::{ItemStack, PlayerId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future produced by a lazy element.
pub type DrawFuture = Pin<Box<dyn Future<Output = InterfacesResult<Option<ItemStack>>> + Send>>;

type DrawFn = dyn Fn(PlayerId) -> Option<ItemStack> + Send + Sync;
type ProducerFn = dyn Fn(PlayerId) -> DrawFuture + Send + Sync;

/// Synchronous item producer.
#[derive(Clone)]
pub struct Drawable(Arc<DrawFn>);

impl Drawable {
    /// Always draws `item`.
    #[must_use]
    pub fn item(item: ItemStack) -> Self {
        Self(Arc::new(move |_| Some(item.clone())))
    }

    /// Draws nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self(Arc::new(|_| None))
    }

    /// Draws per player.
    pub fn from_fn<F>(draw: F) -> Self
    where
        F: Fn(PlayerId) -> Option<ItemStack> + Send + Sync + 'static,
    {
        Self(Arc::new(draw))
    }

    /// Item for `player`.
    #[inline]
    #[must_use]
    pub fn draw(&self, player: PlayerId) -> Option<ItemStack> {
        (self.0)(player)
    }
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Drawable(..)")
    }
}

/// Declarative content of one grid cell.
#[derive(Clone)]
pub enum Element {
    /// Drawn synchronously during completion.
    Static {
        /// Item producer.
        drawable: Drawable,
        /// Click handler.
        click: ClickHandler,
    },
    /// Drawn by awaiting an async producer during completion.
    Lazy {
        /// Async item producer.
        producer: Arc<ProducerFn>,
        /// Click handler.
        click: ClickHandler,
    },
}

impl Element {
    /// Static item without a click handler.
    #[must_use]
    pub fn item(item: ItemStack) -> Self {
        Self::Static {
            drawable: Drawable::item(item),
            click: ClickHandler::none(),
        }
    }

    /// Explicitly empty cell.
    #[must_use]
    pub fn empty() -> Self {
        Self::Static {
            drawable: Drawable::empty(),
            click: ClickHandler::none(),
        }
    }

    /// Static element from a drawable.
    #[must_use]
    pub fn drawable(drawable: Drawable) -> Self {
        Self::Static {
            drawable,
            click: ClickHandler::none(),
        }
    }

    /// Element whose item is produced asynchronously.
    pub fn lazy<F, Fut>(producer: F) -> Self
    where
        F: Fn(PlayerId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = InterfacesResult<Option<ItemStack>>> + Send + 'static,
    {
        Self::Lazy {
            producer: Arc::new(move |player| Box::pin(producer(player))),
            click: ClickHandler::none(),
        }
    }

    /// Replaces the click handler.
    #[must_use]
    pub fn with_click(self, handler: ClickHandler) -> Self {
        match self {
            Self::Static { drawable, .. } => Self::Static {
                drawable,
                click: handler,
            },
            Self::Lazy { producer, .. } => Self::Lazy {
                producer,
                click: handler,
            },
        }
    }

    /// Bound click handler.
    #[inline]
    #[must_use]
    pub fn click(&self) -> &ClickHandler {
        match self {
            Self::Static { click, .. } | Self::Lazy { click, .. } => click,
        }
    }

    /// Resolves the element for one player.
    pub async fn complete(&self, player: PlayerId) -> InterfacesResult<CompletedElement> {
        let item = match self {
            Self::Static { drawable, .. } => drawable.draw(player),
            Self::Lazy { producer, .. } => producer(player).await?,
        };
        Ok(CompletedElement {
            item,
            click: self.click().clone(),
        })
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { click, .. } => f.debug_struct("Static").field("click", click).finish_non_exhaustive(),
            Self::Lazy { click, .. } => f.debug_struct("Lazy").field("click", click).finish_non_exhaustive(),
        }
    }
}

/// Element resolved for one player in one render pass.
#[derive(Clone, Debug, Default)]
pub struct CompletedElement {
    /// Item to show, `None` for an empty slot.
    pub item: Option<ItemStack>,
    /// Click handler.
    pub click: ClickHandler,
}

impl CompletedElement {
    /// Explicit empty placeholder.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}
