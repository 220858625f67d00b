//! Transform over a page index with back/forward buttons.

use super::{Transform, TransformFuture};
use crate::click::ClickHandler;
use crate::element::Element;
use crate::error::InterfacesResult;
use crate::pane::Pane;
use crate::properties::{BoundInteger, Trigger};
use crate::view::InterfaceView;
use satchel_shared::GridPoint;
use std::sync::Arc;

type PagePainter = dyn Fn(&mut Pane, i64) -> InterfacesResult<()> + Send + Sync;

/// Navigation button placed only when a neighbouring page exists.
#[derive(Clone, Debug)]
pub(crate) struct PageButton {
    pub(crate) point: GridPoint,
    pub(crate) element: Element,
}

impl PageButton {
    /// Places the button with a click handler moving the page by `delta`.
    pub(crate) fn place(&self, pane: &mut Pane, page: &BoundInteger, delta: i64) {
        let page = page.clone();
        let element = self.element.clone().with_click(ClickHandler::new(move |_| {
            page.add(delta);
            Ok(())
        }));
        pane.set(self.point, element);
    }

    /// Places the buttons that apply to the current page.
    pub(crate) fn place_both(back: Option<&Self>, forward: Option<&Self>, pane: &mut Pane, page: &BoundInteger) {
        if let Some(back) = back.filter(|_| page.has_preceding()) {
            back.place(pane, page, -1);
        }
        if let Some(forward) = forward.filter(|_| page.has_succeeding()) {
            forward.place(pane, page, 1);
        }
    }
}

/// Paints one page of content chosen by a [`BoundInteger`].
pub struct PagedTransformation {
    page: BoundInteger,
    back: Option<PageButton>,
    forward: Option<PageButton>,
    paint: Arc<PagePainter>,
}

impl PagedTransformation {
    /// Paged transform over `page`, painting with `paint(pane, page)`.
    pub fn new<F>(page: BoundInteger, paint: F) -> Self
    where
        F: Fn(&mut Pane, i64) -> InterfacesResult<()> + Send + Sync + 'static,
    {
        Self {
            page,
            back: None,
            forward: None,
            paint: Arc::new(paint),
        }
    }

    /// Button at a logical point that goes to the previous page.
    #[must_use]
    pub fn with_back_button(mut self, point: GridPoint, element: Element) -> Self {
        self.back = Some(PageButton { point, element });
        self
    }

    /// Button at a logical point that goes to the next page.
    #[must_use]
    pub fn with_forward_button(mut self, point: GridPoint, element: Element) -> Self {
        self.forward = Some(PageButton { point, element });
        self
    }

    /// The page index.
    #[inline]
    #[must_use]
    pub fn page(&self) -> &BoundInteger {
        &self.page
    }

    fn paint_into(&self, pane: &mut Pane) -> InterfacesResult<()> {
        (self.paint)(pane, self.page.get())?;
        PageButton::place_both(self.back.as_ref(), self.forward.as_ref(), pane, &self.page);
        Ok(())
    }
}

impl Transform for PagedTransformation {
    fn apply<'a>(&'a self, pane: &'a mut Pane, _view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        Box::pin(std::future::ready(self.paint_into(pane)))
    }

    fn triggers(&self) -> Vec<Trigger> {
        vec![self.page.trigger().clone()]
    }
}

impl std::fmt::Debug for PagedTransformation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedTransformation")
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}
