//! Transform laying a list out over a fixed set of slots, one page at a time.

use super::paged::PageButton;
use super::{Transform, TransformFuture};
use crate::element::Element;
use crate::error::InterfacesResult;
use crate::pane::Pane;
use crate::properties::{BoundInteger, InterfaceProperty, Subscription, Trigger};
use crate::view::InterfaceView;
use satchel_shared::GridPoint;
use std::sync::Arc;

/// Renders one list entry into an element.
pub type PageRenderer<T> = Arc<dyn Fn(&T) -> Element + Send + Sync>;

/// Highest page index for `len` entries over `page_size` slots.
fn max_page(len: usize, page_size: usize) -> i64 {
    if len == 0 || page_size == 0 {
        return 0;
    }
    i64::try_from((len - 1) / page_size).unwrap_or(i64::MAX)
}

/// Paginated view over a list property.
///
/// The page bounds follow the list: whenever it changes, the maximum page is
/// recomputed and the current page re-clamped.
pub struct PaginationTransformation<T> {
    values: InterfaceProperty<Vec<T>>,
    slots: Vec<GridPoint>,
    renderer: PageRenderer<T>,
    page: BoundInteger,
    back: Option<PageButton>,
    forward: Option<PageButton>,
    _bounds: Subscription,
}

impl<T> PaginationTransformation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Lays `values` out over `slots` (logical points, in fill order).
    pub fn new<F>(values: InterfaceProperty<Vec<T>>, slots: Vec<GridPoint>, renderer: F) -> Self
    where
        F: Fn(&T) -> Element + Send + Sync + 'static,
    {
        let page_size = slots.len();
        let page = BoundInteger::new(0, 0, max_page(values.with(Vec::len), page_size));

        let bounds = {
            let list = values.clone();
            let page = page.clone();
            values.trigger().subscribe(move || {
                page.set_bounds(0, max_page(list.with(Vec::len), page_size));
            })
        };

        Self {
            values,
            slots,
            renderer: Arc::new(renderer),
            page,
            back: None,
            forward: None,
            _bounds: bounds,
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

    /// Slots per page.
    #[inline]
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.slots.len()
    }

    /// Highest valid page for the current list.
    #[must_use]
    pub fn max_page(&self) -> i64 {
        max_page(self.values.with(Vec::len), self.page_size())
    }

    fn paint_into(&self, pane: &mut Pane) {
        let page = usize::try_from(self.page.get()).unwrap_or(0);
        let start = page.saturating_mul(self.page_size());
        self.values.with(|values| {
            let window = values.iter().skip(start).take(self.page_size());
            for (point, value) in self.slots.iter().zip(window) {
                pane.set(*point, (self.renderer)(value));
            }
        });
        PageButton::place_both(self.back.as_ref(), self.forward.as_ref(), pane, &self.page);
    }
}

impl<T> Transform for PaginationTransformation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn apply<'a>(&'a self, pane: &'a mut Pane, _view: &'a Arc<InterfaceView>) -> TransformFuture<'a> {
        self.paint_into(pane);
        Box::pin(std::future::ready(InterfacesResult::Ok(())))
    }

    fn triggers(&self) -> Vec<Trigger> {
        vec![self.values.trigger().clone(), self.page.trigger().clone()]
    }
}

impl<T> std::fmt::Debug for PaginationTransformation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginationTransformation")
            .field("page", &self.page)
            .field("page_size", &self.slots.len())
            .finish_non_exhaustive()
    }
}
