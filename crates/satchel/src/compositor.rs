//! # Layer Compositor
//!
//! Every transform writes its completed pane into its own layer. Collapsing
//! merges the layers into the single grid the renderer diffs against.
//!
//! ```text
//!   base (explicit empties)
//!   + layer 0            ──┐
//!   + layer 1              ├── ascending priority, later layer overwrites
//!   + layer N (wins)     ──┘
//!   = composed pane (cached until the next write)
//! ```

use crate::pane::CompletedPane;
use satchel_shared::ViewShape;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-transform layers plus a lazily rebuilt composition.
#[derive(Debug)]
pub struct CollapsablePaneMap {
    shape: ViewShape,
    fill_base: bool,
    layers: BTreeMap<usize, CompletedPane>,
    cached: Option<Arc<CompletedPane>>,
}

impl CollapsablePaneMap {
    /// Empty map for a view of `shape`.
    ///
    /// With `fill_base` the composition starts from explicit empties, so
    /// cells no layer defines are cleared rather than left untouched.
    #[must_use]
    pub fn new(shape: ViewShape, fill_base: bool) -> Self {
        Self {
            shape,
            fill_base,
            layers: BTreeMap::new(),
            cached: None,
        }
    }

    /// Stores the layer of the transform with `priority`.
    pub fn insert(&mut self, priority: usize, pane: CompletedPane) {
        self.layers.insert(priority, pane);
        self.cached = None;
    }

    /// Drops one layer.
    pub fn remove(&mut self, priority: usize) -> Option<CompletedPane> {
        self.cached = None;
        self.layers.remove(&priority)
    }

    /// Drops every layer.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.cached = None;
    }

    /// True when the transform with `priority` has painted.
    #[must_use]
    pub fn contains(&self, priority: usize) -> bool {
        self.layers.contains_key(&priority)
    }

    /// Number of stored layers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True when no layer is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Composed grid; the highest priority defining a cell wins it.
    pub fn collapse(&mut self) -> Arc<CompletedPane> {
        if let Some(cached) = &self.cached {
            return Arc::clone(cached);
        }

        let mut composed = if self.fill_base {
            CompletedPane::filled(self.shape)
        } else {
            CompletedPane::new()
        };
        for layer in self.layers.values() {
            for (point, cell) in layer.iter() {
                composed.insert(point, cell.clone());
            }
        }

        let composed = Arc::new(composed);
        self.cached = Some(Arc::clone(&composed));
        composed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::CompletedElement;
    use satchel_shared::{GridPoint, ItemStack};

    fn layer(cells: &[(usize, usize, &str)]) -> CompletedPane {
        let mut pane = CompletedPane::new();
        for (row, column, material) in cells {
            pane.insert(
                GridPoint::at(*row, *column),
                CompletedElement {
                    item: Some(ItemStack::new(*material)),
                    ..CompletedElement::default()
                },
            );
        }
        pane
    }

    fn material(pane: &CompletedPane, row: usize, column: usize) -> Option<String> {
        pane.get(GridPoint::at(row, column))?.item.as_ref().map(|item| item.material.clone())
    }

    #[test]
    fn test_highest_priority_wins() {
        let mut map = CollapsablePaneMap::new(ViewShape::Chest { rows: 1 }, true);
        map.insert(2, layer(&[(0, 0, "top")]));
        map.insert(0, layer(&[(0, 0, "bottom"), (0, 1, "only-bottom")]));

        let composed = map.collapse();
        assert_eq!(material(&composed, 0, 0).as_deref(), Some("top"));
        // Layers that do not define a cell never shadow lower ones there.
        assert_eq!(material(&composed, 0, 1).as_deref(), Some("only-bottom"));
        assert_eq!(composed.len(), 9);
        assert_eq!(material(&composed, 0, 5), None);
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let shape = ViewShape::Chest { rows: 1 };
        let mut forward = CollapsablePaneMap::new(shape, true);
        let mut backward = CollapsablePaneMap::new(shape, true);
        let layers = [layer(&[(0, 3, "a")]), layer(&[(0, 3, "b"), (0, 4, "c")]), layer(&[(0, 4, "d")])];

        for (priority, pane) in layers.iter().enumerate() {
            forward.insert(priority, pane.clone());
        }
        for (priority, pane) in layers.iter().enumerate().rev() {
            backward.insert(priority, pane.clone());
        }

        let (a, b) = (forward.collapse(), backward.collapse());
        for column in 0..9 {
            assert_eq!(material(&a, 0, column), material(&b, 0, column));
        }
        assert_eq!(material(&a, 0, 4).as_deref(), Some("d"));
    }

    #[test]
    fn test_cache_invalidated_on_write() {
        let mut map = CollapsablePaneMap::new(ViewShape::Chest { rows: 1 }, false);
        map.insert(0, layer(&[(0, 0, "first")]));
        let first = map.collapse();
        assert!(Arc::ptr_eq(&first, &map.collapse()));
        assert_eq!(first.len(), 1);

        map.insert(0, layer(&[(0, 0, "second")]));
        assert_eq!(material(&map.collapse(), 0, 0).as_deref(), Some("second"));
    }
}
