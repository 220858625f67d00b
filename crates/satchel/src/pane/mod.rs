//! # Panes
//!
//! A [`Pane`] is the sparse grid one transform paints during one render pass,
//! addressed in *logical* coordinates. Completing it resolves every element
//! for one player and maps it onto *physical* coordinates through the
//! shape's row ordering.
//!
//! ```text
//! Pane (logical)                     CompletedPane (physical)
//! ┌─────────────┐  row_ordering     ┌─────────────┐
//! │ row 0 store │ ────────────────> │ row 0 hotbar│
//! │ row 3 hotbar│                   │ row 1 store │
//! └─────────────┘                   └─────────────┘
//! ```

mod accessors;

pub use accessors::{CombinedPane, PlayerPane};

use crate::element::{CompletedElement, Element};
use crate::error::InterfacesResult;
use satchel_shared::{GridPoint, PlayerId, ViewShape};
use std::collections::BTreeMap;

/// Mutable sparse grid of elements for one render pass.
#[derive(Clone, Debug)]
pub struct Pane {
    shape: ViewShape,
    elements: BTreeMap<GridPoint, Element>,
}

impl Pane {
    /// Empty pane for `shape`.
    #[must_use]
    pub fn new(shape: ViewShape) -> Self {
        Self {
            shape,
            elements: BTreeMap::new(),
        }
    }

    /// Shape of the owning view.
    #[inline]
    #[must_use]
    pub fn shape(&self) -> ViewShape {
        self.shape
    }

    /// Places `element` at a logical point. Points outside the shape are ignored.
    pub fn set(&mut self, point: GridPoint, element: Element) -> bool {
        if !self.shape.contains(point) {
            tracing::debug!(?point, shape = ?self.shape, "ignoring element outside pane");
            return false;
        }
        self.elements.insert(point, element);
        true
    }

    /// Places `element` at `(row, column)`.
    pub fn set_at(&mut self, row: usize, column: usize, element: Element) -> bool {
        self.set(GridPoint::at(row, column), element)
    }

    /// Element at a logical point.
    #[must_use]
    pub fn get(&self, point: GridPoint) -> Option<&Element> {
        self.elements.get(&point)
    }

    /// Removes the element at a logical point.
    pub fn remove(&mut self, point: GridPoint) -> Option<Element> {
        self.elements.remove(&point)
    }

    /// Places a copy of `element` on every point of the shape.
    pub fn fill(&mut self, element: &Element) {
        for point in self.shape.points() {
            self.elements.insert(point, element.clone());
        }
    }

    /// Places a copy of `element` on every column of a logical row.
    pub fn fill_row(&mut self, row: usize, element: &Element) {
        for column in 0..satchel_shared::COLUMNS {
            self.set(GridPoint::at(row, column), element.clone());
        }
    }

    /// Number of placed elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when nothing was placed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Placed elements in logical row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, &Element)> {
        self.elements.iter().map(|(point, element)| (*point, element))
    }

    /// Named accessors when this pane belongs to a player-inventory view.
    pub fn player(&mut self) -> Option<PlayerPane<'_>> {
        PlayerPane::new(self)
    }

    /// Named accessors when this pane belongs to a combined view.
    pub fn combined(&mut self) -> Option<CombinedPane<'_>> {
        CombinedPane::new(self)
    }

    /// Maps a logical point to the physical grid.
    #[must_use]
    pub fn physical_point(&self, logical: GridPoint) -> GridPoint {
        match self.shape.row_ordering() {
            Some(ordering) => GridPoint::at(ordering.get(logical.row).copied().unwrap_or(logical.row), logical.column),
            None => logical,
        }
    }

    /// Resolves every element for `player`, keyed by physical point.
    pub async fn complete(&self, player: PlayerId) -> InterfacesResult<CompletedPane> {
        let ordering = self.shape.row_ordering();
        let mut completed = CompletedPane::new();
        for (logical, element) in &self.elements {
            let row = ordering
                .as_ref()
                .and_then(|ordering| ordering.get(logical.row).copied())
                .unwrap_or(logical.row);
            let resolved = element.complete(player).await?;
            completed.insert(GridPoint::at(row, logical.column), resolved);
        }
        Ok(completed)
    }
}

/// Fully resolved grid, keyed by physical point.
#[derive(Clone, Debug, Default)]
pub struct CompletedPane {
    cells: BTreeMap<GridPoint, CompletedElement>,
}

impl CompletedPane {
    /// Empty completed pane.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed pane holding an explicit empty at every point of `shape`.
    #[must_use]
    pub fn filled(shape: ViewShape) -> Self {
        Self {
            cells: shape.points().map(|point| (point, CompletedElement::empty())).collect(),
        }
    }

    /// Writes one cell, replacing what was there.
    pub fn insert(&mut self, point: GridPoint, element: CompletedElement) {
        self.cells.insert(point, element);
    }

    /// Cell at a physical point.
    #[must_use]
    pub fn get(&self, point: GridPoint) -> Option<&CompletedElement> {
        self.cells.get(&point)
    }

    /// Mutable cell at a physical point.
    pub fn get_mut(&mut self, point: GridPoint) -> Option<&mut CompletedElement> {
        self.cells.get_mut(&point)
    }

    /// True when the point is present, even as an explicit empty.
    #[must_use]
    pub fn contains(&self, point: GridPoint) -> bool {
        self.cells.contains_key(&point)
    }

    /// Number of present cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True when no cell is present.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in physical row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPoint, &CompletedElement)> {
        self.cells.iter().map(|(point, element)| (*point, element))
    }

    /// Mutable cells in physical row-major order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (GridPoint, &mut CompletedElement)> {
        self.cells.iter_mut().map(|(point, element)| (*point, element))
    }
}
