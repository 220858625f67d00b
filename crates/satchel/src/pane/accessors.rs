//! Named slot accessors over panes of the player and combined shapes.

use super::Pane;
use crate::element::Element;
use satchel_shared::grid::{COMBINED_PLAYER_ROWS, PLAYER_ROWS};
use satchel_shared::{GridPoint, ViewShape};

const PLAYER_HOTBAR_ROW: usize = PLAYER_ROWS - 2;
const PLAYER_EQUIPMENT_ROW: usize = PLAYER_ROWS - 1;

/// Pane of a player-inventory view.
///
/// Logical rows 0 to 2 are storage, row 3 the hotbar, row 4 the equipment.
#[derive(Debug)]
pub struct PlayerPane<'a> {
    pane: &'a mut Pane,
}

impl<'a> PlayerPane<'a> {
    /// Wraps a pane of shape [`ViewShape::Player`].
    pub fn new(pane: &'a mut Pane) -> Option<Self> {
        matches!(pane.shape(), ViewShape::Player).then_some(Self { pane })
    }

    /// Hotbar slot `column` (0..9).
    pub fn hotbar(&mut self, column: usize, element: Element) -> bool {
        self.pane.set_at(PLAYER_HOTBAR_ROW, column, element)
    }

    /// Storage slot at `(row, column)`, row in 0..3.
    pub fn storage(&mut self, row: usize, column: usize, element: Element) -> bool {
        row < PLAYER_HOTBAR_ROW && self.pane.set_at(row, column, element)
    }

    /// Boots slot.
    pub fn boots(&mut self, element: Element) -> bool {
        self.pane.set_at(PLAYER_EQUIPMENT_ROW, 0, element)
    }

    /// Leggings slot.
    pub fn leggings(&mut self, element: Element) -> bool {
        self.pane.set_at(PLAYER_EQUIPMENT_ROW, 1, element)
    }

    /// Chestplate slot.
    pub fn chestplate(&mut self, element: Element) -> bool {
        self.pane.set_at(PLAYER_EQUIPMENT_ROW, 2, element)
    }

    /// Helmet slot.
    pub fn helmet(&mut self, element: Element) -> bool {
        self.pane.set_at(PLAYER_EQUIPMENT_ROW, 3, element)
    }

    /// Offhand slot.
    pub fn offhand(&mut self, element: Element) -> bool {
        self.pane.set_at(PLAYER_EQUIPMENT_ROW, 4, element)
    }
}

/// Pane of a combined chest-plus-inventory view.
#[derive(Debug)]
pub struct CombinedPane<'a> {
    pane: &'a mut Pane,
    chest_rows: usize,
}

impl<'a> CombinedPane<'a> {
    /// Wraps a pane of shape [`ViewShape::Combined`].
    pub fn new(pane: &'a mut Pane) -> Option<Self> {
        match pane.shape() {
            ViewShape::Combined { chest_rows } => Some(Self { pane, chest_rows }),
            _ => None,
        }
    }

    /// Chest slot at `(row, column)`.
    pub fn chest(&mut self, row: usize, column: usize, element: Element) -> bool {
        row < self.chest_rows && self.pane.set_at(row, column, element)
    }

    /// Player storage slot at `(row, column)`, row in 0..3.
    pub fn storage(&mut self, row: usize, column: usize, element: Element) -> bool {
        row < COMBINED_PLAYER_ROWS - 1 && self.pane.set_at(self.chest_rows + row, column, element)
    }

    /// Hotbar slot `column`.
    pub fn hotbar(&mut self, column: usize, element: Element) -> bool {
        self.pane
            .set(GridPoint::at(self.chest_rows + COMBINED_PLAYER_ROWS - 1, column), element)
    }
}
