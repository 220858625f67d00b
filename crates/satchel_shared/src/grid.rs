//! # Grid Addressing
//!
//! Pure coordinate math between the logical grid a transform paints into and
//! the physical slots the host exposes.
//!
//! ## Row orderings
//!
//! ```text
//! Player inventory (physical)        Logical rows seen by transforms
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ row 0: hotbar   0..=8    │       │ row 0: storage  9..=17   │
//! │ row 1: storage  9..=17   │       │ row 1: storage 18..=26   │
//! │ row 2: storage 18..=26   │  <──  │ row 2: storage 27..=35   │
//! │ row 3: storage 27..=35   │       │ row 3: hotbar   0..=8    │
//! │ row 4: armor + offhand   │       │ row 4: armor + offhand   │
//! └──────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! The ordering maps a logical row to its physical row, so `[1, 2, 3, 0, 4]`
//! for the player inventory. Combined views stack the chest rows on top and
//! reuse the same permutation for the four player rows below.

use crate::event::ClickTarget;
use crate::item::ContainerId;
use serde::{Deserialize, Serialize};

/// Number of columns in every grid.
pub const COLUMNS: usize = 9;

/// Largest chest the host can create.
pub const MAX_CHEST_ROWS: usize = 6;

/// Logical rows of a player inventory view (storage, hotbar, equipment).
pub const PLAYER_ROWS: usize = 5;

/// Player rows appended below the chest in a combined view.
pub const COMBINED_PLAYER_ROWS: usize = 4;

/// First player slot holding armor (boots).
pub const ARMOR_START: usize = 36;

/// Player slot of the offhand.
pub const OFFHAND_SLOT: usize = 40;

/// Slots in the equipment row (four armor pieces and the offhand).
const EQUIPMENT_COLUMNS: usize = 5;

/// Immutable (row, column) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    /// Row, counted from the top.
    pub row: usize,
    /// Column, counted from the left.
    pub column: usize,
}

impl GridPoint {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn at(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Point for a flat index into a nine-wide grid.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self::at(index / COLUMNS, index % COLUMNS)
    }

    /// Flat index into a nine-wide grid.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.row * COLUMNS + self.column
    }
}

/// A physical slot the host can read or write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotTarget {
    /// Slot of a container created for a view.
    Container {
        /// Owning container.
        container: ContainerId,
        /// Raw slot index.
        index: usize,
    },
    /// Slot of the player's own inventory.
    Player(usize),
}

/// Shape strategy of a view: dimensions plus coordinate mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewShape {
    /// A created chest container.
    Chest {
        /// Visible rows (1..=6).
        rows: usize,
    },
    /// The player's own inventory.
    Player,
    /// A chest on top with the player's storage and hotbar underneath.
    Combined {
        /// Rows of the chest part (1..=6).
        chest_rows: usize,
    },
}

impl ViewShape {
    /// True when the dimensions are ones the host can show.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self {
            Self::Chest { rows } => rows >= 1 && rows <= MAX_CHEST_ROWS,
            Self::Player => true,
            Self::Combined { chest_rows } => chest_rows >= 1 && chest_rows <= MAX_CHEST_ROWS,
        }
    }

    /// Total logical rows.
    #[must_use]
    pub const fn rows(self) -> usize {
        match self {
            Self::Chest { rows } => rows,
            Self::Player => PLAYER_ROWS,
            Self::Combined { chest_rows } => chest_rows + COMBINED_PLAYER_ROWS,
        }
    }

    /// Rows backed by a created container.
    #[must_use]
    pub const fn container_rows(self) -> usize {
        match self {
            Self::Chest { rows } => rows,
            Self::Player => 0,
            Self::Combined { chest_rows } => chest_rows,
        }
    }

    /// True when the view needs the host to create a container.
    #[inline]
    #[must_use]
    pub const fn has_container(self) -> bool {
        !matches!(self, Self::Player)
    }

    /// True when the view paints into the player's own inventory.
    #[inline]
    #[must_use]
    pub const fn overlaps_player_inventory(self) -> bool {
        !matches!(self, Self::Chest { .. })
    }

    /// True when the point addresses a real slot of this shape.
    #[must_use]
    pub fn contains(self, point: GridPoint) -> bool {
        if point.column >= COLUMNS || point.row >= self.rows() {
            return false;
        }
        match self {
            Self::Player if point.row == PLAYER_ROWS - 1 => point.column < EQUIPMENT_COLUMNS,
            _ => true,
        }
    }

    /// Logical row to physical row permutation, or `None` for identity.
    #[must_use]
    pub fn row_ordering(self) -> Option<Vec<usize>> {
        match self {
            Self::Chest { .. } => None,
            Self::Player => Some(vec![1, 2, 3, 0, 4]),
            Self::Combined { chest_rows } => {
                let c = chest_rows;
                let mut ordering: Vec<usize> = (0..c).collect();
                ordering.extend([c + 1, c + 2, c + 3, c]);
                Some(ordering)
            }
        }
    }

    /// Every physical point of this shape, row-major.
    pub fn points(self) -> impl Iterator<Item = GridPoint> {
        (0..self.rows())
            .flat_map(|row| (0..COLUMNS).map(move |column| GridPoint::at(row, column)))
            .filter(move |point| self.contains(*point))
    }

    /// Maps a physical point to the slot the host writes.
    ///
    /// Container-backed points need the view's current container.
    #[must_use]
    pub fn slot_at(self, point: GridPoint, container: Option<ContainerId>) -> Option<SlotTarget> {
        if !self.contains(point) {
            return None;
        }
        let container_rows = self.container_rows();
        if point.row < container_rows {
            return container.map(|container| SlotTarget::Container {
                container,
                index: point.index(),
            });
        }
        let row = point.row - container_rows;
        match self {
            Self::Player if row == PLAYER_ROWS - 1 => Some(SlotTarget::Player(ARMOR_START + point.column)),
            _ => Some(SlotTarget::Player(row * COLUMNS + point.column)),
        }
    }

    /// Maps a click location to a physical point of this shape.
    #[must_use]
    pub fn point_at(self, target: ClickTarget) -> Option<GridPoint> {
        let point = match (self, target) {
            (Self::Chest { rows }, ClickTarget::Top(slot)) if slot < rows * COLUMNS => {
                GridPoint::from_index(slot)
            }
            (Self::Combined { chest_rows }, ClickTarget::Top(slot)) if slot < chest_rows * COLUMNS => {
                GridPoint::from_index(slot)
            }
            (Self::Combined { chest_rows }, ClickTarget::Bottom(slot)) if slot < ARMOR_START => {
                let point = GridPoint::from_index(slot);
                GridPoint::at(chest_rows + point.row, point.column)
            }
            (Self::Player, ClickTarget::Bottom(slot)) if slot < ARMOR_START => GridPoint::from_index(slot),
            (Self::Player, ClickTarget::Bottom(slot)) if slot <= OFFHAND_SLOT => {
                GridPoint::at(PLAYER_ROWS - 1, slot - ARMOR_START)
            }
            _ => return None,
        };
        Some(point)
    }
}
