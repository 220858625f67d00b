//! Event vocabulary shared with the host's event dispatch.

use serde::{Deserialize, Serialize};

/// Why a container stopped being visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The player closed it themselves.
    Player,
    /// Closed by plugin code.
    Plugin,
    /// Another container replaced it.
    OpenNew,
    /// The player disconnected, or the host gave no reason.
    Disconnect,
    /// The server is shutting down.
    Shutdown,
    /// Reason not reported by the host.
    Unknown,
}

impl CloseReason {
    /// Every reason, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Player,
        Self::Plugin,
        Self::OpenNew,
        Self::Disconnect,
        Self::Shutdown,
        Self::Unknown,
    ];

    /// Reasons that re-open a backgrounded view unless configured otherwise.
    #[must_use]
    pub fn default_reopen_reasons() -> Vec<Self> {
        Self::ALL.into_iter().filter(|r| *r != Self::Plugin).collect()
    }

    /// True when the close was caused by switching to another container.
    #[inline]
    #[must_use]
    pub const fn is_view_switch(self) -> bool {
        matches!(self, Self::OpenNew)
    }
}

/// Kind of click reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickType {
    /// Primary button.
    Left,
    /// Secondary button.
    Right,
    /// Primary button while sneaking.
    ShiftLeft,
    /// Secondary button while sneaking.
    ShiftRight,
    /// Middle button.
    Middle,
    /// Number key swap, carrying the hotbar slot.
    NumberKey(u8),
    /// Drop key.
    Drop,
    /// Double click collecting items.
    DoubleClick,
    /// Physical interaction with the held item (left).
    InteractLeft,
    /// Physical interaction with the held item (right).
    InteractRight,
}

impl ClickType {
    /// True for clicks that move stacks between inventories.
    #[inline]
    #[must_use]
    pub const fn is_shift(self) -> bool {
        matches!(self, Self::ShiftLeft | Self::ShiftRight)
    }

    /// True for physical interactions rather than container clicks.
    #[inline]
    #[must_use]
    pub const fn is_interact(self) -> bool {
        matches!(self, Self::InteractLeft | Self::InteractRight)
    }
}

/// Modifier keys held during a click.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// Sneak key.
    pub shift: bool,
    /// Sprint/control key.
    pub control: bool,
}

/// Where a click landed, in host terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// Raw slot index in the top (created) container.
    Top(usize),
    /// Slot index in the player's own inventory.
    Bottom(usize),
    /// Outside any inventory.
    Outside,
}
