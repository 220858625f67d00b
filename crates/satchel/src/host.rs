//! # Host Integration Trait
//!
//! The engine never touches the host's container API directly. The host
//! implements this trait and the engine calls it, always from the primary
//! executor for container reads and writes.
//!
//! ```text
//! Engine defines:        Host implements:
//! ┌────────────────┐     ┌────────────────┐
//! │ InterfaceHost  │ ←── │ impl for Host  │
//! └────────────────┘     └────────────────┘
//! ```

use satchel_shared::{ContainerId, ItemStack, PlayerId, SlotTarget};

/// Capabilities the engine needs from the host runtime.
pub trait InterfaceHost: Send + Sync + 'static {
    /// True while the player can still receive updates.
    fn is_online(&self, player: PlayerId) -> bool;

    /// True once the host began shutting down.
    fn is_shutting_down(&self) -> bool;

    /// Creates a new container of `rows` rows with the given title.
    ///
    /// Titles cannot change on a live container; a new title means a new container.
    fn create_container(&self, player: PlayerId, title: &str, rows: usize) -> ContainerId;

    /// Reads a slot.
    fn item(&self, player: PlayerId, slot: SlotTarget) -> Option<ItemStack>;

    /// Writes a slot. `None` clears it.
    fn set_item(&self, player: PlayerId, slot: SlotTarget, item: Option<ItemStack>);

    /// Container currently in the player's foreground, if any.
    fn foreground_container(&self, player: PlayerId) -> Option<ContainerId>;

    /// Makes the container the player's visible foreground.
    fn show_container(&self, player: PlayerId, container: ContainerId);

    /// Closes whatever container the player has open.
    fn close_container(&self, player: PlayerId);

    /// Sends a chat line to the player.
    fn send_message(&self, player: PlayerId, message: &str);

    /// Terminates the player's session with a visible message.
    fn disconnect(&self, player: PlayerId, message: &str);
}
