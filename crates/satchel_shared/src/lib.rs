//! # SATCHEL Shared
//!
//! Types exchanged between the interface engine and the host runtime.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `tokio`
//! - the host's own container API
//!
//! Everything here is plain data or pure coordinate math, so both the engine
//! and host adapters can use it without pulling in a runtime.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod event;
pub mod grid;
pub mod item;

pub use event::{ClickTarget, ClickType, CloseReason, Modifiers};
pub use grid::{GridPoint, SlotTarget, ViewShape, COLUMNS, MAX_CHEST_ROWS};
pub use item::{ContainerId, ItemStack, PlayerId};
