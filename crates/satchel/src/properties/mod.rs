//! # Reactive State
//!
//! Triggers are the signals; properties are value cells that own a trigger
//! and fire it exactly when a write changes the value.

mod lazy;
mod property;
mod trigger;

pub use lazy::{LazyProperty, LoadFuture, DEFAULT_DEBOUNCE};
pub use property::{BoundInteger, InterfaceProperty};
pub use trigger::{ListenerId, Subscription, Trigger};
