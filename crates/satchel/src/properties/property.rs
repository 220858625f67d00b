//! Value cells that fire their trigger on change.

use super::Trigger;
use parking_lot::RwLock;
use std::sync::Arc;

/// Observable value cell.
///
/// Writes that compare equal to the current value are no-ops: nothing fires.
pub struct InterfaceProperty<T> {
    value: Arc<RwLock<T>>,
    trigger: Trigger,
}

impl<T> Clone for InterfaceProperty<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            trigger: self.trigger.clone(),
        }
    }
}

impl<T> InterfaceProperty<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a property holding `initial`.
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            trigger: Trigger::new(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Reads the value without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.value.read())
    }

    /// Stores `value`, firing the trigger only if it differs from the old one.
    ///
    /// Returns true when the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.trigger.trigger();
        true
    }

    /// Applies `change` to a copy of the value and stores the result.
    pub fn update(&self, change: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        change(&mut next);
        self.set(next)
    }

    /// Trigger fired on every effective change.
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for InterfaceProperty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceProperty")
            .field("value", &*self.value.read())
            .finish_non_exhaustive()
    }
}

/// Integer property clamped to `[min, max]`.
#[derive(Clone, Debug)]
pub struct BoundInteger {
    property: InterfaceProperty<i64>,
    bounds: Arc<RwLock<(i64, i64)>>,
}

impl BoundInteger {
    /// Creates a bounded integer. `initial` is clamped into range.
    #[must_use]
    pub fn new(initial: i64, min: i64, max: i64) -> Self {
        let max = max.max(min);
        Self {
            property: InterfaceProperty::new(initial.clamp(min, max)),
            bounds: Arc::new(RwLock::new((min, max))),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.property.get()
    }

    /// Lower bound.
    #[must_use]
    pub fn min(&self) -> i64 {
        self.bounds.read().0
    }

    /// Upper bound.
    #[must_use]
    pub fn max(&self) -> i64 {
        self.bounds.read().1
    }

    /// Writes `value` coerced into range. Fires only if the coerced value changed.
    pub fn set(&self, value: i64) -> bool {
        let (min, max) = *self.bounds.read();
        self.property.set(value.clamp(min, max))
    }

    /// Adds `delta`, saturating at the bounds.
    pub fn add(&self, delta: i64) -> bool {
        self.set(self.get().saturating_add(delta))
    }

    /// Moves the bounds and re-clamps the current value.
    pub fn set_bounds(&self, min: i64, max: i64) -> bool {
        let max = max.max(min);
        *self.bounds.write() = (min, max);
        self.set(self.get())
    }

    /// True when the value can still decrease.
    #[must_use]
    pub fn has_preceding(&self) -> bool {
        self.get() > self.min()
    }

    /// True when the value can still increase.
    #[must_use]
    pub fn has_succeeding(&self) -> bool {
        self.get() < self.max()
    }

    /// Trigger fired on every effective change.
    #[inline]
    #[must_use]
    pub fn trigger(&self) -> &Trigger {
        self.property.trigger()
    }
}
