//! Publish-once buffer slots.
//!
//! Task outputs follow publish-by-completion: a task writes its result
//! into a [`Slot`] exactly once, *before* marking itself `Done` on the
//! task board, and downstream tasks only read after the board reports
//! `Done`. No reader can ever observe a partially-written buffer, and
//! published buffers are immutable from then on.

use std::sync::{Arc, OnceLock};

use crate::error::GenerateError;

/// A write-once cell holding a shared, immutable task output.
pub(crate) struct Slot<T> {
    cell: OnceLock<Arc<T>>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            cell: OnceLock::new(),
        })
    }

    /// Publish a value. Later publishes are ignored; the graph wiring
    /// guarantees each slot has exactly one producer.
    pub(crate) fn publish(&self, value: T) {
        let _ = self.cell.set(Arc::new(value));
    }

    /// Read the published value.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Internal`] if nothing was published --
    /// only possible if a task read a slot without waiting for its
    /// producer, which the dependency graph forbids.
    pub(crate) fn get(&self) -> Result<Arc<T>, GenerateError> {
        self.cell
            .get()
            .cloned()
            .ok_or(GenerateError::Internal("upstream buffer was not published"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpublished_slot_reports_internal_error() {
        let slot: Arc<Slot<u32>> = Slot::new();
        assert!(matches!(slot.get(), Err(GenerateError::Internal(_))));
    }

    #[test]
    fn published_value_is_readable() {
        let slot = Slot::new();
        slot.publish(7u32);
        let value = slot.get().map(|v| *v);
        assert!(matches!(value, Ok(7)));
    }

    #[test]
    fn second_publish_is_ignored() {
        let slot = Slot::new();
        slot.publish(1u32);
        slot.publish(2u32);
        let value = slot.get().map(|v| *v);
        assert!(matches!(value, Ok(1)), "first publish must win");
    }

    #[test]
    fn readers_share_one_allocation() {
        let slot = Slot::new();
        slot.publish(vec![1u8, 2, 3]);
        let a = slot.get().map_or_else(|_| Arc::new(vec![]), |v| v);
        let b = slot.get().map_or_else(|_| Arc::new(vec![]), |v| v);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
