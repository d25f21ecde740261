//! Shared scalar cells sampled by logger sessions while a run is in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A named `f64` slot an algorithm exposes so a logger session can sample it
/// without holding a borrow of the algorithm itself.
///
/// The value is stored as its IEEE-754 bit pattern in an atomic word, so cells
/// can be read from a session while the owning algorithm keeps mutating them.
/// Cloning a cell yields another handle to the same slot.
#[derive(Debug, Clone, Default)]
pub struct AttributeCell {
    bits: Arc<AtomicU64>,
}

impl AttributeCell {
    /// Creates a cell holding the given initial value.
    pub fn new(value: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(value.to_bits())),
        }
    }

    /// Stores a new value into the cell.
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Reads the current value of the cell.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_share_one_slot() {
        let cell = AttributeCell::new(1.5);
        let alias = cell.clone();
        cell.set(-3.25);
        assert_eq!(alias.get(), -3.25);
    }

    #[test]
    fn default_cell_reads_zero() {
        assert_eq!(AttributeCell::default().get(), 0.0);
    }
}
