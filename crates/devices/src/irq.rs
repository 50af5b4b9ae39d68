//! Interrupt outputs driven by device models.
//!
//! Delivery (routing, masking, acknowledging) belongs to whatever interrupt controller sits on the
//! other end of the line. Devices only signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// An edge-triggered interrupt output.
///
/// Each call to [`IrqLine::raise`] is one event. Implementations must not assume the previous event
/// was observed before the next one arrives.
pub trait IrqLine: Send + Sync {
    fn raise(&self);
}

impl<T: IrqLine + ?Sized> IrqLine for Arc<T> {
    fn raise(&self) {
        (**self).raise();
    }
}

impl<T: IrqLine + ?Sized> IrqLine for Box<T> {
    fn raise(&self) {
        (**self).raise();
    }
}

/// A line that is not wired to anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIrq;

impl IrqLine for NoIrq {
    fn raise(&self) {}
}

/// An interrupt line that counts raises.
///
/// Clones share the same counter, so the host can keep one clone and hand another to the device.
#[derive(Debug, Default, Clone)]
pub struct CountingIrqLine {
    raised: Arc<AtomicU64>,
}

impl CountingIrqLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total raises since creation (or since the last [`CountingIrqLine::take`]).
    pub fn count(&self) -> u64 {
        self.raised.load(Ordering::Acquire)
    }

    /// Returns the pending raise count and resets it to zero, like an interrupt handler draining
    /// a latched edge counter.
    pub fn take(&self) -> u64 {
        self.raised.swap(0, Ordering::AcqRel)
    }
}

impl IrqLine for CountingIrqLine {
    fn raise(&self) {
        self.raised.fetch_add(1, Ordering::AcqRel);
    }
}
