#![forbid(unsafe_code)]

//! Guest-physical address routing for MMIO device models.
//!
//! [`PhysicalMemoryBus`] owns a set of non-overlapping MMIO windows and forwards sized loads and
//! stores to the [`MmioHandler`] that claims the address. Anything outside a window behaves like an
//! open bus.

mod bus;
mod mmio;
mod phys;

pub use bus::MemoryBus;
pub use mmio::MmioHandler;
pub use phys::{MapError, PhysicalMemoryBus};

#[cfg(test)]
mod tests;
