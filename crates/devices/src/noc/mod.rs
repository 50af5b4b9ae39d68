//! Memory-mapped NoC adapter.
//!
//! The adapter exposes a bank of endpoints through a register window:
//!
//! - [`ring`]: the per-endpoint word queue.
//! - [`regs`]: register map and offset decoding.
//! - [`bank`]: the endpoint array.
//! - [`config`]: device shape (endpoint count, queue capacity, register stride).
//! - [`NocAdapter`]: register semantics and interrupt signalling.
//! - [`register_noc_adapter`]: attaches an adapter to a [`memory::PhysicalMemoryBus`].

pub mod bank;
pub mod config;
pub mod regs;
pub mod ring;

mod adapter;
mod mmio;

pub use adapter::{NocAdapter, NocAdapterStats};
pub use bank::{Endpoint, EndpointBank};
pub use config::{NocAdapterConfig, NocConfigError};
pub use mmio::{register_noc_adapter, NocAdapterMmio, RegisterError, SharedNocAdapter};
pub use regs::{Access, AccessFault, ReadRegister, RegisterLayout, WriteRegister};
pub use ring::{QueueFull, RingBuffer};
