#![forbid(unsafe_code)]

pub mod irq;
pub mod noc;

pub use noc::{register_noc_adapter, NocAdapter, NocAdapterConfig, SharedNocAdapter};
