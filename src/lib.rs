#![forbid(unsafe_code)]

//! Minimal OpTiMSoC-style machine: a guest physical bus with the NoC adapter mapped on it.
//!
//! This is the component that owns device registration. Tests and front-ends drive guest loads
//! and stores through [`Machine::bus_mut`] and observe interrupts through [`Machine::take_noc_irqs`].

use memory::{MemoryBus, PhysicalMemoryBus};
use noc_devices::irq::CountingIrqLine;
use noc_devices::noc::{register_noc_adapter, NocAdapterConfig, RegisterError, SharedNocAdapter};
use serde::{Deserialize, Serialize};
use std::sync::{MutexGuard, PoisonError};
use thiserror::Error;

pub use memory;
pub use noc_devices;

/// Physical base of the NoC adapter window on OpTiMSoC compute tiles.
pub const NOC_ADAPTER_BASE: u64 = 0xE000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// Guest physical address the NoC adapter window is mapped at.
    pub noc_base: u64,
    pub noc: NocAdapterConfig,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            noc_base: NOC_ADAPTER_BASE,
            noc: NocAdapterConfig::default(),
        }
    }
}

/// Errors returned when constructing a [`Machine`].
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("failed to attach NoC adapter")]
    Noc(#[from] RegisterError),
}

pub struct Machine {
    cfg: MachineConfig,
    bus: PhysicalMemoryBus,
    noc: SharedNocAdapter,
    noc_irq: CountingIrqLine,
}

impl Machine {
    pub fn new(cfg: MachineConfig) -> Result<Self, MachineError> {
        let mut bus = PhysicalMemoryBus::new();
        let noc_irq = CountingIrqLine::new();
        let noc = register_noc_adapter(&mut bus, cfg.noc_base, cfg.noc, Box::new(noc_irq.clone()))?;

        tracing::debug!(noc_base = cfg.noc_base, "machine constructed");
        Ok(Self {
            cfg,
            bus,
            noc,
            noc_irq,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.cfg
    }

    pub fn bus_mut(&mut self) -> &mut PhysicalMemoryBus {
        &mut self.bus
    }

    /// Shared handle to the adapter the bus dispatches to.
    pub fn noc(&self) -> &SharedNocAdapter {
        &self.noc
    }

    /// Locks the adapter for host-side inspection.
    pub fn noc_state(&self) -> MutexGuard<'_, noc_devices::NocAdapter> {
        self.noc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Interrupts raised by the NoC adapter since the last call.
    pub fn take_noc_irqs(&self) -> u64 {
        self.noc_irq.take()
    }

    /// Guest 32-bit load.
    pub fn read_u32(&mut self, paddr: u64) -> u32 {
        self.bus.read_u32(paddr)
    }

    /// Guest 32-bit store.
    pub fn write_u32(&mut self, paddr: u64, value: u32) {
        self.bus.write_u32(paddr, value);
    }

    /// Power-on reset: endpoints disabled, queues empty, pending interrupt count cleared.
    pub fn reset(&mut self) {
        self.noc_state().reset();
        self.noc_irq.take();
    }
}
