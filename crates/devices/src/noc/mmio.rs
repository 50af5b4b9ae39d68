use super::adapter::NocAdapter;
use super::config::{NocAdapterConfig, NocConfigError};
use crate::irq::IrqLine;
use memory::{MapError, MmioHandler, PhysicalMemoryBus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Adapter handle shared between the bus mapping and the host.
pub type SharedNocAdapter = Arc<Mutex<NocAdapter>>;

/// [`memory::MmioHandler`] adapter that forwards guest loads and stores to a [`NocAdapter`].
///
/// `offset` is interpreted relative to the base the window was mapped at.
pub struct NocAdapterMmio {
    dev: SharedNocAdapter,
}

impl NocAdapterMmio {
    pub fn new(dev: SharedNocAdapter) -> Self {
        Self { dev }
    }

    fn dev(&self) -> MutexGuard<'_, NocAdapter> {
        self.dev.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MmioHandler for NocAdapterMmio {
    fn read(&mut self, offset: u64, size: usize) -> u64 {
        u64::from(self.dev().handle_read(offset, size))
    }

    fn write(&mut self, offset: u64, size: usize, value: u64) {
        // Registers are 32 bits wide; wider stores only contribute their low word.
        self.dev().handle_write(offset, value as u32, size);
    }
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Config(#[from] NocConfigError),
    #[error("failed to map NoC adapter window at {base:#x}")]
    Map {
        base: u64,
        #[source]
        source: MapError,
    },
}

/// Build a [`NocAdapter`] and map its register window on `bus` at `base`.
///
/// The window spans `(endpoint_count + 1) * register_stride` bytes. The returned handle is the
/// same adapter the bus dispatches to, so the host can inspect or reset it later.
pub fn register_noc_adapter(
    bus: &mut PhysicalMemoryBus,
    base: u64,
    config: NocAdapterConfig,
    irq: Box<dyn IrqLine>,
) -> Result<SharedNocAdapter, RegisterError> {
    let adapter = NocAdapter::new(config, irq)?;
    let len = adapter.window_size();

    let dev: SharedNocAdapter = Arc::new(Mutex::new(adapter));
    bus.map_mmio(base, len, Box::new(NocAdapterMmio::new(Arc::clone(&dev))))
        .map_err(|source| RegisterError::Map { base, source })?;

    tracing::info!(
        base,
        len,
        endpoints = config.endpoint_count,
        "NoC adapter registered"
    );
    Ok(dev)
}
