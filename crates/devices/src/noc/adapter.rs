use super::bank::{Endpoint, EndpointBank};
use super::config::{NocAdapterConfig, NocConfigError};
use super::regs::{
    Access, AccessFault, ReadRegister, RegisterLayout, WriteRegister, REGISTER_WIDTH,
};
use super::ring::QueueFull;
use crate::irq::IrqLine;
use core::fmt;
use tracing::{debug, trace, warn};

/// Host-side access counters. Not visible to the guest and not cleared by [`NocAdapter::reset`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NocAdapterStats {
    /// Words accepted into an endpoint queue.
    pub sends: u64,
    /// Words handed to the guest by a receive-register read.
    pub receives: u64,
    /// Receive-register reads that found the queue empty and returned 0.
    pub empty_reads: u64,
    /// Sends dropped because the queue was full.
    pub overflow_drops: u64,
    /// Sends dropped because the endpoint was never enabled.
    pub disabled_drops: u64,
    pub addressing_errors: u64,
    pub size_mismatches: u64,
}

/// OpTiMSoC-style NoC adapter in loopback mode.
///
/// A word written to an endpoint's data register is queued on that same endpoint and raises the
/// interrupt line; reading the data register drains the queue, yielding 0 once it is empty.
/// Endpoints must be enabled before they accept words. Sends to a disabled endpoint or to a full
/// queue are dropped without telling the guest.
///
/// Register accesses are total: malformed offsets and access widths are logged and counted, never
/// surfaced as errors, so a misbehaving guest cannot stop the machine.
pub struct NocAdapter {
    config: NocAdapterConfig,
    layout: RegisterLayout,
    endpoints: EndpointBank,
    irq: Box<dyn IrqLine>,
    stats: NocAdapterStats,
}

impl fmt::Debug for NocAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NocAdapter")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl NocAdapter {
    pub fn new(config: NocAdapterConfig, irq: Box<dyn IrqLine>) -> Result<Self, NocConfigError> {
        let layout = config.layout()?;
        Ok(Self {
            config,
            layout,
            endpoints: EndpointBank::new(config.endpoint_count, config.queue_capacity),
            irq,
            stats: NocAdapterStats::default(),
        })
    }

    pub fn config(&self) -> &NocAdapterConfig {
        &self.config
    }

    pub fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    pub fn endpoint_count(&self) -> usize {
        self.config.endpoint_count
    }

    pub fn window_size(&self) -> u64 {
        self.layout.window_size()
    }

    pub fn endpoint(&self, ep: usize) -> Option<&Endpoint> {
        self.endpoints.get(ep)
    }

    pub fn stats(&self) -> NocAdapterStats {
        self.stats
    }

    /// Returns every endpoint to its power-on state: disabled with an empty queue.
    pub fn reset(&mut self) {
        debug!("NoC adapter reset");
        self.endpoints.reset();
    }

    pub fn handle_read(&mut self, offset: u64, size: usize) -> u32 {
        self.check_access_size(Access::Read, offset, size);

        match self.layout.decode_read(offset) {
            Ok(ReadRegister::EndpointCount) => {
                u32::try_from(self.config.endpoint_count).unwrap_or(u32::MAX)
            }
            Ok(ReadRegister::Receive(ep)) => self.receive(offset, ep),
            Err(fault) => {
                self.record_fault(Access::Read, fault);
                0
            }
        }
    }

    pub fn handle_write(&mut self, offset: u64, value: u32, size: usize) {
        self.check_access_size(Access::Write, offset, size);

        match self.layout.decode_write(offset) {
            Ok(WriteRegister::Enable(ep)) => self.enable(offset, ep),
            Ok(WriteRegister::Send(ep)) => self.send(offset, ep, value),
            Err(fault) => self.record_fault(Access::Write, fault),
        }
    }

    fn enable(&mut self, offset: u64, ep: usize) {
        match self.endpoints.get_mut(ep) {
            Some(endpoint) => {
                endpoint.enable();
                debug!(endpoint = ep, "NoC endpoint enabled");
            }
            None => self.record_fault(Access::Write, self.out_of_range(offset, ep)),
        }
    }

    fn send(&mut self, offset: u64, ep: usize, value: u32) {
        let Some(endpoint) = self.endpoints.get_mut(ep) else {
            self.record_fault(Access::Write, self.out_of_range(offset, ep));
            return;
        };

        if !endpoint.is_enabled() {
            self.stats.disabled_drops += 1;
            debug!(endpoint = ep, value, "send to disabled NoC endpoint dropped");
            return;
        }

        match endpoint.queue_mut().push(value) {
            Ok(()) => {
                self.stats.sends += 1;
                trace!(endpoint = ep, value, "NoC send");
                self.irq.raise();
            }
            Err(QueueFull) => {
                self.stats.overflow_drops += 1;
                warn!(endpoint = ep, value, "NoC endpoint queue overflow; word dropped");
            }
        }
    }

    fn receive(&mut self, offset: u64, ep: usize) -> u32 {
        let Some(endpoint) = self.endpoints.get_mut(ep) else {
            self.record_fault(Access::Read, self.out_of_range(offset, ep));
            return 0;
        };

        match endpoint.queue_mut().pop() {
            Some(word) => {
                self.stats.receives += 1;
                trace!(endpoint = ep, word, "NoC receive");
                word
            }
            None => {
                self.stats.empty_reads += 1;
                0
            }
        }
    }

    fn out_of_range(&self, offset: u64, ep: usize) -> AccessFault {
        AccessFault::EndpointOutOfRange {
            offset,
            endpoint: ep as u64,
            endpoint_count: self.endpoints.len(),
        }
    }

    fn check_access_size(&mut self, access: Access, offset: u64, size: usize) {
        if size != REGISTER_WIDTH {
            self.stats.size_mismatches += 1;
            warn!(
                ?access,
                offset,
                size,
                "NoC adapter access is not {REGISTER_WIDTH} bytes wide; continuing"
            );
        }
    }

    fn record_fault(&mut self, access: Access, fault: AccessFault) {
        self.stats.addressing_errors += 1;
        warn!(?access, %fault, "NoC adapter addressing error ignored");
    }
}
