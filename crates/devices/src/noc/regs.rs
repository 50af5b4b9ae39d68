//! NoC adapter register map and offset decoding.
//!
//! ```text
//! 0x0                                 R   endpoint count
//! EP_BASE + ep * STRIDE + 0x0         W   send word to endpoint `ep`
//! EP_BASE + ep * STRIDE + 0x0         R   receive word from endpoint `ep` (0 if empty)
//! EP_BASE + ep * STRIDE + 0x4         W   enable endpoint `ep`
//! ```
//!
//! `EP_BASE` equals `STRIDE`: the first stride of the window is reserved for the count register.

use thiserror::Error;

/// Endpoint count register, relative to the window base.
pub const REG_NUM_ENDPOINTS: u64 = 0x0;
/// Data register within an endpoint stride (send on write, receive on read).
pub const EP_REG_DATA: u64 = 0x0;
/// Enable register within an endpoint stride.
pub const EP_REG_ENABLE: u64 = 0x4;

/// Every register is 32 bits wide.
pub const REGISTER_WIDTH: usize = 4;

/// Direction of a guest access, carried in log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Target of a guest load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRegister {
    EndpointCount,
    Receive(usize),
}

/// Target of a guest store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteRegister {
    Send(usize),
    Enable(usize),
}

/// A register access the device cannot honour. Logged by the adapter, never returned to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessFault {
    #[error("no register at offset {offset:#x}")]
    Unmapped { offset: u64 },
    #[error("offset {offset:#x} selects endpoint {endpoint} but the device has {endpoint_count}")]
    EndpointOutOfRange {
        offset: u64,
        endpoint: u64,
        endpoint_count: usize,
    },
    #[error("register at offset {offset:#x} is read-only")]
    ReadOnly { offset: u64 },
    #[error("register at offset {offset:#x} is write-only")]
    WriteOnly { offset: u64 },
}

/// Offset arithmetic for one adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    endpoint_count: usize,
    stride: u64,
}

impl RegisterLayout {
    /// `stride` must be a power of two of at least 8 bytes so both endpoint registers fit and the
    /// in-stride offset can be masked out. Public callers go through
    /// [`NocAdapterConfig::layout`](super::NocAdapterConfig::layout), which validates first.
    pub(crate) fn new(endpoint_count: usize, stride: u64) -> Self {
        debug_assert!(stride >= 8 && stride.is_power_of_two());
        Self {
            endpoint_count,
            stride,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoint_count
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn endpoint_base(&self) -> u64 {
        self.stride
    }

    /// One stride for the count register plus one per endpoint.
    pub fn window_size(&self) -> u64 {
        (self.endpoint_count as u64)
            .saturating_add(1)
            .saturating_mul(self.stride)
    }

    fn endpoint_offset(&self, ep: usize) -> u64 {
        self.endpoint_base() + ep as u64 * self.stride
    }

    pub fn send_offset(&self, ep: usize) -> u64 {
        self.endpoint_offset(ep) + EP_REG_DATA
    }

    pub fn receive_offset(&self, ep: usize) -> u64 {
        self.endpoint_offset(ep) + EP_REG_DATA
    }

    pub fn enable_offset(&self, ep: usize) -> u64 {
        self.endpoint_offset(ep) + EP_REG_ENABLE
    }

    pub fn decode_read(&self, offset: u64) -> Result<ReadRegister, AccessFault> {
        if offset == REG_NUM_ENDPOINTS {
            return Ok(ReadRegister::EndpointCount);
        }

        match self.split_endpoint(offset)? {
            (ep, EP_REG_DATA) => Ok(ReadRegister::Receive(ep)),
            (_, EP_REG_ENABLE) => Err(AccessFault::WriteOnly { offset }),
            _ => Err(AccessFault::Unmapped { offset }),
        }
    }

    pub fn decode_write(&self, offset: u64) -> Result<WriteRegister, AccessFault> {
        if offset == REG_NUM_ENDPOINTS {
            return Err(AccessFault::ReadOnly { offset });
        }

        match self.split_endpoint(offset)? {
            (ep, EP_REG_DATA) => Ok(WriteRegister::Send(ep)),
            (ep, EP_REG_ENABLE) => Ok(WriteRegister::Enable(ep)),
            _ => Err(AccessFault::Unmapped { offset }),
        }
    }

    /// Splits an offset into `(endpoint, offset within the endpoint stride)`.
    fn split_endpoint(&self, offset: u64) -> Result<(usize, u64), AccessFault> {
        let Some(rel) = offset.checked_sub(self.endpoint_base()) else {
            return Err(AccessFault::Unmapped { offset });
        };

        let endpoint = rel / self.stride;
        let reg = rel & (self.stride - 1);
        match usize::try_from(endpoint) {
            Ok(ep) if ep < self.endpoint_count => Ok((ep, reg)),
            _ => Err(AccessFault::EndpointOutOfRange {
                offset,
                endpoint,
                endpoint_count: self.endpoint_count,
            }),
        }
    }
}
