use super::regs::RegisterLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT_COUNT: usize = 16;
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;
pub const DEFAULT_REGISTER_STRIDE: u64 = 0x2000;

/// Smallest stride that still fits the data and enable registers.
pub const MIN_REGISTER_STRIDE: u64 = 8;

/// Upper bound on queue slots summed over all endpoints (64 MiB of words). Queues are allocated
/// up front, so this caps what a config file can make the host reserve.
pub const MAX_QUEUE_SLOTS: usize = 1 << 24;

/// Static shape of a NoC adapter.
///
/// Missing fields deserialize to the defaults, so `{}` describes the stock 16-endpoint device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NocAdapterConfig {
    /// Number of endpoints; reported by the count register.
    pub endpoint_count: usize,
    /// Slots per endpoint queue. One slot is reserved, so `queue_capacity - 1` words fit.
    pub queue_capacity: usize,
    /// Bytes of register window per endpoint. Also the size of the leading count-register stride.
    pub register_stride: u64,
}

impl Default for NocAdapterConfig {
    fn default() -> Self {
        Self {
            endpoint_count: DEFAULT_ENDPOINT_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            register_stride: DEFAULT_REGISTER_STRIDE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NocConfigError {
    #[error("endpoint count must be non-zero")]
    NoEndpoints,
    #[error("endpoint count {0} does not fit the 32-bit count register")]
    TooManyEndpoints(usize),
    #[error("queue capacity {0} must be a power of two >= 2")]
    InvalidQueueCapacity(usize),
    #[error("register stride {0:#x} must be a power of two >= 8")]
    InvalidRegisterStride(u64),
    #[error("register window for {endpoint_count} endpoints at stride {stride:#x} overflows u64")]
    WindowOverflow { endpoint_count: usize, stride: u64 },
    #[error(
        "{endpoint_count} endpoints x {queue_capacity} slots exceeds the {} slot queue budget",
        MAX_QUEUE_SLOTS
    )]
    QueueStorageTooLarge {
        endpoint_count: usize,
        queue_capacity: usize,
    },
}

impl NocAdapterConfig {
    pub fn validate(&self) -> Result<(), NocConfigError> {
        if self.endpoint_count == 0 {
            return Err(NocConfigError::NoEndpoints);
        }
        if u32::try_from(self.endpoint_count).is_err() {
            return Err(NocConfigError::TooManyEndpoints(self.endpoint_count));
        }
        if self.queue_capacity < 2 || !self.queue_capacity.is_power_of_two() {
            return Err(NocConfigError::InvalidQueueCapacity(self.queue_capacity));
        }
        if self.register_stride < MIN_REGISTER_STRIDE || !self.register_stride.is_power_of_two() {
            return Err(NocConfigError::InvalidRegisterStride(self.register_stride));
        }
        (self.endpoint_count as u64)
            .checked_add(1)
            .and_then(|strides| strides.checked_mul(self.register_stride))
            .ok_or(NocConfigError::WindowOverflow {
                endpoint_count: self.endpoint_count,
                stride: self.register_stride,
            })?;
        match self.endpoint_count.checked_mul(self.queue_capacity) {
            Some(slots) if slots <= MAX_QUEUE_SLOTS => Ok(()),
            _ => Err(NocConfigError::QueueStorageTooLarge {
                endpoint_count: self.endpoint_count,
                queue_capacity: self.queue_capacity,
            }),
        }
    }

    /// Register offsets for this shape. Fails exactly when [`validate`](Self::validate) does.
    pub fn layout(&self) -> Result<RegisterLayout, NocConfigError> {
        self.validate()?;
        Ok(RegisterLayout::new(self.endpoint_count, self.register_stride))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_the_stock_device() {
        let cfg = NocAdapterConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.layout().unwrap().window_size(), 17 * 0x2000);
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let cfg: NocAdapterConfig =
            serde_json::from_str(r#"{ "endpoint_count": 256, "queue_capacity": 4 }"#).unwrap();
        assert_eq!(
            cfg,
            NocAdapterConfig {
                endpoint_count: 256,
                queue_capacity: 4,
                register_stride: DEFAULT_REGISTER_STRIDE,
            }
        );

        let cfg: NocAdapterConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, NocAdapterConfig::default());

        assert!(serde_json::from_str::<NocAdapterConfig>(r#"{ "endpoints": 4 }"#).is_err());
    }

    #[test]
    fn rejects_invalid_shapes() {
        let base = NocAdapterConfig::default();

        let cfg = NocAdapterConfig {
            endpoint_count: 0,
            ..base
        };
        assert_eq!(cfg.validate(), Err(NocConfigError::NoEndpoints));

        for capacity in [0, 1, 3, 100] {
            let cfg = NocAdapterConfig {
                queue_capacity: capacity,
                ..base
            };
            assert_eq!(
                cfg.validate(),
                Err(NocConfigError::InvalidQueueCapacity(capacity))
            );
        }

        for stride in [0, 4, 12, 0x2001] {
            let cfg = NocAdapterConfig {
                register_stride: stride,
                ..base
            };
            assert_eq!(
                cfg.validate(),
                Err(NocConfigError::InvalidRegisterStride(stride))
            );
        }

        let cfg = NocAdapterConfig {
            endpoint_count: u32::MAX as usize,
            register_stride: 1 << 40,
            ..base
        };
        assert!(matches!(
            cfg.validate(),
            Err(NocConfigError::WindowOverflow { .. })
        ));
    }

    #[test]
    fn invalid_shapes_have_no_layout() {
        let cfg = NocAdapterConfig {
            register_stride: 0,
            ..NocAdapterConfig::default()
        };
        assert_eq!(cfg.layout(), Err(NocConfigError::InvalidRegisterStride(0)));

        let cfg = NocAdapterConfig {
            register_stride: 0x3000,
            ..NocAdapterConfig::default()
        };
        assert!(cfg.layout().is_err());
    }

    #[test]
    fn bounds_total_queue_storage() {
        let cfg = NocAdapterConfig {
            endpoint_count: 4096,
            queue_capacity: 4096,
            ..NocAdapterConfig::default()
        };
        assert_eq!(cfg.validate(), Ok(()));

        let cfg = NocAdapterConfig {
            endpoint_count: 65536,
            ..cfg
        };
        assert_eq!(
            cfg.validate(),
            Err(NocConfigError::QueueStorageTooLarge {
                endpoint_count: 65536,
                queue_capacity: 4096,
            })
        );

        let cfg = NocAdapterConfig {
            endpoint_count: 1,
            queue_capacity: 1 << 30,
            ..cfg
        };
        assert!(matches!(
            cfg.validate(),
            Err(NocConfigError::QueueStorageTooLarge { .. })
        ));

        let cfg = NocAdapterConfig {
            endpoint_count: u32::MAX as usize,
            ..NocAdapterConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(NocConfigError::QueueStorageTooLarge { .. })
        ));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn rejects_counts_beyond_the_count_register() {
        let cfg = NocAdapterConfig {
            endpoint_count: u32::MAX as usize + 1,
            ..NocAdapterConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(NocConfigError::TooManyEndpoints(u32::MAX as usize + 1))
        );
    }
}
