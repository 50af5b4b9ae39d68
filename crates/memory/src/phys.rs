use crate::bus::MemoryBus;
use crate::mmio::MmioHandler;
use thiserror::Error;

/// Errors returned by [`PhysicalMemoryBus::map_mmio`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The requested window has zero length.
    #[error("mmio window at 0x{start:x} is empty")]
    EmptyRegion { start: u64 },
    /// `start + len` does not fit in the 64-bit physical address space.
    #[error("mmio window overflows the address space: start=0x{start:x} len=0x{len:x}")]
    AddressOverflow { start: u64, len: u64 },
    /// The requested window intersects a window that is already mapped.
    #[error(
        "mmio window [0x{start:x}, 0x{end:x}) overlaps existing window [0x{existing_start:x}, 0x{existing_end:x})"
    )]
    Overlap {
        start: u64,
        end: u64,
        existing_start: u64,
        existing_end: u64,
    },
}

struct MmioRegion {
    start: u64,
    /// Exclusive.
    end: u64,
    handler: Box<dyn MmioHandler>,
}

impl MmioRegion {
    #[inline]
    fn contains(&self, paddr: u64, len: u64) -> bool {
        paddr >= self.start && paddr.checked_add(len).is_some_and(|end| end <= self.end)
    }
}

/// Guest physical address space made of MMIO windows.
///
/// - Windows are kept sorted by start address and never overlap.
/// - An access that fits entirely inside one window is delivered to that window's handler as a
///   single sized access.
/// - An access that straddles a window boundary is split into byte accesses.
/// - Unmapped reads return all ones (open bus); unmapped writes are dropped.
#[derive(Default)]
pub struct PhysicalMemoryBus {
    regions: Vec<MmioRegion>,
}

impl PhysicalMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` at `[start, start + len)`.
    pub fn map_mmio(
        &mut self,
        start: u64,
        len: u64,
        handler: Box<dyn MmioHandler>,
    ) -> Result<(), MapError> {
        if len == 0 {
            return Err(MapError::EmptyRegion { start });
        }
        let end = start
            .checked_add(len)
            .ok_or(MapError::AddressOverflow { start, len })?;

        let idx = self.regions.partition_point(|r| r.start < start);
        let neighbours = [idx.checked_sub(1), Some(idx)];
        for r in neighbours.into_iter().flatten().filter_map(|i| self.regions.get(i)) {
            if start < r.end && r.start < end {
                return Err(MapError::Overlap {
                    start,
                    end,
                    existing_start: r.start,
                    existing_end: r.end,
                });
            }
        }

        tracing::debug!(start, len, "mapped mmio window");
        self.regions.insert(
            idx,
            MmioRegion {
                start,
                end,
                handler,
            },
        );
        Ok(())
    }

    /// `(start, len)` of every mapped window, in address order.
    pub fn mmio_windows(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.regions.iter().map(|r| (r.start, r.end - r.start))
    }

    pub fn is_mapped(&self, paddr: u64) -> bool {
        self.region_index(paddr).is_some()
    }

    /// Sized load of `size` bytes (clamped to 8). Unmapped bytes read as `0xFF`.
    pub fn read(&mut self, paddr: u64, size: usize) -> u64 {
        if size == 0 {
            return 0;
        }
        let size = size.min(8);
        let mut buf = [0xFFu8; 8];
        self.read_physical(paddr, &mut buf[..size]);
        u64::from_le_bytes(buf) & size_mask(size)
    }

    /// Sized store of the low `size` bytes (clamped to 8) of `value`.
    pub fn write(&mut self, paddr: u64, size: usize, value: u64) {
        if size == 0 {
            return;
        }
        let size = size.min(8);
        let bytes = value.to_le_bytes();
        self.write_physical(paddr, &bytes[..size]);
    }

    fn region_index(&self, paddr: u64) -> Option<usize> {
        let idx = self.regions.partition_point(|r| r.start <= paddr);
        let idx = idx.checked_sub(1)?;
        (paddr < self.regions[idx].end).then_some(idx)
    }

    fn region_for_access(&mut self, paddr: u64, len: u64) -> Option<&mut MmioRegion> {
        let idx = self.region_index(paddr)?;
        let region = &mut self.regions[idx];
        region.contains(paddr, len).then_some(region)
    }

    fn read_byte(&mut self, paddr: u64) -> u8 {
        match self.region_for_access(paddr, 1) {
            Some(region) => region.handler.read(paddr - region.start, 1) as u8,
            None => {
                tracing::trace!(paddr, "unmapped mmio read");
                0xFF
            }
        }
    }

    fn write_byte(&mut self, paddr: u64, value: u8) {
        match self.region_for_access(paddr, 1) {
            Some(region) => region.handler.write(paddr - region.start, 1, u64::from(value)),
            None => tracing::trace!(paddr, value, "unmapped mmio write dropped"),
        }
    }
}

impl MemoryBus for PhysicalMemoryBus {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]) {
        let len = buf.len();
        if len == 0 {
            return;
        }

        if len <= 8 {
            if let Some(region) = self.region_for_access(paddr, len as u64) {
                let value = region.handler.read(paddr - region.start, len);
                buf.copy_from_slice(&value.to_le_bytes()[..len]);
                return;
            }
        }

        for (i, dst) in buf.iter_mut().enumerate() {
            *dst = match paddr.checked_add(i as u64) {
                Some(addr) => self.read_byte(addr),
                None => 0xFF,
            };
        }
    }

    fn write_physical(&mut self, paddr: u64, buf: &[u8]) {
        let len = buf.len();
        if len == 0 {
            return;
        }

        if len <= 8 {
            if let Some(region) = self.region_for_access(paddr, len as u64) {
                let mut bytes = [0u8; 8];
                bytes[..len].copy_from_slice(buf);
                region
                    .handler
                    .write(paddr - region.start, len, u64::from_le_bytes(bytes));
                return;
            }
        }

        for (i, &byte) in buf.iter().enumerate() {
            let Some(addr) = paddr.checked_add(i as u64) else {
                break;
            };
            self.write_byte(addr, byte);
        }
    }
}

#[inline]
fn size_mask(size: usize) -> u64 {
    if size >= 8 {
        u64::MAX
    } else {
        (1u64 << (size * 8)) - 1
    }
}
