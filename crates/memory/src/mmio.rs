/// Callbacks for a device mapped into a [`crate::PhysicalMemoryBus`] window.
///
/// `offset` is relative to the start of the mapping and `size` is the access width in bytes
/// (`1..=8`). Values travel little-endian in the low `size` bytes of the `u64`; bytes above `size`
/// are ignored by the bus on reads.
///
/// Handlers must accept every `(offset, size)` pair inside their window without panicking. What a
/// malformed access does to the device is up to the device, but it must never take down the host.
pub trait MmioHandler {
    fn read(&mut self, offset: u64, size: usize) -> u64;
    fn write(&mut self, offset: u64, size: usize, value: u64);
}
