/// Expands to a little-endian load/store pair per integer width, all routed through the two
/// byte-slice primitives.
macro_rules! sized_accessors {
    ($($ty:ty => $read:ident, $write:ident;)*) => {
        $(
            fn $read(&mut self, paddr: u64) -> $ty {
                let mut buf = [0u8; core::mem::size_of::<$ty>()];
                self.read_physical(paddr, &mut buf);
                <$ty>::from_le_bytes(buf)
            }

            fn $write(&mut self, paddr: u64, val: $ty) {
                self.write_physical(paddr, &val.to_le_bytes());
            }
        )*
    };
}

/// Guest-physical address space as seen by a CPU or DMA engine.
///
/// Implementors only move bytes; the sized helpers decide the access width. A width of up to
/// eight bytes may reach a device handler as one access, so loads take `&mut self` and can have
/// side effects such as draining a receive queue.
pub trait MemoryBus {
    fn read_physical(&mut self, paddr: u64, buf: &mut [u8]);
    fn write_physical(&mut self, paddr: u64, buf: &[u8]);

    sized_accessors! {
        u8 => read_u8, write_u8;
        u16 => read_u16, write_u16;
        u32 => read_u32, write_u32;
        u64 => read_u64, write_u64;
    }
}
