use crate::{MapError, MemoryBus, MmioHandler, PhysicalMemoryBus};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct MmioState {
    mem: Vec<u8>,
    reads: Vec<(u64, usize)>,
    writes: Vec<(u64, usize, u64)>,
}

#[derive(Clone)]
struct RecordingMmio {
    state: Arc<Mutex<MmioState>>,
}

impl RecordingMmio {
    fn new(mem: Vec<u8>) -> (Self, Arc<Mutex<MmioState>>) {
        let state = Arc::new(Mutex::new(MmioState {
            mem,
            ..Default::default()
        }));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl MmioHandler for RecordingMmio {
    fn read(&mut self, offset: u64, size: usize) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.reads.push((offset, size));

        let mut buf = [0u8; 8];
        let off = offset as usize;
        for (i, dst) in buf.iter_mut().enumerate().take(size.min(8)) {
            *dst = state.mem.get(off + i).copied().unwrap_or(0);
        }
        u64::from_le_bytes(buf)
    }

    fn write(&mut self, offset: u64, size: usize, value: u64) {
        let mut state = self.state.lock().unwrap();
        state.writes.push((offset, size, value));

        let bytes = value.to_le_bytes();
        let off = offset as usize;
        for (i, &byte) in bytes.iter().enumerate().take(size.min(8)) {
            if let Some(dst) = state.mem.get_mut(off + i) {
                *dst = byte;
            }
        }
    }
}

#[test]
fn aligned_access_is_delivered_as_one_sized_access() {
    let (mmio, state) = RecordingMmio::new(vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]);
    let mut bus = PhysicalMemoryBus::new();
    bus.map_mmio(0x1000, 8, Box::new(mmio)).unwrap();

    assert_eq!(bus.read_u32(0x1004), 0x8877_6655);
    bus.write_u32(0x1000, 0xDEAD_BEEF);

    let state = state.lock().unwrap();
    assert_eq!(state.reads.as_slice(), &[(4, 4)]);
    assert_eq!(state.writes.as_slice(), &[(0, 4, 0xDEAD_BEEF)]);
}

#[test]
fn quad_word_access_reaches_the_handler_at_full_width() {
    let (mmio, state) = RecordingMmio::new(vec![0; 16]);
    let mut bus = PhysicalMemoryBus::new();
    bus.map_mmio(0x4000, 16, Box::new(mmio)).unwrap();

    bus.write_u64(0x4008, 0x0102_0304_0506_0708);
    assert_eq!(bus.read_u64(0x4008), 0x0102_0304_0506_0708);
    assert_eq!(bus.read_u16(0x400E), 0x0102);

    let state = state.lock().unwrap();
    assert_eq!(state.writes.as_slice(), &[(8, 8, 0x0102_0304_0506_0708)]);
    assert_eq!(state.reads.as_slice(), &[(8, 8), (14, 2)]);
}

#[test]
fn unmapped_reads_return_all_ones_and_writes_are_dropped() {
    let mut bus = PhysicalMemoryBus::new();

    assert_eq!(bus.read_u8(0x1000), 0xFF);
    assert_eq!(bus.read_u16(0x1000), 0xFFFF);
    assert_eq!(bus.read_u32(0x1000), 0xFFFF_FFFF);
    assert_eq!(bus.read_u64(0x1000), u64::MAX);
    assert_eq!(bus.read(0x1000, 2), 0xFFFF);

    bus.write_u32(0x1000, 0x1234_5678);
    assert!(!bus.is_mapped(0x1000));
}

#[test]
fn boundary_crossing_access_is_split_into_bytes() {
    let (mmio, state) = RecordingMmio::new(vec![0xAA, 0xBB]);
    let mut bus = PhysicalMemoryBus::new();
    bus.map_mmio(0x2000, 2, Box::new(mmio)).unwrap();

    // Two bytes come from the device, two from the open bus beyond it.
    assert_eq!(bus.read_u32(0x2000), 0xFFFF_BBAA);
    {
        let state = state.lock().unwrap();
        assert_eq!(state.reads.as_slice(), &[(0, 1), (1, 1)]);
    }

    bus.write_u16(0x1FFF, 0x1122);
    let state = state.lock().unwrap();
    assert_eq!(state.writes.as_slice(), &[(0, 1, 0x11)]);
    assert_eq!(state.mem[0], 0x11);
}

#[test]
fn map_mmio_rejects_empty_overflowing_and_overlapping_windows() {
    let mut bus = PhysicalMemoryBus::new();
    let (a, _) = RecordingMmio::new(Vec::new());

    assert_eq!(
        bus.map_mmio(0x1000, 0, Box::new(a.clone())),
        Err(MapError::EmptyRegion { start: 0x1000 })
    );
    assert_eq!(
        bus.map_mmio(u64::MAX, 2, Box::new(a.clone())),
        Err(MapError::AddressOverflow {
            start: u64::MAX,
            len: 2
        })
    );

    bus.map_mmio(0x1000, 0x100, Box::new(a.clone())).unwrap();
    bus.map_mmio(0x3000, 0x100, Box::new(a.clone())).unwrap();

    assert_eq!(
        bus.map_mmio(0x10FF, 0x10, Box::new(a.clone())),
        Err(MapError::Overlap {
            start: 0x10FF,
            end: 0x110F,
            existing_start: 0x1000,
            existing_end: 0x1100,
        })
    );
    // Swallowing a whole existing window is an overlap too.
    assert!(matches!(
        bus.map_mmio(0x2000, 0x2000, Box::new(a.clone())),
        Err(MapError::Overlap {
            existing_start: 0x3000,
            ..
        })
    ));

    // Adjacent windows are fine.
    bus.map_mmio(0x1100, 0x100, Box::new(a)).unwrap();
    assert_eq!(
        bus.mmio_windows().collect::<Vec<_>>(),
        vec![(0x1000, 0x100), (0x1100, 0x100), (0x3000, 0x100)]
    );
}

#[test]
fn sized_read_masks_to_access_width() {
    let (mmio, _) = RecordingMmio::new(vec![0x01, 0x02, 0x03, 0x04]);
    let mut bus = PhysicalMemoryBus::new();
    bus.map_mmio(0, 4, Box::new(mmio)).unwrap();

    assert_eq!(bus.read(0, 1), 0x01);
    assert_eq!(bus.read(0, 2), 0x0201);
    assert_eq!(bus.read(0, 4), 0x0403_0201);
    assert_eq!(bus.read(0, 0), 0);
}
