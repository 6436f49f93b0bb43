use log::trace;
use serde::Serialize;

use crate::allocator::{acquire_frame, FrameRequest, FrameSource};
use crate::constants::*;
use crate::error::VmError;
use crate::memory::{BackingStore, Disk, PhysicalMemory};
use crate::translation::{extend_path, VirtualAddress};

/// Counters over the lifetime of a [`VirtualMemory`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub reads: u64,
    pub writes: u64,
    /// Reads and writes that returned an error
    pub rejected: u64,
    /// Missing table entries filled during translation
    pub faults: u64,
    pub free_reuses: u64,
    pub unused_frames: u64,
    pub evictions: u64,
}

/// Virtual memory backed by a page-table tree in a fixed pool of frames.
///
/// Frame 0 is the root directory. Every other frame is a directory, a
/// resident page, or free (all zeros); roles are never stored elsewhere.
pub struct VirtualMemory<S: BackingStore = Disk> {
    geometry: Geometry,
    memory: PhysicalMemory,
    store: S,
    stats: Stats,
}

impl VirtualMemory<Disk> {
    pub fn new(geometry: Geometry) -> Self {
        Self::with_store(geometry, Disk::new())
    }
}

impl<S: BackingStore> VirtualMemory<S> {
    /// Build an initialized address space over `store`
    pub fn with_store(geometry: Geometry, store: S) -> Self {
        let mut vm = VirtualMemory {
            geometry,
            memory: PhysicalMemory::new(&geometry),
            store,
            stats: Stats::default(),
        };
        vm.initialize();
        vm
    }

    /// Zero the root directory and drop all swapped-out pages, leaving
    /// every virtual page unmapped and reading as zero
    pub fn initialize(&mut self) {
        self.memory.clear_frame(0);
        self.store.clear();
    }

    pub fn read(&mut self, address: u64) -> Result<Word, VmError> {
        let physical = self.checked_translate(address)?;
        self.stats.reads += 1;
        Ok(self.memory.read(physical))
    }

    pub fn write(&mut self, address: u64, value: Word) -> Result<(), VmError> {
        let physical = self.checked_translate(address)?;
        self.stats.writes += 1;
        self.memory.write(physical, value);
        Ok(())
    }

    /// Physical address of `address`, mapping any missing tables on the way
    pub fn translate(&mut self, address: u64) -> Result<u64, VmError> {
        let limit = self.geometry.virtual_memory_size();
        if address >= limit {
            return Err(VmError::AddressOutOfRange { address, limit });
        }

        let va = VirtualAddress::decompose(&self.geometry, address);
        let mut frame: FrameIndex = 0;

        for level in 0..self.geometry.tables_depth() {
            let slot = self.memory.frame_to_address(frame) + va.index(level);
            let entry = self.memory.read(slot);

            frame = if entry == 0 {
                // The directory being extended must survive this allocation
                let request = FrameRequest { page: va.page, level, forbidden: frame, slot };
                let acquired = acquire_frame(&mut self.memory, &mut self.store, &self.geometry, &request)?;
                self.record(acquired.source);
                acquired.frame
            } else {
                entry as FrameIndex
            };
        }

        let physical = self.memory.frame_to_address(frame) + va.offset;
        trace!("{} -> PA {}", va, physical);
        Ok(physical)
    }

    fn checked_translate(&mut self, address: u64) -> Result<u64, VmError> {
        self.translate(address).inspect_err(|_| self.stats.rejected += 1)
    }

    fn record(&mut self, source: FrameSource) {
        self.stats.faults += 1;
        match source {
            FrameSource::Free => self.stats.free_reuses += 1,
            FrameSource::Unused => self.stats.unused_frames += 1,
            FrameSource::Evicted { .. } => self.stats.evictions += 1,
        }
    }

    /// Every mapped page as `(page, frame)`, in tree order
    pub fn resident_pages(&self) -> Vec<(PageNumber, FrameIndex)> {
        let mut pages = Vec::new();
        self.collect_pages(0, 0, 0, &mut pages);
        pages
    }

    fn collect_pages(&self, frame: FrameIndex, level: u32, path: PageNumber, out: &mut Vec<(PageNumber, FrameIndex)>) {
        let base = self.memory.frame_to_address(frame);
        for index in 0..self.geometry.page_size() {
            let entry = self.memory.read(base + index);
            if entry == 0 {
                continue;
            }
            let path = extend_path(&self.geometry, path, index);
            if level + 1 == self.geometry.tables_depth() {
                out.push((path, entry as FrameIndex));
            } else {
                self.collect_pages(entry as FrameIndex, level + 1, path, out);
            }
        }
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }
}
