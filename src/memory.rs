use std::collections::HashMap;

use crate::constants::*;

pub struct PhysicalMemory {
    data: Box<[Word]>,
    page_size: u64,
}

impl PhysicalMemory {
    /// Create a new physical memory initialized to all zeros
    pub fn new(geometry: &Geometry) -> Self {
        let data = vec![0 as Word; geometry.ram_size() as usize].into_boxed_slice();
        PhysicalMemory { data, page_size: geometry.page_size() }
    }

    /// Read a word from physical memory
    #[inline]
    pub fn read(&self, address: u64) -> Word {
        self.data[address as usize]
    }

    /// Write a word to physical memory
    #[inline]
    pub fn write(&mut self, address: u64, value: Word) {
        self.data[address as usize] = value;
    }

    #[inline]
    pub fn frame_to_address(&self, frame: FrameIndex) -> u64 {
        frame * self.page_size
    }

    pub fn frame(&self, frame: FrameIndex) -> &[Word] {
        let start = self.frame_to_address(frame) as usize;
        &self.data[start..start + self.page_size as usize]
    }

    pub fn frame_mut(&mut self, frame: FrameIndex) -> &mut [Word] {
        let start = self.frame_to_address(frame) as usize;
        let end = start + self.page_size as usize;
        &mut self.data[start..end]
    }

    pub fn clear_frame(&mut self, frame: FrameIndex) {
        self.frame_mut(frame).fill(0);
    }

    /// A frame is free exactly when every word in it is zero
    pub fn is_frame_zeroed(&self, frame: FrameIndex) -> bool {
        self.frame(frame).iter().all(|&w| w == 0)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Secondary storage for pages pushed out of the frame pool.
pub trait BackingStore {
    /// Persist the contents of `frame` as the current image of `page`.
    fn evict(&mut self, memory: &PhysicalMemory, frame: FrameIndex, page: PageNumber);

    /// Load the stored image of `page` into `frame`. A page that was never
    /// evicted is loaded as all zeros.
    fn restore(&mut self, memory: &mut PhysicalMemory, frame: FrameIndex, page: PageNumber);

    /// Forget every stored page image.
    fn clear(&mut self);
}

/// Paging disk keyed by page number
#[derive(Debug, Default)]
pub struct Disk {
    pages: HashMap<PageNumber, Box<[Word]>>,
}

impl Disk {
    pub fn new() -> Self {
        Disk { pages: HashMap::new() }
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.pages.contains_key(&page)
    }

    /// Stored image of a page, if it is currently swapped out
    pub fn page(&self, page: PageNumber) -> Option<&[Word]> {
        self.pages.get(&page).map(|p| &p[..])
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl BackingStore for Disk {
    fn evict(&mut self, memory: &PhysicalMemory, frame: FrameIndex, page: PageNumber) {
        self.pages.insert(page, memory.frame(frame).into());
    }

    fn restore(&mut self, memory: &mut PhysicalMemory, frame: FrameIndex, page: PageNumber) {
        match self.pages.remove(&page) {
            Some(image) => memory.frame_mut(frame).copy_from_slice(&image),
            None => memory.clear_frame(frame),
        }
    }

    fn clear(&mut self) {
        self.pages.clear();
    }
}
