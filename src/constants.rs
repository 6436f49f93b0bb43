use serde::Deserialize;

use crate::error::GeometryError;

/// A word of physical memory. Directory entries store frame indices in words.
pub type Word = i32;

pub type FrameIndex = u64;
pub type PageNumber = u64;

pub const OFFSET_WIDTH: u32 = 4;
pub const TABLES_DEPTH: u32 = 4;
pub const NUM_FRAMES: u64 = 64;

pub const PAGE_SIZE: u64 = 1 << OFFSET_WIDTH;
pub const NUM_PAGES: u64 = 1 << (TABLES_DEPTH * OFFSET_WIDTH);
pub const VIRTUAL_MEMORY_SIZE: u64 = NUM_PAGES * PAGE_SIZE;
pub const RAM_SIZE: u64 = NUM_FRAMES * PAGE_SIZE;

/// Shape of the page-table tree and the frame pool behind it.
///
/// A virtual address is `tables_depth` table indices of `offset_width` bits
/// each, followed by an `offset_width`-bit offset into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawGeometry")]
pub struct Geometry {
    offset_width: u32,
    tables_depth: u32,
    num_frames: u64,
}

#[derive(Deserialize)]
struct RawGeometry {
    offset_width: u32,
    tables_depth: u32,
    num_frames: u64,
}

impl TryFrom<RawGeometry> for Geometry {
    type Error = GeometryError;

    fn try_from(raw: RawGeometry) -> Result<Self, Self::Error> {
        Geometry::new(raw.offset_width, raw.tables_depth, raw.num_frames)
    }
}

impl Geometry {
    pub fn new(offset_width: u32, tables_depth: u32, num_frames: u64) -> Result<Self, GeometryError> {
        if offset_width == 0 {
            return Err(GeometryError::ZeroOffsetWidth);
        }
        if tables_depth == 0 {
            return Err(GeometryError::ZeroDepth);
        }
        let bits = (tables_depth + 1).saturating_mul(offset_width);
        if bits > 63 {
            return Err(GeometryError::AddressTooWide { bits });
        }
        let required = u64::from(tables_depth) + 1;
        if num_frames < required {
            return Err(GeometryError::TooFewFrames { frames: num_frames, required });
        }
        // Directory entries hold frame indices, and the whole pool must be addressable
        let ram_words = num_frames
            .checked_mul(1 << offset_width)
            .and_then(|words| usize::try_from(words).ok());
        if Word::try_from(num_frames).is_err() || ram_words.is_none() {
            return Err(GeometryError::FrameIndexOverflow { frames: num_frames });
        }

        Ok(Geometry { offset_width, tables_depth, num_frames })
    }

    #[inline]
    pub fn offset_width(&self) -> u32 {
        self.offset_width
    }

    #[inline]
    pub fn tables_depth(&self) -> u32 {
        self.tables_depth
    }

    #[inline]
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// Words per frame (and per page)
    #[inline]
    pub fn page_size(&self) -> u64 {
        1 << self.offset_width
    }

    #[inline]
    pub fn offset_mask(&self) -> u64 {
        self.page_size() - 1
    }

    #[inline]
    pub fn num_pages(&self) -> u64 {
        1 << (self.tables_depth * self.offset_width)
    }

    #[inline]
    pub fn virtual_memory_size(&self) -> u64 {
        self.num_pages() * self.page_size()
    }

    #[inline]
    pub fn ram_size(&self) -> u64 {
        self.num_frames * self.page_size()
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            offset_width: OFFSET_WIDTH,
            tables_depth: TABLES_DEPTH,
            num_frames: NUM_FRAMES,
        }
    }
}
