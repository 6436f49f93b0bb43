//! Error types for the virtual memory front-end and geometry validation.

use std::fmt;

/// Errors returned by [`VirtualMemory`](crate::vm_manager::VirtualMemory) operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmError {
    /// The virtual address is not below `VIRTUAL_MEMORY_SIZE`
    AddressOutOfRange { address: u64, limit: u64 },
    /// The frame pool is full and holds no resident page to evict.
    /// Unreachable for a validated geometry.
    NoEvictableFrame { page: u64 },
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::AddressOutOfRange { address, limit } => {
                write!(f, "virtual address {} out of range (limit {})", address, limit)
            }
            VmError::NoEvictableFrame { page } => {
                write!(f, "no frame available to map page {}", page)
            }
        }
    }
}

impl std::error::Error for VmError {}

/// Reasons a [`Geometry`](crate::constants::Geometry) is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    ZeroOffsetWidth,
    ZeroDepth,
    /// The virtual address would not fit in 63 bits
    AddressTooWide { bits: u32 },
    /// Not enough frames for a root and one full path
    TooFewFrames { frames: u64, required: u64 },
    /// Frame indices would not fit in a directory word
    FrameIndexOverflow { frames: u64 },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::ZeroOffsetWidth => write!(f, "offset width must be at least 1"),
            GeometryError::ZeroDepth => write!(f, "tables depth must be at least 1"),
            GeometryError::AddressTooWide { bits } => {
                write!(f, "virtual addresses of {} bits are not supported (max 63)", bits)
            }
            GeometryError::TooFewFrames { frames, required } => {
                write!(f, "{} frames cannot hold a full translation path ({} required)", frames, required)
            }
            GeometryError::FrameIndexOverflow { frames } => {
                write!(f, "{} frames cannot be indexed by a memory word", frames)
            }
        }
    }
}

impl std::error::Error for GeometryError {}
