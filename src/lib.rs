pub mod allocator;
pub mod constants;
pub mod error;
pub mod io;
pub mod logger;
pub mod memory;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use constants::*;
pub use error::{GeometryError, VmError};
pub use memory::{BackingStore, Disk, PhysicalMemory};
pub use translation::VirtualAddress;
pub use vm_manager::{Stats, VirtualMemory};
