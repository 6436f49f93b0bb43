//! Frame acquisition for missing page-table entries.
//!
//! A missing entry is filled by one of three sources, in priority order:
//! an empty directory frame found in the tree, the lowest never-used frame
//! index, or the resident page furthest (cyclically) from the faulting page.
//! All three are discovered by a single depth-first walk from the root.

use log::{debug, trace};

use crate::constants::*;
use crate::error::VmError;
use crate::memory::{BackingStore, PhysicalMemory};
use crate::translation::{cyclic_distance, extend_path};

/// A request to fill the empty directory entry at `slot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest {
    /// Page being translated
    pub page: PageNumber,
    /// Level of the directory that holds `slot`
    pub level: u32,
    /// Frame that must not be reclaimed while serving this request
    pub forbidden: FrameIndex,
    /// Physical address of the entry to fill (currently 0)
    pub slot: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    /// An empty directory unlinked from its parent
    Free,
    /// A frame index no table has referenced yet
    Unused,
    /// A leaf frame whose page was written to the backing store
    Evicted { page: PageNumber },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub frame: FrameIndex,
    pub source: FrameSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Victim {
    distance: u64,
    page: PageNumber,
    parent_slot: u64,
    frame: FrameIndex,
}

/// Everything the three-tier policy needs, gathered in one tree walk
#[derive(Debug)]
struct FrameSearch {
    page: PageNumber,
    forbidden: FrameIndex,
    free: Option<(FrameIndex, u64)>,
    max_frame: FrameIndex,
    victim: Option<Victim>,
}

impl FrameSearch {
    fn run(memory: &PhysicalMemory, geometry: &Geometry, page: PageNumber, forbidden: FrameIndex) -> Self {
        let mut search = FrameSearch {
            page,
            forbidden,
            free: None,
            max_frame: 0,
            victim: None,
        };
        search.visit(memory, geometry, 0, 0, 0, None);
        search
    }

    /// Walk the directory `frame` at `level`. Returns true once a free
    /// directory has been found, which ends the whole search.
    fn visit(
        &mut self,
        memory: &PhysicalMemory,
        geometry: &Geometry,
        frame: FrameIndex,
        level: u32,
        path: PageNumber,
        parent_slot: Option<u64>,
    ) -> bool {
        let base = memory.frame_to_address(frame);
        let mut empty = true;

        for index in 0..geometry.page_size() {
            let entry = memory.read(base + index);
            if entry == 0 {
                continue;
            }
            empty = false;

            let child = entry as FrameIndex;
            self.max_frame = self.max_frame.max(child);
            let child_path = extend_path(geometry, path, index);

            if level + 1 == geometry.tables_depth() {
                self.consider_victim(geometry, child_path, base + index, child);
            } else if self.visit(memory, geometry, child, level + 1, child_path, Some(base + index)) {
                return true;
            }
        }

        // The root has no parent slot and is never reclaimed
        match parent_slot {
            Some(slot) if empty && frame != self.forbidden => {
                self.free = Some((frame, slot));
                true
            }
            _ => false,
        }
    }

    fn consider_victim(&mut self, geometry: &Geometry, page: PageNumber, parent_slot: u64, frame: FrameIndex) {
        let distance = cyclic_distance(geometry, self.page, page);
        // Strictly greater: the first maximum seen wins
        if self.victim.is_none_or(|v| distance > v.distance) {
            self.victim = Some(Victim { distance, page, parent_slot, frame });
        }
    }
}

/// Obtain a frame for `request.slot`, link it in, and prepare its content:
/// a leaf is restored from `store`, a directory is zeroed.
pub fn acquire_frame<S: BackingStore>(
    memory: &mut PhysicalMemory,
    store: &mut S,
    geometry: &Geometry,
    request: &FrameRequest,
) -> Result<Acquired, VmError> {
    let search = FrameSearch::run(memory, geometry, request.page, request.forbidden);

    let acquired = if let Some((frame, parent_slot)) = search.free {
        trace!("reusing empty directory frame {} for page {}", frame, request.page);
        memory.write(parent_slot, 0);
        Acquired { frame, source: FrameSource::Free }
    } else if search.max_frame + 1 < geometry.num_frames() {
        let frame = search.max_frame + 1;
        trace!("taking unused frame {} for page {}", frame, request.page);
        Acquired { frame, source: FrameSource::Unused }
    } else {
        let victim = search.victim.ok_or(VmError::NoEvictableFrame { page: request.page })?;
        debug!(
            "evicting page {} from frame {} (distance {} from page {})",
            victim.page, victim.frame, victim.distance, request.page
        );
        store.evict(memory, victim.frame, victim.page);
        memory.write(victim.parent_slot, 0);
        Acquired {
            frame: victim.frame,
            source: FrameSource::Evicted { page: victim.page },
        }
    };

    memory.write(request.slot, acquired.frame as Word);
    if request.level + 1 == geometry.tables_depth() {
        store.restore(memory, acquired.frame, request.page);
    } else {
        memory.clear_frame(acquired.frame);
    }

    Ok(acquired)
}
