use crate::constants::*;

/// Represents the decomposed components of a virtual address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u64,
    /// Table index per level, level 0 (the root's) first
    pub indices: Vec<u64>,
    pub offset: u64,
    pub page: PageNumber,
}

impl VirtualAddress {
    /// Split a raw address into its table indices and in-page offset
    pub fn decompose(geometry: &Geometry, raw: u64) -> Self {
        let width = geometry.offset_width();
        let depth = geometry.tables_depth();
        let mask = geometry.offset_mask();

        let indices = (0..depth)
            .map(|level| (raw >> ((depth - level) * width)) & mask)
            .collect();

        VirtualAddress {
            raw,
            indices,
            offset: raw & mask,
            page: raw >> width,
        }
    }

    /// Table index used at `level` of the walk
    #[inline]
    pub fn index(&self, level: u32) -> u64 {
        self.indices[level as usize]
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (page={}, indices={:?}, offset={})", self.raw, self.page, self.indices, self.offset)
    }
}

/// Append one table index to a partial page number
#[inline]
pub fn extend_path(geometry: &Geometry, path: PageNumber, index: u64) -> PageNumber {
    (path << geometry.offset_width()) + index
}

/// Rebuild a page number from table indices, level 0 first
pub fn compose_page_number(geometry: &Geometry, indices: &[u64]) -> PageNumber {
    indices.iter().fold(0, |path, &index| extend_path(geometry, path, index))
}

/// Distance between two pages on the cyclic page-number space
pub fn cyclic_distance(geometry: &Geometry, a: PageNumber, b: PageNumber) -> u64 {
    let direct = a.abs_diff(b);
    direct.min(geometry.num_pages() - direct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Geometry {
        Geometry::new(2, 2, 4).unwrap()
    }

    #[test]
    fn test_decomposition_small() {
        // 0b10_01_11: indices (2, 1), offset 3
        let va = VirtualAddress::decompose(&small(), 0b10_01_11);
        assert_eq!(va.indices, vec![2, 1]);
        assert_eq!(va.offset, 3);
        assert_eq!(va.page, 0b10_01);
        assert_eq!(va.index(0), 2);
        assert_eq!(va.index(1), 1);
    }

    #[test]
    fn test_decomposition_default_geometry() {
        // 20-bit address 0xABCDE: four 4-bit indices then a 4-bit offset
        let va = VirtualAddress::decompose(&Geometry::default(), 0xABCDE);
        assert_eq!(va.indices, vec![0xA, 0xB, 0xC, 0xD]);
        assert_eq!(va.offset, 0xE);
        assert_eq!(va.page, 0xABCD);
    }

    #[test]
    fn test_decomposition_edge_cases() {
        let g = small();
        let va = VirtualAddress::decompose(&g, 0);
        assert_eq!(va.indices, vec![0, 0]);
        assert_eq!(va.offset, 0);

        let va = VirtualAddress::decompose(&g, g.virtual_memory_size() - 1);
        assert_eq!(va.indices, vec![3, 3]);
        assert_eq!(va.offset, 3);
        assert_eq!(va.page, g.num_pages() - 1);
    }

    #[test]
    fn test_compose_inverts_decompose() {
        let g = Geometry::default();
        for &raw in &[0u64, 1, 0x12345, 0xABCDE, 0xFFFFF] {
            let va = VirtualAddress::decompose(&g, raw);
            assert_eq!(compose_page_number(&g, &va.indices), va.page, "Failed for VA={}", raw);
        }
    }

    #[test]
    fn test_extend_path() {
        let g = small();
        assert_eq!(extend_path(&g, 0, 3), 3);
        assert_eq!(extend_path(&g, 3, 1), 0b11_01);
    }

    #[test]
    fn test_cyclic_distance() {
        let g = small(); // 16 pages
        assert_eq!(cyclic_distance(&g, 0, 0), 0);
        assert_eq!(cyclic_distance(&g, 0, 1), 1);
        assert_eq!(cyclic_distance(&g, 0, 15), 1);
        assert_eq!(cyclic_distance(&g, 2, 15), 3);
        assert_eq!(cyclic_distance(&g, 0, 8), 8);
        assert_eq!(cyclic_distance(&g, 3, 12), 7);
    }

    #[test]
    fn test_cyclic_distance_properties() {
        let g = small();
        let n = g.num_pages();
        for a in 0..n {
            assert_eq!(cyclic_distance(&g, a, a), 0);
            for b in 0..n {
                let d = cyclic_distance(&g, a, b);
                assert_eq!(d, cyclic_distance(&g, b, a));
                assert!(d <= n / 2);
            }
        }
    }

    #[test]
    fn test_display() {
        let va = VirtualAddress::decompose(&small(), 0b10_01_11);
        let display = format!("{}", va);
        assert!(display.contains("VA(39)"));
        assert!(display.contains("page=9"));
        assert!(display.contains("offset=3"));
    }
}
