// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

#[derive(Debug, Clone)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
}

impl ProgramImage {
    pub fn new(entry_point: u64) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }
}

/// Flat byte-addressed storage backing one bus region.
///
/// Addresses come straight from untrusted ELF headers and from the running
/// payload, so every translation is overflow-safe: out-of-range and
/// address-space-wrapping accesses are refused, never panicked on.
pub struct LinearMemory {
    pub data: Vec<u8>,
    pub base_addr: u64,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u64) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    /// Translate a bus address into a storage index.
    fn offset_of(&self, addr: u64) -> Option<usize> {
        let offset = addr.checked_sub(self.base_addr)?;
        (offset < self.data.len() as u64).then_some(offset as usize)
    }

    pub fn read_u8(&self, addr: u64) -> Option<u8> {
        self.offset_of(addr).map(|i| self.data[i])
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> bool {
        match self.offset_of(addr) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// All-or-nothing slice store: returns false without touching memory
    /// when any byte of the range falls outside the region, including
    /// ranges that wrap the end of the address space.
    pub fn write_bytes(&mut self, addr: u64, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return true;
        }
        let Some(start) = self.offset_of(addr) else {
            return false;
        };
        let Some(end) = start.checked_add(bytes.len()) else {
            return false;
        };
        if end > self.data.len() {
            return false;
        }
        self.data[start..end].copy_from_slice(bytes);
        true
    }

    pub fn load_from_segment(&mut self, segment: &Segment) -> bool {
        self.write_bytes(segment.start_addr, &segment.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_respects_bounds() {
        let mut mem = LinearMemory::new(1024, 0x8000_0000);

        assert!(mem.write_u8(0x8000_0000, 42));
        assert!(mem.write_u8(0x8000_03FF, 99)); // Last byte

        assert!(!mem.write_u8(0x7FFF_FFFF, 1));
        assert!(!mem.write_u8(0x8000_0400, 1));

        assert_eq!(mem.read_u8(0x8000_0000), Some(42));
        assert_eq!(mem.read_u8(0x8000_03FF), Some(99));
        assert_eq!(mem.read_u8(0x7FFF_FFFF), None);
        assert_eq!(mem.read_u8(0x8000_0400), None);
    }

    #[test]
    fn segment_load_rejects_overlap_past_end() {
        let mut mem = LinearMemory::new(1024, 0x8000_0000);

        let fits = Segment {
            start_addr: 0x8000_0000,
            data: vec![1, 2, 3],
        };
        assert!(mem.load_from_segment(&fits));
        assert_eq!(mem.read_u8(0x8000_0000), Some(1));

        let straddles = Segment {
            start_addr: 0x8000_03FE,
            data: vec![10, 20, 30], // last byte lands past the end
        };
        assert!(!mem.load_from_segment(&straddles));
        assert_eq!(mem.read_u8(0x8000_03FF), Some(0)); // untouched

        let exact = Segment {
            start_addr: 0x8000_03FE,
            data: vec![0xAA, 0xBB],
        };
        assert!(mem.load_from_segment(&exact));
        assert_eq!(mem.read_u8(0x8000_03FE), Some(0xAA));
        assert_eq!(mem.read_u8(0x8000_03FF), Some(0xBB));
    }

    #[test]
    fn segment_wrapping_the_address_space_is_rejected() {
        let mut mem = LinearMemory::new(4096, 0x8000_0000);

        // start + len wraps past u64::MAX; must refuse, not wrap and store.
        let wraps = Segment {
            start_addr: u64::MAX - 2,
            data: vec![1, 2, 3, 4],
        };
        assert!(!mem.load_from_segment(&wraps));

        // Entirely below the base.
        let below = Segment {
            start_addr: 0,
            data: vec![1],
        };
        assert!(!mem.load_from_segment(&below));
    }
}
