//! In-memory accessor for tests.

use std::cell::Cell;
use std::collections::BTreeMap;

use super::{PointerWidth, ReadMemory, decode_pointer, parse_pattern, pattern_matches};
use crate::error::{Error, Result};

/// Sparse fake address space that counts the reads made through it
#[derive(Debug, Default)]
pub struct MockMemory {
    regions: BTreeMap<u64, Vec<u8>>,
    pointer_reads: Cell<usize>,
    pattern_checks: Cell<usize>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, address: u64, bytes: &[u8]) -> Self {
        self.regions.insert(address, bytes.to_vec());
        self
    }

    pub fn with_pointer(self, address: u64, value: u64, width: PointerWidth) -> Self {
        let bytes = value.to_le_bytes();
        self.with_bytes(address, &bytes[..width.size()])
    }

    pub fn pointer_reads(&self) -> usize {
        self.pointer_reads.get()
    }

    pub fn pattern_checks(&self) -> usize {
        self.pattern_checks.get()
    }
}

impl ReadMemory for MockMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let (start, bytes) = self
            .regions
            .range(..=address)
            .next_back()
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: "unmapped".to_string(),
            })?;

        let from = (address - start) as usize;
        let to = from + size;
        bytes
            .get(from..to)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::MemoryReadFailed {
                address,
                message: format!("read of {} bytes crosses end of region at {:#x}", size, start),
            })
    }

    fn read_pointer(&self, address: u64, width: PointerWidth) -> Result<u64> {
        self.pointer_reads.set(self.pointer_reads.get() + 1);
        let bytes = self.read_bytes(address, width.size())?;
        decode_pointer(&bytes, width, address)
    }

    fn verify_pattern(&self, address: u64, pattern: &str) -> Result<bool> {
        self.pattern_checks.set(self.pattern_checks.get() + 1);
        let expected = parse_pattern(pattern)?;
        let actual = self.read_bytes(address, expected.len())?;
        Ok(pattern_matches(&actual, &expected))
    }
}
