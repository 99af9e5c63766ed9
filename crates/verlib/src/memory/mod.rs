//! Access to the memory of the running target.
//!
//! The library never touches process memory itself. Callers hand in a
//! [`ReadMemory`] implementation; address resolution only reads pointers and
//! compares byte patterns through it.

mod pattern;

#[cfg(test)]
pub mod mock;

use byteorder::{ByteOrder, LE};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::{Error, Result};

pub use pattern::{parse_pattern, pattern_matches};

#[cfg(test)]
pub use mock::MockMemory;

/// Pointer width of the target process
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, IntoStaticStr, Display,
)]
pub enum PointerWidth {
    #[strum(serialize = "32-bit")]
    Bits32,
    #[default]
    #[strum(serialize = "64-bit")]
    Bits64,
}

impl PointerWidth {
    /// Size of a pointer in bytes
    pub fn size(&self) -> usize {
        match self {
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }

    /// Truncate an address to what fits in a pointer of this width
    pub fn truncate(&self, address: u64) -> u64 {
        match self {
            Self::Bits32 => address & u64::from(u32::MAX),
            Self::Bits64 => address,
        }
    }

    /// Add a signed displacement, wrapping the way pointer arithmetic does
    pub fn offset(&self, address: u64, delta: i64) -> u64 {
        self.truncate(address.wrapping_add_signed(delta))
    }
}

/// Decode a little-endian pointer value read from target memory
pub fn decode_pointer(bytes: &[u8], width: PointerWidth, address: u64) -> Result<u64> {
    if bytes.len() < width.size() {
        return Err(Error::MemoryReadFailed {
            address,
            message: format!("short read: {} of {} bytes", bytes.len(), width.size()),
        });
    }

    Ok(match width {
        PointerWidth::Bits32 => u64::from(LE::read_u32(bytes)),
        PointerWidth::Bits64 => LE::read_u64(bytes),
    })
}

/// Memory accessor for the live target
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    /// Read a pointer-sized value at `address`
    fn read_pointer(&self, address: u64, width: PointerWidth) -> Result<u64> {
        let bytes = self.read_bytes(address, width.size())?;
        decode_pointer(&bytes, width, address)
    }

    /// Check the bytes at `address` against a pattern such as `"48 8B ?? 05"`
    fn verify_pattern(&self, address: u64, pattern: &str) -> Result<bool> {
        let expected = parse_pattern(pattern)?;
        let actual = self.read_bytes(address, expected.len())?;
        Ok(pattern_matches(&actual, &expected))
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }

    fn read_pointer(&self, address: u64, width: PointerWidth) -> Result<u64> {
        (**self).read_pointer(address, width)
    }

    fn verify_pattern(&self, address: u64, pattern: &str) -> Result<bool> {
        (**self).verify_pattern(address, pattern)
    }
}
