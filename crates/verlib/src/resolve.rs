//! Address resolution against a live target.

use tracing::debug;

use crate::catalog::SymbolCatalog;
use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Strip one `[...]` layer, if present
fn strip_indirection(pattern: &str) -> Option<&str> {
    pattern
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
}

impl SymbolCatalog {
    /// Runtime address of a function or global: module base plus stored
    /// offset plus `extra_offset`
    pub fn resolve_offset(&self, id: u64, extra_offset: i64) -> Result<u64> {
        let stored = self.offset_of(id).ok_or(Error::NotFound { id })?;
        let width = self.pointer_width();
        let target = width.truncate(self.base_offset().wrapping_add(stored));
        Ok(width.offset(target, extra_offset))
    }

    /// Resolve `id` to a runtime address, optionally verifying a byte pattern.
    ///
    /// Each `[...]` layer around `pattern` dereferences a pointer, starting at
    /// the computed address, before the bare pattern is compared at the final
    /// address plus `pattern_offset`. The returned address is the one computed
    /// before any dereference.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `id` is not in the library
    /// - [`Error::PointerDereferenceFailure`] if a pointer read fails
    /// - [`Error::VersionMismatch`] if the pattern does not match
    pub fn get_address_of<M: ReadMemory + ?Sized>(
        &self,
        memory: &M,
        id: u64,
        extra_offset: i64,
        pattern_offset: i64,
        pattern: Option<&str>,
    ) -> Result<u64> {
        let target = self.resolve_offset(id, extra_offset)?;

        let Some(mut pattern) = pattern else {
            return Ok(target);
        };

        let width = self.pointer_width();
        let mut current = target;
        while let Some(inner) = strip_indirection(pattern) {
            let next = memory.read_pointer(current, width).map_err(|e| {
                Error::PointerDereferenceFailure {
                    id,
                    address: current,
                    message: e.to_string(),
                }
            })?;
            debug!("VID {}: {:#x} -> {:#x}", id, current, next);
            current = width.truncate(next);
            pattern = inner;
        }

        if pattern.trim().is_empty() {
            return Ok(target);
        }

        let check_at = width.offset(current, pattern_offset);
        if !memory.verify_pattern(check_at, pattern)? {
            debug!("VID {}: pattern '{}' mismatch at {:#x}", id, pattern, check_at);
            return Err(Error::VersionMismatch { id });
        }

        Ok(target)
    }

    /// Same as [`get_address_of`](Self::get_address_of), with every failure
    /// mapped to `None`
    pub fn try_get_address_of<M: ReadMemory + ?Sized>(
        &self,
        memory: &M,
        id: u64,
        extra_offset: i64,
        pattern_offset: i64,
        pattern: Option<&str>,
    ) -> Option<u64> {
        self.get_address_of(memory, id, extra_offset, pattern_offset, pattern)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemory, PointerWidth};
    use crate::record::{FunctionRecord, GlobalRecord};

    const BASE: u64 = 0x1_4000_0000;

    fn catalog(width: PointerWidth, base: u64) -> SymbolCatalog {
        let mut catalog = SymbolCatalog::new(base, width);
        catalog
            .add_function(FunctionRecord::new(10, 0x1000, 0x1100))
            .unwrap();
        catalog
            .add_global(GlobalRecord {
                id: 20,
                begin: 0x8000,
                ..Default::default()
            })
            .unwrap();
        catalog
    }

    #[test]
    fn test_address_without_pattern() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let memory = MockMemory::new();
        assert_eq!(
            catalog.get_address_of(&memory, 10, 0, 0, None).unwrap(),
            BASE + 0x1000
        );
        assert_eq!(
            catalog.get_address_of(&memory, 20, -0x10, 0, None).unwrap(),
            BASE + 0x7FF0
        );
        assert_eq!(memory.pointer_reads(), 0);
        assert_eq!(memory.pattern_checks(), 0);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let err = catalog
            .get_address_of(&MockMemory::new(), 99, 0, 0, None)
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(catalog.resolve_offset(0, 0).is_err());
    }

    #[test]
    fn test_pattern_checked_at_pattern_offset() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let memory = MockMemory::new().with_bytes(BASE + 0x1004, &[0x48, 0x8B, 0x05]);

        assert_eq!(
            catalog
                .get_address_of(&memory, 10, 0, 4, Some("48 8B ??"))
                .unwrap(),
            BASE + 0x1000
        );

        let err = catalog
            .get_address_of(&memory, 10, 0, 4, Some("48 8C"))
            .unwrap_err();
        assert!(err.is_version_mismatch());
    }

    #[test]
    fn test_double_indirection() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let first = 0x2_0000_0000u64;
        let second = 0x3_0000_0000u64;
        let memory = MockMemory::new()
            .with_pointer(BASE + 0x8000, first, PointerWidth::Bits64)
            .with_pointer(first, second, PointerWidth::Bits64)
            .with_bytes(second, &[0xAB]);

        let address = catalog
            .get_address_of(&memory, 20, 0, 0, Some("[[AB]]"))
            .unwrap();

        assert_eq!(address, BASE + 0x8000);
        assert_eq!(memory.pointer_reads(), 2);
        assert_eq!(memory.pattern_checks(), 1);
    }

    #[test]
    fn test_failed_dereference() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let memory = MockMemory::new();
        let err = catalog
            .get_address_of(&memory, 20, 0, 0, Some("[AB]"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PointerDereferenceFailure { id: 20, address, .. } if address == BASE + 0x8000
        ));
        assert_eq!(memory.pattern_checks(), 0);
    }

    #[test]
    fn test_bare_indirection_skips_verification() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let memory = MockMemory::new().with_pointer(BASE + 0x8000, 0x1234, PointerWidth::Bits64);
        assert!(catalog.get_address_of(&memory, 20, 0, 0, Some("[]")).is_ok());
        assert_eq!(memory.pointer_reads(), 1);
        assert_eq!(memory.pattern_checks(), 0);
    }

    #[test]
    fn test_32bit_addresses_truncate() {
        let catalog = catalog(PointerWidth::Bits32, 0xFFFF_F000);
        let memory = MockMemory::new()
            .with_pointer(0x7000, 0x0040_0000, PointerWidth::Bits32)
            .with_bytes(0x0040_0010, &[0x90, 0xC3]);

        // 0xFFFF_F000 + 0x8000 wraps to 0x7000
        assert_eq!(catalog.resolve_offset(20, 0).unwrap(), 0x7000);
        assert_eq!(
            catalog
                .get_address_of(&memory, 20, 0, 0x10, Some("[90 C3]"))
                .unwrap(),
            0x7000
        );
    }

    #[test]
    fn test_try_never_errors() {
        let catalog = catalog(PointerWidth::Bits64, BASE);
        let memory = MockMemory::new()
            .with_pointer(BASE + 0x8000, 0x5000, PointerWidth::Bits64)
            .with_bytes(BASE + 0x1000, &[0x11, 0x22]);

        let cases: [(u64, Option<&str>); 6] = [
            (99, None),
            (99, Some("11")),
            (20, Some("[[11]]")),
            (20, Some("[11]")),
            (10, Some("33")),
            (10, Some("not a pattern")),
        ];
        for (id, pattern) in cases {
            assert_eq!(
                catalog.try_get_address_of(&memory, id, 0, 0, pattern),
                None,
                "id {} pattern {:?}",
                id,
                pattern
            );
        }

        assert_eq!(
            catalog.try_get_address_of(&memory, 10, 0, 0, Some("11 22")),
            Some(BASE + 0x1000)
        );
    }
}
