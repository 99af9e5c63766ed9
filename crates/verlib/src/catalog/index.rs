//! Lookup structures derived from the catalog's record lists.
//!
//! Indices hold positions into the owning record vectors. They are filled
//! while records are appended and rebuilt when the function list is sorted.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::record::{FunctionRecord, TypeInstanceInfo};

#[derive(Debug, Clone, Default)]
pub(crate) struct CatalogIndex {
    /// VID -> stored offset, shared by functions and globals
    pub vid_offsets: HashMap<u64, u64>,
    pub function_by_id: HashMap<u64, usize>,
    pub global_by_id: HashMap<u64, usize>,
    pub type_by_id: HashMap<u64, usize>,
    /// First registration wins
    pub type_by_vtable: HashMap<u64, usize>,
    pub instances: BTreeMap<u32, Vec<TypeInstanceInfo>>,
    /// Whether the function list is ordered by begin offset
    pub functions_sorted: bool,
}

impl CatalogIndex {
    pub fn new() -> Self {
        Self {
            functions_sorted: true,
            ..Default::default()
        }
    }

    /// Re-point the function id index after the function list was reordered
    pub fn reindex_functions(&mut self, functions: &[FunctionRecord]) {
        self.function_by_id.clear();
        for (position, function) in functions.iter().enumerate() {
            if function.id != 0 {
                self.function_by_id.insert(function.id, position);
            }
        }
        self.functions_sorted = true;
    }
}

/// Find the function whose `[begin, end)` range contains `offset`.
///
/// `functions` must be sorted by begin offset. Overlapping ranges give an
/// unspecified one of the candidates.
pub(crate) fn search_functions(functions: &[FunctionRecord], offset: u64) -> Option<usize> {
    functions
        .binary_search_by(|f| {
            if offset < f.begin {
                Ordering::Greater
            } else if offset >= f.end {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        })
        .ok()
}
