//! In-memory version library.
//!
//! A [`SymbolCatalog`] is filled once, either record by record or by the
//! loader, and then only queried. Queries take `&self` and never mutate, so a
//! finished catalog can be shared across threads as-is.
//!
//! Identifier 0 means "unassigned": such records are stored but never
//! indexed, and looking up id 0 always yields nothing.

mod index;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::memory::PointerWidth;
use crate::record::{
    FunctionRecord, GlobalRecord, RecordKind, RegistrationRecord, TypeInstanceInfo, TypeRecord,
};
use crate::version::FileVersion;

use index::{CatalogIndex, search_functions};

/// Version library for one build of the target binary
#[derive(Debug, Clone)]
pub struct SymbolCatalog {
    base_offset: u64,
    pointer_width: PointerWidth,
    pub(crate) library_version: i32,
    pub(crate) file_version: FileVersion,
    pub(crate) resolved_version: Option<FileVersion>,
    library_base_offset: u64,
    hash_version: u64,

    types: Vec<TypeRecord>,
    functions: Vec<FunctionRecord>,
    globals: Vec<GlobalRecord>,
    registrations: Vec<RegistrationRecord>,
    cached_values: Vec<Option<i32>>,

    index: CatalogIndex,
}

impl Default for SymbolCatalog {
    fn default() -> Self {
        Self::new(0, PointerWidth::default())
    }
}

impl SymbolCatalog {
    /// Create an empty catalog for a module loaded at `base_offset`
    pub fn new(base_offset: u64, pointer_width: PointerWidth) -> Self {
        Self {
            base_offset: pointer_width.truncate(base_offset),
            pointer_width,
            library_version: 0,
            file_version: FileVersion::default(),
            resolved_version: None,
            library_base_offset: 0,
            hash_version: 0,
            types: Vec::new(),
            functions: Vec::new(),
            globals: Vec::new(),
            registrations: Vec::new(),
            cached_values: Vec::new(),
            index: CatalogIndex::new(),
        }
    }

    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub fn pointer_width(&self) -> PointerWidth {
        self.pointer_width
    }

    pub fn library_version(&self) -> i32 {
        self.library_version
    }

    /// Build version this catalog was requested for
    pub fn file_version(&self) -> FileVersion {
        self.file_version
    }

    /// Version of the file that was actually decoded when the requested file
    /// was an alias
    pub fn resolved_version(&self) -> Option<FileVersion> {
        self.resolved_version
    }

    pub fn library_base_offset(&self) -> u64 {
        self.library_base_offset
    }

    pub fn hash_version(&self) -> u64 {
        self.hash_version
    }

    pub fn set_versions(&mut self, library_version: i32, file_version: FileVersion) {
        self.library_version = library_version;
        self.file_version = file_version;
    }

    pub fn set_library_base_offset(&mut self, offset: u64) {
        self.library_base_offset = offset;
    }

    pub fn set_hash_version(&mut self, hash_version: u64) {
        self.hash_version = hash_version;
    }

    pub fn types(&self) -> &[TypeRecord] {
        &self.types
    }

    /// Functions, ordered by begin offset once the catalog is sorted
    pub fn functions(&self) -> &[FunctionRecord] {
        &self.functions
    }

    pub fn globals(&self) -> &[GlobalRecord] {
        &self.globals
    }

    pub fn registrations(&self) -> &[RegistrationRecord] {
        &self.registrations
    }

    pub fn cached_values(&self) -> &[Option<i32>] {
        &self.cached_values
    }

    /// Cached value at `index`; `None` for absent slots and out-of-range indices
    pub fn cached_value(&self, index: usize) -> Option<i32> {
        self.cached_values.get(index).copied().flatten()
    }

    /// Owners with type instance lists, ascending
    pub fn type_instances(&self) -> impl Iterator<Item = (u32, &[TypeInstanceInfo])> {
        self.index
            .instances
            .iter()
            .map(|(owner, list)| (*owner, list.as_slice()))
    }

    /// Stored offsets of every function and global, keyed by VID
    pub fn vid_offsets(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.index.vid_offsets.iter().map(|(id, offset)| (*id, *offset))
    }

    /// Stored (module relative) offset of a function or global
    pub fn offset_of(&self, id: u64) -> Option<u64> {
        self.index.vid_offsets.get(&id).copied()
    }

    pub fn add_type(&mut self, record: TypeRecord) -> Result<()> {
        if record.id != 0 && self.index.type_by_id.contains_key(&record.id) {
            return Err(Error::DuplicateIdentifier {
                kind: RecordKind::Type,
                id: record.id,
            });
        }

        let position = self.types.len();
        if record.id != 0 {
            self.index.type_by_id.insert(record.id, position);
        }

        // vtable 0 is a null pointer, never a lookup key
        if let Some(vtable) = record.vtable.filter(|&v| v != 0) {
            match self.index.type_by_vtable.get(&vtable) {
                Some(&existing) => warn!(
                    "Type {} ({}) shares vtable {:#x} with type {}; keeping the first",
                    record.id, record.name, vtable, self.types[existing].id
                ),
                None => {
                    self.index.type_by_vtable.insert(vtable, position);
                }
            }
        }

        self.types.push(record);
        Ok(())
    }

    pub fn add_function(&mut self, record: FunctionRecord) -> Result<()> {
        self.claim_vid(record.id, record.begin, RecordKind::Function)?;

        let position = self.functions.len();
        if record.id != 0 {
            self.index.function_by_id.insert(record.id, position);
        }
        if self
            .functions
            .last()
            .is_some_and(|last| last.begin > record.begin)
        {
            self.index.functions_sorted = false;
        }

        self.functions.push(record);
        Ok(())
    }

    pub fn add_global(&mut self, record: GlobalRecord) -> Result<()> {
        self.claim_vid(record.id, record.begin, RecordKind::Global)?;

        if record.id != 0 {
            self.index.global_by_id.insert(record.id, self.globals.len());
        }
        self.globals.push(record);
        Ok(())
    }

    /// Functions and globals share one id namespace
    fn claim_vid(&mut self, id: u64, offset: u64, kind: RecordKind) -> Result<()> {
        if id == 0 {
            return Ok(());
        }
        if self.index.vid_offsets.contains_key(&id) {
            return Err(Error::DuplicateIdentifier { kind, id });
        }
        self.index.vid_offsets.insert(id, offset);
        Ok(())
    }

    pub fn add_registration(&mut self, record: RegistrationRecord) {
        self.registrations.push(record);
    }

    /// Register the instance list of `owner`.
    ///
    /// Type references are resolved against the types added so far; unknown
    /// type ids become `None`. Owner 0 is ignored.
    pub fn add_type_instance_infos(
        &mut self,
        owner: u32,
        mut list: Vec<TypeInstanceInfo>,
    ) -> Result<()> {
        if owner == 0 {
            debug!("Ignoring {} type instances of unassigned owner", list.len());
            return Ok(());
        }
        if self.index.instances.contains_key(&owner) {
            return Err(Error::DuplicateIdentifier {
                kind: RecordKind::TypeInstanceList,
                id: u64::from(owner),
            });
        }

        for info in &mut list {
            if let Some(type_id) = info.type_id
                && !self.index.type_by_id.contains_key(&type_id)
            {
                warn!(
                    "Type instance of owner {} references unknown type {}",
                    owner, type_id
                );
                info.type_id = None;
            }
        }

        self.index.instances.insert(owner, list);
        Ok(())
    }

    pub fn set_cached_values(&mut self, values: Vec<Option<i32>>) {
        self.cached_values = values;
    }

    /// Order functions by begin offset so address lookups can binary search.
    ///
    /// The loader calls this once after decoding. Sorting is stable.
    pub fn sort_functions(&mut self) {
        if self.index.functions_sorted {
            return;
        }
        self.functions.sort_by_key(|f| f.begin);
        self.index.reindex_functions(&self.functions);
    }

    pub fn get_function_info(&self, id: u64) -> Option<&FunctionRecord> {
        self.index
            .function_by_id
            .get(&id)
            .map(|&position| &self.functions[position])
    }

    pub fn get_global_info(&self, id: u64) -> Option<&GlobalRecord> {
        self.index
            .global_by_id
            .get(&id)
            .map(|&position| &self.globals[position])
    }

    pub fn get_type_info(&self, id: u64) -> Option<&TypeRecord> {
        self.index
            .type_by_id
            .get(&id)
            .map(|&position| &self.types[position])
    }

    /// Type whose vtable lives at the module relative `offset`
    pub fn get_type_info_by_vtable(&self, offset: u64) -> Option<&TypeRecord> {
        self.index
            .type_by_vtable
            .get(&offset)
            .map(|&position| &self.types[position])
    }

    /// Type whose vtable lives at `address`; a runtime address when
    /// `with_base_offset` is set
    pub fn get_type_info_by_vtable_address(
        &self,
        address: u64,
        with_base_offset: bool,
    ) -> Option<&TypeRecord> {
        self.get_type_info_by_vtable(self.relative(address, with_base_offset))
    }

    pub fn get_type_instance_infos(&self, owner: u32) -> &[TypeInstanceInfo] {
        self.index
            .instances
            .get(&owner)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Function whose `[begin, end)` range contains `address`
    pub fn get_function_info_by_address(
        &self,
        address: u64,
        with_base_offset: bool,
    ) -> Option<&FunctionRecord> {
        let offset = self.relative(address, with_base_offset);
        if self.index.functions_sorted {
            search_functions(&self.functions, offset).map(|position| &self.functions[position])
        } else {
            self.functions.iter().find(|f| f.contains(offset))
        }
    }

    fn relative(&self, address: u64, with_base_offset: bool) -> u64 {
        let address = self.pointer_width.truncate(address);
        if with_base_offset {
            self.pointer_width
                .truncate(address.wrapping_sub(self.base_offset))
        } else {
            address
        }
    }

    /// Drop every record and index, keeping the base offset and pointer width
    pub fn clear(&mut self) {
        *self = Self::new(self.base_offset, self.pointer_width);
    }
}
