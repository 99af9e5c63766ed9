//! Diagnostic exports of a loaded catalog.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::catalog::SymbolCatalog;
use crate::error::Result;
use crate::memory::PointerWidth;
use crate::version::FileVersion;

/// Write one `<id>\t0x<offset>` line per function and global VID, ordered by
/// id. Returns the number of lines written.
pub fn dump_vids<W: Write>(catalog: &SymbolCatalog, writer: &mut W) -> Result<usize> {
    let mut vids: Vec<(u64, u64)> = catalog.vid_offsets().collect();
    vids.sort_unstable();

    for (id, offset) in &vids {
        writeln!(writer, "{}\t0x{:X}", id, offset)?;
    }
    writer.flush()?;
    Ok(vids.len())
}

/// Overview of a catalog's contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSummary {
    pub library_version: i32,
    pub file_version: FileVersion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_version: Option<FileVersion>,
    pub library_base_offset: u64,
    pub hash_version: u64,
    pub pointer_width: PointerWidth,
    pub types: usize,
    pub fields: usize,
    pub functions: usize,
    pub globals: usize,
    pub registrations: usize,
    pub type_instance_owners: usize,
    pub type_instances: usize,
    pub cached_values: usize,
    pub cached_values_present: usize,
}

impl From<&SymbolCatalog> for CatalogSummary {
    fn from(catalog: &SymbolCatalog) -> Self {
        let (owners, instances) = catalog
            .type_instances()
            .fold((0, 0), |(owners, instances), (_, list)| {
                (owners + 1, instances + list.len())
            });

        Self {
            library_version: catalog.library_version(),
            file_version: catalog.file_version(),
            resolved_version: catalog.resolved_version(),
            library_base_offset: catalog.library_base_offset(),
            hash_version: catalog.hash_version(),
            pointer_width: catalog.pointer_width(),
            types: catalog.types().len(),
            fields: catalog
                .types()
                .iter()
                .filter_map(|t| t.fields.as_ref())
                .map(Vec::len)
                .sum(),
            functions: catalog.functions().len(),
            globals: catalog.globals().len(),
            registrations: catalog.registrations().len(),
            type_instance_owners: owners,
            type_instances: instances,
            cached_values: catalog.cached_values().len(),
            cached_values_present: catalog.cached_values().iter().flatten().count(),
        }
    }
}

impl CatalogSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
