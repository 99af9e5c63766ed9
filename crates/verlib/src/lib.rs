//! # verlib
//!
//! Version independent symbol database for patching a native binary across
//! its released builds.
//!
//! This crate provides:
//! - A compact binary codec for type, function, global and registration records
//! - The in-memory catalog with lookups by id, address range and vtable offset
//! - Loading of gzip library files, including alias files that redirect to
//!   another build
//! - Address resolution with pointer indirection and byte pattern checks

pub mod catalog;
pub mod codec;
pub mod config;
pub mod dump;
pub mod error;
pub mod fs;
pub mod loader;
pub mod memory;
pub mod prelude;
pub mod record;
mod resolve;
pub mod version;

pub use catalog::SymbolCatalog;
pub use config::{LoadOptions, LoadOptionsBuilder};
pub use dump::{CatalogSummary, dump_vids};
pub use error::{Error, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use loader::{
    AliasHeader, DecodedLibrary, decode_catalog, encode_catalog, load_catalog, load_catalog_with,
    save_alias, save_alias_with, save_catalog, save_catalog_with,
};
pub use memory::{PointerWidth, ReadMemory};
pub use record::{
    FieldRecord, FunctionRecord, GlobalRecord, RecordKind, RegistrationRecord, TypeInstanceInfo,
    TypeRecord,
};
pub use version::FileVersion;
