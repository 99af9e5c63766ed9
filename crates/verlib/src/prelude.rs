//! Prelude module for convenient imports
//!
//! ```ignore
//! use verlib::prelude::*;
//! ```
//!
//! This brings the catalog, its records, loading and the memory accessor
//! trait into scope.

pub use crate::catalog::SymbolCatalog;
pub use crate::config::{LoadOptions, LoadOptionsBuilder};
pub use crate::error::{Error, Result};
pub use crate::loader::{load_catalog, save_alias, save_catalog};
pub use crate::memory::{PointerWidth, ReadMemory};
pub use crate::record::{
    FieldRecord, FunctionRecord, GlobalRecord, RegistrationRecord, TypeInstanceInfo, TypeRecord,
};
pub use crate::version::FileVersion;
