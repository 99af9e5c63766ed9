//! Records stored in a version library.
//!
//! Offsets are relative to the module base of the target binary. All records
//! are plain values; the catalog owns them and hands out shared references.

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Kind of record, used for diagnostics and error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr, Display)]
pub enum RecordKind {
    #[strum(serialize = "type")]
    Type,
    #[strum(serialize = "field")]
    Field,
    #[strum(serialize = "global")]
    Global,
    #[strum(serialize = "function")]
    Function,
    #[strum(serialize = "registration")]
    Registration,
    #[strum(serialize = "type instance list")]
    TypeInstanceList,
    #[strum(serialize = "cached value")]
    CachedValue,
}

/// Debug info for a type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    /// Unique id of the type. Separate namespace from function/global ids.
    pub id: u64,
    /// Offset of the virtual function table, if the type has one
    pub vtable: Option<u64>,
    /// Name to display
    pub name: String,
    /// Size of the complete type, if known
    pub size: Option<i32>,
    /// Known fields, if any
    pub fields: Option<Vec<FieldRecord>>,
}

impl TypeRecord {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_vtable(mut self, vtable: u64) -> Self {
        self.vtable = Some(vtable);
        self
    }

    pub fn with_size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_fields(mut self, fields: Vec<FieldRecord>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Find a field by its per-type field id
    pub fn field(&self, field_id: u32) -> Option<&FieldRecord> {
        self.fields
            .as_deref()?
            .iter()
            .find(|f| f.field_id == field_id)
    }
}

/// Debug info for a field of a type.
///
/// Field ids are scoped to the owning type; two types may use the same id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub field_id: u32,
    /// Offset in the complete type
    pub begin: Option<i32>,
    pub short_name: Option<String>,
    /// Name of the declared value type
    pub type_name: Option<String>,
}

/// Debug info for a global variable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalRecord {
    /// Version independent id
    pub id: u64,
    pub begin: u64,
    pub short_name: Option<String>,
    pub type_name: Option<String>,
}

/// Debug info for a function occupying `[begin, end)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Version independent id
    pub id: u64,
    pub begin: u64,
    pub end: u64,
    pub short_name: Option<String>,
    pub full_name: Option<String>,
}

impl FunctionRecord {
    pub fn new(id: u64, begin: u64, end: u64) -> Self {
        Self {
            id,
            begin,
            end,
            ..Default::default()
        }
    }

    pub fn with_short_name(mut self, name: impl Into<String>) -> Self {
        self.short_name = Some(name.into());
        self
    }

    pub fn with_full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.begin && offset < self.end
    }

    /// Short name (or `unk`), optionally suffixed with the begin offset in hex
    pub fn display_name(&self, include_offset: bool) -> String {
        let name = match self.short_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => "unk",
        };

        if include_offset {
            format!("{}_{:X}", name, self.begin)
        } else {
            name.to_string()
        }
    }
}

/// Interface/implementation registration of a type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub interface_id: u32,
    pub implementation_id: u32,
    pub vtable_offset: Option<i32>,
    /// Offset of the interface inside the complete implementation type
    pub offset_in_type: Option<i32>,
}

/// Where an instance of a type lives inside its owner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInstanceInfo {
    pub begin_offset: Option<i32>,
    pub end_offset: Option<i32>,
    /// Unique id of the instance's type; `None` when the type is unknown
    pub type_id: Option<u64>,
}
