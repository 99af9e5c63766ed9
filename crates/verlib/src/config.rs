use crate::memory::PointerWidth;

/// Default bound on alias redirections followed by one load
pub const DEFAULT_MAX_ALIAS_DEPTH: u32 = 10;

/// Options for loading a version library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Runtime base address of the target module
    pub base_offset: u64,
    pub pointer_width: PointerWidth,
    /// Maximum number of alias files followed before giving up
    pub max_alias_depth: u32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_offset: 0,
            pointer_width: PointerWidth::default(),
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }
}

impl LoadOptions {
    /// Create a new builder for LoadOptions
    pub fn builder() -> LoadOptionsBuilder {
        LoadOptionsBuilder::default()
    }
}

/// Builder for LoadOptions
#[derive(Debug, Clone, Default)]
pub struct LoadOptionsBuilder {
    base_offset: Option<u64>,
    pointer_width: Option<PointerWidth>,
    max_alias_depth: Option<u32>,
}

impl LoadOptionsBuilder {
    /// Set the module base address
    pub fn base_offset(mut self, base_offset: u64) -> Self {
        self.base_offset = Some(base_offset);
        self
    }

    /// Set the pointer width of the target process
    pub fn pointer_width(mut self, width: PointerWidth) -> Self {
        self.pointer_width = Some(width);
        self
    }

    pub fn max_alias_depth(mut self, depth: u32) -> Self {
        self.max_alias_depth = Some(depth);
        self
    }

    /// Build the options
    pub fn build(self) -> LoadOptions {
        let default = LoadOptions::default();
        LoadOptions {
            base_offset: self.base_offset.unwrap_or(default.base_offset),
            pointer_width: self.pointer_width.unwrap_or(default.pointer_width),
            max_alias_depth: self.max_alias_depth.unwrap_or(default.max_alias_depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        assert_eq!(LoadOptions::builder().build(), LoadOptions::default());
        assert_eq!(LoadOptions::default().max_alias_depth, 10);
    }

    #[test]
    fn test_builder_overrides() {
        let options = LoadOptions::builder()
            .base_offset(0x40_0000)
            .pointer_width(PointerWidth::Bits32)
            .build();
        assert_eq!(options.base_offset, 0x40_0000);
        assert_eq!(options.pointer_width, PointerWidth::Bits32);
        assert_eq!(options.max_alias_depth, DEFAULT_MAX_ALIAS_DEPTH);
    }
}
