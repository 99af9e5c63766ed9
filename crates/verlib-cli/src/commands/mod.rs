//! CLI command implementations.

pub mod alias;
pub mod convert;
pub mod dump_vids;
pub mod find;
pub mod hex_utils;
pub mod info;
pub mod lookup;
pub mod vtable;

use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Args;
use verlib::{LoadOptions, PointerWidth, SymbolCatalog, load_catalog};

use hex_utils::parse_hex_address;

/// Options describing the running target
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Module base address (hex); addresses are module relative when omitted
    #[arg(long)]
    pub base: Option<String>,

    /// Pointer width of the target in bits (32 or 64)
    #[arg(long, default_value_t = 64)]
    pub bits: u8,
}

impl LoadArgs {
    pub fn options(&self) -> Result<LoadOptions> {
        let width = match self.bits {
            32 => PointerWidth::Bits32,
            64 => PointerWidth::Bits64,
            other => bail!("Unsupported pointer width: {} (expected 32 or 64)", other),
        };

        let mut builder = LoadOptions::builder().pointer_width(width);
        if let Some(base) = &self.base {
            builder = builder.base_offset(parse_hex_address(base)?);
        }
        Ok(builder.build())
    }
}

/// Load a library with the options given on the command line
pub fn open(path: &Path, args: &LoadArgs) -> Result<SymbolCatalog> {
    let options = args.options()?;
    load_catalog(path, &options)
        .with_context(|| format!("Failed to load version library {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_args_options() {
        let args = LoadArgs {
            base: Some("0x400000".to_string()),
            bits: 32,
        };
        let options = args.options().unwrap();
        assert_eq!(options.base_offset, 0x40_0000);
        assert_eq!(options.pointer_width, PointerWidth::Bits32);
    }

    #[test]
    fn test_load_args_rejects_odd_width() {
        let args = LoadArgs {
            base: None,
            bits: 16,
        };
        assert!(args.options().is_err());
    }
}
