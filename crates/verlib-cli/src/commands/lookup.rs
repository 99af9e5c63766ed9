//! Lookup command implementation.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::OwoColorize;

use super::LoadArgs;
use super::hex_utils::format_hex_address;

/// Run the lookup command
pub fn run(file: &Path, id: u64, load: &LoadArgs) -> Result<()> {
    let catalog = super::open(file, load)?;

    if let Some(function) = catalog.get_function_info(id) {
        println!("{} {}", "function".cyan(), function.display_name(true).bold());
        if let Some(full_name) = &function.full_name {
            println!("  {}", full_name);
        }
        println!(
            "  range: {}..{}",
            format_hex_address(function.begin),
            format_hex_address(function.end)
        );
    } else if let Some(global) = catalog.get_global_info(id) {
        println!(
            "{} {}",
            "global".cyan(),
            global.short_name.as_deref().unwrap_or("unk").bold()
        );
        if let Some(type_name) = &global.type_name {
            println!("  type: {}", type_name);
        }
        println!("  offset: {}", format_hex_address(global.begin));
    } else {
        bail!("No function or global with id {} in {}", id, file.display());
    }

    if load.base.is_some() {
        let address = catalog.resolve_offset(id, 0)?;
        println!("  address: {}", format_hex_address(address).green());
    }

    Ok(())
}
