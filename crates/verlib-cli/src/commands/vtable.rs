//! Vtable command implementation.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::LoadArgs;
use super::hex_utils::{format_hex_address, parse_hex_address};

/// Run the vtable command
pub fn run(file: &Path, offset: &str, load: &LoadArgs) -> Result<()> {
    let offset = parse_hex_address(offset)?;
    let catalog = super::open(file, load)?;

    let Some(ty) = catalog.get_type_info_by_vtable_address(offset, load.base.is_some()) else {
        println!(
            "{}",
            format!("No type has its vtable at {}", format_hex_address(offset)).yellow()
        );
        return Ok(());
    };

    print!("{} (id {})", ty.name.bold(), ty.id);
    match ty.size {
        Some(size) => println!(", {} bytes", size),
        None => println!(),
    }

    for field in ty.fields.iter().flatten() {
        println!(
            "  +{:<6} {:<24} {}",
            field
                .begin
                .map(|b| format!("{:#X}", b))
                .unwrap_or_else(|| "?".to_string()),
            field.short_name.as_deref().unwrap_or("?"),
            field.type_name.as_deref().unwrap_or("").dimmed()
        );
    }

    Ok(())
}
