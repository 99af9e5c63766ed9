//! Find command implementation.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;

use super::LoadArgs;
use super::hex_utils::{format_hex_address, parse_hex_address};

/// Run the find command
pub fn run(file: &Path, address: &str, load: &LoadArgs) -> Result<()> {
    let address = parse_hex_address(address)?;
    let catalog = super::open(file, load)?;

    match catalog.get_function_info_by_address(address, load.base.is_some()) {
        Some(function) => {
            println!(
                "{} is in {} (id {})",
                format_hex_address(address),
                function.display_name(true).bold(),
                function.id
            );
            println!(
                "  range: {}..{}",
                format_hex_address(function.begin),
                format_hex_address(function.end)
            );
        }
        None => println!(
            "{}",
            format!("No function contains {}", format_hex_address(address)).yellow()
        ),
    }

    Ok(())
}
