//! Info command implementation.

use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use verlib::CatalogSummary;

use super::LoadArgs;
use super::hex_utils::format_hex_address;

/// Run the info command
pub fn run(file: &Path, load: &LoadArgs, json: bool) -> Result<()> {
    let catalog = super::open(file, load)?;
    let summary = CatalogSummary::from(&catalog);

    if json {
        println!("{}", summary.to_json()?);
        return Ok(());
    }

    println!("{}", file.display().bold());
    println!("  Library version:  {}", summary.library_version);
    println!("  File version:     {}", summary.file_version.green());
    if let Some(resolved) = summary.resolved_version {
        println!("  Resolved from:    {}", resolved.yellow());
    }
    println!(
        "  Library base:     {}",
        format_hex_address(summary.library_base_offset)
    );
    println!("  Hash version:     {:#X}", summary.hash_version);
    println!("  Pointer width:    {}", summary.pointer_width);
    println!();
    println!(
        "  Types:            {} ({} fields)",
        summary.types, summary.fields
    );
    println!("  Functions:        {}", summary.functions);
    println!("  Globals:          {}", summary.globals);
    println!("  Registrations:    {}", summary.registrations);
    println!(
        "  Type instances:   {} in {} owners",
        summary.type_instances, summary.type_instance_owners
    );
    println!(
        "  Cached values:    {} of {} slots",
        summary.cached_values_present, summary.cached_values
    );

    Ok(())
}
