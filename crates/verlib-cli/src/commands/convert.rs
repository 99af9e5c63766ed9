//! Convert command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use verlib::{LoadOptions, load_catalog, save_catalog};

/// Run the convert command.
///
/// Aliases are followed, so the output is always a full library.
pub fn run(input: &Path, output: &Path) -> Result<()> {
    let catalog = load_catalog(input, &LoadOptions::default())
        .with_context(|| format!("Failed to load version library {}", input.display()))?;
    save_catalog(&catalog, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Converted {} ({} functions, {} globals) to {}",
        catalog.file_version(),
        catalog.functions().len(),
        catalog.globals().len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use verlib::{FileVersion, FunctionRecord, GlobalRecord, SymbolCatalog};

    #[test]
    fn test_convert_preserves_records() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.bin");
        let output = dir.path().join("out.bin");

        let mut catalog = SymbolCatalog::default();
        catalog.set_versions(3, FileVersion::new(1, 2, 3, 4));
        catalog
            .add_function(FunctionRecord::new(1, 0x2000, 0x2100).with_short_name("B"))
            .unwrap();
        catalog
            .add_function(FunctionRecord::new(2, 0x1000, 0x1100).with_short_name("A"))
            .unwrap();
        catalog
            .add_global(GlobalRecord {
                id: 3,
                begin: 0x8000,
                ..Default::default()
            })
            .unwrap();
        save_catalog(&catalog, &input).unwrap();

        run(&input, &output).unwrap();

        let converted = load_catalog(&output, &LoadOptions::default()).unwrap();
        assert_eq!(converted.file_version(), FileVersion::new(1, 2, 3, 4));
        assert_eq!(converted.functions()[0].short_name.as_deref(), Some("A"));
        assert_eq!(converted.get_global_info(3).map(|g| g.begin), Some(0x8000));
    }
}
