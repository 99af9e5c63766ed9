//! Dump-vids command implementation.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use verlib::{LoadOptions, dump_vids, load_catalog};

/// Run the dump-vids command
pub fn run(file: &Path, output: Option<&Path>) -> Result<()> {
    let catalog = load_catalog(file, &LoadOptions::default())
        .with_context(|| format!("Failed to load version library {}", file.display()))?;

    match output {
        Some(path) => {
            let mut writer = BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            );
            let count = dump_vids(&catalog, &mut writer)?;
            eprintln!("Wrote {} ids to {}", count, path.display());
        }
        None => {
            dump_vids(&catalog, &mut io::stdout().lock())?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use verlib::{FileVersion, FunctionRecord, SymbolCatalog, save_catalog};

    #[test]
    fn test_dump_to_file() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("version-1_0_0_0.bin");
        let out = dir.path().join("vids.txt");

        let mut catalog = SymbolCatalog::default();
        catalog.set_versions(1, FileVersion::new(1, 0, 0, 0));
        catalog
            .add_function(FunctionRecord::new(12, 0x4000, 0x4010))
            .unwrap();
        save_catalog(&catalog, &library).unwrap();

        run(&library, Some(&out)).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "12\t0x4000\n");
    }
}
