//! Alias command implementation.

use std::path::Path;

use anyhow::{Context, Result, bail};
use verlib::{FileVersion, save_alias};

/// Run the alias command
pub fn run(output: &Path, library_version: i32, version: &str, target: &str) -> Result<()> {
    let version: FileVersion = version
        .parse()
        .with_context(|| format!("Invalid --version '{}'", version))?;
    let target: FileVersion = target
        .parse()
        .with_context(|| format!("Invalid --target '{}'", target))?;

    if version == target {
        bail!("An alias cannot point to its own version {}", version);
    }

    let name = output.to_string_lossy();
    if !name.contains(&version.tag()) {
        bail!(
            "Output path {} must contain the version tag {} so the alias can be resolved",
            output.display(),
            version.tag()
        );
    }

    save_alias(output, library_version, version, target)?;
    println!("Wrote alias {} -> {} to {}", version, target, output.display());
    Ok(())
}
