//! Reading and writing version library files.
//!
//! A file is a gzip stream holding a small header and, unless the file is an
//! alias, the record lists. An alias names another build version; the loader
//! swaps that version into the file path and continues with the new file.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, info};

use crate::catalog::SymbolCatalog;
use crate::codec::{
    Record, decode_cached_values, decode_instance_list, decode_list, encode_cached_values,
    encode_instance_list, encode_list, read_count, write_count,
};
use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, StdFileSystem};
use crate::record::{FunctionRecord, GlobalRecord, RecordKind, RegistrationRecord, TypeRecord};
use crate::version::FileVersion;

pub const MIN_STREAM_VERSION: i32 = 2;
pub const MAX_STREAM_VERSION: i32 = 2;

/// Header of a file that redirects to another build version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasHeader {
    pub library_version: i32,
    pub file_version: FileVersion,
    pub alias_version: FileVersion,
}

/// Result of decoding one file
#[derive(Debug)]
pub enum DecodedLibrary {
    Catalog(Box<SymbolCatalog>),
    Alias(AliasHeader),
}

fn read_version<R: Read>(reader: &mut R) -> Result<FileVersion> {
    let mut components = [0i32; 4];
    reader.read_i32_into::<LE>(&mut components)?;
    Ok(FileVersion(components))
}

fn write_version<W: Write>(writer: &mut W, version: FileVersion) -> Result<()> {
    for component in version.components() {
        writer.write_i32::<LE>(component)?;
    }
    Ok(())
}

fn write_header<W: Write>(
    writer: &mut W,
    library_version: i32,
    file_version: FileVersion,
    alias_version: Option<FileVersion>,
) -> Result<()> {
    writer.write_i32::<LE>(MAX_STREAM_VERSION)?;
    writer.write_i32::<LE>(library_version)?;
    write_version(writer, file_version)?;
    match alias_version {
        Some(alias) => {
            writer.write_u8(1)?;
            write_version(writer, alias)?;
        }
        None => writer.write_u8(0)?,
    }
    Ok(())
}

/// Decode an uncompressed library stream.
///
/// The catalog is only returned once every section decoded; any error
/// discards the partial result.
pub fn decode_catalog<R: Read>(reader: &mut R, options: &LoadOptions) -> Result<DecodedLibrary> {
    let stream_version = reader.read_i32::<LE>()?;
    if !(MIN_STREAM_VERSION..=MAX_STREAM_VERSION).contains(&stream_version) {
        return Err(Error::UnsupportedFormatVersion {
            version: stream_version,
            min: MIN_STREAM_VERSION,
            max: MAX_STREAM_VERSION,
        });
    }

    let library_version = reader.read_i32::<LE>()?;
    let file_version = read_version(reader)?;

    if reader.read_u8()? != 0 {
        let alias_version = read_version(reader)?;
        return Ok(DecodedLibrary::Alias(AliasHeader {
            library_version,
            file_version,
            alias_version,
        }));
    }

    let mut catalog = SymbolCatalog::new(options.base_offset, options.pointer_width);
    catalog.set_versions(library_version, file_version);
    catalog.set_library_base_offset(reader.read_u64::<LE>()?);
    catalog.set_hash_version(reader.read_u64::<LE>()?);

    let types: Vec<TypeRecord> = decode_list(reader)?;
    debug!("Decoded {} types", types.len());
    for record in types {
        catalog.add_type(record)?;
    }

    let functions: Vec<FunctionRecord> = decode_list(reader)?;
    debug!("Decoded {} functions", functions.len());
    for record in functions {
        catalog.add_function(record)?;
    }

    let globals: Vec<GlobalRecord> = decode_list(reader)?;
    debug!("Decoded {} globals", globals.len());
    for record in globals {
        catalog.add_global(record)?;
    }

    let registrations: Vec<RegistrationRecord> = decode_list(reader)?;
    debug!("Decoded {} registrations", registrations.len());
    for record in registrations {
        catalog.add_registration(record);
    }

    let owners = read_count(reader, RecordKind::TypeInstanceList)?;
    for _ in 0..owners {
        let (owner, list) = decode_instance_list(reader)?;
        catalog.add_type_instance_infos(owner, list)?;
    }
    debug!("Decoded type instances of {} owners", owners);

    let cached = decode_cached_values(reader)?;
    debug!("Decoded {} cached value slots", cached.len());
    catalog.set_cached_values(cached);

    catalog.sort_functions();
    Ok(DecodedLibrary::Catalog(Box::new(catalog)))
}

/// Encode a catalog as an uncompressed library stream, functions ordered by
/// begin offset
pub fn encode_catalog<W: Write>(writer: &mut W, catalog: &SymbolCatalog) -> Result<()> {
    write_header(writer, catalog.library_version(), catalog.file_version(), None)?;
    writer.write_u64::<LE>(catalog.library_base_offset())?;
    writer.write_u64::<LE>(catalog.hash_version())?;

    encode_list(writer, catalog.types())?;

    let mut functions: Vec<&FunctionRecord> = catalog.functions().iter().collect();
    functions.sort_by_key(|f| f.begin);
    write_count(writer, functions.len())?;
    for function in functions {
        function.encode(writer)?;
    }

    encode_list(writer, catalog.globals())?;
    encode_list(writer, catalog.registrations())?;

    let owners: Vec<_> = catalog.type_instances().collect();
    write_count(writer, owners.len())?;
    for (owner, list) in owners {
        encode_instance_list(writer, owner, list)?;
    }

    encode_cached_values(writer, catalog.cached_values())
}

/// Encode an alias header as an uncompressed stream
pub fn encode_alias<W: Write>(writer: &mut W, alias: &AliasHeader) -> Result<()> {
    write_header(
        writer,
        alias.library_version,
        alias.file_version,
        Some(alias.alias_version),
    )
}

/// Path of the file an alias redirects to: the first occurrence of `from`'s
/// tag in `path` replaced by `to`'s tag
pub fn alias_path(path: &Path, from: FileVersion, to: FileVersion) -> Result<PathBuf> {
    let failed = |reason: String| Error::AliasSubstitutionFailed {
        path: path.to_path_buf(),
        reason,
    };

    let original = path
        .to_str()
        .ok_or_else(|| failed("path is not valid UTF-8".to_string()))?;
    let tag = from.tag();
    if !original.contains(&tag) {
        return Err(failed(format!("version tag '{}' not found in path", tag)));
    }

    let substituted = original.replacen(&tag, &to.tag(), 1);
    if substituted == original {
        return Err(failed(format!("alias of {} points to itself", from)));
    }

    Ok(PathBuf::from(substituted))
}

/// Load a version library from the local file system
pub fn load_catalog<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<SymbolCatalog> {
    load_catalog_with(&StdFileSystem, path, options)
}

/// Load a version library, following alias files up to
/// `options.max_alias_depth` redirections.
///
/// The returned catalog reports the version of the requested file; the
/// version actually decoded is kept in `resolved_version`.
pub fn load_catalog_with<F: FileSystem + ?Sized, P: AsRef<Path>>(
    fs: &F,
    path: P,
    options: &LoadOptions,
) -> Result<SymbolCatalog> {
    let mut current = path.as_ref().to_path_buf();
    let mut requested_version = None;
    let mut depth = 0u32;

    loop {
        debug!("Reading version library {} (alias depth {})", current.display(), depth);
        let mut reader = GzDecoder::new(fs.open_read(&current)?);

        match decode_catalog(&mut reader, options)? {
            DecodedLibrary::Catalog(catalog) => {
                let mut catalog = *catalog;
                if let Some(requested) = requested_version {
                    catalog.resolved_version = Some(catalog.file_version);
                    catalog.file_version = requested;
                }
                info!(
                    "Loaded version library {} ({} types, {} functions, {} globals)",
                    catalog.file_version(),
                    catalog.types().len(),
                    catalog.functions().len(),
                    catalog.globals().len()
                );
                return Ok(catalog);
            }
            DecodedLibrary::Alias(alias) => {
                if depth >= options.max_alias_depth {
                    return Err(Error::AliasRecursionExceeded {
                        depth,
                        path: current,
                    });
                }

                let next = alias_path(&current, alias.file_version, alias.alias_version)?;
                if !fs.exists(&next) {
                    return Err(io::Error::new(
                        io::ErrorKind::NotFound,
                        format!(
                            "{} is an alias of {} but {} does not exist",
                            current.display(),
                            alias.alias_version,
                            next.display()
                        ),
                    )
                    .into());
                }

                debug!(
                    "Version {} is an alias of {}",
                    alias.file_version, alias.alias_version
                );
                requested_version.get_or_insert(alias.file_version);
                current = next;
                depth += 1;
            }
        }
    }
}

fn write_gzip<F: FileSystem + ?Sized>(
    fs: &F,
    path: &Path,
    encode: impl FnOnce(&mut GzEncoder<Box<dyn Write>>) -> Result<()>,
) -> Result<()> {
    let mut encoder = GzEncoder::new(fs.create(path)?, Compression::default());
    encode(&mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Save a catalog to the local file system
pub fn save_catalog<P: AsRef<Path>>(catalog: &SymbolCatalog, path: P) -> Result<()> {
    save_catalog_with(&StdFileSystem, catalog, path)
}

pub fn save_catalog_with<F: FileSystem + ?Sized, P: AsRef<Path>>(
    fs: &F,
    catalog: &SymbolCatalog,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    write_gzip(fs, path, |writer| encode_catalog(writer, catalog))?;
    info!("Saved version library {} to {}", catalog.file_version(), path.display());
    Ok(())
}

/// Write an alias file redirecting `file_version` to `alias_version`
pub fn save_alias<P: AsRef<Path>>(
    path: P,
    library_version: i32,
    file_version: FileVersion,
    alias_version: FileVersion,
) -> Result<()> {
    save_alias_with(
        &StdFileSystem,
        path,
        library_version,
        file_version,
        alias_version,
    )
}

pub fn save_alias_with<F: FileSystem + ?Sized, P: AsRef<Path>>(
    fs: &F,
    path: P,
    library_version: i32,
    file_version: FileVersion,
    alias_version: FileVersion,
) -> Result<()> {
    let path = path.as_ref();
    let alias = AliasHeader {
        library_version,
        file_version,
        alias_version,
    };
    write_gzip(fs, path, |writer| encode_alias(writer, &alias))?;
    info!("Saved alias {} -> {} to {}", file_version, alias_version, path.display());
    Ok(())
}
