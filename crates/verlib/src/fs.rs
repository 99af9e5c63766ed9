//! File access used by the loader.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::Result;

/// Backing store for version library files
pub trait FileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read>>;

    fn create(&self, path: &Path) -> Result<Box<dyn Write>>;

    fn exists(&self, path: &Path) -> bool;
}

/// The local file system
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn create(&self, path: &Path) -> Result<Box<dyn Write>> {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
