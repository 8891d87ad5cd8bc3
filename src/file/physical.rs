use std::{fs, path::Path};

use memmap2::Mmap;

use crate::{Error::Io, Result};

/// Memory-mapped, read-only view of a catalog file on disk.
#[derive(Debug)]
pub struct Physical {
    data: Mmap,
}

impl Physical {
    /// Maps the file at `path` into memory.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(Io(error)),
        };

        // The mapping is only read for the duration of the load.
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Io(error)),
        };

        Ok(Physical { data: mmap })
    }

    /// Returns the entire mapped file.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Returns the length of the mapped file.
    pub fn len(&self) -> usize {
        self.data.len()
    }
}
