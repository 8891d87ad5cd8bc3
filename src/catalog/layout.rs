//! Stream framing and table layout of the catalog format.
//!
//! A catalog stream starts with a fixed, uncompressed header followed by one raw DEFLATE stream:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ magic: [u8; 8] = "APICATFB"                              │
//! │ version: i32 = 4                                         │
//! │ table_count: i32 = 10                                    │
//! │ table_sizes: [i32; table_count]                          │
//! ├──────────────────────────────────────────────────────────┤
//! │ raw DEFLATE payload, inflating to sum(table_sizes) bytes │
//! │   strings | platforms | frameworks | packages |          │
//! │   assemblies | usage sources | apis | obsoletions |      │
//! │   platform support | preview requirements                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The decompressed tables are contiguous and unpadded, so the range of each table is the prefix
//! sum of the sizes preceding it.

use std::io::Read;

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{file::io::read_le, Result};

/// Magic literal opening every catalog stream.
pub const MAGIC: [u8; 8] = *b"APICATFB";

/// The single supported format version.
pub const FORMAT_VERSION: i32 = 4;

/// Number of tables in a catalog.
pub const TABLE_COUNT: usize = TableKind::COUNT;

/// Size of the fixed part of the header, before the table sizes.
pub const HEADER_SIZE: usize = 16;

/// Identifies one of the logical tables of a catalog, in stream order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, EnumIter, EnumCount, strum::Display)]
pub enum TableKind {
    /// Length-prefixed UTF-8 strings and markup records, addressed by offset
    Strings = 0,
    /// Platform names
    Platforms = 1,
    /// Frameworks and their in-box assemblies
    Frameworks = 2,
    /// Packages and their per-framework assemblies
    Packages = 3,
    /// Assemblies
    Assemblies = 4,
    /// Sources of usage data
    UsageSources = 5,
    /// The API forest
    Apis = 6,
    /// Fixed 21-byte obsoletion rows
    Obsoletions = 7,
    /// Fixed 13-byte platform support rows
    PlatformSupport = 8,
    /// Fixed 16-byte preview requirement rows
    PreviewRequirements = 9,
}

impl TableKind {
    /// Returns the fixed row size of sorted fact tables, `None` for entity tables.
    #[must_use]
    pub fn row_size(self) -> Option<usize> {
        match self {
            TableKind::Obsoletions => Some(21),
            TableKind::PlatformSupport => Some(13),
            TableKind::PreviewRequirements => Some(16),
            _ => None,
        }
    }

    /// Returns `true` for tables starting with a count-prefixed array of row offsets.
    #[must_use]
    pub fn has_row_directory(self) -> bool {
        !matches!(self, TableKind::Strings) && self.row_size().is_none()
    }
}

/// The byte range of one table within the decompressed catalog buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct TableRange {
    /// Start of the table within the buffer
    pub offset: usize,
    /// Length of the table in bytes
    pub length: usize,
}

impl TableRange {
    /// Returns the end offset (exclusive) of the table.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// The decoded, uncompressed stream header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogHeader {
    /// The format version declared by the stream
    pub version: i32,
    /// Byte length of every table, in [`TableKind`] order
    pub table_sizes: [usize; TABLE_COUNT],
}

impl CatalogHeader {
    /// Reads and validates the header from the start of `reader`, leaving it positioned at the
    /// compressed payload.
    ///
    /// # Errors
    /// Returns [`crate::Error::Format`] for a bad magic, a wrong table count, negative sizes or
    /// overflowing totals, [`crate::Error::UnsupportedVersion`] for any version other than
    /// [`FORMAT_VERSION`] and [`crate::Error::Io`] if the stream ends inside the header.
    pub fn read<R: Read>(reader: &mut R) -> Result<CatalogHeader> {
        let mut fixed = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut fixed)
            .map_err(|_| format_error!("Stream is too short to contain a catalog header"))?;

        if fixed[..8] != MAGIC {
            return Err(format_error!("Invalid magic - {:02x?}", &fixed[..8]));
        }

        let version: i32 = read_le(&fixed[8..])?;
        if version != FORMAT_VERSION {
            return Err(crate::Error::UnsupportedVersion(version));
        }

        let table_count: i32 = read_le(&fixed[12..])?;
        if usize::try_from(table_count).ok() != Some(TABLE_COUNT) {
            return Err(format_error!(
                "Expected {} tables, stream declares {}",
                TABLE_COUNT,
                table_count
            ));
        }

        let mut sizes = [0u8; TABLE_COUNT * 4];
        reader
            .read_exact(&mut sizes)
            .map_err(|_| format_error!("Stream ends inside the table size directory"))?;

        let mut table_sizes = [0usize; TABLE_COUNT];
        for (index, size) in table_sizes.iter_mut().enumerate() {
            let value: i32 = read_le(&sizes[index * 4..])?;
            *size = usize::try_from(value)
                .map_err(|_| format_error!("Negative size {} for table {}", value, index))?;
        }

        let header = CatalogHeader {
            version,
            table_sizes,
        };
        header.total_size()?;

        Ok(header)
    }

    /// Returns the decompressed length of all tables combined.
    ///
    /// # Errors
    /// Returns [`crate::Error::Format`] if the sum overflows.
    pub fn total_size(&self) -> Result<usize> {
        self.table_sizes
            .iter()
            .try_fold(0usize, |total, size| total.checked_add(*size))
            .ok_or_else(|| format_error!("Table sizes overflow"))
    }

    /// Computes the range of every table by prefix-summing the declared sizes.
    #[must_use]
    pub fn table_ranges(&self) -> [TableRange; TABLE_COUNT] {
        let mut ranges = [TableRange::default(); TABLE_COUNT];
        let mut offset = 0;
        for kind in TableKind::iter() {
            let length = self.table_sizes[kind as usize];
            ranges[kind as usize] = TableRange { offset, length };
            offset += length;
        }
        ranges
    }
}
