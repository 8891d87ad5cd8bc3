//! Stream to buffer loading.
//!
//! Loading is a single sequential pass: read and validate the header, inflate the raw DEFLATE
//! payload up to the declared table total, compute the table ranges and optionally verify the
//! structure. The buffer grows with the inflated data, so a header declaring more than the
//! payload holds fails as truncated without allocating the declared size. It blocks the calling thread and has no internal
//! concurrency; cancellation is only possible by failing the underlying reader.

use std::io::{ErrorKind, Read};

use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::{
    catalog::{
        layout::{CatalogHeader, TableRange, TABLE_COUNT},
        verify,
    },
    LoadOptions, Result,
};

/// The decompressed buffer and the table boundaries computed from the header.
pub(crate) struct LoadedTables {
    pub data: Vec<u8>,
    pub tables: [TableRange; TABLE_COUNT],
}

/// Reads a complete catalog stream.
pub(crate) fn load<R: Read>(mut reader: R, options: LoadOptions) -> Result<LoadedTables> {
    let header = CatalogHeader::read(&mut reader)?;
    let total = header.total_size()?;

    debug!(
        version = header.version,
        total,
        sizes = ?header.table_sizes,
        "loading catalog"
    );

    let data = inflate(reader, total)?;
    let tables = header.table_ranges();

    if options.verify {
        let summary = verify::verify(&data, &tables)?;
        debug!(
            apis = summary.apis,
            assemblies = summary.assemblies,
            frameworks = summary.frameworks,
            packages = summary.packages,
            "verified catalog"
        );
    }

    Ok(LoadedTables { data, tables })
}

/// Inflates exactly `length` bytes of raw DEFLATE data.
fn inflate<R: Read>(reader: R, length: usize) -> Result<Vec<u8>> {
    let limit = u64::try_from(length).map_err(|_| format_error!("Table sizes overflow"))?;
    let mut decoder = DeflateDecoder::new(reader).take(limit);
    let mut data = Vec::new();

    match decoder.read_to_end(&mut data) {
        Ok(_) => {}
        Err(error) if matches!(error.kind(), ErrorKind::InvalidInput | ErrorKind::InvalidData) => {
            return Err(format_error!("Compressed payload is corrupt - {}", error))
        }
        Err(error) => return Err(error.into()),
    }

    if data.len() < length {
        return Err(format_error!(
            "Compressed payload is truncated - expected {} bytes, got {}",
            length,
            data.len()
        ));
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use flate2::{write::DeflateEncoder, Compression};

    use super::*;
    use crate::Error;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflate_exact_length() {
        let payload: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        let compressed = deflate(&payload);

        let data = inflate(Cursor::new(compressed), payload.len()).unwrap();
        assert_eq!(data, payload);
    }

    #[test]
    fn inflate_truncated_payload() {
        let compressed = deflate(&[7u8; 64]);

        match inflate(Cursor::new(compressed), 128) {
            Err(Error::Format { message, .. }) => assert!(message.contains("truncated")),
            other => panic!("Expected truncated format error, got {other:?}"),
        }
    }

    #[test]
    fn inflate_garbage() {
        let garbage = vec![0xFFu8; 32];
        assert!(inflate(Cursor::new(garbage), 16).is_err());
    }

    #[test]
    fn inflate_oversized_declaration() {
        // A final empty stored block: no payload at all.
        let empty = vec![0x03, 0x00];
        let declared = usize::try_from(i32::MAX).unwrap() * TABLE_COUNT;

        match inflate(Cursor::new(empty), declared) {
            Err(Error::Format { message, .. }) => assert!(message.contains("truncated")),
            other => panic!("Expected truncated format error, got {other:?}"),
        }
    }

    #[test]
    fn load_oversized_header() {
        let mut stream = crate::catalog::layout::MAGIC.to_vec();
        stream.extend_from_slice(&4i32.to_le_bytes());
        stream.extend_from_slice(&10i32.to_le_bytes());
        for _ in 0..TABLE_COUNT {
            stream.extend_from_slice(&i32::MAX.to_le_bytes());
        }
        stream.extend_from_slice(&[0x03, 0x00]);

        assert!(matches!(
            load(Cursor::new(stream), LoadOptions::default()),
            Err(Error::Format { .. })
        ));
    }

    #[test]
    fn inflate_empty() {
        let compressed = deflate(&[]);
        assert!(inflate(Cursor::new(compressed), 0).unwrap().is_empty());
    }
}
