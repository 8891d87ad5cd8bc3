//! Low-level little-endian reading utilities for the catalog buffer.
//!
//! This module is the single place where the byte layout of primitive cells is known. Entity
//! views compute the position of a field by adding a fixed per-kind offset to their base offset
//! and delegate the actual read to one of the functions here.
//!
//! # Two Families of Readers
//!
//! - **Fallible readers** ([`read_le`], [`read_le_at`], [`read_guid_at`], [`read_str_at`]) are
//!   bounds-checked and return [`crate::Result`]. The loader and the structural verifier use
//!   them on untrusted bytes.
//! - **Infallible readers** ([`i32_at`], [`u8_at`], [`f32_at`], [`guid_at`], [`str_at`]) are
//!   used by entity views once the buffer has passed verification. They index the buffer
//!   directly; calling them on an unverified buffer may panic.
//!
//! # Cell Encodings
//!
//! - Integers and floats: little-endian, no alignment requirements
//! - GUID: 16 raw bytes in the mixed-endian layout used by .NET
//! - String: 4-byte little-endian length followed by that many UTF-8 bytes
//!
//! # Examples
//!
//! ```rust
//! use apicatalog::file::io::{read_le_at, read_str_at};
//!
//! let data = [0x05, 0x00, 0x00, 0x00, b'H', b'e', b'l', b'l', b'o'];
//! let mut offset = 0;
//! let length: i32 = read_le_at(&data, &mut offset)?;
//! assert_eq!(length, 5);
//! assert_eq!(read_str_at(&data, 0)?, "Hello");
//! # Ok::<(), apicatalog::Error>(())
//! ```

use std::str;

use uguid::Guid;

use crate::{Error::OutOfBounds, Result};

/// Size in bytes of an encoded GUID cell.
pub const GUID_SIZE: usize = 16;

/// Trait for implementing type-specific little-endian reading and writing.
///
/// Each implementation defines a `Bytes` associated type that represents the fixed-size byte
/// array required for that particular type (e.g. `[u8; 4]` for `i32`).
pub trait CatalogIO: Sized + Copy {
    /// Associated type representing the byte array type for this numeric type.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
}

macro_rules! impl_catalog_io {
    ($($ty:ty => $size:literal),* $(,)?) => {
        $(
            impl CatalogIO for $ty {
                type Bytes = [u8; $size];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }
            }
        )*
    };
}

impl_catalog_io!(u8 => 1, i32 => 4, u32 => 4, f32 => 4);

/// Safely reads a value of type `T` in little-endian byte order from the start of a buffer.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than `size_of::<T>()`.
pub fn read_le<T: CatalogIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing the
/// offset past the value.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the read would go past the end of `data`.
pub fn read_le_at<T: CatalogIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;
    Ok(T::from_le_bytes(read))
}

/// Safely reads a 16-byte GUID at `offset`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than 16 bytes remain.
pub fn read_guid_at(data: &[u8], offset: usize) -> Result<Guid> {
    let Some(end) = offset.checked_add(GUID_SIZE) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let mut buffer = [0u8; GUID_SIZE];
    buffer.copy_from_slice(&data[offset..end]);
    Ok(Guid::from_bytes(buffer))
}

/// Safely reads a length-prefixed UTF-8 string at `offset`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the length prefix or the payload do not fit, and
/// [`crate::Error::Format`] for a negative length or invalid UTF-8.
pub fn read_str_at(data: &[u8], offset: usize) -> Result<&str> {
    let mut position = offset;
    let length: i32 = read_le_at(data, &mut position)?;
    let Ok(length) = usize::try_from(length) else {
        return Err(format_error!("Negative string length at offset - {}", offset));
    };

    let Some(end) = position.checked_add(length) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    str::from_utf8(&data[position..end])
        .map_err(|error| format_error!("Invalid string at offset - {}: {}", offset, error))
}

/// Appends `value` to `buffer` in little-endian byte order.
pub fn write_le<T: CatalogIO>(buffer: &mut Vec<u8>, value: T) {
    buffer.extend_from_slice(value.to_le_bytes().as_ref());
}

/// Overwrites the bytes at `offset` with `value` in little-endian byte order.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit at `offset`.
pub fn write_le_at<T: CatalogIO>(buffer: &mut [u8], offset: usize, value: T) -> Result<()> {
    let bytes = value.to_le_bytes();
    let bytes = bytes.as_ref();
    let Some(end) = offset.checked_add(bytes.len()) else {
        return Err(OutOfBounds);
    };
    if end > buffer.len() {
        return Err(OutOfBounds);
    }

    buffer[offset..end].copy_from_slice(bytes);
    Ok(())
}

// Infallible readers for verified buffers.

/// Reads a little-endian `i32` at `offset` of a verified buffer.
///
/// # Panics
/// Panics if `offset + 4` exceeds the buffer.
#[must_use]
pub fn i32_at(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Reads a byte at `offset` of a verified buffer.
///
/// # Panics
/// Panics if `offset` is outside the buffer.
#[must_use]
pub fn u8_at(data: &[u8], offset: usize) -> u8 {
    data[offset]
}

/// Reads a little-endian `f32` at `offset` of a verified buffer.
///
/// # Panics
/// Panics if `offset + 4` exceeds the buffer.
#[must_use]
pub fn f32_at(data: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Reads a GUID at `offset` of a verified buffer.
///
/// # Panics
/// Panics if `offset + 16` exceeds the buffer.
#[must_use]
pub fn guid_at(data: &[u8], offset: usize) -> Guid {
    let mut buffer = [0u8; GUID_SIZE];
    buffer.copy_from_slice(&data[offset..offset + GUID_SIZE]);
    Guid::from_bytes(buffer)
}

/// Reads a length-prefixed string at `offset` of a verified buffer.
///
/// Returns an empty string if the cell is not valid UTF-8, which verification rules out.
///
/// # Panics
/// Panics if the cell exceeds the buffer.
#[must_use]
pub fn str_at(data: &[u8], offset: usize) -> &str {
    let length = usize::try_from(i32_at(data, offset)).unwrap_or_default();
    let start = offset + 4;
    str::from_utf8(&data[start..start + length]).unwrap_or_default()
}
