//! Byte-level access to catalog sources.
//!
//! This module contains the primitive cell readers shared by the loader, the structural
//! verifier and every entity view ([`io`]), and the memory-mapped file source used by
//! [`crate::Catalog::from_file`].
//!
//! The catalog itself never keeps the source mapped: the compressed payload is inflated into an
//! owned buffer during load, after which the mapping is released.

pub mod io;

mod physical;

pub(crate) use physical::Physical;
