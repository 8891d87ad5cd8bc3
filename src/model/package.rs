use std::fmt;

use crate::{
    catalog::TableKind,
    file::io::i32_at,
    model::{Assembly, Enumerator, Framework},
    Catalog,
};

pub(crate) mod fields {
    pub const NAME: usize = 0;
    pub const VERSION: usize = 4;
    pub const ASSEMBLIES: usize = 8;
}

/// A package version, and the assemblies it provides per targeted framework folder.
#[derive(Clone, Copy)]
pub struct Package<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(Package, TableKind::Packages);

impl<'a> Package<'a> {
    /// Returns the package id.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::NAME))
    }

    /// Returns the package version string.
    #[must_use]
    pub fn version(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::VERSION))
    }

    /// Returns the `(framework, assembly)` pairs of the package's targeting folders.
    ///
    /// A framework appears once per assembly in its folder.
    #[must_use]
    pub fn assemblies(&self) -> Enumerator<'a, (Framework<'a>, Assembly<'a>)> {
        Enumerator::new(
            self.catalog,
            TableKind::Packages,
            self.offset,
            self.base() + fields::ASSEMBLIES,
        )
    }
}

impl fmt::Debug for Package<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("id", &self.offset)
            .field("name", &self.name())
            .field("version", &self.version())
            .finish()
    }
}

impl fmt::Display for Package<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name(), self.version())
    }
}
