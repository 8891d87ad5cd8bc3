use std::fmt;

use crate::{catalog::TableKind, file::io::i32_at, Catalog};

pub(crate) mod fields {
    pub const NAME: usize = 0;
    pub const SIZE: usize = 4;
}

/// A platform named by the catalog, such as `windows` or `ios`.
#[derive(Clone, Copy)]
pub struct Platform<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(Platform, TableKind::Platforms);

impl<'a> Platform<'a> {
    /// Returns the platform name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::NAME))
    }
}

impl fmt::Debug for Platform<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Platform")
            .field("id", &self.offset)
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for Platform<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
