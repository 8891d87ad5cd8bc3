use std::fmt;

use crate::{
    catalog::TableKind,
    file::io::i32_at,
    model::{Assembly, Enumerator},
    Catalog,
};

pub(crate) mod fields {
    pub const NAME: usize = 0;
    pub const ASSEMBLIES: usize = 4;
}

/// A target framework, such as `net8.0`, and the assemblies it ships in-box.
#[derive(Clone, Copy)]
pub struct Framework<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(Framework, TableKind::Frameworks);

impl<'a> Framework<'a> {
    /// Returns the framework name as stored in the catalog, e.g. `net8.0`.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.catalog
            .string(i32_at(self.table(), self.base() + fields::NAME))
    }

    /// Returns the in-box assemblies of this framework, in catalog order.
    #[must_use]
    pub fn assemblies(&self) -> Enumerator<'a, Assembly<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Frameworks,
            self.offset,
            self.base() + fields::ASSEMBLIES,
        )
    }
}

impl fmt::Debug for Framework<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Framework")
            .field("id", &self.offset)
            .field("name", &self.name())
            .finish()
    }
}

impl fmt::Display for Framework<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
