use std::fmt;

use crate::{
    catalog::TableKind,
    file::io::i32_at,
    model::{
        enumerator::ArrayElement, Api, Assembly, FactRows, Markup, Obsoletion, PlatformSupport,
        PreviewRequirement,
    },
    Catalog,
};

mod fields {
    pub const ASSEMBLY: usize = 0;
    pub const MARKUP: usize = 4;
    pub const SIZE: usize = 8;
}

/// The declaration of an API by one assembly, with the markup of its signature.
#[derive(Clone, Copy)]
pub struct ApiDeclaration<'a> {
    catalog: &'a Catalog,
    api: u32,
    position: usize,
}

impl<'a> ApiDeclaration<'a> {
    /// Returns the declared API.
    #[must_use]
    pub fn api(&self) -> Api<'a> {
        Api::new(self.catalog, self.api)
    }

    /// Returns the declaring assembly.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn assembly(&self) -> Assembly<'a> {
        Assembly::new(self.catalog, self.int(fields::ASSEMBLY) as u32)
    }

    /// Returns the string-table offset of the signature markup.
    #[must_use]
    pub fn markup_offset(&self) -> i32 {
        self.int(fields::MARKUP)
    }

    /// Returns the signature markup.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn markup(&self) -> Markup<'a> {
        Markup::new(self.catalog, self.markup_offset() as u32)
    }

    /// Returns the obsoletion of the API in this assembly, if any.
    #[must_use]
    pub fn obsoletion(&self) -> Option<Obsoletion<'a>> {
        self.catalog.obsoletion(self.api_key(), self.assembly_key())
    }

    /// Returns the platform support rows of the API in this assembly, in stored order.
    #[must_use]
    pub fn platform_support(&self) -> FactRows<'a, PlatformSupport<'a>> {
        self.catalog
            .platform_support(self.api_key(), self.assembly_key())
    }

    /// Returns the preview requirement of the API in this assembly, if any.
    #[must_use]
    pub fn preview_requirement(&self) -> Option<PreviewRequirement<'a>> {
        self.catalog
            .preview_requirement(self.api_key(), self.assembly_key())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn api_key(&self) -> i32 {
        self.api as i32
    }

    fn assembly_key(&self) -> i32 {
        self.int(fields::ASSEMBLY)
    }

    fn int(&self, field: usize) -> i32 {
        i32_at(self.catalog.table(TableKind::Apis), self.position + field)
    }
}

impl PartialEq for ApiDeclaration<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.catalog, other.catalog) && self.position == other.position
    }
}

impl Eq for ApiDeclaration<'_> {}

impl std::hash::Hash for ApiDeclaration<'_> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.catalog, state);
        self.position.hash(state);
    }
}

impl<'a> ArrayElement<'a> for ApiDeclaration<'a> {
    const SIZE: usize = fields::SIZE;

    fn read(catalog: &'a Catalog, _source: TableKind, owner: u32, position: usize) -> Self {
        ApiDeclaration {
            catalog,
            api: owner,
            position,
        }
    }
}

impl fmt::Debug for ApiDeclaration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiDeclaration")
            .field("api", &self.api().name())
            .field("assembly", &self.assembly().name())
            .finish()
    }
}
