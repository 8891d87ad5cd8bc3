use std::fmt;

use uguid::Guid;

use crate::{
    catalog::TableKind,
    file::io::{guid_at, i32_at},
    model::{
        skip_array, Api, Enumerator, FactRows, Framework, Obsoletion, Package, PlatformSupport,
        PreviewRequirement, NO_ROW,
    },
    Catalog,
};

pub(crate) mod fields {
    pub const GUID: usize = 0;
    pub const NAME: usize = 16;
    pub const PUBLIC_KEY_TOKEN: usize = 20;
    pub const VERSION: usize = 24;
    pub const ROOT_APIS: usize = 28;
    pub const PACKAGE_SIZE: usize = 8;
}

/// An assembly version as shipped by one or more frameworks and packages.
///
/// The fixed fields are followed by three inline arrays: root APIs, frameworks and
/// `(package, framework)` pairs. The start of each array depends on the lengths of the
/// preceding ones and is recomputed on access.
#[derive(Clone, Copy)]
pub struct Assembly<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

super::catalog_view!(Assembly, TableKind::Assemblies);

impl<'a> Assembly<'a> {
    /// Returns the stable id of this assembly.
    #[must_use]
    pub fn guid(&self) -> Guid {
        guid_at(self.table(), self.base() + fields::GUID)
    }

    /// Returns the simple name, e.g. `System.Runtime`.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.string_field(fields::NAME)
    }

    /// Returns the public key token as a hex string; empty for unsigned assemblies.
    #[must_use]
    pub fn public_key_token(&self) -> &'a str {
        self.string_field(fields::PUBLIC_KEY_TOKEN)
    }

    /// Returns the assembly version string, e.g. `8.0.0.0`.
    #[must_use]
    pub fn version(&self) -> &'a str {
        self.string_field(fields::VERSION)
    }

    /// Returns the top-level APIs (namespaces) declared by this assembly.
    #[must_use]
    pub fn root_apis(&self) -> Enumerator<'a, Api<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Assemblies,
            self.offset,
            self.root_apis_start(),
        )
    }

    /// Returns the frameworks shipping this assembly in-box.
    #[must_use]
    pub fn frameworks(&self) -> Enumerator<'a, Framework<'a>> {
        Enumerator::new(
            self.catalog,
            TableKind::Assemblies,
            self.offset,
            self.frameworks_start(),
        )
    }

    /// Returns the `(package, framework)` pairs of package folders containing this assembly.
    #[must_use]
    pub fn packages(&self) -> Enumerator<'a, (Package<'a>, Framework<'a>)> {
        Enumerator::new(
            self.catalog,
            TableKind::Assemblies,
            self.offset,
            self.packages_start(),
        )
    }

    /// Returns the assembly-wide platform support rows.
    #[must_use]
    pub fn platform_support(&self) -> FactRows<'a, PlatformSupport<'a>> {
        self.catalog.platform_support(NO_ROW, self.offset_key())
    }

    /// Returns the assembly-wide preview requirement, if any.
    #[must_use]
    pub fn preview_requirement(&self) -> Option<PreviewRequirement<'a>> {
        self.catalog.preview_requirement(NO_ROW, self.offset_key())
    }

    /// Returns the assembly-wide obsoletion, if any.
    #[must_use]
    pub fn obsoletion(&self) -> Option<Obsoletion<'a>> {
        self.catalog.obsoletion(NO_ROW, self.offset_key())
    }

    #[allow(clippy::cast_possible_wrap)]
    pub(crate) fn offset_key(&self) -> i32 {
        self.offset as i32
    }

    fn string_field(&self, field: usize) -> &'a str {
        self.catalog.string(i32_at(self.table(), self.base() + field))
    }

    fn root_apis_start(&self) -> usize {
        self.base() + fields::ROOT_APIS
    }

    fn frameworks_start(&self) -> usize {
        skip_array(self.table(), self.root_apis_start(), 4)
    }

    fn packages_start(&self) -> usize {
        skip_array(self.table(), self.frameworks_start(), 4)
    }
}

impl fmt::Debug for Assembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("id", &self.offset)
            .field("name", &self.name())
            .field("version", &self.version())
            .field("public_key_token", &self.public_key_token())
            .finish()
    }
}

impl fmt::Display for Assembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Version={}", self.name(), self.version())?;
        if !self.public_key_token().is_empty() {
            write!(f, ", PublicKeyToken={}", self.public_key_token())?;
        }
        Ok(())
    }
}
