//! Entity views over a loaded catalog.
//!
//! Every entity of the catalog (platforms, frameworks, packages, assemblies, usage sources, APIs
//! and their declarations, usages and facts) is exposed as a small `Copy` value holding a
//! reference to its [`Catalog`] and the byte offset of its row. Views own nothing: every property
//! is read from the immutable buffer on each access, so any number of views can exist and be
//! shared across threads without affecting memory use.
//!
//! Two views compare equal when they refer to the same catalog instance and the same row.
//!
//! # Key Components
//!
//! - [`Api`] / [`ApiKind`] - The API forest, its traversal helpers and ordering
//! - [`ApiDeclaration`] / [`Markup`] - Where an API is declared and its signature markup
//! - [`Assembly`], [`Framework`], [`Package`], [`Platform`] - Containers of declarations
//! - [`Obsoletion`], [`PlatformSupport`], [`PreviewRequirement`] - Declaration-scoped facts
//! - [`UsageSource`], [`ApiUsage`] - Usage statistics
//! - [`Enumerator`] - Lazy, restartable sequence over a count-prefixed offset array

mod api;
mod assembly;
mod declaration;
mod enumerator;
mod facts;
mod framework;
mod markup;
mod package;
mod platform;
mod usage;

pub use api::{Ancestors, Api, ApiKind, Descendants};
pub use assembly::Assembly;
pub use declaration::ApiDeclaration;
pub use enumerator::{ArrayElement, Enumerator};
pub use facts::{FactRow, FactRows, Obsoletion, PlatformSupport, PreviewRequirement};
pub use framework::Framework;
pub use markup::{Markup, MarkupToken, MarkupTokenKind, MarkupTokens};
pub use package::Package;
pub use platform::Platform;
pub use usage::{ApiUsage, UsageSource};

pub(crate) use api::fields as api_fields;
pub(crate) use assembly::fields as assembly_fields;
pub(crate) use facts::fields as fact_fields;
pub(crate) use framework::fields as framework_fields;
pub(crate) use package::fields as package_fields;
pub(crate) use usage::fields as usage_fields;

/// Sentinel stored in place of an absent row offset.
pub const NO_ROW: i32 = -1;

/// Implements construction, identity, equality and hashing for a `(catalog, offset)` view.
macro_rules! catalog_view {
    ($name:ident, $table:expr) => {
        impl<'a> $name<'a> {
            pub(crate) fn new(catalog: &'a crate::Catalog, offset: u32) -> Self {
                $name { catalog, offset }
            }

            /// Returns the catalog this view reads from.
            #[must_use]
            pub fn catalog(&self) -> &'a crate::Catalog {
                self.catalog
            }

            /// Returns the row offset of this entity within its table, which is its id.
            #[must_use]
            pub fn id(&self) -> u32 {
                self.offset
            }

            fn table(&self) -> &'a [u8] {
                self.catalog.table($table)
            }

            fn base(&self) -> usize {
                self.offset as usize
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.catalog, other.catalog) && self.offset == other.offset
            }
        }

        impl Eq for $name<'_> {}

        impl std::hash::Hash for $name<'_> {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::ptr::hash(self.catalog, state);
                self.offset.hash(state);
            }
        }

        impl<'a> crate::model::enumerator::ArrayElement<'a> for $name<'a> {
            const SIZE: usize = 4;

            #[allow(clippy::cast_sign_loss)]
            fn read(
                catalog: &'a crate::Catalog,
                source: crate::catalog::TableKind,
                _owner: u32,
                position: usize,
            ) -> Self {
                let offset = crate::file::io::i32_at(catalog.table(source), position);
                $name::new(catalog, offset as u32)
            }
        }
    };
}

pub(crate) use catalog_view;

/// Converts a stored row reference into an optional offset.
pub(crate) fn row_reference(value: i32) -> Option<u32> {
    u32::try_from(value).ok()
}

/// Number of elements of the count-prefixed array at `position`; negative counts read as empty.
pub(crate) fn array_len(table: &[u8], position: usize) -> usize {
    usize::try_from(crate::file::io::i32_at(table, position)).unwrap_or_default()
}

/// Returns the position following the count-prefixed array at `position`.
pub(crate) fn skip_array(table: &[u8], position: usize, element_size: usize) -> usize {
    position + 4 + array_len(table, position) * element_size
}
