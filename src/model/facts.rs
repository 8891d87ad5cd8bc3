use std::{fmt, iter::FusedIterator, marker::PhantomData};

use crate::{
    catalog::{lookup::KeyRun, TableKind},
    file::io::{i32_at, u8_at},
    model::{row_reference, Api, Assembly},
    Catalog,
};

pub(crate) mod fields {
    // Shared key prefix of every fact row
    pub const API: usize = 0;
    pub const ASSEMBLY: usize = 4;

    pub const OBSOLETION_MESSAGE: usize = 8;
    pub const OBSOLETION_IS_ERROR: usize = 12;
    pub const OBSOLETION_DIAGNOSTIC_ID: usize = 13;
    pub const OBSOLETION_URL_FORMAT: usize = 17;
    pub const OBSOLETION_SIZE: usize = 21;

    pub const PLATFORM_SUPPORT_PLATFORM: usize = 8;
    pub const PLATFORM_SUPPORT_IS_SUPPORTED: usize = 12;
    pub const PLATFORM_SUPPORT_SIZE: usize = 13;

    pub const PREVIEW_MESSAGE: usize = 8;
    pub const PREVIEW_URL: usize = 12;
    pub const PREVIEW_SIZE: usize = 16;
}

/// A row of one of the sorted, fixed-width fact tables.
pub trait FactRow<'a>: Sized {
    /// The table holding rows of this kind.
    const TABLE: TableKind;

    /// Creates a view of the row at byte `offset` of [`Self::TABLE`].
    fn at(catalog: &'a Catalog, offset: u32) -> Self;
}

macro_rules! fact_row {
    ($name:ident, $table:expr) => {
        impl<'a> FactRow<'a> for $name<'a> {
            const TABLE: TableKind = $table;

            fn at(catalog: &'a Catalog, offset: u32) -> Self {
                $name { catalog, offset }
            }
        }

        impl<'a> $name<'a> {
            /// Returns the API the fact applies to; `None` for assembly-wide facts.
            #[must_use]
            pub fn api(&self) -> Option<Api<'a>> {
                row_reference(self.int(fields::API)).map(|offset| Api::new(self.catalog, offset))
            }

            /// Returns the assembly declaring the fact.
            #[must_use]
            #[allow(clippy::cast_sign_loss)]
            pub fn assembly(&self) -> Assembly<'a> {
                Assembly::new(self.catalog, self.int(fields::ASSEMBLY) as u32)
            }

            /// Returns the byte offset of this row within its table.
            #[must_use]
            pub fn id(&self) -> u32 {
                self.offset
            }

            fn int(&self, field: usize) -> i32 {
                i32_at(self.catalog.table($table), self.offset as usize + field)
            }

            fn string(&self, field: usize) -> &'a str {
                self.catalog.string(self.int(field))
            }
        }

        impl PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                std::ptr::eq(self.catalog, other.catalog) && self.offset == other.offset
            }
        }

        impl Eq for $name<'_> {}
    };
}

/// Marks an API or assembly as obsolete.
#[derive(Clone, Copy)]
pub struct Obsoletion<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

fact_row!(Obsoletion, TableKind::Obsoletions);

impl<'a> Obsoletion<'a> {
    /// Returns the obsoletion message.
    #[must_use]
    pub fn message(&self) -> &'a str {
        self.string(fields::OBSOLETION_MESSAGE)
    }

    /// Returns `true` if using the API is a compile error rather than a warning.
    #[must_use]
    pub fn is_error(&self) -> bool {
        u8_at(
            self.catalog.table(TableKind::Obsoletions),
            self.offset as usize + fields::OBSOLETION_IS_ERROR,
        ) != 0
    }

    /// Returns the diagnostic id, e.g. `SYSLIB0011`; empty if none.
    #[must_use]
    pub fn diagnostic_id(&self) -> &'a str {
        self.string(fields::OBSOLETION_DIAGNOSTIC_ID)
    }

    /// Returns the URL format, in which `{0}` stands for the diagnostic id; empty if none.
    #[must_use]
    pub fn url_format(&self) -> &'a str {
        self.string(fields::OBSOLETION_URL_FORMAT)
    }

    /// Returns the documentation URL with the diagnostic id substituted.
    #[must_use]
    pub fn url(&self) -> Option<String> {
        let format = self.url_format();
        if format.is_empty() {
            return None;
        }
        Some(format.replace("{0}", self.diagnostic_id()))
    }
}

impl fmt::Debug for Obsoletion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Obsoletion")
            .field("message", &self.message())
            .field("is_error", &self.is_error())
            .field("diagnostic_id", &self.diagnostic_id())
            .finish()
    }
}

/// States that an API or assembly is (or is not) supported on a platform from a version on.
#[derive(Clone, Copy)]
pub struct PlatformSupport<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

fact_row!(PlatformSupport, TableKind::PlatformSupport);

impl<'a> PlatformSupport<'a> {
    /// Returns the platform with optional version, e.g. `windows10.0.19041` or `browser`.
    #[must_use]
    pub fn platform_name(&self) -> &'a str {
        self.string(fields::PLATFORM_SUPPORT_PLATFORM)
    }

    /// Returns `true` for a supported-from fact, `false` for an unsupported-from fact.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        u8_at(
            self.catalog.table(TableKind::PlatformSupport),
            self.offset as usize + fields::PLATFORM_SUPPORT_IS_SUPPORTED,
        ) != 0
    }
}

impl fmt::Debug for PlatformSupport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformSupport")
            .field("platform", &self.platform_name())
            .field("is_supported", &self.is_supported())
            .finish()
    }
}

/// Marks an API or assembly as requiring preview features.
#[derive(Clone, Copy)]
pub struct PreviewRequirement<'a> {
    catalog: &'a Catalog,
    offset: u32,
}

fact_row!(PreviewRequirement, TableKind::PreviewRequirements);

impl<'a> PreviewRequirement<'a> {
    /// Returns the requirement message.
    #[must_use]
    pub fn message(&self) -> &'a str {
        self.string(fields::PREVIEW_MESSAGE)
    }

    /// Returns the documentation URL; empty if none.
    #[must_use]
    pub fn url(&self) -> &'a str {
        self.string(fields::PREVIEW_URL)
    }
}

impl fmt::Debug for PreviewRequirement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewRequirement")
            .field("message", &self.message())
            .field("url", &self.url())
            .finish()
    }
}

/// The run of rows sharing one `(api, assembly)` key in a fact table, in stored order.
pub struct FactRows<'a, T> {
    catalog: &'a Catalog,
    run: KeyRun<'a>,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T: FactRow<'a>> FactRows<'a, T> {
    pub(crate) fn new(catalog: &'a Catalog, run: KeyRun<'a>) -> Self {
        FactRows {
            catalog,
            run,
            _phantom: PhantomData,
        }
    }
}

impl<T> Clone for FactRows<'_, T> {
    fn clone(&self) -> Self {
        FactRows {
            catalog: self.catalog,
            run: self.run.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<'a, T: FactRow<'a>> Iterator for FactRows<'a, T> {
    type Item = T;

    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self) -> Option<Self::Item> {
        self.run
            .next()
            .map(|offset| T::at(self.catalog, offset as u32))
    }
}

impl<'a, T: FactRow<'a>> FusedIterator for FactRows<'a, T> {}
