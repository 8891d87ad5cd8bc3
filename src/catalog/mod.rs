//! The loaded catalog and its table layout.
//!
//! A [`Catalog`] owns one immutable buffer holding the decompressed tables, plus the range of
//! every table within it. Everything else in the crate is a view over that buffer.
//!
//! # Key Components
//!
//! - [`Catalog`] - Loading and top-level enumeration
//! - [`TableKind`] / [`CatalogHeader`] - Stream framing and table order
//! - [`CatalogBuilder`] - Writer producing catalogs in the same format
//! - [`lookup`] - Binary search over the sorted fact tables
//!
//! # Thread Safety
//!
//! A loaded catalog is never mutated, except for the stable-id index which is computed on first
//! use and installed atomically. [`Catalog`] is [`Send`] and [`Sync`]; views borrowing it can
//! be used from any number of threads.

mod builder;
mod layout;
mod loader;
pub mod lookup;
mod verify;

pub use builder::{
    ApiHandle, AssemblyHandle, CatalogBuilder, FrameworkHandle, MarkupBuilder, PackageHandle,
    PlatformHandle, UsageSourceHandle,
};
pub use layout::{
    CatalogHeader, TableKind, TableRange, FORMAT_VERSION, HEADER_SIZE, MAGIC, TABLE_COUNT,
};

use std::{collections::HashMap, io::Read, path::Path};

use once_cell::race::OnceBox;
use tracing::debug;
use uguid::Guid;

use crate::{
    file::{io::str_at, Physical},
    model::{
        Api, Assembly, Descendants, Enumerator, FactRow, FactRows, Framework, Obsoletion,
        Package, Platform, PlatformSupport, PreviewRequirement, UsageSource,
    },
    LoadOptions, Result,
};

/// An immutable, loaded API catalog.
///
/// # Examples
///
/// ```rust,no_run
/// use apicatalog::Catalog;
///
/// let catalog = Catalog::from_file("apicatalog.dat")?;
/// for framework in catalog.frameworks() {
///     println!("{}: {} assemblies", framework.name(), framework.assemblies().len());
/// }
/// # Ok::<(), apicatalog::Error>(())
/// ```
pub struct Catalog {
    data: Vec<u8>,
    tables: [TableRange; TABLE_COUNT],
    api_index: OnceBox<HashMap<Guid, u32>>,
}

impl Catalog {
    /// Loads a catalog from a stream, verifying its structure.
    ///
    /// # Errors
    /// Returns [`crate::Error::Format`], [`crate::Error::UnsupportedVersion`] or
    /// [`crate::Error::OutOfBounds`] for a damaged stream and [`crate::Error::Io`] if reading
    /// fails.
    pub fn load<R: Read>(reader: R) -> Result<Catalog> {
        Self::load_with(reader, LoadOptions::default())
    }

    /// Loads a catalog from a stream with explicit options.
    ///
    /// # Errors
    /// See [`Catalog::load`].
    pub fn load_with<R: Read>(reader: R, options: LoadOptions) -> Result<Catalog> {
        let loaded = loader::load(reader, options)?;
        Ok(Catalog {
            data: loaded.data,
            tables: loaded.tables,
            api_index: OnceBox::new(),
        })
    }

    /// Loads a catalog from an in-memory stream.
    ///
    /// # Errors
    /// See [`Catalog::load`].
    pub fn from_mem(data: &[u8]) -> Result<Catalog> {
        Self::load(data)
    }

    /// Loads a catalog file through a read-only memory mapping.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] if the file cannot be mapped; see [`Catalog::load`] for
    /// the remaining errors.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Catalog> {
        let file = Physical::new(path)?;
        Self::load(file.data())
    }

    /// Returns the decompressed buffer holding all tables.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the range of a table within [`Catalog::data`].
    #[must_use]
    pub fn table_range(&self, kind: TableKind) -> TableRange {
        self.tables[kind as usize]
    }

    /// Returns the bytes of a table.
    #[must_use]
    pub fn table(&self, kind: TableKind) -> &[u8] {
        let range = self.tables[kind as usize];
        &self.data[range.offset..range.end()]
    }

    /// Returns the platforms.
    #[must_use]
    pub fn platforms(&self) -> Enumerator<'_, Platform<'_>> {
        self.directory(TableKind::Platforms)
    }

    /// Returns the frameworks.
    #[must_use]
    pub fn frameworks(&self) -> Enumerator<'_, Framework<'_>> {
        self.directory(TableKind::Frameworks)
    }

    /// Returns the packages.
    #[must_use]
    pub fn packages(&self) -> Enumerator<'_, Package<'_>> {
        self.directory(TableKind::Packages)
    }

    /// Returns the assemblies.
    #[must_use]
    pub fn assemblies(&self) -> Enumerator<'_, Assembly<'_>> {
        self.directory(TableKind::Assemblies)
    }

    /// Returns the usage sources.
    #[must_use]
    pub fn usage_sources(&self) -> Enumerator<'_, UsageSource<'_>> {
        self.directory(TableKind::UsageSources)
    }

    /// Returns the roots of the API forest, usually namespaces.
    #[must_use]
    pub fn root_apis(&self) -> Enumerator<'_, Api<'_>> {
        self.directory(TableKind::Apis)
    }

    /// Returns every API in pre-order, children in insertion order.
    #[must_use]
    pub fn all_apis(&self) -> Descendants<'_> {
        Descendants::from_roots(self, self.root_apis())
    }

    /// Looks up an API by its stable id.
    ///
    /// The first call builds an index over all APIs. Concurrent first calls may each build it;
    /// one result is kept and the others are dropped.
    #[must_use]
    pub fn api_by_guid(&self, guid: Guid) -> Option<Api<'_>> {
        let index = self.api_index.get_or_init(|| {
            let index: HashMap<Guid, u32> = self
                .all_apis()
                .map(|api| (api.guid(), api.id()))
                .collect();
            debug!(apis = index.len(), "built API id index");
            Box::new(index)
        });

        index.get(&guid).map(|offset| Api::new(self, *offset))
    }

    pub(crate) fn obsoletion(&self, api: i32, assembly: i32) -> Option<Obsoletion<'_>> {
        self.fact_rows(api, assembly).next()
    }

    pub(crate) fn platform_support(
        &self,
        api: i32,
        assembly: i32,
    ) -> FactRows<'_, PlatformSupport<'_>> {
        self.fact_rows(api, assembly)
    }

    pub(crate) fn preview_requirement(
        &self,
        api: i32,
        assembly: i32,
    ) -> Option<PreviewRequirement<'_>> {
        self.fact_rows(api, assembly).next()
    }

    fn fact_rows<'a, T: FactRow<'a>>(&'a self, api: i32, assembly: i32) -> FactRows<'a, T> {
        let row_size = T::TABLE.row_size().unwrap_or(1);
        let run = lookup::rows_with_key(self.table(T::TABLE), row_size, api, assembly);
        FactRows::new(self, run)
    }

    /// Reads the string at `offset` of the string table; negative offsets read as empty.
    pub(crate) fn string(&self, offset: i32) -> &str {
        match usize::try_from(offset) {
            Ok(offset) => str_at(self.table(TableKind::Strings), offset),
            Err(_) => "",
        }
    }

    fn directory<'a, T: crate::model::ArrayElement<'a>>(
        &'a self,
        kind: TableKind,
    ) -> Enumerator<'a, T> {
        if self.table(kind).len() < 4 {
            return Enumerator::empty(self, kind);
        }
        Enumerator::new(self, kind, 0, 0)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("size", &self.data.len())
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::ApiKind, Error};

    fn guid(value: u8) -> Guid {
        let mut bytes = [0u8; 16];
        bytes[15] = value;
        Guid::from_bytes(bytes)
    }

    fn sample() -> Vec<u8> {
        let mut builder = CatalogBuilder::new();
        let framework = builder.add_framework("net8.0");
        let assembly = builder.add_assembly(guid(0xA0), "System.Runtime", "", "8.0.0.0");
        builder.add_framework_assembly(framework, assembly);

        let system = builder.add_api(guid(1), ApiKind::Namespace, None, "System");
        let object = builder.add_api(guid(2), ApiKind::Class, Some(system), "Object");
        let to_string = builder.add_api(guid(3), ApiKind::Method, Some(object), "ToString()");
        let collections = builder.add_api(guid(4), ApiKind::Namespace, None, "System.Collections");
        for api in [system, object, to_string, collections] {
            builder.add_declaration(api, assembly, MarkupBuilder::new());
        }
        builder.add_obsoletion(Some(to_string), assembly, "Use Format", false, "SYSLIB0001", "");
        builder.finish().unwrap()
    }

    #[test]
    fn load_and_enumerate() {
        let catalog = Catalog::from_mem(&sample()).unwrap();

        assert_eq!(catalog.frameworks().len(), 1);
        assert_eq!(catalog.assemblies().len(), 1);
        assert_eq!(catalog.platforms().len(), 0);
        assert_eq!(catalog.packages().len(), 0);

        let names: Vec<&str> = catalog.all_apis().map(|api| api.name()).collect();
        assert_eq!(names, ["System", "Object", "ToString()", "System.Collections"]);
    }

    #[test]
    fn lookup_by_guid() {
        let catalog = Catalog::from_mem(&sample()).unwrap();

        let api = catalog.api_by_guid(guid(3)).unwrap();
        assert_eq!(api.full_name(), "System.Object.ToString()");
        assert!(catalog.api_by_guid(guid(99)).is_none());
        assert_eq!(catalog.api_by_guid(guid(3)), Some(api));
    }

    #[test]
    fn facts_through_views() {
        let catalog = Catalog::from_mem(&sample()).unwrap();
        let to_string = catalog.api_by_guid(guid(3)).unwrap();
        let object = to_string.parent().unwrap();

        let declaration = to_string.declarations().next().unwrap();
        let obsoletion = declaration.obsoletion().unwrap();
        assert_eq!(obsoletion.message(), "Use Format");
        assert_eq!(obsoletion.api(), Some(to_string));
        assert!(object.declarations().next().unwrap().obsoletion().is_none());
        assert_eq!(declaration.platform_support().count(), 0);
        assert!(declaration.assembly().obsoletion().is_none());
    }

    #[test]
    fn views_from_distinct_catalogs_differ() {
        let data = sample();
        let first = Catalog::from_mem(&data).unwrap();
        let second = Catalog::from_mem(&data).unwrap();

        let a = first.root_apis().next().unwrap();
        let b = second.root_apis().next().unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a, b);
        assert_eq!(a, first.root_apis().next().unwrap());
    }

    #[test]
    fn trusted_load_skips_verification() {
        let catalog = Catalog::load_with(sample().as_slice(), LoadOptions::trusted()).unwrap();
        assert_eq!(catalog.all_apis().count(), 4);
    }

    #[test]
    fn reject_truncated_stream() {
        let data = sample();
        let truncated = &data[..data.len() - 8];

        assert!(matches!(
            Catalog::from_mem(truncated),
            Err(Error::Format { .. } | Error::Io(_))
        ));
    }

    #[test]
    fn load_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample()).unwrap();
        file.flush().unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.root_apis().len(), 2);
    }

    #[test]
    fn catalog_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }

    #[test]
    fn concurrent_first_lookup() {
        let data = sample();
        let baseline = Catalog::from_mem(&data).unwrap();
        let guids: Vec<Guid> = baseline
            .all_apis()
            .map(|api| api.guid())
            .chain([guid(0x7F)])
            .collect();
        let expected: Vec<Option<u32>> = guids
            .iter()
            .map(|id| baseline.api_by_guid(*id).map(|api| api.id()))
            .collect();
        assert_eq!(expected.last(), Some(&None));

        for _ in 0..16 {
            let catalog = Catalog::from_mem(&data).unwrap();
            let results: Vec<Vec<Option<u32>>> = std::thread::scope(|scope| {
                let workers: Vec<_> = (0..8)
                    .map(|_| {
                        scope.spawn(|| {
                            guids
                                .iter()
                                .map(|id| catalog.api_by_guid(*id).map(|api| api.id()))
                                .collect()
                        })
                    })
                    .collect();
                workers.into_iter().map(|worker| worker.join().unwrap()).collect()
            });

            for result in results {
                assert_eq!(result, expected);
            }
        }
    }
}
