//! Writer for the catalog format.
//!
//! [`CatalogBuilder`] collects entities in memory and encodes them into a complete catalog
//! stream: the uncompressed header followed by the DEFLATE-compressed tables. It lays out row
//! offsets, inline arrays, interned strings and markup records exactly as the loader expects,
//! and sorts fact rows by key. It is used to produce fixtures for tests and benchmarks and to
//! re-encode data obtained elsewhere; it does not derive any data on its own beyond the
//! reverse indices stored on assemblies.
//!
//! # Examples
//!
//! ```rust
//! use apicatalog::{
//!     catalog::{CatalogBuilder, MarkupBuilder},
//!     model::ApiKind,
//!     Catalog,
//! };
//! use uguid::guid;
//!
//! let mut builder = CatalogBuilder::new();
//! let framework = builder.add_framework("net8.0");
//! let assembly = builder.add_assembly(
//!     guid!("8d4f2b7e-8a0b-4c1e-9d5f-1a2b3c4d5e6f"),
//!     "System.Runtime",
//!     "b03f5f7f11d50a3a",
//!     "8.0.0.0",
//! );
//! builder.add_framework_assembly(framework, assembly);
//!
//! let system = builder.add_api(guid!("00000000-0000-0000-0000-000000000001"), ApiKind::Namespace, None, "System");
//! let object = builder.add_api(guid!("00000000-0000-0000-0000-000000000002"), ApiKind::Class, Some(system), "Object");
//! builder.add_declaration(system, assembly, MarkupBuilder::new());
//! builder.add_declaration(
//!     object,
//!     assembly,
//!     MarkupBuilder::new().keyword("public").whitespace().keyword("class").whitespace().identifier("Object"),
//! );
//!
//! let data = builder.finish()?;
//! let catalog = Catalog::from_mem(&data)?;
//! assert_eq!(catalog.all_apis().count(), 2);
//! # Ok::<(), apicatalog::Error>(())
//! ```

use std::{collections::HashMap, io::Write};

use chrono::{Datelike, NaiveDate};
use flate2::{write::DeflateEncoder, Compression};
use uguid::Guid;

use crate::{
    catalog::layout::{TableKind, FORMAT_VERSION, MAGIC, TABLE_COUNT},
    file::io::{write_le, write_le_at},
    model::{ApiKind, MarkupTokenKind, NO_ROW},
    Error, Result,
};

macro_rules! builder_handle {
    ($($(#[$attr:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$attr])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(usize);
        )*
    };
}

builder_handle!(
    /// A platform added to a [`CatalogBuilder`].
    PlatformHandle,
    /// A framework added to a [`CatalogBuilder`].
    FrameworkHandle,
    /// A package added to a [`CatalogBuilder`].
    PackageHandle,
    /// An assembly added to a [`CatalogBuilder`].
    AssemblyHandle,
    /// A usage source added to a [`CatalogBuilder`].
    UsageSourceHandle,
    /// An API added to a [`CatalogBuilder`].
    ApiHandle,
);

/// Token sequence of a declaration's signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkupBuilder {
    tokens: Vec<(MarkupTokenKind, String, Option<Guid>)>,
}

impl MarkupBuilder {
    /// Creates an empty markup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a token of any kind but [`MarkupTokenKind::Reference`].
    #[must_use]
    pub fn token(mut self, kind: MarkupTokenKind, text: impl Into<String>) -> Self {
        self.tokens.push((kind, text.into(), None));
        self
    }

    /// Appends a reference to another API; `None` stores an unresolved reference.
    #[must_use]
    pub fn reference(mut self, text: impl Into<String>, api: Option<Guid>) -> Self {
        self.tokens
            .push((MarkupTokenKind::Reference, text.into(), Some(api.unwrap_or(Guid::ZERO))));
        self
    }

    /// Appends a keyword.
    #[must_use]
    pub fn keyword(self, text: impl Into<String>) -> Self {
        self.token(MarkupTokenKind::Keyword, text)
    }

    /// Appends punctuation.
    #[must_use]
    pub fn punctuation(self, text: impl Into<String>) -> Self {
        self.token(MarkupTokenKind::Punctuation, text)
    }

    /// Appends an identifier.
    #[must_use]
    pub fn identifier(self, text: impl Into<String>) -> Self {
        self.token(MarkupTokenKind::Identifier, text)
    }

    /// Appends a string literal, including its quotes.
    #[must_use]
    pub fn string_literal(self, text: impl Into<String>) -> Self {
        self.token(MarkupTokenKind::LiteralString, text)
    }

    /// Appends a numeric literal.
    #[must_use]
    pub fn number_literal(self, text: impl Into<String>) -> Self {
        self.token(MarkupTokenKind::LiteralNumber, text)
    }

    /// Appends a single space.
    #[must_use]
    pub fn whitespace(self) -> Self {
        self.token(MarkupTokenKind::Whitespace, " ")
    }

    /// Appends a line break.
    #[must_use]
    pub fn line_break(self) -> Self {
        self.token(MarkupTokenKind::LineBreak, "")
    }
}

struct FrameworkEntry {
    name: String,
    assemblies: Vec<usize>,
}

struct PackageEntry {
    name: String,
    version: String,
    folders: Vec<(usize, usize)>,
}

struct AssemblyEntry {
    guid: Guid,
    name: String,
    public_key_token: String,
    version: String,
}

struct UsageSourceEntry {
    name: String,
    date: NaiveDate,
}

struct ApiEntry {
    guid: Guid,
    kind: ApiKind,
    parent: Option<usize>,
    name: String,
    children: Vec<usize>,
    declarations: Vec<(usize, MarkupBuilder)>,
    usages: Vec<(usize, f32)>,
}

enum FactEntry {
    Obsoletion {
        message: String,
        is_error: bool,
        diagnostic_id: String,
        url_format: String,
    },
    PlatformSupport {
        platform: String,
        is_supported: bool,
    },
    PreviewRequirement {
        message: String,
        url: String,
    },
}

impl FactEntry {
    fn table(&self) -> TableKind {
        match self {
            FactEntry::Obsoletion { .. } => TableKind::Obsoletions,
            FactEntry::PlatformSupport { .. } => TableKind::PlatformSupport,
            FactEntry::PreviewRequirement { .. } => TableKind::PreviewRequirements,
        }
    }
}

/// Collects catalog entities and encodes them into the catalog format.
///
/// Handles returned by the `add_*` methods are only valid for the builder that created them;
/// passing a handle from another builder may panic.
#[derive(Default)]
pub struct CatalogBuilder {
    platforms: Vec<String>,
    frameworks: Vec<FrameworkEntry>,
    packages: Vec<PackageEntry>,
    assemblies: Vec<AssemblyEntry>,
    usage_sources: Vec<UsageSourceEntry>,
    apis: Vec<ApiEntry>,
    facts: Vec<(Option<usize>, usize, FactEntry)>,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a platform name.
    pub fn add_platform(&mut self, name: impl Into<String>) -> PlatformHandle {
        self.platforms.push(name.into());
        PlatformHandle(self.platforms.len() - 1)
    }

    /// Adds a framework, e.g. `net8.0`.
    pub fn add_framework(&mut self, name: impl Into<String>) -> FrameworkHandle {
        self.frameworks.push(FrameworkEntry {
            name: name.into(),
            assemblies: Vec::new(),
        });
        FrameworkHandle(self.frameworks.len() - 1)
    }

    /// Adds a package version.
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> PackageHandle {
        self.packages.push(PackageEntry {
            name: name.into(),
            version: version.into(),
            folders: Vec::new(),
        });
        PackageHandle(self.packages.len() - 1)
    }

    /// Adds an assembly.
    pub fn add_assembly(
        &mut self,
        guid: Guid,
        name: impl Into<String>,
        public_key_token: impl Into<String>,
        version: impl Into<String>,
    ) -> AssemblyHandle {
        self.assemblies.push(AssemblyEntry {
            guid,
            name: name.into(),
            public_key_token: public_key_token.into(),
            version: version.into(),
        });
        AssemblyHandle(self.assemblies.len() - 1)
    }

    /// Adds a usage source collected at `date`.
    pub fn add_usage_source(
        &mut self,
        name: impl Into<String>,
        date: NaiveDate,
    ) -> UsageSourceHandle {
        self.usage_sources.push(UsageSourceEntry {
            name: name.into(),
            date,
        });
        UsageSourceHandle(self.usage_sources.len() - 1)
    }

    /// Adds an API as the last child of `parent`, or as a new root.
    pub fn add_api(
        &mut self,
        guid: Guid,
        kind: ApiKind,
        parent: Option<ApiHandle>,
        name: impl Into<String>,
    ) -> ApiHandle {
        let index = self.apis.len();
        self.apis.push(ApiEntry {
            guid,
            kind,
            parent: parent.map(|parent| parent.0),
            name: name.into(),
            children: Vec::new(),
            declarations: Vec::new(),
            usages: Vec::new(),
        });
        if let Some(parent) = parent {
            self.apis[parent.0].children.push(index);
        }
        ApiHandle(index)
    }

    /// Ships `assembly` in-box with `framework`.
    pub fn add_framework_assembly(&mut self, framework: FrameworkHandle, assembly: AssemblyHandle) {
        self.frameworks[framework.0].assemblies.push(assembly.0);
    }

    /// Places `assembly` in the `framework` folder of `package`.
    pub fn add_package_assembly(
        &mut self,
        package: PackageHandle,
        framework: FrameworkHandle,
        assembly: AssemblyHandle,
    ) {
        self.packages[package.0]
            .folders
            .push((framework.0, assembly.0));
    }

    /// Declares `api` in `assembly` with the given signature.
    pub fn add_declaration(&mut self, api: ApiHandle, assembly: AssemblyHandle, markup: MarkupBuilder) {
        self.apis[api.0].declarations.push((assembly.0, markup));
    }

    /// Records the usage share of `api` in `source`.
    pub fn add_usage(&mut self, api: ApiHandle, source: UsageSourceHandle, percentage: f32) {
        self.apis[api.0].usages.push((source.0, percentage));
    }

    /// Marks `api` (or the whole assembly for `None`) obsolete in `assembly`.
    pub fn add_obsoletion(
        &mut self,
        api: Option<ApiHandle>,
        assembly: AssemblyHandle,
        message: impl Into<String>,
        is_error: bool,
        diagnostic_id: impl Into<String>,
        url_format: impl Into<String>,
    ) {
        self.facts.push((
            api.map(|api| api.0),
            assembly.0,
            FactEntry::Obsoletion {
                message: message.into(),
                is_error,
                diagnostic_id: diagnostic_id.into(),
                url_format: url_format.into(),
            },
        ));
    }

    /// Adds a platform support row for `api` (or the whole assembly for `None`) in `assembly`.
    ///
    /// Several rows may share one `(api, assembly)` key; they keep their insertion order.
    pub fn add_platform_support(
        &mut self,
        api: Option<ApiHandle>,
        assembly: AssemblyHandle,
        platform: impl Into<String>,
        is_supported: bool,
    ) {
        self.facts.push((
            api.map(|api| api.0),
            assembly.0,
            FactEntry::PlatformSupport {
                platform: platform.into(),
                is_supported,
            },
        ));
    }

    /// Marks `api` (or the whole assembly for `None`) as requiring preview features.
    pub fn add_preview_requirement(
        &mut self,
        api: Option<ApiHandle>,
        assembly: AssemblyHandle,
        message: impl Into<String>,
        url: impl Into<String>,
    ) {
        self.facts.push((
            api.map(|api| api.0),
            assembly.0,
            FactEntry::PreviewRequirement {
                message: message.into(),
                url: url.into(),
            },
        ));
    }

    /// Encodes the catalog into a new buffer.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if an obsoletion or preview requirement key was added twice,
    /// and [`Error::Format`] if a table would exceed the 2 GiB addressable by the format.
    pub fn finish(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.write_to(&mut data)?;
        Ok(data)
    }

    /// Encodes the catalog into `writer`.
    ///
    /// # Errors
    /// Same as [`CatalogBuilder::finish`], plus [`Error::Io`] for write failures.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let tables = self.encode_tables()?;

        let mut header = MAGIC.to_vec();
        write_le(&mut header, FORMAT_VERSION);
        write_le(&mut header, to_i32(TABLE_COUNT)?);
        for table in &tables {
            write_le(&mut header, to_i32(table.len())?);
        }
        writer.write_all(&header)?;

        let mut encoder = DeflateEncoder::new(writer, Compression::default());
        for table in &tables {
            encoder.write_all(table)?;
        }
        encoder.finish()?;
        Ok(())
    }

    fn encode_tables(&self) -> Result<Vec<Vec<u8>>> {
        let layout = Layout::compute(self)?;
        let mut strings = StringTable::default();

        let mut tables = vec![Vec::new(); TABLE_COUNT];
        tables[TableKind::Platforms as usize] = self.encode_platforms(&mut strings)?;
        tables[TableKind::Frameworks as usize] = self.encode_frameworks(&layout, &mut strings)?;
        tables[TableKind::Packages as usize] = self.encode_packages(&layout, &mut strings)?;
        tables[TableKind::Assemblies as usize] = self.encode_assemblies(&layout, &mut strings)?;
        tables[TableKind::UsageSources as usize] = self.encode_usage_sources(&mut strings)?;
        tables[TableKind::Apis as usize] = self.encode_apis(&layout, &mut strings)?;

        for (kind, table) in self.encode_facts(&layout, &mut strings)? {
            tables[kind as usize] = table;
        }
        tables[TableKind::Strings as usize] = strings.data;

        Ok(tables)
    }

    fn encode_platforms(&self, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = directory(self.platforms.len())?;
        for (index, name) in self.platforms.iter().enumerate() {
            let offset = table.len();
            set_row(&mut table, index, offset)?;
            write_le(&mut table, strings.intern(name)?);
        }
        Ok(table)
    }

    fn encode_frameworks(&self, layout: &Layout, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = directory(self.frameworks.len())?;
        for (index, framework) in self.frameworks.iter().enumerate() {
            let offset = table.len();
            set_row(&mut table, index, offset)?;
            write_le(&mut table, strings.intern(&framework.name)?);
            write_le(&mut table, to_i32(framework.assemblies.len())?);
            for assembly in &framework.assemblies {
                write_le(&mut table, layout.assemblies[*assembly]);
            }
        }
        Ok(table)
    }

    fn encode_packages(&self, layout: &Layout, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = directory(self.packages.len())?;
        for (index, package) in self.packages.iter().enumerate() {
            let offset = table.len();
            set_row(&mut table, index, offset)?;
            write_le(&mut table, strings.intern(&package.name)?);
            write_le(&mut table, strings.intern(&package.version)?);
            write_le(&mut table, to_i32(package.folders.len())?);
            for (framework, assembly) in &package.folders {
                write_le(&mut table, layout.frameworks[*framework]);
                write_le(&mut table, layout.assemblies[*assembly]);
            }
        }
        Ok(table)
    }

    fn encode_assemblies(&self, layout: &Layout, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = directory(self.assemblies.len())?;
        for (index, assembly) in self.assemblies.iter().enumerate() {
            let offset = table.len();
            set_row(&mut table, index, offset)?;
            table.extend_from_slice(&assembly.guid.to_bytes());
            write_le(&mut table, strings.intern(&assembly.name)?);
            write_le(&mut table, strings.intern(&assembly.public_key_token)?);
            write_le(&mut table, strings.intern(&assembly.version)?);

            let roots = &layout.assembly_roots[index];
            write_le(&mut table, to_i32(roots.len())?);
            for api in roots {
                write_le(&mut table, layout.apis[*api]);
            }

            let frameworks = &layout.assembly_frameworks[index];
            write_le(&mut table, to_i32(frameworks.len())?);
            for framework in frameworks {
                write_le(&mut table, layout.frameworks[*framework]);
            }

            let packages = &layout.assembly_packages[index];
            write_le(&mut table, to_i32(packages.len())?);
            for (package, framework) in packages {
                write_le(&mut table, layout.packages[*package]);
                write_le(&mut table, layout.frameworks[*framework]);
            }
        }
        Ok(table)
    }

    fn encode_usage_sources(&self, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = directory(self.usage_sources.len())?;
        for (index, source) in self.usage_sources.iter().enumerate() {
            let offset = table.len();
            set_row(&mut table, index, offset)?;
            write_le(&mut table, strings.intern(&source.name)?);
            write_le(&mut table, source.date.num_days_from_ce());
        }
        Ok(table)
    }

    fn encode_apis(&self, layout: &Layout, strings: &mut StringTable) -> Result<Vec<u8>> {
        let mut table = Vec::new();
        write_le(&mut table, to_i32(layout.api_roots.len())?);
        for root in &layout.api_roots {
            write_le(&mut table, layout.apis[*root]);
        }

        for api in &self.apis {
            table.extend_from_slice(&api.guid.to_bytes());
            write_le(&mut table, api.kind as u8);
            write_le(
                &mut table,
                api.parent.map_or(NO_ROW, |parent| layout.apis[parent]),
            );
            write_le(&mut table, strings.intern(&api.name)?);

            write_le(&mut table, to_i32(api.children.len())?);
            for child in &api.children {
                write_le(&mut table, layout.apis[*child]);
            }

            write_le(&mut table, to_i32(api.declarations.len())?);
            for (assembly, markup) in &api.declarations {
                write_le(&mut table, layout.assemblies[*assembly]);
                write_le(&mut table, strings.markup(markup)?);
            }

            write_le(&mut table, to_i32(api.usages.len())?);
            for (source, percentage) in &api.usages {
                write_le(&mut table, layout.usage_sources[*source]);
                write_le(&mut table, *percentage);
            }
        }
        Ok(table)
    }

    fn encode_facts(
        &self,
        layout: &Layout,
        strings: &mut StringTable,
    ) -> Result<Vec<(TableKind, Vec<u8>)>> {
        let mut keyed: Vec<((i32, i32), &FactEntry)> = self
            .facts
            .iter()
            .map(|(api, assembly, fact)| {
                let api = api.map_or(NO_ROW, |api| layout.apis[api]);
                ((api, layout.assemblies[*assembly]), fact)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);

        let mut output = Vec::new();
        for kind in [
            TableKind::Obsoletions,
            TableKind::PlatformSupport,
            TableKind::PreviewRequirements,
        ] {
            let mut table = Vec::new();
            let mut previous = None;
            for ((api, assembly), fact) in keyed.iter().filter(|(_, fact)| fact.table() == kind) {
                if previous == Some((*api, *assembly)) && kind != TableKind::PlatformSupport {
                    return Err(Error::Argument(format!(
                        "Duplicate {kind} row for api {api}, assembly {assembly}"
                    )));
                }
                previous = Some((*api, *assembly));

                write_le(&mut table, *api);
                write_le(&mut table, *assembly);
                match fact {
                    FactEntry::Obsoletion {
                        message,
                        is_error,
                        diagnostic_id,
                        url_format,
                    } => {
                        write_le(&mut table, strings.intern(message)?);
                        write_le(&mut table, u8::from(*is_error));
                        write_le(&mut table, strings.intern(diagnostic_id)?);
                        write_le(&mut table, strings.intern(url_format)?);
                    }
                    FactEntry::PlatformSupport {
                        platform,
                        is_supported,
                    } => {
                        write_le(&mut table, strings.intern(platform)?);
                        write_le(&mut table, u8::from(*is_supported));
                    }
                    FactEntry::PreviewRequirement { message, url } => {
                        write_le(&mut table, strings.intern(message)?);
                        write_le(&mut table, strings.intern(url)?);
                    }
                }
            }
            output.push((kind, table));
        }
        Ok(output)
    }
}

/// Row offsets of every entity and the reverse indices stored on assemblies.
struct Layout {
    frameworks: Vec<i32>,
    packages: Vec<i32>,
    assemblies: Vec<i32>,
    usage_sources: Vec<i32>,
    apis: Vec<i32>,
    api_roots: Vec<usize>,
    assembly_roots: Vec<Vec<usize>>,
    assembly_frameworks: Vec<Vec<usize>>,
    assembly_packages: Vec<Vec<(usize, usize)>>,
}

impl Layout {
    fn compute(builder: &CatalogBuilder) -> Result<Layout> {
        let assembly_count = builder.assemblies.len();

        let mut assembly_frameworks = vec![Vec::new(); assembly_count];
        for (index, framework) in builder.frameworks.iter().enumerate() {
            for assembly in &framework.assemblies {
                if !assembly_frameworks[*assembly].contains(&index) {
                    assembly_frameworks[*assembly].push(index);
                }
            }
        }

        let mut assembly_packages = vec![Vec::new(); assembly_count];
        for (index, package) in builder.packages.iter().enumerate() {
            for (framework, assembly) in &package.folders {
                assembly_packages[*assembly].push((index, *framework));
            }
        }

        let mut assembly_roots: Vec<Vec<usize>> = vec![Vec::new(); assembly_count];
        for (index, api) in builder.apis.iter().enumerate() {
            let root = root_of(builder, index);
            for (assembly, _) in &api.declarations {
                if !assembly_roots[*assembly].contains(&root) {
                    assembly_roots[*assembly].push(root);
                }
            }
        }

        let api_roots: Vec<usize> = builder
            .apis
            .iter()
            .enumerate()
            .filter(|(_, api)| api.parent.is_none())
            .map(|(index, _)| index)
            .collect();

        let frameworks = row_offsets(
            builder
                .frameworks
                .iter()
                .map(|framework| 8 + 4 * framework.assemblies.len()),
        )?;
        let packages = row_offsets(
            builder
                .packages
                .iter()
                .map(|package| 12 + 8 * package.folders.len()),
        )?;
        let assemblies = row_offsets((0..assembly_count).map(|index| {
            28 + 4
                + 4 * assembly_roots[index].len()
                + 4
                + 4 * assembly_frameworks[index].len()
                + 4
                + 8 * assembly_packages[index].len()
        }))?;
        let usage_sources = row_offsets(builder.usage_sources.iter().map(|_| 8))?;

        let mut apis = Vec::with_capacity(builder.apis.len());
        let mut offset = 4 + 4 * api_roots.len();
        for api in &builder.apis {
            apis.push(to_i32(offset)?);
            offset += 25
                + 4
                + 4 * api.children.len()
                + 4
                + 8 * api.declarations.len()
                + 4
                + 8 * api.usages.len();
        }

        Ok(Layout {
            frameworks,
            packages,
            assemblies,
            usage_sources,
            apis,
            api_roots,
            assembly_roots,
            assembly_frameworks,
            assembly_packages,
        })
    }
}

fn root_of(builder: &CatalogBuilder, mut index: usize) -> usize {
    while let Some(parent) = builder.apis[index].parent {
        index = parent;
    }
    index
}

/// Computes row offsets of a table with a directory, given the size of each row.
fn row_offsets(sizes: impl ExactSizeIterator<Item = usize>) -> Result<Vec<i32>> {
    let mut offset = 4 + 4 * sizes.len();
    let mut offsets = Vec::with_capacity(sizes.len());
    for size in sizes {
        offsets.push(to_i32(offset)?);
        offset += size;
    }
    Ok(offsets)
}

/// Starts a table with a directory of `count` zeroed row offsets.
fn directory(count: usize) -> Result<Vec<u8>> {
    let mut table = Vec::new();
    write_le(&mut table, to_i32(count)?);
    table.resize(4 + 4 * count, 0);
    Ok(table)
}

/// Fills in the directory entry of row `index`.
fn set_row(table: &mut [u8], index: usize, offset: usize) -> Result<()> {
    write_le_at(table, 4 + 4 * index, to_i32(offset)?)
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| format_error!("Value {} exceeds the 2 GiB limit of the format", value))
}

/// Interned strings and markup records.
#[derive(Default)]
struct StringTable {
    data: Vec<u8>,
    index: HashMap<String, i32>,
}

impl StringTable {
    fn intern(&mut self, value: &str) -> Result<i32> {
        if let Some(offset) = self.index.get(value) {
            return Ok(*offset);
        }

        let offset = to_i32(self.data.len())?;
        write_le(&mut self.data, to_i32(value.len())?);
        self.data.extend_from_slice(value.as_bytes());
        self.index.insert(value.to_string(), offset);
        Ok(offset)
    }

    fn markup(&mut self, markup: &MarkupBuilder) -> Result<i32> {
        let texts = markup
            .tokens
            .iter()
            .map(|(_, text, _)| self.intern(text))
            .collect::<Result<Vec<i32>>>()?;

        let offset = to_i32(self.data.len())?;
        write_le(&mut self.data, to_i32(markup.tokens.len())?);
        for ((kind, _, reference), text) in markup.tokens.iter().zip(texts) {
            write_le(&mut self.data, *kind as u8);
            write_le(&mut self.data, text);
            if *kind == MarkupTokenKind::Reference {
                self.data
                    .extend_from_slice(&reference.unwrap_or(Guid::ZERO).to_bytes());
            }
        }
        Ok(offset)
    }
}
