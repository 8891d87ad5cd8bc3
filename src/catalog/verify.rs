//! Structural verification of a decompressed catalog.
//!
//! Entity views read their fields without bounds checks. Before a buffer is handed to them, the
//! verifier walks every table once with the fallible readers of [`crate::file::io`] and checks
//! that:
//!
//! - every row listed in a table directory, with its fixed fields and inline arrays, lies
//!   inside its table
//! - every string reference decodes as UTF-8, and every markup record is well formed
//! - every cross-table reference points at the start of a listed row (row starts are tracked
//!   in one [`BitSet`] per table)
//! - every API reachable from the root list has a valid kind and points back at the parent
//!   that lists it
//! - fact tables consist of whole rows sorted by `(api, assembly)`, with duplicate keys only in
//!   the platform support table
//!
//! The API forest is assumed to be acyclic. Each API is visited at most once, so a cycle cannot
//! make verification loop, but it is not reported either.

use strum::IntoEnumIterator;
use tracing::trace;

use crate::{
    catalog::layout::{TableKind, TableRange, TABLE_COUNT},
    file::io::{read_guid_at, read_le_at, read_str_at, GUID_SIZE},
    model::{
        api_fields, assembly_fields, fact_fields, framework_fields, package_fields, usage_fields,
        ApiKind, MarkupTokenKind, NO_ROW,
    },
    utils::BitSet,
    Result,
};

/// Number of verified rows per entity table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct VerifySummary {
    pub apis: usize,
    pub assemblies: usize,
    pub frameworks: usize,
    pub packages: usize,
    pub platforms: usize,
    pub usage_sources: usize,
}

/// Verifies the tables of a decompressed catalog.
///
/// # Errors
/// Returns [`crate::Error::Format`] or [`crate::Error::OutOfBounds`] describing the first
/// violation found.
pub(crate) fn verify(data: &[u8], tables: &[TableRange; TABLE_COUNT]) -> Result<VerifySummary> {
    let mut verifier = Verifier::new(data, tables);

    let platforms = verifier.read_directory(TableKind::Platforms)?;
    let frameworks = verifier.read_directory(TableKind::Frameworks)?;
    let packages = verifier.read_directory(TableKind::Packages)?;
    let assemblies = verifier.read_directory(TableKind::Assemblies)?;
    let usage_sources = verifier.read_directory(TableKind::UsageSources)?;
    let roots = verifier.read_directory(TableKind::Apis)?;

    let apis = verifier.verify_apis(&roots)?;

    for row in &platforms {
        verifier.verify_platform(*row)?;
    }
    for row in &frameworks {
        verifier.verify_framework(*row)?;
    }
    for row in &packages {
        verifier.verify_package(*row)?;
    }
    for row in &assemblies {
        verifier.verify_assembly(*row)?;
    }
    for row in &usage_sources {
        verifier.verify_usage_source(*row)?;
    }

    for kind in [
        TableKind::Obsoletions,
        TableKind::PlatformSupport,
        TableKind::PreviewRequirements,
    ] {
        let rows = verifier.verify_facts(kind)?;
        trace!(table = %kind, rows, "verified fact table");
    }

    Ok(VerifySummary {
        apis,
        assemblies: assemblies.len(),
        frameworks: frameworks.len(),
        packages: packages.len(),
        platforms: platforms.len(),
        usage_sources: usage_sources.len(),
    })
}

struct Verifier<'a> {
    data: &'a [u8],
    tables: &'a [TableRange; TABLE_COUNT],
    /// Start offsets of valid rows, indexed by `TableKind`
    rows: Vec<BitSet>,
    /// Start offsets of strings already decoded
    strings: BitSet,
    /// Start offsets of markup records already checked
    markups: BitSet,
}

impl<'a> Verifier<'a> {
    fn new(data: &'a [u8], tables: &'a [TableRange; TABLE_COUNT]) -> Self {
        let rows = TableKind::iter()
            .map(|kind| {
                if kind.has_row_directory() {
                    BitSet::new(tables[kind as usize].length)
                } else {
                    BitSet::new(0)
                }
            })
            .collect();
        let strings_length = tables[TableKind::Strings as usize].length;

        Verifier {
            data,
            tables,
            rows,
            strings: BitSet::new(strings_length),
            markups: BitSet::new(strings_length),
        }
    }

    fn table(&self, kind: TableKind) -> &'a [u8] {
        let range = self.tables[kind as usize];
        self.data
            .get(range.offset..range.end())
            .unwrap_or_default()
    }

    /// Reads the count-prefixed row directory of an entity table.
    ///
    /// Rows of every table but the API table are marked valid. The API directory only lists
    /// roots; API rows are marked while walking the forest.
    fn read_directory(&mut self, kind: TableKind) -> Result<Vec<i32>> {
        let table = self.table(kind);
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let (count, start) = array(table, 0, 4)?;
        let mut rows = Vec::with_capacity(count);
        let mut position = start;
        for _ in 0..count {
            let row: i32 = read_le_at(table, &mut position)?;
            let offset = usize::try_from(row)
                .ok()
                .filter(|offset| *offset < table.len())
                .ok_or_else(|| format_error!("Row offset {} outside the {} table", row, kind))?;

            if kind != TableKind::Apis {
                self.rows[kind as usize].insert(offset);
            }
            rows.push(row);
        }

        trace!(table = %kind, rows = count, "read table directory");
        Ok(rows)
    }

    fn check_reference(&self, kind: TableKind, value: i32, context: &str) -> Result<()> {
        let valid = usize::try_from(value)
            .map(|offset| self.rows[kind as usize].contains(offset))
            .unwrap_or(false);

        if !valid {
            return Err(format_error!(
                "Dangling {} reference {} in {}",
                kind,
                value,
                context
            ));
        }
        Ok(())
    }

    fn check_string(&mut self, value: i32, context: &str) -> Result<()> {
        let offset = usize::try_from(value)
            .map_err(|_| format_error!("Negative string offset {} in {}", value, context))?;
        if self.strings.contains(offset) {
            return Ok(());
        }

        read_str_at(self.table(TableKind::Strings), offset)?;
        self.strings.insert(offset);
        Ok(())
    }

    fn check_markup(&mut self, value: i32) -> Result<()> {
        let offset = usize::try_from(value)
            .map_err(|_| format_error!("Negative markup offset {}", value))?;
        if self.markups.contains(offset) {
            return Ok(());
        }

        let strings = self.table(TableKind::Strings);
        let mut position = offset;
        let count: i32 = read_le_at(strings, &mut position)?;
        if count < 0 {
            return Err(format_error!(
                "Negative token count {} in markup at {}",
                count,
                offset
            ));
        }

        for _ in 0..count {
            let kind: u8 = read_le_at(strings, &mut position)?;
            let kind = MarkupTokenKind::from_repr(kind).ok_or_else(|| {
                format_error!("Invalid markup token kind {} in markup at {}", kind, offset)
            })?;
            let text: i32 = read_le_at(strings, &mut position)?;
            self.check_string(text, "markup token")?;

            if kind == MarkupTokenKind::Reference {
                read_guid_at(strings, position)?;
                position += GUID_SIZE;
            }
        }

        self.markups.insert(offset);
        Ok(())
    }

    /// Walks the API forest from its roots, returning the number of APIs visited.
    fn verify_apis(&mut self, roots: &[i32]) -> Result<usize> {
        let table = self.table(TableKind::Apis);
        let mut visited = BitSet::new(table.len());
        let mut stack: Vec<(i32, i32)> = roots.iter().rev().map(|root| (*root, NO_ROW)).collect();

        while let Some((value, parent)) = stack.pop() {
            let offset = usize::try_from(value)
                .ok()
                .filter(|offset| *offset < table.len())
                .ok_or_else(|| format_error!("API offset {} outside the API table", value))?;
            if !visited.insert(offset) {
                continue;
            }

            read_guid_at(table, offset + api_fields::GUID)?;

            let mut position = offset + api_fields::KIND;
            let kind: u8 = read_le_at(table, &mut position)?;
            if ApiKind::from_repr(kind).is_none() {
                return Err(format_error!("Invalid kind {} of API at {}", kind, offset));
            }

            let stored_parent: i32 = read_le_at(table, &mut position)?;
            if stored_parent != parent {
                return Err(format_error!(
                    "API at {} has parent {} but is listed under {}",
                    offset,
                    stored_parent,
                    parent
                ));
            }

            let name: i32 = read_le_at(table, &mut position)?;
            self.check_string(name, "API name")?;

            let (children, mut position) = array(table, offset + api_fields::CHILDREN, 4)?;
            let mut child_values = Vec::with_capacity(children);
            for _ in 0..children {
                child_values.push(read_le_at::<i32>(table, &mut position)?);
            }
            stack.extend(child_values.into_iter().rev().map(|child| (child, value)));

            let (declarations, mut position) =
                array(table, position, api_fields::DECLARATION_SIZE)?;
            for _ in 0..declarations {
                let assembly: i32 = read_le_at(table, &mut position)?;
                self.check_reference(TableKind::Assemblies, assembly, "API declaration")?;
                let markup: i32 = read_le_at(table, &mut position)?;
                self.check_markup(markup)?;
            }

            let (usages, mut position) = array(table, position, api_fields::USAGE_SIZE)?;
            for _ in 0..usages {
                let source: i32 = read_le_at(table, &mut position)?;
                self.check_reference(TableKind::UsageSources, source, "API usage")?;
                read_le_at::<f32>(table, &mut position)?;
            }
        }

        let count = visited.count();
        self.rows[TableKind::Apis as usize] = visited;
        Ok(count)
    }

    fn string_field(&mut self, kind: TableKind, row: usize, field: usize) -> Result<()> {
        let mut position = row + field;
        let value: i32 = read_le_at(self.table(kind), &mut position)?;
        self.check_string(value, &format!("{kind} row {row}"))
    }

    fn verify_platform(&mut self, row: i32) -> Result<()> {
        let row = row_start(row);
        self.string_field(TableKind::Platforms, row, 0)
    }

    fn verify_framework(&mut self, row: i32) -> Result<()> {
        let row = row_start(row);
        let table = self.table(TableKind::Frameworks);
        self.string_field(TableKind::Frameworks, row, framework_fields::NAME)?;

        let (count, mut position) = array(table, row + framework_fields::ASSEMBLIES, 4)?;
        for _ in 0..count {
            let assembly: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Assemblies, assembly, "framework")?;
        }
        Ok(())
    }

    fn verify_package(&mut self, row: i32) -> Result<()> {
        let row = row_start(row);
        let table = self.table(TableKind::Packages);
        self.string_field(TableKind::Packages, row, package_fields::NAME)?;
        self.string_field(TableKind::Packages, row, package_fields::VERSION)?;

        let (count, mut position) = array(table, row + package_fields::ASSEMBLIES, 8)?;
        for _ in 0..count {
            let framework: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Frameworks, framework, "package folder")?;
            let assembly: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Assemblies, assembly, "package folder")?;
        }
        Ok(())
    }

    fn verify_assembly(&mut self, row: i32) -> Result<()> {
        let row = row_start(row);
        let table = self.table(TableKind::Assemblies);

        read_guid_at(table, row + assembly_fields::GUID)?;
        self.string_field(TableKind::Assemblies, row, assembly_fields::NAME)?;
        self.string_field(TableKind::Assemblies, row, assembly_fields::PUBLIC_KEY_TOKEN)?;
        self.string_field(TableKind::Assemblies, row, assembly_fields::VERSION)?;

        let (count, mut position) = array(table, row + assembly_fields::ROOT_APIS, 4)?;
        for _ in 0..count {
            let api: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Apis, api, "assembly root APIs")?;
        }

        let (count, mut position) = array(table, position, 4)?;
        for _ in 0..count {
            let framework: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Frameworks, framework, "assembly frameworks")?;
        }

        let (count, mut position) = array(table, position, assembly_fields::PACKAGE_SIZE)?;
        for _ in 0..count {
            let package: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Packages, package, "assembly packages")?;
            let framework: i32 = read_le_at(table, &mut position)?;
            self.check_reference(TableKind::Frameworks, framework, "assembly packages")?;
        }
        Ok(())
    }

    fn verify_usage_source(&mut self, row: i32) -> Result<()> {
        let row = row_start(row);
        self.string_field(TableKind::UsageSources, row, usage_fields::NAME)?;

        let mut position = row + usage_fields::DAY_NUMBER;
        read_le_at::<i32>(self.table(TableKind::UsageSources), &mut position)?;
        Ok(())
    }

    /// Verifies a fixed-row fact table, returning its row count.
    fn verify_facts(&mut self, kind: TableKind) -> Result<usize> {
        let Some(row_size) = kind.row_size() else {
            return Ok(0);
        };
        let table = self.table(kind);
        if table.len() % row_size != 0 {
            return Err(format_error!(
                "{} table length {} is not a multiple of {}",
                kind,
                table.len(),
                row_size
            ));
        }

        let rows = table.len() / row_size;
        let mut previous: Option<(i32, i32)> = None;
        for row in 0..rows {
            let base = row * row_size;
            let mut position = base;
            let api: i32 = read_le_at(table, &mut position)?;
            let assembly: i32 = read_le_at(table, &mut position)?;

            if api != NO_ROW {
                self.check_reference(TableKind::Apis, api, "fact row")?;
            }
            self.check_reference(TableKind::Assemblies, assembly, "fact row")?;

            let key = (api, assembly);
            if let Some(previous) = previous {
                if key < previous {
                    return Err(format_error!("{} table is not sorted at row {}", kind, row));
                }
                if key == previous && kind != TableKind::PlatformSupport {
                    return Err(format_error!(
                        "Duplicate key ({}, {}) in {} table",
                        api,
                        assembly,
                        kind
                    ));
                }
            }
            previous = Some(key);

            match kind {
                TableKind::Obsoletions => {
                    self.string_field(kind, base, fact_fields::OBSOLETION_MESSAGE)?;
                    self.string_field(kind, base, fact_fields::OBSOLETION_DIAGNOSTIC_ID)?;
                    self.string_field(kind, base, fact_fields::OBSOLETION_URL_FORMAT)?;
                }
                TableKind::PlatformSupport => {
                    self.string_field(kind, base, fact_fields::PLATFORM_SUPPORT_PLATFORM)?;
                }
                _ => {
                    self.string_field(kind, base, fact_fields::PREVIEW_MESSAGE)?;
                    self.string_field(kind, base, fact_fields::PREVIEW_URL)?;
                }
            }
        }

        Ok(rows)
    }
}

/// Converts a directory entry, already bounds checked, into a row start.
fn row_start(row: i32) -> usize {
    usize::try_from(row).unwrap_or_default()
}

/// Checks the count-prefixed array at `position`, returning its length and the position of its
/// first element.
fn array(table: &[u8], position: usize, element_size: usize) -> Result<(usize, usize)> {
    let mut start = position;
    let count: i32 = read_le_at(table, &mut start)?;
    let count = usize::try_from(count)
        .map_err(|_| format_error!("Negative array length {} at {}", count, position))?;

    let end = count
        .checked_mul(element_size)
        .and_then(|size| start.checked_add(size))
        .ok_or(crate::Error::OutOfBounds)?;
    if end > table.len() {
        return Err(crate::Error::OutOfBounds);
    }

    Ok((count, start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{builder::CatalogBuilder, loader},
        model::ApiKind,
        Error, LoadOptions,
    };

    fn sample() -> Vec<u8> {
        let mut builder = CatalogBuilder::new();
        let framework = builder.add_framework("net8.0");
        let assembly = builder.add_assembly(
            uguid::guid!("00000000-0000-0000-0000-0000000000a1"),
            "System.Runtime",
            "b03f5f7f11d50a3a",
            "8.0.0.0",
        );
        builder.add_framework_assembly(framework, assembly);
        let namespace = builder.add_api(
            uguid::guid!("00000000-0000-0000-0000-000000000001"),
            ApiKind::Namespace,
            None,
            "System",
        );
        let object = builder.add_api(
            uguid::guid!("00000000-0000-0000-0000-000000000002"),
            ApiKind::Class,
            Some(namespace),
            "Object",
        );
        builder.add_declaration(namespace, assembly, Default::default());
        builder.add_declaration(object, assembly, Default::default());
        builder.add_platform_support(Some(object), assembly, "windows", true);
        builder.add_platform_support(Some(object), assembly, "linux", true);
        builder.finish().unwrap()
    }

    fn split(tables: &[Vec<u8>]) -> (Vec<u8>, [TableRange; TABLE_COUNT]) {
        let mut data = Vec::new();
        let mut ranges = [TableRange::default(); TABLE_COUNT];
        for (index, table) in tables.iter().enumerate() {
            ranges[index] = TableRange {
                offset: data.len(),
                length: table.len(),
            };
            data.extend_from_slice(table);
        }
        (data, ranges)
    }

    fn sample_tables() -> Vec<Vec<u8>> {
        let data = sample();
        let loaded = loader::load(std::io::Cursor::new(data), LoadOptions::trusted()).unwrap();
        loaded
            .tables
            .iter()
            .map(|range| loaded.data[range.offset..range.end()].to_vec())
            .collect()
    }

    #[test]
    fn verify_valid_catalog() {
        let (data, ranges) = split(&sample_tables());
        let summary = verify(&data, &ranges).unwrap();

        assert_eq!(summary.apis, 2);
        assert_eq!(summary.assemblies, 1);
        assert_eq!(summary.frameworks, 1);
        assert_eq!(summary.packages, 0);
    }

    #[test]
    fn reject_dangling_framework_assembly() {
        let mut tables = sample_tables();
        let frameworks = &mut tables[TableKind::Frameworks as usize];
        // directory: count + one row offset; row: name, count, assembly
        let assembly_cell = frameworks.len() - 4;
        frameworks[assembly_cell..].copy_from_slice(&3i32.to_le_bytes());

        let (data, ranges) = split(&tables);
        match verify(&data, &ranges) {
            Err(Error::Format { message, .. }) => assert!(message.contains("Dangling")),
            other => panic!("Expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn reject_invalid_utf8() {
        let mut tables = sample_tables();
        let strings = &mut tables[TableKind::Strings as usize];
        let position = strings.windows(6).position(|w| w == b"net8.0").unwrap();
        strings[position] = 0xFF;

        let (data, ranges) = split(&tables);
        assert!(matches!(verify(&data, &ranges), Err(Error::Format { .. })));
    }

    #[test]
    fn reject_partial_fact_row() {
        let mut tables = sample_tables();
        tables[TableKind::PlatformSupport as usize].pop();

        let (data, ranges) = split(&tables);
        assert!(verify(&data, &ranges).is_err());
    }

    #[test]
    fn reject_duplicate_obsoletion_key() {
        let mut tables = sample_tables();
        let support = tables[TableKind::PlatformSupport as usize].clone();
        // Reuse the two platform support keys as obsoletion rows with the same key.
        let mut obsoletions = Vec::new();
        for row in support.chunks(13) {
            obsoletions.extend_from_slice(&row[..8]);
            obsoletions.extend_from_slice(&row[8..12]);
            obsoletions.push(0);
            obsoletions.extend_from_slice(&row[8..12]);
            obsoletions.extend_from_slice(&row[8..12]);
        }
        tables[TableKind::Obsoletions as usize] = obsoletions;

        let (data, ranges) = split(&tables);
        match verify(&data, &ranges) {
            Err(Error::Format { message, .. }) => assert!(message.contains("Duplicate")),
            other => panic!("Expected duplicate key error, got {other:?}"),
        }
    }

    #[test]
    fn reject_short_array() {
        assert!(matches!(array(&[2, 0, 0, 0, 1, 0, 0, 0], 0, 4), Err(Error::OutOfBounds)));
        assert!(array(&[0xFF, 0xFF, 0xFF, 0xFF], 0, 4).is_err());
        assert_eq!(array(&[1, 0, 0, 0, 1, 0, 0, 0], 0, 4).unwrap(), (1, 4));
    }
}
