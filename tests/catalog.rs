//! Integration tests for catalog loading, enumeration, fact lookup and API ordering.
//!
//! Catalogs are produced with [`CatalogBuilder`], written to bytes and loaded back, so every
//! test goes through the full encode/decode path.

use apicatalog::{catalog::TableKind, prelude::*};
use chrono::NaiveDate;
use proptest::prelude::*;

fn guid(value: u16) -> Guid {
    let mut bytes = [0u8; 16];
    bytes[0..2].copy_from_slice(&value.to_le_bytes());
    Guid::from_bytes(bytes)
}

/// A small catalog with one of everything.
fn build_sample() -> Result<Vec<u8>> {
    let mut builder = CatalogBuilder::new();

    builder.add_platform("windows");
    builder.add_platform("linux");
    let net6 = builder.add_framework("net6.0");
    let net8 = builder.add_framework("net8.0");
    let runtime = builder.add_assembly(guid(0x100), "System.Runtime", "b03f5f7f11d50a3a", "8.0.0.0");
    let json = builder.add_assembly(guid(0x101), "System.Text.Json", "cc7b13ffcd2ddd51", "8.0.0.0");
    builder.add_framework_assembly(net6, runtime);
    builder.add_framework_assembly(net8, runtime);
    builder.add_framework_assembly(net8, json);
    let package = builder.add_package("System.Text.Json", "8.0.4");
    builder.add_package_assembly(package, net6, json);

    let nuget = builder.add_usage_source(
        "nuget.org",
        NaiveDate::from_ymd_opt(2024, 3, 1).ok_or(Error::Argument("date".into()))?,
    );

    let system = builder.add_api(guid(1), ApiKind::Namespace, None, "System");
    let string = builder.add_api(guid(2), ApiKind::Class, Some(system), "String");
    let length = builder.add_api(guid(3), ApiKind::Property, Some(string), "Length");
    let getter = builder.add_api(guid(4), ApiKind::PropertyGetter, Some(length), "get_Length()");
    let json_ns = builder.add_api(guid(5), ApiKind::Namespace, None, "System.Text.Json");
    let serializer = builder.add_api(guid(6), ApiKind::Class, Some(json_ns), "JsonSerializer");

    for api in [system, string, length, getter] {
        builder.add_declaration(api, runtime, MarkupBuilder::new().identifier("decl"));
    }
    builder.add_declaration(
        string,
        json,
        MarkupBuilder::new()
            .keyword("public")
            .whitespace()
            .reference("String", Some(guid(2))),
    );
    builder.add_declaration(json_ns, json, MarkupBuilder::new());
    builder.add_declaration(serializer, json, MarkupBuilder::new());

    builder.add_usage(string, nuget, 0.98);
    builder.add_usage(serializer, nuget, 0.41);

    builder.add_obsoletion(Some(getter), runtime, "Do not use", true, "SYSLIB0042", "https://aka.ms/{0}");
    builder.add_preview_requirement(None, json, "Preview assembly", "https://aka.ms/preview");

    builder.add_platform_support(Some(string), runtime, "windows", true);
    builder.add_platform_support(Some(string), runtime, "linux", true);
    builder.add_platform_support(Some(string), runtime, "browser", false);
    builder.add_platform_support(None, runtime, "ios", false);
    builder.add_platform_support(Some(serializer), json, "windows10.0", true);

    builder.finish()
}

/// Every enumerator and accessor reads back what was written.
#[test]
fn test_round_trip_enumeration() -> Result<()> {
    let catalog = Catalog::from_mem(&build_sample()?)?;

    let platforms: Vec<&str> = catalog.platforms().map(|p| p.name()).collect();
    assert_eq!(platforms, ["windows", "linux"]);

    let frameworks: Vec<&str> = catalog.frameworks().map(|f| f.name()).collect();
    assert_eq!(frameworks, ["net6.0", "net8.0"]);
    let net8 = catalog.frameworks().get(1).ok_or(Error::Argument("net8.0".into()))?;
    let assemblies: Vec<&str> = net8.assemblies().map(|a| a.name()).collect();
    assert_eq!(assemblies, ["System.Runtime", "System.Text.Json"]);

    let package = catalog.packages().next().ok_or(Error::Argument("package".into()))?;
    assert_eq!((package.name(), package.version()), ("System.Text.Json", "8.0.4"));
    let contents: Vec<(&str, &str)> = package
        .assemblies()
        .map(|(framework, assembly)| (framework.name(), assembly.name()))
        .collect();
    assert_eq!(contents, [("net6.0", "System.Text.Json")]);

    let json = catalog.assemblies().get(1).ok_or(Error::Argument("json".into()))?;
    assert_eq!(json.guid(), guid(0x101));
    assert_eq!(json.public_key_token(), "cc7b13ffcd2ddd51");
    assert_eq!(json.version(), "8.0.0.0");
    let roots: Vec<String> = json.root_apis().map(|api| api.full_name()).collect();
    assert_eq!(roots, ["System", "System.Text.Json"]);
    assert_eq!(json.frameworks().map(|f| f.name()).collect::<Vec<_>>(), ["net8.0"]);
    let (owner, folder) = json.packages().next().ok_or(Error::Argument("folder".into()))?;
    assert_eq!((owner, folder.name()), (package, "net6.0"));

    let source = catalog.usage_sources().next().ok_or(Error::Argument("source".into()))?;
    assert_eq!(source.name(), "nuget.org");
    assert_eq!(source.date(), NaiveDate::from_ymd_opt(2024, 3, 1));

    let names: Vec<String> = catalog.all_apis().map(|api| api.full_name()).collect();
    assert_eq!(
        names,
        [
            "System",
            "System.String",
            "System.String.Length",
            "System.String.Length.get_Length()",
            "System.Text.Json",
            "System.Text.Json.JsonSerializer",
        ]
    );

    Ok(())
}

#[test]
fn test_api_accessors() -> Result<()> {
    let catalog = Catalog::from_mem(&build_sample()?)?;
    let string = catalog.api_by_guid(guid(2)).ok_or(Error::Argument("String".into()))?;

    assert_eq!(string.kind(), ApiKind::Class);
    assert_eq!(string.namespace_name(), "System");
    assert_eq!(string.children().len(), 1);
    assert_eq!(string.descendants().count(), 2);
    assert_eq!(string.ancestors().count(), 1);

    let declarations: Vec<&str> = string.declarations().map(|d| d.assembly().name()).collect();
    assert_eq!(declarations, ["System.Runtime", "System.Text.Json"]);

    let markup = string
        .declarations()
        .nth(1)
        .ok_or(Error::Argument("markup".into()))?
        .markup();
    assert_eq!(markup.to_string(), "public String");
    let reference = markup
        .tokens()
        .find(|token| token.kind() == MarkupTokenKind::Reference)
        .and_then(|token| token.reference_api());
    assert_eq!(reference, Some(string));

    let usage = string.usages().next().ok_or(Error::Argument("usage".into()))?;
    assert_eq!(usage.source().name(), "nuget.org");
    assert!((usage.percentage() - 0.98).abs() < f32::EPSILON);

    Ok(())
}

#[test]
fn test_declaration_facts() -> Result<()> {
    let catalog = Catalog::from_mem(&build_sample()?)?;

    let getter = catalog.api_by_guid(guid(4)).ok_or(Error::Argument("getter".into()))?;
    let declaration = getter.declarations().next().ok_or(Error::Argument("decl".into()))?;
    let obsoletion = declaration.obsoletion().ok_or(Error::Argument("obsoletion".into()))?;
    assert!(obsoletion.is_error());
    assert_eq!(obsoletion.diagnostic_id(), "SYSLIB0042");
    assert_eq!(obsoletion.url().as_deref(), Some("https://aka.ms/SYSLIB0042"));
    assert!(declaration.preview_requirement().is_none());

    let json = catalog.assemblies().get(1).ok_or(Error::Argument("json".into()))?;
    let preview = json.preview_requirement().ok_or(Error::Argument("preview".into()))?;
    assert_eq!(preview.message(), "Preview assembly");
    assert_eq!(preview.api(), None);

    let runtime = catalog.assemblies().get(0).ok_or(Error::Argument("runtime".into()))?;
    let assembly_wide: Vec<&str> = runtime.platform_support().map(|r| r.platform_name()).collect();
    assert_eq!(assembly_wide, ["ios"]);

    Ok(())
}

/// Rows sharing a key come back complete and in the order they were added.
#[test]
fn test_duplicate_platform_support_run() -> Result<()> {
    let catalog = Catalog::from_mem(&build_sample()?)?;
    let string = catalog.api_by_guid(guid(2)).ok_or(Error::Argument("String".into()))?;

    let runtime_rows: Vec<(&str, bool)> = string
        .declarations()
        .next()
        .ok_or(Error::Argument("decl".into()))?
        .platform_support()
        .map(|row| (row.platform_name(), row.is_supported()))
        .collect();
    assert_eq!(
        runtime_rows,
        [("windows", true), ("linux", true), ("browser", false)]
    );

    let json_rows = string
        .declarations()
        .nth(1)
        .ok_or(Error::Argument("decl".into()))?
        .platform_support()
        .count();
    assert_eq!(json_rows, 0);

    Ok(())
}

/// Many runs of different lengths, checked against a naive scan of the table.
#[test]
fn test_lookup_matches_scan() -> Result<()> {
    let mut builder = CatalogBuilder::new();
    let framework = builder.add_framework("net8.0");
    let assemblies: Vec<_> = (0..3)
        .map(|index| builder.add_assembly(guid(0x200 + index), format!("A{index}"), "", "1.0.0.0"))
        .collect();
    for assembly in &assemblies {
        builder.add_framework_assembly(framework, *assembly);
    }

    let root = builder.add_api(guid(1), ApiKind::Namespace, None, "N");
    let mut apis = vec![root];
    for index in 0..20u16 {
        apis.push(builder.add_api(guid(10 + index), ApiKind::Class, Some(root), format!("T{index}")));
    }

    for (api_index, api) in apis.iter().enumerate() {
        for (assembly_index, assembly) in assemblies.iter().enumerate() {
            builder.add_declaration(*api, *assembly, MarkupBuilder::new());
            for row in 0..(api_index * 7 + assembly_index) % 5 {
                builder.add_platform_support(Some(*api), *assembly, format!("p{row}"), row % 2 == 0);
            }
        }
    }

    let catalog = Catalog::from_mem(&builder.finish()?)?;
    let table = catalog.table(TableKind::PlatformSupport);
    let row_size = TableKind::PlatformSupport.row_size().ok_or(Error::Argument("row".into()))?;

    for api in catalog.all_apis() {
        for declaration in api.declarations() {
            let expected: Vec<u32> = (0..table.len() / row_size)
                .map(|row| row * row_size)
                .filter(|offset| {
                    let api_key = i32::from_le_bytes(table[*offset..*offset + 4].try_into().unwrap());
                    let assembly_key =
                        i32::from_le_bytes(table[*offset + 4..*offset + 8].try_into().unwrap());
                    api_key == api.id() as i32 && assembly_key == declaration.assembly().id() as i32
                })
                .map(|offset| offset as u32)
                .collect();

            let found: Vec<u32> = declaration.platform_support().map(|row| row.id()).collect();
            assert_eq!(found, expected, "{api} in {}", declaration.assembly());

            let names: Vec<&str> = declaration.platform_support().map(|r| r.platform_name()).collect();
            let mut sorted = names.clone();
            sorted.sort_unstable();
            assert_eq!(names, sorted);
        }
    }

    Ok(())
}

#[test]
fn test_load_rejects_garbage() {
    assert!(matches!(
        Catalog::from_mem(b"NOTACATALOG-----"),
        Err(Error::Format { .. } | Error::OutOfBounds)
    ));

    let mut data = build_sample().unwrap();
    data[8] = 3;
    assert!(matches!(
        Catalog::from_mem(&data),
        Err(Error::UnsupportedVersion(3))
    ));
}

#[test]
fn test_load_rejects_oversized_tables() {
    let mut data = b"APICATFB".to_vec();
    data.extend_from_slice(&4i32.to_le_bytes());
    data.extend_from_slice(&10i32.to_le_bytes());
    for _ in 0..10 {
        data.extend_from_slice(&i32::MAX.to_le_bytes());
    }
    data.extend_from_slice(&[0x03, 0x00]);

    assert!(matches!(Catalog::from_mem(&data), Err(Error::Format { .. })));
}

#[test]
fn test_write_and_load_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("apicatalog.dat");

    let mut builder = CatalogBuilder::new();
    builder.add_framework("net8.0");
    builder.write_to(std::fs::File::create(&path)?)?;

    let catalog = Catalog::from_file(&path)?;
    assert_eq!(catalog.frameworks().len(), 1);
    assert_eq!(catalog.all_apis().count(), 0);

    Ok(())
}

const KINDS: [ApiKind; 8] = [
    ApiKind::Namespace,
    ApiKind::Class,
    ApiKind::Struct,
    ApiKind::Constructor,
    ApiKind::Property,
    ApiKind::Method,
    ApiKind::Method,
    ApiKind::Field,
];

const NAMES: [&str; 10] = [
    "System",
    "Windows",
    "Microsoft",
    "Alpha",
    "Add(T)",
    "Add(T, Int32)",
    "Add<T>(T)",
    "List<T>",
    "List<TKey, TValue>",
    "Add()",
];

/// Builds a catalog of root APIs from `(kind, name)` pairs.
fn catalog_of(entries: &[(usize, usize)]) -> Catalog {
    let mut builder = CatalogBuilder::new();
    for (index, (kind, name)) in entries.iter().enumerate() {
        builder.add_api(
            guid(u16::try_from(index).unwrap() + 1),
            KINDS[*kind],
            None,
            NAMES[*name],
        );
    }
    Catalog::from_mem(&builder.finish().unwrap()).unwrap()
}

#[test]
fn test_api_ordering_examples() {
    let catalog = catalog_of(&[(0, 3), (0, 0), (0, 2), (0, 1), (1, 7), (5, 5), (5, 9), (3, 9), (5, 6)]);
    let mut apis: Vec<Api<'_>> = catalog.root_apis().collect();
    apis.sort();

    let names: Vec<(ApiKind, &str)> = apis.iter().map(|api| (api.kind(), api.name())).collect();
    assert_eq!(
        names,
        [
            (ApiKind::Namespace, "System"),
            (ApiKind::Namespace, "Microsoft"),
            (ApiKind::Namespace, "Windows"),
            (ApiKind::Namespace, "Alpha"),
            (ApiKind::Class, "List<T>"),
            (ApiKind::Constructor, "Add()"),
            (ApiKind::Method, "Add()"),
            (ApiKind::Method, "Add(T, Int32)"),
            (ApiKind::Method, "Add<T>(T)"),
        ]
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_api_ordering_is_total(entries in prop::collection::vec((0..KINDS.len(), 0..NAMES.len()), 1..12)) {
        let catalog = catalog_of(&entries);
        let apis: Vec<Api<'_>> = catalog.root_apis().collect();

        for a in &apis {
            prop_assert_eq!(a.cmp(a), std::cmp::Ordering::Equal);
            for b in &apis {
                prop_assert_eq!(a.cmp(b), b.cmp(a).reverse());
                if a != b {
                    prop_assert_ne!(a.cmp(b), std::cmp::Ordering::Equal);
                }
                for c in &apis {
                    if a < b && b < c {
                        prop_assert!(a < c);
                    }
                }
            }
        }

        for a in &apis {
            for b in &apis {
                if !a.kind().is_member() && b.kind().is_member() {
                    prop_assert!(a < b);
                }
                if a.kind().is_member() && b.kind().is_member() && a.kind() < b.kind() {
                    prop_assert!(a < b);
                }
            }
        }
    }
}
