//! Where an API is available: in-box in a framework or through a package.
//!
//! [`AvailabilityContext`] indexes the frameworks and packages of a [`Catalog`] once and then
//! answers, for any API and target framework, which declaration makes the API usable there.
//!
//! # Key Components
//!
//! - [`AvailabilityContext`] - Framework and package indexes over one catalog
//! - [`ApiAvailability`] - In-box or package-provided availability of an API
//! - [`FrameworkName`] / [`FrameworkResolver`] - Framework parsing and nearest-match policy
//!
//! # Examples
//!
//! ```rust,no_run
//! use apicatalog::{availability::AvailabilityContext, Catalog};
//!
//! let catalog = Catalog::from_file("apicatalog.dat")?;
//! let context = AvailabilityContext::with_defaults(&catalog);
//!
//! for api in catalog.all_apis().take(10) {
//!     if let Some(availability) = context.availability_by_name(api, "net8.0")? {
//!         println!("{api}: {}", availability.declaration().assembly());
//!     }
//! }
//! # Ok::<(), apicatalog::Error>(())
//! ```

mod framework;

pub use framework::{
    FrameworkName, FrameworkResolver, MonikerResolver, AGGREGATE_IDENTIFIERS, PORTABLE_IDENTIFIER,
};

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::{
    model::{Api, ApiDeclaration, Framework, Package},
    Catalog, Error, Result,
};

/// Framework identifiers that are dropped when indexing a catalog.
const LEGACY_IDENTIFIERS: [&str; 2] = ["sl", "wp"];

/// How an API becomes available to a target framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAvailability<'a> {
    /// The API ships with the framework itself.
    InBox {
        /// The framework containing the declaring assembly.
        framework: Framework<'a>,
        /// The declaration providing the API.
        declaration: ApiDeclaration<'a>,
    },
    /// The API is provided by a package.
    Package {
        /// The package containing the declaring assembly.
        package: Package<'a>,
        /// The package folder selected for the target framework.
        package_framework: FrameworkName,
        /// The declaration providing the API.
        declaration: ApiDeclaration<'a>,
    },
}

impl<'a> ApiAvailability<'a> {
    /// Returns the declaration providing the API.
    #[must_use]
    pub fn declaration(&self) -> ApiDeclaration<'a> {
        match self {
            ApiAvailability::InBox { declaration, .. }
            | ApiAvailability::Package { declaration, .. } => *declaration,
        }
    }

    /// Returns `true` if the API ships with the framework.
    #[must_use]
    pub fn is_in_box(&self) -> bool {
        matches!(self, ApiAvailability::InBox { .. })
    }
}

/// Framework folders of one package and the assemblies in each.
#[derive(Debug, Default)]
struct PackageFolders {
    frameworks: Vec<FrameworkName>,
    assemblies: Vec<HashSet<u32>>,
}

impl PackageFolders {
    fn insert(&mut self, framework: FrameworkName, assembly: u32) {
        let index = match self.frameworks.iter().position(|name| *name == framework) {
            Some(index) => index,
            None => {
                self.frameworks.push(framework);
                self.assemblies.push(HashSet::new());
                self.frameworks.len() - 1
            }
        };
        self.assemblies[index].insert(assembly);
    }
}

/// Framework and package indexes over a catalog.
///
/// The context is immutable once built and can be shared between threads when the resolver
/// can.
pub struct AvailabilityContext<'a, R: FrameworkResolver = MonikerResolver> {
    catalog: &'a Catalog,
    resolver: R,
    frameworks: HashMap<FrameworkName, Framework<'a>>,
    names: Vec<FrameworkName>,
    framework_assemblies: HashMap<u32, HashSet<u32>>,
    package_folders: HashMap<u32, PackageFolders>,
}

impl<'a> AvailabilityContext<'a, MonikerResolver> {
    /// Builds a context using [`MonikerResolver`].
    #[must_use]
    pub fn with_defaults(catalog: &'a Catalog) -> Self {
        Self::new(catalog, MonikerResolver)
    }
}

impl<'a, R: FrameworkResolver> AvailabilityContext<'a, R> {
    /// Indexes the frameworks and packages of `catalog`.
    ///
    /// Frameworks the resolver cannot parse, portable and aggregate frameworks and the legacy
    /// Silverlight and Windows Phone identifiers are left out. Package folders are kept under
    /// any framework the resolver can parse.
    pub fn new(catalog: &'a Catalog, resolver: R) -> Self {
        let mut frameworks = HashMap::new();
        let mut framework_assemblies = HashMap::new();

        for framework in catalog.frameworks() {
            let Some(name) = resolver.parse(framework.name()) else {
                continue;
            };
            if name.is_portable()
                || name.is_aggregate()
                || LEGACY_IDENTIFIERS.contains(&name.identifier())
            {
                continue;
            }

            let assemblies: HashSet<u32> = framework.assemblies().map(|a| a.id()).collect();
            framework_assemblies.insert(framework.id(), assemblies);
            frameworks.insert(name, framework);
        }

        let mut package_folders: HashMap<u32, PackageFolders> = HashMap::new();
        for package in catalog.packages() {
            for (framework, assembly) in package.assemblies() {
                let Some(name) = resolver.parse(framework.name()) else {
                    continue;
                };
                package_folders
                    .entry(package.id())
                    .or_default()
                    .insert(name, assembly.id());
            }
        }

        let mut names: Vec<FrameworkName> = frameworks.keys().cloned().collect();
        names.sort();

        debug!(
            frameworks = names.len(),
            packages = package_folders.len(),
            "indexed availability"
        );

        AvailabilityContext {
            catalog,
            resolver,
            frameworks,
            names,
            framework_assemblies,
            package_folders,
        }
    }

    /// Returns the catalog this context indexes.
    #[must_use]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Returns the framework resolver.
    #[must_use]
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Returns the known frameworks in sorted order.
    #[must_use]
    pub fn frameworks(&self) -> &[FrameworkName] {
        &self.names
    }

    /// Returns the catalog framework for a known framework name.
    #[must_use]
    pub fn framework(&self, name: &FrameworkName) -> Option<Framework<'a>> {
        self.frameworks.get(name).copied()
    }

    /// Returns `true` if `api` ships in-box with `framework`.
    #[must_use]
    pub fn is_declared_in(&self, api: Api<'a>, framework: &FrameworkName) -> bool {
        self.in_box(api, framework).is_some()
    }

    /// Returns how `api` is available to `framework`, or `None` if it is not.
    ///
    /// An in-box declaration takes precedence; the first one found wins. Otherwise every
    /// package containing a declaring assembly is consulted, and the API is available if the
    /// package folder nearest to `framework` holds that assembly.
    #[must_use]
    pub fn availability(
        &self,
        api: Api<'a>,
        framework: &FrameworkName,
    ) -> Option<ApiAvailability<'a>> {
        if let Some(availability) = self.in_box(api, framework) {
            return Some(availability);
        }

        for declaration in api.declarations() {
            let assembly = declaration.assembly();
            let mut visited = HashSet::new();

            for (package, _) in assembly.packages() {
                if !visited.insert(package.id()) {
                    continue;
                }
                let Some(folders) = self.package_folders.get(&package.id()) else {
                    continue;
                };
                let Some(index) = self.resolver.nearest(framework, &folders.frameworks) else {
                    continue;
                };
                if folders.assemblies[index].contains(&assembly.id()) {
                    return Some(ApiAvailability::Package {
                        package,
                        package_framework: folders.frameworks[index].clone(),
                        declaration,
                    });
                }
            }
        }

        None
    }

    /// Like [`AvailabilityContext::availability`] for a framework given by name.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if the resolver cannot parse `framework`. A parsed name the
    /// catalog does not know yields `Ok(None)`.
    pub fn availability_by_name(
        &self,
        api: Api<'a>,
        framework: &str,
    ) -> Result<Option<ApiAvailability<'a>>> {
        let name = self
            .resolver
            .parse(framework)
            .ok_or_else(|| Error::Argument(format!("invalid framework name '{framework}'")))?;

        if !self.frameworks.contains_key(&name) {
            return Ok(None);
        }
        Ok(self.availability(api, &name))
    }

    /// Returns the availability of `api` for every known framework, in sorted order.
    #[must_use]
    pub fn availability_all(
        &self,
        api: Api<'a>,
    ) -> Vec<(FrameworkName, Option<ApiAvailability<'a>>)> {
        self.names
            .iter()
            .map(|name| (name.clone(), self.availability(api, name)))
            .collect()
    }

    fn in_box(&self, api: Api<'a>, framework: &FrameworkName) -> Option<ApiAvailability<'a>> {
        let target = self.frameworks.get(framework)?;
        let assemblies = self.framework_assemblies.get(&target.id())?;

        api.declarations()
            .find(|declaration| assemblies.contains(&declaration.assembly().id()))
            .map(|declaration| ApiAvailability::InBox {
                framework: *target,
                declaration,
            })
    }
}

impl<R: FrameworkResolver + std::fmt::Debug> std::fmt::Debug for AvailabilityContext<'_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityContext")
            .field("resolver", &self.resolver)
            .field("frameworks", &self.names)
            .field("packages", &self.package_folders.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{CatalogBuilder, MarkupBuilder},
        model::ApiKind,
        Version,
    };
    use uguid::Guid;

    fn guid(value: u8) -> Guid {
        let mut bytes = [0u8; 16];
        bytes[0] = value;
        Guid::from_bytes(bytes)
    }

    fn name(value: &str) -> FrameworkName {
        MonikerResolver.parse(value).unwrap()
    }

    /// `Core` ships in net8.0; `Ext` only through the `Ext.Package` netstandard2.0 folder.
    fn sample() -> Catalog {
        let mut builder = CatalogBuilder::new();
        let net8 = builder.add_framework("net8.0");
        let net45 = builder.add_framework("net45");
        let netstandard = builder.add_framework("netstandard2.0");
        builder.add_framework("sl5");
        builder.add_framework("portable-net45+win8");

        let core = builder.add_assembly(guid(0xA0), "Core", "", "8.0.0.0");
        let ext = builder.add_assembly(guid(0xA1), "Ext", "", "1.0.0.0");
        builder.add_framework_assembly(net8, core);
        builder.add_framework_assembly(net45, core);

        let package = builder.add_package("Ext.Package", "1.0.0");
        builder.add_package_assembly(package, netstandard, ext);

        let ns = builder.add_api(guid(1), ApiKind::Namespace, None, "N");
        let core_type = builder.add_api(guid(2), ApiKind::Class, Some(ns), "T");
        let ext_type = builder.add_api(guid(3), ApiKind::Class, Some(ns), "U");
        builder.add_declaration(ns, core, MarkupBuilder::new());
        builder.add_declaration(ns, ext, MarkupBuilder::new());
        builder.add_declaration(core_type, core, MarkupBuilder::new());
        builder.add_declaration(ext_type, ext, MarkupBuilder::new());

        Catalog::from_mem(&builder.finish().unwrap()).unwrap()
    }

    #[test]
    fn frameworks_are_filtered_and_sorted() {
        let catalog = sample();
        let context = AvailabilityContext::with_defaults(&catalog);

        let names: Vec<String> = context.frameworks().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["net4.5", "net8.0", "netstandard2.0"]);
        assert!(context.framework(&name("sl5")).is_none());
        assert_eq!(context.framework(&name("net8.0")).unwrap().name(), "net8.0");
    }

    #[test]
    fn in_box_wins() {
        let catalog = sample();
        let context = AvailabilityContext::with_defaults(&catalog);
        let ns = catalog.api_by_guid(guid(1)).unwrap();

        let availability = context.availability(ns, &name("net8.0")).unwrap();
        assert!(availability.is_in_box());
        assert_eq!(availability.declaration().assembly().name(), "Core");
        assert!(context.is_declared_in(ns, &name("net8.0")));
    }

    #[test]
    fn package_availability() {
        let catalog = sample();
        let context = AvailabilityContext::with_defaults(&catalog);
        let ext_type = catalog.api_by_guid(guid(3)).unwrap();

        match context.availability(ext_type, &name("net8.0")) {
            Some(ApiAvailability::Package {
                package,
                package_framework,
                declaration,
            }) => {
                assert_eq!(package.name(), "Ext.Package");
                assert_eq!(package_framework, name("netstandard2.0"));
                assert_eq!(declaration.assembly().name(), "Ext");
            }
            other => panic!("unexpected availability {other:?}"),
        }

        assert!(!context.is_declared_in(ext_type, &name("net8.0")));
        assert!(context.availability(ext_type, &name("net45")).is_none());
    }

    #[test]
    fn availability_by_name() {
        let catalog = sample();
        let context = AvailabilityContext::with_defaults(&catalog);
        let core_type = catalog.api_by_guid(guid(2)).unwrap();

        assert!(context.availability_by_name(core_type, "net8.0").unwrap().is_some());
        assert!(context.availability_by_name(core_type, "net9.0").unwrap().is_none());
        assert!(matches!(
            context.availability_by_name(core_type, "???"),
            Err(Error::Argument(_))
        ));
    }

    #[test]
    fn availability_for_all_frameworks() {
        let catalog = sample();
        let context = AvailabilityContext::with_defaults(&catalog);
        let core_type = catalog.api_by_guid(guid(2)).unwrap();

        let all = context.availability_all(core_type);
        let available: Vec<(Version, bool)> = all
            .iter()
            .map(|(name, availability)| (name.version(), availability.is_some()))
            .collect();
        assert_eq!(
            available,
            [
                (Version::new(4, 5, 0, 0), true),
                (Version::new(8, 0, 0, 0), true),
                (Version::new(2, 0, 0, 0), false),
            ]
        );
    }
}
