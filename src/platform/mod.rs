//! Platform annotations: on which operating systems an API can be used.
//!
//! Platform support facts are recorded per declaration or per assembly as `(platform name,
//! supported)` rows, where the platform name may carry a version (`windows10.0.19041`). A
//! [`PlatformAnnotationContext`] resolves the facts that apply to an API under one framework and
//! folds them into a [`PlatformAnnotation`].
//!
//! The context also discovers the platforms the framework knows about from its
//! `System.OperatingSystem` checks, and which platforms imply others (an `IsIOS()` check that
//! also guards `maccatalyst`). Facts for a platform are copied onto the platforms it implies.
//!
//! # Key Components
//!
//! - [`PlatformAnnotationContext`] - Per-framework platform discovery and annotation
//! - [`PlatformAnnotation`] / [`PlatformAnnotationKind`] - Result for one API
//! - [`PlatformSupportRange`] / [`VersionRange`] - Support of one platform by version
//!
//! # Examples
//!
//! ```rust,no_run
//! use apicatalog::{availability::AvailabilityContext, platform::PlatformAnnotationContext, Catalog};
//!
//! let catalog = Catalog::from_file("apicatalog.dat")?;
//! let availability = AvailabilityContext::with_defaults(&catalog);
//! let platforms = PlatformAnnotationContext::new(&availability, "net8.0")?;
//!
//! let api = catalog.root_apis().next().unwrap();
//! println!("{api}: {}", platforms.platform_annotation(api)?);
//! # Ok::<(), apicatalog::Error>(())
//! ```

mod annotation;
mod range;

pub use annotation::{
    parse_platform, PlatformAnnotation, PlatformAnnotationEntry, PlatformAnnotationKind,
};
pub use range::{PlatformSupportRange, VersionRange};

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    availability::{AvailabilityContext, FrameworkName, FrameworkResolver, MonikerResolver},
    model::{Api, ApiDeclaration, ApiKind, MarkupTokenKind, PlatformSupport},
    Catalog, Error, PlatformOptions, Result,
};

/// Platform discovery and annotation for one framework.
pub struct PlatformAnnotationContext<'c, 'a, R: FrameworkResolver = MonikerResolver> {
    availability: &'c AvailabilityContext<'a, R>,
    framework: FrameworkName,
    options: PlatformOptions,
    known_platforms: BTreeSet<String>,
    implied_platforms: Vec<(String, String)>,
}

impl<'c, 'a, R: FrameworkResolver> PlatformAnnotationContext<'c, 'a, R> {
    /// Builds a context for the framework named `framework` with default options.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if the name cannot be parsed or the framework is not part of
    /// the catalog.
    pub fn new(availability: &'c AvailabilityContext<'a, R>, framework: &str) -> Result<Self> {
        Self::with_options(availability, framework, PlatformOptions::default())
    }

    /// Builds a context for the framework named `framework`.
    ///
    /// # Errors
    /// See [`PlatformAnnotationContext::new`].
    pub fn with_options(
        availability: &'c AvailabilityContext<'a, R>,
        framework: &str,
        options: PlatformOptions,
    ) -> Result<Self> {
        let name = availability
            .resolver()
            .parse(framework)
            .ok_or_else(|| Error::Argument(format!("invalid framework name '{framework}'")))?;
        if availability.framework(&name).is_none() {
            return Err(Error::Argument(format!("unknown framework '{framework}'")));
        }

        let mut known_platforms = BTreeSet::new();
        let mut implied_platforms = Vec::new();

        if let Some(marker) = find_type(availability.catalog(), &options.marker_type) {
            for check in marker.children() {
                let Some(platform) = platform_of_check(check, &options) else {
                    continue;
                };

                if let Some(available) = availability.availability(check, &name) {
                    for implied in guarded_platforms(check, available.declaration(), &options) {
                        implied_platforms.push((platform.clone(), implied));
                    }
                }
                known_platforms.insert(platform);
            }
        }

        debug!(
            framework = %name,
            known = known_platforms.len(),
            implied = implied_platforms.len(),
            "indexed platforms"
        );

        Ok(PlatformAnnotationContext {
            availability,
            framework: name,
            options,
            known_platforms,
            implied_platforms,
        })
    }

    /// Returns the framework this context annotates for.
    #[must_use]
    pub fn framework(&self) -> &FrameworkName {
        &self.framework
    }

    /// Returns the lower-cased names of the platforms with a check on the marker type.
    #[must_use]
    pub fn known_platforms(&self) -> &BTreeSet<String> {
        &self.known_platforms
    }

    /// Returns `(platform, implied)` pairs: a check for `platform` also guards `implied`.
    #[must_use]
    pub fn implied_platforms(&self) -> &[(String, String)] {
        &self.implied_platforms
    }

    /// Returns the platform annotation of `api` under this context's framework.
    ///
    /// The facts of the nearest enclosing type or member that has any apply; namespaces carry
    /// none. Without such facts the assembly-wide facts apply. Without any facts, the API is
    /// unrestricted on platform aware frameworks and unannotated on older ones.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] if `api` is not available in the framework.
    pub fn platform_annotation(&self, api: Api<'a>) -> Result<PlatformAnnotation> {
        let declaration = self
            .availability
            .availability(api, &self.framework)
            .map(|available| available.declaration())
            .ok_or_else(|| {
                Error::Argument(format!(
                    "'{}' is not available in {}",
                    api.full_name(),
                    self.framework
                ))
            })?;
        let assembly = declaration.assembly();

        for candidate in api.ancestors_and_self() {
            if candidate.kind() == ApiKind::Namespace {
                continue;
            }
            let Ok(key) = i32::try_from(candidate.id()) else {
                continue;
            };

            let mut rows = self
                .availability
                .catalog()
                .platform_support(key, assembly.offset_key())
                .peekable();
            if rows.peek().is_some() {
                return Ok(self.create_platform_annotation(rows));
            }
        }

        let mut rows = assembly.platform_support().peekable();
        if rows.peek().is_some() {
            return Ok(self.create_platform_annotation(rows));
        }

        if self.framework.version().major >= self.options.unrestricted_major_version {
            Ok(PlatformAnnotation::unrestricted())
        } else {
            Ok(PlatformAnnotation::none())
        }
    }

    /// Folds platform support rows into an annotation, applying implied platforms.
    pub fn create_platform_annotation<'r, I>(&self, rows: I) -> PlatformAnnotation
    where
        I: IntoIterator<Item = PlatformSupport<'r>>,
    {
        annotation::build_annotation(
            rows.into_iter()
                .map(|row| (row.platform_name(), row.is_supported())),
            &self.implied_platforms,
        )
    }
}

impl<R: FrameworkResolver> std::fmt::Debug for PlatformAnnotationContext<'_, '_, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformAnnotationContext")
            .field("framework", &self.framework)
            .field("known_platforms", &self.known_platforms)
            .field("implied_platforms", &self.implied_platforms)
            .finish_non_exhaustive()
    }
}

/// Finds a type by its full name, e.g. `System.OperatingSystem` or `N.Outer.Inner`.
fn find_type<'a>(catalog: &'a Catalog, full_name: &str) -> Option<Api<'a>> {
    catalog
        .root_apis()
        .filter(|root| root.kind() == ApiKind::Namespace)
        .find_map(|namespace| {
            let rest = full_name
                .strip_prefix(namespace.name())?
                .strip_prefix('.')?;

            rest.split('.').try_fold(namespace, |parent, name| {
                parent
                    .children()
                    .find(|child| child.kind().is_type() && child.name() == name)
            })
        })
}

/// Returns the platform an `Is<Platform>()` check tests for, lower-cased.
fn platform_of_check(check: Api<'_>, options: &PlatformOptions) -> Option<String> {
    if check.kind() != ApiKind::Method {
        return None;
    }

    let platform = check
        .name()
        .strip_prefix(options.method_prefix.as_str())?
        .strip_suffix(options.method_suffix.as_str())?;
    if platform.is_empty() {
        return None;
    }
    Some(platform.to_ascii_lowercase())
}

/// Returns the platforms named by guard attributes in the signature of a platform check.
///
/// Recognizes `[Guard("platform")]` with any whitespace between tokens.
fn guarded_platforms(
    check: Api<'_>,
    declaration: ApiDeclaration<'_>,
    options: &PlatformOptions,
) -> Vec<String> {
    let tokens: Vec<(MarkupTokenKind, &str)> = declaration
        .markup()
        .tokens()
        .filter(|token| {
            !matches!(
                token.kind(),
                MarkupTokenKind::Whitespace | MarkupTokenKind::LineBreak
            )
        })
        .map(|token| (token.kind(), token.text()))
        .collect();

    let implied: Vec<String> = tokens
        .windows(4)
        .filter_map(|window| match window {
            [(MarkupTokenKind::Punctuation, "["), (MarkupTokenKind::Reference | MarkupTokenKind::Identifier, attribute), (MarkupTokenKind::Punctuation, "("), (MarkupTokenKind::LiteralString, literal)]
                if *attribute == options.guard_attribute =>
            {
                Some(literal.trim_matches('"').to_ascii_lowercase())
            }
            _ => None,
        })
        .filter(|platform| !platform.is_empty())
        .collect();

    if !implied.is_empty() {
        tracing::trace!(check = check.name(), ?implied, "guard attributes");
    }
    implied
}
