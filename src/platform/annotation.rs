//! Platform annotations and their construction from platform support facts.

use std::{collections::BTreeMap, fmt};

use crate::{platform::range::PlatformSupportRange, Version};

/// How an API is restricted across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum PlatformAnnotationKind {
    /// The framework predates platform annotations; nothing is known.
    None,
    /// The API is supported on every platform.
    Unrestricted,
    /// The API is supported only on the listed platforms.
    RestrictedTo,
    /// The API is supported everywhere except as listed.
    UnrestrictedExceptFor,
}

/// The support range of one platform within an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformAnnotationEntry {
    /// Lower-cased platform name, e.g. `windows`.
    pub platform: String,
    /// Support of the platform by version.
    pub range: PlatformSupportRange,
}

impl fmt::Display for PlatformAnnotationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.platform, self.range)
    }
}

/// Platform restrictions of an API under one framework.
///
/// # Examples
///
/// ```rust
/// use apicatalog::platform::{PlatformAnnotation, PlatformAnnotationKind};
///
/// let annotation = PlatformAnnotation::unrestricted();
/// assert_eq!(annotation.kind(), PlatformAnnotationKind::Unrestricted);
/// assert!(annotation.is_supported("linux"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformAnnotation {
    kind: PlatformAnnotationKind,
    entries: Vec<PlatformAnnotationEntry>,
}

impl PlatformAnnotation {
    /// An annotation for frameworks without platform information.
    #[must_use]
    pub fn none() -> Self {
        PlatformAnnotation {
            kind: PlatformAnnotationKind::None,
            entries: Vec::new(),
        }
    }

    /// An annotation for APIs supported on every platform.
    #[must_use]
    pub fn unrestricted() -> Self {
        PlatformAnnotation {
            kind: PlatformAnnotationKind::Unrestricted,
            entries: Vec::new(),
        }
    }

    /// Returns the annotation kind.
    #[must_use]
    pub fn kind(&self) -> PlatformAnnotationKind {
        self.kind
    }

    /// Returns the per-platform entries, ordered by platform name.
    #[must_use]
    pub fn entries(&self) -> &[PlatformAnnotationEntry] {
        &self.entries
    }

    /// Returns the entry for `platform`, matched case-insensitively.
    #[must_use]
    pub fn entry(&self, platform: &str) -> Option<&PlatformAnnotationEntry> {
        self.entries
            .iter()
            .find(|entry| entry.platform.eq_ignore_ascii_case(platform))
    }

    /// Returns `true` if some version of `platform` is supported.
    #[must_use]
    pub fn is_supported(&self, platform: &str) -> bool {
        match self.kind {
            PlatformAnnotationKind::None | PlatformAnnotationKind::Unrestricted => true,
            PlatformAnnotationKind::RestrictedTo => self
                .entry(platform)
                .is_some_and(|entry| entry.range.is_supported_anywhere()),
            PlatformAnnotationKind::UnrestrictedExceptFor => self
                .entry(platform)
                .map_or(true, |entry| entry.range.is_supported_anywhere()),
        }
    }

    /// Returns `true` if `platform` is supported at `version`.
    #[must_use]
    pub fn is_supported_on(&self, platform: &str, version: &Version) -> bool {
        match self.kind {
            PlatformAnnotationKind::None | PlatformAnnotationKind::Unrestricted => true,
            kind => self.entry(platform).map_or(
                kind == PlatformAnnotationKind::UnrestrictedExceptFor,
                |entry| entry.range.is_supported(version),
            ),
        }
    }
}

impl fmt::Display for PlatformAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PlatformAnnotationKind::None => Ok(()),
            PlatformAnnotationKind::Unrestricted => f.write_str("any platform"),
            _ => {
                for (index, entry) in self.entries.iter().enumerate() {
                    if index > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{entry}")?;
                }
                Ok(())
            }
        }
    }
}

/// Splits a platform string such as `windows10.0.19041` into its lower-cased name and version.
///
/// A missing or malformed version reads as `0.0`.
#[must_use]
pub fn parse_platform(platform: &str) -> (String, Version) {
    let platform = platform.trim();
    let split = platform
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(platform.len());
    let (name, version) = platform.split_at(split);

    let version = if version.is_empty() {
        Version::ZERO
    } else {
        Version::parse(version).unwrap_or(Version::ZERO)
    };
    (name.to_ascii_lowercase(), version)
}

/// Builds an annotation from raw `(platform, supported)` facts.
///
/// Facts of a platform implied by another (`(platform, implied)` pairs) are added to the facts of
/// the implied platform before its range is built. Only a platform's own facts propagate.
pub(crate) fn build_annotation<'f, I>(facts: I, implied: &[(String, String)]) -> PlatformAnnotation
where
    I: IntoIterator<Item = (&'f str, bool)>,
{
    let mut groups: BTreeMap<String, Vec<(Version, bool)>> = BTreeMap::new();
    for (platform, supported) in facts {
        let (name, version) = parse_platform(platform);
        groups.entry(name).or_default().push((version, supported));
    }

    if !implied.is_empty() {
        let own = groups.clone();
        for (platform, implied) in implied {
            if let Some(facts) = own.get(platform) {
                groups.entry(implied.clone()).or_default().extend(facts.iter().copied());
            }
        }
    }

    let entries: Vec<PlatformAnnotationEntry> = groups
        .into_iter()
        .filter_map(|(platform, facts)| {
            PlatformSupportRange::new(facts).map(|range| PlatformAnnotationEntry { platform, range })
        })
        .collect();

    let kind = if entries.iter().any(|entry| entry.range.is_allow_list()) {
        PlatformAnnotationKind::RestrictedTo
    } else {
        PlatformAnnotationKind::UnrestrictedExceptFor
    };

    PlatformAnnotation { kind, entries }
}
