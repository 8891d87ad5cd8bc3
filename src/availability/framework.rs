//! Framework names and the resolver that parses and matches them.
//!
//! Parsing a framework moniker and deciding which package folder is the nearest compatible one
//! for a target framework are policy decisions owned by the caller. The availability context
//! only consumes them through [`FrameworkResolver`]. [`MonikerResolver`] is a small default
//! covering short monikers such as `net8.0`, `net462`, `netstandard2.0` or `net8.0-windows`.

use std::fmt;

use crate::Version;

/// Identifier used for portable class library frameworks.
pub const PORTABLE_IDENTIFIER: &str = "portable";

/// Identifiers of aggregate frameworks that do not name a concrete target.
pub const AGGREGATE_IDENTIFIERS: [&str; 2] = ["any", "agnostic"];

/// A parsed framework moniker: identifier, version and optional platform.
///
/// Names order by identifier, then version, then platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameworkName {
    identifier: String,
    version: Version,
    platform: Option<String>,
}

impl FrameworkName {
    /// Creates a framework name; the identifier and platform are lower-cased.
    #[must_use]
    pub fn new(identifier: &str, version: Version, platform: Option<&str>) -> Self {
        FrameworkName {
            identifier: identifier.to_ascii_lowercase(),
            version,
            platform: platform
                .filter(|platform| !platform.is_empty())
                .map(str::to_ascii_lowercase),
        }
    }

    /// Returns the identifier, e.g. `net` or `netstandard`.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the framework version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the platform suffix, e.g. `windows` for `net8.0-windows`.
    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Returns `true` for portable class library profiles.
    #[must_use]
    pub fn is_portable(&self) -> bool {
        self.identifier == PORTABLE_IDENTIFIER
    }

    /// Returns `true` for aggregate frameworks such as `any`.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        AGGREGATE_IDENTIFIERS.contains(&self.identifier.as_str())
    }
}

impl fmt::Display for FrameworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_portable() || self.is_aggregate() {
            f.write_str(&self.identifier)?;
        } else {
            write!(f, "{}{}", self.identifier, self.version)?;
        }
        if let Some(platform) = &self.platform {
            write!(f, "-{platform}")?;
        }
        Ok(())
    }
}

/// Parses framework names and selects the nearest compatible framework among candidates.
pub trait FrameworkResolver {
    /// Parses a framework name as stored in the catalog; `None` if it is not understood.
    fn parse(&self, name: &str) -> Option<FrameworkName>;

    /// Returns the index of the candidate that `target` can consume and that is nearest to it,
    /// or `None` if no candidate is compatible.
    fn nearest(&self, target: &FrameworkName, candidates: &[FrameworkName]) -> Option<usize>;
}

/// Default resolver for short framework monikers.
///
/// A moniker is an identifier of ASCII letters, a version and an optional `-platform` suffix.
/// Versions without dots use one digit per component (`net462` is 4.6.2). `portable-*` names
/// parse as portable and `any`/`agnostic` as aggregate frameworks.
///
/// A candidate is compatible with a target if it has the same identifier, a version not above
/// the target's and either no platform or the target's platform. .NET Standard candidates are
/// compatible with .NET and .NET Core targets implementing them. Same-identifier candidates are
/// preferred; among them the highest version wins, and a matching platform beats none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonikerResolver;

impl MonikerResolver {
    /// Highest .NET Standard version implemented by `target`, if any.
    fn netstandard_support(target: &FrameworkName) -> Option<Version> {
        let version = target.version;
        match target.identifier() {
            "net" if version.major >= 5 => Some(Version::new(2, 1, 0, 0)),
            "net" if version >= Version::new(4, 6, 1, 0) => Some(Version::new(2, 0, 0, 0)),
            "netcoreapp" if version.major >= 3 => Some(Version::new(2, 1, 0, 0)),
            "netcoreapp" if version.major >= 2 => Some(Version::new(2, 0, 0, 0)),
            "netcoreapp" if version.major >= 1 => Some(Version::new(1, 6, 0, 0)),
            _ => None,
        }
    }

    /// Ranks a compatible candidate; higher is nearer. `None` if incompatible.
    fn rank(target: &FrameworkName, candidate: &FrameworkName) -> Option<(bool, Version, bool)> {
        let platform_ok = candidate.platform.is_none() || candidate.platform == target.platform;
        if !platform_ok {
            return None;
        }
        let platform_match = candidate.platform.is_some();

        if candidate.identifier == target.identifier {
            return (candidate.version <= target.version).then_some((
                true,
                candidate.version,
                platform_match,
            ));
        }

        if candidate.identifier == "netstandard" {
            let supported = Self::netstandard_support(target)?;
            return (candidate.version <= supported).then_some((
                false,
                candidate.version,
                platform_match,
            ));
        }

        None
    }
}

impl FrameworkResolver for MonikerResolver {
    fn parse(&self, name: &str) -> Option<FrameworkName> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        if name == PORTABLE_IDENTIFIER || name.starts_with("portable-") {
            let profile = name.strip_prefix("portable-");
            return Some(FrameworkName::new(PORTABLE_IDENTIFIER, Version::ZERO, profile));
        }
        if AGGREGATE_IDENTIFIERS.contains(&name.as_str()) {
            return Some(FrameworkName::new(&name, Version::ZERO, None));
        }

        let (moniker, platform) = match name.split_once('-') {
            Some((moniker, platform)) => (moniker, Some(platform)),
            None => (name.as_str(), None),
        };

        let split = moniker.find(|c: char| !c.is_ascii_alphabetic())?;
        let (identifier, version) = moniker.split_at(split);
        if identifier.is_empty() {
            return None;
        }

        let version = if version.contains('.') {
            Version::parse(version).ok()?
        } else {
            if version.len() > 4 || !version.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            let mut components = [0u32; 4];
            for (component, digit) in components.iter_mut().zip(version.chars()) {
                *component = digit.to_digit(10)?;
            }
            Version::new(components[0], components[1], components[2], components[3])
        };

        Some(FrameworkName::new(identifier, version, platform))
    }

    fn nearest(&self, target: &FrameworkName, candidates: &[FrameworkName]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| Self::rank(target, candidate).map(|rank| (rank, index)))
            .max_by_key(|(rank, _)| *rank)
            .map(|(_, index)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> FrameworkName {
        MonikerResolver.parse(name).unwrap()
    }

    #[test]
    fn parse_monikers() {
        let net = parse("net8.0");
        assert_eq!(net.identifier(), "net");
        assert_eq!(net.version(), Version::new(8, 0, 0, 0));
        assert_eq!(net.platform(), None);

        let framework = parse("net462");
        assert_eq!(framework.version(), Version::new(4, 6, 2, 0));

        let windows = parse("net8.0-windows");
        assert_eq!(windows.platform(), Some("windows"));
        assert_eq!(windows.to_string(), "net8.0-windows");

        assert_eq!(parse("TestFX1.0").to_string(), "testfx1.0");
        assert_eq!(parse("netstandard2.0").identifier(), "netstandard");
    }

    #[test]
    fn parse_special_frameworks() {
        assert!(parse("portable-net45+win8").is_portable());
        assert!(parse("any").is_aggregate());
        assert!(!parse("net5.0").is_aggregate());
    }

    #[test]
    fn reject_malformed() {
        for name in ["", "net", "8.0", "net8.x", "net12345"] {
            assert!(MonikerResolver.parse(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn nearest_same_identifier() {
        let candidates = [parse("net6.0"), parse("net8.0"), parse("net9.0"), parse("net7.0")];

        assert_eq!(MonikerResolver.nearest(&parse("net8.0"), &candidates), Some(1));
        assert_eq!(MonikerResolver.nearest(&parse("net7.0"), &candidates), Some(3));
        assert_eq!(MonikerResolver.nearest(&parse("net5.0"), &candidates), None);
    }

    #[test]
    fn nearest_prefers_identifier_over_netstandard() {
        let candidates = [parse("netstandard2.0"), parse("net6.0")];

        assert_eq!(MonikerResolver.nearest(&parse("net8.0"), &candidates), Some(1));
        assert_eq!(MonikerResolver.nearest(&parse("net472"), &candidates), Some(0));
        assert_eq!(MonikerResolver.nearest(&parse("net45"), &candidates), None);
    }

    #[test]
    fn nearest_respects_platform() {
        let candidates = [parse("net8.0"), parse("net8.0-windows"), parse("net8.0-android")];

        assert_eq!(MonikerResolver.nearest(&parse("net8.0-windows"), &candidates), Some(1));
        assert_eq!(MonikerResolver.nearest(&parse("net8.0"), &candidates), Some(0));
        assert_eq!(MonikerResolver.nearest(&parse("net8.0-ios"), &candidates), Some(0));
    }
}
