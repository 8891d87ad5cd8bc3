//! Four-part version numbers used by framework names and platform support facts.
//!
//! # Examples
//!
//! ```rust
//! use apicatalog::Version;
//!
//! let version = Version::parse("10.0.19041")?;
//! assert_eq!(version.major, 10);
//! assert_eq!(version.build, 19041);
//! assert_eq!(version.to_string(), "10.0.19041");
//! assert_eq!(Version::new(5, 0, 0, 0).to_string(), "5.0");
//! # Ok::<(), apicatalog::Error>(())
//! ```

use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A `major.minor.build.revision` version; missing components are zero.
///
/// Versions order lexicographically by component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    /// Major version component.
    pub major: u32,
    /// Minor version component.
    pub minor: u32,
    /// Build version component.
    pub build: u32,
    /// Revision version component.
    pub revision: u32,
}

impl Version {
    /// The version `0.0`, used for platforms without an explicit version.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Parses a dotted version string with one to four components.
    ///
    /// # Errors
    /// Returns [`Error::Argument`] for an empty string, more than four components or a
    /// component that is not a decimal number.
    pub fn parse(version_str: &str) -> Result<Self> {
        let parts: Vec<&str> = version_str.split('.').collect();

        if version_str.is_empty() || parts.len() > 4 {
            return Err(Error::Argument(format!(
                "Invalid version format: '{version_str}'"
            )));
        }

        let mut components = [0u32; 4];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part.parse::<u32>().map_err(|_| {
                Error::Argument(format!("Invalid version component: '{part}'"))
            })?;
        }

        Ok(Self::new(
            components[0],
            components[1],
            components[2],
            components[3],
        ))
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    /// Formats as `major.minor`, adding build and revision only when they are non-zero.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if self.build != 0 || self.revision != 0 {
            write!(f, ".{}", self.build)?;
        }
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_versions() {
        assert_eq!(Version::parse("1").unwrap(), Version::new(1, 0, 0, 0));
        assert_eq!(Version::parse("4.7.2").unwrap(), Version::new(4, 7, 2, 0));
        assert_eq!(
            Version::parse("10.0.19041.1").unwrap(),
            Version::new(10, 0, 19041, 1)
        );
    }

    #[test]
    fn parse_invalid() {
        for input in ["", "1.x", "1.2.3.4.5", "-1", "1..2"] {
            assert!(
                matches!(Version::parse(input), Err(Error::Argument(_))),
                "{input} should not parse"
            );
        }
    }

    #[test]
    fn display_omits_zero_tail() {
        assert_eq!(Version::new(5, 0, 0, 0).to_string(), "5.0");
        assert_eq!(Version::new(10, 0, 19041, 0).to_string(), "10.0.19041");
        assert_eq!(Version::new(1, 2, 0, 4).to_string(), "1.2.0.4");
    }

    #[test]
    fn ordering() {
        assert!(Version::new(10, 0, 0, 0) > Version::new(9, 9, 9, 9));
        assert!(Version::new(1, 2, 0, 0) < Version::new(1, 2, 0, 1));
        assert_eq!(Version::default(), Version::ZERO);
    }
}
