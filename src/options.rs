//! Configuration for catalog loading and platform annotation.
//!
//! Options are plain values with a [`Default`] implementation matching the catalog format and
//! the .NET conventions it describes, plus a few named presets. Nothing is read from files or
//! the environment.

/// Options controlling [`crate::Catalog`] loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Walk every table after decompression and reject dangling references and invalid strings.
    ///
    /// Entity views read fields without bounds checks; disabling verification is only sound
    /// for catalogs produced by a trusted writer. A corrupt, unverified catalog may panic on
    /// access.
    pub verify: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { verify: true }
    }
}

impl LoadOptions {
    /// Options for catalogs from a trusted writer: no structural verification.
    #[must_use]
    pub fn trusted() -> Self {
        Self { verify: false }
    }
}

/// Options controlling [`crate::platform::PlatformAnnotationContext`] construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOptions {
    /// Full name of the type exposing one `Is<Platform>()` check per known platform.
    pub marker_type: String,
    /// Name of the attribute marking a platform check as a guard for an implied platform.
    pub guard_attribute: String,
    /// Prefix of platform check method names.
    pub method_prefix: String,
    /// Suffix of platform check method names; `()` restricts to parameterless checks.
    pub method_suffix: String,
    /// Frameworks with at least this major version are platform aware: an API without any
    /// platform support rows is unrestricted rather than unannotated.
    pub unrestricted_major_version: u32,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            marker_type: "System.OperatingSystem".to_string(),
            guard_attribute: "SupportedOSPlatformGuard".to_string(),
            method_prefix: "Is".to_string(),
            method_suffix: "()".to_string(),
            unrestricted_major_version: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_presets() {
        assert!(LoadOptions::default().verify);
        assert!(!LoadOptions::trusted().verify);
    }

    #[test]
    fn platform_defaults() {
        let options = PlatformOptions::default();
        assert_eq!(options.marker_type, "System.OperatingSystem");
        assert_eq!(options.guard_attribute, "SupportedOSPlatformGuard");
        assert_eq!(options.unrestricted_major_version, 5);
    }
}
