//! Step functions over `(version, supported)` facts for a single platform.

use std::fmt;

use crate::Version;

/// A span of versions, `start` inclusive and `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionRange {
    /// First version of the range.
    pub start: Version,
    /// First version after the range; `None` if the range is open.
    pub end: Option<Version>,
}

impl VersionRange {
    /// Returns `true` if `version` lies in the range.
    #[must_use]
    pub fn contains(&self, version: &Version) -> bool {
        *version >= self.start && self.end.map_or(true, |end| *version < end)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            None if self.start == Version::ZERO => f.write_str("any"),
            None => write!(f, ">= {}", self.start),
            Some(end) => write!(f, "{} - {}", self.start, end),
        }
    }
}

/// Support of one platform as a function of its version.
///
/// The range is a list of state changes: the head fixes the state from its version on, and
/// each tail entry flips it. Versions below the head take the opposite of the head's state, so
/// an allow-list (head supported) is unsupported below its head and a deny-list (head
/// unsupported) is supported below it.
///
/// Two ranges are equal exactly when they answer every query the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformSupportRange {
    head: Version,
    is_allow_list: bool,
    tail: Vec<(Version, bool)>,
}

impl PlatformSupportRange {
    /// Builds a range from an unordered bag of facts.
    ///
    /// Facts are ordered by version, unsupported first. A version carrying both a supported and
    /// an unsupported fact is ambiguous and all its facts are dropped. Facts that do not change
    /// the state are dropped too. Returns `None` if no fact remains.
    #[must_use]
    pub fn new<I>(facts: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Version, bool)>,
    {
        let mut facts: Vec<(Version, bool)> = facts.into_iter().collect();
        facts.sort_unstable();
        facts.dedup();

        let mut kept: Vec<(Version, bool)> = Vec::with_capacity(facts.len());
        let mut index = 0;
        while index < facts.len() {
            let (version, supported) = facts[index];
            if facts
                .get(index + 1)
                .is_some_and(|(next, _)| *next == version)
            {
                index += 2;
                continue;
            }
            index += 1;

            if kept.last().is_some_and(|(_, last)| *last == supported) {
                continue;
            }
            kept.push((version, supported));
        }

        let mut kept = kept.into_iter();
        let (head, is_allow_list) = kept.next()?;
        Some(PlatformSupportRange {
            head,
            is_allow_list,
            tail: kept.collect(),
        })
    }

    /// Returns `true` if the head marks the platform as supported.
    #[must_use]
    pub fn is_allow_list(&self) -> bool {
        self.is_allow_list
    }

    /// Returns the version of the first state change.
    #[must_use]
    pub fn head(&self) -> Version {
        self.head
    }

    /// Returns the state changes following the head.
    #[must_use]
    pub fn tail(&self) -> &[(Version, bool)] {
        &self.tail
    }

    /// Returns `true` if the platform is supported at `version`.
    #[must_use]
    pub fn is_supported(&self, version: &Version) -> bool {
        if *version < self.head {
            return !self.is_allow_list;
        }

        self.tail
            .iter()
            .take_while(|(start, _)| start <= version)
            .last()
            .map_or(self.is_allow_list, |(_, supported)| *supported)
    }

    /// Returns `true` if some version of the platform is supported.
    #[must_use]
    pub fn is_supported_anywhere(&self) -> bool {
        self.is_allow_list
            || self.head > Version::ZERO
            || self.tail.iter().any(|(_, supported)| *supported)
    }

    /// Returns the version ranges whose state matches the head: the supported ranges of an
    /// allow-list, the unsupported ranges of a deny-list.
    #[must_use]
    pub fn compute_versions(&self) -> Vec<VersionRange> {
        let changes: Vec<(Version, bool)> = std::iter::once((self.head, self.is_allow_list))
            .chain(self.tail.iter().copied())
            .collect();

        changes
            .iter()
            .enumerate()
            .filter(|(_, (_, state))| *state == self.is_allow_list)
            .map(|(index, (start, _))| VersionRange {
                start: *start,
                end: changes.get(index + 1).map(|(end, _)| *end),
            })
            .collect()
    }
}

impl fmt::Display for PlatformSupportRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, range) in self.compute_versions().iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(major: u32, minor: u32) -> Version {
        Version::new(major, minor, 0, 0)
    }

    #[test]
    fn single_supported_fact() {
        let range = PlatformSupportRange::new([(v(10, 0), true)]).unwrap();

        assert!(range.is_allow_list());
        assert!(!range.is_supported(&v(8, 1)));
        assert!(range.is_supported(&v(10, 0)));
        assert!(range.is_supported(&v(11, 0)));
        assert_eq!(range.to_string(), ">= 10.0");
    }

    #[test]
    fn single_unsupported_fact() {
        let range = PlatformSupportRange::new([(Version::ZERO, false)]).unwrap();

        assert!(!range.is_allow_list());
        assert!(!range.is_supported(&v(1, 0)));
        assert!(!range.is_supported_anywhere());
        assert_eq!(range.to_string(), "any");
    }

    #[test]
    fn bounded_range() {
        let range =
            PlatformSupportRange::new([(v(15, 0), false), (v(13, 0), true), (v(14, 0), true)])
                .unwrap();

        assert_eq!(range.head(), v(13, 0));
        assert_eq!(range.tail(), [(v(15, 0), false)]);
        assert!(range.is_supported(&v(14, 2)));
        assert!(!range.is_supported(&v(15, 0)));
        assert_eq!(
            range.compute_versions(),
            [VersionRange {
                start: v(13, 0),
                end: Some(v(15, 0)),
            }]
        );
        assert_eq!(range.to_string(), "13.0 - 15.0");
    }

    #[test]
    fn deny_list_reports_unsupported_span() {
        let range = PlatformSupportRange::new([(v(2, 0), false), (v(3, 0), true)]).unwrap();

        assert!(!range.is_allow_list());
        assert!(range.is_supported(&v(1, 0)));
        assert!(!range.is_supported(&v(2, 5)));
        assert!(range.is_supported(&v(3, 0)));
        assert!(range.is_supported_anywhere());
        assert_eq!(range.to_string(), "2.0 - 3.0");
    }

    #[test]
    fn conflicting_facts_are_dropped() {
        assert!(PlatformSupportRange::new([(v(1, 0), true), (v(1, 0), false)]).is_none());

        let range = PlatformSupportRange::new([
            (v(1, 0), true),
            (v(2, 0), false),
            (v(2, 0), true),
        ])
        .unwrap();
        assert_eq!(range.head(), v(1, 0));
        assert!(range.tail().is_empty());
    }

    #[test]
    fn empty_input() {
        assert!(PlatformSupportRange::new([]).is_none());
    }

    #[test]
    fn open_ended_from_zero() {
        let range = PlatformSupportRange::new([(Version::ZERO, true)]).unwrap();
        assert_eq!(range.to_string(), "any");
    }

    fn facts() -> impl Strategy<Value = Vec<(Version, bool)>> {
        prop::collection::vec(((0u32..6, 0u32..3), any::<bool>()), 0..12).prop_map(|facts| {
            facts
                .into_iter()
                .map(|((major, minor), supported)| (v(major, minor), supported))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn input_order_does_not_matter(facts in facts()) {
            let mut reversed = facts.clone();
            reversed.reverse();
            prop_assert_eq!(
                PlatformSupportRange::new(facts),
                PlatformSupportRange::new(reversed)
            );
        }

        #[test]
        fn state_alternates(facts in facts()) {
            if let Some(range) = PlatformSupportRange::new(facts) {
                let mut previous = range.is_allow_list();
                let mut version = range.head();
                for (next, supported) in range.tail() {
                    prop_assert!(*supported != previous);
                    prop_assert!(*next > version);
                    previous = *supported;
                    version = *next;
                }
            }
        }

        #[test]
        fn kept_facts_are_answered(facts in facts()) {
            if let Some(range) = PlatformSupportRange::new(facts) {
                prop_assert_eq!(range.is_supported(&range.head()), range.is_allow_list());
                for (version, supported) in range.tail() {
                    prop_assert_eq!(range.is_supported(version), *supported);
                }
            }
        }
    }
}
