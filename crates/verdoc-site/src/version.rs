//! Version identifiers and the ordered list of versions to publish.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

use crate::error::SiteError;

/// A publishable documentation set: the development branch or a release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    name: String,
    /// Numeric components of a release tag; `None` for the development token.
    precedence: Option<Vec<u64>>,
}

impl Version {
    /// The development token (a branch name, "latest", ...).
    pub fn development(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            precedence: None,
        }
    }

    /// Parse a dotted numeric release tag such as `v1.2.3`.
    ///
    /// One leading `v` or `V` is accepted. Every remaining component must be
    /// a non-empty run of ASCII digits.
    pub fn release(tag: &str) -> Result<Self, SiteError> {
        let malformed = || SiteError::MalformedVersionTag {
            tag: tag.to_string(),
        };

        let digits = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);

        let precedence = digits
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                part.parse::<u64>().map_err(|_| malformed())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: tag.to_string(),
            precedence: Some(precedence),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_development(&self) -> bool {
        self.precedence.is_none()
    }

    /// Numeric components of a release, empty for the development token.
    pub fn precedence(&self) -> &[u64] {
        self.precedence.as_deref().unwrap_or(&[])
    }

    /// Publishing order: development first, then releases newest first.
    pub fn publish_order(&self, other: &Self) -> Ordering {
        match (&self.precedence, &other.precedence) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(a),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ordered versions for one publish run, development token first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionList {
    versions: Vec<Version>,
}

impl VersionList {
    /// Build the list from the development token and a raw tag listing
    /// (one tag per line, as printed by `git tag --list`).
    pub fn resolve(development: &str, tag_listing: &str) -> Result<Self, SiteError> {
        let mut seen = HashSet::new();
        seen.insert(development.to_string());

        let mut releases = Vec::new();
        for line in tag_listing.lines() {
            let tag = line.trim();
            if tag.is_empty() || !seen.insert(tag.to_string()) {
                continue;
            }
            releases.push(Version::release(tag)?);
        }

        // Stable, so tags with equal precedence (v1.0 and 1.0) keep listing order.
        releases.sort_by(|a, b| a.publish_order(b));

        let mut versions = Vec::with_capacity(releases.len() + 1);
        versions.push(Version::development(development));
        versions.extend(releases);

        Ok(Self { versions })
    }

    pub fn development(&self) -> &Version {
        &self.versions[0]
    }

    pub fn releases(&self) -> &[Version] {
        &self.versions[1..]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.versions.iter().map(Version::name).collect()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Always false: the development token is always present.
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

impl<'a> IntoIterator for &'a VersionList {
    type Item = &'a Version;
    type IntoIter = std::slice::Iter<'a, Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.versions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_development_first_then_numeric_descending() {
        let list = VersionList::resolve("master", "v1.2.0\nv1.10.0\nv1.1.0\n").unwrap();

        assert_eq!(list.names(), ["master", "v1.10.0", "v1.2.0", "v1.1.0"]);
    }

    #[test]
    fn sorts_numerically_not_lexically() {
        let list = VersionList::resolve("main", "v1.9.0\nv1.10.0").unwrap();

        assert_eq!(list.names(), ["main", "v1.10.0", "v1.9.0"]);
    }

    #[test]
    fn development_first_whatever_its_text() {
        for dev in ["0.0.1", "zzz", "v99.0.0-dev", "latest"] {
            let list = VersionList::resolve(dev, "v2.0.0\nv10.0.0").unwrap();

            assert_eq!(list.development().name(), dev);
            assert!(list.development().is_development());
            assert_eq!(list.releases().len(), 2);
        }
    }

    #[test]
    fn skips_blank_lines_and_duplicates() {
        let list = VersionList::resolve("master", "\n  v0.1.0  \n\nv0.1.0\nmaster\n").unwrap();

        assert_eq!(list.names(), ["master", "v0.1.0"]);
    }

    #[test]
    fn longer_tuple_sorts_before_its_prefix() {
        let list = VersionList::resolve("dev", "1.2\n1.2.1\n0.9").unwrap();

        assert_eq!(list.names(), ["dev", "1.2.1", "1.2", "0.9"]);
    }

    #[test]
    fn empty_listing_yields_only_development() {
        let list = VersionList::resolve("master", "").unwrap();

        assert_eq!(list.len(), 1);
        assert!(list.releases().is_empty());
    }

    #[test]
    fn parses_release_components() {
        let version = Version::release("V3.04.1").unwrap();

        assert_eq!(version.precedence(), &[3, 4, 1]);
        assert_eq!(version.name(), "V3.04.1");
        assert!(!version.is_development());
    }

    #[test]
    fn rejects_malformed_tags() {
        for tag in ["v1.2.3-rc1", "release-1", "vv1.0", "1..2", "v", "1.2.", "1.x"] {
            let err = Version::release(tag).unwrap_err();

            assert!(
                matches!(&err, SiteError::MalformedVersionTag { tag: t } if t == tag),
                "{tag} should be malformed"
            );
        }
    }

    #[test]
    fn malformed_tag_fails_resolution() {
        let result = VersionList::resolve("master", "v1.0.0\nnightly\n");

        assert!(matches!(
            result,
            Err(SiteError::MalformedVersionTag { tag }) if tag == "nightly"
        ));
    }
}
