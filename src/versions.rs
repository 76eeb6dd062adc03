use crate::{error::VersionError, version::Version};
use core::{cmp::Ordering, ops::Deref};

/// A collection of versions, usually parsed with the same layout, that can be sorted from newest
/// to oldest.
///
/// # Example
///
/// ```
/// use calver::{Version, Versions};
/// use chrono::Utc;
///
/// let template = Version::new("YYYY.0M.MICRO", &Utc::now()).unwrap();
/// let mut versions: Versions = ["2012.12.1", "2012.12.20", "2012.11.30"]
///     .iter()
///     .map(|value| template.parse(value).unwrap())
///     .collect();
/// assert_eq!("2012.12.20", versions.latest().unwrap().to_string());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions(Vec<Version>);

impl Versions {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version to the end of the collection.
    pub fn push(&mut self, version: Version) {
        self.0.push(version);
    }

    /// Sorts the versions in place, newest first. The sort is stable.
    ///
    /// Versions are compared by timestamp, then `MAJOR`, `MINOR` and `MICRO`, then modifier. A
    /// version without a modifier is newer than one with a modifier, and two modifiers compare
    /// lexically.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| recency(b, a));
    }

    /// Sorts the collection and returns the newest version.
    ///
    /// # Errors
    ///
    /// - Returns a [`VersionError::NoVersions`] if the collection is empty.
    pub fn latest(&mut self) -> Result<&Version, VersionError> {
        self.sort();
        self.0.first().ok_or(VersionError::NoVersions)
    }

    /// Returns the underlying vector, in its current order.
    pub fn into_inner(self) -> Vec<Version> {
        self.0
    }
}

/// Orders `a` against `b` by how recent it is: `Greater` means `a` is newer.
fn recency(a: &Version, b: &Version) -> Ordering {
    a.timestamp()
        .cmp(b.timestamp())
        .then(a.major().cmp(&b.major()))
        .then(a.minor().cmp(&b.minor()))
        .then(a.micro().cmp(&b.micro()))
        .then_with(|| match (a.modifier(), b.modifier()) {
            ("", "") => Ordering::Equal,
            ("", _) => Ordering::Greater,
            (_, "") => Ordering::Less,
            (a, b) => a.cmp(b),
        })
}

impl Deref for Versions {
    type Target = [Version];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Version>> for Versions {
    fn from(versions: Vec<Version>) -> Self {
        Self(versions)
    }
}

impl FromIterator<Version> for Versions {
    fn from_iter<I: IntoIterator<Item = Version>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Versions {
    type Item = Version;
    type IntoIter = std::vec::IntoIter<Version>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
