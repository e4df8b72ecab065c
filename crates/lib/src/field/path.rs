//! Dotted field paths.
//!
//! A [`FieldPath`] is a dot-separated sequence of name segments applied
//! left-to-right against a document root. Paths are normalized on
//! construction: empty components are filtered, so `".a..b."` and `"a.b"`
//! name the same field. Construction is infallible; an all-dots input is
//! simply the empty path, which resolves to the document root.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalizes a path string by cleaning up dots and empty components.
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// An owned, normalized dotted path for hierarchical document access.
///
/// # Examples
///
/// ```
/// use silt::field::FieldPath;
///
/// let path: FieldPath = "user.profile.name".parse().unwrap();
/// let components: Vec<&str> = path.components().collect();
/// assert_eq!(components, vec!["user", "profile", "name"]);
///
/// // Construction normalizes stray dots
/// assert_eq!(FieldPath::new("user..name").as_str(), "user.name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    inner: String,
}

impl FieldPath {
    /// Creates a path by normalizing the input string.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self {
            inner: normalize_path(path.as_ref()),
        }
    }

    /// Creates the empty path, which resolves to the document root.
    pub fn root() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Returns an iterator over the path components as string slices.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.inner.split('.').filter(|s| !s.is_empty())
    }

    /// Returns the number of components in the path.
    pub fn len(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split('.').count()
        }
    }

    /// Returns `true` if the path has no components.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}
