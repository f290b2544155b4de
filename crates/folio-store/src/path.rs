//! Typed store paths
//!
//! Documents and collections alternate: `works` is a collection, `works/w1` a
//! document, `works/w1/comments` a subcollection and so on. [`CollectionPath`]
//! always has an odd number of segments and [`DocPath`] an even number, so a
//! path can never be used in the wrong position.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Path of a single document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocPath(Vec<String>);

/// Path of a collection of documents
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionPath(Vec<String>);

impl CollectionPath {
    /// Top-level collection
    ///
    /// # Errors
    /// Returns error if `name` is not a valid segment
    pub fn root(name: impl Into<String>) -> Result<Self, PathError> {
        Ok(Self(vec![segment(name)?]))
    }

    /// Document inside this collection
    ///
    /// # Errors
    /// Returns error if `id` is not a valid segment
    pub fn doc(&self, id: impl Into<String>) -> Result<DocPath, PathError> {
        let mut segments = self.0.clone();
        segments.push(segment(id)?);
        Ok(DocPath(segments))
    }

    /// Document owning this collection, `None` for top-level collections
    #[must_use]
    pub fn parent(&self) -> Option<DocPath> {
        if self.0.len() < 3 {
            return None;
        }
        Some(DocPath(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Collection name (last segment)
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        // Never empty: every constructor pushes at least one segment.
        self.0.last().map_or("", String::as_str)
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Whether `doc` is a direct child of this collection
    #[must_use]
    pub fn contains(&self, doc: &DocPath) -> bool {
        doc.0.len() == self.0.len() + 1 && doc.0[..self.0.len()] == self.0[..]
    }
}

impl DocPath {
    /// Subcollection under this document
    ///
    /// # Errors
    /// Returns error if `name` is not a valid segment
    pub fn collection(&self, name: impl Into<String>) -> Result<CollectionPath, PathError> {
        let mut segments = self.0.clone();
        segments.push(segment(name)?);
        Ok(CollectionPath(segments))
    }

    /// Collection holding this document
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        CollectionPath(self.0[..self.0.len() - 1].to_vec())
    }

    /// Document id (last segment)
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

fn segment(raw: impl Into<String>) -> Result<String, PathError> {
    let raw = raw.into();
    if raw.is_empty() {
        Err(PathError::EmptySegment)
    } else if raw.contains('/') {
        Err(PathError::InvalidSegment(raw))
    } else {
        Ok(raw)
    }
}

fn split(raw: &str) -> Result<Vec<String>, PathError> {
    raw.split('/').map(segment).collect()
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl Display for CollectionPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = split(s)?;
        if segments.len() % 2 != 0 {
            return Err(PathError::NotADocument(s.to_string()));
        }
        Ok(Self(segments))
    }
}

impl FromStr for CollectionPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = split(s)?;
        if segments.len() % 2 == 0 {
            return Err(PathError::NotACollection(s.to_string()));
        }
        Ok(Self(segments))
    }
}

impl Serialize for DocPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Errors related to store paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Segment containing a separator
    #[error("invalid segment: {0} (must not contain '/')")]
    InvalidSegment(String),

    /// Odd segment count where a document was expected
    #[error("'{0}' is not a document path")]
    NotADocument(String),

    /// Even segment count where a collection was expected
    #[error("'{0}' is not a collection path")]
    NotACollection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_paths() {
        let works = CollectionPath::root("works").unwrap();
        let work = works.doc("w1").unwrap();
        let comments = work.collection("comments").unwrap();
        let comment = comments.doc("c1").unwrap();

        assert_eq!(comment.to_string(), "works/w1/comments/c1");
        assert_eq!(comment.id(), "c1");
        assert_eq!(comment.parent(), comments);
        assert_eq!(comments.parent(), Some(work));
        assert_eq!(comments.name(), "comments");
        assert!(works.parent().is_none());
    }

    #[test]
    fn contains_only_direct_children() {
        let works = CollectionPath::root("works").unwrap();
        let work: DocPath = "works/w1".parse().unwrap();
        let comment: DocPath = "works/w1/comments/c1".parse().unwrap();

        assert!(works.contains(&work));
        assert!(!works.contains(&comment));
    }

    #[test]
    fn parses_by_segment_parity() {
        assert!("users/u1".parse::<DocPath>().is_ok());
        assert!(matches!(
            "users".parse::<DocPath>(),
            Err(PathError::NotADocument(_))
        ));
        assert!(matches!(
            "users/u1".parse::<CollectionPath>(),
            Err(PathError::NotACollection(_))
        ));
        assert!(matches!(
            "users//u1".parse::<CollectionPath>(),
            Err(PathError::EmptySegment)
        ));
    }

    #[test]
    fn rejects_separator_in_segment() {
        let works = CollectionPath::root("works").unwrap();
        assert!(matches!(
            works.doc("a/b"),
            Err(PathError::InvalidSegment(_))
        ));
        assert!(matches!(works.doc(""), Err(PathError::EmptySegment)));
    }

    #[test]
    fn doc_path_serializes_as_string() {
        let path: DocPath = "users/u1".parse().unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"users/u1\"");
        let back: DocPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
