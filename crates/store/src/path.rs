//! Document and collection paths.
//!
//! Paths alternate collection and document segments:
//! `stores/{store}/carts/{user}` is a document path (even segment count),
//! `stores/{store}/orders` is a collection path (odd segment count).
//! Segments must be non-empty and must not contain `/`.

use std::fmt;

/// Errors that can occur when building a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Segments cannot be empty strings.
    #[error("path segment cannot be empty")]
    EmptySegment,
    /// Segments cannot contain the separator.
    #[error("path segment cannot contain '/': {0}")]
    SeparatorInSegment(String),
}

fn check_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    if segment.contains('/') {
        return Err(PathError::SeparatorInSegment(segment.to_owned()));
    }
    Ok(())
}

/// Path addressing a collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath {
    segments: Vec<String>,
}

impl CollectionPath {
    /// A top-level collection.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the name is empty or contains `/`.
    pub fn root(name: impl Into<String>) -> Result<Self, PathError> {
        let name = name.into();
        check_segment(&name)?;
        Ok(Self {
            segments: vec![name],
        })
    }

    /// Address a document inside this collection.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the id is empty or contains `/`.
    pub fn doc(&self, id: impl Into<String>) -> Result<DocPath, PathError> {
        let id = id.into();
        check_segment(&id)?;
        let mut segments = self.segments.clone();
        segments.push(id);
        Ok(DocPath { segments })
    }

    /// The path segments, alternating collection names and document ids.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether `doc` is a direct child of this collection.
    #[must_use]
    pub fn contains(&self, doc: &DocPath) -> bool {
        doc.segments.len() == self.segments.len() + 1
            && doc.segments.starts_with(&self.segments)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Path addressing a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    /// Address a subcollection of this document.
    ///
    /// # Errors
    ///
    /// Returns [`PathError`] if the name is empty or contains `/`.
    pub fn collection(&self, name: impl Into<String>) -> Result<CollectionPath, PathError> {
        let name = name.into();
        check_segment(&name)?;
        let mut segments = self.segments.clone();
        segments.push(name);
        Ok(CollectionPath { segments })
    }

    /// The collection this document belongs to.
    #[must_use]
    pub fn parent(&self) -> CollectionPath {
        // A DocPath always has at least two segments by construction.
        let mut segments = self.segments.clone();
        segments.pop();
        CollectionPath { segments }
    }

    /// The document id (final path segment).
    #[must_use]
    pub fn id(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// The path segments, alternating collection names and document ids.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_nested_paths() {
        let stores = CollectionPath::root("stores").unwrap();
        let store = stores.doc("s-1").unwrap();
        let orders = store.collection("orders").unwrap();
        let order = orders.doc("o-42").unwrap();

        assert_eq!(order.to_string(), "stores/s-1/orders/o-42");
        assert_eq!(order.id(), "o-42");
        assert_eq!(order.parent(), orders);
    }

    #[test]
    fn test_contains_direct_children_only() {
        let orders = CollectionPath::root("stores")
            .unwrap()
            .doc("s-1")
            .unwrap()
            .collection("orders")
            .unwrap();
        let order = orders.doc("o-1").unwrap();
        let nested = order.collection("events").unwrap().doc("e-1").unwrap();

        assert!(orders.contains(&order));
        assert!(!orders.contains(&nested));
    }

    #[test]
    fn test_rejects_empty_segment() {
        assert_eq!(CollectionPath::root(""), Err(PathError::EmptySegment));
        let stores = CollectionPath::root("stores").unwrap();
        assert_eq!(stores.doc(""), Err(PathError::EmptySegment));
    }

    #[test]
    fn test_rejects_separator_in_segment() {
        let stores = CollectionPath::root("stores").unwrap();
        assert!(matches!(
            stores.doc("a/b"),
            Err(PathError::SeparatorInSegment(_))
        ));
    }
}
