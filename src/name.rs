//! Hierarchical names and opaque handles.
//!
//! These are the minimal shapes the engine needs from the surrounding forwarder:
//! a request name split into components, a link handle, and a request handle.
//! The packet format itself lives elsewhere.

use std::fmt;

/// Hierarchical request name, e.g. `/prefix/video/seg=3`.
///
/// Ordering is lexicographic by component, so a `Name` can key a `BTreeMap`
/// directly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// The root name `/` (zero components).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a URI-like name. Empty components are skipped, so `"/a//b/"` is `/a/b`.
    pub fn parse(uri: &str) -> Self {
        Self {
            components: uri
                .split('/')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Build a name from already-split components; empty ones are dropped as in
    /// [`parse`](Self::parse).
    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            components: components
                .into_iter()
                .map(Into::into)
                .filter(|c: &String| !c.is_empty())
                .collect(),
        }
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The first `depth` components (all of them if the name is shorter).
    #[must_use]
    pub fn prefix(&self, depth: usize) -> Name {
        let n = depth.min(self.components.len());
        Name {
            components: self.components[..n].to_vec(),
        }
    }

    /// Append one component.
    #[must_use]
    pub fn child(&self, component: impl Into<String>) -> Name {
        let mut components = self.components.clone();
        components.push(component.into());
        Name { components }
    }

    /// True if `self` is a (non-strict) prefix of `other`.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        other.components.starts_with(&self.components)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for c in &self.components {
            write!(f, "/{c}")?;
        }
        Ok(())
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        Name::parse(uri)
    }
}

impl From<String> for Name {
    fn from(uri: String) -> Self {
        Name::parse(&uri)
    }
}

/// Identifier of an outgoing/incoming link in the forwarder's face table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaceId(pub u64);

/// A forwarding choice is simply the face to send on.
pub type Action = FaceId;

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face{}", self.0)
    }
}

impl From<u64> for FaceId {
    fn from(id: u64) -> Self {
        FaceId(id)
    }
}

/// Collaborator-supplied handle for one outstanding request.
///
/// The same handle must be passed to the decision call and to the later outcome
/// call; it keys the pending-decision ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        RequestId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_empty_components() {
        let n = Name::parse("/a//b/");
        assert_eq!(n.components(), &["a".to_string(), "b".to_string()]);
        assert_eq!(n.to_string(), "/a/b");
        assert_eq!(Name::parse("/").to_string(), "/");
        assert!(Name::parse("").is_empty());
    }

    #[test]
    fn from_components_matches_parse() {
        let n = Name::from_components(["prefix", "", "video"]);
        assert_eq!(n, Name::parse("/prefix/video"));
        assert_eq!(n.len(), 2);
        assert_eq!(Name::from_components(Vec::<String>::new()), Name::root());
    }

    #[test]
    fn prefix_keeps_everything_when_short() {
        let n = Name::parse("/prefix/video/seg=3");
        assert_eq!(n.prefix(2), Name::parse("/prefix/video"));
        assert_eq!(n.prefix(10), n);
        assert_eq!(n.prefix(0), Name::root());
        assert!(n.prefix(1).is_prefix_of(&n));
        assert!(!n.is_prefix_of(&n.prefix(1)));
    }

    #[test]
    fn ordering_is_by_component() {
        let a = Name::parse("/a/b");
        let b = Name::parse("/a/c");
        let c = Name::parse("/a");
        assert!(a < b);
        assert!(c < a);
        assert_eq!(a.child("x"), Name::parse("/a/b/x"));
    }
}
