//! Hierarchical packet names and prefix filters
//!
//! A `Name` is an ordered list of opaque byte components. Names address
//! both requests and responses; matching is always exact-or-prefix, never
//! wildcard. `InterestFilter` wraps a name used as a prefix pattern for
//! local dispatch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Hierarchical name: an ordered list of opaque byte components.
///
/// Parsed from `/`-separated strings for convenience; arbitrary byte
/// components can be attached with [`Name::append`]. The textual form
/// does not interpret percent-escapes; a component that is not printable
/// ASCII is displayed as `%` followed by its hex encoding.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<Vec<u8>>,
}

impl Name {
    /// The empty (root) name, written `/`.
    pub fn root() -> Self {
        Name { components: Vec::new() }
    }

    /// Append one component. Accepts strings or raw bytes.
    pub fn append(mut self, component: impl Into<Vec<u8>>) -> Self {
        self.components.push(component.into());
        self
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component at `index`, if present.
    pub fn component(&self, index: usize) -> Option<&[u8]> {
        self.components.get(index).map(Vec::as_slice)
    }

    /// Iterate over components in order.
    pub fn components(&self) -> impl Iterator<Item = &[u8]> {
        self.components.iter().map(Vec::as_slice)
    }

    /// The first `n` components as a new name. Returns the whole name if
    /// `n >= len`.
    pub fn prefix(&self, n: usize) -> Name {
        Name { components: self.components.iter().take(n).cloned().collect() }
    }

    /// True if every component of `self` equals the corresponding leading
    /// component of `other`. Every name is a prefix of itself; the root
    /// name is a prefix of every name.
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        if self.components.len() > other.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(other.components.iter())
            .all(|(a, b)| a == b)
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        let components = uri
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| seg.as_bytes().to_vec())
            .collect();
        Name { components }
    }
}

impl From<String> for Name {
    fn from(uri: String) -> Self {
        Name::from(uri.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/")?;
            if component.iter().all(|b| b.is_ascii_graphic() && *b != b'/' && *b != b'%') {
                // Safe: all bytes are ASCII graphic
                f.write_str(std::str::from_utf8(component).unwrap_or("?"))?;
            } else {
                write!(f, "%{}", hex::encode(component))?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

/// A name-prefix pattern for local Interest dispatch.
///
/// A filter matches a name when its prefix equals the name or is a proper
/// prefix of it. Filters are local subscriptions only; they do not imply
/// any forwarding-layer registration.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InterestFilter {
    prefix: Name,
}

impl InterestFilter {
    pub fn new(prefix: Name) -> Self {
        InterestFilter { prefix }
    }

    pub fn prefix(&self) -> &Name {
        &self.prefix
    }

    /// True if `name` equals the filter prefix or extends it.
    pub fn matches(&self, name: &Name) -> bool {
        self.prefix.is_prefix_of(name)
    }
}

impl From<Name> for InterestFilter {
    fn from(prefix: Name) -> Self {
        InterestFilter { prefix }
    }
}

impl From<&str> for InterestFilter {
    fn from(uri: &str) -> Self {
        InterestFilter { prefix: Name::from(uri) }
    }
}

impl fmt::Display for InterestFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)
    }
}
