//! Node and child-state types for the symbol hierarchy.

use serde::{Deserialize, Serialize};

/// Opaque reference to a subtree fragment that a loader can fetch.
///
/// The wire format historically overloads one string as both a node's
/// documentation target and its subtree reference; the index model keeps the
/// two apart, so a `FragmentRef` is only ever a fetch key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentRef(String);

impl FragmentRef {
    /// Create a fragment reference.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The raw reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the reference string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FragmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentRef {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

/// One entry in the symbol hierarchy (namespace, type, or member).
///
/// `name` is the display label, unique among siblings. `id` is the
/// documentation target, globally unique within the index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Node {
    /// Display label.
    pub name: String,
    /// Documentation-target id.
    pub id: String,
}

/// Known child state of a node, as returned by
/// [`SymbolIndex::children_of`](crate::SymbolIndex::children_of).
///
/// Per node the only legal transition is `Unloaded -> Loaded`; a `Leaf`
/// stays a leaf for the life of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Children {
    /// True leaf, no children now or later.
    Leaf,
    /// Children exist but their fragment has not been fetched yet.
    Unloaded(FragmentRef),
    /// Children in fragment submission order.
    Loaded(Vec<Node>),
}

impl Children {
    /// True if the child list has been resolved (leaf counts as resolved).
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unloaded(_))
    }

    /// The pending fragment reference, if any.
    #[must_use]
    pub fn fragment_ref(&self) -> Option<&FragmentRef> {
        match self {
            Self::Unloaded(fragment_ref) => Some(fragment_ref),
            Self::Leaf | Self::Loaded(_) => None,
        }
    }
}
