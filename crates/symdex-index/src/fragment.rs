//! Fragment model and wire-format parsing.
//!
//! A fragment is an ordered batch of sibling node descriptors for one parent,
//! as delivered by a loader. The wire format is a JSON array of 3-tuples
//! `[name, id, childrenSpec]` where `childrenSpec` is `null` for a leaf and a
//! fragment-reference string otherwise:
//!
//! ```json
//! [
//!     ["Cell", "types/cell", null],
//!     ["Geometry", "types/geometry", "frag/geometry"]
//! ]
//! ```
//!
//! The generator that emits this shape reuses one string as both the node's
//! documentation target and its subtree reference; the parsed model keeps
//! `id` and [`FragmentRef`] as distinct fields so consumers never have to
//! guess which role a string is playing.

use serde::Deserialize;

use crate::error::IndexError;
use crate::node::FragmentRef;

/// Child declaration of a node descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildrenSpec {
    /// The node is a true leaf.
    Leaf,
    /// The node has children behind the referenced fragment.
    Deferred(FragmentRef),
}

/// One sibling descriptor inside a fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSpec {
    /// Display label, unique among siblings.
    pub name: String,
    /// Documentation-target id, globally unique within the index.
    pub id: String,
    /// Leaf marker or deferred subtree reference.
    pub children: ChildrenSpec,
}

/// Ordered batch of sibling descriptors for one parent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    entries: Vec<NodeSpec>,
}

/// Raw wire entry: `[name, id, childrenSpec]`.
#[derive(Deserialize)]
struct WireEntry(String, String, Option<String>);

impl Fragment {
    /// Create an empty fragment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a leaf descriptor.
    #[must_use]
    pub fn with_leaf(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.entries.push(NodeSpec {
            name: name.into(),
            id: id.into(),
            children: ChildrenSpec::Leaf,
        });
        self
    }

    /// Append a descriptor with a deferred subtree.
    #[must_use]
    pub fn with_deferred(
        mut self,
        name: impl Into<String>,
        id: impl Into<String>,
        fragment_ref: impl Into<FragmentRef>,
    ) -> Self {
        self.entries.push(NodeSpec {
            name: name.into(),
            id: id.into(),
            children: ChildrenSpec::Deferred(fragment_ref.into()),
        });
        self
    }

    /// Parse a fragment from its JSON wire form.
    ///
    /// A non-null third element becomes the entry's [`FragmentRef`]; the
    /// second element is always the node's own documentation target.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedFragment`] if the JSON does not match
    /// the wire shape or an entry fails structural validation, and
    /// [`IndexError::DuplicateId`] if two entries carry the same id.
    pub fn from_json(json: &str) -> Result<Self, IndexError> {
        let wire: Vec<WireEntry> = serde_json::from_str(json)
            .map_err(|e| IndexError::malformed(format!("invalid fragment JSON: {e}")))?;

        let entries = wire
            .into_iter()
            .map(|WireEntry(name, id, children)| NodeSpec {
                name,
                id,
                children: match children {
                    Some(fragment_ref) => ChildrenSpec::Deferred(FragmentRef::new(fragment_ref)),
                    None => ChildrenSpec::Leaf,
                },
            })
            .collect();

        let fragment = Self { entries };
        fragment.validate()?;
        Ok(fragment)
    }

    /// Sibling descriptors in submission order.
    #[must_use]
    pub fn entries(&self) -> &[NodeSpec] {
        &self.entries
    }

    /// Number of sibling descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the fragment carries no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the fragment, yielding its descriptors.
    #[must_use]
    pub(crate) fn into_entries(self) -> Vec<NodeSpec> {
        self.entries
    }

    /// Structural validation of the batch.
    ///
    /// Checks each descriptor for empty fields and the batch for duplicate
    /// sibling names and duplicate ids. Id collisions against the rest of
    /// the index are the ingest path's job.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedFragment`] or [`IndexError::DuplicateId`].
    pub fn validate(&self) -> Result<(), IndexError> {
        let mut names = std::collections::HashSet::new();
        let mut ids = std::collections::HashSet::new();

        for (position, entry) in self.entries.iter().enumerate() {
            if entry.name.is_empty() {
                return Err(IndexError::malformed(format!(
                    "empty name at entry {position}"
                )));
            }
            if entry.id.is_empty() {
                return Err(IndexError::malformed(format!(
                    "empty id at entry {position} ({})",
                    entry.name
                )));
            }
            if let ChildrenSpec::Deferred(fragment_ref) = &entry.children
                && fragment_ref.is_empty()
            {
                // A node claiming children must point somewhere fetchable.
                return Err(IndexError::malformed(format!(
                    "empty fragment reference at entry {position} ({})",
                    entry.name
                )));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(IndexError::malformed(format!(
                    "duplicate sibling name: {}",
                    entry.name
                )));
            }
            if !ids.insert(entry.id.as_str()) {
                return Err(IndexError::DuplicateId {
                    id: entry.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_from_json_parses_mixed_entries() {
        let json = r#"[
            ["Cell", "types/cell", null],
            ["Geometry", "types/geometry", "frag/geometry"]
        ]"#;

        let fragment = Fragment::from_json(json).unwrap();

        assert_eq!(fragment.len(), 2);
        assert_eq!(fragment.entries()[0].name, "Cell");
        assert_eq!(fragment.entries()[0].children, ChildrenSpec::Leaf);
        assert_eq!(fragment.entries()[1].id, "types/geometry");
        assert_eq!(
            fragment.entries()[1].children,
            ChildrenSpec::Deferred(FragmentRef::new("frag/geometry"))
        );
    }

    #[test]
    fn test_from_json_preserves_submission_order() {
        // Declaration order is meaningful; entries are deliberately not
        // alphabetical here.
        let json = r#"[
            ["Road", "types/road", null],
            ["Segmentation", "types/segmentation", null],
            ["Barrel", "types/barrel", null]
        ]"#;

        let fragment = Fragment::from_json(json).unwrap();

        let names: Vec<_> = fragment.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Road", "Segmentation", "Barrel"]);
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = Fragment::from_json(r#"{"name": "Cell"}"#).unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_from_json_rejects_short_tuple() {
        let err = Fragment::from_json(r#"[["Cell", "types/cell"]]"#).unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_from_json_empty_array_is_empty_fragment() {
        let fragment = Fragment::from_json("[]").unwrap();

        assert!(fragment.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let fragment = Fragment::new().with_leaf("", "types/cell");

        let err = fragment.validate().unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let fragment = Fragment::new().with_leaf("Cell", "");

        let err = fragment.validate().unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_fragment_ref() {
        let fragment = Fragment::new().with_deferred("Geometry", "types/geometry", "");

        let err = fragment.validate().unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_validate_rejects_duplicate_sibling_name() {
        let fragment = Fragment::new()
            .with_leaf("Cell", "types/cell")
            .with_leaf("Cell", "types/cell2");

        let err = fragment.validate().unwrap_err();

        assert!(matches!(err, IndexError::MalformedFragment { .. }));
    }

    #[test]
    fn test_validate_rejects_shared_id_across_siblings() {
        // Two distinct entries aliasing one documentation page is a
        // generator defect; surface it instead of deduping.
        let fragment = Fragment::new()
            .with_leaf("Segmentation", "types/d8dd2")
            .with_leaf("HeatExchanger", "types/d8dd2");

        let err = fragment.validate().unwrap_err();

        assert!(matches!(err, IndexError::DuplicateId { id } if id == "types/d8dd2"));
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let json = r#"[["Cell", "types/cell", null], ["Geometry", "types/geometry", "frag/geometry"]]"#;

        let parsed = Fragment::from_json(json).unwrap();
        let built = Fragment::new()
            .with_leaf("Cell", "types/cell")
            .with_deferred("Geometry", "types/geometry", "frag/geometry");

        assert_eq!(parsed, built);
    }
}
