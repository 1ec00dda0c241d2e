//! Append-only symbol index with lazily resolved subtrees.
//!
//! Provides [`SymbolIndex`], an ordered mapping from parent nodes to their
//! children. Children arrive in fragments: a node is created either as a true
//! leaf or with an unloaded subtree reference, and the only mutation the index
//! ever performs is flipping that reference to the loaded child list when the
//! fragment is ingested. Nodes are never deleted within a session.
//!
//! # Architecture
//!
//! Nodes are stored in a flat `Vec<Node>` with parent/children relationships
//! tracked by indices, plus an `id -> index` `HashMap`. This provides:
//! - O(1) id lookups
//! - O(d) ancestor-path building where d is the node depth
//!
//! # Thread Safety
//!
//! `SymbolIndex` is designed for concurrent access:
//! - reads (`lookup`, `children_of`, `path`) take a consistent snapshot and
//!   never block each other
//! - ingestion is serialized by a dedicated writer lock, so validation and
//!   append are atomic with respect to other writers (single-writer
//!   discipline)

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::error::IndexError;
use crate::fragment::{ChildrenSpec, Fragment};
use crate::node::{Children, FragmentRef, Node};

/// Per-node child state, with loaded children as arena indices.
#[derive(Debug)]
enum ChildSlot {
    Leaf,
    Unloaded(FragmentRef),
    Loaded(Vec<usize>),
}

#[derive(Debug, Default)]
struct IndexInner {
    nodes: Vec<Node>,
    children: Vec<ChildSlot>,
    parents: Vec<Option<usize>>,
    roots: Vec<usize>,
    id_index: HashMap<String, usize>,
}

/// Lazy symbol-tree index.
///
/// Fragments are ingested all-or-nothing: any validation failure leaves the
/// index exactly as it was. Sibling order is submission order from the source
/// fragment (declaration order, not alphabetical) and is preserved by every
/// query.
///
/// # Example
///
/// ```
/// use symdex_index::{Children, Fragment, SymbolIndex};
///
/// let index = SymbolIndex::new();
/// let root = Fragment::new()
///     .with_leaf("Cell", "types/cell")
///     .with_deferred("Geometry", "types/geometry", "frag/geometry");
/// index.ingest_root(root)?;
///
/// assert_eq!(index.children_of("types/cell")?, Children::Leaf);
/// assert!(matches!(
///     index.children_of("types/geometry")?,
///     Children::Unloaded(_)
/// ));
/// # Ok::<(), symdex_index::IndexError>(())
/// ```
#[derive(Debug, Default)]
pub struct SymbolIndex {
    inner: RwLock<IndexInner>,
    /// Serializes ingestion so validate-then-append is atomic across writers.
    ingest_lock: Mutex<()>,
}

impl SymbolIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a fragment of root-level siblings.
    ///
    /// Roots accumulate across calls in ingest order; ids stay globally
    /// unique across the whole index.
    ///
    /// # Returns
    ///
    /// The created root nodes, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MalformedFragment`] for structurally invalid
    /// input and [`IndexError::DuplicateId`] on any id collision. The index
    /// is left unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn ingest_root(&self, fragment: Fragment) -> Result<Vec<Node>, IndexError> {
        self.ingest_under(None, fragment)
    }

    /// Ingest a fragment of children for an existing unloaded parent.
    ///
    /// On success the parent's child state flips `Unloaded -> Loaded`
    /// atomically with the children insertion.
    ///
    /// # Returns
    ///
    /// The created child nodes, in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the parent id is unknown,
    /// [`IndexError::AlreadyResolved`] if the parent is a leaf or its
    /// children are already loaded, [`IndexError::MalformedFragment`] for
    /// structurally invalid input, and [`IndexError::DuplicateId`] on any id
    /// collision. The index is left unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn ingest(&self, parent_id: &str, fragment: Fragment) -> Result<Vec<Node>, IndexError> {
        self.ingest_under(Some(parent_id), fragment)
    }

    fn ingest_under(
        &self,
        parent_id: Option<&str>,
        fragment: Fragment,
    ) -> Result<Vec<Node>, IndexError> {
        let _writer = self.ingest_lock.lock().unwrap();

        if let Err(e) = fragment.validate() {
            tracing::warn!(parent_id = parent_id.unwrap_or("<root>"), error = %e, "Rejected fragment");
            return Err(e);
        }

        // Validate against current contents under a read lock; other writers
        // are excluded by `ingest_lock`, so the check stays valid through the
        // append below.
        let parent_idx = {
            let inner = self.inner.read().unwrap();

            let parent_idx = match parent_id {
                Some(id) => {
                    let &idx = inner
                        .id_index
                        .get(id)
                        .ok_or_else(|| IndexError::not_found(id))?;
                    match &inner.children[idx] {
                        ChildSlot::Unloaded(_) => {}
                        ChildSlot::Leaf | ChildSlot::Loaded(_) => {
                            return Err(IndexError::AlreadyResolved { id: id.to_owned() });
                        }
                    }
                    Some(idx)
                }
                None => None,
            };

            for entry in fragment.entries() {
                if inner.id_index.contains_key(&entry.id) {
                    tracing::warn!(
                        parent_id = parent_id.unwrap_or("<root>"),
                        id = %entry.id,
                        "Rejected fragment: id already present in index"
                    );
                    return Err(IndexError::DuplicateId {
                        id: entry.id.clone(),
                    });
                }
            }

            parent_idx
        };

        let mut inner = self.inner.write().unwrap();
        let mut created_indices = Vec::with_capacity(fragment.len());
        let mut created = Vec::with_capacity(fragment.len());

        for spec in fragment.into_entries() {
            let idx = inner.nodes.len();
            let node = Node {
                name: spec.name,
                id: spec.id,
            };
            inner.id_index.insert(node.id.clone(), idx);
            inner.children.push(match spec.children {
                ChildrenSpec::Leaf => ChildSlot::Leaf,
                ChildrenSpec::Deferred(fragment_ref) => ChildSlot::Unloaded(fragment_ref),
            });
            inner.parents.push(parent_idx);
            created.push(node.clone());
            inner.nodes.push(node);
            created_indices.push(idx);
        }

        match parent_idx {
            Some(idx) => inner.children[idx] = ChildSlot::Loaded(created_indices),
            None => inner.roots.extend(created_indices),
        }

        tracing::debug!(
            parent_id = parent_id.unwrap_or("<root>"),
            count = created.len(),
            "Ingested fragment"
        );

        Ok(created)
    }

    /// Look up a node by id.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the id is unknown.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn lookup(&self, id: &str) -> Result<Node, IndexError> {
        let inner = self.inner.read().unwrap();
        let &idx = inner
            .id_index
            .get(id)
            .ok_or_else(|| IndexError::not_found(id))?;
        Ok(inner.nodes[idx].clone())
    }

    /// Current known child state of a node.
    ///
    /// Pure read: never triggers a fetch. Loaded children are returned in
    /// submission order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the id is unknown.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn children_of(&self, id: &str) -> Result<Children, IndexError> {
        let inner = self.inner.read().unwrap();
        let &idx = inner
            .id_index
            .get(id)
            .ok_or_else(|| IndexError::not_found(id))?;
        Ok(match &inner.children[idx] {
            ChildSlot::Leaf => Children::Leaf,
            ChildSlot::Unloaded(fragment_ref) => Children::Unloaded(fragment_ref.clone()),
            ChildSlot::Loaded(indices) => Children::Loaded(
                indices
                    .iter()
                    .map(|&child| inner.nodes[child].clone())
                    .collect(),
            ),
        })
    }

    /// Ancestor chain for a node, root first, the node itself last.
    ///
    /// A root-level node yields a single-element chain.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the id is unknown.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn path(&self, id: &str) -> Result<Vec<String>, IndexError> {
        let inner = self.inner.read().unwrap();
        let &idx = inner
            .id_index
            .get(id)
            .ok_or_else(|| IndexError::not_found(id))?;

        let mut chain = Vec::new();
        let mut current = Some(idx);
        while let Some(i) = current {
            chain.push(inner.nodes[i].id.clone());
            current = inner.parents[i];
        }
        chain.reverse();
        Ok(chain)
    }

    /// Root-level nodes in ingest order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn roots(&self) -> Vec<Node> {
        let inner = self.inner.read().unwrap();
        inner
            .roots
            .iter()
            .map(|&idx| inner.nodes[idx].clone())
            .collect()
    }

    /// Total number of nodes in the index.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().unwrap().nodes.len()
    }

    /// True if no fragment has been ingested yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    // Ensure SymbolIndex is Send + Sync for use with Arc
    static_assertions::assert_impl_all!(super::SymbolIndex: Send, Sync);

    use pretty_assertions::assert_eq;

    use super::*;

    fn geometry_index() -> SymbolIndex {
        let index = SymbolIndex::new();
        let root = Fragment::new()
            .with_leaf("Cell", "types/cell")
            .with_deferred("Geometry", "types/geometry", "frag/geometry");
        index.ingest_root(root).unwrap();
        index
    }

    #[test]
    fn test_ingest_root_creates_nodes() {
        let index = geometry_index();

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("types/cell").unwrap().name, "Cell");
        assert_eq!(index.lookup("types/geometry").unwrap().name, "Geometry");
    }

    #[test]
    fn test_children_of_leaf() {
        let index = geometry_index();

        assert_eq!(index.children_of("types/cell").unwrap(), Children::Leaf);
    }

    #[test]
    fn test_children_of_unloaded_returns_fragment_ref() {
        let index = geometry_index();

        let children = index.children_of("types/geometry").unwrap();

        assert_eq!(
            children,
            Children::Unloaded(FragmentRef::new("frag/geometry"))
        );
    }

    #[test]
    fn test_ingest_flips_unloaded_to_loaded() {
        let index = geometry_index();

        let created = index
            .ingest(
                "types/geometry",
                Fragment::new().with_leaf("GeometryBuilder", "types/geometry_builder"),
            )
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "GeometryBuilder");
        let children = index.children_of("types/geometry").unwrap();
        assert_eq!(
            children,
            Children::Loaded(vec![Node {
                name: "GeometryBuilder".to_owned(),
                id: "types/geometry_builder".to_owned(),
            }])
        );
    }

    #[test]
    fn test_children_order_is_submission_order() {
        let index = SymbolIndex::new();
        // Deliberately not alphabetical.
        let root = Fragment::new()
            .with_leaf("Tracker", "types/tracker")
            .with_leaf("Barrel", "types/barrel")
            .with_leaf("NoiseCalibrator", "types/noise_calibrator");
        index.ingest_root(root).unwrap();

        let roots = index.roots();

        let names: Vec<_> = roots.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Tracker", "Barrel", "NoiseCalibrator"]);
    }

    #[test]
    fn test_ingest_unknown_parent_returns_not_found() {
        let index = geometry_index();

        let err = index
            .ingest("types/missing", Fragment::new().with_leaf("X", "types/x"))
            .unwrap_err();

        assert!(matches!(err, IndexError::NotFound { id } if id == "types/missing"));
    }

    #[test]
    fn test_ingest_under_leaf_rejected() {
        let index = geometry_index();

        let err = index
            .ingest("types/cell", Fragment::new().with_leaf("X", "types/x"))
            .unwrap_err();

        assert!(matches!(err, IndexError::AlreadyResolved { id } if id == "types/cell"));
    }

    #[test]
    fn test_reingest_loaded_parent_rejected() {
        let index = geometry_index();
        index
            .ingest(
                "types/geometry",
                Fragment::new().with_leaf("GeometryBuilder", "types/geometry_builder"),
            )
            .unwrap();

        let err = index
            .ingest(
                "types/geometry",
                Fragment::new().with_leaf("GeometryTGeo", "types/geometry_tgeo"),
            )
            .unwrap_err();

        assert!(matches!(err, IndexError::AlreadyResolved { .. }));
        // Loaded children are untouched.
        let children = index.children_of("types/geometry").unwrap();
        assert!(matches!(children, Children::Loaded(kids) if kids.len() == 1));
    }

    #[test]
    fn test_duplicate_id_across_fragments_rejected() {
        let index = geometry_index();

        let err = index
            .ingest(
                "types/geometry",
                Fragment::new().with_leaf("Cell2", "types/cell"),
            )
            .unwrap_err();

        assert!(matches!(err, IndexError::DuplicateId { id } if id == "types/cell"));
    }

    #[test]
    fn test_failed_ingest_leaves_index_unchanged() {
        let index = geometry_index();
        let before = index.len();

        // Second entry collides with an existing id; the first entry must
        // not survive either.
        let err = index
            .ingest(
                "types/geometry",
                Fragment::new()
                    .with_leaf("GeometryBuilder", "types/geometry_builder")
                    .with_leaf("CellAlias", "types/cell"),
            )
            .unwrap_err();

        assert!(matches!(err, IndexError::DuplicateId { .. }));
        assert_eq!(index.len(), before);
        assert!(index.lookup("types/geometry_builder").is_err());
        assert!(matches!(
            index.children_of("types/geometry").unwrap(),
            Children::Unloaded(_)
        ));
    }

    #[test]
    fn test_lookup_unknown_id_returns_not_found() {
        let index = SymbolIndex::new();

        let err = index.lookup("types/missing").unwrap_err();

        assert!(matches!(err, IndexError::NotFound { .. }));
    }

    #[test]
    fn test_children_of_unknown_id_returns_not_found() {
        let index = SymbolIndex::new();

        let err = index.children_of("types/missing").unwrap_err();

        assert!(matches!(err, IndexError::NotFound { .. }));
    }

    #[test]
    fn test_path_of_root_node_is_single_element() {
        let index = geometry_index();

        let path = index.path("types/cell").unwrap();

        assert_eq!(path, vec!["types/cell".to_owned()]);
    }

    #[test]
    fn test_path_of_nested_node_is_root_first() {
        let index = geometry_index();
        index
            .ingest(
                "types/geometry",
                Fragment::new().with_deferred("GeometryBuilder", "types/gb", "frag/gb"),
            )
            .unwrap();
        index
            .ingest("types/gb", Fragment::new().with_leaf("build", "fn/gb/build"))
            .unwrap();

        let path = index.path("fn/gb/build").unwrap();

        assert_eq!(
            path,
            vec![
                "types/geometry".to_owned(),
                "types/gb".to_owned(),
                "fn/gb/build".to_owned(),
            ]
        );
    }

    #[test]
    fn test_path_unknown_id_returns_not_found() {
        let index = SymbolIndex::new();

        let err = index.path("types/missing").unwrap_err();

        assert!(matches!(err, IndexError::NotFound { .. }));
    }

    #[test]
    fn test_multiple_root_fragments_accumulate() {
        let index = SymbolIndex::new();
        index
            .ingest_root(Fragment::new().with_leaf("Cell", "types/cell"))
            .unwrap();
        index
            .ingest_root(Fragment::new().with_leaf("Cluster", "types/cluster"))
            .unwrap();

        let names: Vec<_> = index.roots().iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["Cell".to_owned(), "Cluster".to_owned()]);
    }

    #[test]
    fn test_duplicate_id_across_root_fragments_rejected() {
        let index = SymbolIndex::new();
        index
            .ingest_root(Fragment::new().with_leaf("Cell", "types/cell"))
            .unwrap();

        let err = index
            .ingest_root(Fragment::new().with_leaf("CellCopy", "types/cell"))
            .unwrap_err();

        assert!(matches!(err, IndexError::DuplicateId { .. }));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_empty_fragment_loads_parent_with_no_children() {
        let index = geometry_index();

        let created = index.ingest("types/geometry", Fragment::new()).unwrap();

        assert!(created.is_empty());
        assert_eq!(
            index.children_of("types/geometry").unwrap(),
            Children::Loaded(Vec::new())
        );
    }

    #[test]
    fn test_concurrent_ingest_different_parents() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(SymbolIndex::new());
        index
            .ingest_root(
                Fragment::new()
                    .with_deferred("Geometry", "types/geometry", "frag/geometry")
                    .with_deferred("Tracker", "types/tracker", "frag/tracker"),
            )
            .unwrap();

        let handles: Vec<_> = [("types/geometry", "gb"), ("types/tracker", "tf")]
            .into_iter()
            .map(|(parent, child)| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    index
                        .ingest(
                            parent,
                            Fragment::new().with_leaf(child, format!("types/{child}")),
                        )
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.len(), 4);
        assert!(index.children_of("types/geometry").unwrap().is_resolved());
        assert!(index.children_of("types/tracker").unwrap().is_resolved());
    }

    #[test]
    fn test_concurrent_reads_during_ingest() {
        use std::sync::Arc;
        use std::thread;

        let index = Arc::new(geometry_index());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                thread::spawn(move || {
                    if i == 0 {
                        index
                            .ingest(
                                "types/geometry",
                                Fragment::new().with_leaf("GeometryBuilder", "types/gb"),
                            )
                            .unwrap();
                    } else {
                        // Readers always observe a consistent snapshot.
                        let node = index.lookup("types/cell").unwrap();
                        assert_eq!(node.name, "Cell");
                        assert!(index.children_of("types/geometry").is_ok());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(index.children_of("types/geometry").unwrap().is_resolved());
    }
}
