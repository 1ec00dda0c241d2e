//! Tree navigator with on-demand fragment loading.
//!
//! Provides [`TreeNavigator`] for walking a [`SymbolIndex`] as an expandable
//! hierarchy. A subtree's fragment is fetched only when expansion is
//! requested, through an injected [`Loader`] collaborator, and stays cached
//! in the index for the lifetime of the session.
//!
//! # Thread Safety
//!
//! `TreeNavigator` is designed for concurrent access:
//! - `expand()` on an already-loaded node is a lock-free-ish snapshot read
//! - concurrent `expand()` calls on the same unresolved node are coalesced
//!   through a per-node fetch lock with a double-check after acquisition, so
//!   at most one fetch per node is ever in flight
//! - fetches for different nodes proceed in parallel; the index itself
//!   serializes ingestion
//!
//! Presentation state (expanded/collapsed) is tracked per node, independent
//! of data-loading state: `collapse()` never evicts cached children.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use symdex_index::{Children, FragmentRef, IndexError, Node, SymbolIndex};
use symdex_loader::{Loader, LoaderError};

/// Error returned when expansion fails.
#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// Index rejected the lookup or the fetched fragment.
    #[error(transparent)]
    Index(#[from] IndexError),
    /// Loader failed to fetch the fragment.
    ///
    /// The node's child state is untouched, so a later `expand` retries.
    #[error("Fragment load failed: {0}")]
    Load(#[source] LoaderError),
}

/// Expandable view over a lazily loaded symbol tree.
///
/// Constructed per session with an index and a loader; there is no global
/// state. Expansion is idempotent and safe to call repeatedly.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use symdex_index::SymbolIndex;
/// use symdex_loader::FsLoader;
/// use symdex_nav::TreeNavigator;
///
/// let index = Arc::new(SymbolIndex::new());
/// let loader = Arc::new(FsLoader::new("doc/navtree".into()));
/// let nav = TreeNavigator::new(index, loader);
///
/// for node in nav.expand("types/geometry")? {
///     println!("{}", node.name);
/// }
/// ```
pub struct TreeNavigator {
    index: Arc<SymbolIndex>,
    loader: Arc<dyn Loader>,
    /// Per-node fetch locks for expand coalescing.
    fetch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    /// Ids currently presented as expanded. Initial state is collapsed.
    expanded: Mutex<HashSet<String>>,
}

impl TreeNavigator {
    /// Create a navigator over an index with an injected loader.
    #[must_use]
    pub fn new(index: Arc<SymbolIndex>, loader: Arc<dyn Loader>) -> Self {
        Self {
            index,
            loader,
            fetch_locks: Mutex::new(HashMap::new()),
            expanded: Mutex::new(HashSet::new()),
        }
    }

    /// The underlying index.
    #[must_use]
    pub fn index(&self) -> &SymbolIndex {
        &self.index
    }

    /// Root-level nodes in ingest order.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn roots(&self) -> Vec<Node> {
        self.index.roots()
    }

    /// Expand a node, fetching its subtree fragment if necessary.
    ///
    /// Already-loaded children are returned straight from the cache; a leaf
    /// expands to an empty list. Either way the node is marked expanded.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::Index`] with [`IndexError::NotFound`] for an
    /// unknown id, and [`ExpandError::Load`] if the loader fails. After a
    /// load failure the node stays unloaded and a later call retries the
    /// fetch.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn expand(&self, id: &str) -> Result<Vec<Node>, ExpandError> {
        // Fast path: child state already resolved.
        if let Some(children) = Self::resolved(self.index.children_of(id)?) {
            self.mark_expanded(id);
            return Ok(children);
        }

        let node_lock = self.fetch_lock(id);
        let _guard = node_lock.lock().unwrap();

        // Double-check after acquiring the node lock: a concurrent caller
        // may have completed the fetch while we waited.
        let fragment_ref = match self.index.children_of(id)? {
            Children::Leaf => {
                self.mark_expanded(id);
                return Ok(Vec::new());
            }
            Children::Loaded(children) => {
                self.mark_expanded(id);
                return Ok(children);
            }
            Children::Unloaded(fragment_ref) => fragment_ref,
        };

        let children = self.fetch(id, &fragment_ref)?;

        // The node can never go back to unloaded; its fetch lock is done.
        self.fetch_locks.lock().unwrap().remove(id);
        self.mark_expanded(id);
        Ok(children)
    }

    /// Fetch and ingest one fragment. On any failure the index is untouched.
    fn fetch(&self, id: &str, fragment_ref: &FragmentRef) -> Result<Vec<Node>, ExpandError> {
        tracing::debug!(id, fragment = %fragment_ref, "Fetching subtree fragment");

        let fragment = self.loader.load(fragment_ref).map_err(|e| {
            tracing::warn!(id, fragment = %fragment_ref, error = %e, "Fragment load failed");
            ExpandError::Load(e)
        })?;

        Ok(self.index.ingest(id, fragment)?)
    }

    /// Collapse a node's presentation state.
    ///
    /// Purely a presentation change: cached children stay in the index and a
    /// later `expand` serves them without refetching.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the id is unknown.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn collapse(&self, id: &str) -> Result<(), IndexError> {
        self.index.lookup(id)?;
        self.expanded.lock().unwrap().remove(id);
        Ok(())
    }

    /// Whether a node is currently presented as expanded.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.lock().unwrap().contains(id)
    }

    /// Ancestor chain for a node, root first, the node itself last.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::NotFound`] if the id is unknown.
    pub fn path(&self, id: &str) -> Result<Vec<String>, IndexError> {
        self.index.path(id)
    }

    /// Expand every ancestor of a node so it becomes visible.
    ///
    /// Used to restore expansion state when deep-linking to a symbol. The
    /// ancestors of a node the index knows about are already loaded, so this
    /// issues no fetches.
    ///
    /// # Errors
    ///
    /// Returns [`ExpandError::Index`] with [`IndexError::NotFound`] if the
    /// id is unknown.
    pub fn reveal(&self, id: &str) -> Result<(), ExpandError> {
        let chain = self.index.path(id)?;
        for ancestor in &chain[..chain.len().saturating_sub(1)] {
            self.expand(ancestor)?;
        }
        Ok(())
    }

    fn mark_expanded(&self, id: &str) {
        self.expanded.lock().unwrap().insert(id.to_owned());
    }

    /// Get-or-create the fetch lock for a node.
    fn fetch_lock(&self, id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().unwrap();
        Arc::clone(locks.entry(id.to_owned()).or_default())
    }

    /// Loaded children (or the leaf's empty list) if the state is resolved.
    fn resolved(children: Children) -> Option<Vec<Node>> {
        match children {
            Children::Leaf => Some(Vec::new()),
            Children::Loaded(children) => Some(children),
            Children::Unloaded(_) => None,
        }
    }
}
