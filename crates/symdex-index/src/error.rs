//! Error types for the symbol index.

/// Error returned by symbol index operations.
///
/// Ingestion is all-or-nothing: any error leaves the index unchanged.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Fragment is structurally invalid (empty field, duplicate sibling name).
    #[error("Malformed fragment: {reason}")]
    MalformedFragment {
        /// Human-readable description of the structural defect.
        reason: String,
    },
    /// Node id already exists somewhere in the index.
    #[error("Duplicate node id: {id}")]
    DuplicateId {
        /// The colliding id.
        id: String,
    },
    /// No node with the given id exists in the index.
    #[error("Node not found: {id}")]
    NotFound {
        /// The unknown id.
        id: String,
    },
    /// Target node's child state is already resolved (leaf or loaded).
    ///
    /// Child state only transitions `Unloaded -> Loaded`; ingesting under a
    /// leaf or a second ingest for the same parent is rejected rather than
    /// merged or replaced.
    #[error("Children already resolved for node: {id}")]
    AlreadyResolved {
        /// The parent id whose child state is final.
        id: String,
    },
}

impl IndexError {
    /// Create a malformed-fragment error from a reason string.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFragment {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for an id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }
}
