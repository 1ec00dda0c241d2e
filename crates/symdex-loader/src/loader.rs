//! Loader trait and error types.
//!
//! Provides the core [`Loader`] trait for fetching subtree fragments by
//! reference, along with [`LoaderError`] for unified error handling across
//! backends. Fetching is the only I/O boundary of the symbol tree; timeout
//! and cancellation policy belong to the backend, not to its callers.

use symdex_index::{Fragment, FragmentRef};

/// Semantic error categories for fragment loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum LoaderErrorKind {
    /// Referenced fragment does not exist.
    NotFound,
    /// Fragment reference is syntactically unusable for this backend.
    InvalidRef,
    /// Fragment payload exists but could not be parsed.
    Malformed,
    /// Backend is temporarily unavailable.
    Unavailable,
    /// Fetch timed out.
    Timeout,
    /// Fetch was cancelled by the caller.
    Cancelled,
    /// Other/unknown error category.
    Other,
}

/// Retry guidance.
#[derive(Debug, PartialEq, Eq, Default)]
pub enum ErrorStatus {
    /// Don't retry (invalid ref, malformed payload, not found).
    #[default]
    Permanent,
    /// Retry immediately (timeout, cancellation).
    Temporary,
    /// Retry with backoff (backend unavailable).
    Persistent,
}

/// Loader error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct LoaderError {
    /// Semantic error category.
    pub kind: LoaderErrorKind,
    /// Retry guidance.
    pub status: ErrorStatus,
    /// Fragment context (if applicable).
    pub fragment: Option<FragmentRef>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoaderError {
    /// Create a new loader error.
    #[must_use]
    pub fn new(kind: LoaderErrorKind) -> Self {
        Self {
            kind,
            status: ErrorStatus::Permanent,
            fragment: None,
            backend: None,
            source: None,
        }
    }

    /// Attach fragment context.
    #[must_use]
    pub fn with_fragment(mut self, fragment: FragmentRef) -> Self {
        self.fragment = Some(fragment);
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set retry status.
    #[must_use]
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with fragment context.
    #[must_use]
    pub fn not_found(fragment: FragmentRef) -> Self {
        Self::new(LoaderErrorKind::NotFound).with_fragment(fragment)
    }

    /// Create a caller-cancellation error with fragment context.
    #[must_use]
    pub fn cancelled(fragment: FragmentRef) -> Self {
        Self::new(LoaderErrorKind::Cancelled)
            .with_status(ErrorStatus::Temporary)
            .with_fragment(fragment)
    }

    /// Create a loader error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, fragment: Option<FragmentRef>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => LoaderErrorKind::NotFound,
            std::io::ErrorKind::TimedOut => LoaderErrorKind::Timeout,
            std::io::ErrorKind::Interrupted => LoaderErrorKind::Cancelled,
            _ => LoaderErrorKind::Other,
        };
        let status = match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted => {
                ErrorStatus::Temporary
            }
            _ => ErrorStatus::Permanent,
        };
        let mut error = Self::new(kind).with_status(status).with_source(err);
        if let Some(f) = fragment {
            error = error.with_fragment(f);
        }
        error
    }
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (fragment: ref)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            LoaderErrorKind::NotFound => "Not found",
            LoaderErrorKind::InvalidRef => "Invalid fragment reference",
            LoaderErrorKind::Malformed => "Malformed fragment payload",
            LoaderErrorKind::Unavailable => "Unavailable",
            LoaderErrorKind::Timeout => "Timeout",
            LoaderErrorKind::Cancelled => "Cancelled",
            LoaderErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(fragment) = &self.fragment {
            write!(f, " (fragment: {fragment})")?;
        }

        Ok(())
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Fragment-fetching abstraction.
///
/// Given a fragment reference, a loader returns the ordered batch of child
/// descriptors it points at, or fails. Implementations own their transport,
/// caching, timeout, and cancellation policy; callers only see the result.
/// A failed fetch must leave no trace: the navigator relies on being able to
/// retry the same reference later.
pub trait Loader: Send + Sync {
    /// Fetch the fragment behind a reference.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError`] if the fragment cannot be fetched or parsed.
    fn load(&self, fragment: &FragmentRef) -> Result<Fragment, LoaderError>;
}
