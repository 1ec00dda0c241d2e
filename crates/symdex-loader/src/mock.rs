//! Mock loader implementation for testing.
//!
//! Provides [`MockLoader`] for unit testing navigators without real I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use symdex_index::{Fragment, FragmentRef};

use crate::loader::{Loader, LoaderError, LoaderErrorKind};

/// Canned response for a fragment reference.
#[derive(Clone, Debug)]
enum Response {
    Fragment(Fragment),
    Failure(LoaderErrorKind),
}

/// Mock loader for testing.
///
/// Stores canned fragments (or failures) in memory and counts invocations,
/// which is what the navigator's idempotence and coalescing properties are
/// asserted against. Use the builder methods to configure test data.
///
/// # Example
///
/// ```ignore
/// use symdex_index::{Fragment, FragmentRef};
/// use symdex_loader::{Loader, MockLoader};
///
/// let loader = MockLoader::new()
///     .with_fragment("frag/geometry", Fragment::new().with_leaf("GeometryBuilder", "types/gb"));
///
/// let fragment = loader.load(&FragmentRef::new("frag/geometry")).unwrap();
/// assert_eq!(loader.calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockLoader {
    responses: HashMap<FragmentRef, Response>,
    latency: Option<Duration>,
    calls: AtomicUsize,
}

impl MockLoader {
    /// Create a new empty mock loader.
    ///
    /// Unconfigured references fail with [`LoaderErrorKind::NotFound`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a fragment for a reference.
    #[must_use]
    pub fn with_fragment(
        mut self,
        fragment_ref: impl Into<FragmentRef>,
        fragment: Fragment,
    ) -> Self {
        self.responses
            .insert(fragment_ref.into(), Response::Fragment(fragment));
        self
    }

    /// Fail a reference with the given error kind.
    #[must_use]
    pub fn with_failure(
        mut self,
        fragment_ref: impl Into<FragmentRef>,
        kind: LoaderErrorKind,
    ) -> Self {
        self.responses
            .insert(fragment_ref.into(), Response::Failure(kind));
        self
    }

    /// Sleep this long inside every `load` call.
    ///
    /// Widens the race window so concurrent-expand tests exercise real
    /// contention instead of finishing before the second caller starts.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of `load` invocations so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Loader for MockLoader {
    fn load(&self, fragment: &FragmentRef) -> Result<Fragment, LoaderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        match self.responses.get(fragment) {
            Some(Response::Fragment(canned)) => Ok(canned.clone()),
            Some(Response::Failure(kind)) => Err(LoaderError::new(*kind)
                .with_fragment(fragment.clone())
                .with_backend("Mock")),
            None => Err(LoaderError::not_found(fragment.clone()).with_backend("Mock")),
        }
    }
}
