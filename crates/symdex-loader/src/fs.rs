//! Filesystem loader backend.
//!
//! Fragments live as one JSON file per reference under a root directory,
//! mirroring how documentation generators lay out their navigation payloads:
//! the reference `frag/geometry` resolves to `<root>/frag/geometry.json`.

use std::path::{Component, Path, PathBuf};

use symdex_index::{Fragment, FragmentRef, IndexError};

use crate::loader::{Loader, LoaderError, LoaderErrorKind};

/// Loader reading fragment files from a directory tree.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use symdex_index::FragmentRef;
/// use symdex_loader::{FsLoader, Loader};
///
/// let loader = FsLoader::new(PathBuf::from("doc/navtree"));
/// let fragment = loader.load(&FragmentRef::new("frag/geometry"))?;
/// ```
#[derive(Debug)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    /// Create a loader rooted at the given directory.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Map a fragment reference to its file path.
    ///
    /// References are relative identifiers, not filenames; anything absolute
    /// or containing parent components must not escape the root.
    fn resolve(&self, fragment: &FragmentRef) -> Result<PathBuf, LoaderError> {
        let relative = Path::new(fragment.as_str());
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if fragment.is_empty() || !plain {
            return Err(LoaderError::new(LoaderErrorKind::InvalidRef)
                .with_fragment(fragment.clone())
                .with_backend("Fs"));
        }
        Ok(self.root.join(format!("{fragment}.json")))
    }
}

impl Loader for FsLoader {
    fn load(&self, fragment: &FragmentRef) -> Result<Fragment, LoaderError> {
        let path = self.resolve(fragment)?;

        tracing::debug!(fragment = %fragment, path = %path.display(), "Loading fragment file");

        let json = std::fs::read_to_string(&path)
            .map_err(|e| LoaderError::io(e, Some(fragment.clone())).with_backend("Fs"))?;

        Fragment::from_json(&json).map_err(|e: IndexError| {
            tracing::warn!(fragment = %fragment, error = %e, "Fragment file failed to parse");
            LoaderError::new(LoaderErrorKind::Malformed)
                .with_fragment(fragment.clone())
                .with_backend("Fs")
                .with_source(e)
        })
    }
}
