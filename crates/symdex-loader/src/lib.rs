//! Fragment loading boundary for the symdex documentation browser.
//!
//! This crate provides a [`Loader`] trait for abstracting subtree-fragment
//! fetching from the underlying transport. This enables:
//!
//! - **Unit testing** the navigator without touching real I/O
//! - **Backend flexibility** (filesystem, HTTP, archive files)
//! - **Clean separation** between tree semantics and fetch policy
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Loader`] trait with a single `load()` method
//! - [`FsLoader`] implementation reading one JSON fragment file per reference
//! - [`MockLoader`] for testing (behind the `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::PathBuf;
//! use symdex_index::FragmentRef;
//! use symdex_loader::{FsLoader, Loader};
//!
//! let loader = FsLoader::new(PathBuf::from("doc/navtree"));
//! let fragment = loader.load(&FragmentRef::new("frag/geometry"))?;
//! ```

mod fs;
mod loader;
#[cfg(feature = "mock")]
mod mock;

pub use fs::FsLoader;
pub use loader::{ErrorStatus, Loader, LoaderError, LoaderErrorKind};
#[cfg(feature = "mock")]
pub use mock::MockLoader;
