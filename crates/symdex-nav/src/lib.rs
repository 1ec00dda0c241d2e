//! Expandable tree navigation for the symdex documentation browser.
//!
//! This crate provides:
//! - [`TreeNavigator`]: expand/collapse view over a lazily loaded
//!   [`SymbolIndex`](symdex_index::SymbolIndex), with coalesced on-demand
//!   fragment fetching through an injected loader
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use symdex_index::{Fragment, SymbolIndex};
//! use symdex_loader::FsLoader;
//! use symdex_nav::TreeNavigator;
//!
//! let index = Arc::new(SymbolIndex::new());
//! index.ingest_root(Fragment::from_json(&std::fs::read_to_string("navtree/root.json")?)?)?;
//!
//! let loader = Arc::new(FsLoader::new(PathBuf::from("navtree")));
//! let nav = TreeNavigator::new(index, loader);
//!
//! for root in nav.roots() {
//!     let children = nav.expand(&root.id)?;
//!     println!("{}: {} children", root.name, children.len());
//! }
//! # Ok(())
//! # }
//! ```

mod navigator;

pub use navigator::{ExpandError, TreeNavigator};
