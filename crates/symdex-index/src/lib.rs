//! Lazy symbol-tree index for the symdex documentation browser.
//!
//! This crate provides the data half of the browser: an append-only,
//! session-scoped index mapping a namespace's member symbols to
//! documentation-page ids, with subtrees represented as deferred fragment
//! references until something asks for them.
//!
//! The crate provides:
//! - [`SymbolIndex`]: the index itself, with all-or-nothing fragment
//!   ingestion and snapshot reads
//! - [`Fragment`]: an ordered batch of sibling descriptors, parseable from
//!   the generator's JSON 3-tuple wire format
//! - [`Children`]: tagged child state (`Leaf` / `Unloaded` / `Loaded`)
//!
//! Fetching fragments is out of scope here; see the `symdex-loader` crate
//! for the I/O boundary and `symdex-nav` for the expand/collapse consumer.

mod error;
mod fragment;
mod index;
mod node;

pub use error::IndexError;
pub use fragment::{ChildrenSpec, Fragment, NodeSpec};
pub use index::SymbolIndex;
pub use node::{Children, FragmentRef, Node};
