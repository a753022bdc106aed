//! Build and edit phylogenetic trees in place.
//!
//! This module defines the two essential structs to represent phylogenetic trees:
//!  - The [`Node`] struct that represents a node of a phylogenetic tree.
//!  - The [`Tree`] struct that holds a collection of [`Node`] objects.
//!
//! The structural algorithms (rerooting, ladderizing, ultrametric conversion,
//! random topologies, pattern search...) are implemented as methods of [`Tree`], each concern
//! living in its own submodule. Whole-tree passes run on the iterative
//! [`Walker`] so that deep trees do not exhaust the call stack.

mod edit;
mod lineage;
mod newick;
mod node;
mod order;
mod pattern;
mod populate;
mod reroot;
mod size;
mod tree_impl;
mod walk;

pub use self::newick::{NewickParseError, COMMENT};
pub use self::node::{Node, NodeError, Property};
pub use self::pattern::{Condition, TreePattern};
pub use self::populate::{leaf_name, PopulateOptions};
pub use self::size::Size;
pub use self::tree_impl::{RootInconsistency, Tree, TreeError};
pub use self::walk::{Cursor, Traversal, Walker};

/// A type that represents Identifiers of [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type NodeId = usize;

/// A type that represents branch lengths between [`Node`] objects
/// within phylogenetic [`Tree`] object.
pub type EdgeLength = f64;

/// Name of the branch length property
pub const DIST: &str = "dist";
/// Name of the branch support property
pub const SUPPORT: &str = "support";
/// Name of the node name property
pub const NAME: &str = "name";
