//! In-place structural editing of phylogenetic trees.
//!
//! Trees are stored in an arena ([`tree::Tree`]) and every algorithm mutates
//! the tree it is given: rerooting on an outgroup, ladderizing, sorting,
//! ultrametric conversion, common ancestor queries, subtree pattern search and
//! random topology growth.
//!
//! ```
//! use phyloedit::tree::Tree;
//!
//! let mut tree = Tree::from_newick("((A:1,B:1)C:2,(D:1,E:3)F:1)R;").unwrap();
//! let root = tree.get_root().unwrap();
//!
//! tree.ladderize(&root, false, false).unwrap();
//! assert_eq!(tree.to_newick().unwrap(), "((A:1,B:1)C:2,(D:1,E:3)F:1)R;");
//!
//! let d = tree.get_by_name("D").unwrap().id;
//! tree.set_outgroup(&d, &[]).unwrap();
//! assert_eq!(tree.to_newick().unwrap(), "(D:0.5,(E:3,(A:1,B:1)C:3)F:0.5)R;");
//! ```
#![warn(missing_docs)]

use tree::{Node, PopulateOptions, Tree, TreeError};

pub mod distr;
pub mod tree;

/// Generates a random binary tree of a given size with leaves named `a`, `b`, ...
///
/// Branch lengths and supports are drawn uniformly in `[0, 1]` if
/// `random_branches` is set, otherwise they are all 1.
/// ```
/// let tree = phyloedit::generate_tree(10, true).unwrap();
///
/// assert_eq!(tree.n_leaves(), 10);
/// assert_eq!(tree.size(), 19);
/// ```
pub fn generate_tree(n_leaves: usize, random_branches: bool) -> Result<Tree, TreeError> {
    let mut tree = Tree::new();
    let root = tree.add(Node::new());

    let options = PopulateOptions {
        random_branches,
        ..Default::default()
    };
    tree.populate(&root, n_leaves, &options)?;

    Ok(tree)
}
