use std::collections::VecDeque;

use rand::prelude::*;
use tracing::debug;

use super::{EdgeLength, Node, NodeId, Tree, TreeError};
use crate::distr::Sampler;

/// Parameters of [`Tree::populate`]
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOptions {
    /// Names given to the new leaves, in order. Leaves are named
    /// `a`, `b`, ..., `z`, `aa`, `ab`, ... when it is `None`.
    pub names: Option<Vec<String>>,
    /// Draw branch lengths and supports at random instead of setting them to 1
    pub random_branches: bool,
    /// Closed range of the random branch lengths
    pub dist_range: (EdgeLength, EdgeLength),
    /// Closed range of the random supports
    pub support_range: (f64, f64),
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self {
            names: None,
            random_branches: false,
            dist_range: (0.0, 1.0),
            support_range: (0.0, 1.0),
        }
    }
}

/// Name of the leaf at `index` in the sequence `a`, ..., `z`, `aa`, `ab`, ..., `zz`, `aaa`, ...
/// ```
/// use phyloedit::tree::leaf_name;
///
/// assert_eq!(leaf_name(0), "a");
/// assert_eq!(leaf_name(25), "z");
/// assert_eq!(leaf_name(26), "aa");
/// assert_eq!(leaf_name(701), "zz");
/// assert_eq!(leaf_name(702), "aaa");
/// ```
pub fn leaf_name(index: usize) -> String {
    let mut letters = vec![];
    let mut rest = index + 1;
    while rest > 0 {
        rest -= 1;
        letters.push(char::from(b'a' + (rest % 26) as u8));
        rest /= 26;
    }

    letters.iter().rev().collect()
}

/// Random growth of the [`Tree`].
///
/// ----
/// ----
impl Tree {
    // ####################
    // # RANDOM TOPOLOGY  #
    // ####################

    /// Grows a random binary topology with `size` leaves under `root`,
    /// see [`Tree::populate_with_rng`].
    pub fn populate(
        &mut self,
        root: &NodeId,
        size: usize,
        options: &PopulateOptions,
    ) -> Result<Vec<NodeId>, TreeError> {
        self.populate_with_rng(root, size, options, &mut thread_rng())
    }

    /// Grows a random binary topology with `size` leaves under `root` and
    /// returns the ids of the new leaves.
    ///
    /// Nodes of the growing frontier are split in two until there are `size`
    /// of them, each time taking a node from either end of the frontier.
    /// If `root` already has several children they are first moved under a
    /// new child of `root`, and the growth starts from a second new child.
    /// ```
    /// use phyloedit::tree::{PopulateOptions, Tree, Node};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut tree = Tree::new();
    /// let root = tree.add(Node::new());
    /// let mut rng = StdRng::seed_from_u64(7);
    ///
    /// let leaves = tree
    ///     .populate_with_rng(&root, 5, &PopulateOptions::default(), &mut rng)
    ///     .unwrap();
    ///
    /// assert_eq!(leaves.len(), 5);
    /// assert_eq!(tree.n_leaves(), 5);
    /// assert_eq!(tree.size(), 9);
    /// ```
    pub fn populate_with_rng<R: Rng + ?Sized>(
        &mut self,
        root: &NodeId,
        size: usize,
        options: &PopulateOptions,
        rng: &mut R,
    ) -> Result<Vec<NodeId>, TreeError> {
        if let Some(names) = options.names.as_ref() {
            if names.len() < size {
                return Err(TreeError::InsufficientNameSource {
                    needed: size,
                    available: names.len(),
                });
            }
        }
        let dists = Sampler::new(options.random_branches, options.dist_range)?;
        let supports = Sampler::new(options.random_branches, options.support_range)?;
        if size == 0 {
            return Ok(vec![]);
        }

        let start = if self.get(root)?.children.len() > 1 {
            let connector = self.add(Node::new());
            let children = std::mem::take(&mut self.get_mut(root)?.children);
            for child in children.iter() {
                self.get_mut(child)?.set_parent(connector);
            }
            self.get_mut(&connector)?.children = children;
            self.attach(root, &connector)?;

            self.add_child(Node::new(), *root, None)?
        } else {
            *root
        };
        debug!(root, start, size, "populating tree");

        let mut frontier = VecDeque::from([start]);
        for _ in 1..size {
            let parent = if rng.gen_bool(0.5) {
                frontier.pop_front()
            } else {
                frontier.pop_back()
            }
            .ok_or(TreeError::IsEmpty)?;

            for _ in 0..2 {
                let mut child = Node::new();
                child.support = Some(supports.sample(rng));
                let dist = dists.sample(rng);
                frontier.push_back(self.add_child(child, parent, Some(dist))?);
            }
        }

        for (i, leaf) in frontier.iter().enumerate() {
            let name = match options.names.as_ref() {
                Some(names) => names[i].clone(),
                None => leaf_name(i),
            };
            self.get_mut(leaf)?.set_name(name);
        }

        Ok(frontier.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_node() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.add(Node::new());
        (tree, root)
    }

    #[test]
    fn binary_tree_sizes() {
        for size in 1..20 {
            let (mut tree, root) = single_node();
            let mut rng = StdRng::seed_from_u64(size as u64);
            let leaves = tree
                .populate_with_rng(&root, size, &PopulateOptions::default(), &mut rng)
                .unwrap();

            assert_eq!(leaves.len(), size);
            assert_eq!(tree.n_leaves(), size);
            assert_eq!(tree.size(), 2 * size - 1);
            for id in tree.preorder(&root).unwrap() {
                let n = tree.get(&id).unwrap().children.len();
                assert!(n == 0 || n == 2);
            }
        }
    }

    #[test]
    fn default_branches_and_names() {
        let (mut tree, root) = single_node();
        tree.populate(&root, 4, &PopulateOptions::default()).unwrap();

        let mut names: Vec<_> = tree.get_leaf_names().into_iter().flatten().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c", "d"]);

        for id in tree.get_descendants(&root).unwrap() {
            let node = tree.get(&id).unwrap();
            assert_eq!(node.dist, Some(1.0));
            assert_eq!(node.support, Some(1.0));
        }
        assert!(tree.get(&root).unwrap().dist.is_none());
    }

    #[test]
    fn named_leaves_follow_frontier() {
        let (mut tree, root) = single_node();
        let options = PopulateOptions {
            names: Some(["w", "x", "y", "z", "unused"].map(String::from).to_vec()),
            ..Default::default()
        };
        let leaves = tree.populate(&root, 4, &options).unwrap();

        let names: Vec<_> = leaves
            .iter()
            .map(|leaf| tree.get(leaf).unwrap().name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["w", "x", "y", "z"]);
    }

    #[test]
    fn not_enough_names() {
        let (mut tree, root) = single_node();
        let options = PopulateOptions {
            names: Some(vec!["A".into(), "B".into()]),
            ..Default::default()
        };

        assert!(matches!(
            tree.populate(&root, 3, &options),
            Err(TreeError::InsufficientNameSource {
                needed: 3,
                available: 2
            })
        ));
        assert_eq!(tree.size(), 1);
    }

    #[test]
    fn random_branches_in_range() {
        let (mut tree, root) = single_node();
        let options = PopulateOptions {
            random_branches: true,
            dist_range: (0.5, 2.0),
            support_range: (90.0, 100.0),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        tree.populate_with_rng(&root, 50, &options, &mut rng).unwrap();

        for id in tree.get_descendants(&root).unwrap() {
            let node = tree.get(&id).unwrap();
            assert!((0.5..=2.0).contains(&node.dist.unwrap()));
            assert!((90.0..=100.0).contains(&node.support.unwrap()));
        }

        let bad = PopulateOptions {
            random_branches: true,
            dist_range: (2.0, 0.5),
            ..Default::default()
        };
        assert!(matches!(
            tree.populate(&root, 3, &bad),
            Err(TreeError::DistrError(_))
        ));
    }

    #[test]
    fn seeded_growth_is_reproducible() {
        let grow = || {
            let (mut tree, root) = single_node();
            let mut rng = StdRng::seed_from_u64(11);
            tree.populate_with_rng(&root, 12, &PopulateOptions::default(), &mut rng)
                .unwrap();
            tree.to_newick().unwrap()
        };
        assert_eq!(grow(), grow());
    }

    #[test]
    fn multifurcating_root_gets_connector() {
        let mut tree = Tree::from_newick("(A,B)R;").unwrap();
        let root = tree.get_root().unwrap();
        tree.populate(&root, 3, &PopulateOptions::default()).unwrap();

        let children = &tree.get(&root).unwrap().children;
        assert_eq!(children.len(), 2);
        let connector = tree.get(&children[0]).unwrap();
        assert_eq!(connector.children.len(), 2);
        assert!(tree.get_by_name("A").unwrap().parent == Some(connector.id));
        assert_eq!(tree.get_subtree_leaves(&children[1]).unwrap().len(), 3);
        assert_eq!(tree.n_leaves(), 5);
        assert_eq!(tree.size(), 9);
    }

    #[test]
    fn single_child_root_grows_in_place() {
        let mut tree = Tree::from_newick("(A)R;").unwrap();
        let root = tree.get_root().unwrap();
        tree.populate(&root, 2, &PopulateOptions::default()).unwrap();

        assert_eq!(tree.get(&root).unwrap().children.len(), 3);
        assert_eq!(tree.n_leaves(), 3);
    }
}
