//! Rerooting a tree on one of its nodes.
//!
//! The tree keeps its root node object: after [`Tree::set_outgroup`] the former
//! root sits just above the outgroup and every edge on the path between them is
//! turned around. A fresh node stands in for the former root in the remaining
//! part of the tree. It is spliced out again if it ends up with a single child,
//! and dropped if the former root had a single child.

use tracing::{debug, trace};

use super::{Node, NodeId, RootInconsistency, Tree, TreeError, DIST, SUPPORT};

/// Methods to change the root of a [`Tree`].
///
/// ----
/// ----
impl Tree {
    // ##########################
    // # REROOT THE TREE        #
    // ##########################

    /// Checks that the root can be moved without losing branch information:
    /// it must have no branch length, none of the `bprops` branch properties
    /// and, if it has two children, they must have the same support.
    pub fn check_root_consistency(&self, root: &NodeId, bprops: &[&str]) -> Result<(), TreeError> {
        let node = self.get(root)?;
        let inconsistent = |reason| TreeError::InconsistentRoot {
            root: *root,
            reason,
        };

        if let Some(dist) = node.dist.filter(|dist| *dist != 0.0) {
            return Err(inconsistent(RootInconsistency::HasDistance(dist)));
        }

        if let Some(prop) = [SUPPORT].iter().chain(bprops).find(|key| node.has_prop(key)) {
            return Err(inconsistent(RootInconsistency::HasBranchProperty(
                prop.to_string(),
            )));
        }

        if let [left, right] = node.children.as_slice() {
            let (s1, s2) = (self.get(left)?.support, self.get(right)?.support);
            if s1 != s2 {
                return Err(inconsistent(RootInconsistency::AsymmetricSupport(s1, s2)));
            }
        }

        Ok(())
    }

    /// Reroots the tree so that `target` becomes the first child of the root.
    ///
    /// Branch lengths, supports and the `bprops` branch properties follow their
    /// edges: every path between two leaves keeps its total length, and the
    /// branch of `target` is split in half on each side of the root. When
    /// `target` is the only child of the root the tree is left as it was.
    ///
    /// The root node itself stays the root of the tree.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A:1,B:1)C:2,D:4)R;").unwrap();
    /// let a = tree.get_by_name("A").unwrap().id;
    ///
    /// tree.set_outgroup(&a, &[]).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(A:0.5,(B:1,D:6)C:0.5)R;");
    /// ```
    pub fn set_outgroup(&mut self, target: &NodeId, bprops: &[&str]) -> Result<(), TreeError> {
        let old_root = self.root_of(target)?;
        if old_root == *target {
            return Err(TreeError::RootOperation(*target));
        }
        self.check_root_consistency(&old_root, bprops)?;

        let positions = self.path_id(target)?;
        let depth = positions.len();
        debug!(outgroup = *target, root = old_root, depth, "rerooting tree");

        let replacement = self.add(Node::new());
        let children = std::mem::take(&mut self.get_mut(&old_root)?.children);
        for child in children.iter() {
            self.get_mut(child)?.set_parent(replacement);
        }
        self.get_mut(&replacement)?.children = children;

        self.insert_intermediate(target, &old_root, bprops)?;

        let mut current = replacement;
        for position in positions {
            current = self.rehang(&current, position, bprops)?;
        }

        match self.get(&replacement)?.children.len() {
            0 => {
                // the root had a single child: give the outgroup back the half
                // of its branch that was moved onto the replacement
                if depth == 1 {
                    if let Some(half) = self.get(&replacement)?.dist.filter(|d| *d != 0.0) {
                        let outgroup = self.get_mut(target)?;
                        outgroup.dist = Some(outgroup.dist.unwrap_or(0.0) + half);
                    }
                }
                self.remove(&replacement)?;
            }
            1 => {
                self.join_branch(&replacement)?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Turns the edge between `root` and its child at `position` around: the
    /// child becomes the parent of `root` and the branch properties of the edge
    /// move to `root`. Returns the child, which is now parentless.
    fn rehang(
        &mut self,
        root: &NodeId,
        position: usize,
        bprops: &[&str],
    ) -> Result<NodeId, TreeError> {
        let node = self.get(root)?;
        let child = *node
            .children
            .get(position)
            .ok_or(TreeError::DegreeMismatch {
                node: *root,
                expected: position + 1,
                found: node.children.len(),
            })?;

        self.get_mut(root)?.children.remove(position);
        self.get_mut(&child)?.parent = None;
        self.attach(&child, root)?;

        let props: Vec<&str> = [DIST, SUPPORT].iter().chain(bprops).copied().collect();
        self.swap_props(root, &child, &props)?;
        trace!(root, child, position, "rehanged edge");

        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn root_to_leaf_lengths(tree: &Tree) -> HashMap<String, f64> {
        tree.get_leaves()
            .into_iter()
            .map(|leaf| {
                let length = tree
                    .lineage(&leaf)
                    .unwrap()
                    .iter()
                    .map(|id| tree.get(id).unwrap().dist.unwrap_or(0.0))
                    .sum();
                (tree.get(&leaf).unwrap().name.clone().unwrap(), length)
            })
            .collect()
    }

    fn assert_consistent(tree: &Tree) {
        let root = tree.get_root().unwrap();
        assert!(tree.get(&root).unwrap().parent.is_none());
        for id in tree.preorder(&root).unwrap() {
            for child in tree.get(&id).unwrap().children.iter() {
                assert_eq!(tree.get(child).unwrap().parent, Some(id));
            }
        }
    }

    #[test]
    fn outgroup_is_first_child() {
        let mut tree = Tree::from_newick("((A:1,(B:1,C:2)D:1)E:1,(F:1,G:3)H:2)R;").unwrap();
        let root = tree.get_root().unwrap();
        let b = tree.get_by_name("B").unwrap().id;

        tree.set_outgroup(&b, &[]).unwrap();

        assert_eq!(tree.get_root().unwrap(), root);
        assert_eq!(tree.get(&root).unwrap().children[0], b);
        assert_eq!(tree.get(&b).unwrap().dist, Some(0.5));
        assert_eq!(tree.n_leaves(), 5);
        assert_consistent(&tree);
    }

    #[test]
    fn reroot_on_internal_node() {
        let mut tree = Tree::from_newick("((A:1,(B:1,C:2)D:1)E:1,(F:1,G:3)H:2)R;").unwrap();
        let d = tree.get_by_name("D").unwrap().id;
        tree.set_outgroup(&d, &[]).unwrap();

        assert_eq!(
            tree.to_newick().unwrap(),
            "((B:1,C:2)D:0.5,(A:1,(F:1,G:3)H:3)E:0.5)R;"
        );
        assert_consistent(&tree);
    }

    #[test]
    fn reroot_on_child_of_root() {
        let mut tree = Tree::from_newick("((A:1,B:1)C:2,(D:1,E:1)F:2)R;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        tree.set_outgroup(&c, &[]).unwrap();

        assert_eq!(
            tree.to_newick().unwrap(),
            "((A:1,B:1)C:1,(D:1,E:1)F:3)R;"
        );
    }

    #[test]
    fn multifurcating_root_is_kept() {
        let mut tree = Tree::from_newick("(A:1,B:2,C:3)R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        tree.set_outgroup(&a, &[]).unwrap();

        assert_eq!(tree.to_newick().unwrap(), "(A:0.5,(B:2,C:3):0.5)R;");
        assert_eq!(tree.size(), 5);
    }

    #[test]
    fn single_child_root() {
        let mut tree = Tree::from_newick("(((A:1,B:1)C:1)D:1)R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        tree.set_outgroup(&a, &[]).unwrap();

        assert_eq!(tree.to_newick().unwrap(), "(A:0.5,(B:1,D:1)C:0.5)R;");
        assert_consistent(&tree);
    }

    #[test]
    fn only_child_of_root() {
        let mut tree = Tree::from_newick("((A:1,B:1)C:2)R;").unwrap();
        let before = root_to_leaf_lengths(&tree);
        let c = tree.get_by_name("C").unwrap().id;
        tree.set_outgroup(&c, &[]).unwrap();

        assert_eq!(tree.to_newick().unwrap(), "((A:1,B:1)C:2)R;");
        assert_eq!(root_to_leaf_lengths(&tree), before);
        assert_eq!(tree.size(), 4);
        assert_consistent(&tree);

        let mut tree = Tree::from_newick("((A,B)C)R;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        tree.set_outgroup(&c, &[]).unwrap();
        assert_eq!(tree.to_newick().unwrap(), "((A,B)C)R;");
    }

    #[test]
    fn supports_follow_edges() {
        let mut tree =
            Tree::from_newick("((A,B)C[&&NHX:support=0.8],(D,E)F[&&NHX:support=0.8])R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        let root = tree.get_root().unwrap();
        tree.set_outgroup(&a, &[]).unwrap();

        let c = tree.get_by_name("C").unwrap();
        let f = tree.get_by_name("F").unwrap();
        assert_eq!(c.parent, Some(root));
        assert_eq!(f.parent, Some(c.id));
        assert_eq!(f.support, Some(0.8));
        assert!(tree.get(&root).unwrap().support.is_none());
    }

    #[test]
    fn extra_branch_props_follow_edges() {
        let mut tree =
            Tree::from_newick("(((A,B)C[&&NHX:color=red],D)E,F)R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        tree.set_outgroup(&a, &["color"]).unwrap();

        // the edge C-E is now carried by E
        assert!(tree.get_by_name("E").unwrap().has_prop("color"));
        assert!(!tree.get_by_name("C").unwrap().has_prop("color"));
    }

    #[test]
    fn path_lengths_preserved() {
        let mut tree =
            Tree::from_newick("((A:0.1,(B:0.2,C:0.3)D:0.4)E:0.5,(F:0.6,G:0.7)H:0.5)R;").unwrap();
        let f = tree.get_by_name("F").unwrap().id;
        let c = tree.get_by_name("C").unwrap().id;
        let pairs = [("A", "G"), ("B", "C"), ("F", "A"), ("C", "G")];
        let distance = |tree: &Tree, a: &str, b: &str| {
            let a = tree.get_by_name(a).unwrap().id;
            let b = tree.get_by_name(b).unwrap().id;
            let ancestor = tree.common_ancestor(&[a, b]).unwrap().unwrap();
            let up = |mut node: NodeId| {
                let mut total = 0.0;
                while node != ancestor {
                    total += tree.get(&node).unwrap().dist.unwrap_or(0.0);
                    node = tree.get(&node).unwrap().parent.unwrap();
                }
                total
            };
            up(a) + up(b)
        };
        let before: Vec<f64> = pairs.iter().map(|&(a, b)| distance(&tree, a, b)).collect();

        tree.set_outgroup(&f, &[]).unwrap();
        tree.set_outgroup(&c, &[]).unwrap();
        let after: Vec<f64> = pairs.iter().map(|&(a, b)| distance(&tree, a, b)).collect();

        for (x, y) in before.iter().zip(after.iter()) {
            assert!((x - y).abs() < 1e-9, "{x} != {y}");
        }
        assert_eq!(root_to_leaf_lengths(&tree)["C"], 0.15);
        assert_consistent(&tree);
    }

    #[test]
    fn reroot_errors() {
        let mut tree = Tree::from_newick("((A,B)C,D)R;").unwrap();
        let root = tree.get_root().unwrap();
        assert!(matches!(
            tree.set_outgroup(&root, &[]),
            Err(TreeError::RootOperation(_))
        ));

        let mut tree = Tree::from_newick("((A,B)C,D)R:1;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        assert!(matches!(
            tree.set_outgroup(&a, &[]),
            Err(TreeError::InconsistentRoot {
                reason: RootInconsistency::HasDistance(_),
                ..
            })
        ));

        let mut tree = Tree::from_newick("((A,B)C,D)R[&&NHX:color=blue];").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        assert!(tree.set_outgroup(&a, &[]).is_ok());
        let mut tree = Tree::from_newick("((A,B)C,D)R[&&NHX:color=blue];").unwrap();
        assert!(matches!(
            tree.set_outgroup(&a, &["color"]),
            Err(TreeError::InconsistentRoot {
                reason: RootInconsistency::HasBranchProperty(_),
                ..
            })
        ));

        let newick = "((A,B)C[&&NHX:support=0.5],D[&&NHX:support=1])R;";
        let mut tree = Tree::from_newick(newick).unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        assert!(matches!(
            tree.set_outgroup(&a, &[]),
            Err(TreeError::InconsistentRoot {
                reason: RootInconsistency::AsymmetricSupport(Some(_), Some(_)),
                ..
            })
        ));
        // nothing was changed
        assert_eq!(tree.to_newick().unwrap(), newick);
    }
}
