use tracing::trace;

use super::{NodeId, Tree, TreeError, DIST, SUPPORT};

/// Single step mutations of the [`Tree`] structure that the larger
/// algorithms are built from.
///
/// Every primitive keeps the parent and child links of the touched nodes
/// consistent with each other.
///
/// ----
/// ----
impl Tree {
    // ##################
    // # ALTER THE TREE #
    // ##################

    /// Removes a node from its parent's children. The node keeps its own
    /// subtree and becomes the root of a detached fragment.
    /// Returns the former parent.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
    /// let c = tree.get_by_name("C").unwrap().id;
    /// let e = tree.detach(&c).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "(D)E;");
    /// assert!(tree.get(&c).unwrap().parent.is_none());
    ///
    /// tree.attach(&e, &c).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(D,(A,B)C)E;");
    /// ```
    pub fn detach(&mut self, node: &NodeId) -> Result<NodeId, TreeError> {
        let parent = self
            .get(node)?
            .parent
            .ok_or(TreeError::RootOperation(*node))?;

        self.get_mut(&parent)?.remove_child(node)?;
        self.get_mut(node)?.parent = None;

        Ok(parent)
    }

    /// Appends a parentless node to the children of `parent`.
    ///
    /// Attaching the tree root under a detached fragment makes the root of
    /// that fragment the new root of the tree.
    pub fn attach(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), TreeError> {
        if self.get(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(*child));
        }
        if self.lineage(parent)?.contains(child) {
            return Err(TreeError::WouldCreateCycle {
                parent: *parent,
                child: *child,
            });
        }

        if self.get_root().ok() == Some(*child) {
            let new_root = self.root_of(parent)?;
            self.set_root(Some(new_root));
        }

        self.get_mut(child)?.set_parent(*parent);
        self.get_mut(parent)?.add_child(*child);

        Ok(())
    }

    /// Swaps a node with the sibling `shift` positions away from it.
    /// Positions wrap around the parent's children and `shift` may be negative.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(A,B,C,D)E;").unwrap();
    /// let a = tree.get_by_name("A").unwrap().id;
    ///
    /// tree.move_node(&a, 1).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(B,A,C,D)E;");
    ///
    /// tree.move_node(&a, -2).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(B,D,C,A)E;");
    /// ```
    pub fn move_node(&mut self, node: &NodeId, shift: isize) -> Result<(), TreeError> {
        let parent = self
            .get(node)?
            .parent
            .ok_or(TreeError::RootOperation(*node))?;
        let position = self.get(&parent)?.child_position(node)?;

        let siblings = &mut self.get_mut(&parent)?.children;
        let target = (position as isize + shift).rem_euclid(siblings.len() as isize) as usize;
        siblings.swap(position, target);

        Ok(())
    }

    /// Removes a node and its whole subtree from the tree.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let g = tree.get_by_name("G").unwrap().id;
    ///
    /// tree.remove(&g).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "((A,(C,E)D)B)F;");
    /// assert!(tree.get_by_name("H").is_none());
    /// ```
    pub fn remove(&mut self, node: &NodeId) -> Result<(), TreeError> {
        self.detach(node)?;
        for id in self.postorder(node)? {
            self.nodes[id].delete();
        }

        Ok(())
    }

    /// Puts `intermediate` in the place of `node` within its parent and
    /// makes `node` its only child.
    ///
    /// The branch length of `node` is split in half between the two nodes,
    /// and the support as well as the `bprops` branch properties of `node`
    /// are copied onto `intermediate`.
    /// ```
    /// use phyloedit::tree::{Node, Tree};
    ///
    /// let mut tree = Tree::from_newick("((A:1,B:2)C:4,D:1)E;").unwrap();
    /// let c = tree.get_by_name("C").unwrap().id;
    /// let x = tree.add(Node::new_named("X"));
    ///
    /// tree.insert_intermediate(&c, &x, &[]).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(((A:1,B:2)C:2)X:2,D:1)E;");
    /// ```
    pub fn insert_intermediate(
        &mut self,
        node: &NodeId,
        intermediate: &NodeId,
        bprops: &[&str],
    ) -> Result<(), TreeError> {
        let inserted = self.get(intermediate)?;
        if inserted.parent.is_some() || *intermediate == *node {
            return Err(TreeError::AlreadyAttached(*intermediate));
        }
        if !inserted.is_tip() {
            return Err(TreeError::DegreeMismatch {
                node: *intermediate,
                expected: 0,
                found: inserted.children.len(),
            });
        }
        let parent = self
            .get(node)?
            .parent
            .ok_or(TreeError::RootOperation(*node))?;

        self.replace_in_parent(node, parent, intermediate)?;
        self.get_mut(node)?.set_parent(*intermediate);
        self.get_mut(intermediate)?.add_child(*node);

        let source = self.get_mut(node)?;
        if let Some(dist) = source.dist.as_mut() {
            *dist /= 2.0;
        }
        let copied: Vec<_> = [DIST, SUPPORT]
            .iter()
            .chain(bprops)
            .filter_map(|key| source.get_prop(key).map(|value| (*key, value)))
            .collect();

        let target = self.get_mut(intermediate)?;
        for (key, value) in copied {
            target.set_prop(key, value)?;
        }
        trace!(node, intermediate, "inserted intermediate node");

        Ok(())
    }

    /// Removes a node that has a single child, the child takes its place.
    ///
    /// The branch length of the removed node is added to the one of the child.
    /// Returns the id of the child.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(((A:1,B:2)C:2)X:2,D:1)E;").unwrap();
    /// let x = tree.get_by_name("X").unwrap().id;
    ///
    /// tree.join_branch(&x).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "((A:1,B:2)C:4,D:1)E;");
    /// assert!(tree.get(&x).is_err());
    /// ```
    pub fn join_branch(&mut self, node: &NodeId) -> Result<NodeId, TreeError> {
        let joined = self.get(node)?;
        if joined.children.len() != 1 {
            return Err(TreeError::DegreeMismatch {
                node: *node,
                expected: 1,
                found: joined.children.len(),
            });
        }
        let parent = joined.parent.ok_or(TreeError::RootOperation(*node))?;
        let child = joined.children[0];
        let dist = joined.dist;

        if let (Some(s1), Some(s2)) = (joined.support, self.get(&child)?.support) {
            if s1 != s2 {
                return Err(TreeError::SupportConflict {
                    node: *node,
                    child,
                });
            }
        }

        self.replace_in_parent(node, parent, &child)?;
        if let Some(dist) = dist {
            let child = self.get_mut(&child)?;
            child.dist = Some(child.dist.unwrap_or(0.0) + dist);
        }
        self.nodes[*node].delete();
        trace!(node, child, "joined branch");

        Ok(child)
    }

    /// Exchanges the values of the given properties between two nodes.
    /// Properties missing on one side end up missing on the other.
    pub fn swap_props(&mut self, a: &NodeId, b: &NodeId, names: &[&str]) -> Result<(), TreeError> {
        self.get(b)?;
        for name in names {
            let from_a = self.get_mut(a)?.remove_prop(name);
            let from_b = self.get_mut(b)?.remove_prop(name);
            if let Some(value) = from_b {
                self.get_mut(a)?.set_prop(name, value)?;
            }
            if let Some(value) = from_a {
                self.get_mut(b)?.set_prop(name, value)?;
            }
        }

        Ok(())
    }

    /// Puts `new` at the position `old` has in the children of `parent`.
    /// `old` is left parentless.
    fn replace_in_parent(
        &mut self,
        old: &NodeId,
        parent: NodeId,
        new: &NodeId,
    ) -> Result<(), TreeError> {
        let position = self.get(&parent)?.child_position(old)?;
        self.get_mut(&parent)?.children[position] = *new;
        self.get_mut(new)?.set_parent(parent);
        self.get_mut(old)?.parent = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Node, Property};

    fn assert_links(tree: &Tree) {
        let root = tree.get_root().unwrap();
        for id in tree.preorder(&root).unwrap() {
            for child in tree.get(&id).unwrap().children.iter() {
                assert_eq!(tree.get(child).unwrap().parent, Some(id));
            }
        }
    }

    #[test]
    fn detach_root_fails() {
        let mut tree = Tree::from_newick("(A,B)C;").unwrap();
        let root = tree.get_root().unwrap();
        assert!(matches!(
            tree.detach(&root),
            Err(TreeError::RootOperation(id)) if id == root
        ));
        assert!(matches!(tree.remove(&root), Err(TreeError::RootOperation(_))));
        assert!(matches!(
            tree.move_node(&root, 1),
            Err(TreeError::RootOperation(_))
        ));
    }

    #[test]
    fn attach_checks() {
        let mut tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        let c = tree.get_by_name("C").unwrap().id;
        let d = tree.get_by_name("D").unwrap().id;

        assert!(matches!(
            tree.attach(&d, &a),
            Err(TreeError::AlreadyAttached(_))
        ));

        tree.detach(&c).unwrap();
        assert!(matches!(
            tree.attach(&a, &c),
            Err(TreeError::WouldCreateCycle { .. })
        ));
        assert!(matches!(
            tree.attach(&c, &c),
            Err(TreeError::WouldCreateCycle { .. })
        ));

        tree.attach(&d, &c).unwrap();
        assert_eq!(tree.to_newick().unwrap(), "(((A,B)C)D)E;");
        assert_links(&tree);
    }

    #[test]
    fn attach_root_under_fragment() {
        let mut tree = Tree::from_newick("(A,B)C;").unwrap();
        let root = tree.get_root().unwrap();
        let new_root = tree.add(Node::new_named("R"));

        tree.attach(&new_root, &root).unwrap();
        assert_eq!(tree.get_root().unwrap(), new_root);
        assert_eq!(tree.to_newick().unwrap(), "((A,B)C)R;");
    }

    #[test]
    fn move_wraps_around() {
        let mut tree = Tree::from_newick("(A,B,C)R;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        tree.move_node(&c, 1).unwrap();
        assert_eq!(tree.to_newick().unwrap(), "(C,B,A)R;");
        tree.move_node(&c, 3).unwrap();
        assert_eq!(tree.to_newick().unwrap(), "(C,B,A)R;");
    }

    #[test]
    fn remove_deletes_subtree() {
        let mut tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        tree.remove(&c).unwrap();

        assert_eq!(tree.size(), 2);
        assert!(tree.get_by_name("A").is_none());
        assert!(tree.get(&c).is_err());
    }

    #[test]
    fn insert_copies_branch_props() {
        let mut tree = Tree::from_newick("((A,B)C:1[&&NHX:support=0.9:color=red:k=v],D)E;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        let x = tree.add(Node::new());
        tree.insert_intermediate(&c, &x, &["color"]).unwrap();

        let inserted = tree.get(&x).unwrap();
        assert_eq!(inserted.dist, Some(0.5));
        assert_eq!(inserted.support, Some(0.9));
        assert_eq!(inserted.get_prop("color"), Some(Property::Text("red".into())));
        assert!(!inserted.has_prop("k"));

        let c = tree.get(&c).unwrap();
        assert_eq!(c.dist, Some(0.5));
        assert_eq!(c.support, Some(0.9));
        assert_eq!(c.parent, Some(x));
        assert_links(&tree);
    }

    #[test]
    fn insert_without_dist() {
        let mut tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        let x = tree.add(Node::new());
        tree.insert_intermediate(&c, &x, &[]).unwrap();

        assert!(tree.get(&x).unwrap().dist.is_none());
        assert!(tree.get(&c).unwrap().dist.is_none());
    }

    #[test]
    fn insert_rejects_attached_nodes() {
        let mut tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        let d = tree.get_by_name("D").unwrap().id;
        let root = tree.get_root().unwrap();

        assert!(matches!(
            tree.insert_intermediate(&c, &d, &[]),
            Err(TreeError::AlreadyAttached(_))
        ));
        let x = tree.add(Node::new());
        assert!(matches!(
            tree.insert_intermediate(&root, &x, &[]),
            Err(TreeError::RootOperation(_))
        ));
        tree.detach(&c).unwrap();
        assert!(matches!(
            tree.insert_intermediate(&d, &c, &[]),
            Err(TreeError::DegreeMismatch { expected: 0, .. })
        ));
    }

    #[test]
    fn join_branch_errors() {
        let mut tree = Tree::from_newick("((A,B)C,(D[&&NHX:support=1])F[&&NHX:support=0.5])E;")
            .unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        let f = tree.get_by_name("F").unwrap().id;

        assert!(matches!(
            tree.join_branch(&c),
            Err(TreeError::DegreeMismatch {
                expected: 1,
                found: 2,
                ..
            })
        ));
        assert!(matches!(
            tree.join_branch(&f),
            Err(TreeError::SupportConflict { .. })
        ));

        let mut tree = Tree::from_newick("((A)B)C;").unwrap();
        let root = tree.get_root().unwrap();
        assert!(matches!(
            tree.join_branch(&root),
            Err(TreeError::RootOperation(_))
        ));
    }

    #[test]
    fn join_defaults_child_dist() {
        let mut tree = Tree::from_newick("((A)B:0.5,C)R;").unwrap();
        let b = tree.get_by_name("B").unwrap().id;
        let a = tree.join_branch(&b).unwrap();

        assert_eq!(tree.get(&a).unwrap().dist, Some(0.5));
        assert_eq!(tree.to_newick().unwrap(), "(A:0.5,C)R;");
    }

    #[test]
    fn insert_then_join_restores() {
        let newick = "((A:1,B:2)C:3[&&NHX:support=0.7],D:1)E;";
        let mut tree = Tree::from_newick(newick).unwrap();
        let c = tree.get_by_name("C").unwrap().id;
        let x = tree.add(Node::new());

        tree.insert_intermediate(&c, &x, &[]).unwrap();
        let child = tree.join_branch(&x).unwrap();

        assert_eq!(child, c);
        assert_eq!(tree.to_newick().unwrap(), newick);
        assert_links(&tree);
    }

    #[test]
    fn swap_branch_props() {
        let mut tree = Tree::from_newick("(A:1[&&NHX:support=0.5:color=red],B:2)R;").unwrap();
        let a = tree.get_by_name("A").unwrap().id;
        let b = tree.get_by_name("B").unwrap().id;

        tree.swap_props(&a, &b, &[DIST, SUPPORT, "color", "missing"])
            .unwrap();

        let (a, b) = (tree.get(&a).unwrap(), tree.get(&b).unwrap());
        assert_eq!((a.dist, b.dist), (Some(2.0), Some(1.0)));
        assert_eq!((a.support, b.support), (None, Some(0.5)));
        assert!(!a.has_prop("color") && b.has_prop("color"));
        assert!(!a.has_prop("missing") && !b.has_prop("missing"));
    }
}
