use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::walk::Walker;
use super::{EdgeLength, Node, NodeId, Tree, TreeError};

/// Methods that reorder children or rescale branches of a [`Tree`] according
/// to the size of subtrees.
///
/// ----
/// ----
impl Tree {
    // ##############################
    // # SIZE DRIVEN REORDERING     #
    // ##############################

    /// Sorts the children of every node in the subtree rooted at `root`
    /// with a comparison function on nodes. Sizes are recomputed first so
    /// the comparison can use [`Node::size`].
    pub fn sort_by<F>(&mut self, root: &NodeId, mut compare: F, reverse: bool) -> Result<(), TreeError>
    where
        F: FnMut(&Node, &Node) -> Ordering,
    {
        self.update_sizes_all(root)?;

        for id in self.postorder(root)? {
            let mut children = self.node(id).children.clone();
            children.sort_by(|a, b| {
                let order = compare(self.node(*a), self.node(*b));
                if reverse {
                    order.reverse()
                } else {
                    order
                }
            });
            self.get_mut(&id)?.children = children;
        }

        Ok(())
    }

    /// Sorts the children of every node by number of leaves, then by
    /// distance to the farthest leaf, then by name.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((C,(A,B)),(E,D));").unwrap();
    /// tree.sort(&tree.get_root().unwrap(), false).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "((D,E),(C,(A,B)));");
    /// ```
    pub fn sort(&mut self, root: &NodeId, reverse: bool) -> Result<(), TreeError> {
        self.sort_by(
            root,
            |a, b| {
                let (sa, sb) = (a.size().unwrap_or_default(), b.size().unwrap_or_default());
                sa.nleaves
                    .cmp(&sb.nleaves)
                    .then(sa.sumdist.total_cmp(&sb.sumdist))
                    .then_with(|| a.name.cmp(&b.name))
            },
            reverse,
        )
    }

    /// Sorts the children of every node so that smaller subtrees come first
    /// (last if `reverse` is set).
    ///
    /// The size of a subtree is the length of the path to its farthest leaf,
    /// counted in branches if `topological` is set. Ties are broken by number
    /// of children and otherwise keep their current order.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("(((A,B)C,D)E,F)R;").unwrap();
    /// let root = tree.get_root().unwrap();
    ///
    /// tree.ladderize(&root, true, false).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(F,(D,(A,B)C)E)R;");
    ///
    /// tree.ladderize(&root, true, true).unwrap();
    /// assert_eq!(tree.to_newick().unwrap(), "(((A,B)C,D)E,F)R;");
    /// ```
    pub fn ladderize(&mut self, root: &NodeId, topological: bool, reverse: bool) -> Result<(), TreeError> {
        let own_size = |node: &Node| {
            if topological {
                1.0
            } else {
                node.dist.unwrap_or(1.0)
            }
        };

        // only the sizes of nodes whose parent is not done yet are kept
        let mut sizes: HashMap<NodeId, EdgeLength> = HashMap::new();
        let mut walker = Walker::new(self.get(root)?.id);
        while let Some(cursor) = walker.advance(self) {
            if !cursor.is_final_visit() {
                continue;
            }

            let node = self.node(cursor.node);
            let mut children: Vec<(NodeId, EdgeLength, usize)> = node
                .children
                .iter()
                .map(|child| {
                    let size = sizes.remove(child).ok_or(TreeError::SizeNotComputed(*child))?;
                    Ok::<_, TreeError>((*child, size, self.node(*child).children.len()))
                })
                .collect::<Result<_, TreeError>>()?;

            let farthest = children
                .iter()
                .map(|(_, size, _)| *size)
                .fold(0.0, EdgeLength::max);
            sizes.insert(cursor.node, own_size(node) + farthest);

            if children.len() > 1 {
                children.sort_by(|(_, s1, n1), (_, s2, n2)| {
                    let order = s1.total_cmp(s2).then(n1.cmp(n2));
                    if reverse {
                        order.reverse()
                    } else {
                        order
                    }
                });
                self.get_mut(&cursor.node)?.children =
                    children.into_iter().map(|(id, _, _)| id).collect();
            }
        }
        debug!(root, topological, reverse, "ladderized tree");

        Ok(())
    }

    /// Rescales branch lengths so that every leaf is at the same distance
    /// from `root`, keeping the depth of the farthest leaf.
    ///
    /// If `topological` is set, or some branch lengths are missing, or all of
    /// them are null, every branch is first given a length of 1.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A:1,B:3)C:1,D:1)R;").unwrap();
    /// tree.to_ultrametric(&tree.get_root().unwrap(), false).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), "((A:3,B:3)C:1,D:4)R:0;");
    /// ```
    pub fn to_ultrametric(&mut self, root: &NodeId, topological: bool) -> Result<(), TreeError> {
        let top = self.get_mut(root)?;
        if top.dist.is_none() {
            top.dist = Some(0.0);
        }

        self.update_sizes_all(root)?;
        let mut farthest = self.farthest(root)?;

        let subtree = self.preorder(root)?;
        let missing = subtree.iter().any(|id| self.node(*id).dist.is_none());
        if topological || farthest <= 0.0 || missing {
            debug!(root, topological, farthest, missing, "resetting branch lengths");
            for id in subtree.iter() {
                self.nodes[*id].dist = Some(if id == root { 0.0 } else { 1.0 });
            }
            self.update_sizes_all(root)?;
            if farthest <= 0.0 {
                farthest = self.farthest(root)?;
            }
        }

        // sums[d] is the length of the path from root to the current node at depth d
        let mut sums: Vec<EdgeLength> = vec![];
        let mut walker = Walker::new(*root);
        while let Some(cursor) = walker.advance(self) {
            if !cursor.first_visit {
                continue;
            }
            sums.truncate(cursor.depth);
            let above = sums.last().copied().unwrap_or(0.0);

            let node = &mut self.nodes[cursor.node];
            let sumdist = node
                .size
                .ok_or(TreeError::SizeNotComputed(cursor.node))?
                .sumdist;
            if let Some(dist) = node.dist.as_mut().filter(|dist| **dist > 0.0) {
                *dist *= (farthest - above) / sumdist;
            }
            sums.push(above + node.dist.unwrap_or(0.0));
        }

        Ok(())
    }

    fn farthest(&self, root: &NodeId) -> Result<EdgeLength, TreeError> {
        Ok(self
            .get(root)?
            .size
            .ok_or(TreeError::SizeNotComputed(*root))?
            .sumdist)
    }
}
