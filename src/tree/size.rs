use super::walk::Walker;
use super::{EdgeLength, NodeId, Tree, TreeError};

/// Extent of the subtree rooted at a node
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    /// Distance from the node (own branch included) to its farthest leaf
    pub sumdist: EdgeLength,
    /// Number of leaves in the subtree, 1 for a leaf
    pub nleaves: usize,
}

/// Methods that compute and cache [`Size`] values.
///
/// Sizes are not kept up to date by edits: call one of these before reading
/// [`Node::size`](super::Node::size) after the tree changed.
///
/// ----
/// ----
impl Tree {
    // ##############
    // # SIZE CACHE #
    // ##############

    /// Recomputes the size of a node from the cached sizes of its children
    pub fn update_size(&mut self, id: &NodeId) -> Result<Size, TreeError> {
        let node = self.get(id)?;

        let mut sumdist: EdgeLength = 0.0;
        let mut nleaves = 0;
        for child in node.children.iter() {
            let size = self.get(child)?.size.ok_or(TreeError::SizeNotComputed(*child))?;
            sumdist = sumdist.max(size.sumdist);
            nleaves += size.nleaves;
        }

        let size = Size {
            sumdist: node.dist_or_default() + sumdist,
            nleaves: nleaves.max(1),
        };
        self.get_mut(id)?.size = Some(size);

        Ok(size)
    }

    /// Recomputes the sizes of a node and all its ancestors,
    /// useful after a local edit below `id`
    pub fn update_sizes_from(&mut self, id: &NodeId) -> Result<(), TreeError> {
        let mut current = Some(*id);
        while let Some(node) = current {
            self.update_size(&node)?;
            current = self.node(node).parent;
        }

        Ok(())
    }

    /// Recomputes the sizes of every node in the subtree rooted at `root`
    /// ```
    /// use phyloedit::tree::{Size, Tree};
    ///
    /// let mut tree = Tree::from_newick("((A:1,B:3)C:1,D:1);").unwrap();
    /// let root = tree.get_root().unwrap();
    /// tree.update_sizes_all(&root).unwrap();
    ///
    /// let c = tree.get_by_name("C").unwrap();
    /// assert_eq!(c.size(), Some(Size { sumdist: 4.0, nleaves: 2 }));
    /// assert_eq!(tree.get(&root).unwrap().size().unwrap().nleaves, 3);
    /// ```
    pub fn update_sizes_all(&mut self, root: &NodeId) -> Result<(), TreeError> {
        let mut walker = Walker::new(self.get(root)?.id);
        while let Some(cursor) = walker.advance(self) {
            if cursor.is_final_visit() {
                self.update_size(&cursor.node)?;
            }
        }

        Ok(())
    }
}
