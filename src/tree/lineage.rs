use std::collections::HashSet;

use super::{EdgeLength, NodeId, Tree, TreeError};

/// Methods to relate nodes through their ancestors.
///
/// ----
/// ----
impl Tree {
    // ####################
    // # LINEAGE QUERIES  #
    // ####################

    /// Gets the deepest node that is an ancestor of, or equal to, every given node.
    ///
    /// Returns `None` if no node is given or if the nodes belong to
    /// separate fragments of the tree.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let ids: Vec<_> = ["A", "C"]
    ///     .iter()
    ///     .map(|name| tree.get_by_name(name).unwrap().id)
    ///     .collect();
    ///
    /// let ancestor = tree.common_ancestor(&ids).unwrap().unwrap();
    /// assert_eq!(tree.get(&ancestor).unwrap().name, Some("B".to_owned()));
    /// assert_eq!(tree.common_ancestor(&[]).unwrap(), None);
    /// ```
    pub fn common_ancestor(&self, nodes: &[NodeId]) -> Result<Option<NodeId>, TreeError> {
        let (first, others) = match nodes.split_first() {
            Some(split) => split,
            None => return Ok(None),
        };

        let mut candidate = self.get(first)?.id;
        for node in others {
            let ancestors: HashSet<NodeId> = self.lineage(node)?.into_iter().collect();
            match self
                .lineage(&candidate)?
                .into_iter()
                .find(|id| ancestors.contains(id))
            {
                Some(ancestor) => candidate = ancestor,
                None => return Ok(None),
            }
        }

        Ok(Some(candidate))
    }

    /// Gets the distance between 2 nodes, returns the sum of branch lengths (if all
    /// branches in the path have lengths) and the number of edges in the path.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A:1,(C:1,E:2)D:3)B:1,((H)I)G)F;").unwrap();
    /// let a = tree.get_by_name("A").unwrap().id;
    ///
    /// let (length, edges) = tree.get_distance(&a, &tree.get_by_name("E").unwrap().id).unwrap();
    /// assert_eq!((length, edges), (Some(6.0), 3));
    ///
    /// let (length, edges) = tree.get_distance(&a, &tree.get_by_name("I").unwrap().id).unwrap();
    /// assert_eq!((length, edges), (None, 4));
    /// ```
    pub fn get_distance(
        &self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<(Option<EdgeLength>, usize), TreeError> {
        let ancestor = self
            .common_ancestor(&[*source, *target])?
            .ok_or(TreeError::Disconnected(*source, *target))?;

        let mut dist = 0.0;
        let mut branches = 0;
        let mut all_dists = true;

        for end in [source, target] {
            for node in self.lineage(end)?.iter().take_while(|id| **id != ancestor) {
                match self.get(node)?.dist {
                    Some(d) => dist += d,
                    None => all_dists = false,
                }
                branches += 1;
            }
        }

        Ok((all_dists.then_some(dist), branches))
    }
}
