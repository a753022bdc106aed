//! Iterative tree traversal with an explicit stack.
//!
//! A [`Walker`] emits one [`Cursor`] when a node is first reached and, for
//! internal nodes, a second one once all its children have been visited.
//! After a first visit the caller may call [`Walker::prune`] so that the
//! children of that node are skipped. The walker does not borrow the tree
//! between two events, which lets whole-tree passes edit a node's child
//! sequence on its final visit.

use super::{NodeId, Tree};

/// A position reached during a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Node being visited
    pub node: NodeId,
    /// `true` for the first visit of the node, `false` once its children are done
    pub first_visit: bool,
    /// Whether the node still has children that will be visited
    pub has_unvisited_children: bool,
    /// Number of edges between the node and the root of the traversal
    pub depth: usize,
}

impl Cursor {
    /// Whether this is the last event emitted for the node:
    /// the only visit of a leaf or the post-visit of an internal node.
    pub fn is_final_visit(&self) -> bool {
        !self.first_visit || !self.has_unvisited_children
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    next_child: usize,
}

/// Single pass traversal state
#[derive(Debug, Clone)]
pub struct Walker {
    root: NodeId,
    stack: Vec<Frame>,
    started: bool,
    descend: bool,
    last_was_first_visit: bool,
    leaving: bool,
}

impl Walker {
    /// Creates a walker over the subtree rooted at `root`
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            stack: vec![],
            started: false,
            descend: true,
            last_was_first_visit: false,
            leaving: false,
        }
    }

    /// Do not visit the children of the node that was just reached.
    /// Only has an effect right after a first visit.
    pub fn prune(&mut self) {
        self.descend = false;
    }

    /// Positions of the current node and its ancestors among their siblings,
    /// from the root of the traversal down.
    pub fn path_id(&self) -> Vec<usize> {
        let ancestors = self.stack.len().saturating_sub(1);
        self.stack[..ancestors]
            .iter()
            .map(|frame| frame.next_child - 1)
            .collect()
    }

    fn enter(&mut self, tree: &Tree, node: NodeId) -> Cursor {
        let depth = self.stack.len();
        self.stack.push(Frame {
            node,
            next_child: 0,
        });
        self.last_was_first_visit = true;

        Cursor {
            node,
            first_visit: true,
            has_unvisited_children: !tree.node(node).is_tip(),
            depth,
        }
    }

    /// Moves to the next event of the traversal
    pub fn advance(&mut self, tree: &Tree) -> Option<Cursor> {
        if !self.started {
            self.started = true;
            return Some(self.enter(tree, self.root));
        }

        if self.leaving {
            self.leaving = false;
            self.stack.pop();
        }

        let mut skip = self.last_was_first_visit && !self.descend;
        self.descend = true;
        self.last_was_first_visit = false;

        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let frame = self.stack.last_mut()?;
            let children = &tree.node(frame.node).children;

            if skip {
                frame.next_child = children.len();
                skip = false;
            }

            if frame.next_child < children.len() {
                let child = children[frame.next_child];
                frame.next_child += 1;
                return Some(self.enter(tree, child));
            }

            if children.is_empty() {
                // leaves only get a first visit
                self.stack.pop();
                continue;
            }

            self.leaving = true;
            return Some(Cursor {
                node: frame.node,
                first_visit: false,
                has_unvisited_children: false,
                depth,
            });
        }
    }
}

/// Read-only traversal of a [`Tree`], see [`Tree::walk`]
#[derive(Debug, Clone)]
pub struct Traversal<'a> {
    tree: &'a Tree,
    walker: Walker,
}

impl<'a> Traversal<'a> {
    pub(crate) fn new(tree: &'a Tree, root: NodeId) -> Self {
        Self {
            tree,
            walker: Walker::new(root),
        }
    }

    /// See [`Walker::prune`]
    pub fn prune(&mut self) {
        self.walker.prune()
    }

    /// See [`Walker::path_id`]
    pub fn path_id(&self) -> Vec<usize> {
        self.walker.path_id()
    }
}

impl Iterator for Traversal<'_> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Self::Item> {
        self.walker.advance(self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    fn named_events(tree: &Tree, events: impl Iterator<Item = Cursor>) -> Vec<String> {
        events
            .map(|cursor| {
                let name = tree.get(&cursor.node).unwrap().name.clone().unwrap();
                if cursor.first_visit {
                    name
                } else {
                    format!("/{name}")
                }
            })
            .collect()
    }

    #[test]
    fn pre_and_post_visits() {
        let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
        let events = named_events(&tree, tree.walk(&0).unwrap());

        assert_eq!(
            events,
            vec!["F", "B", "A", "D", "C", "E", "/D", "/B", "G", "I", "H", "/I", "/G", "/F"]
        );
    }

    #[test]
    fn single_node() {
        let tree = Tree::from_newick("A;").unwrap();
        let events: Vec<_> = tree.walk(&0).unwrap().collect();

        assert_eq!(events.len(), 1);
        assert!(events[0].first_visit);
        assert!(events[0].is_final_visit());
    }

    #[test]
    fn prune_skips_children() {
        let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
        let d = tree.get_by_name("D").unwrap().id;
        let g = tree.get_by_name("G").unwrap().id;

        let mut walk = tree.walk(&0).unwrap();
        let mut events = vec![];
        while let Some(cursor) = walk.next() {
            if cursor.first_visit && (cursor.node == d || cursor.node == g) {
                walk.prune();
            }
            events.push(cursor);
        }

        assert_eq!(
            named_events(&tree, events.into_iter()),
            vec!["F", "B", "A", "D", "/D", "/B", "G", "/G", "/F"]
        );
    }

    #[test]
    fn prune_on_post_visit_is_ignored() {
        let tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
        let mut walk = tree.walk(&0).unwrap();
        let mut names = vec![];
        while let Some(cursor) = walk.next() {
            if !cursor.first_visit {
                walk.prune();
            }
            names.push(cursor.node);
        }

        assert_eq!(names.len(), 7);
    }

    #[test]
    fn path_and_depth() {
        let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
        let mut walk = tree.walk(&0).unwrap();
        while let Some(cursor) = walk.next() {
            let path = walk.path_id();
            assert_eq!(path, tree.path_id(&cursor.node).unwrap());
            assert_eq!(path.len(), cursor.depth);
        }
    }

    #[test]
    fn subtree_walk() {
        let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
        let d = tree.get_by_name("D").unwrap().id;

        let events = named_events(&tree, tree.walk(&d).unwrap());
        assert_eq!(events, vec!["D", "C", "E", "/D"]);
    }

    #[test]
    fn deep_tree_does_not_overflow() {
        let mut tree = Tree::new();
        let mut parent = tree.add(Node::new());
        for _ in 0..200_000 {
            parent = tree.add_child(Node::new(), parent, None).unwrap();
        }

        let n_final = tree
            .walk(&0)
            .unwrap()
            .filter(|cursor| cursor.is_final_visit())
            .count();
        assert_eq!(n_final, 200_001);
    }
}
