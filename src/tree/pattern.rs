//! Pattern matching on subtrees.
//!
//! A [`TreePattern`] is a small tree whose nodes carry conditions. It matches a
//! node of a [`Tree`] when the node satisfies the condition of the pattern root
//! and, if the pattern root has children, when the node has as many children
//! and they can be paired with the pattern children, in some order, so that
//! every pair matches recursively. A pattern leaf matches any subtree below a
//! node that satisfies its condition.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use super::{NewickParseError, Node, NodeId, Property, Tree, TreeError, SUPPORT};

/// Condition on a node of the searched tree
pub type Condition = Box<dyn Fn(&Tree, &Node) -> bool>;

/// A tree of node conditions matched against subtrees of a [`Tree`]
pub struct TreePattern {
    shape: Tree,
    conditions: HashMap<NodeId, Condition>,
}

impl TreePattern {
    /// Creates a pattern made of a single node with the given condition
    pub fn new(condition: impl Fn(&Tree, &Node) -> bool + 'static) -> Self {
        let mut shape = Tree::new();
        let root = shape.add(Node::new());

        Self {
            shape,
            conditions: HashMap::from([(root, Box::new(condition) as Condition)]),
        }
    }

    /// Adds a pattern node with the given condition under `parent`
    pub fn add_child(
        &mut self,
        parent: NodeId,
        condition: impl Fn(&Tree, &Node) -> bool + 'static,
    ) -> Result<NodeId, TreeError> {
        let id = self.shape.add_child(Node::new(), parent, None)?;
        self.conditions.insert(id, Box::new(condition));

        Ok(id)
    }

    /// Replaces the condition of a pattern node
    pub fn set_condition(
        &mut self,
        id: NodeId,
        condition: impl Fn(&Tree, &Node) -> bool + 'static,
    ) -> Result<(), TreeError> {
        self.shape.get(&id)?;
        self.conditions.insert(id, Box::new(condition));

        Ok(())
    }

    /// Builds a pattern from a newick string, the final `;` is optional.
    ///
    /// A named pattern node only matches nodes with the same name, and the
    /// support and NHX properties it carries must have the same values on the
    /// matched node. Pattern nodes without a name or properties match any node.
    /// ```
    /// use phyloedit::tree::{Tree, TreePattern};
    ///
    /// let tree = Tree::from_newick("((A,B)C,(D,(E,F)G)H)R;").unwrap();
    /// let pattern = TreePattern::from_newick("(D,(F,))").unwrap();
    ///
    /// let found = pattern.search(&tree, &tree.get_root().unwrap()).unwrap();
    /// assert_eq!(found, vec![tree.get_by_name("H").unwrap().id]);
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, NewickParseError> {
        let newick = format!("{};", newick.trim().trim_end_matches(';'));
        let shape = Tree::from_newick(&newick)?;

        let mut conditions = HashMap::new();
        for id in shape.preorder(&shape.get_root()?)? {
            let node = shape.get(&id)?;
            let name = node.name.clone();
            let mut props: Vec<(String, Property)> = node
                .props
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if let Some(support) = node.support {
                props.push((SUPPORT.to_string(), Property::Number(support)));
            }
            if name.is_none() && props.is_empty() {
                continue;
            }

            let condition: Condition = Box::new(move |_: &Tree, candidate: &Node| {
                name.as_ref().map_or(true, |name| candidate.name.as_ref() == Some(name))
                    && props
                        .iter()
                        .all(|(key, value)| candidate.get_prop(key).as_ref() == Some(value))
            });
            conditions.insert(id, condition);
        }

        Ok(Self { shape, conditions })
    }

    /// Tree holding the structure of the pattern
    pub fn shape(&self) -> &Tree {
        &self.shape
    }

    /// Whether the pattern matches the subtree rooted at `node`
    /// ```
    /// use phyloedit::tree::{Tree, TreePattern};
    ///
    /// let tree = Tree::from_newick("((A,B)C,D)R;").unwrap();
    /// let c = tree.get_by_name("C").unwrap().id;
    ///
    /// assert!(TreePattern::from_newick("(B,A)").unwrap().matches(&tree, &c).unwrap());
    /// assert!(!TreePattern::from_newick("(A,B,D)").unwrap().matches(&tree, &c).unwrap());
    /// ```
    pub fn matches(&self, tree: &Tree, node: &NodeId) -> Result<bool, TreeError> {
        self.match_node(self.shape.get_root()?, tree, *node)
    }

    /// Ids of the nodes matched by the pattern in the subtree rooted at
    /// `root`, in preorder.
    pub fn search(&self, tree: &Tree, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut found = vec![];
        for cursor in tree.walk(root)?.filter(|cursor| cursor.first_visit) {
            if self.matches(tree, &cursor.node)? {
                found.push(cursor.node);
            }
        }
        debug!(root, found = found.len(), "searched tree pattern");

        Ok(found)
    }

    fn match_node(&self, pattern: NodeId, tree: &Tree, node: NodeId) -> Result<bool, TreeError> {
        let expected = &self.shape.get(&pattern)?.children;
        let candidate = tree.get(&node)?;
        if !expected.is_empty() && expected.len() != candidate.children.len() {
            return Ok(false);
        }
        if let Some(condition) = self.conditions.get(&pattern) {
            if !condition(tree, candidate) {
                return Ok(false);
            }
        }
        if expected.is_empty() {
            return Ok(true);
        }

        'orders: for order in expected.iter().permutations(expected.len()) {
            for (sub_pattern, child) in order.into_iter().zip(candidate.children.iter()) {
                if !self.match_node(*sub_pattern, tree, *child)? {
                    continue 'orders;
                }
            }
            return Ok(true);
        }

        Ok(false)
    }
}
