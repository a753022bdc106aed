use ptree::{print_tree, TreeBuilder};
use std::collections::VecDeque;

use thiserror::Error;

use super::node::{Node, NodeError};
use super::walk::Traversal;
use super::{EdgeLength, NodeId};

use crate::distr::DistrError;

/// Reasons for which a root node cannot be used as the starting point of a reroot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootInconsistency {
    /// The root has a non-zero branch length
    #[error("the root has a branch length of {0}")]
    HasDistance(EdgeLength),
    /// The root carries a branch property
    #[error("the root carries the branch property '{0}'")]
    HasBranchProperty(String),
    /// The root has two children with different supports
    #[error("the two children of the root have different supports ({0:?} and {1:?})")]
    AsymmetricSupport(Option<f64>, Option<f64>),
}

/// Errors that can occur when reading, writing and manipulating [`Tree`] structs.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree is empty and we are trying to do something that require at least one node
    #[error("This tree is empty.")]
    IsEmpty,
    /// No root node was found in the tree and we are trying to do something
    /// that requires a root node
    #[error("No root node found")]
    RootNotFound,
    /// The requested node with index [`NodeId`] does not exist in the tree
    #[error("There is no node with index: {0}")]
    NodeNotFound(NodeId),
    /// The node is a root and the operation needs a node with a parent
    #[error("Node {0} is a root: it cannot be moved, removed or used as outgroup")]
    RootOperation(NodeId),
    /// The root of the tree cannot be safely rerooted
    #[error("Root node {root} is inconsistent: {reason}")]
    InconsistentRoot {
        /// Id of the root node
        root: NodeId,
        /// What is wrong with it
        reason: RootInconsistency,
    },
    /// The node does not have the number of children the operation needs
    #[error("Node {node} must have exactly {expected} children but has {found}")]
    DegreeMismatch {
        /// Id of the node
        node: NodeId,
        /// Required number of children
        expected: usize,
        /// Actual number of children
        found: usize,
    },
    /// A node cannot be joined with its child since they have different supports
    #[error("Cannot join node {node} with its child {child}: their supports differ")]
    SupportConflict {
        /// Id of the joined node
        node: NodeId,
        /// Id of its only child
        child: NodeId,
    },
    /// Not enough names were given to name all the leaves
    #[error("Only {available} names available to name {needed} leaves")]
    InsufficientNameSource {
        /// Number of leaves to name
        needed: usize,
        /// Number of names given
        available: usize,
    },
    /// The node to attach is already the child of another node
    #[error("Node {0} already has a parent")]
    AlreadyAttached(NodeId),
    /// The node to attach is an ancestor of its new parent
    #[error("Attaching node {child} under node {parent} would create a cycle")]
    WouldCreateCycle {
        /// Id of the new parent
        parent: NodeId,
        /// Id of the attached node
        child: NodeId,
    },
    /// The two nodes belong to different fragments of the tree
    #[error("Nodes {0} and {1} have no common ancestor")]
    Disconnected(NodeId, NodeId),
    /// The size cache of a node was read before being computed
    #[error("The size of node {0} has not been computed")]
    SizeNotComputed(NodeId),
    /// There was a [`std::io::Error`] when writing the tree to a file
    #[error("Error writing tree to file")]
    IoError(#[from] std::io::Error),
    /// There was a [`NodeError`] when operating on a node
    #[error("Could not operate on node")]
    NodeError(#[from] NodeError),
    /// There was a [`DistrError`] when setting up random branch values
    #[error("Could not sample branch values")]
    DistrError(#[from] DistrError),
}

/// A Phylogenetic tree
///
/// Nodes live in an arena and are addressed by their [`NodeId`]. Removed nodes
/// keep their slot so ids stay stable for the lifetime of the tree.
#[derive(Debug, Clone)]
pub struct Tree {
    pub(crate) nodes: Vec<Node>,
    root: Option<NodeId>,
}

/// Base methods to add and get [`Node`] objects to and from the [`Tree`].
///
/// ----
/// ----
impl Tree {
    /// Create a new empty Tree object
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    // ############################
    // # ADDING AND GETTING NODES #
    // ############################

    /// Add a new node to the tree. The first parentless node added becomes the root.
    pub fn add(&mut self, node: Node) -> NodeId {
        let idx = self.nodes.len();
        let mut node = node;
        node.id = idx;
        if self.root.is_none() && node.parent.is_none() {
            self.root = Some(idx);
        }
        self.nodes.push(node);

        idx
    }

    /// Add a child to one of the tree's nodes.
    ///
    /// # Example
    /// ```
    /// use phyloedit::tree::{Tree,Node};
    ///
    /// // Create the tree and add a root node
    /// let mut tree = Tree::new();
    /// let root_id = tree.add(Node::new());
    ///
    /// // Add children to the root
    /// let left = tree.add_child(Node::new(), root_id, None).unwrap();
    /// let right = tree.add_child(Node::new(), root_id, Some(0.1)).unwrap();
    ///
    /// assert_eq!(tree.get(&root_id).unwrap().children, vec![left, right]);
    /// assert_eq!(tree.get(&right).unwrap().parent, Some(root_id));
    /// assert_eq!(tree.get(&right).unwrap().dist, Some(0.1));
    /// ```
    pub fn add_child(
        &mut self,
        node: Node,
        parent: NodeId,
        dist: Option<EdgeLength>,
    ) -> Result<NodeId, TreeError> {
        self.get(&parent)?;

        let mut node = node;
        node.set_parent(parent);
        if dist.is_some() {
            node.dist = dist;
        }

        let id = self.add(node);
        self.get_mut(&parent)?.add_child(id);

        Ok(id)
    }

    /// Get a reference to a specific Node of the tree
    pub fn get(&self, id: &NodeId) -> Result<&Node, TreeError> {
        match self.nodes.get(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Get a mutable reference to a specific Node of the tree
    pub fn get_mut(&mut self, id: &NodeId) -> Result<&mut Node, TreeError> {
        match self.nodes.get_mut(*id) {
            Some(node) if !node.deleted => Ok(node),
            _ => Err(TreeError::NodeNotFound(*id)),
        }
    }

    /// Unchecked access used by traversals over ids known to be valid
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Get a reference to a node in the tree by name.
    /// Note that this does not check for name unicity, if several nodes
    /// match a name this function will return the first match in the tree.
    /// If you want to find all nodes matching a name in a given tree,
    /// use [`Tree::search_nodes`].
    /// ```
    /// use phyloedit::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_idx = tree.add(Node::new_named("root"));
    /// let child_idx = tree.add_child(Node::new_named("child"), root_idx, None).unwrap();
    ///
    /// assert_eq!(tree.get_by_name("child"), Some(tree.get(&child_idx).unwrap()));
    /// ```
    pub fn get_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| !node.deleted && node.name.as_deref() == Some(name))
    }

    /// Search nodes in the tree with a closure.
    /// ```
    /// use phyloedit::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_idx = tree.add(Node::new_named("root"));
    /// let mut indices = vec![];
    ///
    /// for name in ["A", "B", "A"] {
    ///     let idx = tree.add_child(Node::new_named(name), root_idx, None).unwrap();
    ///     if name == "A" { indices.push(idx) }
    /// }
    ///
    /// let found = tree.search_nodes(|node| node.name == Some("A".into()));
    /// assert_eq!(found, indices);
    /// ```
    pub fn search_nodes(&self, cond: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| !node.deleted && cond(node))
            .map(|node| node.id)
            .collect()
    }

    /// Gets the root node of the tree.
    pub fn get_root(&self) -> Result<NodeId, TreeError> {
        self.root.ok_or(TreeError::RootNotFound)
    }

    pub(crate) fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Gets the root of the fragment containing `node`. This is the tree root
    /// unless the node belongs to a detached subtree.
    pub fn root_of(&self, node: &NodeId) -> Result<NodeId, TreeError> {
        let mut current = self.get(node)?;
        while let Some(parent) = current.parent {
            current = self.get(&parent)?;
        }

        Ok(current.id)
    }

    /// Returns a [`Vec`] containing the Node IDs of leaf nodes of the tree
    /// ```
    /// use phyloedit::tree::{Tree, Node};
    ///
    /// let mut tree = Tree::new();
    /// let root_idx = tree.add(Node::new());
    /// let left = tree.add_child(Node::new(), root_idx, None).unwrap();
    /// let right = tree.add_child(Node::new(), root_idx, None).unwrap();
    ///
    /// assert_eq!(tree.get_leaves(), vec![left, right]);
    /// ```
    pub fn get_leaves(&self) -> Vec<NodeId> {
        self.get_root()
            .and_then(|root| self.get_subtree_leaves(&root))
            .unwrap_or_default()
    }

    /// Returns a [`Vec`] containing the Names of the leaf nodes of the tree
    pub fn get_leaf_names(&self) -> Vec<Option<String>> {
        self.get_leaves()
            .iter()
            .map(|leaf_id| self.node(*leaf_id).name.clone())
            .collect()
    }

    /// Gets the node ids of all the nodes in the subtree rooted at the specified node
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5)F;").unwrap();
    /// let sub_root = tree.get_by_name("E").unwrap();
    /// let subtree: Vec<_> = tree.get_subtree(&sub_root.id)
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(subtree, vec!["E", "C", "D"])
    /// ```
    pub fn get_subtree(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        self.preorder(root)
    }

    /// Gets the node ids of all the nodes in the subtree rooted at the specified node, except the root
    pub fn get_descendants(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        Ok(self.preorder(root)?.into_iter().skip(1).collect())
    }

    /// Gets the node ids of all the leaves in the subtree rooted at the specified node
    pub fn get_subtree_leaves(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        Ok(self
            .preorder(root)?
            .into_iter()
            .filter(|id| self.node(*id).is_tip())
            .collect())
    }

    /// Returns the number of nodes in the tree
    pub fn size(&self) -> usize {
        self.get_root()
            .and_then(|root| self.preorder(&root))
            .map(|nodes| nodes.len())
            .unwrap_or(0)
    }

    /// Returns the number of leaves in the tree
    pub fn n_leaves(&self) -> usize {
        self.get_leaves().len()
    }
}

/// Methods to traverse the [`Tree`]
///
/// ----
/// ----
impl Tree {
    // ###################
    // # TREE TRAVERSALS #
    // ###################

    /// Walks the subtree rooted at `root`, yielding a pre-visit [`Cursor`](super::Cursor)
    /// for every node and a post-visit one for every internal node.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,B)C,D)E;").unwrap();
    /// let events: Vec<_> = tree.walk(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .map(|cursor| {
    ///         let name = tree.get(&cursor.node).unwrap().name.clone().unwrap();
    ///         if cursor.first_visit { name } else { format!("/{name}") }
    ///     })
    ///     .collect();
    ///
    /// assert_eq!(events, vec!["E", "C", "A", "B", "/C", "D", "/E"]);
    /// ```
    pub fn walk(&self, root: &NodeId) -> Result<Traversal<'_>, TreeError> {
        let root = self.get(root)?.id;
        Ok(Traversal::new(self, root))
    }

    /// Returns a vector containing node ids in the same order as the
    /// [preorder](https://en.wikipedia.org/wiki/Tree_traversal#Pre-order,_NLR) tree traversal
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let preorder: Vec<_> = tree.preorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(preorder, vec!["F", "B", "A", "D", "C", "E", "G", "I", "H"])
    /// ```
    pub fn preorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        Ok(self
            .walk(root)?
            .filter(|cursor| cursor.first_visit)
            .map(|cursor| cursor.node)
            .collect())
    }

    /// Returns a vector containing node ids in the same order as the
    /// [postorder](https://en.wikipedia.org/wiki/Tree_traversal#Post-order,_LRN ) tree traversal
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let postorder: Vec<_> = tree.postorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(postorder, vec!["A", "C", "E", "D", "B", "H", "I", "G", "F"])
    /// ```
    pub fn postorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        Ok(self
            .walk(root)?
            .filter(|cursor| cursor.is_final_visit())
            .map(|cursor| cursor.node)
            .collect())
    }

    /// Returns a vector containing node ids in the same order as the
    /// [levelorder](https://en.wikipedia.org/wiki/Tree_traversal#Breadth-first_search) tree traversal
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let levelorder: Vec<_> = tree.levelorder(&tree.get_root().unwrap())
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(levelorder, vec!["F", "B", "G", "A", "D", "I", "C", "E", "H"])
    /// ```
    pub fn levelorder(&self, root: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut indices = vec![];
        let mut queue = VecDeque::new();
        queue.push_back(*root);
        while let Some(root) = queue.pop_front() {
            indices.push(root);
            queue.extend(self.get(&root)?.children.iter().copied());
        }

        Ok(indices)
    }
}

/// Methods to find paths in a [`Tree`].
///
/// ----
/// ----
impl Tree {
    // ##########################
    // # FIND PATHS IN THE TREE #
    // ##########################

    /// Returns the path from the root to the node
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let e = tree.get_by_name("E").unwrap().id;
    /// let path: Vec<_> = tree.get_path_from_root(&e)
    ///     .unwrap()
    ///     .iter()
    ///     .map(|id| tree.get(id).unwrap().name.clone())
    ///     .flatten()
    ///     .collect();
    ///
    /// assert_eq!(path, vec!["F", "B", "D", "E"])
    /// ```
    pub fn get_path_from_root(&self, node: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = self.lineage(node)?;
        path.reverse();

        Ok(path)
    }

    /// Returns the node followed by all its ancestors, up to the root
    pub fn lineage(&self, node: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut path = vec![];
        let mut current_node = *node;
        loop {
            path.push(current_node);
            match self.get(&current_node)?.parent {
                Some(parent) => current_node = parent,
                None => break,
            }
        }

        Ok(path)
    }

    /// Returns the positions of the node and its ancestors within their parents'
    /// child sequences, from the root down. The root has an empty path.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let tree = Tree::from_newick("((A,(C,E)D)B,((H)I)G)F;").unwrap();
    /// let e = tree.get_by_name("E").unwrap().id;
    ///
    /// assert_eq!(tree.path_id(&e).unwrap(), vec![0, 1, 1]);
    /// assert_eq!(tree.get_by_path(&tree.get_root().unwrap(), &[0, 1, 1]).unwrap(), e);
    /// ```
    pub fn path_id(&self, node: &NodeId) -> Result<Vec<usize>, TreeError> {
        let mut positions = vec![];
        let mut current = self.get(node)?;
        while let Some(parent) = current.parent {
            let parent = self.get(&parent)?;
            positions.push(parent.child_position(&current.id)?);
            current = parent;
        }
        positions.reverse();

        Ok(positions)
    }

    /// Follows a path of child positions starting at `root`
    pub fn get_by_path(&self, root: &NodeId, path: &[usize]) -> Result<NodeId, TreeError> {
        let mut current = self.get(root)?.id;
        for &pos in path {
            let node = self.get(&current)?;
            current = *node.children.get(pos).ok_or(NodeError::HasNoChild {
                parent: current,
                child: pos,
            })?;
        }

        Ok(current)
    }
}

/// Methods to display the [`Tree`] on the console.
///
/// ----
/// ----
impl Tree {
    fn build_display(&self, debug: bool) -> Result<TreeBuilder, TreeError> {
        let label = |node: &Node| {
            if debug {
                format!("{node:?}")
            } else {
                format!("{node}")
            }
        };

        let root = self.get_root()?;
        let mut builder = TreeBuilder::new(label(self.get(&root)?));
        for cursor in self.walk(&root)?.filter(|cursor| cursor.node != root) {
            let node = self.node(cursor.node);
            if !cursor.first_visit {
                builder.end_child();
            } else if node.is_tip() {
                builder.add_empty_child(label(node));
            } else {
                builder.begin_child(label(node));
            }
        }

        Ok(builder)
    }

    /// Print a debug view of the tree to the console
    pub fn print_debug(&self) -> Result<(), TreeError> {
        let tree = self.build_display(true)?.build();
        print_tree(&tree)?;
        Ok(())
    }

    /// Print the tree to the console
    pub fn print(&self) -> Result<(), TreeError> {
        let tree = self.build_display(false)?.build();
        print_tree(&tree)?;
        Ok(())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
