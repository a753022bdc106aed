use std::{
    collections::HashMap,
    fmt::{Debug, Display},
};

use thiserror::Error;

use super::{EdgeLength, NodeId, Size, DIST, NAME, SUPPORT};

/// Errors that can occur when manipulating [`Node`] structs.
#[derive(Error, Debug)]
pub enum NodeError {
    /// We are trying to access a child the node does not have
    #[error("Node {parent} does not have child {child}.")]
    HasNoChild {
        /// Id of the parent node
        parent: NodeId,
        /// Id of the missing child node
        child: NodeId,
    },
    /// A reserved property was given a value of the wrong kind
    #[error("Property '{key}' of node {node} cannot hold the value {value}")]
    InvalidProperty {
        /// Id of the node
        node: NodeId,
        /// Name of the reserved property
        key: String,
        /// Rejected value
        value: Property,
    },
}

/// Value of a free-form node property
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    /// Text value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Boolean value
    Flag(bool),
}

impl Property {
    /// Reads the property as a number. Text is parsed if possible.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Property::Number(v) => Some(*v),
            Property::Text(s) => s.trim().parse().ok(),
            Property::Flag(_) => None,
        }
    }

    /// Builds a property from a raw string, numbers are stored as [`Property::Number`]
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<f64>() {
            Ok(v) => Property::Number(v),
            Err(_) => match raw {
                "true" | "True" => Property::Flag(true),
                "false" | "False" => Property::Flag(false),
                _ => Property::Text(raw.to_string()),
            },
        }
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Property::Text(s) => write!(f, "{s}"),
            Property::Number(v) => write!(f, "{v}"),
            Property::Flag(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Property::Number(value)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::Text(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::Text(value)
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Flag(value)
    }
}

#[derive(Clone)]
/// A node of the Tree
pub struct Node {
    /// Index of the node
    pub id: NodeId,
    /// Name of the node
    pub name: Option<String>,
    /// Index of the parent node
    pub parent: Option<NodeId>,
    /// Indices of child nodes
    pub children: Vec<NodeId>,
    /// length of branch between parent and node
    pub dist: Option<EdgeLength>,
    /// Support value of the branch between parent and node
    pub support: Option<f64>,
    /// Free-form properties attached to the node
    pub props: HashMap<String, Property>,
    /// Cached `(sumdist, nleaves)` of the subtree rooted here
    pub(crate) size: Option<Size>,
    // Whether the node is deleted or not
    pub(crate) deleted: bool,
}

impl Node {
    /// Creates a new Node
    pub fn new() -> Self {
        Self {
            id: 0,
            name: None,
            parent: None,
            children: vec![],
            dist: None,
            support: None,
            props: HashMap::new(),
            size: None,
            deleted: false,
        }
    }

    /// Creates a new named Node
    pub fn new_named(name: &str) -> Self {
        Self {
            name: Some(String::from(name)),
            ..Self::new()
        }
    }

    /// Sets the internal Node name
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    /// Set the parent node
    pub fn set_parent(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    /// Cached size of the subtree rooted at this node, if it was computed
    pub fn size(&self) -> Option<Size> {
        self.size
    }

    /// Empties the node and sets it as deleted
    pub(crate) fn delete(&mut self) {
        *self = Self::new();
        self.deleted = true;
    }

    /// Adds a child to the node
    /// ```
    /// use phyloedit::tree::Node;
    ///
    /// let mut parent = Node::new();
    /// parent.id = 0;
    /// let mut child = Node::new();
    /// child.id = 1;
    ///
    /// child.set_parent(parent.id);
    /// parent.add_child(child.id);
    ///
    /// assert_eq!(child.parent, Some(0));
    /// assert_eq!(parent.children, vec![1]);
    /// ```
    pub fn add_child(&mut self, child: NodeId) {
        self.children.push(child);
    }

    /// Position of a child in the child sequence
    pub fn child_position(&self, child: &NodeId) -> Result<usize, NodeError> {
        self.children
            .iter()
            .position(|node_id| node_id == child)
            .ok_or(NodeError::HasNoChild {
                parent: self.id,
                child: *child,
            })
    }

    /// Removes the child from the node and returns the position it had
    pub fn remove_child(&mut self, child: &NodeId) -> Result<usize, NodeError> {
        let vec_index = self.child_position(child)?;
        self.children.remove(vec_index);

        Ok(vec_index)
    }

    /// Check if the node is a tip node
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if the node is a root node
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Branch length, falling back to 0 for roots and 1 for other nodes
    pub fn dist_or_default(&self) -> EdgeLength {
        self.dist
            .unwrap_or(if self.is_root() { 0.0 } else { 1.0 })
    }

    /// Whether the property is set. `dist`, `support` and `name` are looked up
    /// in the corresponding fields.
    pub fn has_prop(&self, key: &str) -> bool {
        match key {
            DIST => self.dist.is_some(),
            SUPPORT => self.support.is_some(),
            NAME => self.name.is_some(),
            _ => self.props.contains_key(key),
        }
    }

    /// Gets a copy of a property value
    /// ```
    /// use phyloedit::tree::{Node, Property};
    ///
    /// let mut node = Node::new_named("A");
    /// node.dist = Some(0.5);
    /// node.set_prop("color", "red".into()).unwrap();
    ///
    /// assert_eq!(node.get_prop("dist"), Some(Property::Number(0.5)));
    /// assert_eq!(node.get_prop("name"), Some(Property::Text("A".into())));
    /// assert_eq!(node.get_prop("color"), Some(Property::Text("red".into())));
    /// assert_eq!(node.get_prop("support"), None);
    /// ```
    pub fn get_prop(&self, key: &str) -> Option<Property> {
        match key {
            DIST => self.dist.map(Property::Number),
            SUPPORT => self.support.map(Property::Number),
            NAME => self.name.clone().map(Property::Text),
            _ => self.props.get(key).cloned(),
        }
    }

    /// Sets a property value. Reserved numeric properties only accept values
    /// that can be read as numbers.
    pub fn set_prop(&mut self, key: &str, value: Property) -> Result<(), NodeError> {
        match key {
            DIST | SUPPORT => {
                let number = value.as_f64().ok_or_else(|| NodeError::InvalidProperty {
                    node: self.id,
                    key: key.to_string(),
                    value: value.clone(),
                })?;
                if key == DIST {
                    self.dist = Some(number);
                } else {
                    self.support = Some(number);
                }
            }
            NAME => self.name = Some(value.to_string()),
            _ => {
                self.props.insert(key.to_string(), value);
            }
        }

        Ok(())
    }

    /// Removes a property and returns its former value
    pub fn remove_prop(&mut self, key: &str) -> Option<Property> {
        match key {
            DIST => self.dist.take().map(Property::Number),
            SUPPORT => self.support.take().map(Property::Number),
            NAME => self.name.take().map(Property::Text),
            _ => self.props.remove(key),
        }
    }

    fn format_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn format_length(&self) -> String {
        self.dist.map(|v| format!(":{v}")).unwrap_or_default()
    }

    fn format_props(&self) -> String {
        let mut fields: Vec<String> = self
            .support
            .iter()
            .map(|s| format!("{SUPPORT}={s}"))
            .collect();
        let mut keys: Vec<_> = self.props.keys().collect();
        keys.sort();
        fields.extend(keys.into_iter().map(|k| format!("{k}={}", self.props[k])));

        if fields.is_empty() {
            String::new()
        } else {
            format!("[&&NHX:{}]", fields.join(":"))
        }
    }

    /// Returns String with node in newick format
    pub fn to_newick(&self) -> String {
        self.format_name() + &self.format_length() + &self.format_props()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.parent.is_none() != other.parent.is_none() {
            return false;
        }

        let close = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (None, None) => true,
            (Some(l1), Some(l2)) => (l1 - l2).abs() < f64::EPSILON,
            _ => false,
        };

        self.name == other.name
            && self.children.len() == other.children.len()
            && close(self.dist, other.dist)
            && close(self.support, other.support)
            && self.props == other.props
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.dist, self.support) {
            (Some(l), Some(s)) => write!(f, "({l:.3}|{s}) {:?}", self.name),
            (Some(l), None) => write!(f, "({l:.3}) {:?}", self.name),
            _ => write!(f, "{:?}", self.name),
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:?}) {:?} Id[{}] Parent[{:?}] Support[{:?}] Props[{:?}] Children({:?})",
            self.dist, self.name, self.id, self.parent, self.support, self.props, self.children,
        )
    }
}
