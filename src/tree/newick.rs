use std::{fs, path::Path};

use thiserror::Error;

use super::{Node, NodeError, NodeId, Property, Tree, TreeError};

/// Errors that can occur when parsing newick files.
#[derive(Error, Debug)]
pub enum NewickParseError {
    /// There is whitespace in one of the branch lengths
    #[error("Cannot have whitespace in number field.")]
    WhiteSpaceInNumber,
    /// There is an unclosed bracket in the newick String
    #[error("Missing a closing bracket.")]
    UnclosedBracket,
    /// The newick string is missing a final semi-colon
    #[error("The tree is missing a semi colon at the end.")]
    NoClosingSemicolon,
    /// We are trying to close a subtree but have no parent node.
    #[error("Parent node of subtree not found")]
    NoSubtreeParent,
    /// There was a [`TreeError`] when building a tree from the newick string
    #[error("Problem with building the tree.")]
    TreeError(#[from] TreeError),
    /// A property comment could not be set on its node
    #[error("Invalid node property")]
    NodeError(#[from] NodeError),
    /// There was a [`std::num::ParseFloatError`] when parsing branch lengths
    #[error("Could not parse a branch length")]
    FloatError(#[from] std::num::ParseFloatError),
    /// There was a [`std::io::Error`] when reading a newick file
    #[error("Problem reading file")]
    IoError(#[from] std::io::Error),
}

const NHX_PREFIX: &str = "&&NHX:";
/// Property holding comments that are not NHX fields
pub const COMMENT: &str = "comment";

#[derive(Debug, PartialEq)]
enum Field {
    Name,
    Length,
    // whitespace was met after a branch length
    LengthEnd,
    Comment,
}

/// Fields read since the last delimiter, waiting for their node
#[derive(Debug, Default)]
struct Pending {
    name: Option<String>,
    length: Option<String>,
    comments: Vec<String>,
}

impl Pending {
    fn push_name(&mut self, c: char) {
        self.name.get_or_insert_with(String::new).push(c);
    }

    fn push_length(&mut self, c: char) {
        self.length.get_or_insert_with(String::new).push(c);
    }

    fn apply(self, node: &mut Node) -> Result<(), NewickParseError> {
        if let Some(name) = self.name {
            node.set_name(name);
        }
        if let Some(length) = self.length {
            node.dist = Some(length.parse()?);
        }
        for comment in self.comments {
            match comment.strip_prefix(NHX_PREFIX) {
                Some(fields) => {
                    for field in fields.split(':').filter(|field| !field.is_empty()) {
                        match field.split_once('=') {
                            Some((key, value)) => node.set_prop(key, Property::parse(value))?,
                            None => node.set_prop(field, Property::Flag(true))?,
                        }
                    }
                }
                None => node.set_prop(COMMENT, Property::Text(comment))?,
            }
        }

        Ok(())
    }
}

/// Methods to read and write [`Tree`] objects to and from files or [`String`] objects.
///
/// ----
/// ----
impl Tree {
    // ########################
    // # READ AND WRITE TREES #
    // ########################

    /// Newick representation of the subtree rooted at `root`, without the final `;`
    pub fn subtree_to_newick(&self, root: &NodeId) -> Result<String, TreeError> {
        let mut newick = String::new();
        for cursor in self.walk(root)? {
            let node = self.node(cursor.node);
            if cursor.first_visit {
                let first_child = node
                    .parent
                    .map_or(true, |parent| self.node(parent).children.first() == Some(&cursor.node));
                if cursor.depth > 0 && !first_child {
                    newick.push(',');
                }
                if cursor.has_unvisited_children {
                    newick.push('(');
                    continue;
                }
            } else {
                newick.push(')');
            }
            newick += &node.to_newick();
        }

        Ok(newick)
    }

    /// Writes the tree as a newick formatted string.
    /// Supports and properties are written as NHX comments.
    /// # Example
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let newick = "(A:0.1,B:0.2[&&NHX:support=0.9],(C:0.3,D:0.4)E:0.5)F:0.6;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.to_newick().unwrap(), newick);
    /// ```
    pub fn to_newick(&self) -> Result<String, TreeError> {
        let root = self.get_root()?;
        Ok(self.subtree_to_newick(&root)? + ";")
    }

    /// Read a newick formatted string and build a [`Tree`] struct from it.
    ///
    /// Bracket comments of the form `[&&NHX:key=value:...]` are stored as node
    /// properties, other comments are kept in the `comment` property.
    /// # Example
    /// ```
    /// use phyloedit::tree::{Property, Tree};
    ///
    /// let newick = "(A:0.1,B:0.2,(C:0.3,D:0.4)E:0.5[&&NHX:support=0.8:color=red])F;";
    /// let tree = Tree::from_newick(newick).unwrap();
    ///
    /// assert_eq!(tree.size(), 6);
    /// assert_eq!(tree.n_leaves(), 4);
    ///
    /// let e = tree.get_by_name("E").unwrap();
    /// assert_eq!(e.support, Some(0.8));
    /// assert_eq!(e.get_prop("color"), Some(Property::Text("red".into())));
    /// ```
    pub fn from_newick(newick: &str) -> Result<Self, NewickParseError> {
        let mut tree = Tree::new();

        let mut parsing = Field::Name;
        let mut pending = Pending::default();
        let mut comment = String::new();
        // subtree closed by the last ')', its label comes next
        let mut closed: Option<NodeId> = None;
        let mut parent_stack: Vec<NodeId> = Vec::new();
        let mut quote: Option<char> = None;

        for c in newick.chars() {
            if let Some(q) = quote {
                pending.push_name(c);
                if c == q {
                    quote = None;
                }
                continue;
            }

            if parsing == Field::Comment {
                if c == ']' {
                    pending.comments.push(std::mem::take(&mut comment));
                    parsing = Field::Name;
                } else {
                    comment.push(c);
                }
                continue;
            }

            match c {
                '"' | '\'' if parsing == Field::Name => {
                    quote = Some(c);
                    pending.push_name(c);
                }
                '[' => parsing = Field::Comment,
                '(' => {
                    let id = match parent_stack.last() {
                        None => tree.add(Node::new()),
                        Some(parent) => tree.add_child(Node::new(), *parent, None)?,
                    };
                    parent_stack.push(id);
                }
                ':' => parsing = Field::Length,
                ',' | ')' => {
                    let parent = *parent_stack
                        .last()
                        .ok_or(NewickParseError::NoSubtreeParent)?;
                    let node = match closed.take() {
                        Some(id) => id,
                        None => tree.add_child(Node::new(), parent, None)?,
                    };
                    std::mem::take(&mut pending).apply(tree.get_mut(&node)?)?;
                    parsing = Field::Name;

                    if c == ')' {
                        closed = parent_stack.pop();
                    }
                }
                ';' => {
                    if !parent_stack.is_empty() {
                        return Err(NewickParseError::UnclosedBracket);
                    }
                    let node = match closed {
                        Some(id) => id,
                        None => tree.add(Node::new()),
                    };
                    pending.apply(tree.get_mut(&node)?)?;

                    return Ok(tree);
                }
                _ => match parsing {
                    Field::Name if c.is_whitespace() => {}
                    Field::Name => pending.push_name(c),
                    Field::Length if c.is_whitespace() => {
                        if pending.length.is_some() {
                            parsing = Field::LengthEnd;
                        }
                    }
                    Field::Length => pending.push_length(c),
                    Field::LengthEnd if c.is_whitespace() => {}
                    Field::LengthEnd => return Err(NewickParseError::WhiteSpaceInNumber),
                    Field::Comment => comment.push(c),
                },
            }
        }

        Err(NewickParseError::NoClosingSemicolon)
    }

    /// Writes the tree to a newick file
    pub fn to_file(&self, path: &Path) -> Result<(), TreeError> {
        fs::write(path, self.to_newick()? + "\n")?;
        Ok(())
    }

    /// Creates a tree from a newick file
    pub fn from_file(path: &Path) -> Result<Self, NewickParseError> {
        let newick_string = fs::read_to_string(path)?;
        Self::from_newick(&newick_string)
    }

    /// Turns the names of internal nodes that read as numbers into supports,
    /// as written by programs that store supports in place of internal names.
    /// Other names are left as they are. The root is never given a support.
    ///
    /// Returns the number of converted nodes.
    /// ```
    /// use phyloedit::tree::Tree;
    ///
    /// let mut tree = Tree::from_newick("((A,B)95,(C,D)clade)100;").unwrap();
    /// let converted = tree
    ///     .convert_internal_names_to_support(&tree.get_root().unwrap())
    ///     .unwrap();
    ///
    /// assert_eq!(converted, 1);
    /// assert_eq!(tree.to_newick().unwrap(), "((A,B)[&&NHX:support=95],(C,D)clade)100;");
    /// ```
    pub fn convert_internal_names_to_support(&mut self, root: &NodeId) -> Result<usize, TreeError> {
        let mut converted = 0;
        for id in self.preorder(root)? {
            let node = &mut self.nodes[id];
            if node.is_tip() || node.is_root() {
                continue;
            }
            let support = node
                .name
                .as_deref()
                .and_then(|name| name.trim().parse::<f64>().ok());
            if let Some(support) = support {
                node.support = Some(support);
                node.name = None;
                converted += 1;
            }
        }

        Ok(converted)
    }
}
