//! Property path representation for locating values in a bean graph.
//!
//! This module provides [`PropertyPath`] and [`PathNode`] types describing the
//! chain of property accesses from a validated root bean to a failing value.

use std::fmt::{self, Display};

/// The kind of element a path node denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// A plain bean property (e.g. `author`)
    Property,
    /// An element inside a container property (e.g. `items[1]`)
    ContainerElement,
}

/// Where an element sits inside its container.
///
/// At most one of index and key is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerElement {
    index: Option<usize>,
    key: Option<String>,
    iterable: bool,
}

impl ContainerElement {
    /// An element of an ordered container at `index`.
    pub fn indexed(index: usize) -> Self {
        Self {
            index: Some(index),
            key: None,
            iterable: true,
        }
    }

    /// An entry of a keyed container.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            index: None,
            key: Some(key.into()),
            iterable: true,
        }
    }

    /// An element of an iterable container without positions.
    pub fn iterable() -> Self {
        Self {
            index: None,
            key: None,
            iterable: true,
        }
    }

    /// The single value held by a wrapper such as an optional.
    pub fn single() -> Self {
        Self {
            index: None,
            key: None,
            iterable: false,
        }
    }
}

/// One step in a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathNode {
    name: String,
    kind: ElementKind,
    index: Option<usize>,
    key: Option<String>,
    in_iterable: bool,
}

impl PathNode {
    /// Creates a property node.
    pub fn property(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ElementKind::Property,
            index: None,
            key: None,
            in_iterable: false,
        }
    }

    /// Creates a container element node named after its container property.
    pub fn container_element(name: impl Into<String>, element: ContainerElement) -> Self {
        Self {
            name: name.into(),
            kind: ElementKind::ContainerElement,
            in_iterable: element.iterable,
            index: element.index,
            key: element.key,
        }
    }

    /// Marks the node as part of an iterable structure.
    pub(crate) fn within_iterable(mut self, in_iterable: bool) -> Self {
        self.in_iterable |= in_iterable;
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the element kind.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Returns the position inside an ordered container.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns the key inside a keyed container.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns true if this node or one of its ancestors is inside an
    /// iterable, indexed or keyed structure.
    pub fn is_in_iterable(&self) -> bool {
        self.in_iterable
    }
}

impl Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.kind == ElementKind::ContainerElement {
            match (self.index, &self.key) {
                (Some(index), _) => write!(f, "[{}]", index)?,
                (None, Some(key)) => write!(f, "[{}]", key)?,
                (None, None) if self.in_iterable => write!(f, "[]")?,
                (None, None) => {}
            }
        }
        Ok(())
    }
}

/// A path from a root bean to a value in its graph.
///
/// `PropertyPath` represents locations like `items[1].name`. Outside this
/// crate a path is immutable: `push` returns a new path, so a path recorded
/// in a violation never changes afterwards.
///
/// # Example
///
/// ```rust
/// use verity::{ContainerElement, PathNode, PropertyPath};
///
/// let path = PropertyPath::root()
///     .push(PathNode::container_element("items", ContainerElement::indexed(1)))
///     .push(PathNode::property("name"));
///
/// assert_eq!(path.to_string(), "items[1].name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PropertyPath {
    nodes: Vec<PathNode>,
}

impl PropertyPath {
    /// Creates an empty path representing the root bean.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a sequence of nodes.
    pub fn from_nodes(nodes: impl IntoIterator<Item = PathNode>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// Returns a new path with `node` appended.
    ///
    /// This method does not modify the original path; it returns a new one.
    pub fn push(&self, node: PathNode) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Self { nodes }
    }

    pub(crate) fn push_in_place(&mut self, node: PathNode) {
        self.nodes.push(node);
    }

    pub(crate) fn pop_in_place(&mut self) -> Option<PathNode> {
        self.nodes.pop()
    }

    /// Returns true if this is the root path (no nodes).
    pub fn is_root(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of nodes in this path.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if this path has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over the path nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &PathNode> {
        self.nodes.iter()
    }

    /// Returns the parent path (all nodes except the last), or None if this is root.
    pub fn parent(&self) -> Option<Self> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(Self {
                nodes: self.nodes[..self.nodes.len() - 1].to_vec(),
            })
        }
    }

    /// Returns the last node, or None if this is root.
    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}
