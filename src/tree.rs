//! Dependency tree data structures
//!
//! A `Tree` owns every node of one sentence in a single arena. Heads and
//! dependents are stored as `NodeId` handles into that arena, so the
//! parent/child links never own each other. Handle 0 is always the virtual
//! root.

use std::fmt;

use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::features::{EMPTY_FIELD, FeatureMap, ParseError};

/// Handle of a node inside its tree's arena
pub type NodeId = usize;

/// Handle of the virtual root in every tree
pub const ROOT: NodeId = 0;

/// Token id reserved for the virtual root
pub const ROOT_ID: usize = 0;

/// Error raised by attach/detach and feature updates
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node handle {0} is not in this tree")]
    UnknownNode(NodeId),
    #[error("token id {0} is reserved for the root")]
    ReservedId(usize),
    #[error("token id {0} is already in this tree")]
    DuplicateId(usize),
    #[error("the root cannot be attached as a dependent")]
    RootAttachment,
    #[error("attaching node {child} under node {head} would create a cycle")]
    Cycle { head: NodeId, child: NodeId },
    #[error("node {child} is not a dependent of node {head}")]
    NotADependent { head: NodeId, child: NodeId },
    #[error(transparent)]
    Feature(#[from] ParseError),
}

/// A token in a dependency tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: usize,
    form: String,
    lemma: String,
    pos: String,
    pub feats: FeatureMap,
    head: Option<(NodeId, String)>,
    dependents: Vec<(String, NodeId)>,
}

impl Node {
    /// Create a node with only an id and a word form
    pub fn new(id: usize, form: &str) -> Self {
        Self::with_fields(id, form, "", "", FeatureMap::new())
    }

    /// Create a node with all surface attributes
    pub fn with_fields(id: usize, form: &str, lemma: &str, pos: &str, feats: FeatureMap) -> Self {
        Self {
            id,
            form: form.to_string(),
            lemma: lemma.to_string(),
            pos: pos.to_string(),
            feats,
            head: None,
            dependents: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(ROOT_ID, "")
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn lemma(&self) -> &str {
        &self.lemma
    }

    pub fn pos(&self) -> &str {
        &self.pos
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    /// Handle of this node's head, if attached
    pub fn head(&self) -> Option<NodeId> {
        self.head.as_ref().map(|(head, _)| *head)
    }

    /// Relation label of the edge from the head to this node
    pub fn label(&self) -> Option<&str> {
        self.head.as_ref().map(|(_, label)| label.as_str())
    }

    /// Labeled dependents in ascending id order
    pub fn dependents(&self) -> &[(String, NodeId)] {
        &self.dependents
    }

    pub fn dependent_size(&self) -> usize {
        self.dependents.len()
    }

    pub fn feat(&self, key: &str) -> Option<&str> {
        self.feats.get(key)
    }

    /// Upsert a feature, rejecting keys and values that would not serialize
    pub fn put_feat(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, ParseError> {
        self.feats.try_insert(key, value)
    }

    pub fn remove_feat(&mut self, key: &str) -> Option<String> {
        self.feats.remove(key)
    }
}

/// A dependency tree (sentence)
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    by_id: FxHashMap<usize, NodeId>,
}

impl Tree {
    /// Create a tree holding only the virtual root
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(tokens: usize) -> Self {
        let mut nodes = Vec::with_capacity(tokens + 1);
        nodes.push(Node::root());
        let mut by_id = FxHashMap::default();
        by_id.insert(ROOT_ID, ROOT);
        Self { nodes, by_id }
    }

    /// Add a detached node to the tree
    pub fn add_node(&mut self, node: Node) -> Result<NodeId, TreeError> {
        if node.id == ROOT_ID {
            return Err(TreeError::ReservedId(node.id));
        }
        if self.by_id.contains_key(&node.id) {
            return Err(TreeError::DuplicateId(node.id));
        }

        let handle = self.nodes.len();
        self.by_id.insert(node.id, handle);
        self.nodes.push(Node {
            head: None,
            dependents: Vec::new(),
            ..node
        });
        Ok(handle)
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Number of tokens, excluding the root
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a node by handle
    pub fn get_node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node)
    }

    /// Mutable access to a node's features
    pub fn feats_mut(&mut self, node: NodeId) -> Option<&mut FeatureMap> {
        self.nodes.get_mut(node).map(|n| &mut n.feats)
    }

    /// Look up the handle of a token id
    pub fn find(&self, id: usize) -> Option<NodeId> {
        self.by_id.get(&id).copied()
    }

    /// Tokens in handle order, root excluded
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().skip(1)
    }

    fn check(&self, node: NodeId) -> Result<(), TreeError> {
        if node < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(node))
        }
    }

    /// Position of `child` in `head`'s dependents, or where it would go
    fn dependent_position(&self, head: NodeId, child: NodeId) -> Result<usize, usize> {
        let key = self.nodes[child].id;
        self.nodes[head]
            .dependents
            .binary_search_by_key(&key, |(_, dep)| self.nodes[*dep].id)
    }

    /// Attach `child` under `head` with the given relation label.
    ///
    /// A child that already has a head is moved. The attach is rejected,
    /// leaving the tree untouched, if `child` is `head` or one of its
    /// ancestors.
    pub fn add_dependent(
        &mut self,
        head: NodeId,
        child: NodeId,
        label: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.check(head)?;
        self.check(child)?;
        if child == ROOT {
            return Err(TreeError::RootAttachment);
        }
        if self.is_ancestor_of(child, head) {
            return Err(TreeError::Cycle { head, child });
        }

        if let Some((old_head, old_label)) = self.nodes[child].head.take() {
            debug!(
                "moving node {} from {} ({}) to {}",
                self.nodes[child].id, self.nodes[old_head].id, old_label, self.nodes[head].id
            );
            if let Ok(i) = self.dependent_position(old_head, child) {
                self.nodes[old_head].dependents.remove(i);
            }
        }

        let label = label.into();
        let i = match self.dependent_position(head, child) {
            Ok(i) | Err(i) => i,
        };
        self.nodes[head].dependents.insert(i, (label.clone(), child));
        self.nodes[child].head = Some((head, label));
        Ok(())
    }

    /// Detach `child` from `head`, returning the label of the removed edge
    pub fn remove_dependent(&mut self, head: NodeId, child: NodeId) -> Result<String, TreeError> {
        self.check(head)?;
        self.check(child)?;
        if self.nodes[child].head() != Some(head) {
            return Err(TreeError::NotADependent { head, child });
        }

        if let Ok(i) = self.dependent_position(head, child) {
            self.nodes[head].dependents.remove(i);
        }
        let label = self.nodes[child]
            .head
            .take()
            .map(|(_, label)| label)
            .unwrap_or_default();
        Ok(label)
    }

    pub fn head(&self, node: NodeId) -> Option<NodeId> {
        self.get_node(node)?.head()
    }

    pub fn label(&self, node: NodeId) -> Option<&str> {
        self.get_node(node)?.label()
    }

    pub fn grand_head(&self, node: NodeId) -> Option<NodeId> {
        self.head(self.head(node)?)
    }

    /// Labeled dependents in ascending id order
    pub fn dependents(&self, node: NodeId) -> &[(String, NodeId)] {
        self.get_node(node).map(Node::dependents).unwrap_or(&[])
    }

    /// Owned snapshot of the labeled dependents
    pub fn dependent_list(&self, node: NodeId) -> Vec<(String, NodeId)> {
        self.dependents(node).to_vec()
    }

    /// Dependent at a 0-based index in id order
    pub fn dependent(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.dependents(node).get(index).map(|(_, dep)| *dep)
    }

    pub fn dependent_size(&self, node: NodeId) -> usize {
        self.dependents(node).len()
    }

    pub fn dependents_by_label<'a>(
        &'a self,
        node: NodeId,
        label: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.dependents(node)
            .iter()
            .filter(move |(l, _)| l == label)
            .map(|(_, dep)| *dep)
    }

    /// First dependent, only when it precedes the node itself
    pub fn left_most_dependent(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get_node(node)?;
        let (_, dep) = n.dependents.first()?;
        (self.nodes[*dep].id < n.id).then_some(*dep)
    }

    /// Last dependent, only when it follows the node itself
    pub fn right_most_dependent(&self, node: NodeId) -> Option<NodeId> {
        let n = self.get_node(node)?;
        let (_, dep) = n.dependents.last()?;
        (self.nodes[*dep].id > n.id).then_some(*dep)
    }

    fn sibling_position(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let head = self.head(node)?;
        let i = self.dependent_position(head, node).ok()?;
        Some((head, i))
    }

    pub fn left_nearest_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.left_nearest_sibling_at(node, 0)
    }

    /// Left sibling `offset` steps past the closest one (offset 0 is closest)
    pub fn left_nearest_sibling_at(&self, node: NodeId, offset: usize) -> Option<NodeId> {
        let (head, i) = self.sibling_position(node)?;
        let j = i.checked_sub(offset.checked_add(1)?)?;
        self.dependent(head, j)
    }

    pub fn right_nearest_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.right_nearest_sibling_at(node, 0)
    }

    /// Right sibling `offset` steps past the closest one (offset 0 is closest)
    pub fn right_nearest_sibling_at(&self, node: NodeId, offset: usize) -> Option<NodeId> {
        let (head, i) = self.sibling_position(node)?;
        let j = i.checked_add(offset)?.checked_add(1)?;
        self.dependent(head, j)
    }

    /// The node itself followed by its heads up to the top of its component
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.get_node(node).map(|_| node),
        }
    }

    /// True if `ancestor` is `node` or lies on its head chain
    pub fn is_ancestor_of(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    pub fn is_dependent_of(&self, child: NodeId, head: NodeId) -> bool {
        self.head(child) == Some(head)
    }

    /// Deepest node that is an ancestor of (or equal to) both nodes.
    ///
    /// Returns `None` when the nodes are not connected, e.g. one of them has
    /// been detached.
    pub fn lowest_common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain: Vec<NodeId> = self.ancestors(a).collect();
        self.ancestors(b).find(|n| chain.contains(n))
    }

    pub fn feat(&self, node: NodeId, key: &str) -> Option<&str> {
        self.get_node(node)?.feat(key)
    }

    pub fn put_feat(
        &mut self,
        node: NodeId,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, TreeError> {
        let feats = self.feats_mut(node).ok_or(TreeError::UnknownNode(node))?;
        Ok(feats.try_insert(key, value)?)
    }

    pub fn remove_feat(&mut self, node: NodeId, key: &str) -> Result<Option<String>, TreeError> {
        let feats = self.feats_mut(node).ok_or(TreeError::UnknownNode(node))?;
        Ok(feats.remove(key))
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node and its heads
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.head(current);
        Some(current)
    }
}

fn field(s: &str) -> &str {
    if s.is_empty() { EMPTY_FIELD } else { s }
}

/// One tab-separated row per token: id, form, lemma, pos, feats, head, deprel
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (_, node) in self.iter() {
            let feats = node.feats.to_string();
            let (head, label) = match &node.head {
                Some((head, label)) => (self.nodes[*head].id.to_string(), label.as_str()),
                None => (EMPTY_FIELD.to_string(), EMPTY_FIELD),
            };
            writeln!(
                f,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                node.id,
                field(&node.form),
                field(&node.lemma),
                field(&node.pos),
                field(&feats),
                head,
                field(label)
            )?;
        }
        Ok(())
    }
}
