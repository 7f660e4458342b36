//! Lazily populated module namespace tree.
//!
//! A [`Node`] is one path segment of a repository: a namespace folder, a
//! module version folder or an artifact file. Children are discovered on
//! demand through the [`StructureBuilder`] registered on the node or one of
//! its ancestors, and remembered:
//!
//! - a child that was found is kept for the lifetime of the tree,
//! - a label the builder could not find is recorded as known-absent until
//!   [`Node::refresh`] is called,
//! - a node whose children were enumerated once is never enumerated again.
//!
//! Children are owned (`Arc`), parents are back references (`Weak`). A node may
//! have several parents when backing stores share subtrees.
//!
//! Every lazy insert uses insert-if-absent: when two threads discover the same
//! label concurrently, the first writer wins and both get the winner's node.
//! No lock is held while a capability call is in flight.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::capability::StructureBuilder;
use crate::error::{RepoError, Result};

mod content;
mod services;

pub use content::{Content, ContentKind, LazyContent};
pub use services::{Service, ServiceKind, Services};

#[cfg(test)]
mod tests;

/// Shared handle to a tree node.
pub type NodeRef = Arc<Node>;

// ─── Node Value ────────────────────────────────────────────────────

/// Backing-store payload carried by a node.
///
/// Folders never carry a payload of their own, only structure.
#[derive(Clone, Debug, Default)]
pub enum NodeValue {
    #[default]
    Folder,
    /// Artifact materialized on local storage.
    File(PathBuf),
    /// Artifact held in memory.
    Inline(Arc<[u8]>),
}

impl NodeValue {
    pub fn has_binaries(&self) -> bool {
        !matches!(self, NodeValue::Folder)
    }
}

// ─── Node ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Edges {
    children: HashMap<String, NodeRef>,
    /// Labels the structure builder reported missing.
    absent: HashSet<String>,
    /// Set once the structure builder enumerated every child.
    enumerated: bool,
}

pub struct Node {
    label: String,
    value: NodeValue,
    edges: RwLock<Edges>,
    /// Parent label -> parent, in link order.
    parents: RwLock<Vec<(String, Weak<Node>)>>,
    services: Mutex<Services>,
}

impl Node {
    pub fn new(label: impl Into<String>, value: NodeValue) -> NodeRef {
        Arc::new(Node {
            label: label.into(),
            value,
            edges: RwLock::new(Edges::default()),
            parents: RwLock::new(Vec::new()),
            services: Mutex::new(Services::default()),
        })
    }

    /// A parentless folder node, the root of a repository tree.
    pub fn root(label: impl Into<String>) -> NodeRef {
        Node::new(label, NodeValue::Folder)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    /// Whether the node carries an artifact payload. Nodes without one are
    /// folders.
    pub fn has_binaries(&self) -> bool {
        self.value.has_binaries()
    }

    /// Local file backing this node, if its value is one.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.value {
            NodeValue::File(path) => Some(path),
            _ => None,
        }
    }

    // ─── Parents ───────────────────────────────────────────────

    pub fn parents(&self) -> Vec<NodeRef> {
        self.parents
            .read()
            .iter()
            .filter_map(|(_, parent)| parent.upgrade())
            .collect()
    }

    pub fn parent(&self, label: &str) -> Option<NodeRef> {
        self.parents
            .read()
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, parent)| parent.upgrade())
    }

    /// The parent this node was first linked under.
    pub fn first_parent(&self) -> Option<NodeRef> {
        self.parents
            .read()
            .iter()
            .find_map(|(_, parent)| parent.upgrade())
    }

    pub fn is_root(&self) -> bool {
        self.first_parent().is_none()
    }

    /// Labels from just below the root down to this node, following first
    /// parents. Empty for a root.
    pub fn path_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        let mut parent = self.first_parent();
        if parent.is_none() {
            return labels;
        }
        labels.push(self.label.clone());
        while let Some(node) = parent {
            parent = node.first_parent();
            if parent.is_some() {
                labels.push(node.label.clone());
            }
        }
        labels.reverse();
        labels
    }

    /// Path from just below the root, joined with `separator`.
    pub fn full_path(&self, separator: &str) -> String {
        self.path_labels().join(separator)
    }

    fn attach_parent(&self, parent: &NodeRef) {
        let mut parents = self.parents.write();
        let link = Arc::downgrade(parent);
        match parents.iter_mut().find(|(l, _)| *l == parent.label) {
            Some(entry) => entry.1 = link,
            None => parents.push((parent.label.clone(), link)),
        }
    }

    fn detach_parent(&self, parent: &Node) {
        self.parents
            .write()
            .retain(|(_, link)| !std::ptr::eq(link.as_ptr(), parent));
    }

    // ─── Children ──────────────────────────────────────────────

    /// Return the child `label`, creating and linking an empty folder if
    /// there is none.
    pub fn add_node(self: &Arc<Self>, label: &str) -> Result<NodeRef> {
        self.add_node_with(label, NodeValue::Folder)
    }

    /// Like [`Node::add_node`], with the value used if the child is created.
    pub fn add_node_with(self: &Arc<Self>, label: &str, value: NodeValue) -> Result<NodeRef> {
        validate_label(label)?;
        if let Some(existing) = self.edges.read().children.get(label) {
            return Ok(existing.clone());
        }
        let mut edges = self.edges.write();
        edges.absent.remove(label);
        Ok(self.insert_if_absent(&mut edges, Node::new(label, value)))
    }

    /// Register `child` under its label, replacing any previous child with
    /// that label. A replaced child loses its link back to this node.
    pub fn link(self: &Arc<Self>, child: NodeRef) -> Result<()> {
        validate_label(&child.label)?;
        let displaced = {
            let mut edges = self.edges.write();
            edges.absent.remove(&child.label);
            edges.children.insert(child.label.clone(), child.clone())
        };
        if let Some(old) = displaced.filter(|old| !Arc::ptr_eq(old, &child)) {
            old.detach_parent(self);
        }
        child.attach_parent(self);
        Ok(())
    }

    /// Look up a direct child, asking the structure builder when the tree
    /// does not know the label yet.
    ///
    /// Misses are remembered: the builder is not asked again for the same
    /// label until [`Node::refresh`].
    pub fn child(self: &Arc<Self>, label: &str) -> Result<Option<NodeRef>> {
        validate_label(label)?;
        {
            let edges = self.edges.read();
            if let Some(child) = edges.children.get(label) {
                return Ok(Some(child.clone()));
            }
            if edges.absent.contains(label) {
                return Ok(None);
            }
        }

        let builder = self.find_service::<dyn StructureBuilder>()?;
        trace!(parent = %self.label, label, "structure lookup");
        let found = builder.find_child(self, label)?;

        let mut edges = self.edges.write();
        match found {
            Some(child) => Ok(Some(self.insert_if_absent(&mut edges, child))),
            None => {
                // A concurrent add_node may have created it meanwhile.
                if let Some(child) = edges.children.get(label) {
                    return Ok(Some(child.clone()));
                }
                edges.absent.insert(label.to_string());
                Ok(None)
            }
        }
    }

    /// All children of this node.
    ///
    /// The first call enumerates through the structure builder and merges the
    /// result into the tree; later calls return the cached set.
    pub fn children(self: &Arc<Self>) -> Result<Vec<NodeRef>> {
        if self.edges.read().enumerated {
            return Ok(self.known_children());
        }

        let builder = self.find_service::<dyn StructureBuilder>()?;
        trace!(parent = %self.label, "structure enumeration");
        let found = builder.find_children(self)?;

        let mut edges = self.edges.write();
        for child in found {
            edges.absent.remove(&child.label);
            self.insert_if_absent(&mut edges, child);
        }
        edges.enumerated = true;
        Ok(edges.children.values().cloned().collect())
    }

    /// Children already present in the tree. Never consults the structure
    /// builder.
    pub fn known_children(&self) -> Vec<NodeRef> {
        self.edges.read().children.values().cloned().collect()
    }

    /// Whether [`Node::children`] has already enumerated this node.
    pub fn is_enumerated(&self) -> bool {
        self.edges.read().enumerated
    }

    /// Forget every recorded miss so the next lookup of a missing label asks
    /// the structure builder again. Found children and the enumeration flag
    /// are kept.
    pub fn refresh(&self) {
        self.edges.write().absent.clear();
    }

    fn insert_if_absent(self: &Arc<Self>, edges: &mut Edges, child: NodeRef) -> NodeRef {
        match edges.children.entry(child.label.clone()) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => {
                slot.insert(child.clone());
                child.attach_parent(self);
                child
            }
        }
    }

    // ─── Services ──────────────────────────────────────────────

    /// Register `service` on this node, replacing any previous instance of
    /// the same kind.
    pub fn add_service<S: Service + ?Sized>(&self, service: Arc<S>) {
        *S::slot(&mut self.services.lock()) = Some(service);
    }

    /// Drop this node's own instance of `S`. Ancestors are not affected.
    pub fn remove_service<S: Service + ?Sized>(&self) {
        *S::slot(&mut self.services.lock()) = None;
    }

    /// The instance registered on this node only.
    pub fn get_service<S: Service + ?Sized>(&self) -> Option<Arc<S>> {
        S::slot(&mut self.services.lock()).clone()
    }

    /// The instance on this node or the nearest ancestor, walking parents
    /// depth-first. A hit found on an ancestor is cached on this node.
    pub fn lookup_service<S: Service + ?Sized>(&self) -> Option<Arc<S>> {
        if let Some(service) = self.get_service::<S>() {
            return Some(service);
        }
        for parent in self.parents() {
            if let Some(service) = parent.lookup_service::<S>() {
                let mut services = self.services.lock();
                let slot = S::slot(&mut services);
                // Keep an instance registered concurrently on this node.
                return Some(slot.get_or_insert(service).clone());
            }
        }
        None
    }

    /// Like [`Node::lookup_service`], failing when no node in the chain has
    /// the capability.
    pub fn find_service<S: Service + ?Sized>(&self) -> Result<Arc<S>> {
        self.lookup_service::<S>()
            .ok_or(RepoError::ServiceNotFound(S::KIND))
    }

    /// Kinds registered directly on this node.
    pub fn registered_services(&self) -> Vec<ServiceKind> {
        self.services.lock().registered()
    }
}

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(RepoError::InvalidArgument("empty node label".to_string()));
    }
    Ok(())
}

// ─── Identity ──────────────────────────────────────────────────────

/// Two nodes are equal when their labels match and they share at least one
/// equal parent. A node is always equal to itself.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.label != other.label {
            return false;
        }
        let theirs = other.parents();
        self.parents()
            .iter()
            .any(|mine| theirs.iter().any(|parent| mine == parent))
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("label", &self.label)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.full_path("/"))
    }
}
