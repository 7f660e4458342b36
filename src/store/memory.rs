use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::capability::{ContentStore, StructureBuilder};
use crate::error::{RepoError, Result};
use crate::node::{Node, NodeRef, NodeValue};

/// In-memory store over slash-separated paths. Folders are implied by the
/// paths of the files below them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RwLock<BTreeMap<String, Arc<[u8]>>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_files<I, P, B>(files: I) -> Arc<Self>
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: AsRef<[u8]>,
    {
        let store = Self::default();
        {
            let mut map = store.files.write();
            for (path, bytes) in files {
                map.insert(path.into(), Arc::from(bytes.as_ref()));
            }
        }
        Arc::new(store)
    }

    pub fn insert(&self, path: impl Into<String>, bytes: impl AsRef<[u8]>) {
        self.files
            .write()
            .insert(path.into(), Arc::from(bytes.as_ref()));
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// A fresh root node served by this store.
    pub fn root(self: &Arc<Self>, label: &str) -> NodeRef {
        let root = Node::root(label);
        root.add_service::<dyn StructureBuilder>(self.clone());
        root.add_service::<dyn ContentStore>(self.clone());
        root
    }

    fn key(node: &Node) -> String {
        node.full_path("/")
    }

    /// Key prefix shared by everything below `node`.
    fn prefix(node: &Node) -> String {
        let key = Self::key(node);
        if key.is_empty() {
            key
        } else {
            key + "/"
        }
    }
}

impl StructureBuilder for MemoryStore {
    fn find_child(&self, parent: &NodeRef, label: &str) -> Result<Option<NodeRef>> {
        // A label is one path segment.
        if parent.has_binaries() || label.contains('/') {
            return Ok(None);
        }
        let key = format!("{}{}", Self::prefix(parent), label);
        let files = self.files.read();
        if let Some(bytes) = files.get(&key) {
            return Ok(Some(Node::new(label, NodeValue::Inline(bytes.clone()))));
        }
        let folder = format!("{}/", key);
        let exists = files
            .range(folder.clone()..)
            .next()
            .is_some_and(|(path, _)| path.starts_with(&folder));
        Ok(exists.then(|| Node::new(label, NodeValue::Folder)))
    }

    fn find_children(&self, parent: &NodeRef) -> Result<Vec<NodeRef>> {
        if parent.has_binaries() {
            return Ok(Vec::new());
        }
        let prefix = Self::prefix(parent);
        let files = self.files.read();
        let mut children: BTreeMap<&str, NodeRef> = BTreeMap::new();
        for (path, bytes) in files.range(prefix.clone()..) {
            let Some(rest) = path.strip_prefix(&prefix) else {
                break;
            };
            match rest.split_once('/') {
                Some((folder, _)) => {
                    children
                        .entry(folder)
                        .or_insert_with(|| Node::new(folder, NodeValue::Folder));
                }
                None => {
                    children.insert(rest, Node::new(rest, NodeValue::Inline(bytes.clone())));
                }
            }
        }
        Ok(children.into_values().collect())
    }
}

impl ContentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open_content(&self, node: &NodeRef) -> Result<Option<Box<dyn Read + Send>>> {
        let bytes = match node.value() {
            NodeValue::Inline(bytes) => Some(bytes.clone()),
            _ => self.files.read().get(&Self::key(node)).cloned(),
        };
        Ok(bytes.map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>))
    }

    fn put_content(&self, parent: &NodeRef, label: &str, bytes: &[u8]) -> Result<NodeRef> {
        if label.contains('/') {
            return Err(RepoError::InvalidArgument(format!(
                "'{}' is not a valid artifact name",
                label
            )));
        }
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let key = format!("{}{}", Self::prefix(parent), label);
        self.files.write().insert(key, bytes.clone());
        Ok(Node::new(label, NodeValue::Inline(bytes)))
    }
}
