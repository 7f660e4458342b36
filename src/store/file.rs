use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::artifact::CHECKSUM_SUFFIX;
use crate::capability::{ContentStore, StructureBuilder};
use crate::error::{RepoError, Result};
use crate::node::{Node, NodeRef, NodeValue};

/// Filesystem-backed store. A node's path is its labels below the root
/// joined under the base directory.
#[derive(Debug)]
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `base`, creating the directory if needed.
    pub fn open(base: impl Into<PathBuf>) -> Result<Arc<Self>> {
        let base = base.into();
        fs::create_dir_all(&base).map_err(|e| RepoError::io(&base, e))?;
        Ok(Arc::new(Self { base }))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// A fresh root node served by this store.
    pub fn root(self: &Arc<Self>) -> NodeRef {
        let root = Node::root(self.base.display().to_string());
        root.add_service::<dyn StructureBuilder>(self.clone());
        root.add_service::<dyn ContentStore>(self.clone());
        root
    }

    pub fn node_path(&self, node: &Node) -> PathBuf {
        let mut path = self.base.clone();
        path.extend(node.path_labels());
        path
    }

    fn load(&self, path: PathBuf, label: &str) -> Result<Option<NodeRef>> {
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(Some(Node::new(label, NodeValue::Folder))),
            Ok(_) => Ok(Some(Node::new(label, NodeValue::File(path)))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::io(path, e)),
        }
    }
}

/// Labels that would escape the parent directory or name hidden entries.
fn is_reserved(label: &str) -> bool {
    label.starts_with('.') || label.contains(['/', '\\'])
}

impl StructureBuilder for FileStore {
    fn find_child(&self, parent: &NodeRef, label: &str) -> Result<Option<NodeRef>> {
        if parent.has_binaries() || is_reserved(label) {
            return Ok(None);
        }
        self.load(self.node_path(parent).join(label), label)
    }

    fn find_children(&self, parent: &NodeRef) -> Result<Vec<NodeRef>> {
        if parent.has_binaries() {
            return Ok(Vec::new());
        }
        let dir = self.node_path(parent);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepoError::io(dir, e)),
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RepoError::io(&dir, e))?;
            let Some(label) = entry.file_name().to_str().map(str::to_string) else {
                debug!(path = %entry.path().display(), "skipping non UTF-8 entry");
                continue;
            };
            if is_reserved(&label) {
                continue;
            }
            if let Some(child) = self.load(entry.path(), &label)? {
                children.push(child);
            }
        }
        trace!(dir = %dir.display(), count = children.len(), "listed");
        Ok(children)
    }
}

impl ContentStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    fn open_content(&self, node: &NodeRef) -> Result<Option<Box<dyn Read + Send>>> {
        let path = match node.file_path() {
            Some(path) => path.to_path_buf(),
            None => self.node_path(node),
        };
        if path.is_dir() {
            return Ok(None);
        }
        match fs::File::open(&path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RepoError::io(path, e)),
        }
    }

    fn local_path(&self, node: &NodeRef) -> Option<PathBuf> {
        if let Some(path) = node.file_path() {
            return Some(path.to_path_buf());
        }
        let path = self.node_path(node);
        path.is_file().then_some(path)
    }

    /// Writes through a hidden temp file and a rename, then records the
    /// blake3 digest in a `.blake3` sidecar.
    fn put_content(&self, parent: &NodeRef, label: &str, bytes: &[u8]) -> Result<NodeRef> {
        if is_reserved(label) {
            return Err(RepoError::InvalidArgument(format!(
                "'{}' is not a valid artifact name",
                label
            )));
        }
        let dir = self.node_path(parent);
        fs::create_dir_all(&dir).map_err(|e| RepoError::io(&dir, e))?;

        let path = dir.join(label);
        let tmp = dir.join(format!(".{}.tmp", label));
        fs::write(&tmp, bytes).map_err(|e| RepoError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| RepoError::io(&path, e))?;

        let checksum = checksum_path(&path);
        let digest = blake3::hash(bytes);
        fs::write(&checksum, format!("{}\n", digest.to_hex()))
            .map_err(|e| RepoError::io(&checksum, e))?;

        debug!(path = %path.display(), digest = %digest.to_hex(), "wrote artifact");
        Ok(Node::new(label, NodeValue::File(path)))
    }
}

// ─── Checksums ─────────────────────────────────────────────────────

/// Sidecar holding the hex blake3 digest of `artifact`.
pub fn checksum_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_os_string();
    name.push(CHECKSUM_SUFFIX);
    PathBuf::from(name)
}

/// Compare `artifact` against its sidecar digest. `None` when there is no
/// sidecar.
pub fn verify_checksum(artifact: &Path) -> Result<Option<bool>> {
    let sidecar = checksum_path(artifact);
    let expected = match fs::read_to_string(&sidecar) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepoError::io(sidecar, e)),
    };
    let bytes = fs::read(artifact).map_err(|e| RepoError::io(artifact, e))?;
    let actual = blake3::hash(&bytes);
    Ok(Some(expected.trim() == actual.to_hex().as_str()))
}
