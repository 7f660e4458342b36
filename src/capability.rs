//! Capabilities the tree and repositories consume.
//!
//! Implementations are registered per node (see [`crate::node::Service`]) and
//! found by walking towards the root, so any subtree can override them.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{RepoError, Result};
use crate::node::{Content, ContentKind, LazyContent, NodeRef};
use crate::query::{ModuleQuery, ModuleVersionQuery};
use crate::result::{CompletionAccumulator, SearchAccumulator, SearchPage, VersionAccumulator};

/// Produces children of a node on demand.
///
/// Implementations must be idempotent: with an unchanged backing store,
/// repeated calls return equivalent nodes. Returned nodes must be fresh
/// (unlinked); the tree links them.
pub trait StructureBuilder: Send + Sync {
    fn find_child(&self, parent: &NodeRef, label: &str) -> Result<Option<NodeRef>>;

    fn find_children(&self, parent: &NodeRef) -> Result<Vec<NodeRef>>;
}

/// Raw content of artifact nodes.
pub trait ContentStore: Send + Sync {
    /// Short name used in errors and display strings.
    fn name(&self) -> &'static str;

    fn open_content(&self, node: &NodeRef) -> Result<Option<Box<dyn Read + Send>>>;

    /// Local file holding the node's content, if already materialized.
    fn local_path(&self, node: &NodeRef) -> Option<PathBuf> {
        node.file_path().map(Path::to_path_buf)
    }

    /// Store `bytes` as the child `label` of `parent` and return the new,
    /// unlinked node.
    fn put_content(&self, _parent: &NodeRef, _label: &str, _bytes: &[u8]) -> Result<NodeRef> {
        Err(RepoError::Unsupported {
            store: self.name(),
            operation: "put_content",
        })
    }

    fn release(&self, _node: &NodeRef) -> Result<()> {
        Ok(())
    }
}

/// Converts a content stream into another representation.
pub trait ContentTransformer: Send + Sync {
    fn transform(&self, kind: ContentKind, stream: LazyContent) -> Result<Option<Content>>;
}

/// Answers search and completion for a whole tree natively, bypassing the
/// local traversal. Registered on a repository root.
pub trait ContentFinder: Send + Sync {
    fn search_modules(
        &self,
        query: &ModuleQuery,
        result: &mut dyn SearchAccumulator,
    ) -> Result<SearchPage>;

    fn complete_versions(
        &self,
        query: &ModuleVersionQuery,
        result: &mut dyn VersionAccumulator,
    ) -> Result<()>;

    fn complete_modules(
        &self,
        query: &ModuleQuery,
        result: &mut dyn CompletionAccumulator,
    ) -> Result<()>;
}

/// Module descriptor fields read out of an artifact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub version: Option<String>,
    pub doc: Option<String>,
    pub license: Option<String>,
    pub authors: BTreeSet<String>,
}

/// Reads module descriptors out of compiled archives.
pub trait MetadataExtractor: Send + Sync {
    /// Whether the module's name, authors or doc in `artifact` match `query`.
    fn matches(&self, module: &str, artifact: &Path, query: &str) -> Result<bool>;

    fn extract(&self, module: &str, artifact: &Path) -> Result<ModuleMetadata>;
}
