//! Repository facade over a node tree.
//!
//! A [`Repository`] maps artifact contexts onto paths in its tree and runs
//! module search and completion over it. Everything the tree cannot answer
//! by itself (children, content, archive metadata) comes from capabilities
//! registered on the root or below.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace};

use crate::artifact::ArtifactContext;
use crate::capability::{ContentStore, MetadataExtractor, ModuleMetadata};
use crate::error::Result;
use crate::node::NodeRef;

mod complete;
mod dependencies;
mod search;

pub use dependencies::{parse_properties, ModuleInfo, PropertiesDependencyResolver};


type SegmentKey = (String, Option<String>);

pub struct Repository {
    root: NodeRef,
    /// Derived path segments per (module, version). Lookup speed only.
    segment_cache: Option<Mutex<HashMap<SegmentKey, Arc<[String]>>>>,
}

impl Repository {
    pub fn new(root: NodeRef) -> Self {
        Self {
            root,
            segment_cache: None,
        }
    }

    /// Remember derived path segments between lookups.
    pub fn with_lookup_caching(mut self, enabled: bool) -> Self {
        self.segment_cache = enabled.then(|| Mutex::new(HashMap::new()));
        self
    }

    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    fn segments(&self, context: &ArtifactContext) -> Arc<[String]> {
        let Some(cache) = &self.segment_cache else {
            return context.path_segments().into();
        };
        let key = (context.name.clone(), context.version.clone());
        if let Some(hit) = cache.lock().get(&key) {
            return hit.clone();
        }
        let segments: Arc<[String]> = context.path_segments().into();
        cache.lock().entry(key).or_insert(segments).clone()
    }

    // ─── Path Resolution ───────────────────────────────────────

    /// The folder holding `context`'s artifacts, if the tree has it.
    pub fn find_parent(&self, context: &ArtifactContext) -> Result<Option<NodeRef>> {
        node_at(&self.root, &self.segments(context)[..])
    }

    /// The folder holding `context`'s artifacts, created as needed.
    pub fn create_parent(&self, context: &ArtifactContext) -> Result<NodeRef> {
        let mut node = self.root.clone();
        for segment in self.segments(context).iter() {
            node = node.add_node(segment)?;
        }
        Ok(node)
    }

    pub fn artifact_name(&self, context: &ArtifactContext) -> String {
        context.artifact_name()
    }

    pub fn find_artifact(&self, context: &ArtifactContext) -> Result<Option<NodeRef>> {
        let Some(parent) = self.find_parent(context)? else {
            trace!(%context, "no module folder");
            return Ok(None);
        };
        parent.child(&self.artifact_name(context))
    }

    /// Store `bytes` as `context`'s artifact through the content store of
    /// the target folder and link the new node into the tree.
    pub fn put_artifact(&self, context: &ArtifactContext, bytes: &[u8]) -> Result<NodeRef> {
        let parent = self.create_parent(context)?;
        let label = self.artifact_name(context);
        let store = parent.find_service::<dyn ContentStore>()?;
        let node = store.put_content(&parent, &label, bytes)?;
        parent.link(node.clone())?;
        info!(%context, store = store.name(), bytes = bytes.len(), "artifact stored");
        Ok(node)
    }

    /// Dependencies declared in the module's descriptor, if it has one.
    pub fn dependencies(&self, context: &ArtifactContext) -> Result<Option<Vec<ModuleInfo>>> {
        PropertiesDependencyResolver.resolve(self, context)
    }

    /// Forget recorded misses everywhere in the loaded tree.
    pub fn refresh(&self) {
        let mut seen = HashSet::new();
        let mut pending = vec![self.root.clone()];
        while let Some(node) = pending.pop() {
            if !seen.insert(Arc::as_ptr(&node)) {
                continue;
            }
            node.refresh();
            pending.extend(node.known_children());
        }
        debug!(root = %self.root.label(), nodes = seen.len(), "refreshed");
    }

    pub fn display_string(&self) -> String {
        match self.root.lookup_service::<dyn ContentStore>() {
            Some(store) => format!("{} repository at {}", store.name(), self.root.label()),
            None => format!("repository at {}", self.root.label()),
        }
    }
}

// ─── Tree Helpers ──────────────────────────────────────────────────

/// Walk `segments` down from `root` without creating anything. An empty
/// segment never matches.
pub(crate) fn node_at<S: AsRef<str>>(root: &NodeRef, segments: &[S]) -> Result<Option<NodeRef>> {
    let mut node = root.clone();
    for segment in segments {
        let segment = segment.as_ref();
        if segment.is_empty() {
            return Ok(None);
        }
        match node.child(segment)? {
            Some(child) => node = child,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

/// Dotted module name of a node: its labels below the root.
pub(crate) fn module_name(node: &NodeRef) -> String {
    node.full_path(".")
}

/// Module descriptor of `artifact`, or `None` when there is no extractor,
/// no local file or the archive cannot be read.
pub(crate) fn read_metadata(module: &str, artifact: &NodeRef) -> Option<ModuleMetadata> {
    let extractor = artifact.lookup_service::<dyn MetadataExtractor>()?;
    let file = match artifact.content_file() {
        Ok(Some(file)) => file,
        Ok(None) => return None,
        Err(e) => {
            debug!(module, artifact = %artifact.label(), error = %e, "no local file for metadata");
            return None;
        }
    };
    match extractor.extract(module, &file) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            debug!(module, file = %file.display(), error = %e, "metadata extraction failed");
            None
        }
    }
}

/// Whether the archive behind `artifact` matches `query` by its embedded
/// descriptor. Any failure counts as no match.
pub(crate) fn matches_metadata(module: &str, artifact: &NodeRef, query: &str) -> bool {
    let Some(extractor) = artifact.lookup_service::<dyn MetadataExtractor>() else {
        return false;
    };
    let file = match artifact.content_file() {
        Ok(Some(file)) => file,
        Ok(None) => return false,
        Err(e) => {
            debug!(module, artifact = %artifact.label(), error = %e, "no local file for metadata");
            return false;
        }
    };
    extractor.matches(module, &file, query).unwrap_or_else(|e| {
        debug!(module, file = %file.display(), error = %e, "metadata match failed");
        false
    })
}
