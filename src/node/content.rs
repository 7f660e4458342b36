use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use crate::capability::{ContentStore, ContentTransformer};
use crate::error::{RepoError, Result};

use super::{Node, NodeRef, NodeValue};

/// Representation requested from [`Node::content`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Bytes,
    Text,
    /// A path to the content on local storage.
    File,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Content {
    Bytes(Vec<u8>),
    Text(String),
    File(PathBuf),
}

type Stream = Box<dyn Read + Send>;

impl Node {
    /// Open the raw content of this node. `None` when the node has no
    /// content (folders).
    ///
    /// In-memory values are served directly; everything else goes through
    /// the [`ContentStore`] registered on the node chain. Nothing is cached:
    /// every call opens a fresh stream.
    pub fn content_stream(self: &Arc<Self>) -> Result<Option<Stream>> {
        if let NodeValue::Inline(bytes) = &self.value {
            return Ok(Some(Box::new(Cursor::new(bytes.clone()))));
        }
        let store = self.find_service::<dyn ContentStore>()?;
        store.open_content(self)
    }

    /// Content converted to `kind`.
    ///
    /// Bytes are always the raw stream. For other kinds a
    /// [`ContentTransformer`] on the node chain takes precedence; when there
    /// is none, or it does not handle `kind`, text is decoded from the stream
    /// and files resolve to the local path when the content is already
    /// materialized locally.
    pub fn content(self: &Arc<Self>, kind: ContentKind) -> Result<Option<Content>> {
        if kind != ContentKind::Bytes {
            if let Some(transformer) = self.lookup_service::<dyn ContentTransformer>() {
                if let Some(content) = transformer.transform(kind, LazyContent::new(self.clone()))? {
                    return Ok(Some(content));
                }
            }
        }
        match kind {
            ContentKind::Bytes => {
                let Some(mut stream) = self.content_stream()? else {
                    return Ok(None);
                };
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                Ok(Some(Content::Bytes(bytes)))
            }
            ContentKind::Text => {
                let Some(mut stream) = self.content_stream()? else {
                    return Ok(None);
                };
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                String::from_utf8(bytes)
                    .map(|text| Some(Content::Text(text)))
                    .map_err(|_| RepoError::NotUtf8(self.label.clone()))
            }
            ContentKind::File => {
                if let Some(path) = self.file_path() {
                    return Ok(Some(Content::File(path.to_path_buf())));
                }
                Ok(self
                    .lookup_service::<dyn ContentStore>()
                    .and_then(|store| store.local_path(self))
                    .map(Content::File))
            }
        }
    }

    pub fn content_bytes(self: &Arc<Self>) -> Result<Option<Vec<u8>>> {
        match self.content(ContentKind::Bytes)? {
            Some(Content::Bytes(bytes)) => Ok(Some(bytes)),
            Some(Content::Text(text)) => Ok(Some(text.into_bytes())),
            _ => Ok(None),
        }
    }

    pub fn content_text(self: &Arc<Self>) -> Result<Option<String>> {
        match self.content(ContentKind::Text)? {
            Some(Content::Text(text)) => Ok(Some(text)),
            Some(Content::Bytes(bytes)) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| RepoError::NotUtf8(self.label.clone())),
            _ => Ok(None),
        }
    }

    pub fn content_file(self: &Arc<Self>) -> Result<Option<PathBuf>> {
        match self.content(ContentKind::File)? {
            Some(Content::File(path)) => Ok(Some(path)),
            _ => Ok(None),
        }
    }

    /// Tell the content store this node's content is no longer needed.
    pub fn release(self: &Arc<Self>) -> Result<()> {
        match self.lookup_service::<dyn ContentStore>() {
            Some(store) => store.release(self),
            None => Ok(()),
        }
    }
}

// ─── Lazy Stream ───────────────────────────────────────────────────

/// Content stream that opens the node only on first read, so transformers
/// that never read do not touch the backing store.
pub struct LazyContent {
    node: NodeRef,
    inner: Option<Stream>,
}

impl LazyContent {
    pub fn new(node: NodeRef) -> Self {
        Self { node, inner: None }
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    fn delegate(&mut self) -> std::io::Result<&mut Stream> {
        if self.inner.is_none() {
            let stream = self
                .node
                .content_stream()
                .map_err(std::io::Error::other)?
                .ok_or_else(|| {
                    std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("node '{}' has no content", self.node.label()),
                    )
                })?;
            self.inner = Some(stream);
        }
        self.inner
            .as_mut()
            .ok_or_else(|| std::io::Error::other("content stream unavailable"))
    }
}

impl Read for LazyContent {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.delegate()?.read(buf)
    }
}
