use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::capability::{ContentStore, ContentTransformer, StructureBuilder};

/// Serves a fixed set of child labels under every folder and counts calls.
#[derive(Default)]
struct CountingBuilder {
    labels: Vec<&'static str>,
    lookups: AtomicUsize,
    listings: AtomicUsize,
}

impl CountingBuilder {
    fn with(labels: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            labels: labels.to_vec(),
            ..Self::default()
        })
    }
}

impl StructureBuilder for CountingBuilder {
    fn find_child(&self, _parent: &NodeRef, label: &str) -> Result<Option<NodeRef>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let known = self.labels.iter().any(|l| *l == label);
        Ok(known.then(|| Node::new(label, NodeValue::Folder)))
    }

    fn find_children(&self, _parent: &NodeRef) -> Result<Vec<NodeRef>> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .labels
            .iter()
            .map(|label| Node::new(*label, NodeValue::Folder))
            .collect())
    }
}

fn rooted(builder: &Arc<CountingBuilder>) -> NodeRef {
    let root = Node::root("root");
    root.add_service::<dyn StructureBuilder>(builder.clone());
    root
}

fn sorted_labels(nodes: &[NodeRef]) -> Vec<String> {
    let mut labels: Vec<String> = nodes.iter().map(|n| n.label().to_string()).collect();
    labels.sort();
    labels
}

#[test]
fn test_children_enumerated_once() {
    let builder = CountingBuilder::with(&["a", "b"]);
    let root = rooted(&builder);

    let first = root.children().unwrap();
    let second = root.children().unwrap();
    assert_eq!(sorted_labels(&first), vec!["a", "b"]);
    assert_eq!(sorted_labels(&first), sorted_labels(&second));
    assert_eq!(builder.listings.load(Ordering::SeqCst), 1);
    assert!(root.is_enumerated());

    // Enumerated children are the same instances on every call.
    let a1 = first.iter().find(|n| n.label() == "a").unwrap();
    let a2 = root.child("a").unwrap().unwrap();
    assert!(Arc::ptr_eq(a1, &a2));
    assert_eq!(builder.lookups.load(Ordering::SeqCst), 0);
}

#[test]
fn test_children_include_added_nodes() {
    let builder = CountingBuilder::with(&["a"]);
    let root = rooted(&builder);
    root.add_node("local").unwrap();
    assert_eq!(sorted_labels(&root.children().unwrap()), vec!["a", "local"]);
}

#[test]
fn test_missing_child_cached_until_refresh() {
    let builder = CountingBuilder::with(&["a"]);
    let root = rooted(&builder);

    for _ in 0..3 {
        assert!(root.child("x").unwrap().is_none());
    }
    assert_eq!(builder.lookups.load(Ordering::SeqCst), 1);

    root.refresh();
    assert!(root.child("x").unwrap().is_none());
    assert_eq!(builder.lookups.load(Ordering::SeqCst), 2);
}

#[test]
fn test_add_node_clears_recorded_miss() {
    let builder = CountingBuilder::with(&[]);
    let root = rooted(&builder);
    assert!(root.child("x").unwrap().is_none());
    let added = root.add_node("x").unwrap();
    let found = root.child("x").unwrap().unwrap();
    assert!(Arc::ptr_eq(&added, &found));
}

#[test]
fn test_concurrent_add_node_converges() {
    let root = Node::root("root");
    let nodes: Vec<NodeRef> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| root.add_node("x").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for node in &nodes[1..] {
        assert!(Arc::ptr_eq(&nodes[0], node));
    }
    assert_eq!(root.known_children().len(), 1);
    assert_eq!(nodes[0].parents().len(), 1);
}

#[test]
fn test_concurrent_lookup_converges() {
    let builder = CountingBuilder::with(&["x"]);
    let root = rooted(&builder);
    let nodes: Vec<NodeRef> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| root.child("x").unwrap().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for node in &nodes[1..] {
        assert!(Arc::ptr_eq(&nodes[0], node));
    }
    assert_eq!(root.known_children().len(), 1);
}

#[test]
fn test_missing_builder_is_service_not_found() {
    let root = Node::root("bare");
    let err = root.child("x").unwrap_err();
    assert!(matches!(
        err,
        RepoError::ServiceNotFound(ServiceKind::StructureBuilder)
    ));
    assert_eq!(err.to_string(), "no structure builder registered in node chain");
}

#[test]
fn test_empty_label_rejected() {
    let root = Node::root("root");
    assert!(matches!(root.add_node(""), Err(RepoError::InvalidArgument(_))));
    assert!(matches!(
        root.link(Node::new("", NodeValue::Folder)),
        Err(RepoError::InvalidArgument(_))
    ));
}

#[test]
fn test_service_lookup_walks_and_caches() {
    let builder = CountingBuilder::with(&["a"]);
    let root = rooted(&builder);
    let child = root.add_node("a").unwrap().add_node("b").unwrap();

    assert!(child.get_service::<dyn StructureBuilder>().is_none());
    assert!(child.lookup_service::<dyn StructureBuilder>().is_some());
    // The ancestor's instance is now cached locally.
    assert_eq!(child.registered_services(), vec![ServiceKind::StructureBuilder]);

    // Removing the root's instance does not affect the cached copy.
    root.remove_service::<dyn StructureBuilder>();
    assert!(child.find_service::<dyn StructureBuilder>().is_ok());
    assert!(root.find_service::<dyn StructureBuilder>().is_err());
}

#[test]
fn test_subtree_override() {
    let outer = CountingBuilder::with(&["outer"]);
    let inner = CountingBuilder::with(&["inner"]);
    let root = rooted(&outer);
    let sub = root.add_node("sub").unwrap();
    sub.add_service::<dyn StructureBuilder>(inner.clone());

    assert!(sub.child("inner").unwrap().is_some());
    assert!(sub.child("outer").unwrap().is_none());
    assert!(root.child("outer").unwrap().is_some());
    assert_eq!(inner.lookups.load(Ordering::SeqCst), 2);
}

#[test]
fn test_equality_by_label_and_parent() {
    let root = Node::root("root");
    let a = root.add_node("a").unwrap();
    let twin = Node::new("a", NodeValue::Folder);
    assert_ne!(*a, *twin);

    let other = Node::root("other");
    other.link(twin.clone()).unwrap();
    assert_ne!(*a, *twin);

    assert_eq!(*a, *root.child("a").unwrap().unwrap());
}

#[test]
fn test_link_replacement_detaches_old_child() {
    let builder = CountingBuilder::with(&[]);
    let root = rooted(&builder);
    let a = root.add_node("a").unwrap();
    let leaf = a.add_node("leaf").unwrap();
    assert_eq!(leaf.to_string(), "/a/leaf");

    let twin = Node::new("a", NodeValue::Folder);
    root.link(twin.clone()).unwrap();
    assert!(Arc::ptr_eq(&root.child("a").unwrap().unwrap(), &twin));

    // The displaced node no longer reaches the root.
    assert!(a.parents().is_empty());
    assert!(a.is_root());
    assert_ne!(*a, *twin);
    assert_eq!(leaf.to_string(), "/leaf");
    assert!(a.lookup_service::<dyn StructureBuilder>().is_none());

    // Relinking the same node keeps its single back link.
    root.link(twin.clone()).unwrap();
    assert_eq!(twin.parents().len(), 1);
}

#[test]
fn test_paths_and_display() {
    let root = Node::root("/srv/repo");
    let leaf = root
        .add_node("com")
        .unwrap()
        .add_node("example")
        .unwrap()
        .add_node("1.0")
        .unwrap();
    assert_eq!(leaf.path_labels(), vec!["com", "example", "1.0"]);
    assert_eq!(leaf.full_path("."), "com.example.1.0");
    assert_eq!(leaf.to_string(), "/com/example/1.0");
    assert!(root.path_labels().is_empty());
    assert!(root.is_root());
    assert_eq!(leaf.first_parent().unwrap().label(), "example");
    assert!(leaf.parent("example").is_some());
}

// ─── Content ───────────────────────────────────────────────────────

struct MapStore(BTreeMap<String, Vec<u8>>);

impl ContentStore for MapStore {
    fn name(&self) -> &'static str {
        "map"
    }

    fn open_content(&self, node: &NodeRef) -> Result<Option<Box<dyn Read + Send>>> {
        Ok(self
            .0
            .get(node.label())
            .map(|bytes| Box::new(std::io::Cursor::new(bytes.clone())) as Box<dyn Read + Send>))
    }
}

struct Uppercase;

impl ContentTransformer for Uppercase {
    fn transform(&self, kind: ContentKind, mut stream: LazyContent) -> Result<Option<Content>> {
        let mut text = String::new();
        stream.read_to_string(&mut text)?;
        Ok(match kind {
            ContentKind::Text => Some(Content::Text(text.to_uppercase())),
            _ => None,
        })
    }
}

#[test]
fn test_content_through_store() {
    let root = Node::root("root");
    let store = MapStore(
        [
            ("note".to_string(), b"hello".to_vec()),
            ("blob".to_string(), vec![0xff, 0xfe]),
        ]
        .into_iter()
        .collect(),
    );
    root.add_service::<dyn ContentStore>(Arc::new(store));
    let note = Node::new("note", NodeValue::File("/nowhere/note".into()));
    root.link(note.clone()).unwrap();

    assert_eq!(note.content_text().unwrap().as_deref(), Some("hello"));
    assert_eq!(note.content_bytes().unwrap(), Some(b"hello".to_vec()));
    assert_eq!(note.content_file().unwrap(), Some(PathBuf::from("/nowhere/note")));

    let blob = root.add_node_with("blob", NodeValue::File("/nowhere/blob".into())).unwrap();
    assert!(matches!(blob.content_text(), Err(RepoError::NotUtf8(_))));
}

#[test]
fn test_inline_content_needs_no_store() {
    let root = Node::root("root");
    let inline = root
        .add_node_with("x", NodeValue::Inline(Arc::from(&b"abc"[..])))
        .unwrap();
    assert!(inline.has_binaries());
    assert_eq!(inline.content_bytes().unwrap(), Some(b"abc".to_vec()));
    assert_eq!(inline.content_file().unwrap(), None);
}

#[test]
fn test_transformer_takes_precedence() {
    let root = Node::root("root");
    let sub = root.add_node("sub").unwrap();
    sub.add_service::<dyn ContentTransformer>(Arc::new(Uppercase));
    let node = sub
        .add_node_with("x", NodeValue::Inline(Arc::from(&b"abc"[..])))
        .unwrap();
    let plain = root
        .add_node_with("y", NodeValue::Inline(Arc::from(&b"abc"[..])))
        .unwrap();

    assert_eq!(node.content_text().unwrap().as_deref(), Some("ABC"));
    assert_eq!(plain.content_text().unwrap().as_deref(), Some("abc"));
}
