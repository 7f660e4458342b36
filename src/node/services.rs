//! Per-node capability registry.
//!
//! The set of capabilities is closed: every slot is a typed field and the
//! [`Service`] trait maps a capability trait object to its slot. Lookups that
//! miss on a node walk its parents (see [`super::Node::lookup_service`]).

use std::fmt;
use std::sync::Arc;

use crate::capability::{
    ContentFinder, ContentStore, ContentTransformer, MetadataExtractor, StructureBuilder,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    StructureBuilder,
    ContentStore,
    ContentTransformer,
    ContentFinder,
    MetadataExtractor,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServiceKind::StructureBuilder => "structure builder",
            ServiceKind::ContentStore => "content store",
            ServiceKind::ContentTransformer => "content transformer",
            ServiceKind::ContentFinder => "content finder",
            ServiceKind::MetadataExtractor => "metadata extractor",
        };
        f.write_str(name)
    }
}

/// Capabilities registered directly on one node.
#[derive(Clone, Default)]
pub struct Services {
    structure_builder: Option<Arc<dyn StructureBuilder>>,
    content_store: Option<Arc<dyn ContentStore>>,
    content_transformer: Option<Arc<dyn ContentTransformer>>,
    content_finder: Option<Arc<dyn ContentFinder>>,
    metadata_extractor: Option<Arc<dyn MetadataExtractor>>,
}

impl Services {
    /// Kinds that currently have an instance in this registry.
    pub fn registered(&self) -> Vec<ServiceKind> {
        let mut kinds = Vec::new();
        if self.structure_builder.is_some() {
            kinds.push(ServiceKind::StructureBuilder);
        }
        if self.content_store.is_some() {
            kinds.push(ServiceKind::ContentStore);
        }
        if self.content_transformer.is_some() {
            kinds.push(ServiceKind::ContentTransformer);
        }
        if self.content_finder.is_some() {
            kinds.push(ServiceKind::ContentFinder);
        }
        if self.metadata_extractor.is_some() {
            kinds.push(ServiceKind::MetadataExtractor);
        }
        kinds
    }
}

/// A capability trait object that can live in a [`Services`] slot.
///
/// Implemented for `dyn StructureBuilder`, `dyn ContentStore`,
/// `dyn ContentTransformer`, `dyn ContentFinder` and `dyn MetadataExtractor`.
pub trait Service: 'static {
    const KIND: ServiceKind;

    #[doc(hidden)]
    fn slot(services: &mut Services) -> &mut Option<Arc<Self>>;
}

impl Service for dyn StructureBuilder {
    const KIND: ServiceKind = ServiceKind::StructureBuilder;

    fn slot(services: &mut Services) -> &mut Option<Arc<Self>> {
        &mut services.structure_builder
    }
}

impl Service for dyn ContentStore {
    const KIND: ServiceKind = ServiceKind::ContentStore;

    fn slot(services: &mut Services) -> &mut Option<Arc<Self>> {
        &mut services.content_store
    }
}

impl Service for dyn ContentTransformer {
    const KIND: ServiceKind = ServiceKind::ContentTransformer;

    fn slot(services: &mut Services) -> &mut Option<Arc<Self>> {
        &mut services.content_transformer
    }
}

impl Service for dyn ContentFinder {
    const KIND: ServiceKind = ServiceKind::ContentFinder;

    fn slot(services: &mut Services) -> &mut Option<Arc<Self>> {
        &mut services.content_finder
    }
}

impl Service for dyn MetadataExtractor {
    const KIND: ServiceKind = ServiceKind::MetadataExtractor;

    fn slot(services: &mut Services) -> &mut Option<Arc<Self>> {
        &mut services.metadata_extractor
    }
}
