//! Module search over the local tree.
//!
//! The walk is depth-first with siblings in case-insensitive label order.
//! A folder is a module when one of its version folders holds an artifact;
//! folders with no artifacts below their version level are namespace
//! segments and are descended into. Matches are ranked in walk order and the
//! walk unwinds as soon as the requested page is full.

use std::ops::ControlFlow;

use tracing::{debug, trace};

use crate::artifact::{is_artifact, is_documentation, ArtifactKind, QueryKind};
use crate::capability::ContentFinder;
use crate::error::Result;
use crate::node::NodeRef;
use crate::query::ModuleQuery;
use crate::result::{ModuleDetails, SearchAccumulator, SearchPage};
use crate::version::VersionKey;

use super::{matches_metadata, module_name, read_metadata, Repository};

impl Repository {
    /// Report modules whose name (or, for archives, embedded descriptor)
    /// contains the query text, paged by `query.start` and `query.count`.
    ///
    /// A [`ContentFinder`] registered on the root answers instead.
    pub fn search_modules(
        &self,
        query: &ModuleQuery,
        result: &mut dyn SearchAccumulator,
    ) -> Result<SearchPage> {
        if let Some(finder) = self.root.get_service::<dyn ContentFinder>() {
            debug!(query = %query.name, "search delegated to content finder");
            return finder.search_modules(query, result);
        }
        let mut search = Search {
            query,
            needle: query.name.to_lowercase(),
            result,
            found: 0,
            emitted: 0,
        };
        let flow = search.visit(&self.root)?;
        Ok(SearchPage {
            emitted: search.emitted,
            truncated: flow.is_break(),
        })
    }
}

struct Search<'a> {
    query: &'a ModuleQuery,
    /// Lowercased query text.
    needle: String,
    result: &'a mut dyn SearchAccumulator,
    /// Matches seen so far, emitted or skipped.
    found: u64,
    emitted: u64,
}

impl Search<'_> {
    fn visit(&mut self, parent: &NodeRef) -> Result<ControlFlow<()>> {
        let mut children = parent.children()?;
        children.sort_by_cached_key(|child| child.label().to_lowercase());

        for child in children {
            if child.has_binaries() || is_documentation(child.label()) {
                continue;
            }
            let mut right_kind = false;
            if self.has_children_containing_any_artifact(&child, &mut right_kind)? {
                // A module, but without the kind we are looking for.
                if !right_kind {
                    continue;
                }
                let rank = self.found;
                self.found += 1;
                if rank < self.query.start {
                    continue;
                }
                let end = self.query.end();
                if end.is_some_and(|end| rank >= end) {
                    return Ok(ControlFlow::Break(()));
                }
                let details = self.module_details(&child)?;
                trace!(module = %details.name, rank, "search match");
                self.result.add_result(details);
                self.emitted += 1;
                if end.is_some_and(|end| self.found >= end) {
                    return Ok(ControlFlow::Break(()));
                }
            } else if let ControlFlow::Break(()) = self.visit(&child)? {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Whether any version folder of `module` holds an artifact of any
    /// kind. `right_kind` is set when one holds a matching artifact of the
    /// queried kind; versions are scanned until one does, so the answer
    /// does not depend on listing order.
    fn has_children_containing_any_artifact(
        &self,
        module: &NodeRef,
        right_kind: &mut bool,
    ) -> Result<bool> {
        let mut found = false;
        for version in module.children()? {
            if version.has_binaries() || is_documentation(version.label()) {
                continue;
            }
            if self.contains_any_artifact(&version, right_kind)? {
                if *right_kind {
                    return Ok(true);
                }
                found = true;
            }
        }
        Ok(found)
    }

    /// Scans the direct children of a version folder only.
    fn contains_any_artifact(&self, version: &NodeRef, right_kind: &mut bool) -> Result<bool> {
        let mut found_artifact = false;
        for child in version.children()? {
            if !child.has_binaries() {
                continue;
            }
            let name = child.label();
            if self.query.kind.matches(name) && self.matches_search(&child, version)? {
                *right_kind = true;
                return Ok(true);
            }
            if is_artifact(name) {
                found_artifact = true;
            }
        }
        Ok(found_artifact)
    }

    fn matches_search(&self, artifact: &NodeRef, version: &NodeRef) -> Result<bool> {
        let Some(module) = version.first_parent() else {
            return Ok(false);
        };
        let name = module_name(&module);
        if name.to_lowercase().contains(&self.needle) {
            return Ok(true);
        }
        if self.query.kind == QueryKind::Jvm {
            return Ok(matches_metadata(&name, artifact, &self.needle));
        }
        // Script and source artifacts carry no descriptor; use the archive
        // of the same version when there is one.
        match version.child(&sibling_archive(artifact.label(), self.query.kind))? {
            Some(archive) => Ok(matches_metadata(&name, &archive, &self.needle)),
            None => Ok(false),
        }
    }

    /// Versions holding the queried kind, plus descriptor fields read from
    /// the newest of them.
    fn module_details(&self, module: &NodeRef) -> Result<ModuleDetails> {
        let mut details = ModuleDetails::new(module_name(module));
        let mut newest: Option<(VersionKey, NodeRef)> = None;
        for version in module.children()? {
            if version.has_binaries() || is_documentation(version.label()) {
                continue;
            }
            let artifact = version
                .children()?
                .into_iter()
                .find(|child| child.has_binaries() && self.query.kind.matches(child.label()));
            let Some(artifact) = artifact else {
                continue;
            };
            let key = VersionKey::from(version.label());
            if newest.as_ref().map_or(true, |(current, _)| key > *current) {
                newest = Some((key.clone(), artifact));
            }
            details.versions.insert(key);
        }

        if let Some((_, artifact)) = newest {
            let descriptor = match self.query.kind {
                QueryKind::Jvm => Some(artifact),
                kind => artifact
                    .first_parent()
                    .map(|version| version.child(&sibling_archive(artifact.label(), kind)))
                    .transpose()?
                    .flatten(),
            };
            if let Some(metadata) = descriptor.and_then(|a| read_metadata(&details.name, &a)) {
                details.doc = metadata.doc;
                details.license = metadata.license;
                details.authors = metadata.authors;
            }
        }
        Ok(details)
    }
}

/// `x-1.0.js` -> `x-1.0.car` for a script or source artifact.
fn sibling_archive(label: &str, kind: QueryKind) -> String {
    let stem = kind
        .kinds()
        .iter()
        .find_map(|k| label.strip_suffix(k.suffix()))
        .unwrap_or(label);
    format!("{}{}", stem, ArtifactKind::Car.suffix())
}
