use tracing::{debug, trace};

use crate::artifact::{artifact_file_name, is_documentation, QueryKind};
use crate::capability::ContentFinder;
use crate::error::Result;
use crate::node::NodeRef;
use crate::query::{ModuleQuery, ModuleVersionQuery};
use crate::result::{CompletionAccumulator, VersionAccumulator};

use super::{module_name, node_at, read_metadata, Repository};

impl Repository {
    /// Report the versions of `query.name` that hold an artifact of the
    /// queried kind, optionally only those starting with `query.version`.
    /// Versions the accumulator already has are skipped.
    pub fn complete_versions(
        &self,
        query: &ModuleVersionQuery,
        result: &mut dyn VersionAccumulator,
    ) -> Result<()> {
        if let Some(finder) = self.root.get_service::<dyn ContentFinder>() {
            debug!(module = %query.name, "version completion delegated to content finder");
            return finder.complete_versions(query, result);
        }
        let segments: Vec<&str> = query.name.split('.').collect();
        let Some(module) = node_at(&self.root, &segments)? else {
            return Ok(());
        };

        let mut versions = module.children()?;
        versions.sort_by(|a, b| a.label().cmp(b.label()));
        for version_node in versions {
            if version_node.has_binaries() {
                continue;
            }
            let version = version_node.label();
            if let Some(prefix) = &query.version {
                if !version.starts_with(prefix.as_str()) {
                    continue;
                }
            }
            if result.has_version(version) {
                continue;
            }
            for kind in query.kind.kinds() {
                let name = artifact_file_name(&query.name, Some(version), *kind);
                let Some(artifact) = version_node.child(&name)? else {
                    continue;
                };
                trace!(module = %query.name, version, "version found");
                if let Some(details) = result.add_version(version) {
                    if let Some(metadata) = read_metadata(&query.name, &artifact) {
                        details.apply(metadata);
                    }
                }
                break;
            }
        }
        Ok(())
    }

    /// Complete a partial module name.
    ///
    /// Everything up to the last `.` must name existing folders; the last
    /// segment is a case-sensitive prefix. Each candidate holding the
    /// queried kind is extended for as long as exactly one child leads to
    /// such artifacts, the way a shell collapses unique directory chains.
    pub fn complete_modules(
        &self,
        query: &ModuleQuery,
        result: &mut dyn CompletionAccumulator,
    ) -> Result<()> {
        if let Some(finder) = self.root.get_service::<dyn ContentFinder>() {
            debug!(prefix = %query.name, "module completion delegated to content finder");
            return finder.complete_modules(query, result);
        }
        // Empty segments are kept: "a." completes below "a".
        let segments: Vec<&str> = query.name.split('.').collect();
        let Some((last, leading)) = segments.split_last() else {
            return Ok(());
        };
        let Some(parent) = node_at(&self.root, leading)? else {
            return Ok(());
        };

        let mut children = parent.children()?;
        children.sort_by(|a, b| a.label().cmp(b.label()));
        for child in children {
            if !child.label().starts_with(*last) {
                continue;
            }
            if has_children_containing_artifact(&child, query.kind)? {
                let deepest = find_deepest_unambiguous_node(child, query.kind)?;
                result.add_result(&module_name(&deepest));
            }
        }
        Ok(())
    }
}

/// Whether some folder below `node` leads to an artifact of `kind`. Looking
/// one level down keeps version folders, and the unversioned default
/// module, from completing as module names.
fn has_children_containing_artifact(node: &NodeRef, kind: QueryKind) -> Result<bool> {
    if node.has_binaries() {
        return Ok(false);
    }
    for child in node.children()? {
        if !child.has_binaries()
            && !is_documentation(child.label())
            && contains_artifact(&child, kind)?
        {
            return Ok(true);
        }
    }
    Ok(false)
}

fn contains_artifact(node: &NodeRef, kind: QueryKind) -> Result<bool> {
    for child in node.children()? {
        if child.has_binaries() {
            if kind.matches(child.label()) {
                return Ok(true);
            }
        } else if !is_documentation(child.label()) && contains_artifact(&child, kind)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn find_deepest_unambiguous_node(start: NodeRef, kind: QueryKind) -> Result<NodeRef> {
    let mut node = start;
    loop {
        let mut single = None;
        for child in node.children()? {
            if has_children_containing_artifact(&child, kind)? {
                if single.is_some() {
                    return Ok(node);
                }
                single = Some(child);
            }
        }
        match single {
            Some(next) => node = next,
            None => return Ok(node),
        }
    }
}
