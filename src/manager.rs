//! Several repositories queried as one, in priority order.

use rayon::prelude::*;
use tracing::debug;

use crate::artifact::ArtifactContext;
use crate::error::{RepoError, Result};
use crate::node::NodeRef;
use crate::query::{ModuleQuery, ModuleVersionQuery};
use crate::repository::{ModuleInfo, Repository};
use crate::result::{ModuleResult, ModuleSearchResult, ModuleVersionResult, SearchAccumulator};

pub struct RepositoryManager {
    repositories: Vec<Repository>,
}

impl RepositoryManager {
    /// Repositories earlier in the list take priority.
    pub fn new(repositories: Vec<Repository>) -> Self {
        Self { repositories }
    }

    pub fn repositories(&self) -> &[Repository] {
        &self.repositories
    }

    /// First repository holding the artifact.
    pub fn find_artifact(&self, context: &ArtifactContext) -> Result<Option<NodeRef>> {
        for repository in &self.repositories {
            if let Some(node) = repository.find_artifact(context)? {
                debug!(%context, repository = %repository.display_string(), "resolved");
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Publish into the first repository.
    pub fn put_artifact(&self, context: &ArtifactContext, bytes: &[u8]) -> Result<NodeRef> {
        let target = self
            .repositories
            .first()
            .ok_or_else(|| RepoError::InvalidArgument("no repository configured".to_string()))?;
        target.put_artifact(context, bytes)
    }

    /// Dependencies from the first repository that has a descriptor.
    pub fn dependencies(&self, context: &ArtifactContext) -> Result<Option<Vec<ModuleInfo>>> {
        for repository in &self.repositories {
            if let Some(deps) = repository.dependencies(context)? {
                return Ok(Some(deps));
            }
        }
        Ok(None)
    }

    /// Search every repository and page over the merged matches.
    ///
    /// Each repository reports its first `start + count` matches; the union
    /// is ordered by module name segment by segment, case-insensitively,
    /// which is the order a single tree walk produces.
    pub fn search_modules(&self, query: &ModuleQuery) -> Result<ModuleSearchResult> {
        let per_repository = ModuleQuery {
            start: 0,
            count: query.end(),
            ..query.clone()
        };
        let pages = self
            .repositories
            .par_iter()
            .map(|repository| {
                let mut found = Vec::new();
                let page = repository.search_modules(&per_repository, &mut found)?;
                Ok((page.truncated, found))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut merged = ModuleSearchResult::new(0);
        let mut truncated = false;
        for (page_truncated, found) in pages {
            truncated |= page_truncated;
            for details in found {
                merged.add_result(details);
            }
        }

        let mut all = merged.into_results();
        all.sort_by_cached_key(|details| segment_key(&details.name));
        let total = all.len() as u64;

        let mut result = ModuleSearchResult::new(query.start);
        let skip = usize::try_from(query.start).unwrap_or(usize::MAX);
        let take = query
            .count
            .map_or(usize::MAX, |count| usize::try_from(count).unwrap_or(usize::MAX));
        for details in all.into_iter().skip(skip).take(take) {
            result.add_result(details);
        }
        result.has_more_results = truncated || query.end().is_some_and(|end| total > end);
        Ok(result)
    }

    /// Versions from every repository; on duplicates the higher priority
    /// repository's details win.
    pub fn complete_versions(&self, query: &ModuleVersionQuery) -> Result<ModuleVersionResult> {
        let partials = self
            .repositories
            .par_iter()
            .map(|repository| {
                let mut partial = ModuleVersionResult::new(query.name.clone());
                repository.complete_versions(query, &mut partial)?;
                Ok(partial)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = ModuleVersionResult::new(query.name.clone());
        for partial in partials {
            result.merge(partial);
        }
        Ok(result)
    }

    pub fn complete_modules(&self, query: &ModuleQuery) -> Result<ModuleResult> {
        let partials = self
            .repositories
            .par_iter()
            .map(|repository| {
                let mut partial = ModuleResult::new();
                repository.complete_modules(query, &mut partial)?;
                Ok(partial)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = ModuleResult::new();
        for partial in partials {
            result.merge(partial);
        }
        Ok(result)
    }

    pub fn refresh(&self) {
        for repository in &self.repositories {
            repository.refresh();
        }
    }
}

fn segment_key(name: &str) -> Vec<String> {
    name.split('.').map(str::to_lowercase).collect()
}
