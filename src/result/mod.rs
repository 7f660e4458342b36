//! Result accumulators for search and completion.
//!
//! Repositories and content finders push results one at a time; the
//! accumulators own deduplication and merging, so the same accumulator can be
//! fed by several repositories in turn.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;

use serde::Serialize;

use crate::capability::ModuleMetadata;
use crate::version::VersionKey;

#[cfg(test)]
mod tests;

// ─── Accumulator Traits ────────────────────────────────────────────

/// Receives modules matched by a search, in traversal order.
pub trait SearchAccumulator {
    fn add_result(&mut self, details: ModuleDetails);
}

/// Receives versions found by version completion.
pub trait VersionAccumulator {
    fn has_version(&self, version: &str) -> bool;

    /// Record `version` and return its details for filling in metadata.
    /// `None` when the version is already present.
    fn add_version(&mut self, version: &str) -> Option<&mut ModuleVersionDetails>;
}

/// Receives module names produced by name completion.
pub trait CompletionAccumulator {
    fn add_result(&mut self, name: &str);
}

/// Outcome of one paged search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    /// Matches handed to the accumulator.
    pub emitted: u64,
    /// The search stopped at the page cutoff; more matches may follow.
    pub truncated: bool,
}

// ─── Module Search ─────────────────────────────────────────────────

/// One module matched by a search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDetails {
    pub name: String,
    pub doc: Option<String>,
    pub license: Option<String>,
    pub authors: BTreeSet<String>,
    /// Versions carrying an artifact of the searched kind.
    pub versions: BTreeSet<VersionKey>,
}

impl ModuleDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn newest_version(&self) -> Option<&VersionKey> {
        self.versions.iter().next_back()
    }

    /// Fold in another sighting of the same module. Authors and versions are
    /// unioned; doc and license follow whichever side has the newest version.
    pub fn merge(&mut self, other: ModuleDetails) {
        let newer = match (other.newest_version(), self.newest_version()) {
            (Some(theirs), Some(ours)) => theirs > ours,
            (Some(_), None) => true,
            _ => false,
        };
        if newer {
            self.doc = other.doc.or(self.doc.take());
            self.license = other.license.or(self.license.take());
        } else {
            self.doc = self.doc.take().or(other.doc);
            self.license = self.license.take().or(other.license);
        }
        self.authors.extend(other.authors);
        self.versions.extend(other.versions);
    }
}

impl SearchAccumulator for Vec<ModuleDetails> {
    fn add_result(&mut self, details: ModuleDetails) {
        self.push(details);
    }
}

/// Search results keyed by module name, in first-seen order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ModuleSearchResult {
    pub start: u64,
    pub has_more_results: bool,
    results: Vec<ModuleDetails>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ModuleSearchResult {
    pub fn new(start: u64) -> Self {
        Self {
            start,
            ..Self::default()
        }
    }

    pub fn results(&self) -> &[ModuleDetails] {
        &self.results
    }

    pub fn into_results(self) -> Vec<ModuleDetails> {
        self.results
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDetails> {
        self.index.get(name).map(|&i| &self.results[i])
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.results.iter().map(|d| d.name.as_str()).collect()
    }

    /// One line per module: name, versions, and license when known.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for details in &self.results {
            let versions: Vec<&str> = details.versions.iter().map(VersionKey::as_str).collect();
            let _ = write!(out, "{}  {}", details.name, versions.join(" "));
            if let Some(license) = &details.license {
                let _ = write!(out, "  [{}]", license);
            }
            out.push('\n');
        }
        out
    }
}

impl SearchAccumulator for ModuleSearchResult {
    fn add_result(&mut self, details: ModuleDetails) {
        match self.index.get(&details.name) {
            Some(&i) => self.results[i].merge(details),
            None => {
                self.index.insert(details.name.clone(), self.results.len());
                self.results.push(details);
            }
        }
    }
}

// ─── Version Completion ────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleVersionDetails {
    pub version: String,
    pub doc: Option<String>,
    pub license: Option<String>,
    pub authors: BTreeSet<String>,
}

impl ModuleVersionDetails {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    /// Copy extracted descriptor fields in. The version label is kept.
    pub fn apply(&mut self, metadata: ModuleMetadata) {
        if metadata.doc.is_some() {
            self.doc = metadata.doc;
        }
        if metadata.license.is_some() {
            self.license = metadata.license;
        }
        self.authors.extend(metadata.authors);
    }
}

/// Versions of one module, ordered by version.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ModuleVersionResult {
    pub name: String,
    versions: BTreeMap<VersionKey, ModuleVersionDetails>,
}

impl ModuleVersionResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            versions: BTreeMap::new(),
        }
    }

    pub fn versions(&self) -> impl Iterator<Item = &ModuleVersionDetails> {
        self.versions.values()
    }

    pub fn version_names(&self) -> Vec<&str> {
        self.versions.keys().map(VersionKey::as_str).collect()
    }

    pub fn get(&self, version: &str) -> Option<&ModuleVersionDetails> {
        self.versions.get(&VersionKey::from(version))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Add every version of `other` not already present.
    pub fn merge(&mut self, other: ModuleVersionResult) {
        for (key, details) in other.versions {
            self.versions.entry(key).or_insert(details);
        }
    }
}

impl VersionAccumulator for ModuleVersionResult {
    fn has_version(&self, version: &str) -> bool {
        self.versions.contains_key(&VersionKey::from(version))
    }

    fn add_version(&mut self, version: &str) -> Option<&mut ModuleVersionDetails> {
        use std::collections::btree_map::Entry;
        match self.versions.entry(VersionKey::from(version)) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => Some(slot.insert(ModuleVersionDetails::new(version))),
        }
    }
}

// ─── Name Completion ───────────────────────────────────────────────

/// Completed module names, sorted and deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModuleResult {
    names: BTreeSet<String>,
}

impl ModuleResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn merge(&mut self, other: ModuleResult) {
        self.names.extend(other.names);
    }
}

impl CompletionAccumulator for ModuleResult {
    fn add_result(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}
