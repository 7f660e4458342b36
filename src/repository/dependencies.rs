use serde::Serialize;

use crate::artifact::{ArtifactContext, MODULE_PROPERTIES};
use crate::error::Result;

use super::Repository;

/// One dependency declared by a module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub optional: bool,
    pub export: bool,
}

/// Reads the `module.properties` descriptor kept next to a module's
/// artifacts: one `name=version` line per dependency.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertiesDependencyResolver;

impl PropertiesDependencyResolver {
    /// `None` when the module or its descriptor does not exist.
    pub fn resolve(
        &self,
        repository: &Repository,
        context: &ArtifactContext,
    ) -> Result<Option<Vec<ModuleInfo>>> {
        let Some(parent) = repository.find_parent(context)? else {
            return Ok(None);
        };
        let Some(descriptor) = parent.child(MODULE_PROPERTIES)? else {
            return Ok(None);
        };
        Ok(descriptor.content_text()?.map(|text| parse_properties(&text)))
    }
}

/// Parse properties text into dependencies, sorted by module name.
///
/// Accepts `=` or `:` as separator and skips blank lines and `#` or `!`
/// comments. Duplicate keys keep the last value.
pub fn parse_properties(text: &str) -> Vec<ModuleInfo> {
    let mut entries = std::collections::BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (name, version) = match line.find(['=', ':']) {
            Some(i) => (line[..i].trim(), line[i + 1..].trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            continue;
        }
        entries.insert(name.to_string(), version.to_string());
    }
    entries
        .into_iter()
        .map(|(name, version)| ModuleInfo {
            name,
            version,
            optional: false,
            export: false,
        })
        .collect()
}
