//! Repository configuration.
//!
//! ```toml
//! lookup_caching = true
//!
//! [[repository]]
//! name = "local"
//! path = "/home/me/.modrepo/repo"
//! ```
//!
//! Looked up at `--config`, then `$MODREPO_CONFIG`, then
//! `~/.modrepo/config.toml`. Without a file, a single repository at
//! `$MODREPO_HOME` (or `~/.modrepo/repo`) is used.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RepoError, Result};
use crate::manager::RepositoryManager;
use crate::repository::Repository;
use crate::store::FileStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Cache derived path segments in each repository.
    #[serde(default = "default_lookup_caching")]
    pub lookup_caching: bool,
    /// In priority order.
    #[serde(default, rename = "repository")]
    pub repositories: Vec<RepositoryConfig>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryConfig {
    pub name: String,
    pub path: PathBuf,
}

fn default_lookup_caching() -> bool {
    true
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            lookup_caching: default_lookup_caching(),
            repositories: default_repository_dir()
                .map(|path| RepositoryConfig {
                    name: "local".to_string(),
                    path,
                })
                .into_iter()
                .collect(),
        }
    }
}

/// `$MODREPO_HOME`, or `~/.modrepo/repo`.
pub fn default_repository_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MODREPO_HOME") {
        return Some(PathBuf::from(dir));
    }
    home_dir().map(|home| home.join(".modrepo").join("repo"))
}

/// `$MODREPO_CONFIG`, or `~/.modrepo/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MODREPO_CONFIG") {
        return Some(PathBuf::from(path));
    }
    home_dir().map(|home| home.join(".modrepo").join("config.toml"))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

impl RepoConfig {
    /// Load a config file. Relative repository paths resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RepoError::io(path, e))?;
        let mut config = Self::parse(&text).map_err(|message| RepoError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        if let Some(dir) = path.parent() {
            for repository in &mut config.repositories {
                if repository.path.is_relative() {
                    repository.path = dir.join(&repository.path);
                }
            }
        }
        if config.repositories.is_empty() {
            config.repositories = RepoConfig::default().repositories;
        }
        debug!(path = %path.display(), repositories = config.repositories.len(), "config loaded");
        Ok(config)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Resolve the config: an explicit path must exist, the default
    /// locations are optional.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Replace the configured repositories with `dirs`, keeping their order.
    pub fn with_repository_dirs(mut self, dirs: &[PathBuf]) -> Self {
        if !dirs.is_empty() {
            self.repositories = dirs
                .iter()
                .enumerate()
                .map(|(i, path)| RepositoryConfig {
                    name: format!("repo{}", i),
                    path: path.clone(),
                })
                .collect();
        }
        self
    }

    /// Open every configured repository over a filesystem store.
    pub fn open_manager(&self) -> Result<RepositoryManager> {
        if self.repositories.is_empty() {
            return Err(RepoError::InvalidArgument(
                "no repository configured (set $MODREPO_HOME or HOME)".to_string(),
            ));
        }
        let mut repositories = Vec::with_capacity(self.repositories.len());
        for entry in &self.repositories {
            let store = FileStore::open(&entry.path)?;
            debug!(name = %entry.name, path = %entry.path.display(), "opened repository");
            repositories.push(Repository::new(store.root()).with_lookup_caching(self.lookup_caching));
        }
        Ok(RepositoryManager::new(repositories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repositories_in_order() {
        let config = RepoConfig::parse(
            r#"
lookup_caching = false

[[repository]]
name = "local"
path = "/srv/local"

[[repository]]
name = "mirror"
path = "/srv/mirror"
"#,
        )
        .unwrap();
        assert!(!config.lookup_caching);
        let names: Vec<&str> = config.repositories.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["local", "mirror"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = RepoConfig::parse("lookup_cache = true\n").unwrap_err();
        assert!(err.contains("lookup_cache"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[[repository]]\nname = \"here\"\npath = \"repo\"\n").unwrap();

        let config = RepoConfig::discover(Some(&path)).unwrap();
        assert!(config.lookup_caching);
        assert_eq!(config.repositories[0].path, tmp.path().join("repo"));

        let manager = config.open_manager().unwrap();
        assert_eq!(manager.repositories().len(), 1);
        assert!(tmp.path().join("repo").is_dir());
    }

    #[test]
    fn test_load_reports_bad_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[[repository]\n").unwrap();
        let err = RepoConfig::load(&path).unwrap_err();
        assert!(matches!(err, RepoError::Config { .. }));
    }

    #[test]
    fn test_repository_dirs_override() {
        let config = RepoConfig {
            lookup_caching: true,
            repositories: Vec::new(),
        }
        .with_repository_dirs(&[PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(config.repositories[1].path, PathBuf::from("/b"));
        assert_eq!(config.repositories[1].name, "repo1");
    }
}
