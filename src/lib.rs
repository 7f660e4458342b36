pub mod artifact;
pub mod capability;
pub mod config;
pub mod error;
pub mod manager;
pub mod node;
pub mod query;
pub mod repository;
pub mod result;
pub mod store;
pub mod version;

// Re-exports: the types most callers need
pub use artifact::{ArtifactContext, ArtifactKind, QueryKind};
pub use config::RepoConfig;
pub use error::{RepoError, Result};
pub use manager::RepositoryManager;
pub use node::{Node, NodeRef, NodeValue};
pub use query::{ModuleQuery, ModuleVersionQuery};
pub use repository::Repository;
pub use result::{ModuleDetails, ModuleResult, ModuleSearchResult, ModuleVersionResult};
pub use store::{FileStore, MemoryStore};
