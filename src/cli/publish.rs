use std::path::PathBuf;

use modrepo::artifact::DEFAULT_MODULE;
use modrepo::store::verify_checksum;
use modrepo::{ArtifactContext, ArtifactKind, RepositoryManager};

use super::fail;

fn context(module: String, version: Option<String>, kind: ArtifactKind) -> ArtifactContext {
    match version {
        Some(version) => ArtifactContext::new(module, version, kind),
        None if module == DEFAULT_MODULE => ArtifactContext::default_module(kind),
        None => fail(format!("a version is required for module '{}'", module)),
    }
}

pub fn cmd_resolve(
    manager: &RepositoryManager,
    module: String,
    version: Option<String>,
    suffix: ArtifactKind,
) {
    let context = context(module, version, suffix);
    let node = match manager.find_artifact(&context) {
        Ok(Some(node)) => node,
        Ok(None) => fail(format!("artifact {} not found", context)),
        Err(e) => fail(e),
    };
    match node.content_file() {
        Ok(Some(path)) => {
            println!("{}", path.display());
            match verify_checksum(&path) {
                Ok(Some(true)) => eprintln!("checksum: ok"),
                Ok(Some(false)) => {
                    eprintln!("checksum: MISMATCH");
                    std::process::exit(1);
                }
                Ok(None) => eprintln!("checksum: none"),
                Err(e) => fail(e),
            }
        }
        Ok(None) => println!("{}", node),
        Err(e) => fail(e),
    }
}

pub fn cmd_publish(
    manager: &RepositoryManager,
    module: String,
    version: String,
    file: PathBuf,
    suffix: ArtifactKind,
) {
    let bytes = match std::fs::read(&file) {
        Ok(b) => b,
        Err(e) => fail(format!("cannot read '{}': {}", file.display(), e)),
    };
    let context = context(module, Some(version), suffix);
    let node = match manager.put_artifact(&context, &bytes) {
        Ok(node) => node,
        Err(e) => fail(e),
    };
    let location = match node.file_path() {
        Some(path) => path.display().to_string(),
        None => node.to_string(),
    };
    eprintln!("Published {} ({} bytes)", context, bytes.len());
    println!("{}", location);
}

pub fn cmd_deps(manager: &RepositoryManager, module: String, version: String) {
    let context = context(module, Some(version), ArtifactKind::Car);
    let deps = match manager.dependencies(&context) {
        Ok(Some(deps)) => deps,
        Ok(None) => {
            eprintln!("No module descriptor for {}", context);
            return;
        }
        Err(e) => fail(e),
    };
    if deps.is_empty() {
        eprintln!("{} declares no dependencies", context);
        return;
    }
    for dep in &deps {
        println!("{}/{}", dep.name, dep.version);
    }
}
