use std::path::Path;

use modrepo::store::verify_checksum;
use modrepo::{
    ArtifactContext, ArtifactKind, FileStore, ModuleQuery, ModuleVersionQuery, QueryKind,
    RepoConfig, Repository, RepositoryManager,
};

/// Helper: lay out `files` (relative path, contents) under `base`.
fn write_tree(base: &Path, files: &[(&str, &str)]) {
    for (path, contents) in files {
        let path = base.join(path);
        std::fs::create_dir_all(path.parent().unwrap()).expect("create dirs");
        std::fs::write(&path, contents).expect("write file");
    }
}

fn open(base: &Path) -> Repository {
    Repository::new(FileStore::open(base).expect("open store").root())
}

fn car(name: &str, version: &str) -> ArtifactContext {
    ArtifactContext::new(name, version, ArtifactKind::Car)
}

// ── publish and resolve ──

#[test]
fn test_publish_then_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let repository = open(dir.path());

    let node = repository
        .put_artifact(&car("com.example.foo", "1.0.0"), b"archive bytes")
        .unwrap();
    let on_disk = dir.path().join("com/example/foo/1.0.0/com.example.foo-1.0.0.car");
    assert_eq!(node.file_path(), Some(on_disk.as_path()));
    assert_eq!(std::fs::read(&on_disk).unwrap(), b"archive bytes");
    assert_eq!(verify_checksum(&on_disk).unwrap(), Some(true));

    // A second repository over the same directory sees it through listing.
    let fresh = open(dir.path());
    let found = fresh
        .find_artifact(&car("com.example.foo", "1.0.0"))
        .unwrap()
        .expect("artifact should resolve");
    assert_eq!(found.content_file().unwrap(), Some(on_disk.clone()));
    assert_eq!(found.content_bytes().unwrap(), Some(b"archive bytes".to_vec()));

    std::fs::write(&on_disk, b"tampered").unwrap();
    assert_eq!(verify_checksum(&on_disk).unwrap(), Some(false));
}

#[test]
fn test_missing_artifacts_resolve_to_none() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("a/1.0/a-1.0.car", "x")]);
    let repository = open(dir.path());

    assert!(repository.find_artifact(&car("a", "2.0")).unwrap().is_none());
    assert!(repository.find_artifact(&car("b", "1.0")).unwrap().is_none());
    let js = ArtifactContext::new("a", "1.0", ArtifactKind::Js);
    assert!(repository.find_artifact(&js).unwrap().is_none());
}

#[test]
fn test_new_files_visible_after_refresh() {
    let dir = tempfile::tempdir().unwrap();
    let repository = open(dir.path());
    assert!(repository.find_artifact(&car("late", "1.0")).unwrap().is_none());

    write_tree(dir.path(), &[("late/1.0/late-1.0.car", "x")]);
    assert!(repository.find_artifact(&car("late", "1.0")).unwrap().is_none());
    repository.refresh();
    assert!(repository.find_artifact(&car("late", "1.0")).unwrap().is_some());
}

// ── search and completion ──

fn sample_tree(base: &Path) {
    write_tree(
        base,
        &[
            ("com/example/foo/1.0/com.example.foo-1.0.car", "x"),
            ("com/example/foo/1.10/com.example.foo-1.10.car", "x"),
            ("com/example/foo/1.2/com.example.foo-1.2.car", "x"),
            ("com/example/foo/2.0/com.example.foo-2.0.js", "x"),
            ("com/example/bar/0.1/com.example.bar-0.1.jar", "x"),
            ("com/example/bar/0.1/module.properties", "com.example.foo=1.2\n"),
            ("com/example/bar/0.1/module-doc/index.html", "docs"),
            ("org/tools/3.0/org.tools-3.0.car", "x"),
            ("org/.cache/stale.car", "x"),
        ],
    );
}

#[test]
fn test_search_walks_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());
    let repository = open(dir.path());

    let mut result = modrepo::ModuleSearchResult::new(0);
    let page = repository
        .search_modules(&ModuleQuery::new("example", QueryKind::Jvm), &mut result)
        .unwrap();
    assert!(!page.truncated);
    insta::assert_snapshot!(result.render().trim_end(), @r"
    com.example.bar  0.1
    com.example.foo  1.0 1.2 1.10
    ");

    let mut result = modrepo::ModuleSearchResult::new(0);
    repository
        .search_modules(&ModuleQuery::new("", QueryKind::Js), &mut result)
        .unwrap();
    assert_eq!(result.names(), vec!["com.example.foo"]);
    assert_eq!(
        result.get("com.example.foo").unwrap().versions.len(),
        1,
        "only the script version counts for js"
    );
}

#[test]
fn test_complete_over_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());
    let manager = RepositoryManager::new(vec![open(dir.path())]);

    let modules = manager
        .complete_modules(&ModuleQuery::new("com.", QueryKind::Jvm))
        .unwrap();
    assert_eq!(modules.names(), vec!["com.example"]);
    let modules = manager
        .complete_modules(&ModuleQuery::new("o", QueryKind::Jvm))
        .unwrap();
    assert_eq!(modules.names(), vec!["org.tools"]);

    let versions = manager
        .complete_versions(&ModuleVersionQuery::new("com.example.foo", QueryKind::Jvm).with_prefix("1."))
        .unwrap();
    assert_eq!(versions.version_names(), vec!["1.0", "1.2", "1.10"]);
}

#[test]
fn test_dependencies_from_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    sample_tree(dir.path());
    let repository = open(dir.path());

    let context = ArtifactContext::new("com.example.bar", "0.1", ArtifactKind::Jar);
    let deps = repository.dependencies(&context).unwrap().unwrap();
    assert_eq!(deps.len(), 1);
    assert_eq!(deps[0].name, "com.example.foo");
    assert_eq!(deps[0].version, "1.2");
    assert!(repository.dependencies(&car("org.tools", "3.0")).unwrap().is_none());
}

// ── multiple repositories ──

#[test]
fn test_manager_merges_repositories() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_tree(
        first.path(),
        &[
            ("b/1.0/b-1.0.car", "x"),
            ("d/1.0/d-1.0.car", "x"),
        ],
    );
    write_tree(
        second.path(),
        &[
            ("a/1.0/a-1.0.car", "x"),
            ("b/2.0/b-2.0.car", "x"),
            ("c/1.0/c-1.0.car", "x"),
        ],
    );
    let manager = RepositoryManager::new(vec![open(first.path()), open(second.path())]);

    let all = manager
        .search_modules(&ModuleQuery::new("", QueryKind::Jvm))
        .unwrap();
    assert_eq!(all.names(), vec!["a", "b", "c", "d"]);
    assert_eq!(all.get("b").unwrap().versions.len(), 2);
    assert!(!all.has_more_results);

    let page = manager
        .search_modules(&ModuleQuery::new("", QueryKind::Jvm).paged(1, 2))
        .unwrap();
    assert_eq!(page.names(), vec!["b", "c"]);
    assert_eq!(page.start, 1);
    assert!(page.has_more_results);

    // Publishing goes to the first repository.
    manager.put_artifact(&car("e", "1.0"), b"e").unwrap();
    assert!(first.path().join("e/1.0/e-1.0.car").is_file());
    assert!(manager.find_artifact(&car("c", "1.0")).unwrap().is_some());
}

#[test]
fn test_config_opens_repositories() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("local/m/1.0/m-1.0.car", "x")]);
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        "lookup_caching = false\n\n[[repository]]\nname = \"local\"\npath = \"local\"\n",
    )
    .unwrap();

    let manager = RepoConfig::load(&config_path).unwrap().open_manager().unwrap();
    assert_eq!(manager.repositories().len(), 1);
    let versions = manager
        .complete_versions(&ModuleVersionQuery::new("m", QueryKind::Jvm))
        .unwrap();
    assert_eq!(versions.version_names(), vec!["1.0"]);
}
