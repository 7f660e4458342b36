use super::*;

fn details(name: &str, versions: &[&str], license: Option<&str>, authors: &[&str]) -> ModuleDetails {
    ModuleDetails {
        name: name.to_string(),
        doc: None,
        license: license.map(str::to_string),
        authors: authors.iter().map(|a| a.to_string()).collect(),
        versions: versions.iter().map(|v| VersionKey::from(*v)).collect(),
    }
}

#[test]
fn test_search_result_merges_repeated_modules() {
    let mut result = ModuleSearchResult::new(0);
    result.add_result(details("a.b", &["1.0"], Some("MIT"), &["ann"]));
    result.add_result(details("a.c", &["2.0"], None, &[]));
    result.add_result(details("a.b", &["1.2"], Some("Apache-2.0"), &["bob"]));

    assert_eq!(result.names(), vec!["a.b", "a.c"]);
    let merged = result.get("a.b").unwrap();
    assert_eq!(merged.license.as_deref(), Some("Apache-2.0"));
    assert_eq!(merged.authors.len(), 2);
    assert_eq!(merged.newest_version().map(VersionKey::as_str), Some("1.2"));
}

#[test]
fn test_older_sighting_only_fills_gaps() {
    let mut newest = details("m", &["2.0"], None, &[]);
    newest.merge(details("m", &["1.0"], Some("MIT"), &[]));
    assert_eq!(newest.license.as_deref(), Some("MIT"));

    let mut licensed = details("m", &["2.0"], Some("GPL"), &[]);
    licensed.merge(details("m", &["1.0"], Some("MIT"), &[]));
    assert_eq!(licensed.license.as_deref(), Some("GPL"));
}

#[test]
fn test_render_lists_versions_in_order() {
    let mut result = ModuleSearchResult::new(0);
    result.add_result(details("com.example.foo", &["1.10", "1.2"], Some("MIT"), &[]));
    result.add_result(details("com.example.bar", &["0.1"], None, &[]));
    insta::assert_snapshot!(result.render().trim_end(), @r"
    com.example.foo  1.2 1.10  [MIT]
    com.example.bar  0.1
    ");
}

#[test]
fn test_version_result_skips_duplicates() {
    let mut result = ModuleVersionResult::new("a.b");
    assert!(result.add_version("1.0").is_some());
    assert!(result.has_version("1.0"));
    assert!(result.add_version("1.0").is_none());

    let details = result.add_version("0.9").unwrap();
    details.apply(ModuleMetadata {
        version: Some("0.9".to_string()),
        doc: Some("docs".to_string()),
        license: None,
        authors: ["ann".to_string()].into_iter().collect(),
    });
    assert_eq!(result.version_names(), vec!["0.9", "1.0"]);
    assert_eq!(result.get("0.9").unwrap().doc.as_deref(), Some("docs"));
}

#[test]
fn test_module_result_is_sorted_set() {
    let mut result = ModuleResult::new();
    result.add_result("a.c");
    result.add_result("a.b");
    result.add_result("a.c");
    assert_eq!(result.names(), vec!["a.b", "a.c"]);
    assert_eq!(serde_json::to_string(&result).unwrap(), r#"["a.b","a.c"]"#);
}
