use modrepo::{ModuleQuery, ModuleVersionQuery, QueryKind, RepositoryManager};

use super::{fail, print_json};

pub fn cmd_search(
    manager: &RepositoryManager,
    query: String,
    kind: QueryKind,
    start: u64,
    count: Option<u64>,
    json: bool,
) {
    let mut module_query = ModuleQuery::new(query, kind);
    module_query.start = start;
    module_query.count = count;

    let result = match manager.search_modules(&module_query) {
        Ok(r) => r,
        Err(e) => fail(e),
    };
    if json {
        print_json(&result);
        return;
    }
    if result.is_empty() {
        eprintln!("No modules match '{}'", module_query.name);
        return;
    }
    print!("{}", result.render());
    if result.has_more_results {
        eprintln!(
            "\nMore results available (next page: --start {})",
            start + result.len() as u64
        );
    }
}

pub fn cmd_versions(
    manager: &RepositoryManager,
    module: String,
    prefix: Option<String>,
    kind: QueryKind,
    json: bool,
) {
    let mut query = ModuleVersionQuery::new(module, kind);
    query.version = prefix;

    let result = match manager.complete_versions(&query) {
        Ok(r) => r,
        Err(e) => fail(e),
    };
    if json {
        print_json(&result);
        return;
    }
    if result.is_empty() {
        eprintln!("No versions of '{}' found", query.name);
        return;
    }
    for details in result.versions() {
        match &details.doc {
            Some(doc) => println!("{}  {}", details.version, doc.lines().next().unwrap_or("")),
            None => println!("{}", details.version),
        }
    }
}

pub fn cmd_complete(manager: &RepositoryManager, prefix: String, kind: QueryKind) {
    let query = ModuleQuery::new(prefix, kind);
    let result = match manager.complete_modules(&query) {
        Ok(r) => r,
        Err(e) => fail(e),
    };
    for name in result.names() {
        println!("{}", name);
    }
}
