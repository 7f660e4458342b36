pub mod publish;
pub mod search;

use std::path::{Path, PathBuf};
use std::process;

use modrepo::{RepoConfig, RepositoryManager};
use serde::Serialize;
use tracing::Level;

/// Install the stderr log subscriber. Warnings only unless `-v` is given.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Open every configured repository, or exit. No metadata extractor is
/// registered, so searches match module names only.
pub fn open_manager(config: Option<&Path>, repos: &[PathBuf]) -> RepositoryManager {
    let config = match RepoConfig::discover(config) {
        Ok(c) => c,
        Err(e) => fail(e),
    };
    match config.with_repository_dirs(repos).open_manager() {
        Ok(manager) => manager,
        Err(e) => fail(e),
    }
}

pub fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", error);
    process::exit(1);
}

pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("cannot serialize output: {}", e)),
    }
}
