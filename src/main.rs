use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use modrepo::{ArtifactKind, QueryKind};

mod cli;

use cli::publish::{cmd_deps, cmd_publish, cmd_resolve};
use cli::search::{cmd_complete, cmd_search, cmd_versions};

#[derive(Parser)]
#[command(
    name = "modrepo",
    version,
    about = "Module repository: resolve, publish and search module artifacts"
)]
struct Cli {
    /// Config file (default: $MODREPO_CONFIG or ~/.modrepo/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Repository directory, repeatable; the first one has priority and
    /// receives published artifacts
    #[arg(long = "repo", global = true, value_name = "DIR")]
    repos: Vec<PathBuf>,
    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search modules by name
    Search {
        /// Text to look for (case-insensitive)
        query: String,
        /// Artifact family: jvm, js or src
        #[arg(long, default_value = "jvm")]
        kind: QueryKind,
        /// Index of the first match to show
        #[arg(long, default_value_t = 0)]
        start: u64,
        /// Maximum number of matches to show
        #[arg(long)]
        count: Option<u64>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// List versions of a module
    Versions {
        /// Module name, e.g. com.example.foo
        module: String,
        /// Only versions starting with this prefix
        #[arg(long)]
        prefix: Option<String>,
        /// Artifact family: jvm, js or src
        #[arg(long, default_value = "jvm")]
        kind: QueryKind,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Complete a partial module name
    Complete {
        /// Partial name; a trailing dot completes below that module path
        prefix: String,
        /// Artifact family: jvm, js or src
        #[arg(long, default_value = "jvm")]
        kind: QueryKind,
    },
    /// Locate an artifact
    Resolve {
        /// Module name
        module: String,
        /// Module version (omit for the default module)
        version: Option<String>,
        /// Artifact kind: car, jar, js, src, docs, docs-zip
        #[arg(long, default_value = "car")]
        suffix: ArtifactKind,
    },
    /// Store an artifact in the first repository
    Publish {
        /// Module name
        module: String,
        /// Module version
        version: String,
        /// File to publish
        file: PathBuf,
        /// Artifact kind: car, jar, js, src, docs, docs-zip
        #[arg(long, default_value = "car")]
        suffix: ArtifactKind,
    },
    /// Show dependencies declared in module.properties
    Deps {
        /// Module name
        module: String,
        /// Module version
        version: String,
    },
}

fn main() {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);
    let manager = cli::open_manager(cli.config.as_deref(), &cli.repos);

    match cli.command {
        Command::Search {
            query,
            kind,
            start,
            count,
            json,
        } => cmd_search(&manager, query, kind, start, count, json),
        Command::Versions {
            module,
            prefix,
            kind,
            json,
        } => cmd_versions(&manager, module, prefix, kind, json),
        Command::Complete { prefix, kind } => cmd_complete(&manager, prefix, kind),
        Command::Resolve {
            module,
            version,
            suffix,
        } => cmd_resolve(&manager, module, version, suffix),
        Command::Publish {
            module,
            version,
            file,
            suffix,
        } => cmd_publish(&manager, module, version, file, suffix),
        Command::Deps { module, version } => cmd_deps(&manager, module, version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_help_names_only_matching() {
        // The binary registers no metadata extractor, so only names match.
        let cli = Cli::command();
        let search = cli.find_subcommand("search").unwrap();
        let about = search.get_about().map(|about| about.to_string());
        assert_eq!(about.as_deref(), Some("Search modules by name"));
    }
}
