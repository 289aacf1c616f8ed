use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use typeroll_config::Workspace;
use typeroll_merge::BuildError;
use typeroll_merge::bundler::CommandBundler;
use typeroll_merge::dispatch::{BuildDispatcher, BuildOptions, BuildSummary};
use typeroll_merge::extractor::CommandExtractor;

#[derive(Debug, Parser)]
#[command(name = "typeroll", version)]
#[command(about = "Bundle monorepo packages and roll up their type declarations")]
struct Cli {
    /// Target packages, matched against package directory names. Builds every
    /// public package when omitted.
    targets: Vec<String>,
    /// Keep the bundler running in watch mode.
    #[arg(short, long)]
    watch: bool,
    /// Comma-separated output formats, overriding the bundler config.
    #[arg(short, long)]
    formats: Option<String>,
    /// Skip type checking while bundling.
    #[arg(short = 'n', long = "nocheck")]
    no_check: bool,
    /// Emit source maps.
    #[arg(short = 's', long = "sourcemap")]
    source_map: bool,
    /// Roll up declarations, merging private packages into each target.
    #[arg(short = 'm', long = "mergetypes")]
    merge_types: bool,
    /// Inline otherwise-external workspace packages into the bundle.
    #[arg(short = 'e', long = "noExternal", visible_alias = "no-external")]
    no_external: bool,
    /// Build every package matching a target pattern, not just the first.
    #[arg(short, long)]
    all: bool,
    /// Build configuration file (default: typeroll.yml in the workspace root).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Workspace root (default: current directory).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            watch: self.watch,
            formats: self.formats.clone(),
            no_check: self.no_check,
            source_map: self.source_map,
            merge_types: self.merge_types,
            no_external: self.no_external,
            all_matching: self.all,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().map_err(|err| format!("Failed to read current directory: {err}"))?,
    };
    let workspace = Workspace::load(&root, cli.config.as_deref())
        .map_err(|err| format!("Failed to load workspace '{}': {err}", root.display()))?;
    debug!(
        root = %workspace.root.display(),
        packages = workspace.registry.len(),
        "Loaded workspace"
    );

    let mut bundler = CommandBundler::new(&workspace.config.bundler, &workspace.root);
    let mut extractor = CommandExtractor::new(&workspace.config.extractor, &workspace.root);
    let mut dispatcher = BuildDispatcher::new(&workspace, &mut bundler, &mut extractor, cli.options());

    let summary = dispatcher.run(cli.targets.as_slice()).map_err(describe_build_error)?;
    print_summary(&summary);
    Ok(())
}

fn describe_build_error(err: BuildError) -> String {
    match &err {
        BuildError::MergeFailed { failed_packages, .. } if !failed_packages.is_empty() => {
            format!("{err} (failed: {})", failed_packages.join(", "))
        }
        _ => err.to_string(),
    }
}

fn print_summary(summary: &BuildSummary) {
    for target in &summary.skipped {
        eprintln!("Skipped private package {target}");
    }
    for report in &summary.merges {
        if !report.merged.is_empty() {
            println!("Merged into {}: {}", report.target, report.merged.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_build_options() {
        let cli = Cli::parse_from(["typeroll", "core", "-m", "-n", "-s", "-e", "-f", "cjs,esm", "-a"]);
        assert_eq!(cli.targets, vec!["core"]);
        let options = cli.options();
        assert!(options.merge_types);
        assert!(options.no_check);
        assert!(options.source_map);
        assert!(options.no_external);
        assert!(options.all_matching);
        assert!(!options.watch);
        assert_eq!(options.formats.as_deref(), Some("cjs,esm"));
    }

    #[test]
    fn test_long_flag_spellings() {
        let cli = Cli::parse_from(["typeroll", "--mergetypes", "--nocheck", "--sourcemap", "--no-external"]);
        assert!(cli.targets.is_empty());
        assert!(cli.merge_types && cli.no_check && cli.source_map && cli.no_external);

        let cli = Cli::parse_from(["typeroll", "--noExternal", "--watch"]);
        assert!(cli.no_external && cli.watch);
    }

    #[test]
    fn test_merge_failure_names_failed_packages() {
        let err = BuildError::MergeFailed {
            target: "core".to_string(),
            errors: 2,
            warnings: 1,
            failed_packages: vec!["@x/utils".to_string()],
        };
        assert_eq!(
            describe_build_error(err),
            "type rollup failed for core: API Extractor completed with 2 errors and 1 warnings (failed: @x/utils)"
        );
    }
}
