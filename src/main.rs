use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use deptree::core::config::parse_alias;
use deptree::core::{traverse, BuildConfig, DependencyOutput, OutputMode, TraversalConfig, TsPaths};
use deptree::formatters::{DirectoryView, JsonFormatter, PrettyTreeFormatter};
use deptree::logger::init_logger;
use deptree::parsers::extract_exports;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "deptree",
    version,
    author = "deptree developers",
    about = "Dependency trees and export listings for JavaScript and TypeScript"
)]
struct Cli {
    /// Entry file whose dependencies are traversed
    #[arg(value_name = "FILENAME")]
    filename: PathBuf,

    /// Project directory used to resolve bare and aliased specifiers
    #[arg(short, long, value_name = "PATH", default_value = ".")]
    directory: PathBuf,

    /// Print a build-ordered list instead of a tree
    #[arg(
        long,
        value_enum,
        value_name = "PATHS",
        num_args = 0..=1,
        default_missing_value = "absolute"
    )]
    list_form: Option<ListForm>,

    /// Print the tree like the `tree` command; `symbols` adds each file's exports
    #[arg(
        long,
        value_enum,
        value_name = "TYPE",
        num_args = 0..=1,
        default_missing_value = "plain",
        conflicts_with = "list_form"
    )]
    pretty_tree: Option<PrettyTree>,

    /// Print the build-ordered list folded into its directories
    #[arg(long, conflicts_with_all = ["list_form", "pretty_tree"])]
    directory_view: bool,

    /// Print the exports of FILENAME as JSON instead of its dependencies
    #[arg(long, conflicts_with_all = ["list_form", "pretty_tree", "directory_view"])]
    exports: bool,

    /// Skip dependencies that live in node_modules
    #[arg(long)]
    ignore_node_modules: bool,

    /// tsconfig.json providing baseUrl and paths, `extends` chains included
    #[arg(long, value_name = "PATH")]
    ts_config: Option<PathBuf>,

    /// Bundler alias, repeatable; replaces webpack's `resolve.alias`
    #[arg(short, long = "alias", value_name = "NAME=PATH", value_parser = parse_alias_arg)]
    aliases: Vec<(String, PathBuf)>,

    /// Resolve TypeScript imports to `.js` siblings instead of `.d.ts`
    #[arg(long)]
    no_type_definitions: bool,

    /// package.json field naming a package's entry file
    #[arg(long, value_name = "FIELD", default_value = "main")]
    package_entry: String,

    /// Warn about every import that could not be resolved
    #[arg(long)]
    show_unresolved: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum ListForm {
    Absolute,
    Relative,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
#[value(rename_all = "kebab-case")]
enum PrettyTree {
    Plain,
    Symbols,
}

fn parse_alias_arg(raw: &str) -> Result<(String, PathBuf), String> {
    parse_alias(raw).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, cli.quiet);
    run(cli)
}

fn build_config(cli: &Cli) -> Result<BuildConfig> {
    let mut build = BuildConfig::new()
        .with_no_type_definitions(cli.no_type_definitions)
        .with_package_entry(cli.package_entry.clone());

    for (name, target) in &cli.aliases {
        build = build.with_alias(name.clone(), target.clone());
    }

    if let Some(ts_config) = &cli.ts_config {
        let ts_paths = TsPaths::load(ts_config)
            .with_context(|| format!("loading {}", ts_config.display()))?;
        build = build.with_ts_paths(ts_paths);
    }

    Ok(build)
}

fn run(cli: Cli) -> Result<()> {
    let build = build_config(&cli)?;

    let output_mode = match cli.list_form {
        Some(ListForm::Absolute) => OutputMode::ListAbsolute,
        Some(ListForm::Relative) => OutputMode::ListRelative,
        None if cli.directory_view => OutputMode::ListAbsolute,
        None => OutputMode::Tree,
    };

    let config = TraversalConfig::new(&cli.filename, &cli.directory)?
        .with_output_mode(output_mode)
        .with_ignore_node_modules(cli.ignore_node_modules)
        .with_build(build);

    if cli.exports {
        let symbols = extract_exports(&config.filename);
        println!("{}", JsonFormatter::new().format_symbols(&symbols)?);
        return Ok(());
    }

    let report = traverse(&config);

    if cli.show_unresolved {
        for specifier in &report.unresolved {
            tracing::warn!("unresolved import: {specifier}");
        }
    }

    match &report.output {
        DependencyOutput::List(list) if cli.directory_view => {
            let view = DirectoryView::build(list)?;
            println!("{}", view.render());
        }
        DependencyOutput::List(list) => {
            for path in list {
                println!("{}", path.display());
            }
        }
        DependencyOutput::Tree(tree) => match cli.pretty_tree {
            Some(kind) => {
                let formatter =
                    PrettyTreeFormatter::new().with_symbols(kind == PrettyTree::Symbols);
                println!("{}", formatter.format(tree));
            }
            None => println!("{}", JsonFormatter::new().format(&report.output)?),
        },
    }

    Ok(())
}
