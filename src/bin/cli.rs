//! codeatlas CLI - explore a codebase as a dependency graph.
//!
//! Usage:
//!   codeatlas scan                   # Scan the project, print a summary
//!   codeatlas graph                  # File dependency graph as JSON
//!   codeatlas graph --kind function  # Function call graph as JSON
//!   codeatlas file <id>              # Details for one file
//!   codeatlas stats                  # Project statistics
//!   codeatlas cycles                 # All circular import chains
//!   codeatlas dead                   # Unreferenced files and functions
//!   codeatlas clear-cache [--all]    # Drop cached scan data

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use codeatlas::{
    Atlas, AtlasConfig, CacheManager, FileStore, FsProjectSource, GraphKind, ScanOptions,
};

#[derive(Parser)]
#[command(name = "codeatlas")]
#[command(about = "Explore a codebase as a dependency graph", long_about = None)]
struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Config file (TOML); defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the cache and re-parse everything
    #[arg(long)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphKindArg {
    File,
    Function,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the project and print a summary
    Scan {
        /// Extra entry-point file ids for dead-code analysis
        #[arg(short, long)]
        entry: Vec<String>,
    },

    /// Print a dependency graph as JSON
    Graph {
        #[arg(short, long, value_enum, default_value = "file")]
        kind: GraphKindArg,
    },

    /// Details for a single file (parse record + dependencies)
    File {
        /// Project-relative file id, forward slashes
        id: String,
    },

    /// Project statistics
    Stats,

    /// All circular import chains
    Cycles,

    /// Unreferenced files and functions
    Dead,

    /// Drop cached scan data
    ClearCache {
        /// Clear every project's cache, not just this root's
        #[arg(long)]
        all: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root.canonicalize().unwrap_or(cli.root.clone());

    let config = match &cli.config {
        Some(path) => AtlasConfig::from_file(path)?,
        None => AtlasConfig::default(),
    };

    let source = FsProjectSource::new(config.effective_excluded_dirs());
    let cache = CacheManager::new(Box::new(FileStore::new(&config.cache_dir)));
    let mut atlas = Atlas::new(source, cache, config);

    // clear-cache is the only command that works without scanning.
    if let Commands::ClearCache { all } = &cli.command {
        let cleared = if *all {
            atlas.clear_cache(None)
        } else {
            atlas.clear_cache(Some(&root))
        };
        println!("{}", serde_json::json!({ "cleared_count": cleared }));
        return Ok(());
    }

    let entry_points = match &cli.command {
        Commands::Scan { entry } => entry.clone(),
        _ => Vec::new(),
    };
    let options = ScanOptions {
        no_cache: cli.no_cache,
        ..Default::default()
    };
    let summary = atlas.scan(&root, &entry_points, &options)?;

    match cli.command {
        Commands::Scan { .. } => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Graph { kind } => {
            let kind = match kind {
                GraphKindArg::File => GraphKind::File,
                GraphKindArg::Function => GraphKind::Function,
            };
            let graph = atlas.graph(kind)?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }

        Commands::File { id } => {
            let details = atlas.file_details(&id)?;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }

        Commands::Stats => {
            let stats = atlas.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Cycles => {
            let cycles = atlas.cycles()?;
            println!("{}", serde_json::to_string_pretty(&cycles)?);
        }

        Commands::Dead => {
            let dead = atlas.dead_code()?;
            println!("{}", serde_json::to_string_pretty(&dead)?);
        }

        Commands::ClearCache { .. } => unreachable!("handled before scanning"),
    }

    Ok(())
}
