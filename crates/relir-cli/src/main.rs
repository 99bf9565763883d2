#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use cmd::CmdContext;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use relir_core::config::{RelirConfig, load_config, load_project_config};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "relir: sparse, dense and hybrid retrieval over SQLite",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Index store database file. Overrides `store.path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file. Defaults to `.relir/config.toml` in the current directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }

    fn load_config(&self) -> anyhow::Result<RelirConfig> {
        let mut config = match self.config {
            Some(ref path) => load_config(path)?,
            None => load_project_config(&env::current_dir()?)?,
        };
        if let Some(ref db) = self.db {
            config.store.path.clone_from(db);
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Tables",
        about = "Create a sparse or dense table",
        long_about = "Create (or drop and recreate) a sparse text table with its BM25 index, \
                      or a dense embedding table of a fixed dimension.",
        after_help = "EXAMPLES:\n    # Text table for BM25\n    rir init-table passages --kind sparse\n\n    # 768-dimensional embedding table\n    rir init-table passage_vectors --kind dense --dim 768"
    )]
    InitTable(cmd::init_table::InitTableArgs),

    #[command(
        next_help_heading = "Tables",
        about = "Load a JSONL corpus into a table",
        long_about = "Insert or update rows from a JSONL file. Sparse tables read the \
                      `contents` field; dense tables read the `vector` field.",
        after_help = "EXAMPLES:\n    # Load passages\n    rir load passages corpus.jsonl\n\n    # Load pre-computed vectors from stdin\n    cat vectors.jsonl | rir load passage_vectors -"
    )]
    Load(cmd::load::LoadArgs),

    #[command(
        next_help_heading = "Tables",
        about = "Rebuild the BM25 index of a sparse table",
        after_help = "EXAMPLES:\n    # Rebuild after bulk edits made outside rir\n    rir index passages"
    )]
    Index(cmd::index::IndexArgs),

    #[command(
        next_help_heading = "Tables",
        about = "Embed a text corpus into a dense table",
        long_about = "Embed the `contents` of every record with the configured embedding \
                      model and store the vectors in a dense table.",
        after_help = "EXAMPLES:\n    # Create the table and embed a corpus\n    rir embed passage_vectors corpus.jsonl --create\n\n    # Smaller request batches\n    rir embed passage_vectors corpus.jsonl --batch-size 8"
    )]
    Embed(cmd::embed::EmbedArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "Count rows in a table",
        after_help = "EXAMPLES:\n    rir count passages"
    )]
    Count(cmd::count::CountArgs),

    #[command(
        next_help_heading = "Inspect",
        about = "Show whether a table is a sparse or dense index",
        after_help = "EXAMPLES:\n    rir kind passage_vectors\n\n    # Emit machine-readable output\n    rir kind passage_vectors --format json"
    )]
    Kind(cmd::kind::KindArgs),

    #[command(
        next_help_heading = "Search",
        about = "Sparse, dense or hybrid search",
        after_help = "EXAMPLES:\n    rir search sparse passages \"rank fusion\"\n    rir search hybrid passages passage_vectors \"rank fusion\""
    )]
    Search(cmd::search::SearchArgs),

    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    rir completions bash > ~/.local/share/bash-completion/completions/rir"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RELIR_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "relir=debug,info"
        } else {
            "relir=info,warn"
        })
    });

    let format = env::var("RELIR_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    // stdout carries command output; logs always go to stderr.
    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    if let Commands::Completions(ref args) = cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let ctx = CmdContext {
        config: cli.load_config()?,
        output,
    };
    debug!(store = %ctx.config.store.path.display(), "config loaded");

    match cli.command {
        Commands::InitTable(ref args) => cmd::init_table::run_init_table(args, &ctx),
        Commands::Load(ref args) => cmd::load::run_load(args, &ctx),
        Commands::Index(ref args) => cmd::index::run_index(args, &ctx),
        Commands::Embed(ref args) => cmd::embed::run_embed(args, &ctx),
        Commands::Count(ref args) => cmd::count::run_count(args, &ctx),
        Commands::Kind(ref args) => cmd::kind::run_kind(args, &ctx),
        Commands::Search(ref args) => cmd::search::run_search(args, &ctx),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = cli.output_mode();
    if let Err(err) = run(&cli, output) {
        render_error(output, &CliError::from(&err))?;
        std::process::exit(1);
    }
    Ok(())
}
