use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{Registry, layer::SubscriberExt, prelude::*, util::SubscriberInitExt};

use cli::{
    SearchLimits, format_bench, format_search_result, parse_position, run_bench, run_eval,
    run_perft, run_search,
};

#[derive(Debug, Parser)]
#[command(name = jamesfish::NAME, author = jamesfish::AUTHOR, version, about = "Search, perft and evaluate chess positions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, clap::Args)]
struct LimitArgs {
    /// Deepest iteration to search.
    #[arg(long)]
    depth: Option<u8>,

    /// Stop searching after this many milliseconds.
    #[arg(long)]
    time_ms: Option<u64>,

    /// Stop searching after this many nodes.
    #[arg(long)]
    nodes: Option<u64>,

    /// Transposition table size in megabytes.
    #[arg(long, default_value_t = 64)]
    hash_mb: usize,
}

impl From<LimitArgs> for SearchLimits {
    fn from(args: LimitArgs) -> Self {
        Self {
            depth: args.depth,
            time_ms: args.time_ms,
            nodes: args.nodes,
            hash_mb: args.hash_mb,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a position for the best move.
    Search {
        /// `startpos` or a FEN, optionally followed by `moves e2e4 ...`.
        #[arg(default_value = "startpos")]
        position: String,

        /// Only consider these root moves.
        #[arg(long = "searchmove")]
        search_moves: Vec<String>,

        #[command(flatten)]
        limits: LimitArgs,
    },
    /// Count move paths of a given length.
    Perft {
        position: String,
        depth: usize,

        /// Print per-depth statistics instead of per-move counts.
        #[arg(long)]
        full: bool,
    },
    /// Print the static evaluation of a position.
    Eval {
        #[arg(default_value = "startpos")]
        position: String,
    },
    /// Search a fixed set of positions and report speed.
    Bench {
        #[arg(long, default_value_t = 5)]
        depth: u8,

        #[arg(long, default_value_t = 16)]
        hash_mb: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    enable_logging();

    match cli.command {
        Commands::Search {
            position,
            search_moves,
            limits,
        } => {
            let position = parse_position(&position)?;
            let mut limits = SearchLimits::from(limits);
            if limits.depth.is_none() && limits.time_ms.is_none() && limits.nodes.is_none() {
                limits.depth = Some(6);
            }
            let result = run_search(&position, &limits, &search_moves)?;
            println!("{}", format_search_result(&position, &result)?);
        }
        Commands::Perft {
            position,
            depth,
            full,
        } => {
            let position = parse_position(&position)?;
            println!("{}", run_perft(&position, depth, full));
        }
        Commands::Eval { position } => {
            let position = parse_position(&position)?;
            println!("{}", run_eval(&position));
        }
        Commands::Bench { depth, hash_mb } => {
            let rows = run_bench(depth, hash_mb)?;
            println!("{}", format_bench(&rows));
        }
    }
    Ok(())
}

/// Per-iteration search lines go to stdout. Everything else goes to stderr, filtered by
/// `RUST_LOG`.
fn enable_logging() {
    let search_info_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|meta| {
            meta.target() == "search_info"
        }));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_writer(io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,search_info=off")),
        );

    Registry::default()
        .with(search_info_layer)
        .with(stderr_layer)
        .init();
}
