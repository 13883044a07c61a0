use clap::{Parser, Subcommand};
use std::path::PathBuf;

use SalvoStore::analysis::AnalysisKind;
use SalvoStore::rank::RankingKey;

/// SalvoStore: ranked game records over HTTP (server and protocol client)
#[derive(Parser, Debug)]
#[command(name = "salvo", version, about = "SalvoStore CLI")]
pub struct Cli {
    /// Config file (TOML). CLI flags override config values, config overrides SALVO_* env.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Load the JSON Lines record file and serve the HTTP API
    Serve {
        /// Listen address, e.g. 0.0.0.0:5000
        #[arg(long)]
        listen: Option<String>,
        /// Record source (one JSON object per line)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Fetch a full ranking by following the server's cursors
    ///
    /// Example:
    ///   salvo rank --host 127.0.0.1:5000 --key escaped --page-size 20
    Rank {
        /// Server as ip:port
        #[arg(long)]
        host: String,
        /// sunk|escaped
        #[arg(long, default_value = "sunk")]
        key: RankingKey,
        #[arg(long)]
        page_size: Option<usize>,
        /// JSON output (single object)
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Look up a single game by id
    Game {
        #[arg(long)]
        host: String,
        #[arg(long)]
        id: i64,
    },
    /// Run an analysis over a full ranking and write CSV
    Analyze {
        #[arg(long)]
        host: String,
        /// best-performance|cannon-placements (or 1|2)
        #[arg(long)]
        kind: AnalysisKind,
        /// Output CSV file
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        page_size: Option<usize>,
    },
}
