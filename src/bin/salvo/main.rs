use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::{debug, error};
use std::path::Path;

use SalvoStore::config::{FileConfig, SalvoConfig};

mod cli;
mod cmd_serve;
mod cmd_rank;
mod cmd_game;
mod cmd_analyze;

fn init_logger() {
    // RUST_LOG overrides; default level is info.
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SalvoConfig> {
    let mut cfg = SalvoConfig::from_env();
    if let Some(p) = path {
        cfg = cfg.with_file(FileConfig::load(p)?);
    }
    debug!("{}", cfg);
    Ok(cfg)
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        cli::Cmd::Serve { listen, data } =>
            cmd_serve::exec(cfg, listen, data),

        cli::Cmd::Rank { host, key, page_size, json } =>
            cmd_rank::exec(cfg, host, key, page_size, json),

        cli::Cmd::Game { host, id } =>
            cmd_game::exec(cfg, host, id),

        cli::Cmd::Analyze { host, kind, out, page_size } =>
            cmd_analyze::exec(cfg, host, kind, out, page_size),
    }
}
