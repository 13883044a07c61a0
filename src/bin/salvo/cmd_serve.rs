use anyhow::Result;
use std::path::PathBuf;

use SalvoStore::config::SalvoConfig;
use SalvoStore::server;

pub fn exec(mut cfg: SalvoConfig, listen: Option<String>, data: Option<PathBuf>) -> Result<()> {
    if let Some(addr) = listen {
        cfg = cfg.with_listen_addr(addr);
    }
    if let Some(path) = data {
        cfg = cfg.with_data_file(path);
    }
    server::serve(&cfg)
}
