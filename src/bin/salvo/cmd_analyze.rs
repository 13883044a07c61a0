use anyhow::Result;
use std::path::PathBuf;

use SalvoStore::analysis::{run_analysis, AnalysisKind};
use SalvoStore::client::Client;
use SalvoStore::config::SalvoConfig;

pub fn exec(
    mut cfg: SalvoConfig,
    host: String,
    kind: AnalysisKind,
    out: PathBuf,
    page_size: Option<usize>,
) -> Result<()> {
    if let Some(n) = page_size {
        cfg = cfg.with_page_size(n);
    }
    let client = Client::new(host, &cfg);
    let report = run_analysis(&client, kind, cfg.page_size, &out)?;
    println!(
        "{:?}: {} id(s) ranked ({}), {} hydrated, {} row(s) -> {}",
        kind,
        report.pagination.games.len(),
        if report.pagination.is_complete() { "complete" } else { "partial" },
        report.hydrated,
        report.rows,
        out.display()
    );
    Ok(())
}
