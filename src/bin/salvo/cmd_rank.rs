use anyhow::{anyhow, Result};

use SalvoStore::client::{Client, StopReason};
use SalvoStore::config::SalvoConfig;
use SalvoStore::rank::RankingKey;

pub fn exec(
    mut cfg: SalvoConfig,
    host: String,
    key: RankingKey,
    page_size: Option<usize>,
    json: bool,
) -> Result<()> {
    if let Some(n) = page_size {
        cfg = cfg.with_page_size(n);
    }
    let client = Client::new(host, &cfg);
    let p = client.paginate(key, cfg.page_size);

    let stop = match &p.stop {
        StopReason::Exhausted => "exhausted".to_string(),
        StopReason::EmptyResponse => "empty-response".to_string(),
        StopReason::PageLimit => "page-limit".to_string(),
        StopReason::Failed(e) => format!("error: {}", e),
    };

    if json {
        let obj = serde_json::json!({
            "ranking": key.name(),
            "complete": p.is_complete(),
            "pages": p.pages_fetched,
            "stop": stop,
            "games": p.games,
        });
        println!("{}", serde_json::to_string_pretty(&obj)?);
    } else {
        println!("ranking:  {}", key);
        println!("pages:    {}", p.pages_fetched);
        println!("games:    {}", p.games.len());
        println!("stop:     {}", stop);
        for id in &p.games {
            println!("{}", id);
        }
    }

    // best-effort: a partial list is printed, but nothing at all is an error
    if p.pages_fetched == 0 {
        return Err(anyhow!("no page could be fetched ({})", stop));
    }
    Ok(())
}
