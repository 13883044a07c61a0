use anyhow::Result;

use SalvoStore::client::Client;
use SalvoStore::config::SalvoConfig;

pub fn exec(cfg: SalvoConfig, host: String, id: i64) -> Result<()> {
    let client = Client::new(host, &cfg);
    match client.game(id)? {
        Some(view) => println!("{}", serde_json::to_string_pretty(&view)?),
        None => println!("NOT FOUND game {}", id),
    }
    Ok(())
}
