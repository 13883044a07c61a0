// tests/pagination_e2e.rs
//
// End to end over real sockets: in-process tiny_http server on an ephemeral
// port, protocol client with its own framer.
//
// Covers:
// - concatenating all pages from start=0 reproduces the full ordering (both keys)
// - [5, 1, 9] descending scenario, prev/next paths
// - limit 50 accepted, 51 rejected with a 400 body
// - unknown id -> absence, not a transport error
// - record file loaded from disk and served as-is
//
// Run:
//   cargo test --test pagination_e2e -- --nocapture

use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use oorandom::Rand64;

use SalvoStore::analysis::{run_analysis, AnalysisKind};
use SalvoStore::{App, Client, GameRecord, RankingKey, RecordStore, SalvoConfig, SalvoServer};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("salvotest-e2e-{prefix}-{pid}-{t}-{id}"))
}

fn start_server(store: RecordStore) -> Result<(SocketAddr, Arc<RecordStore>)> {
    let store = Arc::new(store);
    let server = SalvoServer::bind("127.0.0.1:0", App::new(store.clone(), &SalvoConfig::default()))?;
    let addr = server
        .local_addr()
        .ok_or_else(|| anyhow::anyhow!("server has no ip address"))?;
    thread::spawn(move || {
        let _ = server.run();
    });
    Ok((addr, store))
}

fn random_records(seed: u128, n: usize) -> Vec<GameRecord> {
    let mut rng = Rand64::new(seed);
    (0..n)
        .map(|i| {
            let mut r = GameRecord::new(1000 + i as i64);
            // narrow value range -> plenty of ties
            if rng.rand_range(0..10) != 0 {
                r.sunk_ships = Some(rng.rand_range(0..6) as i64);
            }
            if rng.rand_range(0..10) != 0 {
                r.escaped_ships = Some(rng.rand_range(0..6) as i64);
            }
            r.auth = Some(format!("team-{}", rng.rand_range(0..4)));
            r.cannons = (0..3)
                .map(|_| vec![rng.rand_range(1..9) as i64, rng.rand_range(0..8) as i64])
                .collect();
            r
        })
        .collect()
}

#[test]
fn pages_concatenate_to_full_ordering() -> Result<()> {
    let records = random_records(0x5A1F0, 137);
    let (addr, store) = start_server(RecordStore::from_records(records))?;
    let ranking = SalvoStore::RankingService::new(store);
    let client = Client::new(addr.to_string(), &SalvoConfig::default());

    for key in RankingKey::ALL {
        for page_size in [1usize, 7, 50] {
            let p = client.paginate(key, page_size);
            assert!(p.is_complete(), "{:?}/{}: {:?}", key, page_size, p.stop);
            assert_eq!(p.games, ranking.ordered(key), "{:?}/{}", key, page_size);
            let expected_pages = ((ranking.total(key) + page_size - 1) / page_size).max(1);
            assert_eq!(p.pages_fetched, expected_pages);
        }
    }
    Ok(())
}

#[test]
fn three_record_scenario_over_the_wire() -> Result<()> {
    let records = [(1, 5), (2, 1), (3, 9)]
        .iter()
        .map(|&(id, sunk)| {
            let mut r = GameRecord::new(id);
            r.sunk_ships = Some(sunk);
            r
        })
        .collect();
    let (addr, _) = start_server(RecordStore::from_records(records))?;
    let client = Client::new(addr.to_string(), &SalvoConfig::default());

    let resp = client
        .exchange("/api/rank/sunk?limit=2&start=0")?
        .expect("non-empty response");
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.body["ranking"], "sunk");
    assert_eq!(resp.body["games"], serde_json::json!([3, 1]));
    assert!(resp.body["prev"].is_null());
    assert_eq!(resp.body["next"], "/api/rank/sunk?limit=2&start=2");

    let p = client.paginate(RankingKey::Sunk, 2);
    assert_eq!(p.games, vec![3, 1, 2]);
    assert_eq!(p.pages_fetched, 2);
    Ok(())
}

#[test]
fn limit_boundary_over_the_wire() -> Result<()> {
    let (addr, _) = start_server(RecordStore::from_records(random_records(7, 10)))?;
    let client = Client::new(addr.to_string(), &SalvoConfig::default());

    let ok = client.exchange("/api/rank/escaped?limit=50")?.expect("response");
    assert_eq!(ok.status(), 200);
    assert_eq!(ok.body["limit"], 50);
    assert_eq!(ok.body["start"], 0);

    let bad = client.exchange("/api/rank/escaped?limit=51")?.expect("response");
    assert_eq!(bad.status(), 400);
    assert_eq!(bad.error_message(), "Limit must be 50 or less");

    let bad = client.exchange("/api/rank/sunk?limit=ten")?.expect("response");
    assert_eq!(bad.status(), 400);
    assert_eq!(bad.error_message(), "Invalid limit or start parameter");

    // paginator with an oversized page: nothing fetched, reason kept
    let p = client.paginate(RankingKey::Sunk, 51);
    assert!(p.games.is_empty());
    assert!(p.error().is_some());
    Ok(())
}

#[test]
fn unknown_game_is_absence() -> Result<()> {
    let (addr, _) = start_server(RecordStore::from_records(random_records(9, 5)))?;
    let client = Client::new(addr.to_string(), &SalvoConfig::default());

    assert!(client.game(42)?.is_none());
    let v = client.game(1002)?.expect("known id");
    assert_eq!(v.game_id, 1002);
    assert!(v.game_stats.gas.as_deref().unwrap_or("").starts_with("team-"));
    Ok(())
}

#[test]
fn serves_records_loaded_from_file_and_runs_analysis() -> Result<()> {
    let dir = unique_path("file");
    fs::create_dir_all(&dir)?;
    let data = dir.join("scores.jsonl");
    {
        let mut f = fs::File::create(&data)?;
        writeln!(f, r#"{{"id": 1, "sunk_ships": 4, "escaped_ships": 2, "auth": "a", "cannons": [[1,0],[2,0]]}}"#)?;
        writeln!(f)?;
        writeln!(f, r#"{{"id": 2, "sunk_ships": 6, "escaped_ships": 0, "auth": "b", "cannons": [[1,3],[2,1]]}}"#)?;
        writeln!(f, r#"{{"id": 3, "sunk_ships": 2, "escaped_ships": 5, "auth": "a", "cannons": [[8,0]]}}"#)?;
    }

    let (addr, _) = start_server(RecordStore::open(&data)?)?;
    let client = Client::new(addr.to_string(), &SalvoConfig::default());

    let out = dir.join("best.csv");
    let report = run_analysis(&client, AnalysisKind::BestPerformance, 2, &out)?;
    assert!(report.pagination.is_complete());
    assert_eq!(report.hydrated, 3);
    assert_eq!(fs::read_to_string(&out)?, "b,1,6.0\na,2,3.0\n");

    let out = dir.join("cannons.csv");
    run_analysis(&client, AnalysisKind::CannonPlacements, 50, &out)?;
    assert_eq!(fs::read_to_string(&out)?, "11000000,1.0\n00000001,5.0\n");

    let _ = fs::remove_dir_all(&dir);
    Ok(())
}
