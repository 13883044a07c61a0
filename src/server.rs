//! HTTP front of the ranking and lookup services (tiny_http, single accept loop).
//!
//! Routes:
//!   GET /api/game/{id}
//!   GET /api/rank/{sunk|escaped}?limit=&start=
//!   GET /health
//!   GET /metrics
//!
//! Every response carries Content-Length; chunked transfer encoding is
//! disabled so clients can frame bodies by length alone.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use tiny_http::{Header, Response, Server};

use crate::config::SalvoConfig;
use crate::error::ServiceError;
use crate::lookup::LookupService;
use crate::metrics;
use crate::rank::{RankingKey, RankingService};
use crate::store::RecordStore;

/// Routing result, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn json(status: u16, v: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: v.to_string(),
        }
    }

    fn text(status: u16, body: String, content_type: &'static str) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    fn service_error(e: &ServiceError) -> Self {
        Self::json(e.status_code(), &e.to_body())
    }
}

pub struct App {
    ranking: RankingService,
    lookup: LookupService,
}

impl App {
    pub fn new(store: Arc<RecordStore>, cfg: &SalvoConfig) -> Self {
        Self {
            ranking: RankingService::with_limits(store.clone(), cfg.default_limit, cfg.max_limit),
            lookup: LookupService::new(store),
        }
    }

    pub fn ranking(&self) -> &RankingService {
        &self.ranking
    }

    pub fn route(&self, method: &str, url: &str) -> Reply {
        metrics::record_http_request();
        let (path, query) = url.split_once('?').unwrap_or((url, ""));

        let known = path == "/health"
            || path == "/metrics"
            || path.starts_with("/api/game/")
            || path.starts_with("/api/rank/");
        if known && method != "GET" {
            return Reply::json(405, &serde_json::json!({ "error": "Method not allowed" }));
        }

        if path == "/health" {
            return Reply::text(200, "OK\n".to_string(), "text/plain");
        }
        if path == "/metrics" {
            let body = metrics::render_prometheus(self.ranking.store().len());
            return Reply::text(200, body, "text/plain; version=0.0.4");
        }

        if let Some(id) = path.strip_prefix("/api/game/") {
            return match id.parse::<i64>() {
                Ok(id) => match self.lookup.game_view(id) {
                    Ok(view) => match serde_json::to_value(&view) {
                        Ok(v) => Reply::json(200, &v),
                        Err(e) => internal_error(e),
                    },
                    Err(e) => Reply::service_error(&e),
                },
                Err(_) => not_found(),
            };
        }

        if let Some(name) = path.strip_prefix("/api/rank/") {
            let key = match name {
                "sunk" => RankingKey::Sunk,
                "escaped" => RankingKey::Escaped,
                _ => return not_found(),
            };
            return match self.ranking.rank_query(key, query) {
                Ok(page) => match serde_json::to_value(&page) {
                    Ok(v) => Reply::json(200, &v),
                    Err(e) => internal_error(e),
                },
                Err(e) => Reply::service_error(&e),
            };
        }

        not_found()
    }
}

fn not_found() -> Reply {
    Reply::json(404, &serde_json::json!({ "error": "Not found" }))
}

fn internal_error(e: serde_json::Error) -> Reply {
    warn!("response encode failed: {}", e);
    Reply::json(500, &serde_json::json!({ "error": "Internal error" }))
}

pub struct SalvoServer {
    http: Server,
    app: App,
}

impl SalvoServer {
    pub fn bind(addr: &str, app: App) -> Result<Self> {
        let http = Server::http(addr).map_err(|e| anyhow!("bind http at {}: {}", addr, e))?;
        Ok(Self { http, app })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http.server_addr().to_ip()
    }

    /// Accept loop; returns only if the listener is torn down.
    pub fn run(&self) -> Result<()> {
        if let Some(a) = self.local_addr() {
            info!("salvo listening on {}", a);
        }
        loop {
            let rq = match self.http.recv() {
                Ok(rq) => rq,
                Err(e) => {
                    warn!("http recv error: {}", e);
                    continue;
                }
            };

            let method = rq.method().as_str().to_string();
            let url = rq.url().to_string();
            let reply = self.app.route(&method, &url);
            debug!("{} {} -> {}", method, url, reply.status);

            let mut resp = Response::from_string(reply.body)
                .with_status_code(reply.status)
                .with_chunked_threshold(usize::MAX);
            if let Ok(ct) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
                resp.add_header(ct);
            }
            if let Err(e) = rq.respond(resp) {
                warn!("respond {} failed: {}", url, e);
            }
        }
    }
}

/// Load the snapshot named by the config and serve until the process exits.
pub fn serve(cfg: &SalvoConfig) -> Result<()> {
    let store = Arc::new(RecordStore::open(&cfg.data_file)?);
    let server = SalvoServer::bind(&cfg.listen_addr, App::new(store, cfg))?;
    server.run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::GameRecord;

    fn app() -> App {
        let records = [(1, 5), (2, 1), (3, 9)]
            .iter()
            .map(|&(id, sunk)| {
                let mut r = GameRecord::new(id);
                r.sunk_ships = Some(sunk);
                r.escaped_ships = Some(10 - sunk);
                r
            })
            .collect();
        App::new(Arc::new(RecordStore::from_records(records)), &SalvoConfig::default())
    }

    #[test]
    fn rank_route_body() {
        let r = app().route("GET", "/api/rank/sunk?limit=2&start=0");
        assert_eq!(r.status, 200);
        let v: serde_json::Value = serde_json::from_str(&r.body).unwrap();
        assert_eq!(v["ranking"], "sunk");
        assert_eq!(v["games"], serde_json::json!([3, 1]));
        assert!(v["prev"].is_null());
        assert_eq!(v["next"], "/api/rank/sunk?limit=2&start=2");
    }

    #[test]
    fn rank_route_rejects_bad_params() {
        let a = app();
        let r = a.route("GET", "/api/rank/escaped?limit=51");
        assert_eq!(r.status, 400);
        assert!(r.body.contains("Limit must be 50 or less"));

        let r = a.route("GET", "/api/rank/escaped?start=x");
        assert_eq!(r.status, 400);
        assert!(r.body.contains("Invalid limit or start parameter"));
    }

    #[test]
    fn game_route_statuses() {
        let a = app();
        assert_eq!(a.route("GET", "/api/game/3").status, 200);
        let r = a.route("GET", "/api/game/42");
        assert_eq!(r.status, 404);
        assert!(r.body.contains("Game not found"));
        assert_eq!(a.route("GET", "/api/game/abc").status, 404);
        assert_eq!(a.route("POST", "/api/game/3").status, 405);
        assert_eq!(a.route("GET", "/api/rank/gold").status, 404);
        assert_eq!(a.route("GET", "/").status, 404);
    }

    #[test]
    fn health_and_metrics() {
        let a = app();
        assert_eq!(a.route("GET", "/health").body, "OK\n");
        let m = a.route("GET", "/metrics");
        assert!(m.body.contains("salvo_records 3"));
        assert!(m.body.contains("salvo_http_requests_total"));
    }
}
