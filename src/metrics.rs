//! Lightweight global metrics for SalvoStore.
//!
//! Process-wide atomic counters:
//! - server: requests, rank pages, lookups, 404/400 outcomes
//! - client: exchanges, pages fetched, transport/framing failures, partial paginations
//!
//! Rendered in Prometheus text format by `render_prometheus` (served at /metrics).

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Server -----
static HTTP_REQUESTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static RANK_PAGES_SERVED: AtomicU64 = AtomicU64::new(0);
static LOOKUPS_TOTAL: AtomicU64 = AtomicU64::new(0);
static LOOKUPS_NOT_FOUND: AtomicU64 = AtomicU64::new(0);
static VALIDATION_ERRORS: AtomicU64 = AtomicU64::new(0);

// ----- Client -----
static CLIENT_EXCHANGES: AtomicU64 = AtomicU64::new(0);
static CLIENT_BODY_BYTES: AtomicU64 = AtomicU64::new(0);
static CLIENT_PAGES_FETCHED: AtomicU64 = AtomicU64::new(0);
static CLIENT_TRANSPORT_ERRORS: AtomicU64 = AtomicU64::new(0);
static CLIENT_FRAMING_ERRORS: AtomicU64 = AtomicU64::new(0);
static CLIENT_PARTIAL_PAGINATIONS: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub http_requests_total: u64,
    pub rank_pages_served: u64,
    pub lookups_total: u64,
    pub lookups_not_found: u64,
    pub validation_errors: u64,

    pub client_exchanges: u64,
    pub client_body_bytes: u64,
    pub client_pages_fetched: u64,
    pub client_transport_errors: u64,
    pub client_framing_errors: u64,
    pub client_partial_paginations: u64,
}

impl MetricsSnapshot {
    pub fn lookup_hit_ratio(&self) -> f64 {
        if self.lookups_total == 0 {
            0.0
        } else {
            (self.lookups_total - self.lookups_not_found.min(self.lookups_total)) as f64
                / self.lookups_total as f64
        }
    }
}

// ----- Recorders (server) -----
pub fn record_http_request() {
    HTTP_REQUESTS_TOTAL.fetch_add(1, Ordering::Relaxed);
}
pub fn record_rank_page() {
    RANK_PAGES_SERVED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_lookup() {
    LOOKUPS_TOTAL.fetch_add(1, Ordering::Relaxed);
}
pub fn record_not_found() {
    LOOKUPS_NOT_FOUND.fetch_add(1, Ordering::Relaxed);
}
pub fn record_validation_error() {
    VALIDATION_ERRORS.fetch_add(1, Ordering::Relaxed);
}

// ----- Recorders (client) -----
pub fn record_client_exchange(body_len: usize) {
    CLIENT_EXCHANGES.fetch_add(1, Ordering::Relaxed);
    CLIENT_BODY_BYTES.fetch_add(body_len as u64, Ordering::Relaxed);
}
pub fn record_page_fetched() {
    CLIENT_PAGES_FETCHED.fetch_add(1, Ordering::Relaxed);
}
pub fn record_transport_error() {
    CLIENT_TRANSPORT_ERRORS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_framing_error() {
    CLIENT_FRAMING_ERRORS.fetch_add(1, Ordering::Relaxed);
}
pub fn record_partial_pagination() {
    CLIENT_PARTIAL_PAGINATIONS.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot / Reset -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        http_requests_total: HTTP_REQUESTS_TOTAL.load(Ordering::Relaxed),
        rank_pages_served: RANK_PAGES_SERVED.load(Ordering::Relaxed),
        lookups_total: LOOKUPS_TOTAL.load(Ordering::Relaxed),
        lookups_not_found: LOOKUPS_NOT_FOUND.load(Ordering::Relaxed),
        validation_errors: VALIDATION_ERRORS.load(Ordering::Relaxed),

        client_exchanges: CLIENT_EXCHANGES.load(Ordering::Relaxed),
        client_body_bytes: CLIENT_BODY_BYTES.load(Ordering::Relaxed),
        client_pages_fetched: CLIENT_PAGES_FETCHED.load(Ordering::Relaxed),
        client_transport_errors: CLIENT_TRANSPORT_ERRORS.load(Ordering::Relaxed),
        client_framing_errors: CLIENT_FRAMING_ERRORS.load(Ordering::Relaxed),
        client_partial_paginations: CLIENT_PARTIAL_PAGINATIONS.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    HTTP_REQUESTS_TOTAL.store(0, Ordering::Relaxed);
    RANK_PAGES_SERVED.store(0, Ordering::Relaxed);
    LOOKUPS_TOTAL.store(0, Ordering::Relaxed);
    LOOKUPS_NOT_FOUND.store(0, Ordering::Relaxed);
    VALIDATION_ERRORS.store(0, Ordering::Relaxed);

    CLIENT_EXCHANGES.store(0, Ordering::Relaxed);
    CLIENT_BODY_BYTES.store(0, Ordering::Relaxed);
    CLIENT_PAGES_FETCHED.store(0, Ordering::Relaxed);
    CLIENT_TRANSPORT_ERRORS.store(0, Ordering::Relaxed);
    CLIENT_FRAMING_ERRORS.store(0, Ordering::Relaxed);
    CLIENT_PARTIAL_PAGINATIONS.store(0, Ordering::Relaxed);
}

fn push_metric(out: &mut String, name: &str, kind: &str, help: &str, value: impl std::fmt::Display) {
    out.push_str(&format!("# HELP {} {}\n", name, help));
    out.push_str(&format!("# TYPE {} {}\n", name, kind));
    out.push_str(&format!("{} {}\n", name, value));
}

/// Prometheus exposition text. `records` is the size of the served snapshot.
pub fn render_prometheus(records: usize) -> String {
    let m = snapshot();
    let mut out = String::new();

    let ver = env!("CARGO_PKG_VERSION");
    out.push_str("# HELP salvo_build_info Build info.\n");
    out.push_str("# TYPE salvo_build_info gauge\n");
    out.push_str(&format!("salvo_build_info{{version=\"{}\"}} 1\n", ver));

    push_metric(&mut out, "salvo_records", "gauge", "Records in the loaded snapshot.", records);

    // --- Server ---
    push_metric(&mut out, "salvo_http_requests_total", "counter", "HTTP requests handled.", m.http_requests_total);
    push_metric(&mut out, "salvo_rank_pages_served_total", "counter", "Ranking pages served.", m.rank_pages_served);
    push_metric(&mut out, "salvo_lookups_total", "counter", "Game lookups.", m.lookups_total);
    push_metric(&mut out, "salvo_lookups_not_found_total", "counter", "Game lookups for unknown ids.", m.lookups_not_found);
    push_metric(&mut out, "salvo_lookup_hit_ratio", "gauge", "Lookup hit ratio (percent).", format!("{:.2}", m.lookup_hit_ratio() * 100.0));
    push_metric(&mut out, "salvo_validation_errors_total", "counter", "Rejected ranking parameters.", m.validation_errors);

    // --- Client ---
    push_metric(&mut out, "salvo_client_exchanges_total", "counter", "Completed request/response exchanges.", m.client_exchanges);
    push_metric(&mut out, "salvo_client_body_bytes_total", "counter", "Response body bytes received.", m.client_body_bytes);
    push_metric(&mut out, "salvo_client_pages_fetched_total", "counter", "Ranking pages fetched by the paginator.", m.client_pages_fetched);
    push_metric(&mut out, "salvo_client_transport_errors_total", "counter", "Connect/read/write failures.", m.client_transport_errors);
    push_metric(&mut out, "salvo_client_framing_errors_total", "counter", "Malformed responses.", m.client_framing_errors);
    push_metric(&mut out, "salvo_client_partial_paginations_total", "counter", "Paginations stopped before the last page.", m.client_partial_paginations);

    out
}
