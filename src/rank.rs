//! Ranking service: stable ordering of game ids by a fixed field and
//! direction, windowed into pages with prev/next cursor paths.
//!
//! Orderings are computed once at construction; the snapshot never changes
//! afterwards, so a page request is a slice plus two formatted paths.
//!
//! Ties on the ranked value keep load order (stable sort).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::error::ServiceError;
use crate::metrics;
use crate::record::GameRecord;
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RankingKey {
    /// Most sunk ships first.
    Sunk,
    /// Fewest escaped ships first.
    Escaped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl RankingKey {
    pub const ALL: [RankingKey; 2] = [RankingKey::Sunk, RankingKey::Escaped];

    /// Path segment and `ranking` field value.
    pub fn name(self) -> &'static str {
        match self {
            RankingKey::Sunk => "sunk",
            RankingKey::Escaped => "escaped",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            RankingKey::Sunk => Direction::Descending,
            RankingKey::Escaped => Direction::Ascending,
        }
    }

    /// Value of the ranked field; `None` excludes the record from the ranking.
    pub fn value_of(self, r: &GameRecord) -> Option<i64> {
        match self {
            RankingKey::Sunk => r.sunk_ships,
            RankingKey::Escaped => r.escaped_ships,
        }
    }

    /// Request path of the window `[start, start+limit)`.
    pub fn page_path(self, limit: usize, start: usize) -> String {
        format!("/api/rank/{}?limit={}&start={}", self.name(), limit, start)
    }

    #[inline]
    fn slot(self) -> usize {
        match self {
            RankingKey::Sunk => 0,
            RankingKey::Escaped => 1,
        }
    }
}

impl fmt::Display for RankingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankingKey {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunk" => Ok(RankingKey::Sunk),
            "escaped" => Ok(RankingKey::Escaped),
            other => Err(anyhow::anyhow!("unknown ranking '{}': use sunk|escaped", other)),
        }
    }
}

/// One window over a ranking, serialized as the response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub ranking: String,
    pub limit: usize,
    pub start: usize,
    pub games: Vec<i64>,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// Window parameters taken from a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankQuery {
    pub start: usize,
    pub limit: usize,
}

impl RankQuery {
    /// Parse `limit`/`start` from a raw query string (without `?`).
    /// Missing values take the defaults; the first occurrence of a key wins.
    pub fn parse(query: &str, default_limit: usize) -> Result<Self, ServiceError> {
        let mut limit: Option<&str> = None;
        let mut start: Option<&str> = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            match k {
                "limit" if limit.is_none() => limit = Some(v),
                "start" if start.is_none() => start = Some(v),
                _ => {}
            }
        }

        let num = |v: Option<&str>, default: usize| -> Result<usize, ServiceError> {
            match v {
                None => Ok(default),
                Some(s) => s.trim().parse::<usize>().map_err(|_| {
                    ServiceError::Validation("Invalid limit or start parameter".to_string())
                }),
            }
        };

        Ok(RankQuery {
            limit: num(limit, default_limit)?,
            start: num(start, 0)?,
        })
    }
}

pub struct RankingService {
    store: Arc<RecordStore>,
    max_limit: usize,
    default_limit: usize,
    // ordered ids per key, indexed by RankingKey::slot
    orders: [Vec<i64>; 2],
}

impl RankingService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self::with_limits(store, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT)
    }

    pub fn with_limits(store: Arc<RecordStore>, default_limit: usize, max_limit: usize) -> Self {
        let orders = [
            order_ids(&store, RankingKey::Sunk),
            order_ids(&store, RankingKey::Escaped),
        ];
        Self {
            store,
            max_limit,
            default_limit,
            orders,
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// Number of records carrying the key's field.
    pub fn total(&self, key: RankingKey) -> usize {
        self.orders[key.slot()].len()
    }

    /// Full ordering for a key (what concatenating every page yields).
    pub fn ordered(&self, key: RankingKey) -> &[i64] {
        &self.orders[key.slot()]
    }

    pub fn rank(&self, key: RankingKey, start: usize, limit: usize) -> Result<Page, ServiceError> {
        if limit > self.max_limit {
            metrics::record_validation_error();
            return Err(ServiceError::Validation(format!(
                "Limit must be {} or less",
                self.max_limit
            )));
        }

        let ids = &self.orders[key.slot()];
        let total = ids.len();
        let lo = start.min(total);
        let hi = start.saturating_add(limit).min(total);

        let prev = if start > 0 {
            Some(key.page_path(limit, start.saturating_sub(limit)))
        } else {
            None
        };
        let next = if start.saturating_add(limit) < total {
            Some(key.page_path(limit, start + limit))
        } else {
            None
        };

        metrics::record_rank_page();
        Ok(Page {
            ranking: key.name().to_string(),
            limit,
            start,
            games: ids[lo..hi].to_vec(),
            prev,
            next,
        })
    }

    /// Parse the query string, then rank.
    pub fn rank_query(&self, key: RankingKey, query: &str) -> Result<Page, ServiceError> {
        let q = RankQuery::parse(query, self.default_limit).map_err(|e| {
            metrics::record_validation_error();
            e
        })?;
        self.rank(key, q.start, q.limit)
    }
}

fn order_ids(store: &RecordStore, key: RankingKey) -> Vec<i64> {
    let mut ranked: Vec<(i64, i64)> = store
        .records()
        .iter()
        .filter_map(|r| key.value_of(r).map(|v| (v, r.id)))
        .collect();
    // sort_by is stable: equal values keep load order in both directions
    match key.direction() {
        Direction::Descending => ranked.sort_by(|a, b| b.0.cmp(&a.0)),
        Direction::Ascending => ranked.sort_by(|a, b| a.0.cmp(&b.0)),
    }
    ranked.into_iter().map(|(_, id)| id).collect()
}
