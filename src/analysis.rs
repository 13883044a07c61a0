//! Aggregations over hydrated rankings.
//!
//! - best performance: top-N games by sunk ships, grouped by player credential
//! - cannon placements: games grouped by per-column cannon counts, ordered by
//!   average escaped ships
//!
//! Both write plain CSV lines without a header row.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use crate::client::{Client, Connector, Pagination};
use crate::rank::RankingKey;
use crate::record::{Cannon, GameView};

/// Number of board columns a cannon may be placed in (1-based).
pub const BOARD_COLUMNS: usize = 8;
/// Games considered by the best-performance analysis.
pub const TOP_GAMES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    BestPerformance,
    CannonPlacements,
}

impl AnalysisKind {
    pub fn ranking(self) -> RankingKey {
        match self {
            AnalysisKind::BestPerformance => RankingKey::Sunk,
            AnalysisKind::CannonPlacements => RankingKey::Escaped,
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "best-performance" => Ok(AnalysisKind::BestPerformance),
            "2" | "cannon-placements" => Ok(AnalysisKind::CannonPlacements),
            other => Err(anyhow!(
                "invalid analysis '{}': use best-performance|cannon-placements (or 1|2)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GasStats {
    pub gas: String,
    pub count: usize,
    pub avg_sunk: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacementStats {
    pub placement: String,
    pub count: usize,
    pub avg_escaped: f64,
}

/// Top `top` games by sunk ships (ties keep input order), grouped by `gas`
/// in order of first appearance.
pub fn best_performance(views: &[GameView], top: usize) -> Vec<GasStats> {
    let mut ranked: Vec<(&str, i64)> = views
        .iter()
        .map(|v| {
            (
                v.game_stats.gas.as_deref().unwrap_or(""),
                v.game_stats.sunk_ships.unwrap_or(0),
            )
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(top);

    let mut order: Vec<(String, usize, i64)> = Vec::new();
    let mut pos: HashMap<&str, usize> = HashMap::new();
    for (gas, sunk) in ranked {
        let i = *pos.entry(gas).or_insert_with(|| {
            order.push((gas.to_string(), 0, 0));
            order.len() - 1
        });
        order[i].1 += 1;
        order[i].2 += sunk;
    }

    order
        .into_iter()
        .map(|(gas, count, total)| GasStats {
            gas,
            count,
            avg_sunk: total as f64 / count as f64,
        })
        .collect()
}

/// Per-column cannon counts as a digit string, e.g. `[[1,0],[1,3],[8,2]]` -> "20000001".
/// Columns outside 1..=8 are ignored.
pub fn placement_signature(cannons: &[Cannon]) -> String {
    let mut counts = [0usize; BOARD_COLUMNS];
    for c in cannons {
        match c.first() {
            Some(&col) if col >= 1 && (col as usize) <= BOARD_COLUMNS => counts[col as usize - 1] += 1,
            _ => {}
        }
    }
    counts.iter().map(|n| n.to_string()).collect()
}

/// Groups by placement signature, ascending by average escaped ships.
pub fn cannon_placements(views: &[GameView]) -> Vec<PlacementStats> {
    let mut order: Vec<(String, usize, i64)> = Vec::new();
    let mut pos: HashMap<String, usize> = HashMap::new();
    for v in views {
        let sig = placement_signature(&v.game_stats.cannons);
        let escaped = v.game_stats.escaped_ships.unwrap_or(0);
        let i = match pos.get(&sig) {
            Some(&i) => i,
            None => {
                order.push((sig.clone(), 0, 0));
                pos.insert(sig, order.len() - 1);
                order.len() - 1
            }
        };
        order[i].1 += 1;
        order[i].2 += escaped;
    }

    let mut out: Vec<PlacementStats> = order
        .into_iter()
        .map(|(placement, count, total)| PlacementStats {
            placement,
            count,
            avg_escaped: total as f64 / count as f64,
        })
        .collect();
    out.sort_by(|a, b| a.avg_escaped.total_cmp(&b.avg_escaped));
    out
}

/// `12` -> "12.0", `2.5` -> "2.5".
pub fn fmt_avg(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

pub fn write_gas_csv<W: Write>(w: &mut W, rows: &[GasStats]) -> std::io::Result<()> {
    for r in rows {
        writeln!(w, "{},{},{}", r.gas, r.count, fmt_avg(r.avg_sunk))?;
    }
    Ok(())
}

pub fn write_placement_csv<W: Write>(w: &mut W, rows: &[PlacementStats]) -> std::io::Result<()> {
    for r in rows {
        writeln!(w, "{},{}", r.placement, fmt_avg(r.avg_escaped))?;
    }
    Ok(())
}

/// Look up every id; ids that are unknown or fail to fetch are skipped.
pub fn hydrate<C: Connector>(client: &Client<C>, ids: &[i64]) -> Vec<GameView> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        match client.game(id) {
            Ok(Some(v)) => out.push(v),
            Ok(None) => warn!("game {} vanished between ranking and lookup", id),
            Err(e) => warn!("game {} lookup failed: {}", id, e),
        }
    }
    out
}

#[derive(Debug)]
pub struct AnalysisReport {
    pub pagination: Pagination,
    pub hydrated: usize,
    pub rows: usize,
}

/// Paginate, hydrate, aggregate and write `out`.
pub fn run_analysis<C: Connector>(
    client: &Client<C>,
    kind: AnalysisKind,
    page_size: usize,
    out: &Path,
) -> Result<AnalysisReport> {
    let pagination = client.paginate(kind.ranking(), page_size);
    if !pagination.is_complete() {
        warn!(
            "analysis runs on a partial ranking ({} id(s))",
            pagination.games.len()
        );
    }
    let views = hydrate(client, &pagination.games);

    let f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(out)
        .with_context(|| format!("open output {}", out.display()))?;
    let mut w = BufWriter::new(f);

    let rows = match kind {
        AnalysisKind::BestPerformance => {
            let rows = best_performance(&views, TOP_GAMES);
            write_gas_csv(&mut w, &rows)?;
            rows.len()
        }
        AnalysisKind::CannonPlacements => {
            let rows = cannon_placements(&views);
            write_placement_csv(&mut w, &rows)?;
            rows.len()
        }
    };
    w.flush()
        .with_context(|| format!("flush output {}", out.display()))?;

    info!(
        "{:?}: {} game(s) hydrated, {} row(s) -> {}",
        kind,
        views.len(),
        rows,
        out.display()
    );
    Ok(AnalysisReport {
        hydrated: views.len(),
        pagination,
        rows,
    })
}
