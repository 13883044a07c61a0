// src/store.rs
//
// Immutable record snapshot. Built once from a JSON Lines source and then
// shared read-only (Arc) by the ranking and lookup services.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::record::GameRecord;

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<GameRecord>,
    // id -> position of the first record carrying that id
    index: HashMap<i64, usize>,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open records {}", path.display()))?;
        let store = Self::from_reader(f)
            .with_context(|| format!("load records from {}", path.display()))?;
        info!(
            "loaded {} record(s) from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// One JSON object per line; blank lines are ignored.
    pub fn from_reader<R: Read>(r: R) -> Result<Self> {
        let mut records = Vec::new();
        for (lineno, line) in BufReader::new(r).lines().enumerate() {
            let line = line.with_context(|| format!("read line {}", lineno + 1))?;
            let s = line.trim();
            if s.is_empty() {
                continue;
            }
            let rec = GameRecord::parse_line(s)
                .with_context(|| format!("parse record at line {}", lineno + 1))?;
            records.push(rec);
        }
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<GameRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (pos, r) in records.iter().enumerate() {
            if index.contains_key(&r.id) {
                warn!("duplicate record id {} at position {}; first one wins", r.id, pos);
                continue;
            }
            index.insert(r.id, pos);
        }
        Self { records, index }
    }

    #[inline]
    pub fn get(&self, id: i64) -> Option<&GameRecord> {
        self.index.get(&id).map(|&pos| &self.records[pos])
    }

    /// Records in load order.
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
