// src/lookup.rs
//
// Record lookup by id. The store keeps an id -> position index, so this is
// a hash probe rather than a scan.

use std::sync::Arc;

use crate::error::ServiceError;
use crate::metrics;
use crate::record::{GameRecord, GameView};
use crate::store::RecordStore;

pub struct LookupService {
    store: Arc<RecordStore>,
}

impl LookupService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, id: i64) -> Option<&GameRecord> {
        self.store.get(id)
    }

    /// Response body for `/api/game/{id}`.
    pub fn game_view(&self, id: i64) -> Result<GameView, ServiceError> {
        metrics::record_lookup();
        match self.store.get(id) {
            Some(r) => Ok(GameView::from(r)),
            None => {
                metrics::record_not_found();
                Err(ServiceError::NotFound(id))
            }
        }
    }
}
