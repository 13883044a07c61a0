#![allow(non_snake_case)]

// Base modules
pub mod config;
pub mod error;
pub mod metrics;

// Data: records and the immutable snapshot
pub mod record;
pub mod store;

// Services over the snapshot
pub mod rank;
pub mod lookup;

// Wire protocol (codec + framer) and its two ends
pub mod wire;
pub mod client;
pub mod server;

// Aggregations driven by the client
pub mod analysis;

// Convenience re-exports
pub use client::{Client, Connector, Pagination, StopReason, TcpConnector};
pub use config::{FileConfig, SalvoConfig};
pub use error::{ServiceError, WireError};
pub use lookup::LookupService;
pub use rank::{Page, RankQuery, RankingKey, RankingService};
pub use record::{GameRecord, GameView};
pub use server::{App, SalvoServer};
pub use store::RecordStore;
