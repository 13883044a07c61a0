//! Centralized configuration for SalvoStore (server and client side).
//!
//! Sources, lowest to highest precedence:
//! - built-in defaults (`SalvoConfig::default()`)
//! - environment (`SalvoConfig::from_env()`, `SALVO_*` variables)
//! - optional TOML file (`FileConfig`, see `SalvoConfig::with_file`)
//! - CLI flags (applied by the binary through the fluent setters)
//!
//! Timeouts are a hardening addition: a value of 0 disables the timeout and
//! restores the blocking behavior of a plain socket.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Largest page a ranking request may ask for.
pub const MAX_PAGE_LIMIT: usize = 50;
/// Page size used when the request carries no `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

#[derive(Clone, Debug)]
pub struct SalvoConfig {
    /// Server listen address.
    /// Env: SALVO_LISTEN (default 127.0.0.1:5000)
    pub listen_addr: String,

    /// JSON Lines record source, loaded once at startup.
    /// Env: SALVO_DATA_FILE (default scores.jsonl)
    pub data_file: PathBuf,

    /// Env: SALVO_DEFAULT_LIMIT (default 10)
    pub default_limit: usize,

    /// Upper bound for `limit`; requests above it are rejected.
    /// Env: SALVO_MAX_LIMIT (default 50)
    pub max_limit: usize,

    /// Page size the client paginator asks for.
    /// Env: SALVO_PAGE_SIZE (default 50)
    pub page_size: usize,

    /// Env: SALVO_CONNECT_TIMEOUT_MS (default 10000, 0 = none)
    pub connect_timeout_ms: u64,
    /// Env: SALVO_READ_TIMEOUT_MS (default 10000, 0 = none)
    pub read_timeout_ms: u64,
    /// Env: SALVO_WRITE_TIMEOUT_MS (default 10000, 0 = none)
    pub write_timeout_ms: u64,

    /// Bytes requested per socket read.
    /// Env: SALVO_READ_CHUNK (default 4096)
    pub read_chunk: usize,

    /// Env: SALVO_MAX_HEADER_BYTES (default 64 KiB)
    pub max_header_bytes: usize,
    /// Env: SALVO_MAX_BODY_BYTES (default 16 MiB)
    pub max_body_bytes: usize,

    /// Guard against a cursor chain that never ends.
    /// Env: SALVO_MAX_PAGES (default 100000)
    pub max_pages: usize,
}

impl Default for SalvoConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:5000".to_string(),
            data_file: PathBuf::from("scores.jsonl"),
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
            page_size: MAX_PAGE_LIMIT,
            connect_timeout_ms: 10_000,
            read_timeout_ms: 10_000,
            write_timeout_ms: 10_000,
            read_chunk: 4096,
            max_header_bytes: 64 * 1024,
            max_body_bytes: 16 * 1024 * 1024,
            max_pages: 100_000,
        }
    }
}

/// On-disk TOML layout. Every key is optional; absent keys keep the
/// value they had before the file was applied.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub listen: Option<String>,
    pub data_file: Option<PathBuf>,
    pub default_limit: Option<usize>,
    pub max_limit: Option<usize>,
    pub page_size: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub write_timeout_ms: Option<u64>,
    pub read_chunk: Option<usize>,
    pub max_header_bytes: Option<usize>,
    pub max_body_bytes: Option<usize>,
    pub max_pages: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parse TOML config {}", path.display()))
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl SalvoConfig {
    /// Defaults overridden by `SALVO_*` environment variables.
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SALVO_LISTEN") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.listen_addr = s.to_string();
            }
        }
        if let Ok(v) = std::env::var("SALVO_DATA_FILE") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.data_file = PathBuf::from(s);
            }
        }
        if let Some(n) = env_parse("SALVO_DEFAULT_LIMIT") {
            cfg.default_limit = n;
        }
        if let Some(n) = env_parse("SALVO_MAX_LIMIT") {
            cfg.max_limit = n;
        }
        if let Some(n) = env_parse("SALVO_PAGE_SIZE") {
            cfg.page_size = n;
        }
        if let Some(n) = env_parse("SALVO_CONNECT_TIMEOUT_MS") {
            cfg.connect_timeout_ms = n;
        }
        if let Some(n) = env_parse("SALVO_READ_TIMEOUT_MS") {
            cfg.read_timeout_ms = n;
        }
        if let Some(n) = env_parse("SALVO_WRITE_TIMEOUT_MS") {
            cfg.write_timeout_ms = n;
        }
        if let Some(n) = env_parse::<usize>("SALVO_READ_CHUNK") {
            cfg.read_chunk = n.max(1);
        }
        if let Some(n) = env_parse("SALVO_MAX_HEADER_BYTES") {
            cfg.max_header_bytes = n;
        }
        if let Some(n) = env_parse("SALVO_MAX_BODY_BYTES") {
            cfg.max_body_bytes = n;
        }
        if let Some(n) = env_parse("SALVO_MAX_PAGES") {
            cfg.max_pages = n;
        }

        cfg
    }

    /// Overlay values present in a TOML file.
    pub fn with_file(mut self, file: FileConfig) -> Self {
        if let Some(v) = file.listen {
            self.listen_addr = v;
        }
        if let Some(v) = file.data_file {
            self.data_file = v;
        }
        if let Some(v) = file.default_limit {
            self.default_limit = v;
        }
        if let Some(v) = file.max_limit {
            self.max_limit = v;
        }
        if let Some(v) = file.page_size {
            self.page_size = v;
        }
        if let Some(v) = file.connect_timeout_ms {
            self.connect_timeout_ms = v;
        }
        if let Some(v) = file.read_timeout_ms {
            self.read_timeout_ms = v;
        }
        if let Some(v) = file.write_timeout_ms {
            self.write_timeout_ms = v;
        }
        if let Some(v) = file.read_chunk {
            self.read_chunk = v.max(1);
        }
        if let Some(v) = file.max_header_bytes {
            self.max_header_bytes = v;
        }
        if let Some(v) = file.max_body_bytes {
            self.max_body_bytes = v;
        }
        if let Some(v) = file.max_pages {
            self.max_pages = v;
        }
        self
    }

    // Fluent setters for CLI overrides.

    pub fn with_listen_addr<S: Into<String>>(mut self, addr: S) -> Self {
        self.listen_addr = addr.into();
        self
    }

    pub fn with_data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = path.into();
        self
    }

    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n;
        self
    }

    pub fn with_read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = ms;
        self
    }

    pub fn with_read_chunk(mut self, n: usize) -> Self {
        self.read_chunk = n.max(1);
        self
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        ms_to_timeout(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        ms_to_timeout(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        ms_to_timeout(self.write_timeout_ms)
    }
}

#[inline]
fn ms_to_timeout(ms: u64) -> Option<Duration> {
    if ms == 0 {
        None
    } else {
        Some(Duration::from_millis(ms))
    }
}

impl fmt::Display for SalvoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SalvoConfig {{ \
             listen_addr: {}, \
             data_file: {}, \
             default_limit: {}, \
             max_limit: {}, \
             page_size: {}, \
             timeouts_ms(connect/read/write): {}/{}/{}, \
             read_chunk: {}, \
             max_header_bytes: {}, \
             max_body_bytes: {}, \
             max_pages: {} \
             }}",
            self.listen_addr,
            self.data_file.display(),
            self.default_limit,
            self.max_limit,
            self.page_size,
            self.connect_timeout_ms,
            self.read_timeout_ms,
            self.write_timeout_ms,
            self.read_chunk,
            self.max_header_bytes,
            self.max_body_bytes,
            self.max_pages,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_overrides_only_present_keys() {
        let file = FileConfig::parse(
            r#"
            listen = "0.0.0.0:8080"
            page_size = 20
            read_timeout_ms = 0
            "#,
        )
        .unwrap();
        let cfg = SalvoConfig::default().with_file(file);
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.page_size, 20);
        assert!(cfg.read_timeout().is_none());
        assert_eq!(cfg.max_limit, MAX_PAGE_LIMIT);
        assert_eq!(cfg.connect_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("colour = \"red\"").is_err());
    }
}
