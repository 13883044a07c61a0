//! Protocol client: one connection per exchange, cursor-driven pagination.
//!
//! The paginator follows the server's `next` path verbatim; the client never
//! builds continuation paths itself beyond the very first page. Failures stop
//! the loop and the ids gathered so far are returned together with the
//! reason (`Pagination::stop`).

use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Deserialize;

use crate::config::SalvoConfig;
use crate::error::WireError;
use crate::metrics;
use crate::rank::RankingKey;
use crate::record::GameView;
use crate::wire::{decode_response, read_response, write_request, FrameLimits, Request, Response};

/// Opens the byte stream for a single exchange.
pub trait Connector {
    type Stream: Read + Write;
    fn connect(&self) -> io::Result<Self::Stream>;
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>, cfg: &SalvoConfig) -> Self {
        Self {
            addr: addr.into(),
            connect_timeout: cfg.connect_timeout(),
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> io::Result<TcpStream> {
        let stream = match self.connect_timeout {
            None => TcpStream::connect(&self.addr)?,
            Some(t) => {
                let mut last_err = None;
                let mut found = None;
                for sa in self.addr.to_socket_addrs()? {
                    match TcpStream::connect_timeout(&sa, t) {
                        Ok(s) => {
                            found = Some(s);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match found {
                    Some(s) => s,
                    None => {
                        return Err(last_err.unwrap_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::AddrNotAvailable,
                                format!("no address resolved for {}", self.addr),
                            )
                        }))
                    }
                }
            }
        };
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(true).ok();
        Ok(stream)
    }
}

/// Why a pagination loop ended.
#[derive(Debug)]
pub enum StopReason {
    /// Last page reached (no `next`).
    Exhausted,
    /// Server closed a connection without answering.
    EmptyResponse,
    /// `max_pages` pages fetched and the chain was still going.
    PageLimit,
    Failed(WireError),
}

/// Ids in server order plus how the loop ended. Anything other than
/// `StopReason::Exhausted` means the list may be a prefix of the ranking.
#[derive(Debug)]
pub struct Pagination {
    pub games: Vec<i64>,
    pub pages_fetched: usize,
    pub stop: StopReason,
}

impl Pagination {
    pub fn is_complete(&self) -> bool {
        matches!(self.stop, StopReason::Exhausted)
    }

    pub fn error(&self) -> Option<&WireError> {
        match &self.stop {
            StopReason::Failed(e) => Some(e),
            _ => None,
        }
    }
}

// Only the two fields the loop needs; the rest of the page body is ignored.
#[derive(Debug, Deserialize)]
struct PageCursor {
    #[serde(default)]
    games: Vec<i64>,
    #[serde(default)]
    next: Option<String>,
}

pub struct Client<C: Connector = TcpConnector> {
    connector: C,
    host: String,
    limits: FrameLimits,
    max_pages: usize,
}

impl Client<TcpConnector> {
    /// `host` is `ip:port`; it is both the connect address and the Host header.
    pub fn new(host: impl Into<String>, cfg: &SalvoConfig) -> Self {
        let host = host.into();
        let connector = TcpConnector::new(host.clone(), cfg);
        Self::with_connector(connector, host, cfg)
    }
}

impl<C: Connector> Client<C> {
    pub fn with_connector(connector: C, host: impl Into<String>, cfg: &SalvoConfig) -> Self {
        Self {
            connector,
            host: host.into(),
            limits: FrameLimits::from_config(cfg),
            max_pages: cfg.max_pages.max(1),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// One request/response on a fresh connection. `Ok(None)` = empty response.
    pub fn exchange(&self, path: &str) -> Result<Option<Response>, WireError> {
        let res = self.exchange_inner(path);
        match &res {
            Err(WireError::Transport { .. }) => metrics::record_transport_error(),
            Err(WireError::Framing(_)) | Err(WireError::Decode(_)) => metrics::record_framing_error(),
            _ => {}
        }
        res
    }

    fn exchange_inner(&self, path: &str) -> Result<Option<Response>, WireError> {
        let mut stream = self
            .connector
            .connect()
            .map_err(|e| WireError::transport("connect", e))?;

        write_request(&mut stream, &Request::get(path, self.host.clone()))?;
        let raw = match read_response(&mut stream, &self.limits)? {
            Some(raw) => raw,
            None => {
                debug!("GET {}: empty response", path);
                return Ok(None);
            }
        };
        let resp = decode_response(&raw)?;
        metrics::record_client_exchange(raw.len());
        debug!("GET {} -> {} ({} bytes)", path, resp.status(), raw.len());
        Ok(Some(resp))
    }

    /// `/api/game/{id}`. Unknown id is `Ok(None)`, not an error.
    pub fn game(&self, id: i64) -> Result<Option<GameView>, WireError> {
        let path = format!("/api/game/{}", id);
        let resp = self.exchange(&path)?.ok_or(WireError::EmptyResponse)?;
        if resp.status() == 404 {
            return Ok(None);
        }
        if !resp.head.is_success() {
            return Err(WireError::Status {
                status: resp.status(),
                message: resp.error_message(),
            });
        }
        Ok(Some(serde_json::from_value(resp.body)?))
    }

    /// Full ranking for `key`, `page_size` ids per request.
    pub fn paginate(&self, key: RankingKey, page_size: usize) -> Pagination {
        self.paginate_from(key.page_path(page_size.max(1), 0))
    }

    /// Follow `next` links starting at `first_path` until the chain ends.
    pub fn paginate_from(&self, first_path: String) -> Pagination {
        let mut games = Vec::new();
        let mut pages_fetched = 0usize;
        let mut path = first_path;

        let stop = loop {
            if pages_fetched >= self.max_pages {
                break StopReason::PageLimit;
            }
            let page = match self.fetch_page(&path) {
                Ok(Some(p)) => p,
                Ok(None) => break StopReason::EmptyResponse,
                Err(e) => break StopReason::Failed(e),
            };
            pages_fetched += 1;
            metrics::record_page_fetched();
            debug!("page {} ({}): {} id(s)", pages_fetched, path, page.games.len());
            games.extend(page.games);

            match page.next {
                Some(next) => path = next,
                None => break StopReason::Exhausted,
            }
        };

        match &stop {
            StopReason::Exhausted => {
                info!("pagination complete: {} id(s) in {} page(s)", games.len(), pages_fetched)
            }
            StopReason::EmptyResponse => {
                metrics::record_partial_pagination();
                warn!(
                    "pagination stopped at {}: empty response ({} id(s) so far)",
                    path,
                    games.len()
                );
            }
            StopReason::PageLimit => {
                metrics::record_partial_pagination();
                warn!(
                    "pagination stopped after {} page(s): page limit reached",
                    pages_fetched
                );
            }
            StopReason::Failed(e) => {
                metrics::record_partial_pagination();
                if e.is_connection_lost() {
                    warn!("socket error at {}: {} ({} id(s) so far)", path, e, games.len());
                } else {
                    warn!("pagination stopped at {}: {} ({} id(s) so far)", path, e, games.len());
                }
            }
        }

        Pagination {
            games,
            pages_fetched,
            stop,
        }
    }

    fn fetch_page(&self, path: &str) -> Result<Option<PageCursor>, WireError> {
        let resp = match self.exchange(path)? {
            Some(r) => r,
            None => return Ok(None),
        };
        if !resp.head.is_success() {
            return Err(WireError::Status {
                status: resp.status(),
                message: resp.error_message(),
            });
        }
        Ok(Some(serde_json::from_value(resp.body)?))
    }
}
