//! wire/framer: request write and response reassembly over a byte stream.
//!
//! A response is complete once the header block and exactly Content-Length
//! body bytes have been read. The framer never waits for EOF, so it behaves
//! the same on a kept-alive connection as on one the server closes.
//!
//! Short reads are normal: every read may return anything from 1 byte up to
//! the chunk size, and the loops below accumulate until the target is met.

use std::io::{ErrorKind, Read, Write};

use crate::config::SalvoConfig;
use crate::error::WireError;
use crate::wire::codec::{find_header_end, Request, ResponseHead, HEADER_TERMINATOR};

#[derive(Debug, Clone, Copy)]
pub struct FrameLimits {
    pub read_chunk: usize,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self::from_config(&SalvoConfig::default())
    }
}

impl FrameLimits {
    pub fn from_config(cfg: &SalvoConfig) -> Self {
        Self {
            read_chunk: cfg.read_chunk.max(1),
            max_header_bytes: cfg.max_header_bytes,
            max_body_bytes: cfg.max_body_bytes,
        }
    }
}

pub fn write_request<W: Write>(w: &mut W, req: &Request) -> Result<(), WireError> {
    w.write_all(&req.encode())
        .map_err(|e| WireError::transport("write", e))?;
    w.flush().map_err(|e| WireError::transport("flush", e))
}

/// Read one complete response message (header block + declared body).
///
/// Returns `Ok(None)` when the peer closes before sending a single byte.
pub fn read_response<R: Read>(r: &mut R, limits: &FrameLimits) -> Result<Option<Vec<u8>>, WireError> {
    let mut chunk = vec![0u8; limits.read_chunk.max(1)];
    let mut buf: Vec<u8> = Vec::with_capacity(chunk.len());

    // Header block. Search only the newly appended tail (plus 3 bytes of
    // overlap, a terminator may straddle two reads).
    let mut searched = 0usize;
    let header_end = loop {
        if let Some(pos) = find_header_end(&buf[searched..]) {
            break searched + pos;
        }
        searched = buf.len().saturating_sub(HEADER_TERMINATOR.len() - 1);

        if buf.len() > limits.max_header_bytes {
            return Err(WireError::framing(format!(
                "header block exceeds {} bytes",
                limits.max_header_bytes
            )));
        }

        let n = read_some(r, &mut chunk)?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(WireError::framing(format!(
                "connection closed inside header block after {} bytes",
                buf.len()
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = ResponseHead::parse(&buf[..header_end])?;
    let body_len = head.content_length()?;
    if body_len > limits.max_body_bytes {
        return Err(WireError::framing(format!(
            "Content-Length {} exceeds limit {}",
            body_len, limits.max_body_bytes
        )));
    }

    let total = header_end + HEADER_TERMINATOR.len() + body_len;
    // one request per connection: anything past the body is not ours
    buf.truncate(total);
    buf.reserve(total - buf.len());

    while buf.len() < total {
        let want = (total - buf.len()).min(chunk.len());
        let n = read_some(r, &mut chunk[..want])?;
        if n == 0 {
            let got = buf.len() - (header_end + HEADER_TERMINATOR.len());
            return Err(WireError::framing(format!(
                "connection closed after {} of {} body bytes",
                got, body_len
            )));
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(buf))
}

fn read_some<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, WireError> {
    loop {
        match r.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(WireError::transport("read", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Hands out pre-cut pieces, one per read call.
    struct Pieces {
        pieces: VecDeque<io::Result<Vec<u8>>>,
    }

    impl Pieces {
        fn new(parts: &[&[u8]]) -> Self {
            Self {
                pieces: parts.iter().map(|p| Ok(p.to_vec())).collect(),
            }
        }
    }

    impl Read for Pieces {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.pieces.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut p)) => {
                    let n = p.len().min(buf.len());
                    buf[..n].copy_from_slice(&p[..n]);
                    if n < p.len() {
                        p.drain(..n);
                        self.pieces.push_front(Ok(p));
                    }
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn empty_stream_is_empty_response() {
        let mut r = Pieces::new(&[]);
        assert!(read_response(&mut r, &FrameLimits::default()).unwrap().is_none());
    }

    #[test]
    fn terminator_split_across_reads() {
        let mut r = Pieces::new(&[
            b"HTTP/1.1 200 OK\r\nContent-Length: 2\r",
            b"\n\r",
            b"\n{",
            b"}",
        ]);
        let msg = read_response(&mut r, &FrameLimits::default()).unwrap().unwrap();
        assert!(msg.ends_with(b"\r\n\r\n{}"));
    }

    #[test]
    fn interrupted_is_retried_and_reset_is_transport() {
        let mut r = Pieces::new(&[b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n"]);
        r.pieces.push_back(Err(io::Error::from(ErrorKind::Interrupted)));
        r.pieces.push_back(Ok(b"{}".to_vec()));
        assert!(read_response(&mut r, &FrameLimits::default()).unwrap().is_some());

        let mut r = Pieces::new(&[b"HTTP/1.1 200 OK\r\n"]);
        r.pieces.push_back(Err(io::Error::from(ErrorKind::ConnectionReset)));
        let err = read_response(&mut r, &FrameLimits::default()).unwrap_err();
        assert!(err.is_connection_lost());
    }

    #[test]
    fn truncated_body_is_framing_error() {
        let mut r = Pieces::new(&[b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{\"a\""]);
        let err = read_response(&mut r, &FrameLimits::default()).unwrap_err();
        assert!(matches!(err, WireError::Framing(m) if m.contains("4 of 10")));
    }

    #[test]
    fn eof_inside_headers_is_framing_error() {
        let mut r = Pieces::new(&[b"HTTP/1.1 200 OK\r\nContent-Le"]);
        assert!(matches!(
            read_response(&mut r, &FrameLimits::default()),
            Err(WireError::Framing(_))
        ));
    }

    #[test]
    fn oversized_header_block_is_rejected() {
        let limits = FrameLimits {
            read_chunk: 16,
            max_header_bytes: 32,
            max_body_bytes: 1024,
        };
        let long = vec![b'x'; 200];
        let mut r = Pieces::new(&[&long[..]]);
        assert!(matches!(read_response(&mut r, &limits), Err(WireError::Framing(m)) if m.contains("header block")));
    }

    #[test]
    fn trailing_bytes_are_dropped() {
        let mut r = Pieces::new(&[b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}GARBAGE"]);
        let msg = read_response(&mut r, &FrameLimits::default()).unwrap().unwrap();
        assert!(msg.ends_with(b"{}"));
    }

    #[test]
    fn write_request_emits_full_block() {
        let mut out = Vec::new();
        write_request(&mut out, &Request::get("/api/game/1", "h:1")).unwrap();
        assert!(out.ends_with(b"Connection: keep-alive\r\n\r\n"));
    }
}
