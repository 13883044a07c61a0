//! wire/codec: HTTP/1.1 message encoding for the retrieval protocol.
//!
//! Request (no body):
//!   METHOD PATH HTTP/1.1\r\n
//!   Host: HOST\r\n
//!   Connection: keep-alive\r\n
//!   \r\n
//!
//! Response: status line, headers (must carry Content-Length), blank line,
//! exactly Content-Length bytes of JSON. The body shape is not interpreted
//! here; it is handed upward as a `serde_json::Value`.

use crate::error::WireError;

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub host: String,
}

impl Request {
    pub fn get(path: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            host: host.into(),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        encode_request(&self.method, &self.path, &self.host)
    }
}

pub fn encode_request(method: &str, path: &str, host: &str) -> Vec<u8> {
    format!(
        "{} {} {}\r\nHost: {}\r\nConnection: keep-alive\r\n\r\n",
        method, path, HTTP_VERSION, host
    )
    .into_bytes()
}

/// Inverse of `encode_request`.
pub fn decode_request(bytes: &[u8]) -> Result<Request, WireError> {
    let end = find_header_end(bytes)
        .ok_or_else(|| WireError::framing("request has no header terminator"))?;
    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| WireError::framing("request header is not UTF-8"))?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split(' ');
    let (method, path, version) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(m), Some(p), Some(v), None) if !m.is_empty() && !p.is_empty() => (m, p, v),
        _ => {
            return Err(WireError::framing(format!(
                "malformed request line '{}'",
                request_line
            )))
        }
    };
    if !version.starts_with("HTTP/") {
        return Err(WireError::framing(format!("unsupported version '{}'", version)));
    }

    let headers = parse_header_lines(lines)?;
    let host = header_value(&headers, "host")
        .ok_or_else(|| WireError::framing("request has no Host header"))?;

    Ok(Request {
        method: method.to_string(),
        path: path.to_string(),
        host: host.to_string(),
    })
}

/// Offset of the first CRLF CRLF (start of the terminator), if any.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

/// Status line and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Parse the header block (without the terminator).
    pub fn parse(block: &[u8]) -> Result<Self, WireError> {
        let text = std::str::from_utf8(block)
            .map_err(|_| WireError::framing("response header is not UTF-8"))?;
        let mut lines = text.split("\r\n");
        let status_line = lines.next().unwrap_or("");

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or("");
        let code = parts.next().unwrap_or("");
        let reason = parts.next().unwrap_or("");
        if !version.starts_with("HTTP/") {
            return Err(WireError::framing(format!(
                "malformed status line '{}'",
                status_line
            )));
        }
        let status = code
            .parse::<u16>()
            .map_err(|_| WireError::framing(format!("malformed status code '{}'", code)))?;

        Ok(Self {
            status,
            reason: reason.to_string(),
            headers: parse_header_lines(lines)?,
        })
    }

    /// Case-insensitive header lookup; first occurrence wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn content_length(&self) -> Result<usize, WireError> {
        let raw = self
            .header("content-length")
            .ok_or_else(|| WireError::framing("response has no Content-Length header"))?;
        raw.trim()
            .parse::<usize>()
            .map_err(|_| WireError::framing(format!("non-numeric Content-Length '{}'", raw)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub head: ResponseHead,
    pub body: serde_json::Value,
}

impl Response {
    pub fn status(&self) -> u16 {
        self.head.status
    }

    /// `error` field of a 4xx/5xx body, or the reason phrase.
    pub fn error_message(&self) -> String {
        self.body
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.head.reason.clone())
    }
}

/// Split at the first boundary, validate the declared length and parse the
/// JSON body. Bytes past the declared length are ignored.
pub fn decode_response(bytes: &[u8]) -> Result<Response, WireError> {
    let end = find_header_end(bytes)
        .ok_or_else(|| WireError::framing("response has no header terminator"))?;
    let head = ResponseHead::parse(&bytes[..end])?;
    let declared = head.content_length()?;

    let body = &bytes[end + HEADER_TERMINATOR.len()..];
    if body.len() < declared {
        return Err(WireError::framing(format!(
            "body shorter than Content-Length ({} < {})",
            body.len(),
            declared
        )));
    }
    let body: serde_json::Value = serde_json::from_slice(&body[..declared])?;
    Ok(Response { head, body })
}

fn parse_header_lines<'a, I>(lines: I) -> Result<Vec<(String, String)>, WireError>
where
    I: Iterator<Item = &'a str>,
{
    let mut out = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| WireError::framing(format!("malformed header line '{}'", line)))?;
        out.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(out)
}

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_wire_form() {
        let bytes = encode_request("GET", "/api/rank/sunk?limit=50&start=0", "127.0.0.1:5000");
        assert_eq!(
            bytes,
            b"GET /api/rank/sunk?limit=50&start=0 HTTP/1.1\r\nHost: 127.0.0.1:5000\r\nConnection: keep-alive\r\n\r\n"
        );
    }

    #[test]
    fn request_round_trip() {
        let req = Request::get("/api/game/17", "localhost:8080");
        assert_eq!(decode_request(&req.encode()).unwrap(), req);
    }

    #[test]
    fn decode_ok_response() {
        let body = br#"{"games":[3,1],"next":null}"#;
        let mut msg = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        msg.extend_from_slice(body);

        let resp = decode_response(&msg).unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.head.header("Content-Type"), Some("application/json"));
        assert_eq!(resp.body["games"][0], 3);
        assert!(resp.body["next"].is_null());
    }

    #[test]
    fn decode_errors_are_distinct() {
        let no_boundary = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n{}";
        assert!(matches!(decode_response(no_boundary), Err(WireError::Framing(m)) if m.contains("terminator")));

        let no_len = b"HTTP/1.1 200 OK\r\n\r\n{}";
        assert!(matches!(decode_response(no_len), Err(WireError::Framing(m)) if m.contains("no Content-Length")));

        let bad_len = b"HTTP/1.1 200 OK\r\nContent-Length: two\r\n\r\n{}";
        assert!(matches!(decode_response(bad_len), Err(WireError::Framing(m)) if m.contains("non-numeric")));

        let bad_json = b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{]";
        assert!(matches!(decode_response(bad_json), Err(WireError::Decode(_))));

        let short = b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{}";
        assert!(matches!(decode_response(short), Err(WireError::Framing(m)) if m.contains("shorter")));
    }

    #[test]
    fn error_message_prefers_body() {
        let msg = b"HTTP/1.1 404 NOT FOUND\r\nContent-Length: 27\r\n\r\n{\"error\": \"Game not found\"}";
        let resp = decode_response(msg).unwrap();
        assert!(!resp.head.is_success());
        assert_eq!(resp.error_message(), "Game not found");
    }
}
