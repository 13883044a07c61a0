//! Error taxonomy for the wire protocol and the services.
//!
//! Wire-level failures (`WireError`) belong to a single exchange and are
//! absorbed by the caller (partial pagination result, logged message).
//! Service-level failures (`ServiceError`) are rendered as JSON bodies with
//! a 4xx status and never surface as framing corruption.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    /// connect/read/write failure, including timeouts and resets.
    #[error("transport error during {op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Missing header terminator, missing or bad Content-Length, truncated body.
    #[error("framing error: {0}")]
    Framing(String),

    /// Peer closed the connection without sending a byte.
    #[error("empty response")]
    EmptyResponse,

    #[error("body decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Well-formed response with a non-success status.
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
}

impl WireError {
    pub fn transport(op: &'static str, source: io::Error) -> Self {
        WireError::Transport { op, source }
    }

    pub fn framing(msg: impl Into<String>) -> Self {
        WireError::Framing(msg.into())
    }

    /// Reset / broken pipe class failures (peer went away mid-exchange).
    pub fn is_connection_lost(&self) -> bool {
        match self {
            WireError::Transport { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Game not found")]
    NotFound(i64),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
        }
    }

    /// `{"error": "..."}` body as served over HTTP.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
