//! JSON-RPC 2.0 messages in `Content-Length` frames.

use crate::error::BridgeResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const JSONRPC_VERSION: &str = "2.0";

pub const CONTENT_LENGTH: &str = "Content-Length";

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest payload accepted from the server.
pub const MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Protocol methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "initialized";
    pub const SHUTDOWN: &str = "shutdown";
    pub const EXIT: &str = "exit";
    pub const DID_OPEN: &str = "textDocument/didOpen";
    pub const DID_CLOSE: &str = "textDocument/didClose";

    // Server -> client
    pub const PUBLISH_DIAGNOSTICS: &str = "textDocument/publishDiagnostics";
    pub const WORKSPACE_CONFIGURATION: &str = "workspace/configuration";
}

/// Standard error codes
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i64 = -32601;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Any JSON-RPC object. Which fields are set decides the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Notification,
    Response,
    Invalid,
}

impl Message {
    fn empty() -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        }
    }

    pub fn request(id: RequestId, method: impl Into<String>, params: Value) -> Self {
        Self {
            id: Some(id),
            method: Some(method.into()),
            params: Some(params),
            ..Self::empty()
        }
    }

    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: Some(method.into()),
            params: Some(params),
            ..Self::empty()
        }
    }

    pub fn response(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            ..Self::empty()
        }
    }

    pub fn error_response(id: RequestId, code: i64, message: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            error: Some(ResponseError {
                code,
                message: message.into(),
                data: None,
            }),
            ..Self::empty()
        }
    }

    pub fn kind(&self) -> MessageKind {
        match (&self.id, &self.method) {
            (Some(_), Some(_)) => MessageKind::Request,
            (None, Some(_)) => MessageKind::Notification,
            (Some(_), None) => MessageKind::Response,
            (None, None) => MessageKind::Invalid,
        }
    }
}

/// Serialize a message with its frame header.
pub fn encode(message: &Message) -> BridgeResult<Vec<u8>> {
    let content = serde_json::to_vec(message)?;
    let header = format!("{}: {}\r\n\r\n", CONTENT_LENGTH, content.len());
    let mut frame = header.into_bytes();
    frame.extend_from_slice(&content);
    Ok(frame)
}

pub fn decode(frame: &[u8]) -> BridgeResult<Message> {
    Ok(serde_json::from_slice(frame)?)
}

/// Reassembles frames from a byte stream that may arrive in arbitrary
/// chunks.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The next complete payload, if one has fully arrived. A header block
    /// without a usable length is dropped and decoding resumes after it.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            let header_end = find_header_end(&self.buffer)?;
            let body_start = header_end + HEADER_TERMINATOR.len();

            let length = std::str::from_utf8(&self.buffer[..header_end])
                .ok()
                .and_then(parse_content_length)
                .filter(|length| *length <= MAX_FRAME_LENGTH);
            let Some(length) = length else {
                warn!(
                    header = %String::from_utf8_lossy(&self.buffer[..header_end]),
                    "Discarding frame header without a usable Content-Length"
                );
                self.buffer.drain(..body_start);
                continue;
            };

            let body_end = body_start + length;
            if self.buffer.len() < body_end {
                return None;
            }

            let frame = self.buffer[body_start..body_end].to_vec();
            self.buffer.drain(..body_end);
            return Some(frame);
        }
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

fn parse_content_length(header: &str) -> Option<usize> {
    header.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(CONTENT_LENGTH)
            .then(|| value.trim().parse().ok())
            .flatten()
    })
}
