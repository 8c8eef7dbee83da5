use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON-RPC payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Diagnostics bridge is not ready")]
    NotReady,

    #[error("Diagnostics bridge connection closed")]
    Closed,

    #[error("'{method}' timed out after {millis}ms")]
    Timeout { method: String, millis: u128 },

    #[error("Server error {code}: {message}")]
    Server { code: i64, message: String },
}
