use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One RPC request frame, client -> backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Correlation id, unique per in-flight request on one connection
    pub id: u64,
    /// Method name (e.g., "callCallable", "releaseCallable")
    pub method: String,
    /// Positional parameters, JSON-encodable values only
    pub params: Vec<Value>,
}

/// One RPC response frame, backend -> client
///
/// Exactly one of `result` and `error` is expected to be set. The result is
/// the JSON-encoded result *text* (the backend double-encodes), so callers
/// own the second parse and its failure mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Correlation id of the request this answers
    pub id: u64,
    /// JSON-encoded result text on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error detail on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Error payload carried in a failed [`RpcResponse`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcRequest {
    /// Serialize request to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize request from JSON bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

impl RpcResponse {
    /// Serialize response to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize response from JSON bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
