use thiserror::Error;
use trellis_protocol::TransportError;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure decoding an RPC result
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Decode depth exceeded safety ceiling of {0}")]
    DepthExceeded(usize),
}

/// Failure of a proxy invocation, surfaced to the caller and never retried
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}
