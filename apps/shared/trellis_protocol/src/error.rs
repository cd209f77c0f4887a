use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Frame too large: {0} bytes (max: {1})")]
    FrameTooLarge(usize, usize),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
