pub mod error;
pub mod message;
pub mod stream;
pub mod tcp;
pub mod transport;

pub use error::{Result, TransportError};
pub use message::{RpcError, RpcRequest, RpcResponse};
pub use stream::{DEFAULT_MAX_FRAME_SIZE, FrameRead, FrameWrite};
pub use tcp::TcpTransport;
pub use transport::{CALL_CALLABLE, FETCH_WIDGET, RELEASE_CALLABLE, Transport};
