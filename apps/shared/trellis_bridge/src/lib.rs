//! Remote callable bridge
//!
//! The compute backend exposes interactive behavior as *callables*: opaque
//! function handles embedded anywhere inside JSON payloads. This crate turns
//! those wire markers into local [`CallableProxy`] values that invoke the
//! remote side over a [`Transport`](trellis_protocol::Transport), and releases
//! the backing remote resources when the last handle for a callable is
//! dropped.

pub mod callable;
pub mod decode;
pub mod error;
pub mod tracker;

pub use callable::{CALLABLE_KEY, CallableId, CallableProxy, wrap_callable};
pub use decode::{DecodedValue, MAX_DECODE_DEPTH, decode_value};
pub use error::{BridgeError, DecodeError, Result};
pub use tracker::{CallableTracker, ReleaseGuard};
