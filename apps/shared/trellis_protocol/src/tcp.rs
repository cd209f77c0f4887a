//! TCP transport: length-prefixed JSON frames over a `TcpStream`
//!
//! One writer, one background reader task. Requests carry a correlation id;
//! the reader task routes each response to the oneshot channel of the request
//! it answers. Responses may arrive in any order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::message::{RpcRequest, RpcResponse};
use crate::stream::{DEFAULT_MAX_FRAME_SIZE, FrameRead, FrameWrite};
use crate::transport::Transport;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<String>>>>>;

/// Transport over a TCP connection to the compute backend
pub struct TcpTransport {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingMap,
    next_id: AtomicU64,
    max_frame_size: usize,
    reader: JoinHandle<()>,
}

impl TcpTransport {
    /// Connect to the backend at `addr` (host:port)
    pub async fn connect(addr: impl tokio::net::ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::from_stream(stream, DEFAULT_MAX_FRAME_SIZE))
    }

    /// Build a transport from an already-connected stream
    pub fn from_stream(stream: TcpStream, max_frame_size: usize) -> Self {
        let (read_half, write_half) = stream.into_split();
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));

        let reader = tokio::spawn(read_loop(read_half, Arc::clone(&pending), max_frame_size));

        Self {
            writer: tokio::sync::Mutex::new(write_half),
            pending,
            next_id: AtomicU64::new(1),
            max_frame_size,
            reader,
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        let request = RpcRequest {
            id,
            method: method.to_string(),
            params,
        };

        let write_result = async {
            let data = request.to_bytes()?;
            let mut writer = self.writer.lock().await;
            writer.write_frame(&data, self.max_frame_size).await
        }
        .await;

        if let Err(e) = write_result {
            // The request never made it onto the wire; drop its pending slot
            self.pending.lock().unwrap().remove(&id);
            return Err(e);
        }

        rx.await.map_err(|_| TransportError::ConnectionClosed)?
    }
}

/// Read responses until the connection dies, routing each to its request
async fn read_loop(mut reader: OwnedReadHalf, pending: PendingMap, max_frame_size: usize) {
    loop {
        let frame = match reader.read_frame(max_frame_size).await {
            Ok(frame) => frame,
            Err(e) => {
                debug!("connection reader stopped: {}", e);
                break;
            }
        };

        let response = match RpcResponse::from_bytes(&frame) {
            Ok(response) => response,
            Err(e) => {
                warn!("dropping malformed response frame: {}", e);
                continue;
            }
        };

        let sender = pending.lock().unwrap().remove(&response.id);
        match sender {
            Some(tx) => {
                // The requester may have been dropped; nothing to report then
                let _ = tx.send(resolve(response));
            }
            None => warn!("response for unknown request id {}", response.id),
        }
    }

    // Fail everything still in flight so no caller hangs forever
    let mut pending = pending.lock().unwrap();
    for (_, tx) in pending.drain() {
        let _ = tx.send(Err(TransportError::ConnectionClosed));
    }
}

fn resolve(response: RpcResponse) -> Result<String> {
    if let Some(error) = response.error {
        return Err(TransportError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    response.result.ok_or_else(|| {
        TransportError::InvalidResponse("response carries neither result nor error".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RpcError;
    use tokio::net::TcpListener;

    /// Accept one connection and answer each request via `respond`
    async fn serve_once(
        listener: TcpListener,
        respond: impl Fn(RpcRequest) -> Option<RpcResponse> + Send + 'static,
    ) {
        let (mut stream, _) = listener.accept().await.unwrap();
        loop {
            let frame = match stream.read_frame(DEFAULT_MAX_FRAME_SIZE).await {
                Ok(frame) => frame,
                Err(_) => break,
            };
            let request = RpcRequest::from_bytes(&frame).unwrap();
            if let Some(response) = respond(request) {
                let data = response.to_bytes().unwrap();
                stream
                    .write_frame(&data, DEFAULT_MAX_FRAME_SIZE)
                    .await
                    .unwrap();
            }
        }
    }

    async fn connect_pair(
        respond: impl Fn(RpcRequest) -> Option<RpcResponse> + Send + 'static,
    ) -> TcpTransport {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve_once(listener, respond));
        TcpTransport::connect(addr).await.unwrap()
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let transport = connect_pair(|request| {
            assert_eq!(request.method, "callCallable");
            Some(RpcResponse {
                id: request.id,
                result: Some("{\"result\":\"mock\"}".to_string()),
                error: None,
            })
        })
        .await;

        let result = transport
            .request("callCallable", vec![Value::String("cb-1".to_string())])
            .await
            .unwrap();
        assert_eq!(result, "{\"result\":\"mock\"}");
    }

    #[tokio::test]
    async fn test_rpc_error_surfaces_to_caller() {
        let transport = connect_pair(|request| {
            Some(RpcResponse {
                id: request.id,
                result: None,
                error: Some(RpcError {
                    code: -32601,
                    message: "method not found".to_string(),
                }),
            })
        })
        .await;

        let err = transport.request("noSuchMethod", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_concurrent_requests_complete_independently() {
        // The server answers every request with its own id as text, so
        // mismatched correlation would be visible immediately.
        let transport = Arc::new(
            connect_pair(|request| {
                Some(RpcResponse {
                    id: request.id,
                    result: Some(format!("\"{}\"", request.method)),
                    error: None,
                })
            })
            .await,
        );

        let a = tokio::spawn({
            let transport = Arc::clone(&transport);
            async move { transport.request("alpha", vec![]).await.unwrap() }
        });
        let b = tokio::spawn({
            let transport = Arc::clone(&transport);
            async move { transport.request("beta", vec![]).await.unwrap() }
        });

        assert_eq!(a.await.unwrap(), "\"alpha\"");
        assert_eq!(b.await.unwrap(), "\"beta\"");
    }

    #[tokio::test]
    async fn test_pending_requests_fail_when_connection_closes() {
        // Server that never answers and hangs up after the first frame
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let _ = stream.read_frame(DEFAULT_MAX_FRAME_SIZE).await;
            // stream dropped here
        });

        let transport = TcpTransport::connect(addr).await.unwrap();
        let err = transport.request("callCallable", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }
}
