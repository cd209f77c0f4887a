use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, TransportError};

/// Default maximum frame size: 16MB
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Extension trait for reading length-prefixed frames
pub trait FrameRead {
    /// Read one frame from the stream
    /// Format: [4 bytes length, big-endian][frame bytes]
    async fn read_frame(&mut self, max_size: usize) -> Result<Vec<u8>>;
}

/// Extension trait for writing length-prefixed frames
pub trait FrameWrite {
    /// Write one frame to the stream and flush
    /// Format: [4 bytes length, big-endian][frame bytes]
    async fn write_frame(&mut self, data: &[u8], max_size: usize) -> Result<()>;
}

impl<R: AsyncRead + Unpin + Send> FrameRead for R {
    async fn read_frame(&mut self, max_size: usize) -> Result<Vec<u8>> {
        // Read frame length (4 bytes, big-endian)
        let len = self.read_u32().await? as usize;

        if len > max_size {
            return Err(TransportError::FrameTooLarge(len, max_size));
        }

        if len == 0 {
            return Err(TransportError::ConnectionClosed);
        }

        let mut buffer = vec![0u8; len];
        self.read_exact(&mut buffer).await?;

        Ok(buffer)
    }
}

impl<W: AsyncWrite + Unpin + Send> FrameWrite for W {
    async fn write_frame(&mut self, data: &[u8], max_size: usize) -> Result<()> {
        if data.len() > max_size {
            return Err(TransportError::FrameTooLarge(data.len(), max_size));
        }

        self.write_u32(data.len() as u32).await?;
        self.write_all(data).await?;

        // Frames are flushed immediately for request-response patterns
        self.flush().await?;

        Ok(())
    }
}
