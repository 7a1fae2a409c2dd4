//! Newline framing.
//!
//! Every message is one line terminated by `\n`. A peer that writes a
//! message and closes without the terminator is still understood, as long
//! as it sent something.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolError;

/// Largest frame accepted, terminator excluded.
pub const MAX_FRAME_LEN: usize = 4096;

/// Error type for frame I/O.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed before a frame arrived")]
    Closed,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Read a single frame and return it without its terminator.
pub async fn read_frame<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(128);
    let mut limited = BufReader::new((&mut *reader).take(MAX_FRAME_LEN as u64 + 1));
    let n = limited.read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Err(FrameError::Closed);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if buf.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLong(MAX_FRAME_LEN).into());
    }

    String::from_utf8(buf).map_err(|_| ProtocolError::InvalidUtf8.into())
}

/// Write `text` as one frame and flush it.
pub async fn write_frame<W>(writer: &mut W, text: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if text.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLong(MAX_FRAME_LEN).into());
    }
    let mut frame = Vec::with_capacity(text.len() + 1);
    frame.extend_from_slice(text.as_bytes());
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
