//! Writer role: one connection per message.
//!
//! Each send connects, writes the whole payload, shuts the write half down
//! (the reader uses end-of-stream as the message boundary) and drops the
//! stream. No connection outlives a message, so a restart of either process
//! never leaves the writer holding a stale handle: the next send simply
//! connects again.

use std::{
    error::Error as StdError,
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Serialize;
use tokio::{io::AsyncWriteExt, net::UnixStream, time::timeout};

use super::envelope::encode;

#[derive(Debug)]
pub enum SendError {
    /// No reader accepted the connection within the connect timeout.
    ConnectFailed(io::Error),
    /// Connected, but the write did not finish within the timeout.
    TimedOut,
    /// The connection broke while writing.
    Io(io::Error),
    Encode(serde_json::Error),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Io(e) => write!(f, "write failed: {e}"),
            Self::Encode(e) => write!(f, "encode failed: {e}"),
        }
    }
}

impl StdError for SendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::ConnectFailed(e) | Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::TimedOut => None,
        }
    }
}

/// Client side of a local socket channel.
#[derive(Debug, Clone)]
pub struct PipeWriter {
    path: PathBuf,
    timeout: Duration,
}

impl PipeWriter {
    /// `timeout` bounds the connect and, separately, the write.
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deliver one payload as one complete message.
    pub async fn send(&self, payload: &[u8]) -> Result<(), SendError> {
        let stream = match timeout(self.timeout, UnixStream::connect(&self.path)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(SendError::ConnectFailed(e)),
            Err(_) => {
                return Err(SendError::ConnectFailed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no reader within {}ms", self.timeout.as_millis()),
                )))
            }
        };

        match timeout(self.timeout, write_and_close(stream, payload)).await {
            Ok(result) => result.map_err(SendError::Io),
            Err(_) => Err(SendError::TimedOut),
        }
    }

    /// Encode and send an envelope.
    pub async fn send_message<T: Serialize + Sync>(&self, message: &T) -> Result<(), SendError> {
        let payload = encode(message).map_err(SendError::Encode)?;
        self.send(&payload).await
    }
}

async fn write_and_close(mut stream: UnixStream, payload: &[u8]) -> io::Result<()> {
    stream.write_all(payload).await?;
    stream.flush().await?;
    stream.shutdown().await
}
