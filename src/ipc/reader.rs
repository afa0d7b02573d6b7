//! Reader role: persistent accept loop.
//!
//! Accept a connection, read it to end-of-stream, decode the bytes as one
//! envelope and forward it, then accept the next one. Nothing a writer does
//! can stop the loop: resets, oversized payloads and malformed JSON are
//! logged and skipped, a writer that does not finish within the read timeout
//! is dropped, and a failing listener is rebuilt after a pause.

use std::{
    fs, io,
    marker::PhantomData,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::de::DeserializeOwned;
use tokio::{
    io::AsyncReadExt,
    net::{UnixListener, UnixStream},
    sync::mpsc,
    task::JoinHandle,
    time::{sleep, timeout},
};
use tokio_util::sync::CancellationToken;

use super::envelope::decode;
use crate::config::TransportConfig;

/// Settings for one listening socket.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    pub path: PathBuf,
    /// Longest a single connection may take to deliver its message.
    pub read_timeout: Duration,
    pub retry_delay: Duration,
    pub shutdown_grace: Duration,
    pub max_message_bytes: usize,
}

impl ReaderOptions {
    pub fn new(path: impl Into<PathBuf>, transport: &TransportConfig) -> Self {
        Self {
            path: path.into(),
            read_timeout: transport.read_timeout(),
            retry_delay: transport.retry_delay(),
            shutdown_grace: transport.shutdown_grace(),
            max_message_bytes: transport.max_message_bytes,
        }
    }
}

/// Owner of a running accept loop.
pub struct ReaderHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    grace: Duration,
}

impl ReaderHandle {
    /// Stop accepting and wait up to the grace period for the loop to exit.
    ///
    /// Returns `false` when the loop had to be aborted.
    pub async fn shutdown(self) -> bool {
        self.cancel.cancel();
        let Self { task, grace, .. } = self;
        let abort = task.abort_handle();
        if let Ok(joined) = timeout(grace, task).await {
            if let Err(e) = joined {
                tracing::warn!("Pipe reader task ended abnormally: {e}");
            }
            true
        } else {
            tracing::warn!("Pipe reader did not stop within {}ms", grace.as_millis());
            abort.abort();
            false
        }
    }
}

/// Spawn the accept loop; decoded envelopes arrive on `tx`.
///
/// The loop also ends on its own once every receiver of `tx` is gone.
pub fn spawn_reader<T>(options: ReaderOptions, tx: mpsc::Sender<T>) -> ReaderHandle
where
    T: DeserializeOwned + Send + 'static,
{
    let cancel = CancellationToken::new();
    let grace = options.shutdown_grace;
    let reader = PipeReader {
        options,
        tx,
        cancel: cancel.clone(),
        _message: PhantomData,
    };
    let task = tokio::spawn(reader.run());
    ReaderHandle {
        cancel,
        task,
        grace,
    }
}

enum Flow {
    Continue,
    Rebind,
    Stop,
}

struct PipeReader<T> {
    options: ReaderOptions,
    tx: mpsc::Sender<T>,
    cancel: CancellationToken,
    _message: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned + Send + 'static> PipeReader<T> {
    async fn run(self) {
        let path = self.options.path.clone();
        loop {
            let listener = match bind(&path) {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind socket at {}: {e}", path.display());
                    if self.pause().await {
                        continue;
                    }
                    break;
                }
            };
            tracing::info!("Listening on {}", path.display());

            match self.accept_loop(&listener).await {
                Flow::Rebind => {
                    drop(listener);
                    if !self.pause().await {
                        break;
                    }
                }
                Flow::Stop | Flow::Continue => break,
            }
        }

        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::debug!("Could not remove {}: {e}", path.display());
            }
        }
        tracing::info!("Pipe reader on {} stopped", path.display());
    }

    async fn accept_loop(&self, listener: &UnixListener) -> Flow {
        loop {
            let accepted = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Flow::Stop,
                accepted = listener.accept() => accepted,
            };

            let flow = match accepted {
                Ok((stream, _)) => self.handle_connection(stream).await,
                Err(e) => {
                    tracing::error!("Accept error: {e}");
                    Flow::Rebind
                }
            };
            if !matches!(flow, Flow::Continue) {
                return flow;
            }
        }
    }

    async fn handle_connection(&self, stream: UnixStream) -> Flow {
        let read = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Flow::Stop,
            read = timeout(
                self.options.read_timeout,
                read_payload(stream, self.options.max_message_bytes),
            ) => read,
        };

        let bytes = match read {
            Ok(Ok(Some(bytes))) => bytes,
            Err(_) => {
                tracing::warn!(
                    "Dropped connection that sent no complete message within {}ms",
                    self.options.read_timeout.as_millis()
                );
                return Flow::Continue;
            }
            Ok(Ok(None)) => {
                tracing::warn!(
                    "Discarded message larger than {} bytes",
                    self.options.max_message_bytes
                );
                return Flow::Continue;
            }
            Ok(Err(e)) => {
                tracing::warn!("Connection reset while reading: {e}");
                return Flow::Continue;
            }
        };

        match decode::<T>(&bytes) {
            Ok(Some(message)) => {
                if self.tx.send(message).await.is_err() {
                    tracing::debug!("Receiver dropped, stopping pipe reader");
                    return Flow::Stop;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Ignoring message: {e}"),
        }
        Flow::Continue
    }

    /// Wait out the retry delay; `false` if cancelled meanwhile.
    async fn pause(&self) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = sleep(self.options.retry_delay) => true,
        }
    }
}

fn bind(path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // A previous run that crashed leaves its socket file behind.
    if path.exists() {
        fs::remove_file(path)?;
    }
    UnixListener::bind(path)
}

/// Read to end-of-stream; `Ok(None)` if the payload exceeds `max` bytes.
async fn read_payload(stream: UnixStream, max: usize) -> io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    let limit = u64::try_from(max).unwrap_or(u64::MAX).saturating_add(1);
    stream.take(limit).read_to_end(&mut bytes).await?;
    Ok((bytes.len() <= max).then_some(bytes))
}
