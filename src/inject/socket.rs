use std::{path::Path, result::Result as StdResult, time::Duration};

use async_trait::async_trait;

use super::{InjectError, TextInjector};
use crate::ipc::{HostAction, PipeWriter, SendError};

/// Hands the text to the host-side listener as an `Inject` action.
pub struct SocketInjector {
    writer: PipeWriter,
}

impl SocketInjector {
    pub fn new(path: &Path, timeout: Duration) -> Self {
        Self {
            writer: PipeWriter::new(path, timeout),
        }
    }
}

#[async_trait]
impl TextInjector for SocketInjector {
    async fn inject(&self, text: &str) -> StdResult<(), InjectError> {
        let action = HostAction::Inject {
            content: text.to_string(),
        };
        self.writer.send_message(&action).await.map_err(|e| match e {
            SendError::ConnectFailed(e) => InjectError::Unavailable(e.to_string()),
            SendError::Io(e) => InjectError::Io(e),
            other => InjectError::Unavailable(other.to_string()),
        })
    }
}
