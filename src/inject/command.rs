use std::{process::Stdio, result::Result as StdResult};

use async_trait::async_trait;
use tokio::{io::AsyncWriteExt, process::Command};

use super::{InjectError, TextInjector};

/// Pipes the text into an external program, e.g. a clipboard tool or a
/// keystroke automation script that pastes into the host tool.
pub struct CommandInjector {
    argv: Vec<String>,
}

impl CommandInjector {
    pub const fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl TextInjector for CommandInjector {
    async fn inject(&self, text: &str) -> StdResult<(), InjectError> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(InjectError::NotConfigured);
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if output.status.success() {
            return Ok(());
        }
        Err(InjectError::CommandFailed {
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
