//! Sending confirmed translations back to the host tool.
//!
//! Confirmation is always an explicit user action. The gateway runs the
//! injection in the background and only ever reports a status line; nothing
//! here can take the editor down or lose the user's text.

mod command;
mod socket;

use std::{error::Error as StdError, fmt, io, result::Result as StdResult, sync::Arc};

use async_trait::async_trait;
pub use command::CommandInjector;
pub use socket::SocketInjector;
use tokio::sync::mpsc;

use crate::config::{InjectConfig, InjectMode, TransportConfig};

#[derive(Debug)]
pub enum InjectError {
    /// Nobody is listening on the host side.
    Unavailable(String),
    Io(io::Error),
    /// The external program ran but reported failure.
    CommandFailed { status: Option<i32>, stderr: String },
    NotConfigured,
}

impl fmt::Display for InjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "host tool unavailable: {msg}"),
            Self::Io(e) => write!(f, "{e}"),
            Self::CommandFailed { status, stderr } => {
                match status {
                    Some(code) => write!(f, "inject command exited with {code}")?,
                    None => write!(f, "inject command was killed")?,
                }
                if !stderr.is_empty() {
                    write!(f, ": {stderr}")?;
                }
                Ok(())
            }
            Self::NotConfigured => write!(f, "no inject command configured"),
        }
    }
}

impl StdError for InjectError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for InjectError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Writes text into the host tool's document.
#[async_trait]
pub trait TextInjector: Send + Sync {
    async fn inject(&self, text: &str) -> StdResult<(), InjectError>;
}

/// Result of one confirm, as shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionReport {
    pub success: bool,
    pub status: String,
}

pub struct InjectionGateway {
    injector: Arc<dyn TextInjector>,
    reports: mpsc::Sender<InjectionReport>,
}

impl InjectionGateway {
    pub fn new(injector: Arc<dyn TextInjector>) -> (Self, mpsc::Receiver<InjectionReport>) {
        let (reports, rx) = mpsc::channel(8);
        (Self { injector, reports }, rx)
    }

    pub fn from_config(
        inject: &InjectConfig,
        transport: &TransportConfig,
    ) -> (Self, mpsc::Receiver<InjectionReport>) {
        let injector: Arc<dyn TextInjector> = match inject.mode {
            InjectMode::Socket => Arc::new(SocketInjector::new(
                &transport.inject_socket_path,
                transport.connect_timeout(),
            )),
            InjectMode::Command => Arc::new(CommandInjector::new(inject.command.clone())),
        };
        Self::new(injector)
    }

    /// Inject `text` in the background; the outcome arrives as a report.
    pub fn confirm(&self, text: String) {
        let injector = Arc::clone(&self.injector);
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let report = match injector.inject(&text).await {
                Ok(()) => {
                    tracing::info!("Injected {} chars", text.chars().count());
                    InjectionReport {
                        success: true,
                        status: "Translation sent to host tool".to_string(),
                    }
                }
                Err(e) => {
                    tracing::warn!("Injection failed: {e}");
                    InjectionReport {
                        success: false,
                        status: format!("Injection failed: {e}"),
                    }
                }
            };
            let _ = reports.send(report).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use tokio::time::timeout;

    use super::*;

    #[derive(Default)]
    struct Recording {
        texts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl TextInjector for Recording {
        async fn inject(&self, text: &str) -> StdResult<(), InjectError> {
            self.texts.lock().unwrap().push(text.to_string());
            if self.fail {
                Err(InjectError::Unavailable("no host".into()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn confirm_reports_success() {
        let injector = Arc::new(Recording::default());
        let (gateway, mut reports) = InjectionGateway::new(injector.clone());

        gateway.confirm("안녕하세요".into());
        let report = timeout(Duration::from_secs(2), reports.recv()).await.unwrap().unwrap();

        assert!(report.success);
        assert_eq!(report.status, "Translation sent to host tool");
        assert_eq!(*injector.texts.lock().unwrap(), vec!["안녕하세요".to_string()]);
    }

    #[tokio::test]
    async fn confirm_failure_becomes_a_status() {
        let injector = Arc::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let (gateway, mut reports) = InjectionGateway::new(injector);

        gateway.confirm("text".into());
        let report = timeout(Duration::from_secs(2), reports.recv()).await.unwrap().unwrap();

        assert!(!report.success);
        assert_eq!(report.status, "Injection failed: host tool unavailable: no host");
    }
}
