//! Host-tool side of the segment channel.
//!
//! A CAT-tool integration only has to report one event, the focus moving to
//! another segment. `SegmentPublisher` turns those events into
//! `SegmentUpdate` messages. Only the newest segment matters to the editor,
//! so events that arrive while a send is in flight overwrite each other and
//! only the latest one is sent next; nothing queues up.

mod stand_in;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

pub use stand_in::run;

use crate::ipc::{PipeMessage, PipeWriter, SegmentUpdate, SendError};

/// The translation unit that just received focus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentFocus {
    pub source: String,
    pub target: String,
    pub source_lang: String,
    pub target_lang: String,
}

/// The one capability a host-tool integration has to provide.
pub trait SegmentFocusHandler {
    fn segment_focus_changed(&self, focus: SegmentFocus);
}

/// Outcome of one publish attempt.
#[derive(Debug)]
pub struct PublishReport {
    pub source: String,
    pub result: Result<(), SendError>,
}

/// Latest-wins sender of segment updates.
pub struct SegmentPublisher {
    latest: watch::Sender<Option<SegmentUpdate>>,
    task: JoinHandle<()>,
}

impl SegmentPublisher {
    /// Spawn the send task. Reports go to `reports` when given; a full
    /// report channel drops the report, never the send.
    pub fn spawn(writer: PipeWriter, reports: Option<mpsc::Sender<PublishReport>>) -> Self {
        let (latest, rx) = watch::channel(None);
        let task = tokio::spawn(publish_loop(writer, rx, reports));
        Self { latest, task }
    }

    /// Send whatever is still pending, then stop.
    pub async fn close(self) {
        let Self { latest, task } = self;
        drop(latest);
        if let Err(e) = task.await {
            tracing::warn!("Segment publisher ended abnormally: {e}");
        }
    }
}

impl SegmentFocusHandler for SegmentPublisher {
    fn segment_focus_changed(&self, focus: SegmentFocus) {
        let update = SegmentUpdate::new(
            focus.source,
            focus.target,
            focus.source_lang,
            focus.target_lang,
        );
        self.latest.send_replace(Some(update));
    }
}

async fn publish_loop(
    writer: PipeWriter,
    mut rx: watch::Receiver<Option<SegmentUpdate>>,
    reports: Option<mpsc::Sender<PublishReport>>,
) {
    while rx.changed().await.is_ok() {
        let Some(update) = rx.borrow_and_update().clone() else {
            continue;
        };
        let source = update.source.clone();
        let result = writer.send_message(&PipeMessage::SegmentUpdate(update)).await;

        match &result {
            Ok(()) => tracing::debug!("Sent segment to {}", writer.path().display()),
            Err(SendError::ConnectFailed(e)) => {
                tracing::info!("Editor not available, segment dropped: {e}");
            }
            Err(e) => tracing::warn!("Segment send failed: {e}"),
        }

        if let Some(reports) = &reports {
            let _ = reports.try_send(PublishReport { source, result });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::ipc::{spawn_reader, ReaderOptions};

    fn focus(source: &str) -> SegmentFocus {
        SegmentFocus {
            source: source.into(),
            target: String::new(),
            source_lang: "en".into(),
            target_lang: "ko".into(),
        }
    }

    #[tokio::test]
    async fn publishes_focus_changes_to_the_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segment.sock");
        let (tx, mut rx) = mpsc::channel(16);
        let reader = spawn_reader::<PipeMessage>(
            ReaderOptions {
                path: path.clone(),
                read_timeout: Duration::from_secs(1),
                retry_delay: Duration::from_millis(20),
                shutdown_grace: Duration::from_secs(2),
                max_message_bytes: 4096,
            },
            tx,
        );
        while !path.exists() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let writer = PipeWriter::new(&path, Duration::from_secs(1));
        let publisher = SegmentPublisher::spawn(writer, None);
        publisher.segment_focus_changed(focus("Hello"));

        let msg = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        let PipeMessage::SegmentUpdate(update) = msg else {
            panic!("expected SegmentUpdate");
        };
        assert_eq!(update.source, "Hello");
        assert_eq!(update.target_lang, "ko");

        publisher.close().await;
        assert!(reader.shutdown().await);
    }

    #[tokio::test]
    async fn unreachable_editor_reports_connect_failed_without_queueing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PipeWriter::new(dir.path().join("absent.sock"), Duration::from_millis(1000));
        let (report_tx, mut report_rx) = mpsc::channel(4);
        let publisher = SegmentPublisher::spawn(writer, Some(report_tx));

        for source in ["a", "b", "c", "d", "e", "f"] {
            publisher.segment_focus_changed(focus(source));
        }
        publisher.close().await;

        let mut reports = Vec::new();
        while let Ok(report) = report_rx.try_recv() {
            reports.push(report);
        }
        assert!(!reports.is_empty());
        assert!(reports.len() <= 4);
        assert!(reports
            .iter()
            .all(|r| matches!(r.result, Err(SendError::ConnectFailed(_)))));
        assert_eq!(reports.last().map(|r| r.source.as_str()), Some("f"));
    }
}
