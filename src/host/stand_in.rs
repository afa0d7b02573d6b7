//! Host-tool stand-in for running the editor without a CAT tool.
//!
//! Every stdin line becomes a focused segment (`source` or
//! `source<TAB>target`). `Inject` actions coming back from the editor are
//! printed to stdout.

use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use super::{PublishReport, SegmentFocus, SegmentFocusHandler, SegmentPublisher};
use crate::{
    config::TransportConfig,
    error::Result,
    ipc::{spawn_reader, HostAction, PipeWriter, ReaderOptions, SendError},
};

pub async fn run(transport: &TransportConfig, source_lang: &str, target_lang: &str) -> Result<()> {
    let writer = PipeWriter::new(&transport.socket_path, transport.connect_timeout());
    let (report_tx, mut report_rx) = mpsc::channel(16);
    let publisher = SegmentPublisher::spawn(writer, Some(report_tx));

    let (action_tx, mut action_rx) = mpsc::channel::<HostAction>(16);
    let reader = spawn_reader(
        ReaderOptions::new(&transport.inject_socket_path, transport),
        action_tx,
    );

    eprintln!(
        "Publishing segments to {} (one per line, TAB separates target). Ctrl-D to stop.",
        transport.socket_path.display()
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Some(focus) = parse_line(&line, source_lang, target_lang) {
                    publisher.segment_focus_changed(focus);
                }
            }
            Some(report) = report_rx.recv() => print_report(&report),
            Some(action) = action_rx.recv() => print_action(action),
        }
    }

    publisher.close().await;
    while let Ok(report) = report_rx.try_recv() {
        print_report(&report);
    }
    reader.shutdown().await;
    Ok(())
}

fn parse_line(line: &str, source_lang: &str, target_lang: &str) -> Option<SegmentFocus> {
    if line.trim().is_empty() {
        return None;
    }
    let (source, target) = line.split_once('\t').unwrap_or((line, ""));
    Some(SegmentFocus {
        source: source.to_string(),
        target: target.to_string(),
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
    })
}

fn print_report(report: &PublishReport) {
    match &report.result {
        Ok(()) => eprintln!("sent: {}", report.source),
        Err(SendError::ConnectFailed(_)) => {
            eprintln!("editor not running, dropped: {}", report.source);
        }
        Err(e) => eprintln!("send failed ({e}): {}", report.source),
    }
}

fn print_action(action: HostAction) {
    match action {
        HostAction::Inject { content } => println!("Inject: {content}"),
        HostAction::Unknown => tracing::debug!("Ignoring unknown host action"),
    }
}
