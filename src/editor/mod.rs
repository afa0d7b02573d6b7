//! Terminal editor: receives segments, shows ghost-text suggestions,
//! confirms translations back to the host tool.

mod app;
mod ui;

use std::{io::stdout, time::Duration};

use app::App;
use crossterm::{
    event::{
        EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::prelude::*;
use tokio::{
    sync::mpsc,
    time::{sleep, sleep_until, Instant},
};

use crate::{
    config::Config,
    error::Result,
    inject::InjectionGateway,
    ipc::{spawn_reader, PipeMessage, ReaderOptions},
    suggest::{backend, SuggestionCoordinator},
};

const TICK: Duration = Duration::from_millis(80);

pub async fn run(config: &Config) -> Result<()> {
    let backend = backend::from_config(&config.backend)?;
    let (session, mut outcomes) = SuggestionCoordinator::new(backend.clone(), &config.suggest);
    let (gateway, mut injections) =
        InjectionGateway::from_config(&config.inject, &config.transport);

    let (segment_tx, mut segments) = mpsc::channel(16);
    let reader = spawn_reader::<PipeMessage>(
        ReaderOptions::new(&config.transport.socket_path, &config.transport),
        segment_tx,
    );

    let (availability_tx, mut availability) = mpsc::channel(1);
    tokio::spawn(async move {
        let _ = availability_tx.send(backend.is_available().await).await;
    });

    let enhanced_keys = matches!(supports_keyboard_enhancement(), Ok(true));
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    if enhanced_keys {
        stdout().execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES,
        ))?;
    }
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(session, gateway);
    let mut event_stream = EventStream::new();

    let result: Result<()> = async {
        while !app.should_exit {
            terminal.draw(|frame| ui::render(frame, &app))?;

            let deadline = app.deadline();
            tokio::select! {
                Some(msg) = segments.recv() => app.handle_message(msg),
                Some(Ok(event)) = event_stream.next() => {
                    app.handle_event(&event);
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    app.fire_debounce();
                }
                Some(outcome) = outcomes.recv() => app.handle_outcome(outcome),
                Some(report) = injections.recv() => app.handle_injection(report),
                Some(available) = availability.recv() => app.set_backend_available(available),
                () = sleep(TICK) => app.tick(),
            }
        }
        Ok(())
    }
    .await;

    if enhanced_keys {
        let _ = stdout().execute(PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if !reader.shutdown().await {
        tracing::warn!("Segment reader did not stop in time");
    }
    result
}
