//! Application state for the editor.

use chrono::Utc;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::{
    inject::{InjectionGateway, InjectionReport},
    ipc::PipeMessage,
    suggest::{
        Disposition, EditorDocument, GhostOverlay, SegmentSnapshot, SessionState,
        SuggestionCoordinator, SuggestionOutcome,
    },
};

pub const READY: &str = "Ready";
pub const GENERATING: &str = "Generating suggestion...";
pub const SUGGESTION_READY: &str = "Suggestion ready (Tab to accept)";
const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct App {
    session: SuggestionCoordinator,
    gateway: InjectionGateway,
    /// Last status message; replaced by the spinner while a request runs.
    status: String,
    spinner_frame: usize,
    pub should_exit: bool,
}

impl App {
    pub fn new(session: SuggestionCoordinator, gateway: InjectionGateway) -> Self {
        Self {
            session,
            gateway,
            status: "Waiting for a segment...".to_string(),
            spinner_frame: 0,
            should_exit: false,
        }
    }

    pub fn snapshot(&self) -> Option<&SegmentSnapshot> {
        self.session.snapshot()
    }

    pub const fn document(&self) -> &EditorDocument {
        self.session.document()
    }

    pub const fn overlay(&self) -> Option<&GhostOverlay> {
        self.session.overlay()
    }

    pub fn is_generating(&self) -> bool {
        self.session.state() == SessionState::AwaitingSuggestion
    }

    pub fn status(&self) -> &str {
        if self.is_generating() {
            GENERATING
        } else {
            &self.status
        }
    }

    pub fn spinner(&self) -> Option<&'static str> {
        self.is_generating()
            .then(|| SPINNER[self.spinner_frame % SPINNER.len()])
    }

    /// When the debounce timer wants attention.
    pub const fn deadline(&self) -> Option<tokio::time::Instant> {
        self.session.deadline()
    }

    pub fn tick(&mut self) {
        if self.is_generating() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
    }

    pub fn set_backend_available(&mut self, available: bool) {
        if self.session.snapshot().is_some() {
            return;
        }
        self.status = if available {
            "Backend ready".to_string()
        } else {
            "Backend unavailable".to_string()
        };
    }

    pub fn handle_message(&mut self, msg: PipeMessage) {
        match msg {
            PipeMessage::SegmentUpdate(update) => {
                if let Some(sent) = update.sent_at() {
                    let age = Utc::now().signed_duration_since(sent);
                    tracing::debug!("Segment arrived {} ms after send", age.num_milliseconds());
                }
                let snapshot = SegmentSnapshot::from(update);
                self.status = format!("Loaded: {}", snapshot.language_pair());
                tracing::info!(
                    "Segment loaded ({}, {} chars)",
                    snapshot.language_pair(),
                    snapshot.source_text.chars().count()
                );
                self.session.load_segment(snapshot);
            }
            PipeMessage::Unknown => tracing::debug!("Ignoring message of unknown type"),
        }
    }

    pub fn fire_debounce(&mut self) {
        if let Some(id) = self.session.fire_debounce() {
            self.spinner_frame = 0;
            tracing::debug!("Requesting suggestion {id}");
        }
    }

    pub fn handle_outcome(&mut self, outcome: SuggestionOutcome) {
        match self.session.apply_outcome(outcome) {
            Disposition::Shown => SUGGESTION_READY.clone_into(&mut self.status),
            Disposition::Empty => READY.clone_into(&mut self.status),
            Disposition::Failed(reason) => self.status = format!("No suggestion: {reason}"),
            Disposition::Stale => {}
        }
    }

    pub fn handle_injection(&mut self, report: InjectionReport) {
        self.status = report.status;
    }

    /// Handle a terminal event. Returns whether anything changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let Event::Key(key) = event else {
            return false;
        };
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let handled = self.handle_key(*key);
        if self.status == SUGGESTION_READY && self.session.overlay().is_none() {
            READY.clone_into(&mut self.status);
        }
        handled
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('q' | 'c') if ctrl => {
                self.should_exit = true;
                true
            }
            KeyCode::Char('s') if ctrl => self.confirm(),
            KeyCode::Enter if ctrl => self.confirm(),
            KeyCode::Enter => self.session.edit(|doc| doc.insert("\n")),
            KeyCode::Tab => self.session.accept(),
            KeyCode::Esc => self.session.dismiss(),
            KeyCode::Backspace => self.session.edit(EditorDocument::backspace),
            KeyCode::Delete => self.session.edit(EditorDocument::delete),
            KeyCode::Left => self.session.navigate(EditorDocument::move_left),
            KeyCode::Right => self.session.navigate(EditorDocument::move_right),
            KeyCode::Home => self.session.navigate(EditorDocument::move_line_start),
            KeyCode::End => self.session.navigate(EditorDocument::move_line_end),
            KeyCode::Char(c) if !ctrl && !alt => {
                let mut buf = [0; 4];
                self.session.edit(|doc| doc.insert(c.encode_utf8(&mut buf)))
            }
            _ => false,
        }
    }

    /// Send the whole document to the host tool. Pending ghost text is
    /// not part of the document and is not sent.
    fn confirm(&mut self) -> bool {
        let text = self.session.document().text().to_string();
        tracing::info!("Confirming translation ({} chars)", text.chars().count());
        self.gateway.confirm(text);
        "Sending translation...".clone_into(&mut self.status);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::{result::Result as StdResult, sync::Arc, sync::Mutex, time::Duration};

    use async_trait::async_trait;
    use tokio::{
        sync::mpsc,
        time::{advance, timeout},
    };

    use super::*;
    use crate::{
        config::SuggestConfig,
        inject::{InjectError, TextInjector},
        ipc::SegmentUpdate,
        suggest::backend::MockBackend,
    };

    #[derive(Default)]
    struct Recording(Mutex<Vec<String>>);

    #[async_trait]
    impl TextInjector for Recording {
        async fn inject(&self, text: &str) -> StdResult<(), InjectError> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct Harness {
        app: App,
        outcomes: mpsc::Receiver<SuggestionOutcome>,
        reports: mpsc::Receiver<InjectionReport>,
        injected: Arc<Recording>,
    }

    fn harness() -> Harness {
        let config = SuggestConfig {
            debounce_ms: 500,
            suggest_on_load: false,
        };
        let (session, outcomes) =
            SuggestionCoordinator::new(Arc::new(MockBackend::new(100)), &config);
        let injected = Arc::new(Recording::default());
        let (gateway, reports) = InjectionGateway::new(injected.clone());
        Harness {
            app: App::new(session, gateway),
            outcomes,
            reports,
            injected,
        }
    }

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_event(&key(code, KeyModifiers::NONE))
    }

    fn segment(source: &str, target: &str) -> PipeMessage {
        PipeMessage::SegmentUpdate(SegmentUpdate::new(source, target, "en", "ko"))
    }

    #[tokio::test]
    async fn segment_update_loads_document_and_status() {
        let mut h = harness();
        h.app.handle_message(segment("Hello world", "안녕"));

        assert_eq!(h.app.status(), "Loaded: en → ko");
        assert_eq!(h.app.document().text(), "안녕");
        assert_eq!(h.app.document().cursor(), 2);
        assert_eq!(h.app.snapshot().unwrap().source_text, "Hello world");
    }

    #[tokio::test]
    async fn typing_and_editing_keys() {
        let mut h = harness();
        h.app.handle_message(segment("Hi", ""));

        for c in "Hey".chars() {
            assert!(press(&mut h.app, KeyCode::Char(c)));
        }
        assert!(press(&mut h.app, KeyCode::Left));
        assert!(press(&mut h.app, KeyCode::Backspace));
        assert!(press(&mut h.app, KeyCode::Delete));
        assert_eq!(h.app.document().text(), "H");
        assert!(press(&mut h.app, KeyCode::Home));
        assert!(!press(&mut h.app, KeyCode::Home));
        assert!(press(&mut h.app, KeyCode::End));
    }

    #[tokio::test]
    async fn tab_without_overlay_is_noop() {
        let mut h = harness();
        h.app.handle_message(segment("Hi", "abc"));
        assert!(!press(&mut h.app, KeyCode::Tab));
        assert_eq!(h.app.document().text(), "abc");
        assert_eq!(h.app.document().cursor(), 3);
    }

    #[tokio::test]
    async fn control_keys_do_not_insert() {
        let mut h = harness();
        h.app.handle_message(segment("Hi", ""));
        assert!(!h
            .app
            .handle_event(&key(KeyCode::Char('x'), KeyModifiers::CONTROL)));
        assert!(h
            .app
            .handle_event(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert_eq!(h.app.document().text(), "A");

        assert!(h
            .app
            .handle_event(&key(KeyCode::Char('q'), KeyModifiers::CONTROL)));
        assert!(h.app.should_exit);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_cycle_then_tab_accepts() {
        let mut h = harness();
        h.app.handle_message(segment("Hello", ""));
        press(&mut h.app, KeyCode::Char('x'));

        advance(Duration::from_millis(500)).await;
        h.app.fire_debounce();
        assert_eq!(h.app.status(), GENERATING);
        assert!(h.app.spinner().is_some());

        let outcome = timeout(Duration::from_secs(5), h.outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        h.app.handle_outcome(outcome);
        assert_eq!(h.app.status(), SUGGESTION_READY);
        assert_eq!(
            h.app.overlay().map(|o| o.text.as_str()),
            Some("[AI Suggestion for: \"Hello\"]")
        );

        assert!(press(&mut h.app, KeyCode::Tab));
        assert_eq!(h.app.document().text(), "x[AI Suggestion for: \"Hello\"]");
        assert_eq!(h.app.status(), READY);
    }

    #[tokio::test(start_paused = true)]
    async fn escape_dismisses_overlay() {
        let mut h = harness();
        h.app.handle_message(segment("Hello", "He"));
        press(&mut h.app, KeyCode::Char('l'));
        advance(Duration::from_millis(500)).await;
        h.app.fire_debounce();
        let outcome = timeout(Duration::from_secs(5), h.outcomes.recv())
            .await
            .unwrap()
            .unwrap();
        h.app.handle_outcome(outcome);
        assert!(h.app.overlay().is_some());

        assert!(press(&mut h.app, KeyCode::Esc));
        assert!(h.app.overlay().is_none());
        assert_eq!(h.app.document().text(), "Hel");
        assert_eq!(h.app.status(), READY);
    }

    #[tokio::test]
    async fn ctrl_s_confirms_document_text() {
        let mut h = harness();
        h.app.handle_message(segment("Hello", "안녕하세요"));

        assert!(h
            .app
            .handle_event(&key(KeyCode::Char('s'), KeyModifiers::CONTROL)));
        let report = timeout(Duration::from_secs(2), h.reports.recv())
            .await
            .unwrap()
            .unwrap();
        h.app.handle_injection(report);

        assert_eq!(h.app.status(), "Translation sent to host tool");
        assert_eq!(*h.injected.0.lock().unwrap(), vec!["안녕하세요".to_string()]);
        assert_eq!(h.app.document().text(), "안녕하세요");
    }

    #[tokio::test]
    async fn backend_availability_status_only_before_first_segment() {
        let mut h = harness();
        h.app.set_backend_available(false);
        assert_eq!(h.app.status(), "Backend unavailable");

        h.app.handle_message(segment("Hello", ""));
        h.app.set_backend_available(true);
        assert_eq!(h.app.status(), "Loaded: en → ko");
    }
}
