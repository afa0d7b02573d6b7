//! Debounced, cancelable suggestion cycle for one editing session.
//!
//! The coordinator owns the document, the ghost overlay and the segment
//! snapshot, and is driven from a single event loop:
//!
//! - every document edit clears the overlay, cancels the pending request and
//!   restarts the debounce timer;
//! - when the timer expires (`fire_debounce`) exactly one request is issued
//!   and the backend call runs as a separate task;
//! - the task reports back through the outcome channel and
//!   `apply_outcome` shows the result only if it belongs to the latest
//!   request and that request is still pending.
//!
//! Out-of-order completions are resolved by id alone; late results of
//! superseded requests are dropped.

use std::{sync::Arc, time::Duration};

use tokio::{sync::mpsc, task::AbortHandle, time::Instant};

use super::{
    backend::{BackendError, BackendRequest, SuggestionBackend},
    document::EditorDocument,
    overlay::{GhostOverlay, OverlayManager},
    snapshot::SegmentSnapshot,
    RequestId,
};
use crate::config::SuggestConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Debouncing,
    AwaitingSuggestion,
    OverlayShown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Completed,
    Cancelled,
    Failed,
}

/// One call to the backend and the editor state it was computed for.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub id: RequestId,
    pub snapshot: Arc<SegmentSnapshot>,
    pub editor_text: String,
    pub cursor_offset: usize,
    pub issued_at: Instant,
    pub state: RequestState,
}

/// Result of a backend call, tagged with the request it answers.
#[derive(Debug)]
pub struct SuggestionOutcome {
    pub id: RequestId,
    pub result: Result<String, BackendError>,
}

/// What `apply_outcome` did with a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The overlay now shows the suggestion.
    Shown,
    /// The backend had nothing to offer.
    Empty,
    /// The backend failed; the message is for a status line.
    Failed(String),
    /// The result belongs to a superseded or cancelled request.
    Stale,
}

pub struct SuggestionCoordinator {
    backend: Arc<dyn SuggestionBackend>,
    debounce: Duration,
    suggest_on_load: bool,
    state: SessionState,
    snapshot: Option<Arc<SegmentSnapshot>>,
    document: EditorDocument,
    overlay: OverlayManager,
    deadline: Option<Instant>,
    last_issued: RequestId,
    request: Option<SuggestionRequest>,
    in_flight: Option<AbortHandle>,
    outcome_tx: mpsc::Sender<SuggestionOutcome>,
}

impl SuggestionCoordinator {
    /// Create a coordinator and the receiver its backend results arrive on.
    pub fn new(
        backend: Arc<dyn SuggestionBackend>,
        config: &SuggestConfig,
    ) -> (Self, mpsc::Receiver<SuggestionOutcome>) {
        let (outcome_tx, outcome_rx) = mpsc::channel(16);
        let coordinator = Self {
            backend,
            debounce: config.debounce(),
            suggest_on_load: config.suggest_on_load,
            state: SessionState::Idle,
            snapshot: None,
            document: EditorDocument::default(),
            overlay: OverlayManager::default(),
            deadline: None,
            last_issued: 0,
            request: None,
            in_flight: None,
            outcome_tx,
        };
        (coordinator, outcome_rx)
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn document(&self) -> &EditorDocument {
        &self.document
    }

    pub const fn overlay(&self) -> Option<&GhostOverlay> {
        self.overlay.current()
    }

    pub fn snapshot(&self) -> Option<&SegmentSnapshot> {
        self.snapshot.as_deref()
    }

    /// When the debounce timer fires, if it is running.
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Replace the session with a newly focused segment.
    pub fn load_segment(&mut self, snapshot: SegmentSnapshot) {
        self.reset();
        self.document = EditorDocument::new(snapshot.target_text.clone());
        self.snapshot = Some(Arc::new(snapshot));
        if self.suggest_on_load {
            self.restart_debounce();
        }
    }

    /// Back to `Idle`: no overlay, no pending request, no timer.
    pub fn reset(&mut self) {
        self.overlay.clear();
        self.cancel_pending();
        self.deadline = None;
        self.state = SessionState::Idle;
    }

    /// Apply an edit; if it changed the text, start a new debounce cycle.
    pub fn edit(&mut self, apply: impl FnOnce(&mut EditorDocument) -> bool) -> bool {
        let changed = apply(&mut self.document);
        if changed {
            self.document_changed();
        }
        changed
    }

    /// Move the cursor. A shown or pending suggestion no longer fits the
    /// new position and is dropped; a running debounce keeps running.
    pub fn navigate(&mut self, apply: impl FnOnce(&mut EditorDocument) -> bool) -> bool {
        let moved = apply(&mut self.document);
        if moved && self.state != SessionState::Debouncing {
            self.reset();
        }
        moved
    }

    /// Commit the overlay into the document. Counts as an edit.
    pub fn accept(&mut self) -> bool {
        let accepted = self.overlay.accept(&mut self.document);
        if accepted {
            self.document_changed();
        }
        accepted
    }

    /// Hide the overlay without committing it.
    pub fn dismiss(&mut self) -> bool {
        let dismissed = self.overlay.clear().is_some();
        if dismissed {
            self.state = SessionState::Idle;
        }
        dismissed
    }

    fn document_changed(&mut self) {
        self.overlay.clear();
        self.cancel_pending();
        self.restart_debounce();
    }

    fn restart_debounce(&mut self) {
        self.deadline = Some(Instant::now() + self.debounce);
        self.state = SessionState::Debouncing;
    }

    /// Issue the request if the debounce timer has expired.
    ///
    /// Returns the id of the request issued, if any.
    pub fn fire_debounce(&mut self) -> Option<RequestId> {
        let deadline = self.deadline?;
        if Instant::now() < deadline {
            return None;
        }
        self.deadline = None;

        let Some(snapshot) = self.snapshot.clone() else {
            tracing::debug!("No segment loaded, skipping suggestion");
            self.state = SessionState::Idle;
            return None;
        };
        Some(self.issue_request(snapshot))
    }

    fn issue_request(&mut self, snapshot: Arc<SegmentSnapshot>) -> RequestId {
        self.cancel_pending();
        self.last_issued += 1;
        let id = self.last_issued;

        let request = SuggestionRequest {
            id,
            snapshot,
            editor_text: self.document.text().to_string(),
            cursor_offset: self.document.cursor(),
            issued_at: Instant::now(),
            state: RequestState::Pending,
        };
        let backend_request = BackendRequest {
            source_text: request.snapshot.source_text.clone(),
            current_translation: request.editor_text.clone(),
            source_lang: request.snapshot.source_lang.clone(),
            target_lang: request.snapshot.target_lang.clone(),
        };

        let backend = Arc::clone(&self.backend);
        let tx = self.outcome_tx.clone();
        let task = tokio::spawn(async move {
            let result = backend.generate(&backend_request).await;
            // The receiver is gone only when the session is shutting down.
            let _ = tx.send(SuggestionOutcome { id, result }).await;
        });

        tracing::debug!("Issued suggestion request {id}");
        self.in_flight = Some(task.abort_handle());
        self.request = Some(request);
        self.state = SessionState::AwaitingSuggestion;
        id
    }

    fn cancel_pending(&mut self) {
        if let Some(request) = self.request.as_mut() {
            if request.state == RequestState::Pending {
                request.state = RequestState::Cancelled;
                tracing::debug!("Cancelled suggestion request {}", request.id);
            }
        }
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    /// Apply a backend result if it is still wanted.
    pub fn apply_outcome(&mut self, outcome: SuggestionOutcome) -> Disposition {
        let SuggestionOutcome { id, result } = outcome;
        let Some(request) = self
            .request
            .as_mut()
            .filter(|r| r.id == id && r.id == self.last_issued && r.state == RequestState::Pending)
        else {
            tracing::debug!("Discarding stale suggestion for request {id}");
            return Disposition::Stale;
        };
        self.in_flight = None;

        let text = match result {
            Ok(text) => text,
            Err(e) => {
                request.state = RequestState::Failed;
                tracing::warn!("Suggestion request {id} failed: {e}");
                self.request = None;
                self.state = SessionState::Idle;
                return Disposition::Failed(e.to_string());
            }
        };
        request.state = RequestState::Completed;
        tracing::debug!(
            "Suggestion request {id} answered in {}ms",
            request.issued_at.elapsed().as_millis()
        );

        let anchor = request.cursor_offset;
        let still_current = request.editor_text == self.document.text()
            && anchor == self.document.cursor();
        self.request = None;

        if !still_current {
            tracing::debug!("Document moved on since request {id}, dropping result");
            self.state = SessionState::Idle;
            return Disposition::Stale;
        }
        if text.trim().is_empty() {
            self.state = SessionState::Idle;
            return Disposition::Empty;
        }

        self.overlay.show(anchor, text, id);
        self.state = SessionState::OverlayShown;
        Disposition::Shown
    }
}
