//! Ghost text: a suggestion drawn next to the document but not part of it.

use super::{document::EditorDocument, RequestId};

/// The suggestion currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostOverlay {
    /// Char offset the text is drawn after.
    pub anchor_offset: usize,
    pub text: String,
    pub source_request_id: RequestId,
}

/// Holds at most one overlay.
#[derive(Debug, Default)]
pub struct OverlayManager {
    current: Option<GhostOverlay>,
}

impl OverlayManager {
    pub const fn current(&self) -> Option<&GhostOverlay> {
        self.current.as_ref()
    }

    /// Replace whatever is shown. The document is not touched.
    pub fn show(&mut self, anchor_offset: usize, text: String, source_request_id: RequestId) {
        self.current = Some(GhostOverlay {
            anchor_offset,
            text,
            source_request_id,
        });
    }

    /// Remove the overlay if there is one.
    pub fn clear(&mut self) -> Option<GhostOverlay> {
        self.current.take()
    }

    /// Commit the overlay text into `document` at its anchor.
    ///
    /// Without an overlay nothing is inserted and the cursor stays put.
    /// Returns whether the document changed.
    pub fn accept(&mut self, document: &mut EditorDocument) -> bool {
        let Some(overlay) = self.current.take() else {
            return false;
        };
        document.insert_at(overlay.anchor_offset, &overlay.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_without_overlay_changes_nothing() {
        let mut overlays = OverlayManager::default();
        let mut doc = EditorDocument::new("Hel");
        doc.move_left();

        assert!(!overlays.accept(&mut doc));
        assert_eq!(doc.text(), "Hel");
        assert_eq!(doc.cursor(), 2);
    }

    #[test]
    fn cleared_overlay_cannot_be_accepted() {
        let mut overlays = OverlayManager::default();
        let mut doc = EditorDocument::new("Hel");

        overlays.show(3, "lo world".into(), 1);
        assert!(overlays.clear().is_some());
        assert!(!overlays.accept(&mut doc));
        assert_eq!(doc.text(), "Hel");
    }

    #[test]
    fn show_leaves_document_untouched_and_replaces_previous() {
        let mut overlays = OverlayManager::default();
        let doc = EditorDocument::new("Hel");

        overlays.show(3, "p".into(), 1);
        overlays.show(3, "lo world".into(), 2);

        assert_eq!(doc.text(), "Hel");
        assert_eq!(overlays.current().map(|o| o.source_request_id), Some(2));
    }

    #[test]
    fn accept_inserts_verbatim_at_anchor_and_clears() {
        let mut overlays = OverlayManager::default();
        let mut doc = EditorDocument::new("Hel");

        overlays.show(3, "lo world".into(), 1);
        assert!(overlays.accept(&mut doc));

        assert_eq!(doc.text(), "Hello world");
        assert_eq!(doc.cursor(), 11);
        assert!(overlays.current().is_none());
        assert!(overlays.clear().is_none());
    }
}
