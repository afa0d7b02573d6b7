use chrono::{DateTime, Utc};

use crate::ipc::SegmentUpdate;

/// The segment currently in focus in the host tool.
///
/// Replaced wholesale by every `SegmentUpdate`; never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSnapshot {
    pub source_text: String,
    pub target_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub received_at: DateTime<Utc>,
}

impl From<SegmentUpdate> for SegmentSnapshot {
    fn from(update: SegmentUpdate) -> Self {
        Self {
            source_text: update.source,
            target_text: update.target,
            source_lang: update.source_lang,
            target_lang: update.target_lang,
            received_at: Utc::now(),
        }
    }
}

impl SegmentSnapshot {
    /// `en → ko` style label for status lines.
    pub fn language_pair(&self) -> String {
        format!("{} → {}", self.source_lang, self.target_lang)
    }
}
