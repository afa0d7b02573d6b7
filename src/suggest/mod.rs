//! Everything between a focused segment and a ghost-text suggestion.

pub mod backend;
mod coordinator;
mod document;
mod overlay;
mod snapshot;

pub use coordinator::{Disposition, SessionState, SuggestionCoordinator, SuggestionOutcome};
pub use document::EditorDocument;
pub use overlay::GhostOverlay;
pub use snapshot::SegmentSnapshot;

/// Monotonically increasing per session; the latest id wins.
pub type RequestId = u64;
