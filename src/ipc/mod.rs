//! Local socket channel between the host tool and the editor.
//!
//! This module provides:
//! - `envelope`: the JSON messages carried over the channel
//! - `writer`: the sending role (connect, write, close per message)
//! - `reader`: the receiving role (persistent accept loop)

mod envelope;
mod reader;
mod writer;

pub use envelope::{HostAction, PipeMessage, SegmentUpdate};
pub use reader::{spawn_reader, ReaderOptions};
pub use writer::{PipeWriter, SendError};
