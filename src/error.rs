use std::{error::Error as StdError, fmt, io, path::PathBuf, result::Result as StdResult};

/// Failures that abort startup or the terminal session.
///
/// Everything that can go wrong inside the suggestion pipeline itself is
/// handled where it happens and degrades to a status message instead.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Config { path: PathBuf, reason: String },
    Http(reqwest::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Config { path, reason } => {
                write!(f, "Invalid config {}: {reason}", path.display())
            }
            Self::Http(e) => write!(f, "HTTP client error: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Http(e) => Some(e),
            Self::Config { .. } => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

pub type Result<T> = StdResult<T, Error>;
