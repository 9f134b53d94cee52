use thiserror::Error;

use crate::document::Path;
use crate::markup::MarkupError;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no node at path {0:?}")]
    PathNotFound(Path),

    #[error("offset {offset} is out of range for the leaf at {path:?}")]
    OffsetOutOfRange { path: Path, offset: usize },

    #[error("cannot {action} at {path:?}")]
    InvalidOperation { action: &'static str, path: Path },

    #[error("the editor has no selection")]
    NoSelection,

    #[error("the selection does not resolve in the current document")]
    StaleSelection,

    #[error("unknown format {0:?}")]
    UnknownFormat(String),

    #[error("normalization did not settle after {0} fixes")]
    NormalizationOverflow(usize),

    #[error(transparent)]
    Markup(#[from] MarkupError),
}

impl EditorError {
    pub(crate) fn invalid(action: &'static str, path: &[usize]) -> Self {
        EditorError::InvalidOperation {
            action,
            path: path.to_vec(),
        }
    }
}

pub type Result<T, E = EditorError> = std::result::Result<T, E>;
