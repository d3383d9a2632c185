//! Error taxonomy and parser diagnostics.
//!
//! Two layers: [`Diag`] records a recoverable lex/parse problem at a source
//! span (narration proceeds on the partial tree); [`NarrateError`] is the
//! public error type for the conditions that stop a pass entirely.

use std::ops::Range;
use std::path::PathBuf;

use thiserror::Error;

/// Byte range of a diagnostic.
pub type DiagSpan = Range<usize>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

/// One recoverable diagnostic from the syntax provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: DiagSpan,
    pub message: String,
}

impl Diag {
    pub fn lex(span: DiagSpan, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Lex,
            span,
            message: message.into(),
        }
    }

    pub fn parse(span: DiagSpan, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Parse,
            span,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexErrorKind {
    #[default]
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("invalid escape")]
    InvalidEscape,
}

/// Fatal conditions: nothing is narrated past these.
#[derive(Debug, Error)]
pub enum NarrateError {
    /// Requested file does not exist.
    #[error("file {0:?} does not exist")]
    MissingSource(PathBuf),

    /// The parser could not produce any tree, not even a partial one.
    #[error("source could not be parsed at all ({} diagnostics)", diags.len())]
    ParseFatal { diags: Vec<Diag> },

    /// Line range with the end before the start.
    #[error("end line ({end}) cannot be before start line ({start})")]
    InvalidRange { start: u32, end: u32 },

    /// Narration requested before any source was loaded.
    #[error("no source loaded")]
    NothingLoaded,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The speech backend could not be invoked.
    #[error("speech backend failed: {0}")]
    Backend(String),
}
