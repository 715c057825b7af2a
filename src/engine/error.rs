use ulid::Ulid;

use crate::limits::MIN_BLOCK_MINUTES;
use crate::model::{Minutes, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Candidate intersects the named block in the target day.
    Overlap(Ulid),
    /// Resulting block would last this many minutes.
    TooShort(Minutes),
    OutOfDay(Span),
    BothEdgesMoved,
    /// A required form field is empty.
    Incomplete(&'static str),
    NotFound(Ulid),
    AlreadyExists(Ulid),
    NoDraft,
    LimitExceeded(&'static str),
    Store(String),
}

impl EngineError {
    /// Message for the person dragging the block.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::Overlap(_) => "This overlaps an existing block".into(),
            EngineError::TooShort(_) => {
                format!("Blocks must be at least {MIN_BLOCK_MINUTES} minutes long")
            }
            EngineError::OutOfDay(_) => "Blocks must stay between 00:00 and 24:00".into(),
            EngineError::BothEdgesMoved => "Resize one edge at a time".into(),
            EngineError::Incomplete(field) => format!("Please fill in the {field}"),
            EngineError::NotFound(_) => "That block no longer exists".into(),
            EngineError::AlreadyExists(_) => "That block already exists".into(),
            EngineError::NoDraft => "Nothing is being edited".into(),
            EngineError::LimitExceeded(msg) => format!("Too large: {msg}"),
            EngineError::Store(_) => "Your week could not be loaded".into(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Overlap(_) => "overlap",
            EngineError::TooShort(_) => "too_short",
            EngineError::OutOfDay(_) => "out_of_day",
            EngineError::BothEdgesMoved => "both_edges_moved",
            EngineError::Incomplete(_) => "incomplete",
            EngineError::NotFound(_) => "not_found",
            EngineError::AlreadyExists(_) => "already_exists",
            EngineError::NoDraft => "no_draft",
            EngineError::LimitExceeded(_) => "limit_exceeded",
            EngineError::Store(_) => "store",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Overlap(id) => write!(f, "overlaps block: {id}"),
            EngineError::TooShort(min) => {
                write!(f, "block too short: {min} min (minimum {MIN_BLOCK_MINUTES})")
            }
            EngineError::OutOfDay(span) => {
                write!(f, "span [{}, {}) outside the day", span.start, span.end)
            }
            EngineError::BothEdgesMoved => write!(f, "resize moved both edges"),
            EngineError::Incomplete(field) => write!(f, "missing required field: {field}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::NoDraft => write!(f, "no draft open"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
