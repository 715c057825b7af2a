use ulid::Ulid;

use crate::limits::{DEFAULT_BLOCK_MINUTES, MINUTES_PER_DAY};
use crate::model::*;

/// What saving the draft will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Create,
    /// Edit an existing block, which currently lives on `origin`.
    Edit { id: Ulid, origin: Day },
}

/// A provisional block held open in the edit form. Nothing in the week
/// changes until the draft is saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub kind: DraftKind,
    pub day: Day,
    pub span: Span,
    pub meta: BlockMeta,
}

impl Draft {
    /// A new block at `start`. Without an explicit end it runs for the
    /// default length, cut off at midnight.
    pub fn for_create(day: Day, start: Minutes, end: Option<Minutes>) -> Self {
        let end = end.unwrap_or_else(|| (start + DEFAULT_BLOCK_MINUTES).min(MINUTES_PER_DAY));
        Self {
            kind: DraftKind::Create,
            day,
            span: Span::new(start, end),
            meta: BlockMeta::new(ActivityType::Work, ""),
        }
    }

    pub fn for_edit(day: Day, block: &TimeBlock) -> Self {
        Self {
            kind: DraftKind::Edit { id: block.id, origin: day },
            day,
            span: block.span,
            meta: block.meta.clone(),
        }
    }

    pub fn editing(&self) -> Option<Ulid> {
        match self.kind {
            DraftKind::Edit { id, .. } => Some(id),
            DraftKind::Create => None,
        }
    }
}
