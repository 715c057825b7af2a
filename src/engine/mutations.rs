use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::conflict::{check_no_conflict, validate_meta, validate_span};
use super::EngineError;

/// Which edge of a block a resize gesture dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    /// Work out which edge moved between `old` and `new`.
    /// `Ok(None)` when nothing moved.
    pub fn between(old: &Span, new: &Span) -> Result<Option<Edge>, EngineError> {
        match (old.start == new.start, old.end == new.end) {
            (true, true) => Ok(None),
            (false, true) => Ok(Some(Edge::Start)),
            (true, false) => Ok(Some(Edge::End)),
            (false, false) => Err(EngineError::BothEdgesMoved),
        }
    }

    pub fn apply(self, span: &Span, to: Minutes) -> Span {
        match self {
            Edge::Start => Span::new(to, span.end),
            Edge::End => Span::new(span.start, to),
        }
    }
}

/// Snapshot-to-snapshot transforms. None of these touch `self`; every
/// success is a fresh template with each touched day re-sorted.
impl WeekTemplate {
    pub fn create_block(&self, day: Day, block: TimeBlock) -> Result<WeekTemplate, EngineError> {
        validate_meta(&block.meta)?;
        validate_span(&block.span)?;
        if self.find(block.id).is_some() {
            return Err(EngineError::AlreadyExists(block.id));
        }
        let bucket = self.day(day);
        if bucket.len() >= MAX_BLOCKS_PER_DAY {
            return Err(EngineError::LimitExceeded("too many blocks in day"));
        }
        check_no_conflict(bucket, &block.span, None)?;

        let mut next = self.clone();
        next.day_mut(day).push(block);
        next.resort(day);
        Ok(next)
    }

    /// Relocate a block to `to` with a new span. Same-day moves exclude the
    /// block from its own bucket before the overlap check.
    pub fn move_block(&self, id: Ulid, from: Day, to: Day, span: Span) -> Result<WeekTemplate, EngineError> {
        let original = self.find_in(from, id).ok_or(EngineError::NotFound(id))?;
        validate_span(&span)?;
        let target = self.day(to);
        if from != to && target.len() >= MAX_BLOCKS_PER_DAY {
            return Err(EngineError::LimitExceeded("too many blocks in day"));
        }
        check_no_conflict(target, &span, Some(id))?;

        let candidate = TimeBlock { span, ..original.clone() };
        let mut next = self.clone();
        next.day_mut(from).retain(|b| b.id != id);
        next.day_mut(to).push(candidate);
        next.resort(to);
        if from != to {
            next.resort(from);
        }
        Ok(next)
    }

    /// Drag one edge of a block. Length is checked before overlap so the
    /// caller can tell "too short" from "overlap".
    pub fn resize_block(&self, id: Ulid, day: Day, edge: Edge, to: Minutes) -> Result<WeekTemplate, EngineError> {
        let original = self.find_in(day, id).ok_or(EngineError::NotFound(id))?;
        let span = edge.apply(&original.span, to);
        validate_span(&span)?;
        check_no_conflict(self.day(day), &span, Some(id))?;

        let mut next = self.clone();
        if let Some(b) = next.day_mut(day).iter_mut().find(|b| b.id == id) {
            b.span = span;
        }
        next.resort(day);
        Ok(next)
    }

    pub fn update_block_meta(&self, id: Ulid, day: Day, meta: BlockMeta) -> Result<WeekTemplate, EngineError> {
        validate_meta(&meta)?;
        if self.find_in(day, id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        let mut next = self.clone();
        if let Some(b) = next.day_mut(day).iter_mut().find(|b| b.id == id) {
            b.meta = meta;
        }
        Ok(next)
    }

    /// Never fails: removing a block cannot break any invariant.
    pub fn delete_block(&self, id: Ulid, day: Day) -> WeekTemplate {
        let mut next = self.clone();
        next.day_mut(day).retain(|b| b.id != id);
        next
    }

    pub fn with_preferences(&self, preferences: Preferences) -> WeekTemplate {
        WeekTemplate {
            days: self.days.clone(),
            preferences,
        }
    }
}
