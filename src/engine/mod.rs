mod conflict;
mod draft;
mod error;
mod mutations;

pub use conflict::{conflicts, duration_minutes, find_conflict, is_duration_valid};
pub use draft::{Draft, DraftKind};
pub use error::EngineError;
pub use mutations::Edge;

use std::sync::Arc;

use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::model::*;
use crate::notify::{Notice, NotifyHub};
use crate::observability::*;
use crate::saver::SaveHandle;
use crate::store::WeekStore;

/// One user's planning session.
///
/// Owns the current snapshot and replaces it wholesale on every commit.
/// Methods are synchronous; the only async work (saving) happens on a
/// background task the planner never waits for.
pub struct Planner {
    week: Arc<WeekTemplate>,
    draft: Option<Draft>,
    saver: SaveHandle,
    pub notify: Arc<NotifyHub>,
}

impl Planner {
    /// Load the user's week (or start empty) and start the save loop.
    pub async fn open(store: Arc<dyn WeekStore>, notify: Arc<NotifyHub>) -> Result<Self, EngineError> {
        let loaded = store
            .load()
            .await
            .map_err(|e| EngineError::Store(e.to_string()))?;
        let week = match loaded {
            Some(week) => {
                let week = week.normalized();
                if let Some((day, id)) = week.first_violation() {
                    warn!("loaded week breaks an invariant on {day} at block {id}");
                }
                week
            }
            None => {
                info!("no stored week, starting empty");
                WeekTemplate::default()
            }
        };
        info!("planning session opened with {} blocks", week.block_count());
        metrics::gauge!(SESSIONS_ACTIVE).increment(1.0);

        let saver = SaveHandle::spawn(store, notify.clone());
        Ok(Self {
            week: Arc::new(week),
            draft: None,
            saver,
            notify,
        })
    }

    /// Latest committed snapshot.
    pub fn week(&self) -> Arc<WeekTemplate> {
        self.week.clone()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Wait for queued saves. Commits never need this.
    pub async fn flush(&self) {
        self.saver.flush().await;
    }

    // ── Drafts ───────────────────────────────────────────────

    /// Open a create draft. Replaces any draft already open.
    pub fn begin_create(&mut self, day: Day, start: Minutes, end: Option<Minutes>) -> &Draft {
        let draft = Draft::for_create(day, start, end);
        debug!("create draft on {day} at {}", draft.span);
        &*self.draft.insert(draft)
    }

    /// Open an edit draft for an existing block.
    pub fn begin_edit(&mut self, id: Ulid) -> Result<&Draft, EngineError> {
        let (day, block) = self.week.find(id).ok_or(EngineError::NotFound(id))?;
        let draft = Draft::for_edit(day, block);
        Ok(&*self.draft.insert(draft))
    }

    /// Close the draft without touching the week.
    pub fn abandon_draft(&mut self) -> bool {
        if self.draft.take().is_some() {
            metrics::counter!(DRAFTS_ABANDONED_TOTAL).increment(1);
            true
        } else {
            false
        }
    }

    /// Commit the open draft with the form's values. On rejection the draft
    /// stays open so the form can be corrected.
    pub fn save_draft(&mut self, day: Day, span: Span, meta: BlockMeta) -> Result<Arc<WeekTemplate>, EngineError> {
        let kind = self.draft.as_ref().ok_or(EngineError::NoDraft)?.kind;
        let op = match kind {
            DraftKind::Create => "create",
            DraftKind::Edit { .. } => "update",
        };
        // Incomplete forms stop here, before any invariant check.
        if let Some(field) = meta.missing_field() {
            return Err(self.reject(op, EngineError::Incomplete(field)));
        }

        let result = match kind {
            DraftKind::Create => {
                let block = TimeBlock::new(Ulid::new(), span, meta);
                self.week
                    .create_block(day, block.clone())
                    .map(|next| (next, vec![Event::BlockCreated { day, block }]))
            }
            DraftKind::Edit { id, .. } => self.apply_edit(id, day, span, meta),
        };
        match result {
            Ok((next, events)) => {
                self.draft = None;
                Ok(self.commit(op, next, events))
            }
            Err(e) => Err(self.reject(op, e)),
        }
    }

    /// Metadata update, plus a move when the form also changed day or times.
    fn apply_edit(
        &self,
        id: Ulid,
        day: Day,
        span: Span,
        meta: BlockMeta,
    ) -> Result<(WeekTemplate, Vec<Event>), EngineError> {
        let (origin, current) = self.week.find(id).ok_or(EngineError::NotFound(id))?;
        let mut events = Vec::new();
        let moved = if origin != day || current.span != span {
            events.push(Event::BlockMoved { id, from: origin, to: day, span });
            self.week.move_block(id, origin, day, span)?
        } else {
            (*self.week).clone()
        };
        let next = moved.update_block_meta(id, day, meta.clone())?;
        events.push(Event::BlockUpdated { id, day, meta });
        Ok((next, events))
    }

    // ── Direct mutations ─────────────────────────────────────

    pub fn move_block(&mut self, id: Ulid, from: Day, to: Day, span: Span) -> Result<Arc<WeekTemplate>, EngineError> {
        match self.week.move_block(id, from, to, span) {
            Ok(next) => Ok(self.commit("move", next, vec![Event::BlockMoved { id, from, to, span }])),
            Err(e) => Err(self.reject("move", e)),
        }
    }

    pub fn resize_block(&mut self, id: Ulid, day: Day, edge: Edge, to: Minutes) -> Result<Arc<WeekTemplate>, EngineError> {
        let Some(old) = self.week.find_in(day, id).map(|b| b.span) else {
            return Err(self.reject("resize", EngineError::NotFound(id)));
        };
        let span = edge.apply(&old, to);
        match self.week.resize_block(id, day, edge, to) {
            Ok(next) => Ok(self.commit("resize", next, vec![Event::BlockResized { id, day, span }])),
            Err(e) => Err(self.reject("resize", e)),
        }
    }

    /// Resize from a renderer report of the block's new span. The moved edge
    /// is inferred; an unchanged span is a no-op.
    pub fn resize_to(&mut self, id: Ulid, day: Day, span: Span) -> Result<Arc<WeekTemplate>, EngineError> {
        let Some(current) = self.week.find_in(day, id).map(|b| b.span) else {
            return Err(self.reject("resize", EngineError::NotFound(id)));
        };
        match Edge::between(&current, &span) {
            Ok(Some(Edge::Start)) => self.resize_block(id, day, Edge::Start, span.start),
            Ok(Some(Edge::End)) => self.resize_block(id, day, Edge::End, span.end),
            Ok(None) => Ok(self.week()),
            Err(e) => Err(self.reject("resize", e)),
        }
    }

    /// Always succeeds. Deleting a block that is not there changes nothing.
    pub fn delete_block(&mut self, id: Ulid, day: Day) -> Arc<WeekTemplate> {
        if self.week.find_in(day, id).is_none() {
            return self.week();
        }
        let next = self.week.delete_block(id, day);
        self.commit("delete", next, vec![Event::BlockDeleted { id, day }])
    }

    pub fn set_preferences(&mut self, preferences: Preferences) -> Arc<WeekTemplate> {
        let next = self.week.with_preferences(preferences.clone());
        self.commit("preferences", next, vec![Event::PreferencesUpdated { preferences }])
    }

    // ── Commit / reject ──────────────────────────────────────

    fn commit(&mut self, op: &'static str, next: WeekTemplate, events: Vec<Event>) -> Arc<WeekTemplate> {
        let week = Arc::new(next);
        self.week = week.clone();
        self.sync_draft();
        self.saver.request(week.clone());
        for event in events {
            self.notify.send(Notice::Committed(event));
        }
        metrics::counter!(MUTATIONS_TOTAL, "op" => op, "status" => "committed").increment(1);
        debug!("{op} committed, {} blocks in week", week.block_count());
        week
    }

    pub(crate) fn reject(&self, op: &'static str, err: EngineError) -> EngineError {
        metrics::counter!(MUTATIONS_TOTAL, "op" => op, "status" => "rejected").increment(1);
        metrics::counter!(REJECTIONS_TOTAL, "op" => op, "reason" => err.kind()).increment(1);
        debug!("{op} rejected: {err}");
        self.notify.send(Notice::Rejected {
            op,
            reason: err.user_message(),
        });
        err
    }

    /// Keep an open edit draft pointing at where its block now lives.
    fn sync_draft(&mut self) {
        let Some(id) = self.draft.as_ref().and_then(Draft::editing) else {
            return;
        };
        match self.week.find(id) {
            Some((day, block)) => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.kind = DraftKind::Edit { id, origin: day };
                    draft.day = day;
                    draft.span = block.span;
                }
            }
            None => self.draft = None,
        }
    }
}

impl Drop for Planner {
    fn drop(&mut self) {
        metrics::gauge!(SESSIONS_ACTIVE).decrement(1.0);
    }
}
