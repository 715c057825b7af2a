use std::sync::Arc;

use ulid::Ulid;

use crate::engine::{Draft, EngineError, Planner};
use crate::model::*;

/// What the grid reports after a pointer gesture ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// A block was dropped on `day` with a new span.
    BlockMoved { id: Ulid, day: Day, span: Span },
    /// One edge of a block was dragged; `span` is the block's new extent.
    BlockResized { id: Ulid, day: Day, span: Span },
    /// Click on free grid space.
    EmptySlotActivated { day: Day, at: Minutes },
    /// Drag-select over free grid space.
    RangeSelected { day: Day, span: Span },
    /// Click on an existing block. Opens it for editing.
    BlockActivated { id: Ulid },
}

/// The grid. Draws optimistically during a gesture and must be able to
/// undo that when the planner rejects it.
pub trait Renderer {
    fn render(&mut self, week: &WeekTemplate);
    /// Restore the display from before the gesture.
    fn revert(&mut self);
    fn warn(&mut self, message: &str);
}

/// The block metadata form.
pub trait EditForm {
    fn open(&mut self, draft: &Draft);
    fn close(&mut self);
}

#[derive(Debug)]
pub enum GestureOutcome {
    Committed(Arc<WeekTemplate>),
    Rejected(EngineError),
    /// A form is open; nothing has changed yet.
    Drafting,
}

impl GestureOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, GestureOutcome::Committed(_))
    }
}

impl Planner {
    /// Route a grid gesture. Every gesture is validated against the latest
    /// committed week, never against an earlier rejected candidate.
    pub fn handle_gesture(
        &mut self,
        gesture: Gesture,
        view: &mut dyn Renderer,
        form: &mut dyn EditForm,
    ) -> GestureOutcome {
        let result = match gesture {
            Gesture::BlockMoved { id, day, span } => match self.week().find(id).map(|(d, _)| d) {
                Some(from) => self.move_block(id, from, day, span),
                None => Err(self.reject("move", EngineError::NotFound(id))),
            },
            Gesture::BlockResized { id, day, span } => self.resize_to(id, day, span),
            Gesture::EmptySlotActivated { day, at } => {
                form.open(self.begin_create(day, at, None));
                return GestureOutcome::Drafting;
            }
            Gesture::RangeSelected { day, span } => {
                form.open(self.begin_create(day, span.start, Some(span.end)));
                return GestureOutcome::Drafting;
            }
            Gesture::BlockActivated { id } => {
                // A click moves nothing on the grid, so there is nothing to revert.
                let err = match self.begin_edit(id) {
                    Ok(draft) => {
                        form.open(draft);
                        return GestureOutcome::Drafting;
                    }
                    Err(e) => e,
                };
                let err = self.reject("edit", err);
                view.warn(&err.user_message());
                return GestureOutcome::Rejected(err);
            }
        };

        match result {
            Ok(week) => {
                view.render(&week);
                GestureOutcome::Committed(week)
            }
            Err(e) => {
                view.revert();
                view.warn(&e.user_message());
                GestureOutcome::Rejected(e)
            }
        }
    }

    /// The form's save button. The form stays open on rejection.
    pub fn submit_form(
        &mut self,
        day: Day,
        span: Span,
        meta: BlockMeta,
        view: &mut dyn Renderer,
        form: &mut dyn EditForm,
    ) -> GestureOutcome {
        match self.save_draft(day, span, meta) {
            Ok(week) => {
                form.close();
                view.render(&week);
                GestureOutcome::Committed(week)
            }
            Err(e) => {
                view.warn(&e.user_message());
                GestureOutcome::Rejected(e)
            }
        }
    }

    /// The form's delete button.
    pub fn form_delete(
        &mut self,
        id: Ulid,
        day: Day,
        view: &mut dyn Renderer,
        form: &mut dyn EditForm,
    ) -> Arc<WeekTemplate> {
        let week = self.delete_block(id, day);
        self.abandon_draft();
        form.close();
        view.render(&week);
        week
    }

    pub fn form_cancel(&mut self, form: &mut dyn EditForm) {
        self.abandon_draft();
        form.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DraftKind;
    use crate::notify::{Notice, NotifyHub};
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct FakeGrid {
        renders: usize,
        reverts: usize,
        warnings: Vec<String>,
    }

    impl Renderer for FakeGrid {
        fn render(&mut self, _week: &WeekTemplate) {
            self.renders += 1;
        }
        fn revert(&mut self) {
            self.reverts += 1;
        }
        fn warn(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    #[derive(Default)]
    struct FakeForm {
        open: Option<Draft>,
        closes: usize,
    }

    impl EditForm for FakeForm {
        fn open(&mut self, draft: &Draft) {
            self.open = Some(draft.clone());
        }
        fn close(&mut self) {
            self.open = None;
            self.closes += 1;
        }
    }

    async fn planner() -> Planner {
        let store = MemoryStore::new("gestures");
        Planner::open(Arc::new(store), Arc::new(NotifyHub::new())).await.unwrap()
    }

    fn work(title: &str) -> BlockMeta {
        BlockMeta::new(ActivityType::Work, title)
    }

    #[tokio::test]
    async fn click_opens_form_then_save_commits() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());

        let out = p.handle_gesture(
            Gesture::EmptySlotActivated { day: Day::Monday, at: hm(9, 0) },
            &mut grid,
            &mut form,
        );
        assert!(matches!(out, GestureOutcome::Drafting));
        let draft = form.open.clone().unwrap();
        assert_eq!(draft.span, Span::new(hm(9, 0), hm(10, 0)));
        assert!(p.week().is_empty());

        let out = p.submit_form(draft.day, draft.span, work("Focus"), &mut grid, &mut form);
        assert!(out.is_committed());
        assert!(form.open.is_none());
        assert_eq!(grid.renders, 1);
        assert_eq!(p.week().day(Day::Monday).len(), 1);
    }

    #[tokio::test]
    async fn rejected_move_reverts_grid() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());

        p.begin_create(Day::Tuesday, hm(14, 0), None);
        p.save_draft(Day::Tuesday, Span::new(hm(14, 0), hm(15, 0)), work("a")).unwrap();
        p.begin_create(Day::Tuesday, hm(16, 0), None);
        p.save_draft(Day::Tuesday, Span::new(hm(16, 0), hm(17, 0)), work("b")).unwrap();
        let before = p.week();
        let id = before.day(Day::Tuesday)[0].id;

        let out = p.handle_gesture(
            Gesture::BlockMoved { id, day: Day::Tuesday, span: Span::new(hm(15, 30), hm(16, 30)) },
            &mut grid,
            &mut form,
        );
        assert!(matches!(out, GestureOutcome::Rejected(EngineError::Overlap(_))));
        assert_eq!(grid.reverts, 1);
        assert_eq!(grid.warnings, vec!["This overlaps an existing block".to_string()]);
        assert_eq!(*p.week(), *before);
    }

    #[tokio::test]
    async fn resize_gesture_infers_edge() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());
        p.begin_create(Day::Monday, hm(9, 0), None);
        p.save_draft(Day::Monday, Span::new(hm(9, 0), hm(10, 0)), work("a")).unwrap();
        let id = p.week().day(Day::Monday)[0].id;

        let out = p.handle_gesture(
            Gesture::BlockResized { id, day: Day::Monday, span: Span::new(hm(9, 0), hm(9, 10)) },
            &mut grid,
            &mut form,
        );
        assert!(matches!(out, GestureOutcome::Rejected(EngineError::TooShort(10))));
        assert_eq!(grid.reverts, 1);

        let out = p.handle_gesture(
            Gesture::BlockResized { id, day: Day::Monday, span: Span::new(hm(8, 30), hm(10, 0)) },
            &mut grid,
            &mut form,
        );
        assert!(out.is_committed());
        assert_eq!(p.week().day(Day::Monday)[0].span, Span::new(hm(8, 30), hm(10, 0)));

        let out = p.handle_gesture(
            Gesture::BlockResized { id, day: Day::Monday, span: Span::new(hm(8, 0), hm(11, 0)) },
            &mut grid,
            &mut form,
        );
        assert!(matches!(out, GestureOutcome::Rejected(EngineError::BothEdgesMoved)));
    }

    #[tokio::test]
    async fn activate_block_opens_edit_draft() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());
        p.begin_create(Day::Friday, hm(7, 0), None);
        p.save_draft(Day::Friday, Span::new(hm(7, 0), hm(7, 45)), work("Gym")).unwrap();
        let id = p.week().day(Day::Friday)[0].id;

        p.handle_gesture(Gesture::BlockActivated { id }, &mut grid, &mut form);
        let draft = form.open.clone().unwrap();
        assert_eq!(draft.kind, DraftKind::Edit { id, origin: Day::Friday });
        assert_eq!(draft.meta.title, "Gym");

        let week = p.form_delete(id, Day::Friday, &mut grid, &mut form);
        assert!(week.is_empty());
        assert!(p.draft().is_none());
        assert_eq!(form.closes, 1);
    }

    #[tokio::test]
    async fn activating_unknown_block_is_rejected() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());
        let mut rx = p.notify.subscribe();
        let out = p.handle_gesture(Gesture::BlockActivated { id: Ulid::new() }, &mut grid, &mut form);
        assert!(matches!(out, GestureOutcome::Rejected(EngineError::NotFound(_))));
        assert!(form.open.is_none());
        assert_eq!(grid.reverts, 0);
        assert_eq!(grid.warnings.len(), 1);
        assert!(matches!(rx.try_recv(), Ok(Notice::Rejected { op: "edit", .. })));
    }

    #[tokio::test]
    async fn range_selection_then_cancel_leaves_week_untouched() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());
        p.handle_gesture(
            Gesture::RangeSelected { day: Day::Sunday, span: Span::new(hm(18, 0), hm(18, 30)) },
            &mut grid,
            &mut form,
        );
        assert_eq!(form.open.as_ref().unwrap().span, Span::new(hm(18, 0), hm(18, 30)));

        p.form_cancel(&mut form);
        assert!(p.draft().is_none());
        assert!(p.week().is_empty());
        assert_eq!(grid.renders, 0);
    }

    #[tokio::test]
    async fn incomplete_form_keeps_draft_open() {
        let mut p = planner().await;
        let (mut grid, mut form) = (FakeGrid::default(), FakeForm::default());
        p.handle_gesture(Gesture::EmptySlotActivated { day: Day::Monday, at: hm(12, 0) }, &mut grid, &mut form);

        let out = p.submit_form(Day::Monday, Span::new(hm(12, 0), hm(13, 0)), work(""), &mut grid, &mut form);
        assert!(matches!(out, GestureOutcome::Rejected(EngineError::Incomplete("title"))));
        assert!(form.open.is_some());
        assert!(p.draft().is_some());
        assert_eq!(grid.warnings, vec!["Please fill in the title".to_string()]);
    }
}
