use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub fn duration_minutes(span: &Span) -> Minutes {
    span.duration_minutes()
}

pub fn is_duration_valid(span: &Span) -> bool {
    duration_minutes(span) >= MIN_BLOCK_MINUTES
}

/// Range first, then length. Reversed or empty spans fail as too short.
pub(crate) fn validate_span(span: &Span) -> Result<(), EngineError> {
    if !span.within_day() {
        return Err(EngineError::OutOfDay(*span));
    }
    if !is_duration_valid(span) {
        return Err(EngineError::TooShort(duration_minutes(span)));
    }
    Ok(())
}

/// `candidate` starts inside, ends inside, or swallows `existing`.
fn intersects(candidate: &Span, existing: &Span) -> bool {
    (candidate.start >= existing.start && candidate.start < existing.end)
        || (candidate.end > existing.start && candidate.end <= existing.end)
        || (candidate.start <= existing.start && candidate.end >= existing.end)
}

/// First block in `existing` (other than `exclude`) that `candidate` intersects.
pub fn find_conflict(candidate: &Span, existing: &[TimeBlock], exclude: Option<Ulid>) -> Option<Ulid> {
    existing
        .iter()
        .filter(|b| Some(b.id) != exclude)
        .find(|b| intersects(candidate, &b.span))
        .map(|b| b.id)
}

pub fn conflicts(candidate: &Span, existing: &[TimeBlock], exclude: Option<Ulid>) -> bool {
    find_conflict(candidate, existing, exclude).is_some()
}

pub(crate) fn check_no_conflict(
    bucket: &[TimeBlock],
    span: &Span,
    exclude: Option<Ulid>,
) -> Result<(), EngineError> {
    match find_conflict(span, bucket, exclude) {
        Some(id) => Err(EngineError::Overlap(id)),
        None => Ok(()),
    }
}

pub(crate) fn validate_meta(meta: &BlockMeta) -> Result<(), EngineError> {
    if meta.title.len() > MAX_TITLE_LEN {
        return Err(EngineError::LimitExceeded("title too long"));
    }
    if meta.notes.as_ref().is_some_and(|n| n.len() > MAX_NOTES_LEN) {
        return Err(EngineError::LimitExceeded("notes too long"));
    }
    if meta.custom_color.as_ref().is_some_and(|c| c.len() > MAX_COLOR_LEN) {
        return Err(EngineError::LimitExceeded("color too long"));
    }
    let linked_len = |s: &Option<String>| s.as_ref().map_or(0, String::len);
    if linked_len(&meta.linked_task_id) > MAX_LINKED_TASK_LEN
        || linked_len(&meta.linked_task_name) > MAX_LINKED_TASK_LEN
    {
        return Err(EngineError::LimitExceeded("linked task reference too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(start: Minutes, end: Minutes) -> TimeBlock {
        TimeBlock::new(Ulid::new(), Span::new(start, end), BlockMeta::new(ActivityType::Work, "b"))
    }

    #[test]
    fn back_to_back_is_not_a_conflict() {
        let day = vec![block(hm(9, 0), hm(10, 0))];
        assert!(!conflicts(&Span::new(hm(10, 0), hm(10, 30)), &day, None));
        assert!(!conflicts(&Span::new(hm(8, 0), hm(9, 0)), &day, None));
    }

    #[test]
    fn each_clause_detects() {
        let day = vec![block(hm(9, 0), hm(10, 0))];
        // starts inside
        assert!(conflicts(&Span::new(hm(9, 30), hm(10, 30)), &day, None));
        // ends inside
        assert!(conflicts(&Span::new(hm(8, 30), hm(9, 1)), &day, None));
        // contains
        assert!(conflicts(&Span::new(hm(8, 0), hm(11, 0)), &day, None));
        // identical
        assert!(conflicts(&Span::new(hm(9, 0), hm(10, 0)), &day, None));
    }

    #[test]
    fn excluded_block_is_ignored() {
        let b = block(hm(9, 0), hm(10, 0));
        let id = b.id;
        let day = vec![b];
        assert!(!conflicts(&Span::new(hm(9, 0), hm(10, 0)), &day, Some(id)));
        assert!(conflicts(&Span::new(hm(9, 0), hm(10, 0)), &day, Some(Ulid::new())));
    }

    #[test]
    fn find_conflict_names_the_block() {
        let first = block(hm(9, 0), hm(10, 0));
        let second = block(hm(16, 0), hm(17, 0));
        let second_id = second.id;
        let day = vec![first, second];
        assert_eq!(find_conflict(&Span::new(hm(15, 30), hm(16, 30)), &day, None), Some(second_id));
        assert_eq!(find_conflict(&Span::new(hm(10, 0), hm(16, 0)), &day, None), None);
    }

    #[test]
    fn duration_boundary() {
        assert!(is_duration_valid(&Span::new(hm(9, 0), hm(9, 15))));
        assert!(!is_duration_valid(&Span::new(hm(9, 0), hm(9, 14))));
        assert_eq!(
            validate_span(&Span::new(hm(9, 0), hm(9, 14))),
            Err(EngineError::TooShort(14))
        );
        assert_eq!(
            validate_span(&Span::new(hm(10, 0), hm(9, 0))),
            Err(EngineError::TooShort(-60))
        );
    }

    #[test]
    fn out_of_day_checked_first() {
        let span = Span::new(hm(23, 50), hm(24, 5));
        assert_eq!(validate_span(&span), Err(EngineError::OutOfDay(span)));
        assert!(validate_span(&Span::new(hm(23, 0), hm(24, 0))).is_ok());
        let negative = Span::new(-10, 30);
        assert_eq!(validate_span(&negative), Err(EngineError::OutOfDay(negative)));
    }

    #[test]
    fn meta_limits() {
        let mut meta = BlockMeta::new(ActivityType::Custom, "x".repeat(MAX_TITLE_LEN));
        assert!(validate_meta(&meta).is_ok());
        meta.title.push('x');
        assert_eq!(validate_meta(&meta), Err(EngineError::LimitExceeded("title too long")));

        let mut meta = BlockMeta::new(ActivityType::Custom, "ok");
        meta.custom_color = Some("#".repeat(MAX_COLOR_LEN + 1));
        assert_eq!(validate_meta(&meta), Err(EngineError::LimitExceeded("color too long")));
    }

    proptest! {
        #[test]
        fn three_clauses_match_half_open_intersection(
            c_start in 0i32..1440,
            c_len in 1i32..600,
            e_start in 0i32..1440,
            e_len in 1i32..600,
        ) {
            let c = Span::new(c_start, c_start + c_len);
            let e = Span::new(e_start, e_start + e_len);
            prop_assert_eq!(intersects(&c, &e), c.overlaps(&e));
        }
    }
}
