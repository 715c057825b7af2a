use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::MINUTES_PER_DAY;

/// Minutes since midnight. The only time type.
pub type Minutes = i32;

/// Build a time of day from hours and minutes.
pub const fn hm(hours: Minutes, minutes: Minutes) -> Minutes {
    hours * 60 + minutes
}

/// Parse `"HH:MM"`. Accepts `"24:00"` as end of day.
pub fn parse_hhmm(s: &str) -> Option<Minutes> {
    let (h, m) = s.trim().split_once(':')?;
    let h: Minutes = h.parse().ok()?;
    let m: Minutes = m.parse().ok()?;
    if !(0..=24).contains(&h) || !(0..60).contains(&m) {
        return None;
    }
    let total = hm(h, m);
    (total <= MINUTES_PER_DAY).then_some(total)
}

pub fn format_hhmm(t: Minutes) -> String {
    format!("{:02}:{:02}", t.div_euclid(60), t.rem_euclid(60))
}

/// Half-open interval `[start, end)` within a day.
///
/// Unlike a committed block, a span may be degenerate: gestures report
/// whatever the pointer did and validation decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: Minutes,
    pub end: Minutes,
}

impl Span {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> Minutes {
        self.end - self.start
    }

    /// Canonical half-open intersection. Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Minutes) -> bool {
        self.start <= t && t < self.end
    }

    /// Same length, starting at `start`.
    pub fn moved_to(&self, start: Minutes) -> Span {
        Span::new(start, start + self.duration_minutes())
    }

    pub fn within_day(&self) -> bool {
        self.start >= 0 && self.end <= MINUTES_PER_DAY
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_hhmm(self.start), format_hhmm(self.end))
    }
}

// ── Day buckets ──────────────────────────────────────────────────

/// One of the seven buckets of a week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    /// Position in the week, 0 = Monday.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Day> {
        Day::ALL.get(index).copied()
    }

    /// Map a 0 = Sunday weekday number onto a Monday-first bucket.
    /// Numbers outside `0..7` are not weekdays.
    pub fn from_sunday_index(weekday: u32) -> Option<Day> {
        (weekday < 7).then(|| Day::ALL[((weekday + 6) % 7) as usize])
    }

    pub fn from_weekday(weekday: Weekday) -> Day {
        Day::ALL[weekday.num_days_from_monday() as usize]
    }

    pub fn from_date(date: NaiveDate) -> Day {
        Day::from_weekday(date.weekday())
    }

    pub fn today() -> Day {
        Day::from_date(Local::now().date_naive())
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Day::ALL
            .into_iter()
            .find(|d| d.name() == lower || d.name()[..3] == lower)
            .ok_or_else(|| format!("unknown day: {s}"))
    }
}

// ── Blocks ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Work,
    Routine,
    Fitness,
    Connection,
    Learning,
    Rest,
    /// Time reserved for an external task, see `BlockMeta::linked_task_id`.
    LinkedTask,
    Custom,
}

impl ActivityType {
    pub fn label(self) -> &'static str {
        match self {
            ActivityType::Work => "Work",
            ActivityType::Routine => "Routine",
            ActivityType::Fitness => "Fitness",
            ActivityType::Connection => "Connection",
            ActivityType::Learning => "Learning",
            ActivityType::Rest => "Rest",
            ActivityType::LinkedTask => "Task",
            ActivityType::Custom => "Custom",
        }
    }
}

/// Descriptive part of a block. The engine only checks limits and completeness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub activity: ActivityType,
    pub title: String,
    pub notes: Option<String>,
    pub custom_color: Option<String>,
    pub linked_task_id: Option<String>,
    pub linked_task_name: Option<String>,
}

impl BlockMeta {
    pub fn new(activity: ActivityType, title: impl Into<String>) -> Self {
        Self {
            activity,
            title: title.into(),
            notes: None,
            custom_color: None,
            linked_task_id: None,
            linked_task_name: None,
        }
    }

    pub fn linked_to(mut self, task_id: impl Into<String>, task_name: impl Into<String>) -> Self {
        self.activity = ActivityType::LinkedTask;
        self.linked_task_id = Some(task_id.into());
        self.linked_task_name = Some(task_name.into());
        self
    }

    /// Name of the first required field that is missing, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.title.trim().is_empty() {
            return Some("title");
        }
        if self.activity == ActivityType::LinkedTask
            && self.linked_task_id.as_deref().is_none_or(|t| t.trim().is_empty())
        {
            return Some("linked task");
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: Ulid,
    pub span: Span,
    pub meta: BlockMeta,
}

impl TimeBlock {
    pub fn new(id: Ulid, span: Span, meta: BlockMeta) -> Self {
        Self { id, span, meta }
    }
}

// ── Week ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
}

/// Advisory settings stored with the week. Never enforced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub max_blocks_per_day: u32,
    pub preferred_day_parts: Vec<DayPart>,
    pub buffer_minutes: Minutes,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            max_blocks_per_day: 8,
            preferred_day_parts: Vec::new(),
            buffer_minutes: 0,
        }
    }
}

/// A user's seven-day template. Each bucket is sorted by `span.start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTemplate {
    pub days: [Vec<TimeBlock>; 7],
    pub preferences: Preferences,
}

impl WeekTemplate {
    pub fn day(&self, day: Day) -> &[TimeBlock] {
        &self.days[day.index()]
    }

    pub(crate) fn day_mut(&mut self, day: Day) -> &mut Vec<TimeBlock> {
        &mut self.days[day.index()]
    }

    /// Locate a block anywhere in the week.
    pub fn find(&self, id: Ulid) -> Option<(Day, &TimeBlock)> {
        self.blocks().find(|(_, b)| b.id == id)
    }

    pub fn find_in(&self, day: Day, id: Ulid) -> Option<&TimeBlock> {
        self.day(day).iter().find(|b| b.id == id)
    }

    /// The block running at `t` on `day`, if any.
    pub fn block_at(&self, day: Day, t: Minutes) -> Option<&TimeBlock> {
        self.day(day).iter().find(|b| b.span.contains_instant(t))
    }

    /// Every block with its day, Monday first, in start order.
    pub fn blocks(&self) -> impl Iterator<Item = (Day, &TimeBlock)> {
        Day::ALL
            .into_iter()
            .flat_map(move |d| self.day(d).iter().map(move |b| (d, b)))
    }

    pub fn block_count(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Sort one bucket by start time.
    pub(crate) fn resort(&mut self, day: Day) {
        self.day_mut(day).sort_by_key(|b| b.span.start);
    }

    /// Copy with every bucket sorted; used on templates from outside the engine.
    pub fn normalized(mut self) -> Self {
        for day in Day::ALL {
            self.resort(day);
        }
        self
    }

    /// First block that breaks T1/T2, W1, W2 or the sort order.
    pub fn first_violation(&self) -> Option<(Day, Ulid)> {
        use crate::limits::MIN_BLOCK_MINUTES;

        let mut seen = std::collections::HashSet::new();
        for day in Day::ALL {
            let bucket = self.day(day);
            for (i, b) in bucket.iter().enumerate() {
                if b.span.duration_minutes() < MIN_BLOCK_MINUTES || !b.span.within_day() {
                    return Some((day, b.id));
                }
                if !seen.insert(b.id) {
                    return Some((day, b.id));
                }
                if let Some(next) = bucket.get(i + 1)
                    && (next.span.start < b.span.start || next.span.overlaps(&b.span))
                {
                    return Some((day, next.id));
                }
            }
        }
        None
    }

    pub fn is_consistent(&self) -> bool {
        self.first_violation().is_none()
    }
}

/// Record of one committed mutation. Broadcast to observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BlockCreated {
        day: Day,
        block: TimeBlock,
    },
    BlockMoved {
        id: Ulid,
        from: Day,
        to: Day,
        span: Span,
    },
    BlockResized {
        id: Ulid,
        day: Day,
        span: Span,
    },
    BlockUpdated {
        id: Ulid,
        day: Day,
        meta: BlockMeta,
    },
    BlockDeleted {
        id: Ulid,
        day: Day,
    },
    PreferencesUpdated {
        preferences: Preferences,
    },
}
